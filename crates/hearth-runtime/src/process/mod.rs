//! Child process management.
//!
//! One owner per child: [`ServerSupervisor`] for the game server and
//! [`TunnelManager`] for the exposure agent. Each child gets one output
//! reader feeding the dispatch queue.

mod shutdown;
mod stream;
mod supervisor;
mod tunnel;

pub use shutdown::terminate_child;
pub use stream::spawn_output_reader;
pub use supervisor::{ServerLaunch, ServerSupervisor};
pub use tunnel::{TunnelLaunch, TunnelManager};
