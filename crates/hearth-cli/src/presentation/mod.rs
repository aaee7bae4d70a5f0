//! Terminal presentation.
//!
//! Format-only: the controller decides what happened, this module decides
//! how it looks on stdout.

pub mod console;

pub use console::{ConsoleObserver, format_players, format_tunnel, print_help};
