//! Terminal front end for hearth.
//!
//! Settings loading, the interactive command reader and the stdout
//! observer. `main.rs` wires them to a runtime `Controller`.

#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

#[cfg(test)]
use tempfile as _;
#[cfg(test)]
use tokio_test as _;

// Used by main.rs only
use anyhow as _;
use dotenvy as _;

pub mod bootstrap;
pub mod error;
pub mod input;
pub mod parser;
pub mod presentation;

pub use bootstrap::{CliContext, bootstrap, init_tracing, load_settings};
pub use error::CliError;
pub use input::{Flow, InputCommand, spawn_stdin_reader};
pub use parser::Cli;
pub use presentation::ConsoleObserver;
