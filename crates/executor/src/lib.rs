//! # Libris Executor
//!
//! The command surface of the catalog. Any transport maps its requests onto
//! [`Command`] values and its responses from [`Output`] values:
//! - [`Command`] / [`Output`]: serializable request and response enums
//! - [`Executor`]: dispatches commands to a [`Library`](libris_engine::Library)
//! - [`Error`]: serializable error taxonomy
//!
//! ## Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use libris_engine::Library;
//! use libris_executor::{Command, Executor, Output};
//!
//! let executor = Executor::new(Arc::new(Library::in_memory()));
//! let out = executor.execute(Command::ListBooks).unwrap();
//! assert_eq!(out, Output::Books(vec![]));
//! ```

#![warn(missing_docs)]

mod command;
mod convert;
mod error;
mod executor;
mod output;
mod types;

#[cfg(test)]
mod tests;

pub use command::Command;
pub use error::Error;
pub use executor::Executor;
pub use output::Output;
pub use types::{RebuildInfo, StatsInfo};

/// Result type for executor operations
pub type Result<T> = std::result::Result<T, Error>;
