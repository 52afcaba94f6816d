//! CLI, configuration, credential resolution and the fetch pipeline
//!
//! This crate provides the `calsnap` command-line interface.

pub mod cli;
pub mod commands;
pub mod config;
pub mod credentials;
pub mod error;

pub use cli::Cli;
pub use error::{ClientError, ClientResult};
