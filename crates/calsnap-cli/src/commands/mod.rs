//! Command implementations.

pub mod auth;
pub mod calendars;
pub mod config;
pub mod fetch;
