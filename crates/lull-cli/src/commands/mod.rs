//! Subcommand implementations.

pub mod auth;
pub mod completions;
pub mod config;
pub mod context;
pub mod plan;
pub mod triage;
