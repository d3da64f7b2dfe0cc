//! Command execution for mergelog.
//!
//! Each subcommand wires configuration into the forge factory and the
//! changelog generators, then does its own I/O:
//!
//! - **serve**: run the JSON HTTP API
//! - **generate**: fetch a window of merged pull requests and write one
//!   changelog file
//! - **check**: print the visibility of a repository

/// Repository visibility lookup.
pub mod check;

/// One-shot changelog generation.
pub mod generate;

/// HTTP API server.
pub mod serve;
