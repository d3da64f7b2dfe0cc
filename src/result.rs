//! Result type used by the plumbing layers of mergelog.
//!
//! Forge calls, the narrative client and the command executors return the
//! `Result<T>` defined here so context can be attached with `.wrap_err()` as
//! errors propagate. Only the boundaries that need to tell failures apart
//! (the fetcher, the HTTP handlers) convert into
//! [`MergelogError`](crate::error::MergelogError).
//!
//! ```rust,ignore
//! use color_eyre::eyre::Context;
//! use crate::result::Result;
//!
//! fn load() -> Result<String> {
//!     let content = std::fs::read_to_string("mergelog.toml")
//!         .wrap_err("Failed to read configuration file")?;
//!     Ok(content)
//! }
//! ```

use color_eyre::eyre::Result as EyreResult;

/// Standard result type used throughout mergelog.
pub type Result<T> = EyreResult<T>;
