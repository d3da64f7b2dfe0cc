//! Read-only access to the source-control forge hosting the repository.
//!
//! The [`traits::Forge`] trait abstracts the handful of REST calls needed,
//! [`github::Github`] implements it over octocrab and
//! [`manager::ForgeManager`] runs the pagination and enrichment pipeline on
//! top of any implementation.

/// Connection settings and fetch limits.
pub mod config;

/// Per-request construction of forge managers.
pub mod factory;

/// GitHub API client implementation for GitHub.com and Enterprise.
pub mod github;

/// Pagination, filtering and enrichment of merged pull requests.
pub mod manager;

/// Common traits for forge platform abstraction.
pub mod traits;

/// Raw records returned by forge implementations.
pub mod types;
