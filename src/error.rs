//! Error taxonomy for the failures a caller of mergelog can actually see.
//!
//! Everything else (missing commits, unresolved issues, unreachable release
//! listings, a failed narrative call) degrades in place and is only logged.

use thiserror::Error;

/// Main error type for mergelog operations.
#[derive(Error, Debug)]
pub enum MergelogError {
    // Caller errors: rejected before any upstream call is made
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // Primary pagination failed, the whole fetch is aborted
    #[error("Failed to fetch pull requests: {0}")]
    FetchFailed(String),

    #[error("Upstream request timed out: {0}")]
    UpstreamTimeout(String),

    // Prompt template could not be rendered
    #[error("Template rendering failed: {0}")]
    TemplateError(#[from] tera::Error),

    // Generic wrapper for other errors
    #[error(transparent)]
    Other(#[from] color_eyre::Report),
}

impl MergelogError {
    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a fetch failure error
    pub fn fetch_failed(msg: impl Into<String>) -> Self {
        Self::FetchFailed(msg.into())
    }

    /// Create an upstream timeout error
    pub fn upstream_timeout(msg: impl Into<String>) -> Self {
        Self::UpstreamTimeout(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_formats() {
        let err = MergelogError::invalid_input("owner is required");
        assert_eq!(err.to_string(), "Invalid input: owner is required");

        let err = MergelogError::fetch_failed("page 2 returned 502");
        assert_eq!(
            err.to_string(),
            "Failed to fetch pull requests: page 2 returned 502"
        );
    }

    #[test]
    fn test_error_helpers() {
        let err = MergelogError::invalid_input("bad");
        assert!(matches!(err, MergelogError::InvalidInput(_)));

        let err = MergelogError::upstream_timeout("list pulls");
        assert!(matches!(err, MergelogError::UpstreamTimeout(_)));
    }

    #[test]
    fn test_template_error_conversion() {
        let tera_err =
            tera::Tera::one_off("{{ unclosed", &tera::Context::new(), false)
                .unwrap_err();
        let err: MergelogError = tera_err.into();
        assert!(matches!(err, MergelogError::TemplateError(_)));
        assert!(err.to_string().starts_with("Template rendering failed"));
    }
}
