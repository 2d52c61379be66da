//! Typed error taxonomy for content loading.
//!
//! Each error is scoped to the single load that produced it. None of them is
//! fatal: the navigation flow turns [`LoadError`] into a fallback markdown
//! document, and the podcast viewer turns [`PodcastError`] into the bundled
//! mock document. Only configuration and startup errors reach `main` (as
//! `anyhow::Error`).

use thiserror::Error;

/// Failure to load a markdown document.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LoadError {
    /// The fetch itself failed: a non-2xx response, or a transport error
    /// (in which case `status` is `None`).
    #[error("failed to fetch {path}: {}", describe_status(.status, .reason))]
    Fetch {
        path: String,
        status: Option<u16>,
        reason: String,
    },

    /// The server answered with an HTML page where markdown was expected,
    /// typically a single-page-app catch-all served with status 200.
    #[error("expected markdown at {path} but received an HTML page")]
    ContentType { path: String },

    /// The file was read but its bytes are not UTF-8 text.
    #[error("{path} is not valid UTF-8 text")]
    Encoding { path: String },
}

impl LoadError {
    /// HTTP status carried by a [`LoadError::Fetch`], if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            LoadError::Fetch { status, .. } => *status,
            LoadError::ContentType { .. } | LoadError::Encoding { .. } => None,
        }
    }
}

fn describe_status(status: &Option<u16>, reason: &str) -> String {
    match status {
        Some(code) => format!("HTTP {} {}", code, reason),
        None => reason.to_string(),
    }
}

/// Failure to load a podcast document.
#[derive(Debug, Error)]
pub enum PodcastError {
    /// No candidate path produced a loadable document.
    #[error("no podcast found for {owner}/{repo} after {attempts} candidates")]
    NotFound {
        owner: String,
        repo: String,
        attempts: usize,
    },

    /// The body was fetched but does not match the podcast schema.
    #[error("invalid podcast document at {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// The manifest (or another required resource) could not be fetched.
    #[error(transparent)]
    Load(#[from] LoadError),
}

/// Errors raised while building or querying the repository registry.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("not a repository URL: '{0}' (expected https://github.com/<owner>/<name> or <owner>/<name>)")]
    InvalidUrl(String),

    #[error("repository {repo} declares chapter id '{id}' more than once")]
    DuplicateChapter { repo: String, id: String },

    #[error("repository {repo} declares filename '{filename}' more than once")]
    DuplicateFilename { repo: String, filename: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_message_includes_status() {
        let err = LoadError::Fetch {
            path: "docs/index.md".to_string(),
            status: Some(404),
            reason: "Not Found".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "failed to fetch docs/index.md: HTTP 404 Not Found"
        );
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn test_transport_error_has_no_status() {
        let err = LoadError::Fetch {
            path: "docs/index.md".to_string(),
            status: None,
            reason: "connection refused".to_string(),
        };
        assert_eq!(err.status(), None);
        assert!(err.to_string().ends_with("connection refused"));
    }
}
