//! Markdown loader.
//!
//! Fetches raw markdown through a [`ContentFetcher`] and refuses HTML
//! bodies. Static hosts for single-page apps answer unknown paths with the
//! app's `index.html` and status 200, which must never be shown as markdown.
//!
//! One attempt per call, no retries: documentation fetches are user-triggered
//! and the user can simply navigate again.

use crate::error::LoadError;
use crate::fetch::ContentFetcher;

/// Loads the markdown text at `path`.
///
/// # Errors
///
/// - [`LoadError::Fetch`] for transport failures and non-2xx responses.
/// - [`LoadError::ContentType`] when the body is an HTML document,
///   regardless of the status code.
/// - [`LoadError::Encoding`] when a local file is not UTF-8.
pub async fn load_markdown(fetcher: &dyn ContentFetcher, path: &str) -> Result<String, LoadError> {
    load_text(fetcher, path).await
}

/// Same checks as [`load_markdown`], for any text resource that must not be
/// an HTML fallback page (JSON manifests, for instance).
pub async fn load_text(fetcher: &dyn ContentFetcher, path: &str) -> Result<String, LoadError> {
    let response = fetcher.fetch(path).await?;

    if !response.is_success() {
        return Err(LoadError::Fetch {
            path: path.to_string(),
            status: Some(response.status),
            reason: response.reason,
        });
    }

    if looks_like_html(&response.body) {
        return Err(LoadError::ContentType {
            path: path.to_string(),
        });
    }

    Ok(response.body)
}

/// True when the body starts (after whitespace and a BOM) with an HTML
/// doctype or `<html` tag, case-insensitively.
pub fn looks_like_html(body: &str) -> bool {
    let head: String = body
        .trim_start_matches('\u{feff}')
        .trim_start()
        .chars()
        .take(16)
        .collect::<String>()
        .to_ascii_lowercase();
    head.starts_with("<!doctype html") || head.starts_with("<html")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{FetchResponse, MemoryFetcher};

    #[tokio::test]
    async fn test_loads_markdown() {
        let fetcher = MemoryFetcher::new().with_file("docs/index.md", "# Welcome\n\nHello.");
        let text = load_markdown(&fetcher, "docs/index.md").await.unwrap();
        assert_eq!(text, "# Welcome\n\nHello.");
    }

    #[tokio::test]
    async fn test_doctype_with_200_is_content_type_error() {
        let fetcher = MemoryFetcher::new()
            .with_file("docs/index.md", "<!DOCTYPE html>\n<html><body>app</body></html>");
        let err = load_markdown(&fetcher, "docs/index.md").await.unwrap_err();
        assert!(matches!(err, LoadError::ContentType { .. }));
    }

    #[tokio::test]
    async fn test_html_tag_with_200_is_content_type_error() {
        let fetcher = MemoryFetcher::new().with_file("docs/index.md", "  <html lang=\"en\">");
        let err = load_markdown(&fetcher, "docs/index.md").await.unwrap_err();
        assert!(matches!(err, LoadError::ContentType { .. }));
    }

    #[tokio::test]
    async fn test_non_success_is_fetch_error_with_status() {
        let fetcher = MemoryFetcher::new()
            .with_response("docs/index.md", FetchResponse::status(500, "Internal Server Error"));
        let err = load_markdown(&fetcher, "docs/index.md").await.unwrap_err();
        assert_eq!(err.status(), Some(500));

        let err = load_markdown(&fetcher, "docs/missing.md").await.unwrap_err();
        assert_eq!(err.status(), Some(404));
    }

    #[tokio::test]
    async fn test_single_attempt() {
        let fetcher = MemoryFetcher::new();
        let _ = load_markdown(&fetcher, "docs/missing.md").await;
        assert_eq!(fetcher.call_count(), 1);
    }

    #[test]
    fn test_looks_like_html() {
        assert!(looks_like_html("<!doctype HTML>"));
        assert!(looks_like_html("\u{feff}\n<HTML>"));
        assert!(!looks_like_html("# Title\n\n<html> inside markdown"));
        assert!(!looks_like_html("<div>inline html block</div>"));
        assert!(!looks_like_html(""));
    }
}
