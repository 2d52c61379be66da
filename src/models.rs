//! Core data models shared by the registry, the navigation flow, and the views.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentinel id used for the documentation landing page.
pub const INDEX_FILE: &str = "index";

/// One markdown file within a documentation set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    /// Stable id, distinct from the filename.
    pub id: String,
    /// File name relative to the repository's `doc_path` (e.g. `01_chat_model_.md`).
    pub filename: String,
    pub title: String,
}

/// A documentation set keyed by its source owner/name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    /// Composite key, `"{owner}/{name}"`. Filled in by the registry when
    /// a config entry leaves it out.
    #[serde(default)]
    pub id: String,
    pub owner: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Link to the source repository.
    #[serde(default)]
    pub url: String,
    /// Base path for generated content. `None` means nothing is resolvable.
    #[serde(default)]
    pub doc_path: Option<String>,
    #[serde(default)]
    pub chapters: Option<Vec<Chapter>>,
}

impl Repository {
    /// Builds the degraded, content-less repository used for arbitrary URLs
    /// that have no pre-generated documentation.
    pub fn ad_hoc(owner: &str, name: &str) -> Self {
        Self {
            id: format!("{}/{}", owner, name),
            owner: owner.to_string(),
            name: name.to_string(),
            description: String::new(),
            url: format!("https://github.com/{}/{}", owner, name),
            doc_path: None,
            chapters: None,
        }
    }

    /// Chapters in display order, empty when the repository has none.
    pub fn chapter_list(&self) -> &[Chapter] {
        self.chapters.as_deref().unwrap_or(&[])
    }

    /// Path of the landing page, if this repository has content.
    pub fn index_path(&self) -> Option<String> {
        self.doc_path
            .as_deref()
            .map(|base| join_path(base, &format!("{}.md", INDEX_FILE)))
    }

    /// Path of a chapter file, if this repository has content.
    pub fn chapter_path(&self, chapter: &Chapter) -> Option<String> {
        self.doc_path
            .as_deref()
            .map(|base| join_path(base, &chapter.filename))
    }
}

/// Joins a base path and a file name with exactly one `/` between them.
pub fn join_path(base: &str, file: &str) -> String {
    if base.is_empty() {
        return file.trim_start_matches('/').to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        file.trim_start_matches('/')
    )
}

/// The file currently displayed: the landing page or one chapter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum ActiveFile {
    #[default]
    Index,
    Chapter(String),
}

impl ActiveFile {
    /// Parses a route parameter; `"index"` (or nothing) selects the landing page.
    pub fn from_param(param: Option<&str>) -> Self {
        match param {
            None | Some("") | Some(INDEX_FILE) => ActiveFile::Index,
            Some(id) => ActiveFile::Chapter(id.to_string()),
        }
    }
}

impl fmt::Display for ActiveFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActiveFile::Index => f.write_str(INDEX_FILE),
            ActiveFile::Chapter(id) => f.write_str(id),
        }
    }
}

/// How the current document is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    #[default]
    Html,
    Markdown,
}

impl ViewMode {
    pub fn toggled(self) -> Self {
        match self {
            ViewMode::Html => ViewMode::Markdown,
            ViewMode::Markdown => ViewMode::Html,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ViewMode::Html => "html",
            ViewMode::Markdown => "markdown",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "html" => Some(ViewMode::Html),
            "markdown" | "raw" => Some(ViewMode::Markdown),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_path_normalizes_slashes() {
        assert_eq!(join_path("public/output/a_en/", "/index.md"), "public/output/a_en/index.md");
        assert_eq!(join_path("public/output/a_en", "01_x_.md"), "public/output/a_en/01_x_.md");
        assert_eq!(join_path("", "index.md"), "index.md");
    }

    #[test]
    fn test_ad_hoc_repository_has_no_content() {
        let repo = Repository::ad_hoc("someone", "thing");
        assert_eq!(repo.id, "someone/thing");
        assert!(repo.index_path().is_none());
        assert!(repo.chapter_list().is_empty());
    }

    #[test]
    fn test_active_file_from_param() {
        assert_eq!(ActiveFile::from_param(None), ActiveFile::Index);
        assert_eq!(ActiveFile::from_param(Some("index")), ActiveFile::Index);
        assert_eq!(
            ActiveFile::from_param(Some("chat_model")),
            ActiveFile::Chapter("chat_model".to_string())
        );
    }

    #[test]
    fn test_view_mode_toggle() {
        assert_eq!(ViewMode::Html.toggled(), ViewMode::Markdown);
        assert_eq!(ViewMode::parse("raw"), Some(ViewMode::Markdown));
        assert_eq!(ViewMode::parse("pdf"), None);
    }
}
