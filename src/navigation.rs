//! Navigation resolution flow.
//!
//! Keeps `active_file` and `current_markdown_content` in the [`Store`]
//! consistent with what the user asked for last.
//!
//! ```text
//!            select repo (doc_path)          ok
//!   Idle ──────────────────────────▶ LoadingIndex ────▶ Loaded
//!    │                                    │ err            ▲
//!    │ select repo (no doc_path)          ▼                │ ok
//!    └──────────────────────────────▶  Failed ◀──── LoadingChapter
//!                                                err   ▲
//!                         chapter id / link click ─────┘
//! ```
//!
//! Every load is split in two halves: [`Navigator::begin`] records the new
//! target synchronously and tags it with a sequence number, and
//! [`Navigator::commit`] applies the response only if that tag is still the
//! latest one. A slow response for chapter A that arrives after the user has
//! moved on to chapter B is dropped, never shown (last-request-wins).
//! Superseded fetches are not cancelled, just ignored.
//!
//! Fetch failures never escape this module. They become a markdown error
//! document, so the view always has something to render.

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::LoadError;
use crate::fetch::ContentFetcher;
use crate::loader::load_markdown;
use crate::models::{ActiveFile, Repository};
use crate::registry::{find_chapter_by_filename, find_chapter_by_id, Registry};
use crate::store::Store;
use crate::view::link_target;

/// Content-loading state of the documentation view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadPhase {
    Idle,
    LoadingIndex,
    LoadingChapter,
    Loaded,
    Failed,
}

impl LoadPhase {
    pub fn is_loading(self) -> bool {
        matches!(self, LoadPhase::LoadingIndex | LoadPhase::LoadingChapter)
    }
}

/// A content fetch tagged with the target it was issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRequest {
    pub seq: u64,
    pub target: ActiveFile,
    pub path: String,
}

/// Result of [`Navigator::begin`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Begin {
    /// A fetch must be issued for this request.
    Fetch(ContentRequest),
    /// The repository has no content; the store already holds the failure.
    NoDocumentation,
    /// The target does not resolve; the store was left untouched.
    Unresolved,
}

/// What a navigation did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Content (or an error document) was committed in this phase.
    Committed(LoadPhase),
    /// A newer navigation started while this one was in flight.
    Superseded,
    /// Nothing happened: unknown chapter, unknown link target, or no
    /// repository selected.
    Ignored,
    /// The requested repository was already selected.
    Unchanged,
}

/// Drives navigation for one session.
#[derive(Clone)]
pub struct Navigator {
    registry: Arc<Registry>,
    fetcher: Arc<dyn ContentFetcher>,
    store: Arc<Store>,
}

impl Navigator {
    pub fn new(registry: Arc<Registry>, fetcher: Arc<dyn ContentFetcher>, store: Arc<Store>) -> Self {
        Self {
            registry,
            fetcher,
            store,
        }
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Selects `owner/name` (registered or ad hoc) unless it is already the
    /// current repository.
    pub async fn open_repository(&self, owner: &str, name: &str) -> Outcome {
        let current = self
            .store
            .read(|s| s.repository.as_ref().map(|r| (r.owner.clone(), r.name.clone())));
        if current.as_ref().map(|(o, n)| (o.as_str(), n.as_str())) == Some((owner, name)) {
            return Outcome::Unchanged;
        }
        self.select_repository(self.registry.resolve(owner, name)).await
    }

    /// Replaces the repository wholesale and loads its landing page.
    pub async fn select_repository(&self, repo: Repository) -> Outcome {
        info!(repository = %repo.id, "selecting repository");
        self.store.update(|s| {
            s.repository = Some(repo);
            s.active_file = ActiveFile::Index;
        });
        self.navigate(ActiveFile::Index).await
    }

    /// Navigates to the landing page or a chapter.
    pub async fn navigate(&self, target: ActiveFile) -> Outcome {
        match self.begin(target) {
            Begin::Fetch(request) => {
                let result = load_markdown(self.fetcher.as_ref(), &request.path).await;
                self.commit(&request, result)
            }
            Begin::NoDocumentation => Outcome::Committed(LoadPhase::Failed),
            Begin::Unresolved => Outcome::Ignored,
        }
    }

    /// Handles a click on an in-document link.
    ///
    /// Only links naming a chapter file of the current repository navigate.
    /// Anything else (external URLs, anchors, unknown files) is a no-op.
    pub async fn click_link(&self, href: &str) -> Outcome {
        let Some(filename) = link_target(href) else {
            debug!(href, "ignoring non-chapter link");
            return Outcome::Ignored;
        };

        let chapter_id = self.store.read(|s| {
            s.repository
                .as_ref()
                .and_then(|repo| find_chapter_by_filename(repo, &filename))
                .map(|c| c.id.clone())
        });

        match chapter_id {
            Some(id) => self.navigate(ActiveFile::Chapter(id)).await,
            // Links may point outside the known chapter set
            None => {
                debug!(href, filename = %filename, "link target is not a known chapter");
                Outcome::Ignored
            }
        }
    }

    /// Re-issues the current target.
    pub async fn reload(&self) -> Outcome {
        let target = self.store.read(|s| s.active_file.clone());
        self.navigate(target).await
    }

    /// First half of a navigation: resolves the target and records it as the
    /// latest request.
    pub fn begin(&self, target: ActiveFile) -> Begin {
        let mut begin = Begin::Unresolved;

        self.store.update_if(|s| {
            let Some(repo) = s.repository.as_ref() else {
                debug!(target = %target, "no repository selected");
                return false;
            };

            let path = match &target {
                ActiveFile::Index => repo.index_path(),
                ActiveFile::Chapter(id) => match find_chapter_by_id(repo, id) {
                    Some(chapter) => repo.chapter_path(chapter),
                    // Unknown chapter ids are a data error, not a user-facing one
                    None => {
                        debug!(repository = %repo.id, chapter = %id, "chapter id does not resolve");
                        return false;
                    }
                },
            };

            s.request_seq += 1;
            s.active_file = target.clone();

            match path {
                Some(path) => {
                    s.phase = match target {
                        ActiveFile::Index => LoadPhase::LoadingIndex,
                        ActiveFile::Chapter(_) => LoadPhase::LoadingChapter,
                    };
                    debug!(seq = s.request_seq, path = %path, "loading");
                    begin = Begin::Fetch(ContentRequest {
                        seq: s.request_seq,
                        target: target.clone(),
                        path,
                    });
                }
                None => {
                    info!(repository = %repo.id, "no documentation available");
                    s.current_markdown_content = no_documentation_document(repo);
                    s.phase = LoadPhase::Failed;
                    s.scroll_top = 0;
                    begin = Begin::NoDocumentation;
                }
            }
            true
        });

        begin
    }

    /// Second half of a navigation: applies the response if `request` is
    /// still the latest one.
    pub fn commit(&self, request: &ContentRequest, result: Result<String, LoadError>) -> Outcome {
        let mut outcome = Outcome::Superseded;

        self.store.update_if(|s| {
            if s.request_seq != request.seq || s.active_file != request.target {
                debug!(
                    seq = request.seq,
                    latest = s.request_seq,
                    target = %request.target,
                    "dropping superseded response"
                );
                return false;
            }

            match result {
                Ok(text) => {
                    s.current_markdown_content = text;
                    s.phase = LoadPhase::Loaded;
                }
                Err(err) => {
                    warn!(path = %request.path, error = %err, "failed to load documentation");
                    let repo_id = s.repository.as_ref().map(|r| r.id.as_str()).unwrap_or("");
                    s.current_markdown_content = error_document(repo_id, &request.path, &err);
                    s.phase = LoadPhase::Failed;
                }
            }
            s.scroll_top = 0;
            outcome = Outcome::Committed(s.phase);
            true
        });

        outcome
    }
}

/// Markdown shown when a document fails to load.
pub fn error_document(repo_id: &str, path: &str, err: &LoadError) -> String {
    let hint = match err {
        LoadError::ContentType { .. } => {
            "The server returned an HTML page instead of markdown. The file probably does not exist."
        }
        LoadError::Encoding { .. } => "The file exists but is not UTF-8 text.",
        LoadError::Fetch { status: Some(404), .. } => "The file was not found on the server.",
        LoadError::Fetch { status: None, .. } => "The content server could not be reached.",
        LoadError::Fetch { .. } => "The content server returned an error.",
    };
    format!(
        "# Error Loading Documentation\n\n\
         Could not load `{}` for **{}**.\n\n\
         > {}\n\n\
         {} Select the page again from the navigation panel to retry.\n",
        path, repo_id, err, hint
    )
}

/// Markdown shown for repositories without generated content.
pub fn no_documentation_document(repo: &Repository) -> String {
    format!(
        "# No Documentation Available\n\n\
         There is no generated documentation for **{}** yet.\n\n\
         Source: <{}>\n",
        repo.id, repo.url
    )
}
