//! HTTP viewer.
//!
//! Serves the documentation and podcast views for a single browsing session.
//! The server owns one [`Store`], and every request reads and mutates it the
//! way a browser tab's UI events would.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Registry browser; `?url=` opens a repository URL |
//! | `GET` | `/docs/{owner}/{repo}` | Documentation view (`chapter`, `link`, `view`, `nav`) |
//! | `GET` | `/video/{owner}/{repo}` | Podcast script viewer (`cluster`, `q`, `expand`) |
//! | `GET` | `/api/state` | JSON snapshot of the session state |
//! | `GET` | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! Content failures never produce an error status: the documentation view
//! renders an error document and the podcast view falls back to a sample
//! script. Only malformed requests are rejected, with
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "not a repository URL: ..." } }
//! ```

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::config::{Config, PodcastConfig};
use crate::fetch::{create_fetcher, ContentFetcher};
use crate::models::{ActiveFile, ViewMode};
use crate::navigation::Navigator;
use crate::podcast::{load_podcast_or_mock, PodcastDocument};
use crate::registry::{parse_repository_url, Registry};
use crate::store::{AppState, Store};
use crate::view::{render_docs_page, render_home, render_podcast_page};

/// Generated podcast loaded for the current `/video` repository.
struct LoadedPodcast {
    repo_id: String,
    source: String,
    document: Arc<PodcastDocument>,
}

/// Shared state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct ServerState {
    navigator: Navigator,
    fetcher: Arc<dyn ContentFetcher>,
    podcast_config: Arc<PodcastConfig>,
    podcast: Arc<Mutex<Option<LoadedPodcast>>>,
}

impl ServerState {
    pub fn new(config: &Config, registry: Registry, fetcher: Arc<dyn ContentFetcher>) -> Self {
        let store = Arc::new(Store::new());
        Self {
            navigator: Navigator::new(Arc::new(registry), fetcher.clone(), store),
            fetcher,
            podcast_config: Arc::new(config.podcast.clone()),
            podcast: Arc::new(Mutex::new(None)),
        }
    }

    pub fn store(&self) -> &Arc<Store> {
        self.navigator.store()
    }
}

/// Builds the router without binding, for embedding and tests.
pub fn router(state: ServerState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handle_home))
        .route("/docs/{owner}/{repo}", get(handle_docs))
        .route("/video/{owner}/{repo}", get(handle_podcast))
        .route("/api/state", get(handle_state))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state)
}

/// Starts the viewer on `[server].bind` and runs until the process exits.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let registry = Registry::from_config(config)?;
    let fetcher = create_fetcher(config)?;
    info!(content = %fetcher.describe(), "content source");

    let state = ServerState::new(config, registry, fetcher);
    let app = router(state);

    println!("Docs Navigator listening on http://{}", config.server.bind);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

// ============ GET / ============

#[derive(Deserialize)]
struct HomeQuery {
    url: Option<String>,
}

async fn handle_home(
    State(state): State<ServerState>,
    Query(query): Query<HomeQuery>,
) -> Result<Response, AppError> {
    match query.url.as_deref().map(str::trim) {
        Some(url) if !url.is_empty() => {
            let (owner, name) = parse_repository_url(url).map_err(|e| bad_request(e.to_string()))?;
            Ok(Redirect::to(&format!("/docs/{}/{}", owner, name)).into_response())
        }
        _ => Ok(Html(render_home(state.navigator.registry())).into_response()),
    }
}

// ============ GET /docs/{owner}/{repo} ============

#[derive(Deserialize)]
struct DocsQuery {
    chapter: Option<String>,
    link: Option<String>,
    view: Option<String>,
    nav: Option<String>,
}

/// Documentation view.
///
/// Opening a different repository resets to its landing page. `chapter`
/// navigates by id, `link` by filename (rewritten document links), `view`
/// switches between rendered and raw, and `nav=toggle` flips the sidebar.
async fn handle_docs(
    State(state): State<ServerState>,
    Path((owner, repo)): Path<(String, String)>,
    Query(query): Query<DocsQuery>,
) -> Result<Html<String>, AppError> {
    let navigator = &state.navigator;
    navigator.open_repository(&owner, &repo).await;

    if let Some(view) = query.view.as_deref() {
        let mode = ViewMode::parse(view)
            .ok_or_else(|| bad_request(format!("invalid view mode: {}", view)))?;
        navigator.store().set_view_mode(mode);
    }
    if query.nav.as_deref() == Some("toggle") {
        navigator.store().toggle_navigation();
    }

    if let Some(link) = query.link.as_deref() {
        // Unknown link targets leave the current document in place
        navigator.click_link(link).await;
    } else if let Some(chapter) = query.chapter.as_deref() {
        navigator.navigate(ActiveFile::from_param(Some(chapter))).await;
    }

    Ok(Html(render_docs_page(&navigator.store().snapshot())))
}

// ============ GET /video/{owner}/{repo} ============

#[derive(Deserialize)]
struct PodcastQuery {
    cluster: Option<String>,
    q: Option<String>,
    expand: Option<String>,
}

async fn handle_podcast(
    State(state): State<ServerState>,
    Path((owner, repo)): Path<(String, String)>,
    Query(query): Query<PodcastQuery>,
) -> Html<String> {
    let repo_id = format!("{}/{}", owner, repo);

    // Held until the page is rendered, so concurrent requests never mix one
    // document's filters into another's page
    let mut loaded = state.podcast.lock().await;

    let cached = loaded
        .as_ref()
        .filter(|p| p.repo_id == repo_id)
        .map(|p| (Some(p.source.clone()), p.document.clone()));
    let (source, document) = match cached {
        Some(hit) => hit,
        None => {
            let (source, document) =
                load_podcast_or_mock(state.fetcher.as_ref(), &state.podcast_config, &owner, &repo)
                    .await;
            let document = Arc::new(document);
            // Sample scripts are not cached; the next visit probes again
            *loaded = source.as_ref().map(|path| LoadedPodcast {
                repo_id: repo_id.clone(),
                source: path.clone(),
                document: document.clone(),
            });
            (source, document)
        }
    };

    let store = state.store();
    store.reset_podcast_view(&format!("{}#{}", repo_id, document.metadata.podcast_id));

    if let Some(cluster) = query.cluster {
        store.select_cluster(Some(cluster).filter(|c| !c.is_empty()));
    }
    if let Some(q) = query.q {
        store.set_search_query(q);
    }
    if let Some(id) = query.expand.as_deref() {
        store.toggle_cluster_expanded(id);
    }

    let view = store.read(|s| s.podcast.clone());
    let page = render_podcast_page(&owner, &repo, &document, source.as_deref(), &view);
    drop(loaded);

    Html(page)
}

// ============ GET /api/state ============

async fn handle_state(State(state): State<ServerState>) -> Json<AppState> {
    Json(state.store().snapshot())
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
