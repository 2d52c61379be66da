//! # Docs Navigator
//!
//! A local-first viewer for generated repository tutorials and podcast
//! scripts.
//!
//! Documentation sets live under a predictable layout
//! (`{doc_path}/index.md`, `{doc_path}/NN_slug_.md`) on a static web server or
//! a local directory. Docs Navigator resolves chapters through a registry,
//! loads markdown with a guard against HTML fallback pages, keeps one
//! session's state in an explicit store, and renders it through a CLI or a
//! small HTTP viewer.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌────────────┐   ┌──────────┐   ┌─────────┐
//! │ Registry │──▶│ Navigator  │──▶│  Store   │──▶│  View   │
//! └──────────┘   │ (last wins)│   └──────────┘   └────┬────┘
//!                └─────┬──────┘                       │
//!                      ▼                         ┌────┴─────┐
//!                ┌──────────┐                    ▼          ▼
//!                │  Loader  │──▶ Fetcher     ┌───────┐  ┌───────┐
//!                └──────────┘  (HTTP / FS)   │  CLI  │  │ HTTP  │
//!                                            └───────┘  └───────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! docnav repos                                   # list known documentation sets
//! docnav show langchain-ai/langchain --chapter tool
//! docnav podcast langchain-ai/langchain --search agent
//! docnav serve                                   # browse at http://127.0.0.1:7341
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Repository, chapter and view types |
//! | [`registry`] | Known documentation sets and chapter lookup |
//! | [`fetch`] | HTTP, filesystem and in-memory transports |
//! | [`loader`] | Markdown loading with the HTML-page guard |
//! | [`store`] | Observable per-session state |
//! | [`navigation`] | Navigation state machine (last-request-wins) |
//! | [`view`] | Markdown rendering and HTML pages |
//! | [`podcast`] | Podcast document model, discovery and filters |
//! | [`server`] | HTTP viewer |
//! | [`error`] | Error taxonomy |

pub mod config;
pub mod error;
pub mod fetch;
pub mod loader;
pub mod logging;
pub mod models;
pub mod navigation;
pub mod podcast;
pub mod registry;
pub mod server;
pub mod store;
pub mod view;
