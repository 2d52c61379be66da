//! # Docs Navigator CLI (`docnav`)
//!
//! ## Usage
//!
//! ```bash
//! docnav --config ./docnav.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `docnav repos` | List the documentation sets in the registry |
//! | `docnav chapters <repo>` | List a repository's chapters |
//! | `docnav show <repo>` | Print a document as markdown (or HTML with `--html`) |
//! | `docnav podcast <repo>` | Print the podcast script, optionally filtered |
//! | `docnav serve` | Start the HTTP viewer |
//!
//! `<repo>` is `owner/name` or a repository URL such as
//! `https://github.com/owner/name`.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use docs_navigator::config::{self, Config};
use docs_navigator::fetch::create_fetcher;
use docs_navigator::logging;
use docs_navigator::models::{ActiveFile, ViewMode};
use docs_navigator::navigation::{LoadPhase, Navigator, Outcome};
use docs_navigator::podcast::{filter_clusters, filter_dialogues, load_podcast_or_mock};
use docs_navigator::registry::{parse_repository_url, Registry};
use docs_navigator::server;
use docs_navigator::store::Store;
use docs_navigator::view::render_content;

/// Docs Navigator: browse generated repository tutorials and podcast scripts.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. When the file does not exist, content is read from the current
/// directory and only the built-in registry is available.
#[derive(Parser)]
#[command(
    name = "docnav",
    about = "Docs Navigator: browse generated repository tutorials and podcast scripts",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./docnav.toml")]
    config: PathBuf,

    /// Enable debug logging on stderr (overridden by `DOCNAV_LOG`).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List known documentation sets.
    Repos,

    /// List the chapters of a repository.
    Chapters {
        /// `owner/name` or repository URL.
        repo: String,
    },

    /// Print a document.
    ///
    /// Loads the repository's landing page, then follows `--chapter` or
    /// `--link` if given. Exits with status 1 when the document failed to
    /// load (the printed error document explains why).
    Show {
        /// `owner/name` or repository URL.
        repo: String,

        /// Chapter id to open (`index` for the landing page).
        #[arg(long, conflicts_with = "link")]
        chapter: Option<String>,

        /// Follow an in-document link (a chapter file name such as `02_usage_.md`).
        #[arg(long)]
        link: Option<String>,

        /// Render to HTML instead of printing raw markdown.
        #[arg(long)]
        html: bool,
    },

    /// Print a repository's podcast script.
    ///
    /// Falls back to a sample script when no generated podcast is found.
    Podcast {
        /// `owner/name` or repository URL.
        repo: String,

        /// Only show this cluster.
        #[arg(long)]
        cluster: Option<String>,

        /// Case-insensitive search over dialogue text and speaker.
        #[arg(long)]
        search: Option<String>,
    },

    /// Start the HTTP viewer on `[server].bind`.
    Serve,
}

fn load_config(path: &std::path::Path) -> Result<Config> {
    if path.exists() {
        config::load_config(path)
    } else {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        Ok(Config::minimal())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let cfg = load_config(&cli.config)?;

    match cli.command {
        Commands::Repos => run_repos(&cfg)?,
        Commands::Chapters { repo } => run_chapters(&cfg, &repo)?,
        Commands::Show {
            repo,
            chapter,
            link,
            html,
        } => run_show(&cfg, &repo, chapter, link, html).await?,
        Commands::Podcast {
            repo,
            cluster,
            search,
        } => run_podcast(&cfg, &repo, cluster, search).await?,
        Commands::Serve => server::run_server(&cfg).await?,
    }

    Ok(())
}

fn run_repos(cfg: &Config) -> Result<()> {
    let registry = Registry::from_config(cfg)?;
    println!("{:<48} {:<9} DOC PATH", "REPOSITORY", "CHAPTERS");
    for repo in registry.repositories() {
        println!(
            "{:<48} {:<9} {}",
            repo.id,
            repo.chapter_list().len(),
            repo.doc_path.as_deref().unwrap_or("(none)")
        );
    }
    Ok(())
}

fn run_chapters(cfg: &Config, input: &str) -> Result<()> {
    let registry = Registry::from_config(cfg)?;
    let (owner, name) = parse_repository_url(input)?;
    let repo = registry.resolve(&owner, &name);

    if repo.chapter_list().is_empty() {
        println!("{} has no generated chapters.", repo.id);
        return Ok(());
    }
    println!("{:<28} {:<52} TITLE", "ID", "FILE");
    for chapter in repo.chapter_list() {
        println!("{:<28} {:<52} {}", chapter.id, chapter.filename, chapter.title);
    }
    Ok(())
}

async fn run_show(
    cfg: &Config,
    input: &str,
    chapter: Option<String>,
    link: Option<String>,
    html: bool,
) -> Result<()> {
    let registry = Arc::new(Registry::from_config(cfg)?);
    let fetcher = create_fetcher(cfg)?;
    let (owner, name) = parse_repository_url(input)?;

    let navigator = Navigator::new(registry, fetcher, Arc::new(Store::new()));
    navigator.open_repository(&owner, &name).await;

    if let Some(href) = link {
        if navigator.click_link(&href).await == Outcome::Ignored {
            eprintln!("Link '{}' is not a chapter of {}/{}; showing the current page.", href, owner, name);
        }
    } else if let Some(id) = chapter {
        if navigator.navigate(ActiveFile::from_param(Some(&id))).await == Outcome::Ignored {
            eprintln!("Unknown chapter '{}' in {}/{}; showing the current page.", id, owner, name);
        }
    }

    let state = navigator.store().snapshot();
    if html {
        let base = format!("/docs/{}/{}", owner, name);
        println!("{}", render_content(&state.current_markdown_content, ViewMode::Html, &base));
    } else {
        print!("{}", state.current_markdown_content);
        if !state.current_markdown_content.ends_with('\n') {
            println!();
        }
    }

    if state.phase == LoadPhase::Failed {
        std::io::stdout().flush()?;
        std::process::exit(1);
    }
    Ok(())
}

async fn run_podcast(
    cfg: &Config,
    input: &str,
    cluster: Option<String>,
    search: Option<String>,
) -> Result<()> {
    let fetcher = create_fetcher(cfg)?;
    let (owner, name) = parse_repository_url(input)?;
    let (source, doc) = load_podcast_or_mock(fetcher.as_ref(), &cfg.podcast, &owner, &name).await;

    println!("--- Podcast {} ---", doc.metadata.podcast_id);
    println!(
        "source:       {}",
        source.as_deref().unwrap_or("(sample script, no generated podcast found)")
    );
    println!("clusters:     {}", doc.clusters.len());
    println!("dialogues:    {}", doc.dialogue_count());
    println!();

    let query = search.unwrap_or_default();
    let clusters = filter_clusters(&doc, cluster.as_deref(), &query);
    if clusters.is_empty() {
        println!("No dialogue matches the current filters.");
        return Ok(());
    }

    for c in clusters {
        println!("[{}] {}", c.cluster_id, c.cluster_title);
        for d in filter_dialogues(&doc, &[c], &query) {
            println!("  {} ({}): {}", doc.speaker_name(&d.speaker), d.emotion, d.text);
        }
        println!();
    }

    Ok(())
}
