use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

const PODCAST_JSON: &str = r#"{
  "metadata": { "podcast_id": "acme_widgets_podcast", "generation_config": {}, "statistics": {} },
  "participants": [
    { "id": "host", "name": "Ada" },
    { "id": "guest", "name": "Grace" }
  ],
  "clusters": [
    {
      "cluster_id": "basics",
      "cluster_title": "Basics",
      "mckinsey_summary": "What widgets are.",
      "dialogues": [
        { "dialogue_id": "1", "speaker": "host", "text": "I love Apple products", "emotion": "happy" },
        { "dialogue_id": "2", "speaker": "guest", "text": "I love oranges", "emotion": "calm" }
      ]
    },
    {
      "cluster_id": "advanced",
      "cluster_title": "Advanced",
      "mckinsey_summary": "Power use.",
      "dialogues": [
        { "dialogue_id": "3", "speaker": "guest", "text": "Widgets compose", "emotion": "neutral" }
      ]
    }
  ]
}"#;

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let docs = root.join("site/public/output/widgets_en");
    fs::create_dir_all(&docs).unwrap();
    fs::write(
        docs.join("index.md"),
        "# Widgets Tutorial\n\nStart with [the intro](01_intro_.md).\n",
    )
    .unwrap();
    fs::write(docs.join("01_intro_.md"), "# Chapter 1: Intro\n\nWidgets are small.\n").unwrap();
    fs::write(docs.join("02_usage_.md"), "# Chapter 2: Usage\n\nCall `widget()`.\n").unwrap();

    let spa = root.join("site/public/output/spa_en");
    fs::create_dir_all(&spa).unwrap();
    fs::write(spa.join("index.md"), "<!DOCTYPE html>\n<html><body><div id=\"root\"></div></body></html>\n").unwrap();

    let podcasts = root.join("site/public/podcasts");
    fs::create_dir_all(&podcasts).unwrap();
    fs::write(podcasts.join("acme_widgets_podcast.json"), PODCAST_JSON).unwrap();

    let config_content = r#"[content]
source = "filesystem"
root = "site"

[podcast]
path_templates = ["public/podcasts/{owner}_{repo}_{id}.json"]
ids = ["latest", "podcast"]

[[repositories]]
owner = "acme"
name = "widgets"
description = "Test documentation set"
url = "https://github.com/acme/widgets"
doc_path = "public/output/widgets_en"
chapters = [
  { id = "intro", filename = "01_intro_.md", title = "Intro" },
  { id = "usage", filename = "02_usage_.md", title = "Usage" },
  { id = "missing", filename = "03_missing_.md", title = "Missing" },
]

[[repositories]]
owner = "acme"
name = "spa"
doc_path = "public/output/spa_en"
"#;

    let config_path = root.join("docnav.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_docnav(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = env!("CARGO_BIN_EXE_docnav");
    let output = Command::new(binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .env_remove("DOCNAV_LOG")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run docnav binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

#[test]
fn test_repos_lists_builtin_and_configured() {
    let (_tmp, config_path) = setup_test_env();
    let (stdout, stderr, success) = run_docnav(&config_path, &["repos"]);
    assert!(success, "repos failed: {}", stderr);
    assert!(stdout.contains("acme/widgets"));
    assert!(stdout.contains("langchain-ai/langchain"));
    assert!(stdout.contains("public/output/widgets_en"));
}

#[test]
fn test_chapters_accepts_url() {
    let (_tmp, config_path) = setup_test_env();
    let (stdout, stderr, success) =
        run_docnav(&config_path, &["chapters", "https://github.com/acme/widgets.git"]);
    assert!(success, "chapters failed: {}", stderr);
    assert!(stdout.contains("intro"));
    assert!(stdout.contains("02_usage_.md"));
}

#[test]
fn test_show_index() {
    let (_tmp, config_path) = setup_test_env();
    let (stdout, stderr, success) = run_docnav(&config_path, &["show", "acme/widgets"]);
    assert!(success, "show failed: {}", stderr);
    assert!(stdout.starts_with("# Widgets Tutorial"));
}

#[test]
fn test_show_chapter() {
    let (_tmp, config_path) = setup_test_env();
    let (stdout, _, success) =
        run_docnav(&config_path, &["show", "acme/widgets", "--chapter", "usage"]);
    assert!(success);
    assert!(stdout.contains("Chapter 2: Usage"));
}

#[test]
fn test_show_follows_chapter_link() {
    let (_tmp, config_path) = setup_test_env();
    let (stdout, _, success) =
        run_docnav(&config_path, &["show", "acme/widgets", "--link", "./01_intro_.md"]);
    assert!(success);
    assert!(stdout.contains("Chapter 1: Intro"));
}

#[test]
fn test_show_unknown_link_keeps_current_page() {
    let (_tmp, config_path) = setup_test_env();
    let (stdout, stderr, success) =
        run_docnav(&config_path, &["show", "acme/widgets", "--link", "99_nowhere_.md"]);
    assert!(success);
    assert!(stdout.starts_with("# Widgets Tutorial"));
    assert!(stderr.contains("not a chapter"));
}

#[test]
fn test_show_html_rewrites_links() {
    let (_tmp, config_path) = setup_test_env();
    let (stdout, _, success) = run_docnav(&config_path, &["show", "acme/widgets", "--html"]);
    assert!(success);
    assert!(stdout.contains("<h1>Widgets Tutorial</h1>"));
    assert!(stdout.contains("/docs/acme/widgets?link=01_intro_.md"));
}

#[test]
fn test_show_missing_chapter_file_prints_error_document() {
    let (_tmp, config_path) = setup_test_env();
    let (stdout, _, success) =
        run_docnav(&config_path, &["show", "acme/widgets", "--chapter", "missing"]);
    assert!(!success);
    assert!(stdout.contains("Error Loading Documentation"));
    assert!(stdout.contains("404"));
}

#[test]
fn test_show_unregistered_repository() {
    let (_tmp, config_path) = setup_test_env();
    let (stdout, _, success) = run_docnav(&config_path, &["show", "someone/else"]);
    assert!(!success);
    assert!(stdout.contains("No Documentation Available"));
    assert!(stdout.contains("someone/else"));
}

#[test]
fn test_show_rejects_html_fallback_page() {
    let (_tmp, config_path) = setup_test_env();
    let (stdout, _, success) = run_docnav(&config_path, &["show", "acme/spa"]);
    assert!(!success);
    assert!(stdout.contains("HTML page"));
    assert!(!stdout.contains("<div id=\"root\">"));
}

#[test]
fn test_show_rejects_invalid_repository() {
    let (_tmp, config_path) = setup_test_env();
    let (_, stderr, success) = run_docnav(&config_path, &["show", "https://gitlab.com/a/b"]);
    assert!(!success);
    assert!(stderr.contains("not a repository URL"));
}

#[test]
fn test_podcast_search() {
    let (_tmp, config_path) = setup_test_env();
    let (stdout, stderr, success) =
        run_docnav(&config_path, &["podcast", "acme/widgets", "--search", "APPLE"]);
    assert!(success, "podcast failed: {}", stderr);
    assert!(stdout.contains("acme_widgets_podcast"));
    assert!(stdout.contains("acme_widgets_podcast.json"));
    assert!(stdout.contains("Ada (happy): I love Apple products"));
    assert!(!stdout.contains("I love oranges"));
    assert!(!stdout.contains("[advanced]"));
}

#[test]
fn test_podcast_search_by_speaker_display_name() {
    let (_tmp, config_path) = setup_test_env();
    let (stdout, _, success) =
        run_docnav(&config_path, &["podcast", "acme/widgets", "--search", "grace"]);
    assert!(success);
    assert!(stdout.contains("Grace (calm): I love oranges"));
    assert!(stdout.contains("Grace (neutral): Widgets compose"));
    assert!(!stdout.contains("I love Apple products"));
}

#[test]
fn test_podcast_cluster_filter() {
    let (_tmp, config_path) = setup_test_env();
    let (stdout, _, success) =
        run_docnav(&config_path, &["podcast", "acme/widgets", "--cluster", "advanced"]);
    assert!(success);
    assert!(stdout.contains("[advanced] Advanced"));
    assert!(stdout.contains("Widgets compose"));
    assert!(!stdout.contains("[basics]"));
}

#[test]
fn test_podcast_falls_back_to_sample() {
    let (_tmp, config_path) = setup_test_env();
    let (stdout, _, success) = run_docnav(&config_path, &["podcast", "someone/else"]);
    assert!(success);
    assert!(stdout.contains("sample script"));
    assert!(stdout.contains("someone_else_sample"));
}

#[test]
fn test_invalid_config_is_fatal() {
    let (tmp, config_path) = setup_test_env();
    fs::write(&config_path, "[content]\ntimeout_secs = 0\n").unwrap();
    let (_, stderr, success) = run_docnav(&config_path, &["repos"]);
    assert!(!success);
    assert!(stderr.contains("timeout_secs"));
    drop(tmp);
}
