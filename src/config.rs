use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::models::Repository;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub content: ContentConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub podcast: PodcastConfig,
    /// Extra documentation sets, merged over the built-in registry.
    #[serde(default)]
    pub repositories: Vec<Repository>,
}

/// Where markdown and podcast files are read from.
#[derive(Debug, Deserialize, Clone)]
pub struct ContentConfig {
    #[serde(default = "default_source")]
    pub source: ContentSourceKind,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_root")]
    pub root: Option<PathBuf>,
    /// Per-request timeout for HTTP fetches.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ContentSourceKind {
    Http,
    Filesystem,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            source: default_source(),
            base_url: None,
            root: default_root(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_source() -> ContentSourceKind {
    ContentSourceKind::Filesystem
}
fn default_root() -> Option<PathBuf> {
    Some(PathBuf::from("."))
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7341".to_string()
}

/// Podcast discovery settings.
///
/// Templates may use `{owner}`, `{repo}` and `{id}` placeholders.
#[derive(Debug, Deserialize, Clone)]
pub struct PodcastConfig {
    #[serde(default = "default_path_templates")]
    pub path_templates: Vec<String>,
    #[serde(default = "default_ids")]
    pub ids: Vec<String>,
    /// Optional manifest listing the available podcast files; replaces the
    /// template × id probe when present.
    #[serde(default)]
    pub manifest: Option<String>,
}

impl Default for PodcastConfig {
    fn default() -> Self {
        Self {
            path_templates: default_path_templates(),
            ids: default_ids(),
            manifest: None,
        }
    }
}

fn default_path_templates() -> Vec<String> {
    vec![
        "public/podcasts/{owner}_{repo}_{id}.json".to_string(),
        "public/podcasts/{owner}_{repo}/{id}.json".to_string(),
        "public/output/{repo}_podcast_{id}.json".to_string(),
    ]
}

fn default_ids() -> Vec<String> {
    vec![
        "podcast".to_string(),
        "latest".to_string(),
        "en".to_string(),
        "zh".to_string(),
    ]
}

impl Config {
    /// Configuration used when no config file exists: content is read from
    /// the current directory and the built-in registry is used as-is.
    pub fn minimal() -> Self {
        Self {
            content: ContentConfig::default(),
            server: ServerConfig::default(),
            podcast: PodcastConfig::default(),
            repositories: Vec::new(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let mut config: Config =
        toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Relative content roots are resolved against the config file's directory
    if let Some(root) = config.content.root.as_ref() {
        if root.is_relative() {
            if let Some(dir) = path.parent() {
                config.content.root = Some(dir.join(root));
            }
        }
    }

    validate(&config)?;
    Ok(config)
}

pub fn validate(config: &Config) -> Result<()> {
    if config.content.timeout_secs == 0 {
        anyhow::bail!("content.timeout_secs must be > 0");
    }

    match config.content.source {
        ContentSourceKind::Http => {
            let url = config.content.base_url.as_deref().unwrap_or("");
            if url.is_empty() {
                anyhow::bail!("content.base_url must be set when content.source = \"http\"");
            }
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                anyhow::bail!("content.base_url must start with http:// or https://");
            }
        }
        ContentSourceKind::Filesystem => {
            if config.content.root.is_none() {
                anyhow::bail!("content.root must be set when content.source = \"filesystem\"");
            }
        }
    }

    if config.podcast.path_templates.is_empty() {
        anyhow::bail!("podcast.path_templates must not be empty");
    }
    if config.podcast.ids.is_empty() {
        anyhow::bail!("podcast.ids must not be empty");
    }

    for repo in &config.repositories {
        if repo.owner.is_empty() || repo.name.is_empty() {
            anyhow::bail!("repositories entries require both owner and name");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_src: &str) -> Result<Config> {
        let config: Config = toml::from_str(toml_src)?;
        validate(&config)?;
        Ok(config)
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse("").unwrap();
        assert_eq!(config.content.source, ContentSourceKind::Filesystem);
        assert_eq!(config.content.timeout_secs, 30);
        assert_eq!(config.server.bind, "127.0.0.1:7341");
        assert!(!config.podcast.path_templates.is_empty());
        assert!(config.repositories.is_empty());
    }

    #[test]
    fn test_partial_content_section_keeps_default_root() {
        let config = parse("[content]\ntimeout_secs = 10\n").unwrap();
        assert_eq!(config.content.timeout_secs, 10);
        assert_eq!(config.content.root, Config::minimal().content.root);
        assert_eq!(config.content.root, Some(PathBuf::from(".")));
    }

    #[test]
    fn test_http_source_requires_base_url() {
        let err = parse("[content]\nsource = \"http\"\n").unwrap_err();
        assert!(err.to_string().contains("base_url"));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let err = parse("[content]\ntimeout_secs = 0\n").unwrap_err();
        assert!(err.to_string().contains("timeout_secs"));
    }

    #[test]
    fn test_repository_entries_parse() {
        let config = parse(
            r#"
[[repositories]]
id = "acme/widgets"
owner = "acme"
name = "widgets"
doc_path = "public/output/widgets_en"
chapters = [{ id = "intro", filename = "01_intro_.md", title = "Intro" }]
"#,
        )
        .unwrap();
        assert_eq!(config.repositories.len(), 1);
        assert_eq!(config.repositories[0].chapter_list()[0].id, "intro");
    }

    #[test]
    fn test_relative_root_resolved_against_config_dir() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("docnav.toml");
        std::fs::write(&path, "[content]\nroot = \"site\"\n").unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.content.root.unwrap(), tmp.path().join("site"));
    }
}
