//! Repository registry: the known documentation sets and their chapters.
//!
//! The registry is compile-time data (see [`builtin_repositories`]) optionally
//! extended by `[[repositories]]` entries in the config file. Later entries
//! override earlier ones with the same `owner/name`:
//!
//! ```text
//! built-in → docnav.toml [[repositories]]
//! ```
//!
//! Lookups never fail loudly. An unknown `owner/name` resolves to an ad-hoc
//! [`Repository`] with no content, and unknown chapter ids or filenames
//! resolve to `None`.

use std::collections::HashSet;

use crate::config::Config;
use crate::error::RegistryError;
use crate::models::{Chapter, Repository};

/// All repositories available to a session.
#[derive(Debug, Clone)]
pub struct Registry {
    repositories: Vec<Repository>,
}

impl Registry {
    /// Registry containing only the built-in documentation sets.
    pub fn builtin() -> Self {
        Self {
            repositories: builtin_repositories(),
        }
    }

    /// Built-in sets merged with the config's `[[repositories]]` entries.
    pub fn from_config(config: &Config) -> Result<Self, RegistryError> {
        let mut registry = Self::builtin();
        for repo in &config.repositories {
            registry.insert(repo.clone())?;
        }
        Ok(registry)
    }

    /// Builds a registry from an explicit list (tests, custom binaries).
    pub fn from_repositories(repos: Vec<Repository>) -> Result<Self, RegistryError> {
        let mut registry = Self {
            repositories: Vec::new(),
        };
        for repo in repos {
            registry.insert(repo)?;
        }
        Ok(registry)
    }

    /// Adds or replaces a repository after validating its chapter list.
    pub fn insert(&mut self, mut repo: Repository) -> Result<(), RegistryError> {
        if repo.id.is_empty() {
            repo.id = format!("{}/{}", repo.owner, repo.name);
        }
        validate_repository(&repo)?;

        match self
            .repositories
            .iter_mut()
            .find(|r| r.owner == repo.owner && r.name == repo.name)
        {
            Some(existing) => *existing = repo,
            None => self.repositories.push(repo),
        }
        Ok(())
    }

    pub fn repositories(&self) -> &[Repository] {
        &self.repositories
    }

    /// Case-sensitive exact match on owner and name.
    pub fn find_by_owner_and_name(&self, owner: &str, name: &str) -> Option<&Repository> {
        self.repositories
            .iter()
            .find(|r| r.owner == owner && r.name == name)
    }

    /// Known repository, or an ad-hoc one without content.
    ///
    /// Arbitrary repository URLs are accepted as input even though only the
    /// registered subset has generated documentation.
    pub fn resolve(&self, owner: &str, name: &str) -> Repository {
        self.find_by_owner_and_name(owner, name)
            .cloned()
            .unwrap_or_else(|| Repository::ad_hoc(owner, name))
    }
}

pub fn find_chapter_by_id<'a>(repo: &'a Repository, chapter_id: &str) -> Option<&'a Chapter> {
    repo.chapter_list().iter().find(|c| c.id == chapter_id)
}

pub fn find_chapter_by_filename<'a>(repo: &'a Repository, filename: &str) -> Option<&'a Chapter> {
    repo.chapter_list().iter().find(|c| c.filename == filename)
}

/// Previous and next chapters around `chapter_id`, in list order.
pub fn neighbors<'a>(
    repo: &'a Repository,
    chapter_id: &str,
) -> (Option<&'a Chapter>, Option<&'a Chapter>) {
    let chapters = repo.chapter_list();
    match chapters.iter().position(|c| c.id == chapter_id) {
        Some(i) => (
            i.checked_sub(1).and_then(|p| chapters.get(p)),
            chapters.get(i + 1),
        ),
        None => (None, None),
    }
}

/// Extracts `(owner, name)` from a repository URL or `owner/name` shorthand.
///
/// Accepts `https://github.com/owner/name`, optional `www.`, a trailing
/// `.git` or `/`, and extra path segments (`/tree/main/...`), which are
/// ignored.
pub fn parse_repository_url(input: &str) -> Result<(String, String), RegistryError> {
    let invalid = || RegistryError::InvalidUrl(input.to_string());
    let trimmed = input.trim();

    let path = if let Some(rest) = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
    {
        let rest = rest.strip_prefix("www.").unwrap_or(rest);
        rest.strip_prefix("github.com/").ok_or_else(invalid)?
    } else if trimmed.contains("://") {
        return Err(invalid());
    } else {
        trimmed
    };

    let mut segments = path.split('/').filter(|s| !s.is_empty());
    let owner = segments.next().ok_or_else(invalid)?;
    let name = segments.next().ok_or_else(invalid)?;
    let name = name.strip_suffix(".git").unwrap_or(name);

    let valid = |s: &str| {
        !s.is_empty()
            && s
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    };
    if !valid(owner) || !valid(name) {
        return Err(invalid());
    }

    Ok((owner.to_string(), name.to_string()))
}

/// Chapter ids and filenames must each be unique within a repository, so
/// that a filename maps back to exactly one chapter.
pub fn validate_repository(repo: &Repository) -> Result<(), RegistryError> {
    let mut ids = HashSet::new();
    let mut filenames = HashSet::new();
    for chapter in repo.chapter_list() {
        if !ids.insert(chapter.id.as_str()) {
            return Err(RegistryError::DuplicateChapter {
                repo: repo.id.clone(),
                id: chapter.id.clone(),
            });
        }
        if !filenames.insert(chapter.filename.as_str()) {
            return Err(RegistryError::DuplicateFilename {
                repo: repo.id.clone(),
                filename: chapter.filename.clone(),
            });
        }
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════
// Built-in Documentation Sets
// ═══════════════════════════════════════════════════════════════════════

fn chapters(entries: &[(&str, &str, &str)]) -> Vec<Chapter> {
    entries
        .iter()
        .map(|(id, filename, title)| Chapter {
            id: id.to_string(),
            filename: filename.to_string(),
            title: title.to_string(),
        })
        .collect()
}

/// Documentation sets with pre-generated content under `public/output`.
pub fn builtin_repositories() -> Vec<Repository> {
    vec![
        Repository {
            id: "langchain-ai/langchain".to_string(),
            owner: "langchain-ai".to_string(),
            name: "langchain".to_string(),
            description: "Beginner tutorial for an LLM orchestration framework: models, prompts, chains, tools and agents.".to_string(),
            url: "https://github.com/langchain-ai/langchain".to_string(),
            doc_path: Some("public/output/langchain_en".to_string()),
            chapters: Some(chapters(&[
                ("chat_model", "01_chat_model_.md", "Chat Model"),
                ("prompt_template", "02_prompt_template_.md", "Prompt Template"),
                ("output_parser", "03_output_parser_.md", "Output Parser"),
                ("runnable", "04_runnable__lcel__.md", "Runnable (LCEL)"),
                ("tool", "05_tool_.md", "Tool"),
                ("agent_executor", "06_agent_executor_.md", "Agent Executor"),
                ("callbacks", "07_callbacks_.md", "Callbacks"),
            ])),
        },
        Repository {
            id: "anthropics/prompt-eng-interactive-tutorial".to_string(),
            owner: "anthropics".to_string(),
            name: "prompt-eng-interactive-tutorial".to_string(),
            description: "Step-by-step course on prompt engineering, from prompt structure to avoiding hallucinations.".to_string(),
            url: "https://github.com/anthropics/prompt-eng-interactive-tutorial".to_string(),
            doc_path: Some("public/output/prompt-eng-interactive-tutorial_en".to_string()),
            chapters: Some(chapters(&[
                ("basic_prompt_structure", "01_basic_prompt_structure_.md", "Basic Prompt Structure"),
                ("being_clear_and_direct", "02_being_clear_and_direct_.md", "Being Clear and Direct"),
                ("assigning_roles", "03_assigning_roles__role_prompting__.md", "Assigning Roles (Role Prompting)"),
                ("separating_data", "04_separating_data_and_instructions_.md", "Separating Data and Instructions"),
                ("formatting_output", "05_formatting_output_and_speaking_for_claude_.md", "Formatting Output"),
                ("precognition", "06_precognition__thinking_step_by_step__.md", "Precognition (Thinking Step by Step)"),
                ("using_examples", "07_using_examples__few_shot_prompting__.md", "Using Examples (Few-Shot Prompting)"),
                ("avoiding_hallucinations", "08_avoiding_hallucinations_.md", "Avoiding Hallucinations"),
            ])),
        },
    ]
}
