//! Podcast script viewer: typed document model, discovery and filtering.
//!
//! Podcast documents are produced by an external generation pipeline and
//! only read here. Parsing is strict on the fields the viewer relies on
//! (ids, speakers, text) and ignores everything else.
//!
//! # Discovery
//!
//! The content server offers no directory listing, so [`load_podcast`]
//! probes `path_templates × ids` one candidate at a time and stops at the
//! first document that parses. When `podcast.manifest` is configured the
//! manifest's list replaces the guesswork. Callers substitute
//! [`PodcastDocument::mock`] when nothing is found, so the viewer always has
//! something to show.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::config::PodcastConfig;
use crate::error::PodcastError;
use crate::fetch::ContentFetcher;
use crate::loader::{load_text, looks_like_html};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PodcastDocument {
    pub metadata: PodcastMetadata,
    #[serde(default)]
    pub participants: Vec<Participant>,
    pub clusters: Vec<Cluster>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PodcastMetadata {
    pub podcast_id: String,
    #[serde(default)]
    pub generation_config: Map<String, Value>,
    #[serde(default)]
    pub statistics: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub personality: String,
    #[serde(default)]
    pub background: String,
    #[serde(default)]
    pub speaking_style: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    #[serde(deserialize_with = "id_string")]
    pub cluster_id: String,
    pub cluster_title: String,
    #[serde(default)]
    pub mckinsey_summary: String,
    pub dialogues: Vec<Dialogue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dialogue {
    #[serde(deserialize_with = "id_string")]
    pub dialogue_id: String,
    pub speaker: String,
    pub text: String,
    pub emotion: String,
    /// Free-form hint for the (unimplemented) video renderer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visualization: Option<Value>,
}

/// Ids appear as strings or integers depending on the generator version.
fn id_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(i64),
    }
    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}

impl PodcastDocument {
    /// Display name for a dialogue's `speaker`, which may be a participant id
    /// or already a name.
    pub fn speaker_name<'a>(&'a self, speaker: &'a str) -> &'a str {
        self.participants
            .iter()
            .find(|p| p.id == speaker)
            .map(|p| p.name.as_str())
            .unwrap_or(speaker)
    }

    pub fn dialogue_count(&self) -> usize {
        self.clusters.iter().map(|c| c.dialogues.len()).sum()
    }

    /// Placeholder document shown when no generated podcast exists.
    pub fn mock(owner: &str, repo: &str) -> Self {
        let line = |id: &str, speaker: &str, emotion: &str, text: String| Dialogue {
            dialogue_id: id.to_string(),
            speaker: speaker.to_string(),
            text,
            emotion: emotion.to_string(),
            visualization: None,
        };
        let mut statistics = Map::new();
        statistics.insert("total_clusters".to_string(), Value::from(2));
        statistics.insert("total_dialogues".to_string(), Value::from(4));

        PodcastDocument {
            metadata: PodcastMetadata {
                podcast_id: format!("{}_{}_sample", owner, repo),
                generation_config: Map::new(),
                statistics,
            },
            participants: vec![
                Participant {
                    id: "host".to_string(),
                    name: "Host".to_string(),
                    role: "host".to_string(),
                    personality: "curious".to_string(),
                    background: String::new(),
                    speaking_style: "conversational".to_string(),
                },
                Participant {
                    id: "expert".to_string(),
                    name: "Expert".to_string(),
                    role: "guest".to_string(),
                    personality: "patient".to_string(),
                    background: format!("Maintainer-level knowledge of {}", repo),
                    speaking_style: "explanatory".to_string(),
                },
            ],
            clusters: vec![
                Cluster {
                    cluster_id: "overview".to_string(),
                    cluster_title: "What is this project?".to_string(),
                    mckinsey_summary: format!("A first look at {}/{}.", owner, repo),
                    dialogues: vec![
                        line("1", "host", "excited", format!("Today we are looking at {}/{}. What problem does it solve?", owner, repo)),
                        line("2", "expert", "calm", "This is a sample script. No podcast has been generated for this repository yet.".to_string()),
                    ],
                },
                Cluster {
                    cluster_id: "next_steps".to_string(),
                    cluster_title: "Where to go next".to_string(),
                    mckinsey_summary: "Pointers to the generated tutorial.".to_string(),
                    dialogues: vec![
                        line("3", "host", "curious", "Where should a newcomer start?".to_string()),
                        line("4", "expert", "friendly", "Open the documentation view and begin with the first chapter.".to_string()),
                    ],
                },
            ],
        }
    }
}

/// Parses a podcast document, failing on missing required fields.
pub fn parse_podcast(path: &str, text: &str) -> Result<PodcastDocument, PodcastError> {
    serde_json::from_str(text).map_err(|source| PodcastError::Parse {
        path: path.to_string(),
        source,
    })
}

#[derive(Debug, Deserialize)]
struct Manifest {
    podcasts: Vec<String>,
}

fn expand_template(template: &str, owner: &str, repo: &str, id: &str) -> String {
    template
        .replace("{owner}", owner)
        .replace("{repo}", repo)
        .replace("{id}", id)
}

/// Candidate paths from the template × id grid, templates outermost.
pub fn candidate_paths(config: &PodcastConfig, owner: &str, repo: &str) -> Vec<String> {
    config
        .path_templates
        .iter()
        .flat_map(|t| config.ids.iter().map(move |id| expand_template(t, owner, repo, id)))
        .collect()
}

async fn manifest_paths(
    fetcher: &dyn ContentFetcher,
    manifest: &str,
    owner: &str,
    repo: &str,
) -> Result<Vec<String>, PodcastError> {
    let path = expand_template(manifest, owner, repo, "");
    let text = load_text(fetcher, &path).await?;
    let manifest: Manifest = serde_json::from_str(&text)
        .map_err(|source| PodcastError::Parse { path, source })?;
    Ok(manifest.podcasts)
}

/// Finds and parses the podcast for `owner/repo`.
///
/// Candidates are tried sequentially; the first successful, parseable
/// response wins. Returns the path it was loaded from with the document.
pub async fn load_podcast(
    fetcher: &dyn ContentFetcher,
    config: &PodcastConfig,
    owner: &str,
    repo: &str,
) -> Result<(String, PodcastDocument), PodcastError> {
    let candidates = match config.manifest.as_deref() {
        Some(manifest) => match manifest_paths(fetcher, manifest, owner, repo).await {
            Ok(paths) => paths,
            Err(e) => {
                warn!(error = %e, "podcast manifest unavailable, probing candidate paths");
                candidate_paths(config, owner, repo)
            }
        },
        None => candidate_paths(config, owner, repo),
    };

    for path in &candidates {
        let response = match fetcher.fetch(path).await {
            Ok(r) => r,
            Err(e) => {
                debug!(path = %path, error = %e, "podcast candidate unreachable");
                continue;
            }
        };
        if !response.is_success() || looks_like_html(&response.body) {
            debug!(path = %path, status = response.status, "podcast candidate missing");
            continue;
        }
        match parse_podcast(path, &response.body) {
            Ok(doc) => return Ok((path.clone(), doc)),
            Err(e) => debug!(error = %e, "podcast candidate rejected"),
        }
    }

    Err(PodcastError::NotFound {
        owner: owner.to_string(),
        repo: repo.to_string(),
        attempts: candidates.len(),
    })
}

/// Loads the podcast, or the mock document when none can be found.
pub async fn load_podcast_or_mock(
    fetcher: &dyn ContentFetcher,
    config: &PodcastConfig,
    owner: &str,
    repo: &str,
) -> (Option<String>, PodcastDocument) {
    match load_podcast(fetcher, config, owner, repo).await {
        Ok((path, doc)) => (Some(path), doc),
        Err(e) => {
            warn!(error = %e, "using sample podcast");
            (None, PodcastDocument::mock(owner, repo))
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Filtering
// ═══════════════════════════════════════════════════════════════════════

/// A dialogue matches when its text, its raw `speaker` field, or the
/// speaker's display name contains `needle` (already lowercased).
fn dialogue_matches(doc: &PodcastDocument, dialogue: &Dialogue, needle: &str) -> bool {
    dialogue.text.to_lowercase().contains(needle)
        || dialogue.speaker.to_lowercase().contains(needle)
        || doc.speaker_name(&dialogue.speaker).to_lowercase().contains(needle)
}

/// Clusters visible under the current selection and search query.
///
/// A selected cluster restricts the result to that cluster. A non-empty
/// query keeps clusters with at least one matching dialogue. Both apply
/// together. Document order is preserved. The query is matched as typed,
/// whitespace included.
pub fn filter_clusters<'a>(
    doc: &'a PodcastDocument,
    selected_cluster_id: Option<&str>,
    search_query: &str,
) -> Vec<&'a Cluster> {
    let needle = search_query.to_lowercase();
    doc.clusters
        .iter()
        .filter(|c| selected_cluster_id.map_or(true, |id| c.cluster_id == id))
        .filter(|c| {
            needle.is_empty() || c.dialogues.iter().any(|d| dialogue_matches(doc, d, &needle))
        })
        .collect()
}

/// Dialogues of the given clusters, flattened in order and filtered per
/// dialogue by the search query.
pub fn filter_dialogues<'a>(
    doc: &PodcastDocument,
    clusters: &[&'a Cluster],
    search_query: &str,
) -> Vec<&'a Dialogue> {
    let needle = search_query.to_lowercase();
    clusters
        .iter()
        .flat_map(|c| c.dialogues.iter())
        .filter(|d| needle.is_empty() || dialogue_matches(doc, d, &needle))
        .collect()
}
