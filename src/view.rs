//! Documentation and podcast views.
//!
//! Pure presentation: everything here turns store state into HTML (or
//! passes raw markdown through) and never mutates anything. Relative links
//! to chapter files are rewritten to `{link_base}?link={filename}`, so a
//! click comes back to the server as a filename navigation request.

use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag};

use crate::models::{ActiveFile, Repository, ViewMode};
use crate::navigation::LoadPhase;
use crate::podcast::{filter_clusters, filter_dialogues, PodcastDocument};
use crate::registry::{find_chapter_by_id, neighbors, Registry};
use crate::store::{AppState, PodcastViewState};

/// Extracts the chapter filename an in-document href points at.
///
/// Returns `None` for external URLs, absolute paths, pure anchors, and
/// anything that is not a `.md` file. A leading `./` and any `#fragment` or
/// `?query` suffix are dropped.
pub fn link_target(href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') || href.starts_with('/') || href.contains(':') {
        return None;
    }
    let end = href.find(['#', '?']).unwrap_or(href.len());
    let mut path = &href[..end];
    while let Some(rest) = path.strip_prefix("./") {
        path = rest;
    }
    if path.is_empty() || !path.ends_with(".md") {
        return None;
    }
    Some(path.to_string())
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Percent-encodes a query parameter value.
pub fn encode_query(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for b in value.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}

/// Renders the current document according to the view mode.
///
/// `Html` runs the markdown through pulldown-cmark and rewrites chapter
/// links against `link_base`. `Markdown` shows the source, escaped, in a
/// `<pre>` block.
pub fn render_content(content: &str, mode: ViewMode, link_base: &str) -> String {
    match mode {
        ViewMode::Html => markdown_to_html(content, link_base),
        ViewMode::Markdown => format!(
            "<pre class=\"raw-markdown\">{}</pre>",
            escape_html(content)
        ),
    }
}

pub fn markdown_to_html(content: &str, link_base: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_FOOTNOTES);

    let parser = Parser::new_ext(content, options).map(|event| match event {
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) => {
            let dest_url = match link_target(&dest_url) {
                Some(filename) => {
                    CowStr::from(format!("{}?link={}", link_base, encode_query(&filename)))
                }
                None => dest_url,
            };
            Event::Start(Tag::Link {
                link_type,
                dest_url,
                title,
                id,
            })
        }
        other => other,
    });

    let mut out = String::with_capacity(content.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

// ═══════════════════════════════════════════════════════════════════════
// Pages
// ═══════════════════════════════════════════════════════════════════════

const STYLE: &str = "body{font-family:system-ui,sans-serif;margin:0;display:flex;min-height:100vh}\
nav{width:16rem;padding:1rem;border-right:1px solid #ddd;background:#fafafa}\
nav a.active{font-weight:bold}\
main{flex:1;padding:1rem 2rem;overflow:auto;max-height:100vh}\
.toolbar a{margin-right:1rem}\
.status{color:#666;font-size:.9em}\
pre{background:#f4f4f4;padding:1rem;overflow:auto}\
.cluster{border:1px solid #ddd;margin:1rem 0;padding:.5rem 1rem}\
.speaker{font-weight:bold}";

/// Wraps a body in a minimal HTML document.
pub fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\"><head><meta charset=\"utf-8\">\
         <title>{}</title><style>{}</style></head><body>{}</body></html>\n",
        escape_html(title),
        STYLE,
        body
    )
}

/// Home page: the registry browser plus a repository URL form.
pub fn render_home(registry: &Registry) -> String {
    let mut body = String::from(
        "<main><h1>Docs Navigator</h1>\
         <form method=\"get\" action=\"/\"><input name=\"url\" size=\"50\" \
         placeholder=\"https://github.com/owner/repo\"> <button>Open</button></form><ul>",
    );
    for repo in registry.repositories() {
        body.push_str(&format!(
            "<li><a href=\"/docs/{}/{}\">{}</a> ({} chapters) · <a href=\"/video/{}/{}\">podcast</a><br>\
             <span class=\"status\">{}</span></li>",
            escape_html(&repo.owner),
            escape_html(&repo.name),
            escape_html(&repo.id),
            repo.chapter_list().len(),
            escape_html(&repo.owner),
            escape_html(&repo.name),
            escape_html(&repo.description),
        ));
    }
    body.push_str("</ul></main>");
    page("Docs Navigator", &body)
}

fn docs_base(repo: &Repository) -> String {
    format!("/docs/{}/{}", repo.owner, repo.name)
}

fn sidebar(repo: &Repository, active: &ActiveFile) -> String {
    let base = docs_base(repo);
    let class = |is_active: bool| if is_active { " class=\"active\"" } else { "" };
    let mut out = format!(
        "<nav><h3>{}</h3><ul><li><a{} href=\"{}?chapter=index\">Overview</a></li>",
        escape_html(&repo.name),
        class(*active == ActiveFile::Index),
        escape_html(&base),
    );
    for chapter in repo.chapter_list() {
        let is_active = matches!(active, ActiveFile::Chapter(id) if *id == chapter.id);
        out.push_str(&format!(
            "<li><a{} href=\"{}?chapter={}\">{}</a></li>",
            class(is_active),
            escape_html(&base),
            encode_query(&chapter.id),
            escape_html(&chapter.title),
        ));
    }
    out.push_str("</ul></nav>");
    out
}

fn prev_next(repo: &Repository, active: &ActiveFile) -> String {
    let ActiveFile::Chapter(id) = active else {
        return match repo.chapter_list().first() {
            Some(first) => format!(
                "<p><a href=\"{}?chapter={}\">Start: {} →</a></p>",
                escape_html(&docs_base(repo)),
                encode_query(&first.id),
                escape_html(&first.title)
            ),
            None => String::new(),
        };
    };
    let base = docs_base(repo);
    let (prev, next) = neighbors(repo, id);
    let mut out = String::from("<p>");
    if let Some(p) = prev {
        out.push_str(&format!(
            "<a href=\"{}?chapter={}\">← {}</a> ",
            escape_html(&base),
            encode_query(&p.id),
            escape_html(&p.title)
        ));
    }
    if let Some(n) = next {
        out.push_str(&format!(
            "<a href=\"{}?chapter={}\">{} →</a>",
            escape_html(&base),
            encode_query(&n.id),
            escape_html(&n.title)
        ));
    }
    out.push_str("</p>");
    out
}

fn phase_label(phase: LoadPhase) -> &'static str {
    match phase {
        LoadPhase::Idle => "idle",
        LoadPhase::LoadingIndex | LoadPhase::LoadingChapter => "loading…",
        LoadPhase::Loaded => "loaded",
        LoadPhase::Failed => "failed",
    }
}

/// Documentation page for the store's current state.
pub fn render_docs_page(state: &AppState) -> String {
    let Some(repo) = state.repository.as_ref() else {
        return page(
            "Docs Navigator",
            &format!(
                "<main>{}</main>",
                render_content(&state.current_markdown_content, ViewMode::Html, "/")
            ),
        );
    };

    let base = docs_base(repo);
    let title = match &state.active_file {
        ActiveFile::Index => repo.id.clone(),
        ActiveFile::Chapter(id) => find_chapter_by_id(repo, id)
            .map(|c| format!("{} · {}", c.title, repo.id))
            .unwrap_or_else(|| repo.id.clone()),
    };

    let mut body = String::new();
    if state.navigation_open {
        body.push_str(&sidebar(repo, &state.active_file));
    }
    body.push_str(&format!(
        "<main id=\"content\" data-scroll-top=\"{}\"><div class=\"toolbar\">\
         <a href=\"/\">Home</a>\
         <a href=\"{base}?nav=toggle\">{}</a>\
         <a href=\"{base}?view={}\">{}</a>\
         <a href=\"/video/{}/{}\">Podcast</a>\
         <a href=\"{}\">Source</a>\
         <span class=\"status\">{} · {}</span></div>",
        state.scroll_top,
        if state.navigation_open { "Hide navigation" } else { "Show navigation" },
        state.view_mode.toggled().as_str(),
        match state.view_mode {
            ViewMode::Html => "View raw markdown",
            ViewMode::Markdown => "View rendered",
        },
        escape_html(&repo.owner),
        escape_html(&repo.name),
        escape_html(&repo.url),
        escape_html(&state.active_file.to_string()),
        phase_label(state.phase),
        base = escape_html(&base),
    ));
    body.push_str(&render_content(
        &state.current_markdown_content,
        state.view_mode,
        &base,
    ));
    body.push_str(&prev_next(repo, &state.active_file));
    body.push_str(&format!(
        "</main><script>document.getElementById('content').scrollTop={};</script>",
        state.scroll_top
    ));

    page(&title, &body)
}

/// Podcast script page with the current filter state applied.
pub fn render_podcast_page(
    owner: &str,
    repo: &str,
    doc: &PodcastDocument,
    source: Option<&str>,
    view: &PodcastViewState,
) -> String {
    let base = format!("/video/{}/{}", owner, repo);
    let clusters = filter_clusters(doc, view.selected_cluster_id.as_deref(), &view.search_query);

    let mut body = format!(
        "<main><p><a href=\"/\">Home</a> · <a href=\"/docs/{}/{}\">Documentation</a></p>\
         <h1>Podcast script: {}/{}</h1><p class=\"status\">{} · {} clusters · {} dialogues</p>\
         <form method=\"get\" action=\"{}\"><input name=\"q\" value=\"{}\" placeholder=\"Search dialogue\">\
         <select name=\"cluster\"><option value=\"\">All clusters</option>",
        escape_html(owner),
        escape_html(repo),
        escape_html(owner),
        escape_html(repo),
        match source {
            Some(path) => escape_html(path),
            None => "sample script (no generated podcast found)".to_string(),
        },
        doc.clusters.len(),
        doc.dialogue_count(),
        escape_html(&base),
        escape_html(&view.search_query),
    );
    for cluster in &doc.clusters {
        let selected = view.selected_cluster_id.as_deref() == Some(cluster.cluster_id.as_str());
        body.push_str(&format!(
            "<option value=\"{}\"{}>{}</option>",
            escape_html(&cluster.cluster_id),
            if selected { " selected" } else { "" },
            escape_html(&cluster.cluster_title)
        ));
    }
    body.push_str("</select> <button>Filter</button></form>");

    if clusters.is_empty() {
        body.push_str("<p>No dialogue matches the current filters.</p>");
    }

    for cluster in clusters {
        let expanded = view.expanded_clusters.contains(&cluster.cluster_id);
        body.push_str(&format!(
            "<section class=\"cluster\"><h2>{}</h2><p>{}</p><a href=\"{}?expand={}\">{}</a>",
            escape_html(&cluster.cluster_title),
            escape_html(&cluster.mckinsey_summary),
            escape_html(&base),
            encode_query(&cluster.cluster_id),
            if expanded { "Collapse" } else { "Expand" },
        ));
        if expanded {
            body.push_str("<ul>");
            for dialogue in filter_dialogues(doc, &[cluster], &view.search_query) {
                body.push_str(&format!(
                    "<li><span class=\"speaker\">{}</span> <em>({})</em>: {}</li>",
                    escape_html(doc.speaker_name(&dialogue.speaker)),
                    escape_html(&dialogue.emotion),
                    escape_html(&dialogue.text)
                ));
            }
            body.push_str("</ul>");
        }
        body.push_str("</section>");
    }
    body.push_str("</main>");

    page(&format!("Podcast · {}/{}", owner, repo), &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Chapter;

    fn repo() -> Repository {
        Repository {
            id: "acme/widgets".to_string(),
            owner: "acme".to_string(),
            name: "widgets".to_string(),
            description: "Widgets".to_string(),
            url: "https://github.com/acme/widgets".to_string(),
            doc_path: Some("public/output/widgets_en".to_string()),
            chapters: Some(vec![
                Chapter {
                    id: "intro".to_string(),
                    filename: "01_intro_.md".to_string(),
                    title: "Intro".to_string(),
                },
                Chapter {
                    id: "usage".to_string(),
                    filename: "02_usage_.md".to_string(),
                    title: "Usage".to_string(),
                },
            ]),
        }
    }

    #[test]
    fn test_link_target() {
        assert_eq!(link_target("01_intro_.md").as_deref(), Some("01_intro_.md"));
        assert_eq!(link_target("./01_intro_.md").as_deref(), Some("01_intro_.md"));
        assert_eq!(link_target("02_usage_.md#install").as_deref(), Some("02_usage_.md"));
        assert_eq!(link_target("../other/01_x_.md").as_deref(), Some("../other/01_x_.md"));
        assert_eq!(link_target("https://example.com/a.md"), None);
        assert_eq!(link_target("mailto:someone@example.com"), None);
        assert_eq!(link_target("#section"), None);
        assert_eq!(link_target("/abs/01_intro_.md"), None);
        assert_eq!(link_target("image.png"), None);
        assert_eq!(link_target(""), None);
    }

    #[test]
    fn test_html_mode_rewrites_chapter_links_only() {
        let md = "# Title\n\nSee [next](02_usage_.md) or [docs](https://example.com).";
        let out = render_content(md, ViewMode::Html, "/docs/acme/widgets");
        assert!(out.contains("<h1>Title</h1>"));
        assert!(out.contains("href=\"/docs/acme/widgets?link=02_usage_.md\""));
        assert!(out.contains("href=\"https://example.com\""));
    }

    #[test]
    fn test_markdown_mode_is_escaped_source() {
        let md = "# Title\n\n<b>bold</b>";
        let out = render_content(md, ViewMode::Markdown, "/docs/acme/widgets");
        assert!(out.starts_with("<pre"));
        assert!(out.contains("# Title"));
        assert!(out.contains("&lt;b&gt;bold&lt;/b&gt;"));
    }

    #[test]
    fn test_encode_query() {
        assert_eq!(encode_query("01_intro_.md"), "01_intro_.md");
        assert_eq!(encode_query("a b&c"), "a%20b%26c");
    }

    #[test]
    fn test_docs_page_respects_navigation_flag() {
        let mut state = AppState {
            repository: Some(repo()),
            active_file: ActiveFile::Chapter("intro".to_string()),
            current_markdown_content: "# Intro".to_string(),
            phase: LoadPhase::Loaded,
            ..AppState::default()
        };
        let html = render_docs_page(&state);
        assert!(html.contains("<nav>"));
        assert!(html.contains("class=\"active\" href=\"/docs/acme/widgets?chapter=intro\""));
        assert!(html.contains("Usage →"));
        assert!(html.contains("<title>Intro · acme/widgets</title>"));

        state.navigation_open = false;
        let html = render_docs_page(&state);
        assert!(!html.contains("<nav>"));
        assert!(html.contains("Show navigation"));
    }

    #[test]
    fn test_podcast_page_expands_only_selected_clusters() {
        let doc = PodcastDocument::mock("acme", "widgets");
        let mut view = PodcastViewState::default();
        view.expanded_clusters.insert("overview".to_string());

        let html = render_podcast_page("acme", "widgets", &doc, None, &view);
        assert!(html.contains("sample script"));
        assert!(html.contains("No podcast has been generated"));
        assert!(!html.contains("begin with the first chapter"));
        assert!(html.contains("<span class=\"speaker\">Expert</span>"));
    }
}
