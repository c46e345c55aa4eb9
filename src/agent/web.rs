//! HTML helpers for the web tools: DuckDuckGo result parsing and
//! article text extraction.

use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

/// One web search hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub title: String,
    pub href: String,
    pub body: String,
}

fn result_link_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"<a[^>]*\bclass="result__a"[^>]*>([\s\S]*?)</a>"#).expect("valid regex")
    })
}

fn result_snippet_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"<(?:a|td|div)[^>]*\bclass="result__snippet"[^>]*>([\s\S]*?)</(?:a|td|div)>"#)
            .expect("valid regex")
    })
}

fn result_body_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"class="[^"]*\bresult__body\b[^"]*""#).expect("valid regex"))
}

fn href_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"href="([^"]+)""#).expect("valid regex"))
}

fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>").expect("valid regex"))
}

fn non_content_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?is)<(script|style|noscript|nav|header|footer|aside|svg|form)\b[^>]*>.*?</(script|style|noscript|nav|header|footer|aside|svg|form)>",
        )
        .expect("valid regex")
    })
}

fn title_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("valid regex"))
}

/// Parse result entries from the DuckDuckGo HTML endpoint.
///
/// Each `result__body` block is read on its own, so a result without a
/// snippet never borrows the snippet of its neighbour.
pub fn parse_search_results(html: &str, max_results: usize) -> Vec<SearchHit> {
    result_blocks(html)
        .into_iter()
        .filter_map(parse_result_block)
        .take(max_results)
        .collect()
}

/// Split the page into one slice per result.
///
/// Falls back to splitting at each result link when the page carries no
/// `result__body` containers.
fn result_blocks(html: &str) -> Vec<&str> {
    let mut starts: Vec<usize> = result_body_regex().find_iter(html).map(|m| m.start()).collect();
    if starts.is_empty() {
        starts = result_link_regex().find_iter(html).map(|m| m.start()).collect();
    }

    starts
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = starts.get(i + 1).copied().unwrap_or(html.len());
            &html[start..end]
        })
        .collect()
}

fn parse_result_block(block: &str) -> Option<SearchHit> {
    let caps = result_link_regex().captures(block)?;
    let title = clean_fragment(&caps[1]);
    if title.is_empty() {
        return None;
    }

    let href = href_regex()
        .captures(caps.get(0)?.as_str())
        .and_then(|c| c.get(1))
        .map(|m| resolve_redirect(&html_decode(m.as_str())))
        .unwrap_or_default();
    let body = result_snippet_regex()
        .captures(block)
        .map(|c| clean_fragment(&c[1]))
        .unwrap_or_default();

    Some(SearchHit { title, href, body })
}

/// Unwrap DuckDuckGo's `/l/?uddg=<target>` redirect links.
fn resolve_redirect(href: &str) -> String {
    if let Some(pos) = href.find("uddg=") {
        let encoded = &href[pos + 5..];
        let encoded = encoded.split('&').next().unwrap_or(encoded);
        if let Ok(decoded) = urlencoding::decode(encoded) {
            return decoded.into_owned();
        }
    }
    if let Some(rest) = href.strip_prefix("//") {
        return format!("https://{}", rest);
    }
    href.to_string()
}

/// Strip tags, decode entities and collapse whitespace in a fragment.
fn clean_fragment(fragment: &str) -> String {
    let text = tag_regex().replace_all(fragment, "");
    collapse_whitespace(&html_decode(&text))
}

/// Page title, if the document has one.
pub fn extract_title(html: &str) -> Option<String> {
    title_regex()
        .captures(html)
        .map(|c| clean_fragment(&c[1]))
        .filter(|t| !t.is_empty())
}

/// Readable text of a page with scripts, styles and chrome removed.
pub fn extract_text(html: &str) -> String {
    let without_chrome = non_content_regex().replace_all(html, " ");
    let without_tags = tag_regex().replace_all(&without_chrome, " ");
    collapse_whitespace(&html_decode(&without_tags))
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Basic HTML entity decoding.
pub fn html_decode(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

/// Truncate to at most `max_chars` characters, on a char boundary.
pub fn truncate_chars(s: &str, max_chars: usize) -> (&str, bool) {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => (&s[..idx], true),
        None => (s, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DDG_SAMPLE: &str = r#"
<div class="result results_links results_links_deep web-result">
  <div class="links_main links_deep result__body">
    <h2 class="result__title">
      <a rel="nofollow" class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fwww.rust-lang.org%2F&amp;rut=abc">Rust <b>Programming</b> Language</a>
    </h2>
    <a class="result__snippet" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fwww.rust-lang.org%2F">A language empowering everyone to build reliable &amp; efficient software.</a>
  </div>
</div>
<div class="result results_links results_links_deep web-result">
  <div class="links_main links_deep result__body">
    <h2 class="result__title">
      <a rel="nofollow" class="result__a" href="https://doc.rust-lang.org/book/">The Rust Book</a>
    </h2>
    <a class="result__snippet" href="https://doc.rust-lang.org/book/">An introductory book about Rust.</a>
  </div>
</div>
"#;

    #[test]
    fn test_parse_search_results() {
        let hits = parse_search_results(DDG_SAMPLE, 5);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].title, "Rust Programming Language");
        assert_eq!(hits[0].href, "https://www.rust-lang.org/");
        assert_eq!(
            hits[0].body,
            "A language empowering everyone to build reliable & efficient software."
        );
        assert_eq!(hits[1].href, "https://doc.rust-lang.org/book/");
    }

    #[test]
    fn test_parse_search_results_limit_and_empty() {
        assert_eq!(parse_search_results(DDG_SAMPLE, 1).len(), 1);
        assert!(parse_search_results("<html>No results</html>", 5).is_empty());
    }

    #[test]
    fn test_result_without_snippet_keeps_pairing() {
        let html = r#"
<div class="links_main links_deep result__body">
  <a class="result__a" href="https://a.example/"><b></b></a>
  <a class="result__snippet" href="https://a.example/">Snippet of the untitled result.</a>
</div>
<div class="links_main links_deep result__body">
  <a class="result__a" href="https://b.example/">No snippet here</a>
</div>
<div class="links_main links_deep result__body">
  <a class="result__a" href="https://c.example/">Third</a>
  <a class="result__snippet" href="https://c.example/">Belongs to the third result.</a>
</div>
<div class="links_main links_deep result__body">
  <a class="result__a" href="https://d.example/">Fourth</a>
</div>
"#;
        let hits = parse_search_results(html, 3);
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].title, "No snippet here");
        assert_eq!(hits[0].body, "");
        assert_eq!(hits[1].title, "Third");
        assert_eq!(hits[1].body, "Belongs to the third result.");
        assert_eq!(hits[2].href, "https://d.example/");
    }

    #[test]
    fn test_parse_links_without_body_containers() {
        let html = r#"<a class="result__a" href="https://x.example/">X</a>
<a class="result__a" href="https://y.example/">Y</a>
<a class="result__snippet" href="https://y.example/">About Y.</a>"#;
        let hits = parse_search_results(html, 5);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].body, "");
        assert_eq!(hits[1].body, "About Y.");
    }

    #[test]
    fn test_extract_text_drops_scripts_and_nav() {
        let html = r#"<html><head><title>News &amp; Views</title><style>p{}</style></head>
<body><nav>Home | About</nav><script>var x = 1;</script>
<h1>Headline</h1><p>First   paragraph.</p><p>Second&nbsp;one.</p></body></html>"#;

        assert_eq!(extract_title(html).as_deref(), Some("News & Views"));
        let text = extract_text(html);
        assert!(text.contains("Headline First paragraph. Second one."));
        assert!(!text.contains("var x"));
        assert!(!text.contains("Home | About"));
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), ("hé", true));
        assert_eq!(truncate_chars("hi", 5), ("hi", false));
    }
}
