use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;
use url::Url;

const CONTEXT_MAX_CHARS: usize = 200;

/// Block-level ancestors whose text describes a link.
const CONTEXT_TAGS: &[&str] = &["p", "li", "div", "h1", "h2", "h3", "h4", "article"];

const SKIPPED_PREFIXES: &[&str] = &["#", "javascript:", "mailto:", "tel:"];

/// A same-site link offered to the link selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkInfo {
    pub url: String,
    #[serde(rename = "text")]
    pub anchor_text: String,
    pub context: String,
}

/// Same-host links in document order, canonicalized and deduplicated.
pub fn extract_links_with_context(html: &str, base_url: &str) -> Vec<LinkInfo> {
    let base = match Url::parse(base_url) {
        Ok(base) => base,
        Err(e) => {
            debug!("Unparsable base URL {}: {}", base_url, e);
            return Vec::new();
        }
    };
    let Ok(anchor_selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let base_netloc = netloc(&base);
    let document = Html::parse_document(html);
    let mut seen: HashSet<String> = HashSet::new();
    let mut links = Vec::new();

    for anchor in document.select(&anchor_selector) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let Some(url) = canonical_link(&base, &base_netloc, href) else {
            continue;
        };
        if !seen.insert(url.clone()) {
            continue;
        }

        let anchor_text = collapse_whitespace(&anchor.text().collect::<String>());
        if anchor_text.is_empty() {
            continue;
        }

        links.push(LinkInfo {
            url,
            anchor_text,
            context: link_context(anchor),
        });
    }

    debug!("Extracted {} links from {}", links.len(), base_url);
    links
}

/// Resolves `href` against `base`; `None` when it is not a same-host http(s) link.
fn canonical_link(base: &Url, base_netloc: &str, href: &str) -> Option<String> {
    let href = href.trim();
    let lowered = href.to_ascii_lowercase();
    if SKIPPED_PREFIXES.iter().any(|prefix| lowered.starts_with(prefix)) {
        return None;
    }

    let mut resolved = base.join(href).ok()?;
    if !matches!(resolved.scheme(), "http" | "https") {
        return None;
    }
    if netloc(&resolved) != base_netloc {
        return None;
    }

    resolved.set_fragment(None);
    Some(resolved.to_string())
}

/// `[user[:password]@]host[:port]`, compared verbatim.
fn netloc(url: &Url) -> String {
    let mut netloc = String::new();
    if !url.username().is_empty() || url.password().is_some() {
        netloc.push_str(url.username());
        if let Some(password) = url.password() {
            netloc.push(':');
            netloc.push_str(password);
        }
        netloc.push('@');
    }
    match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => netloc.push_str(&format!("{}:{}", host, port)),
        (Some(host), None) => netloc.push_str(host),
        _ => {}
    }
    netloc
}

fn link_context(anchor: ElementRef<'_>) -> String {
    let container = anchor
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|element| CONTEXT_TAGS.contains(&element.value().name()));

    match container {
        Some(element) => {
            let text = collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "));
            text.chars().take(CONTEXT_MAX_CHARS).collect()
        }
        None => String::new(),
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://punchng.com/topics/news/";

    #[test]
    fn test_same_domain_links_only() {
        let html = r#"<html><body>
            <ul>
                <li><a href="/senate-passes-budget/">Senate passes budget</a></li>
                <li><a href="https://punchng.com/naira-falls/">Naira falls</a></li>
                <li><a href="https://www.bbc.com/news/world">BBC World</a></li>
                <li><a href="https://sub.punchng.com/other">Subdomain</a></li>
            </ul>
        </body></html>"#;

        let links = extract_links_with_context(html, BASE);

        let urls: Vec<&str> = links.iter().map(|l| l.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://punchng.com/senate-passes-budget/",
                "https://punchng.com/naira-falls/",
            ]
        );
    }

    #[test]
    fn test_skips_non_navigational_targets() {
        let html = r##"<body>
            <a href="#top">Back to top</a>
            <a href="javascript:void(0)">Menu</a>
            <a href="mailto:desk@punchng.com">Email</a>
            <a href="tel:+2348000000000">Call</a>
            <a href="ftp://punchng.com/archive">Archive</a>
            <a href="/real-story/">Real story</a>
        </body>"##;

        let links = extract_links_with_context(html, BASE);

        assert_eq!(links.len(), 1);
        assert_eq!(links[0].url, "https://punchng.com/real-story/");
    }

    #[test]
    fn test_fragment_stripped_and_query_kept() {
        let html = r#"<body>
            <p><a href="/story?id=42#comments">Story 42</a></p>
            <p><a href="/story?id=42">Story 42 again</a></p>
        </body>"#;

        let links = extract_links_with_context(html, BASE);

        assert_eq!(links.len(), 1);
        assert_eq!(links[0].url, "https://punchng.com/story?id=42");
        assert_eq!(links[0].anchor_text, "Story 42");
    }

    #[test]
    fn test_empty_anchor_text_skipped() {
        let html = r#"<body>
            <a href="/photo-story/"><img src="x.jpg"></a>
            <a href="/text-story/">   Text story   </a>
        </body>"#;

        let links = extract_links_with_context(html, BASE);

        assert_eq!(links.len(), 1);
        assert_eq!(links[0].anchor_text, "Text story");
    }

    #[test]
    fn test_context_from_nearest_block() {
        let html = r#"<body>
            <div class="card">
                <h3><a href="/fuel-price/">Fuel price rises</a></h3>
                <p>Marketers say pump prices will climb again.</p>
            </div>
            <span><a href="/orphan/">Orphan link</a></span>
        </body>"#;

        let links = extract_links_with_context(html, BASE);

        assert_eq!(links[0].context, "Fuel price rises");
        assert_eq!(links[1].context, "");
    }

    #[test]
    fn test_context_truncated() {
        let long = "word ".repeat(100);
        let html = format!(r#"<p><a href="/long/">Long</a> {}</p>"#, long);

        let links = extract_links_with_context(&html, BASE);

        assert_eq!(links[0].context.chars().count(), CONTEXT_MAX_CHARS);
        assert!(links[0].context.starts_with("Long word"));
    }

    #[test]
    fn test_no_duplicate_urls_or_empty_text() {
        let html = r#"<body>
            <a href="/a/">A</a><a href="/a/">A</a><a href="/a/#x">A</a>
            <a href="/b/">B</a><a href="b/">relative B</a>
        </body>"#;

        let links = extract_links_with_context(html, "https://npfl.ng/fixtures/");

        let mut seen = HashSet::new();
        for link in &links {
            assert!(seen.insert(link.url.clone()));
            assert!(!link.anchor_text.is_empty());
        }
        assert_eq!(links.len(), 3);
        assert_eq!(links[2].url, "https://npfl.ng/fixtures/b/");
    }

    #[test]
    fn test_invalid_base_yields_nothing() {
        let html = r#"<a href="/x/">X</a>"#;
        assert!(extract_links_with_context(html, "not a url").is_empty());
    }

    #[test]
    fn test_links_with_credentials_rejected() {
        let html = r#"<p>
            <a href="https://attacker:pw@punchng.com/x">Breaking</a>
            <a href="https://editor@punchng.com/y">Politics</a>
            <a href="/news/z">Sports</a>
        </p>"#;

        let links = extract_links_with_context(html, BASE);

        let urls: Vec<&str> = links.iter().map(|l| l.url.as_str()).collect();
        assert_eq!(urls, vec!["https://punchng.com/news/z"]);
    }

    #[test]
    fn test_serializes_anchor_text_as_text() {
        let link = LinkInfo {
            url: "https://npfl.ng/fixtures".to_string(),
            anchor_text: "Fixtures".to_string(),
            context: "".to_string(),
        };
        let json = serde_json::to_value(&link).unwrap();
        assert_eq!(json["text"], "Fixtures");
    }
}
