use scraper::{ElementRef, Html, Selector};

/// Tags dropped from inside an `<article>`/`<main>` container.
const CONTAINER_NOISE_TAGS: &[&str] = &["script", "style", "nav", "aside", "footer", "form"];

/// Tags dropped when falling back to the whole page.
const PAGE_NOISE_TAGS: &[&str] = &[
    "script", "style", "nav", "footer", "header", "aside", "form", "noscript",
];

/// Article text from the first `<article>`, else the first `<main>`,
/// else the whole page.
pub fn extract_article(html: &str) -> String {
    let document = Html::parse_document(html);

    if let Some(container) = find_container(&document) {
        return normalize_lines(&visible_text(container, CONTAINER_NOISE_TAGS));
    }

    page_text(&document)
}

/// Visible text of the whole page with navigation chrome removed.
pub fn extract_text(html: &str) -> String {
    let document = Html::parse_document(html);
    page_text(&document)
}

fn page_text(document: &Html) -> String {
    normalize_lines(&visible_text(document.root_element(), PAGE_NOISE_TAGS))
}

fn find_container(document: &Html) -> Option<ElementRef<'_>> {
    ["article", "main"].iter().find_map(|tag| {
        let selector = Selector::parse(tag).ok()?;
        document.select(&selector).next()
    })
}

/// Text nodes under `root`, one per line, skipping `noise` subtrees.
fn visible_text(root: ElementRef<'_>, noise: &[&str]) -> String {
    let mut segments = Vec::new();
    collect_text(root, noise, &mut segments);
    segments.join("\n")
}

fn collect_text<'a>(element: ElementRef<'a>, noise: &[&str], out: &mut Vec<&'a str>) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                out.push(trimmed);
            }
        } else if let Some(child_element) = ElementRef::wrap(child) {
            if noise.contains(&child_element.value().name()) {
                continue;
            }
            collect_text(child_element, noise, out);
        }
    }
}

/// Trims every line and drops blank ones.
pub fn normalize_lines(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_article_preferred_over_page() {
        let html = r#"<html><body>
            <header>Site header</header>
            <article>
                <h1>Enyimba host Kano Pillars</h1>
                <p>Kickoff is at 4pm on Sunday.</p>
                <script>var tracking = 1;</script>
                <aside>Related stories</aside>
            </article>
            <footer>Copyright</footer>
        </body></html>"#;

        let text = extract_article(html);

        assert_eq!(text, "Enyimba host Kano Pillars\nKickoff is at 4pm on Sunday.");
    }

    #[test]
    fn test_main_used_when_no_article() {
        let html = r#"<html><body>
            <nav>Home | Sport</nav>
            <main>
                <p>The Senate votes on Tuesday.</p>
                <form><input name="q">Search</form>
            </main>
        </body></html>"#;

        assert_eq!(extract_article(html), "The Senate votes on Tuesday.");
    }

    #[test]
    fn test_first_article_wins() {
        let html = r#"<html><body>
            <article><p>First story</p></article>
            <article><p>Second story</p></article>
        </body></html>"#;

        assert_eq!(extract_article(html), "First story");
    }

    #[test]
    fn test_header_kept_inside_container() {
        // header is only noise for full-page extraction
        let html = r#"<article><header>Match preview</header><p>Body</p></article>"#;

        assert_eq!(extract_article(html), "Match preview\nBody");
    }

    #[test]
    fn test_fallback_to_full_page() {
        let html = r#"<html><head><title>Fixtures</title><style>p { color: red }</style></head>
            <body>
                <header>Logo</header>
                <div><p>Matchday 12</p>
                <p>   Rivers United vs Remo Stars   </p></div>
                <noscript>Enable JavaScript</noscript>
                <footer>Contact</footer>
            </body></html>"#;

        let text = extract_article(html);

        assert_eq!(text, "Fixtures\nMatchday 12\nRivers United vs Remo Stars");
        assert_eq!(text, extract_text(html));
    }

    #[test]
    fn test_empty_article_yields_empty_text() {
        let html = r#"<html><body><article><script>x()</script></article><p>Outside</p></body></html>"#;

        assert_eq!(extract_article(html), "");
    }

    #[test]
    fn test_normalize_lines() {
        assert_eq!(normalize_lines("  a  \n\n\t\n b\n"), "a\nb");
        assert_eq!(normalize_lines(""), "");
    }
}
