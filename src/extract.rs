//! Block extraction from HTML documents.
//!
//! Turns a raw HTML document into an ordered sequence of [`Block`]s: the
//! visible text, inner HTML, and structural path of every allow-listed
//! container element large enough to be worth indexing. Parsing is
//! error-recovering (html5ever), so malformed markup degrades to best-effort
//! structure instead of failing.

use scraper::{ElementRef, Html, Selector};

/// Elements removed entirely before extraction; their text must never
/// surface in a block or chunk.
const STRIP_SELECTOR: &str = "script, style, noscript, head, footer, nav, svg, iframe";

/// Container elements considered as block candidates, in document order.
const BLOCK_SELECTOR: &str = "article, section, main, div, p, li, h1, h2, h3, h4";

/// Minimum cleaned-text length (in characters) for a block to qualify.
const MIN_BLOCK_CHARS: usize = 40;

/// An extracted content unit: cleaned text plus its source HTML and locator.
#[derive(Debug, Clone)]
pub struct Block {
    /// Whitespace-collapsed visible text, longer than [`MIN_BLOCK_CHARS`]
    /// (except for the whole-document fallback, which may be shorter).
    pub text: String,
    /// Raw inner HTML of the source element; may be empty.
    pub html: String,
    /// `tag#id.class1.class2` locator, or `"/"` for the fallback block.
    pub path: String,
}

/// Extracts qualifying blocks from an HTML document, in document order.
///
/// Nested containers each produce their own block (a `div` inside a `div`
/// yields both); downstream prefix-dedup removes the resulting repeats.
/// When nothing qualifies, a single fallback block covers the whole
/// document's visible text with `path = "/"`.
pub fn extract_blocks(html: &str) -> Vec<Block> {
    let mut document = Html::parse_document(html);
    strip_non_content(&mut document);

    let Ok(selector) = Selector::parse(BLOCK_SELECTOR) else {
        return Vec::new();
    };

    let mut blocks = Vec::new();
    for element in document.select(&selector) {
        let text = visible_text(element);
        if text.chars().count() <= MIN_BLOCK_CHARS {
            continue;
        }
        blocks.push(Block {
            text,
            html: element.inner_html(),
            path: element_path(&element),
        });
    }

    if blocks.is_empty() {
        blocks.push(Block {
            text: visible_text(document.root_element()),
            html: body_inner_html(&document),
            path: "/".to_string(),
        });
    }

    blocks
}

/// Extracts the document `<title>`, if present and non-empty.
pub fn document_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("title").ok()?;
    let title = document.select(&selector).next()?;
    let text = clean_text(&title.text().collect::<Vec<_>>().join(" "));
    (!text.is_empty()).then_some(text)
}

/// Collapse internal whitespace to single spaces and trim.
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Detach every non-content subtree so neither text extraction nor
/// `inner_html` serialization can see it.
fn strip_non_content(document: &mut Html) {
    let Ok(selector) = Selector::parse(STRIP_SELECTOR) else {
        return;
    };
    let ids: Vec<_> = document.select(&selector).map(|el| el.id()).collect();
    for id in ids {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }
}

/// Descendant text nodes joined with single spaces, then cleaned.
fn visible_text(element: ElementRef) -> String {
    let joined = element
        .text()
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    clean_text(&joined)
}

/// Structural locator: `tag#id.class1.class2`, omitting absent parts.
fn element_path(element: &ElementRef) -> String {
    let value = element.value();
    let tag = value.name();
    let classes: Vec<&str> = value.classes().collect();
    let class_part = if classes.is_empty() {
        String::new()
    } else {
        format!(".{}", classes.join("."))
    };
    match value.attr("id") {
        Some(id) => format!("{}#{}{}", tag, id, class_part),
        None => format!("{}{}", tag, class_part),
    }
}

fn body_inner_html(document: &Html) -> String {
    let Ok(selector) = Selector::parse("body") else {
        return String::new();
    };
    document
        .select(&selector)
        .next()
        .map(|body| body.inner_html())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualifying_paragraph_becomes_block() {
        let html = "<p>This paragraph is comfortably longer than the forty character minimum.</p>";
        let blocks = extract_blocks(html);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].path, "p");
        assert!(blocks[0].text.starts_with("This paragraph"));
    }

    #[test]
    fn path_includes_id_and_classes() {
        let html = r#"<div id="intro" class="lead prose">An introductory block with more than forty characters of text.</div>"#;
        let blocks = extract_blocks(html);
        assert_eq!(blocks[0].path, "div#intro.lead.prose");
    }

    #[test]
    fn path_without_id_keeps_classes() {
        let html = r#"<section class="docs">A section block that clears the length threshold without any id.</section>"#;
        let blocks = extract_blocks(html);
        assert_eq!(blocks[0].path, "section.docs");
    }

    #[test]
    fn short_blocks_are_filtered() {
        let html = "<p>too short</p>";
        let blocks = extract_blocks(html);
        // Fallback block, not the paragraph
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].path, "/");
        assert_eq!(blocks[0].text, "too short");
    }

    #[test]
    fn script_and_style_text_is_stripped() {
        let html = "<div><script>evil()</script><style>.x{}</style>Visible text here that is long enough to pass the forty character minimum.</div>";
        let blocks = extract_blocks(html);
        assert_eq!(blocks.len(), 1);
        assert!(!blocks[0].text.contains("evil"));
        assert!(!blocks[0].html.contains("evil"));
        assert!(blocks[0].text.starts_with("Visible text"));
    }

    #[test]
    fn nav_and_footer_are_stripped() {
        let html = "<nav>site navigation links</nav><article>Actual article body with plenty of characters to qualify as a block.</article><footer>copyright</footer>";
        let blocks = extract_blocks(html);
        assert_eq!(blocks.len(), 1);
        assert!(!blocks[0].text.contains("navigation"));
        assert!(!blocks[0].text.contains("copyright"));
    }

    #[test]
    fn nested_containers_each_qualify() {
        let html = r#"<div class="outer"><p>Inner paragraph text that is also longer than forty characters total.</p></div>"#;
        let blocks = extract_blocks(html);
        // Outer div first (pre-order), then the paragraph
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].path, "div.outer");
        assert_eq!(blocks[1].path, "p");
        assert_eq!(blocks[0].text, blocks[1].text);
    }

    #[test]
    fn whitespace_is_collapsed() {
        let html = "<p>Lots   of\n\n   internal    whitespace collapses down to single spaces.</p>";
        let blocks = extract_blocks(html);
        assert_eq!(
            blocks[0].text,
            "Lots of internal whitespace collapses down to single spaces."
        );
    }

    #[test]
    fn empty_document_yields_empty_fallback() {
        let blocks = extract_blocks("");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].path, "/");
        assert!(blocks[0].text.is_empty());
    }

    #[test]
    fn malformed_markup_does_not_panic() {
        let blocks = extract_blocks("<div><p>unclosed <b>tags <span>everywhere");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].path, "/");
    }

    #[test]
    fn title_is_extracted_before_head_stripping() {
        let html = "<html><head><title>  Page  Title </title></head><body><p>body</p></body></html>";
        assert_eq!(document_title(html), Some("Page Title".to_string()));
        assert_eq!(document_title("<p>no title</p>"), None);
    }
}
