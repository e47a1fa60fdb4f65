//! End-to-end chunking pipeline tests against realistic page markup.

use websift::chunk::chunk_page;
use websift::extract::extract_blocks;
use websift::tokenizer::{HeuristicCounter, TokenCounter};

const ARTICLE_PAGE: &str = r#"<html>
<head><title>Release Engineering Notes</title><style>body { margin: 0 }</style></head>
<body>
<nav class="top"><a href="/">Home</a> <a href="/docs">Docs</a></nav>
<main id="content">
  <h1>Release engineering for small teams explained carefully</h1>
  <p class="intro">Shipping software on a schedule is mostly a matter of removing surprises. A release that needs heroics was broken long before the release day arrived.</p>
  <section id="pipeline" class="deep-dive">
    <h2>Pipelines</h2>
    <p>Every change rides the same pipeline from commit to production. The pipeline builds the artifact once, then promotes that identical artifact through each environment in turn.</p>
    <p>Rollbacks are rehearsed the same way deployments are. If rolling back requires a different procedure than rolling forward, it will fail exactly when it matters most.</p>
  </section>
  <script>analytics.track("pageview")</script>
</main>
<footer>Published under CC-BY. All rights reserved where applicable.</footer>
</body>
</html>"#;

#[test]
fn article_page_produces_bounded_ordered_chunks() {
    let counter = HeuristicCounter;
    let chunks = chunk_page("page1", ARTICLE_PAGE, 30, &counter).unwrap();
    assert!(chunks.len() >= 2, "expected multiple chunks, got {}", chunks.len());

    for (i, chunk) in chunks.iter().enumerate() {
        assert_eq!(chunk.chunk_index, i as i64);
        assert!(!chunk.text.is_empty());
        assert!(counter.count(&chunk.text).unwrap() <= 30);
        assert_eq!(chunk.page_id, "page1");
    }

    // Document order is preserved: the heading text precedes pipeline text.
    let all = chunks.iter().map(|c| c.text.as_str()).collect::<Vec<_>>().join(" ");
    let heading = all.find("Release engineering for small teams").unwrap();
    let rollback = all.find("Rollbacks are rehearsed").unwrap();
    assert!(heading < rollback);
}

#[test]
fn stripped_elements_never_leak() {
    let chunks = chunk_page("page1", ARTICLE_PAGE, 500, &HeuristicCounter).unwrap();
    for chunk in &chunks {
        assert!(!chunk.text.contains("analytics"));
        assert!(!chunk.text.contains("Home"));
        assert!(!chunk.text.contains("CC-BY"));
        assert!(!chunk.text.contains("margin"));
        assert!(!chunk.html.contains("analytics"));
    }
}

#[test]
fn paths_point_into_the_document() {
    let blocks = extract_blocks(ARTICLE_PAGE);
    let paths: Vec<&str> = blocks.iter().map(|b| b.path.as_str()).collect();
    assert!(paths.contains(&"main#content"));
    assert!(paths.contains(&"section#pipeline.deep-dive"));
    assert!(paths.contains(&"p.intro"));

    // The first chunk inherits the first qualifying block's path.
    let chunks = chunk_page("page1", ARTICLE_PAGE, 500, &HeuristicCounter).unwrap();
    assert_eq!(chunks[0].path, "main#content");
}

#[test]
fn nested_duplicate_content_is_deduplicated() {
    // main, section, and p all see the same sentence; only one chunk may
    // keep any given 200-char prefix.
    let chunks = chunk_page("page1", ARTICLE_PAGE, 30, &HeuristicCounter).unwrap();
    let mut keys: Vec<String> = chunks
        .iter()
        .map(|c| c.text.chars().take(200).collect::<String>().to_lowercase())
        .collect();
    let before = keys.len();
    keys.sort();
    keys.dedup();
    assert_eq!(before, keys.len(), "duplicate chunk prefixes survived");
}

#[test]
fn plain_text_document_falls_back_to_single_source() {
    let chunks = chunk_page("page1", "just a sentence with no markup at all", 500, &HeuristicCounter).unwrap();
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].path, "/");
    assert_eq!(chunks[0].text, "just a sentence with no markup at all");
}

#[test]
fn deterministic_across_runs() {
    let a = chunk_page("page1", ARTICLE_PAGE, 40, &HeuristicCounter).unwrap();
    let b = chunk_page("page1", ARTICLE_PAGE, 40, &HeuristicCounter).unwrap();
    assert_eq!(a.len(), b.len());
    for (x, y) in a.iter().zip(b.iter()) {
        assert_eq!(x.text, y.text);
        assert_eq!(x.path, y.path);
        assert_eq!(x.hash, y.hash);
        assert_eq!(x.chunk_index, y.chunk_index);
    }
}

#[test]
fn tighter_budget_never_loses_text() {
    let counter = HeuristicCounter;
    let wide = chunk_page("page1", ARTICLE_PAGE, 500, &counter).unwrap();
    let narrow = chunk_page("page1", ARTICLE_PAGE, 20, &counter).unwrap();
    assert!(narrow.len() >= wide.len());
    // The narrow chunking still contains every sentence the wide one does.
    let narrow_all = narrow.iter().map(|c| c.text.as_str()).collect::<Vec<_>>().join(" ");
    assert!(narrow_all.contains("promotes that identical artifact"));
    assert!(narrow_all.contains("rehearsed the same way"));
}
