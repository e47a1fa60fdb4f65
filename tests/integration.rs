use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn websift_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("websift");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let data_dir = root.join("data");
    fs::create_dir_all(&data_dir).unwrap();

    // Create test pages
    let pages_dir = root.join("pages");
    fs::create_dir_all(&pages_dir).unwrap();
    fs::write(
        pages_dir.join("ownership.html"),
        r#"<html><head><title>Ownership</title></head><body>
<nav>Home | Docs | About</nav>
<article>
<h1>Understanding ownership and borrowing in practice today</h1>
<p>Ownership is the mechanism through which memory safety is enforced without a garbage collector. Every value has a single owner, and the value is dropped when the owner goes out of scope.</p>
<p>Borrowing lets code read or mutate a value without taking ownership. Shared references permit many readers, while a mutable reference demands exclusive access for its entire lifetime.</p>
</article>
<footer>copyright notice</footer>
</body></html>"#,
    )
    .unwrap();
    fs::write(
        pages_dir.join("scripted.html"),
        r#"<div><script>trackVisitor()</script>Deployment pipelines rehearse every release in a staging environment before anything reaches production traffic.</div>"#,
    )
    .unwrap();

    let config_content = format!(
        r#"[db]
path = "{}/data/websift.sqlite"

[chunking]
max_tokens = 500

[server]
bind = "127.0.0.1:7431"
"#,
        root.display()
    );

    let config_path = config_dir.join("websift.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_websift(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = websift_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run websift binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

fn html_file(config_path: &Path, name: &str) -> String {
    config_path
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("pages")
        .join(name)
        .to_str()
        .unwrap()
        .to_string()
}

#[test]
fn test_init_creates_database() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_websift(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env();

    let (_, _, success1) = run_websift(&config_path, &["init"]);
    assert!(success1, "First init failed");

    let (_, _, success2) = run_websift(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
}

#[test]
fn test_ingest_from_file() {
    let (_tmp, config_path) = setup_test_env();
    run_websift(&config_path, &["init"]);

    let file = html_file(&config_path, "ownership.html");
    let (stdout, stderr, success) = run_websift(
        &config_path,
        &[
            "ingest",
            "https://example.com/ownership",
            "--html-file",
            &file,
        ],
    );
    assert!(success, "ingest failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("title: Ownership"));
    assert!(stdout.contains("chunks written:"));
    assert!(stdout.contains("ok"));
    assert!(!stdout.contains("chunks written: 0"));
}

#[test]
fn test_ingest_dry_run_writes_nothing() {
    let (_tmp, config_path) = setup_test_env();
    run_websift(&config_path, &["init"]);

    let file = html_file(&config_path, "ownership.html");
    let (stdout, _, success) = run_websift(
        &config_path,
        &[
            "ingest",
            "https://example.com/ownership",
            "--html-file",
            &file,
            "--dry-run",
        ],
    );
    assert!(success);
    assert!(stdout.contains("(dry-run)"));
    assert!(stdout.contains("chunks:"));

    let (stats, _, _) = run_websift(&config_path, &["stats"]);
    assert!(stats.contains("Pages:       0"), "stats: {}", stats);
}

#[test]
fn test_reingest_replaces_instead_of_duplicating() {
    let (_tmp, config_path) = setup_test_env();
    run_websift(&config_path, &["init"]);

    let file = html_file(&config_path, "ownership.html");
    let args = [
        "ingest",
        "https://example.com/ownership",
        "--html-file",
        &file,
    ];
    let (first, _, s1) = run_websift(&config_path, &args);
    let (second, _, s2) = run_websift(&config_path, &args);
    assert!(s1 && s2);
    assert_eq!(first, second, "re-ingest should report identical counts");

    let (stats, _, _) = run_websift(&config_path, &["stats"]);
    assert!(stats.contains("Pages:       1"), "stats: {}", stats);
}

#[test]
fn test_stats_counts_pages_and_chunks() {
    let (_tmp, config_path) = setup_test_env();
    run_websift(&config_path, &["init"]);

    let file = html_file(&config_path, "ownership.html");
    run_websift(
        &config_path,
        &[
            "ingest",
            "https://example.com/ownership",
            "--html-file",
            &file,
        ],
    );
    let file2 = html_file(&config_path, "scripted.html");
    run_websift(
        &config_path,
        &[
            "ingest",
            "https://example.com/scripted",
            "--html-file",
            &file2,
        ],
    );

    let (stdout, stderr, success) = run_websift(&config_path, &["stats"]);
    assert!(success, "stats failed: {}", stderr);
    assert!(stdout.contains("Pages:       2"), "stats: {}", stdout);
    assert!(stdout.contains("https://example.com/ownership"));
}

#[test]
fn test_search_requires_embedding_provider() {
    let (_tmp, config_path) = setup_test_env();
    run_websift(&config_path, &["init"]);

    let (_, stderr, success) = run_websift(&config_path, &["search", "ownership"]);
    assert!(!success, "search should fail without an embedding provider");
    assert!(stderr.contains("embeddings"), "stderr: {}", stderr);
}

#[test]
fn test_embed_pending_requires_provider() {
    let (_tmp, config_path) = setup_test_env();
    run_websift(&config_path, &["init"]);

    let (_, stderr, success) = run_websift(&config_path, &["embed", "pending"]);
    assert!(!success);
    assert!(stderr.contains("disabled"), "stderr: {}", stderr);
}

#[test]
fn test_get_unknown_page_fails() {
    let (_tmp, config_path) = setup_test_env();
    run_websift(&config_path, &["init"]);

    let (_, stderr, success) = run_websift(&config_path, &["get", "does-not-exist"]);
    assert!(!success);
    assert!(stderr.contains("not found"), "stderr: {}", stderr);
}

#[test]
fn test_invalid_url_rejected() {
    let (_tmp, config_path) = setup_test_env();
    run_websift(&config_path, &["init"]);

    let (_, stderr, success) = run_websift(&config_path, &["ingest", "ftp://example.com/x"]);
    assert!(!success);
    assert!(stderr.contains("http"), "stderr: {}", stderr);
}

#[test]
fn test_missing_config_fails_cleanly() {
    let tmp = TempDir::new().unwrap();
    let bogus = tmp.path().join("missing.toml");
    let (_, stderr, success) = run_websift(&bogus, &["init"]);
    assert!(!success);
    assert!(stderr.contains("config"), "stderr: {}", stderr);
}
