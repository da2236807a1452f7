//! Integration tests for the snapshot cache.
//!
//! These run the public cache API against `MockRepository`, which records
//! every repository call, so the tests can assert exactly when the cache
//! goes back to the repository.

use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use gitblog::cache::{Blog, Resolver, SnapshotBuilder, SnapshotStore};
use gitblog::core::types::{BranchName, Reference};
use gitblog::git::mock::{MockEntry, MockRepository};
use gitblog::render::{DefaultTemplates, MarkdownRenderer, TemplateRole};

/// A blog over `repo` with explicit cache windows.
fn blog(repo: &MockRepository, resolve_ttl: Duration, retention: Duration) -> Blog {
    let shared = Arc::new(repo.clone());
    let resolver = Resolver::new(shared.clone(), BranchName::new("main").unwrap(), resolve_ttl);
    let builder = SnapshotBuilder::new(
        shared,
        Arc::new(MarkdownRenderer::new()),
        DefaultTemplates::builtin().unwrap(),
    );
    Blog::new(resolver, Arc::new(SnapshotStore::new(builder, retention)))
}

fn long_lived(repo: &MockRepository) -> Blog {
    blog(repo, Duration::from_secs(60), Duration::from_secs(60))
}

fn names(blog: &Blog, reference: &Reference) -> Vec<String> {
    blog.index(reference)
        .unwrap()
        .unwrap()
        .iter()
        .map(|a| a.name().to_string())
        .collect()
}

fn mixed_tree(repo: &MockRepository) {
    repo.commit_on(
        "main",
        vec![
            MockEntry::file("a.md", "# A", 200),
            MockEntry::file("b.md", "# B", 100),
            MockEntry::file("notes.txt", "notes", 300),
            MockEntry::dir("sub"),
        ],
    );
}

// =============================================================================
// Building
// =============================================================================

#[test]
fn mixed_tree_builds_expected_index() {
    let repo = MockRepository::new();
    mixed_tree(&repo);
    let blog = long_lived(&repo);

    assert_eq!(names(&blog, &Reference::Default), vec!["a", "b"]);
    assert_eq!(
        blog.file(&Reference::Default, "notes.txt").unwrap().unwrap(),
        b"notes"
    );
    assert!(blog.article(&Reference::Default, "sub").unwrap().is_none());
}

#[test]
fn history_failure_only_skips_that_document() {
    let repo = MockRepository::new();
    repo.commit_on(
        "main",
        vec![
            MockEntry::file("good.md", "ok", 10),
            MockEntry::file("bad.md", "broken", 20).with_failing_history(),
            MockEntry::file("other.md", "ok", 5),
        ],
    );
    let blog = long_lived(&repo);

    assert_eq!(names(&blog, &Reference::Default), vec!["good", "other"]);
    // The skipped document is still a raw file.
    assert!(blog.file(&Reference::Default, "bad.md").unwrap().is_some());
}

#[test]
fn short_and_foreign_names_never_indexed() {
    let repo = MockRepository::new();
    repo.commit_on(
        "main",
        vec![
            MockEntry::file(".md", "nameless", 1),
            MockEntry::file("readme.markdown", "other extension", 1),
            MockEntry::file("x.md", "x", 1),
        ],
    );
    let blog = long_lived(&repo);

    assert_eq!(names(&blog, &Reference::Default), vec!["x"]);
}

#[test]
fn broken_template_falls_back_per_role() {
    let repo = MockRepository::new();
    repo.commit_on(
        "main",
        vec![
            MockEntry::file("index.tpl", "{% if %}", 1),
            MockEntry::file("article.tpl", "custom", 1),
        ],
    );
    let blog = long_lived(&repo);

    let article = blog.template(&Reference::Default, TemplateRole::Article).unwrap();
    assert_eq!(article.render(&serde_json::json!({})).unwrap(), "custom");

    let index = blog.template(&Reference::Default, TemplateRole::Index).unwrap();
    let html = index
        .render(&serde_json::json!({
            "title": "t", "logo": "", "git_url": "", "base_url": "/",
            "page": 0, "pages": 0, "articles": [],
        }))
        .unwrap();
    assert!(html.contains("<!doctype html>"));
}

// =============================================================================
// Resolution
// =============================================================================

#[test]
fn resolution_is_cached_within_window() {
    let repo = MockRepository::new();
    mixed_tree(&repo);
    let blog = long_lived(&repo);
    let main = Reference::branch("main").unwrap();

    blog.resolve(&main).unwrap();
    blog.resolve(&main).unwrap();
    assert_eq!(repo.branch_lookups(), 1);
}

#[test]
fn resolution_refreshes_after_window() {
    let repo = MockRepository::new();
    mixed_tree(&repo);
    let blog = blog(&repo, Duration::from_millis(30), Duration::from_secs(60));
    let main = Reference::branch("main").unwrap();

    blog.resolve(&main).unwrap();
    thread::sleep(Duration::from_millis(60));
    blog.resolve(&main).unwrap();
    assert_eq!(repo.branch_lookups(), 2);
}

#[test]
fn branch_head_moves_after_window() {
    let repo = MockRepository::new();
    mixed_tree(&repo);
    let blog = blog(&repo, Duration::from_millis(30), Duration::from_secs(60));

    assert_eq!(names(&blog, &Reference::Default), vec!["a", "b"]);
    repo.commit_on("main", vec![MockEntry::file("new.md", "new", 1)]);

    // Within the window the old head is still served.
    assert_eq!(names(&blog, &Reference::Default), vec!["a", "b"]);
    thread::sleep(Duration::from_millis(60));
    assert_eq!(names(&blog, &Reference::Default), vec!["new"]);
}

#[test]
fn unknown_reference_fails() {
    let repo = MockRepository::new();
    mixed_tree(&repo);
    let blog = long_lived(&repo);

    let err = blog
        .index(&Reference::branch("missing").unwrap())
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(blog.store().is_empty());
}

// =============================================================================
// Invalidation And Eviction
// =============================================================================

#[test]
fn invalidate_triggers_exactly_one_rebuild() {
    let repo = MockRepository::new();
    mixed_tree(&repo);
    let blog = long_lived(&repo);

    let commit = blog.resolve(&Reference::Default).unwrap().commit;
    blog.index(&Reference::Default).unwrap();
    assert_eq!(repo.tree_reads(), 1);

    assert!(blog.invalidate(&commit));
    blog.index(&Reference::Default).unwrap();
    blog.article(&Reference::Default, "a").unwrap();
    blog.index(&Reference::Default).unwrap();
    assert_eq!(repo.tree_reads(), 2);
}

#[test]
fn sweep_after_retention_forces_rebuild() {
    let repo = MockRepository::new();
    mixed_tree(&repo);
    let blog = blog(&repo, Duration::from_secs(60), Duration::from_millis(40));

    blog.index(&Reference::Default).unwrap();
    thread::sleep(Duration::from_millis(80));
    assert_eq!(blog.store().sweep_expired(), 1);

    blog.index(&Reference::Default).unwrap();
    assert_eq!(repo.tree_reads(), 2);
}

#[test]
fn janitor_evicts_in_background() {
    let repo = MockRepository::new();
    mixed_tree(&repo);
    let blog = blog(&repo, Duration::from_secs(60), Duration::from_millis(20))
        .with_sweep_interval(Duration::from_millis(10));

    blog.index(&Reference::Default).unwrap();
    let mut janitor = blog.start_janitor().unwrap();

    let mut waited = Duration::ZERO;
    while !blog.store().is_empty() && waited < Duration::from_secs(5) {
        thread::sleep(Duration::from_millis(10));
        waited += Duration::from_millis(10);
    }
    janitor.stop();
    assert!(blog.store().is_empty());
}

// =============================================================================
// Concurrency
// =============================================================================

#[test]
fn concurrent_requests_coalesce_into_one_build() {
    let repo = MockRepository::new();
    mixed_tree(&repo);
    repo.set_tree_delay(Duration::from_millis(50));
    let blog = Arc::new(long_lived(&repo));
    let barrier = Arc::new(Barrier::new(16));

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let blog = Arc::clone(&blog);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                if i % 2 == 0 {
                    blog.index(&Reference::Default).unwrap().unwrap().len()
                } else {
                    usize::from(blog.article(&Reference::Default, "a").unwrap().is_some())
                }
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let got = handle.join().unwrap();
        assert_eq!(got, if i % 2 == 0 { 2 } else { 1 });
    }
    assert_eq!(repo.tree_reads(), 1);
}

#[test]
fn unrelated_commits_build_concurrently() {
    let repo = MockRepository::new();
    repo.commit_on("main", vec![MockEntry::file("a.md", "a", 1)]);
    repo.commit_on("drafts", vec![MockEntry::file("d.md", "d", 1)]);
    repo.set_tree_delay(Duration::from_millis(200));
    let blog = Arc::new(long_lived(&repo));

    let started = std::time::Instant::now();
    let handles: Vec<_> = [Reference::Default, Reference::branch("drafts").unwrap()]
        .into_iter()
        .map(|reference| {
            let blog = Arc::clone(&blog);
            thread::spawn(move || blog.index(&reference).unwrap().unwrap().len())
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), 1);
    }

    // Two serialized builds would take at least 400ms.
    assert!(started.elapsed() < Duration::from_millis(390));
    assert_eq!(repo.tree_reads(), 2);
}
