//! Architecture enforcement tests.
//!
//! The `git` module is the single doorway to the repository. Everything
//! else reads through `RepositoryAccessor`, which keeps the cache testable
//! against `MockRepository` and keeps the crate read-only.
//!
//! # Test Categories
//!
//! 1. **git2 Containment** - Only `src/git/` may name the `git2` crate
//! 2. **Read-Only Access** - No module calls git2 APIs that write objects or refs
//! 3. **CLI Layering** - Command handlers read through the cache façade

use std::fs;
use std::path::{Path, PathBuf};

/// git2 calls that would mutate the repository.
const WRITE_APIS: &[&str] = &[
    ".commit(",
    ".reference(",
    ".branch(",
    ".set_head",
    ".checkout_",
    ".index()",
    ".blob(",
    ".treebuilder(",
    ".tag(",
    ".remote(",
];

/// All `.rs` files under `dir`, recursively.
fn rust_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).expect("Failed to read source directory") {
        let path = entry.expect("Failed to read entry").path();
        if path.is_dir() {
            files.extend(rust_files(&path));
        } else if path.extension().is_some_and(|e| e == "rs") {
            files.push(path);
        }
    }
    files
}

fn src_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("src")
}

/// Lines of a file outside its `#[cfg(test)]` module.
fn non_test_lines(content: &str) -> impl Iterator<Item = (usize, &str)> {
    content
        .lines()
        .enumerate()
        .take_while(|(_, line)| !line.trim_start().starts_with("#[cfg(test)]"))
        .map(|(i, line)| (i + 1, line))
}

#[test]
fn git2_is_only_used_in_git_module() {
    let git_dir = src_dir().join("git");
    let mut violations = Vec::new();

    for path in rust_files(&src_dir()) {
        if path.starts_with(&git_dir) {
            continue;
        }
        let content = fs::read_to_string(&path).expect("Failed to read file");
        for (n, line) in content.lines().enumerate() {
            if line.contains("git2::") || line.contains("use git2") {
                violations.push(format!("{}:{}: {}", path.display(), n + 1, line.trim()));
            }
        }
    }

    assert!(
        violations.is_empty(),
        "git2 must only be used inside src/git/:\n{}",
        violations.join("\n")
    );
}

#[test]
fn git_module_is_read_only() {
    let interface = src_dir().join("git/interface.rs");
    let content = fs::read_to_string(&interface).expect("Failed to read git interface");
    let mut violations = Vec::new();

    for (n, line) in non_test_lines(&content) {
        if line.trim_start().starts_with("//") {
            continue;
        }
        for api in WRITE_APIS {
            if line.contains("repo.") && line.contains(api) {
                violations.push(format!("{}:{}: {}", interface.display(), n, line.trim()));
            }
        }
    }

    assert!(
        violations.is_empty(),
        "The git interface must not write to the repository:\n{}",
        violations.join("\n")
    );
}

#[test]
fn commands_do_not_open_repositories() {
    let commands = src_dir().join("cli/commands");
    let mut violations = Vec::new();

    for path in rust_files(&commands) {
        if path.file_name().is_some_and(|n| n == "mod.rs") {
            // Context construction is the one place the repository is opened.
            continue;
        }
        let content = fs::read_to_string(&path).expect("Failed to read command");
        for (n, line) in non_test_lines(&content) {
            if line.contains("Git::open") || line.contains("RepositoryAccessor") {
                violations.push(format!("{}:{}: {}", path.display(), n, line.trim()));
            }
        }
    }

    assert!(
        violations.is_empty(),
        "Commands must read through the Blog façade:\n{}",
        violations.join("\n")
    );
}
