//! git::mock
//!
//! In-memory repository for deterministic testing.
//!
//! # Design
//!
//! `MockRepository` implements [`RepositoryAccessor`] over commits built in
//! memory. Each file carries its own "last modified" timestamp, which is what
//! [`RepositoryAccessor::last_commit_touching`] reports, so tests control
//! document ordering directly. Every call is recorded so tests can assert how
//! often the store was consulted.
//!
//! # Example
//!
//! ```
//! use gitblog::core::types::BranchName;
//! use gitblog::git::mock::{MockEntry, MockRepository};
//! use gitblog::git::RepositoryAccessor;
//!
//! let repo = MockRepository::new();
//! let head = repo.commit_on(
//!     "master",
//!     vec![MockEntry::file("hello.md", "# Hello", 100)],
//! );
//!
//! let found = repo.commit_of_branch(&BranchName::new("master").unwrap()).unwrap();
//! assert_eq!(found.oid, head.oid);
//! assert_eq!(repo.branch_lookups(), 1);
//! ```

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use super::interface::{
    CommitInfo, EntryKind, GitError, RepositoryAccessor, Signature, TreeEntry,
};
use crate::core::types::{BranchName, Oid};

/// A file or directory to place in a mock commit.
#[derive(Debug, Clone)]
pub struct MockEntry {
    path: String,
    content: Option<Vec<u8>>,
    modified: i64,
    history: HistoryMode,
    unreadable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HistoryMode {
    Normal,
    Failing,
    Anonymous,
}

impl MockEntry {
    /// A file whose latest change happened at `modified` (unix seconds).
    ///
    /// Paths containing `/` create the parent directory at the top level.
    pub fn file(path: &str, content: impl Into<Vec<u8>>, modified: i64) -> Self {
        Self {
            path: path.to_string(),
            content: Some(content.into()),
            modified,
            history: HistoryMode::Normal,
            unreadable: false,
        }
    }

    /// An empty directory.
    pub fn dir(name: &str) -> Self {
        Self {
            path: name.trim_end_matches('/').to_string(),
            content: None,
            modified: 0,
            history: HistoryMode::Normal,
            unreadable: false,
        }
    }

    /// Make the history lookup for this file fail.
    pub fn with_failing_history(mut self) -> Self {
        self.history = HistoryMode::Failing;
        self
    }

    /// Make every read of this file's blob fail.
    pub fn with_unreadable_blob(mut self) -> Self {
        self.unreadable = true;
        self
    }

    /// Make the history lookup return a commit without committer identity.
    pub fn with_anonymous_history(mut self) -> Self {
        self.history = HistoryMode::Anonymous;
        self
    }
}

/// Recorded call for test verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOperation {
    CommitOfBranch { branch: String },
    Commit { id: String },
    TreeEntries { tree: Oid },
    ReadBlob { blob: Oid },
    BlobAtPath { tree: Oid, path: String },
    LastCommitTouching { commit: Oid, path: String },
}

#[derive(Debug)]
struct MockTree {
    entries: Vec<TreeEntry>,
    files: HashMap<String, Oid>,
}

#[derive(Debug)]
struct MockCommit {
    info: CommitInfo,
    history: HashMap<String, (i64, HistoryMode)>,
}

#[derive(Debug, Default)]
struct MockInner {
    next_id: u64,
    branches: HashMap<String, Oid>,
    commits: HashMap<Oid, MockCommit>,
    trees: HashMap<Oid, MockTree>,
    blobs: HashMap<Oid, Vec<u8>>,
    unreadable: HashSet<Oid>,
    operations: Vec<MockOperation>,
    tree_delay: Option<Duration>,
}

impl MockInner {
    fn fresh_id(&mut self) -> Oid {
        self.next_id += 1;
        Oid::new(format!("{:040x}", self.next_id)).expect("generated ids are 40 hex digits")
    }

    fn blob(&self, blob: &Oid) -> Result<Vec<u8>, GitError> {
        if self.unreadable.contains(blob) {
            return Err(GitError::Internal {
                message: format!("blob {blob} is unreadable"),
            });
        }
        self.blobs
            .get(blob)
            .cloned()
            .ok_or_else(|| GitError::ObjectNotFound {
                oid: blob.to_string(),
            })
    }
}

/// In-memory repository.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockRepository {
    inner: Arc<Mutex<MockInner>>,
}

fn signature(when: i64) -> Option<Signature> {
    Some(Signature {
        name: "Mock Author".into(),
        email: "mock@example.com".into(),
        when: DateTime::<Utc>::from_timestamp(when, 0).unwrap_or(DateTime::UNIX_EPOCH),
    })
}

impl MockRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a commit holding `entries` and point `branch` at it.
    pub fn commit_on(&self, branch: &str, entries: Vec<MockEntry>) -> CommitInfo {
        let mut inner = self.inner.lock();
        let tree_id = inner.fresh_id();
        let commit_id = inner.fresh_id();

        let mut top_level = Vec::new();
        let mut seen_dirs = BTreeSet::new();
        let mut files = HashMap::new();
        let mut history = HashMap::new();
        let mut newest = 0;

        for entry in entries {
            let top = entry.path.split('/').next().unwrap_or_default().to_string();
            let nested = top.len() != entry.path.len();

            match entry.content {
                Some(content) => {
                    let blob_id = inner.fresh_id();
                    inner.blobs.insert(blob_id.clone(), content);
                    if entry.unreadable {
                        inner.unreadable.insert(blob_id.clone());
                    }
                    files.insert(entry.path.clone(), blob_id.clone());
                    history.insert(entry.path.clone(), (entry.modified, entry.history));
                    newest = newest.max(entry.modified);
                    if !nested {
                        top_level.push(TreeEntry {
                            name: top,
                            kind: EntryKind::Blob,
                            oid: blob_id,
                        });
                        continue;
                    }
                }
                None if !nested => {}
                None => continue,
            }

            if seen_dirs.insert(top.clone()) {
                let dir_id = inner.fresh_id();
                top_level.push(TreeEntry {
                    name: top,
                    kind: EntryKind::Tree,
                    oid: dir_id,
                });
            }
        }

        let info = CommitInfo {
            oid: commit_id.clone(),
            tree: tree_id.clone(),
            summary: format!("commit on {branch}"),
            committer: signature(newest),
        };

        inner.trees.insert(
            tree_id,
            MockTree {
                entries: top_level,
                files,
            },
        );
        inner.commits.insert(
            commit_id.clone(),
            MockCommit {
                info: info.clone(),
                history,
            },
        );
        inner.branches.insert(branch.to_string(), commit_id);

        info
    }

    /// Slow down every tree enumeration, to widen race windows in tests.
    pub fn set_tree_delay(&self, delay: Duration) {
        self.inner.lock().tree_delay = Some(delay);
    }

    /// All recorded operations, oldest first.
    pub fn operations(&self) -> Vec<MockOperation> {
        self.inner.lock().operations.clone()
    }

    /// Number of branch lookups performed.
    pub fn branch_lookups(&self) -> usize {
        self.count(|op| matches!(op, MockOperation::CommitOfBranch { .. }))
    }

    /// Number of commit-by-id lookups performed.
    pub fn commit_lookups(&self) -> usize {
        self.count(|op| matches!(op, MockOperation::Commit { .. }))
    }

    /// Number of tree enumerations performed, i.e. snapshot builds started.
    pub fn tree_reads(&self) -> usize {
        self.count(|op| matches!(op, MockOperation::TreeEntries { .. }))
    }

    /// Forget recorded operations.
    pub fn clear_operations(&self) {
        self.inner.lock().operations.clear();
    }

    fn count(&self, pred: impl Fn(&MockOperation) -> bool) -> usize {
        self.inner.lock().operations.iter().filter(|op| pred(op)).count()
    }

    fn record(&self, op: MockOperation) {
        self.inner.lock().operations.push(op);
    }
}

impl RepositoryAccessor for MockRepository {
    fn commit_of_branch(&self, branch: &BranchName) -> Result<CommitInfo, GitError> {
        self.record(MockOperation::CommitOfBranch {
            branch: branch.to_string(),
        });
        let inner = self.inner.lock();
        inner
            .branches
            .get(branch.as_str())
            .and_then(|id| inner.commits.get(id))
            .map(|c| c.info.clone())
            .ok_or_else(|| GitError::RefNotFound {
                refname: branch.to_string(),
            })
    }

    fn commit(&self, id: &str) -> Result<CommitInfo, GitError> {
        self.record(MockOperation::Commit { id: id.to_string() });
        let inner = self.inner.lock();
        let matches: Vec<_> = inner
            .commits
            .iter()
            .filter(|(oid, _)| oid.as_str().starts_with(id))
            .collect();
        match matches.as_slice() {
            [(_, commit)] => Ok(commit.info.clone()),
            [] => Err(GitError::RefNotFound {
                refname: id.to_string(),
            }),
            _ => Err(GitError::InvalidOid {
                oid: id.to_string(),
            }),
        }
    }

    fn tree_entries(&self, tree: &Oid) -> Result<Vec<TreeEntry>, GitError> {
        self.record(MockOperation::TreeEntries { tree: tree.clone() });
        let delay = self.inner.lock().tree_delay;
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }
        let inner = self.inner.lock();
        inner
            .trees
            .get(tree)
            .map(|t| t.entries.clone())
            .ok_or_else(|| GitError::ObjectNotFound {
                oid: tree.to_string(),
            })
    }

    fn read_blob(&self, blob: &Oid) -> Result<Vec<u8>, GitError> {
        self.record(MockOperation::ReadBlob { blob: blob.clone() });
        self.inner.lock().blob(blob)
    }

    fn blob_at_path(&self, tree: &Oid, path: &str) -> Result<Vec<u8>, GitError> {
        self.record(MockOperation::BlobAtPath {
            tree: tree.clone(),
            path: path.to_string(),
        });
        let inner = self.inner.lock();
        let tree_obj = inner.trees.get(tree).ok_or_else(|| GitError::ObjectNotFound {
            oid: tree.to_string(),
        })?;
        if let Some(blob) = tree_obj.files.get(path) {
            return inner.blob(blob);
        }
        let dirs: HashSet<_> = tree_obj
            .entries
            .iter()
            .filter(|e| e.is_dir())
            .map(|e| e.name.as_str())
            .collect();
        if dirs.contains(path.trim_end_matches('/')) {
            return Err(GitError::NotABlob {
                path: path.to_string(),
            });
        }
        Err(GitError::PathNotFound {
            path: path.to_string(),
        })
    }

    fn last_commit_touching(&self, commit: &Oid, path: &str) -> Result<CommitInfo, GitError> {
        self.record(MockOperation::LastCommitTouching {
            commit: commit.clone(),
            path: path.to_string(),
        });
        let inner = self.inner.lock();
        let commit_obj = inner.commits.get(commit).ok_or_else(|| GitError::RefNotFound {
            refname: commit.to_string(),
        })?;
        let (modified, mode) =
            commit_obj
                .history
                .get(path)
                .copied()
                .ok_or_else(|| GitError::PathNotFound {
                    path: path.to_string(),
                })?;

        match mode {
            HistoryMode::Failing => Err(GitError::Internal {
                message: format!("history unavailable for {path}"),
            }),
            HistoryMode::Anonymous => Ok(CommitInfo {
                committer: None,
                ..commit_obj.info.clone()
            }),
            HistoryMode::Normal => Ok(CommitInfo {
                committer: signature(modified),
                ..commit_obj.info.clone()
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn master() -> BranchName {
        BranchName::new("master").unwrap()
    }

    #[test]
    fn nested_files_create_top_level_directory() {
        let repo = MockRepository::new();
        let head = repo.commit_on(
            "master",
            vec![
                MockEntry::file("a.md", "a", 1),
                MockEntry::file("img/logo.png", vec![0x89, 0x50], 1),
                MockEntry::file("img/other.png", vec![0x89], 1),
                MockEntry::dir("empty/"),
            ],
        );

        let entries = repo.tree_entries(&head.tree).unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a.md", "img", "empty"]);
        assert!(entries[1].is_dir());
        assert_eq!(
            repo.blob_at_path(&head.tree, "img/logo.png").unwrap(),
            vec![0x89, 0x50]
        );
        assert!(matches!(
            repo.blob_at_path(&head.tree, "img"),
            Err(GitError::NotABlob { .. })
        ));
    }

    #[test]
    fn branch_moves_to_latest_commit() {
        let repo = MockRepository::new();
        let first = repo.commit_on("master", vec![]);
        let second = repo.commit_on("master", vec![]);

        assert_ne!(first.oid, second.oid);
        assert_eq!(repo.commit_of_branch(&master()).unwrap().oid, second.oid);
        assert_eq!(repo.commit(first.oid.as_str()).unwrap().oid, first.oid);
    }

    #[test]
    fn unknown_refs_are_not_found() {
        let repo = MockRepository::new();
        assert!(repo.commit_of_branch(&master()).unwrap_err().is_not_found());
        assert!(repo.commit("abcd").unwrap_err().is_not_found());
    }

    #[test]
    fn history_modes() {
        let repo = MockRepository::new();
        let head = repo.commit_on(
            "master",
            vec![
                MockEntry::file("ok.md", "", 42),
                MockEntry::file("broken.md", "", 1).with_failing_history(),
                MockEntry::file("anon.md", "", 1).with_anonymous_history(),
            ],
        );

        let ok = repo.last_commit_touching(&head.oid, "ok.md").unwrap();
        assert_eq!(ok.committer.unwrap().when.timestamp(), 42);
        assert!(repo.last_commit_touching(&head.oid, "broken.md").is_err());
        assert!(repo
            .last_commit_touching(&head.oid, "anon.md")
            .unwrap()
            .committer
            .is_none());
    }

    #[test]
    fn operations_are_recorded() {
        let repo = MockRepository::new();
        let head = repo.commit_on("master", vec![]);
        let _ = repo.commit_of_branch(&master());
        let _ = repo.tree_entries(&head.tree);
        let _ = repo.tree_entries(&head.tree);

        assert_eq!(repo.branch_lookups(), 1);
        assert_eq!(repo.tree_reads(), 2);
        repo.clear_operations();
        assert!(repo.operations().is_empty());
    }
}
