//! git::interface
//!
//! Read-only git access using git2.
//!
//! This module is the **single doorway** to the backing object store. The
//! snapshot cache never touches `git2` directly; it talks to the
//! [`RepositoryAccessor`] trait, which [`Git`] implements for a real
//! repository and [`super::mock::MockRepository`] implements in memory.
//!
//! # Error Handling
//!
//! git2 errors are categorized into typed variants:
//! - [`GitError::RefNotFound`]: branch or commit does not exist
//! - [`GitError::ObjectNotFound`]: tree or blob id does not exist
//! - [`GitError::PathNotFound`]: no entry at a path within a tree
//! - [`GitError::NotABlob`]: the entry at a path is a directory
//!
//! # Example
//!
//! ```ignore
//! use gitblog::core::types::BranchName;
//! use gitblog::git::{Git, RepositoryAccessor};
//! use std::path::Path;
//!
//! let git = Git::open(Path::new("blog.git"))?;
//! let head = git.commit_of_branch(&BranchName::new("master")?)?;
//! for entry in git.tree_entries(&head.tree)? {
//!     println!("{}", entry.name);
//! }
//! ```

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use thiserror::Error;

use crate::core::types::{BranchName, Oid, TypeError};

/// Errors from repository reads.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GitError {
    /// No repository at the given path.
    #[error("not a git repository: {path}")]
    NotARepo {
        /// The path that was opened
        path: PathBuf,
    },

    /// Branch or commit does not exist.
    #[error("ref not found: {refname}")]
    RefNotFound {
        /// The branch name or commit id that was looked up
        refname: String,
    },

    /// Object not found in the object database.
    #[error("object not found: {oid}")]
    ObjectNotFound {
        /// The id that was not found
        oid: String,
    },

    /// Invalid object id format.
    #[error("invalid object id: {oid}")]
    InvalidOid {
        /// The invalid id string
        oid: String,
    },

    /// No tree entry at the given path.
    #[error("path not found: {path}")]
    PathNotFound {
        /// The path within the tree
        path: String,
    },

    /// The entry at the given path is not a file.
    #[error("not a file: {path}")]
    NotABlob {
        /// The path within the tree
        path: String,
    },

    /// Internal git2 error.
    #[error("git error: {message}")]
    Internal {
        /// The error message
        message: String,
    },
}

impl GitError {
    /// Create a GitError from a git2::Error, using `context` to name what was looked up.
    fn from_git2(err: git2::Error, context: &str) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound => GitError::ObjectNotFound {
                oid: context.to_string(),
            },
            git2::ErrorCode::InvalidSpec | git2::ErrorCode::Ambiguous => GitError::InvalidOid {
                oid: context.to_string(),
            },
            _ => GitError::Internal {
                message: format!("{}: {}", context, err.message()),
            },
        }
    }

    /// Same as [`GitError::from_git2`], for lookups of a branch or commit.
    fn ref_from_git2(err: git2::Error, refname: &str) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound | git2::ErrorCode::InvalidSpec => GitError::RefNotFound {
                refname: refname.to_string(),
            },
            _ => Self::from_git2(err, refname),
        }
    }

    /// Whether the error means "this thing does not exist" as opposed to a
    /// failure of the store itself.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            GitError::RefNotFound { .. }
                | GitError::ObjectNotFound { .. }
                | GitError::PathNotFound { .. }
        )
    }
}

impl From<TypeError> for GitError {
    fn from(err: TypeError) -> Self {
        GitError::InvalidOid {
            oid: err.to_string(),
        }
    }
}

/// Identity attached to a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    /// Name as recorded in the commit
    pub name: String,
    /// Email as recorded in the commit
    pub email: String,
    /// Signature timestamp
    pub when: DateTime<Utc>,
}

/// Information about a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    /// The commit id
    pub oid: Oid,
    /// The root tree of the commit
    pub tree: Oid,
    /// First line of the commit message
    pub summary: String,
    /// Committer identity, `None` if the commit carries no usable identity
    pub committer: Option<Signature>,
}

/// Kind of object a tree entry points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A file
    Blob,
    /// A subdirectory
    Tree,
    /// Submodule commits and anything else
    Other,
}

/// One entry of a tree, in the order git stores them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    /// File or directory name (no path separators)
    pub name: String,
    /// What the entry points at
    pub kind: EntryKind,
    /// Id of the blob or subtree
    pub oid: Oid,
}

impl TreeEntry {
    /// Whether the entry is a directory.
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Tree
    }
}

/// Read-only view of a version-control object store.
///
/// Implementations must be shareable across request threads; every method
/// takes `&self`.
pub trait RepositoryAccessor: Send + Sync {
    /// Commit at the head of a local branch.
    fn commit_of_branch(&self, branch: &BranchName) -> Result<CommitInfo, GitError>;

    /// Commit by id. Abbreviated ids are expanded.
    fn commit(&self, id: &str) -> Result<CommitInfo, GitError>;

    /// Top-level entries of a tree. Fails if the tree does not exist.
    fn tree_entries(&self, tree: &Oid) -> Result<Vec<TreeEntry>, GitError>;

    /// Content of a blob.
    fn read_blob(&self, blob: &Oid) -> Result<Vec<u8>, GitError>;

    /// Content of the file at `path` (slash separated) inside a tree.
    fn blob_at_path(&self, tree: &Oid, path: &str) -> Result<Vec<u8>, GitError>;

    /// The commit that introduced the version of `path` seen at `commit`.
    ///
    /// History is simplified the way `git log -- <path>` simplifies it: at a
    /// merge, only the first parent with identical content is followed, so
    /// changes made and reverted on a merged side branch do not count.
    fn last_commit_touching(&self, commit: &Oid, path: &str) -> Result<CommitInfo, GitError>;
}

/// A git2-backed repository.
///
/// `git2::Repository` is not `Sync`, so every read takes a short lock on the
/// handle. Reads are independent and never hold the lock across calls.
pub struct Git {
    /// The underlying git2 repository
    repo: Mutex<git2::Repository>,
    /// Path the repository was opened from
    path: PathBuf,
}

impl std::fmt::Debug for Git {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git").field("path", &self.path).finish()
    }
}

impl Git {
    /// Open a repository at the given path.
    ///
    /// Bare repositories (`blog.git`) and work trees are both accepted.
    ///
    /// # Errors
    ///
    /// - [`GitError::NotARepo`] if no repository is found at `path`
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = git2::Repository::open(path).map_err(|_| GitError::NotARepo {
            path: path.to_path_buf(),
        })?;

        Ok(Self {
            repo: Mutex::new(repo),
            path: path.to_path_buf(),
        })
    }

    /// Path the repository was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn git_oid(oid: &Oid) -> Result<git2::Oid, GitError> {
        git2::Oid::from_str(oid.as_str()).map_err(|e| GitError::from_git2(e, oid.as_str()))
    }

    fn oid(oid: git2::Oid) -> Result<Oid, GitError> {
        Oid::new(oid.to_string()).map_err(GitError::from)
    }

    fn commit_info(commit: &git2::Commit<'_>) -> Result<CommitInfo, GitError> {
        let committer = commit.committer();
        let name = committer.name().unwrap_or("").trim().to_string();
        let email = committer.email().unwrap_or("").trim().to_string();
        let committer = if name.is_empty() && email.is_empty() {
            None
        } else {
            DateTime::from_timestamp(committer.when().seconds(), 0).map(|when| Signature {
                name,
                email,
                when,
            })
        };

        Ok(CommitInfo {
            oid: Self::oid(commit.id())?,
            tree: Self::oid(commit.tree_id())?,
            summary: commit.summary().unwrap_or("").to_string(),
            committer,
        })
    }

    /// Id of the entry at `path` in a commit's tree, `None` if absent.
    fn entry_id_at(commit: &git2::Commit<'_>, path: &Path) -> Result<Option<git2::Oid>, GitError> {
        let tree = commit
            .tree()
            .map_err(|e| GitError::from_git2(e, &commit.tree_id().to_string()))?;
        match tree.get_path(path) {
            Ok(entry) => Ok(Some(entry.id())),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(GitError::from_git2(e, &path.display().to_string())),
        }
    }
}

impl RepositoryAccessor for Git {
    fn commit_of_branch(&self, branch: &BranchName) -> Result<CommitInfo, GitError> {
        let repo = self.repo.lock();
        let commit = repo
            .find_branch(branch.as_str(), git2::BranchType::Local)
            .and_then(|b| b.get().peel_to_commit())
            .map_err(|e| GitError::ref_from_git2(e, branch.as_str()))?;

        Self::commit_info(&commit)
    }

    fn commit(&self, id: &str) -> Result<CommitInfo, GitError> {
        let repo = self.repo.lock();
        let commit = repo
            .revparse_single(id)
            .and_then(|object| object.peel_to_commit())
            .map_err(|e| GitError::ref_from_git2(e, id))?;

        Self::commit_info(&commit)
    }

    fn tree_entries(&self, tree: &Oid) -> Result<Vec<TreeEntry>, GitError> {
        let repo = self.repo.lock();
        let tree_obj = repo
            .find_tree(Self::git_oid(tree)?)
            .map_err(|e| GitError::from_git2(e, tree.as_str()))?;

        let mut entries = Vec::with_capacity(tree_obj.len());
        for entry in tree_obj.iter() {
            // Names that are not UTF-8 cannot be addressed by document name.
            let Some(name) = entry.name() else {
                continue;
            };
            let kind = match entry.kind() {
                Some(git2::ObjectType::Blob) => EntryKind::Blob,
                Some(git2::ObjectType::Tree) => EntryKind::Tree,
                _ => EntryKind::Other,
            };
            entries.push(TreeEntry {
                name: name.to_string(),
                kind,
                oid: Self::oid(entry.id())?,
            });
        }

        Ok(entries)
    }

    fn read_blob(&self, blob: &Oid) -> Result<Vec<u8>, GitError> {
        let repo = self.repo.lock();
        let blob_obj = repo
            .find_blob(Self::git_oid(blob)?)
            .map_err(|e| GitError::from_git2(e, blob.as_str()))?;

        Ok(blob_obj.content().to_vec())
    }

    fn blob_at_path(&self, tree: &Oid, path: &str) -> Result<Vec<u8>, GitError> {
        let repo = self.repo.lock();
        let tree_obj = repo
            .find_tree(Self::git_oid(tree)?)
            .map_err(|e| GitError::from_git2(e, tree.as_str()))?;

        let entry = tree_obj
            .get_path(Path::new(path))
            .map_err(|_| GitError::PathNotFound {
                path: path.to_string(),
            })?;
        if entry.kind() != Some(git2::ObjectType::Blob) {
            return Err(GitError::NotABlob {
                path: path.to_string(),
            });
        }

        let blob = repo
            .find_blob(entry.id())
            .map_err(|e| GitError::from_git2(e, path))?;
        Ok(blob.content().to_vec())
    }

    fn last_commit_touching(&self, commit: &Oid, path: &str) -> Result<CommitInfo, GitError> {
        let repo = self.repo.lock();
        let start = repo
            .find_commit(Self::git_oid(commit)?)
            .map_err(|e| GitError::ref_from_git2(e, commit.as_str()))?;
        let rel = Path::new(path);

        let Some(here) = Self::entry_id_at(&start, rel)? else {
            return Err(GitError::PathNotFound {
                path: path.to_string(),
            });
        };

        // Follow the first parent holding the same version of the path, as
        // `git log -- <path>` does. The commit where no parent matches is
        // where the current content came from.
        let mut current = start;
        loop {
            let mut same = None;
            for parent in current.parents() {
                if Self::entry_id_at(&parent, rel)? == Some(here) {
                    same = Some(parent);
                    break;
                }
            }
            match same {
                Some(parent) => current = parent,
                None => return Self::commit_info(&current),
            }
        }
    }
}
