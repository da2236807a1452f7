//! git
//!
//! Read-only access to the version-control object store.
//!
//! # Architecture
//!
//! This module is the **ONLY doorway** to git. The snapshot cache depends on
//! the [`RepositoryAccessor`] trait, never on `git2`; [`Git`] is the real
//! implementation and [`mock::MockRepository`] an in-memory one for tests.
//!
//! # Responsibilities
//!
//! - Branch and commit lookup
//! - Tree enumeration and blob reads (by id or by path)
//! - Per-path history: the latest commit that touched a file
//!
//! # Invariants
//!
//! - Nothing here mutates the repository
//! - No other module calls git2 directly
//! - All ids cross the boundary as validated [`Oid`](crate::core::types::Oid)s

mod interface;
pub mod mock;

pub use interface::{
    CommitInfo, EntryKind, Git, GitError, RepositoryAccessor, Signature, TreeEntry,
};
