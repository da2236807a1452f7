//! cache::resolver
//!
//! Maps a [`Reference`] to the `(tree, commit)` pair it currently points at.
//!
//! Branch heads move, so resolutions are cached only for a short validity
//! window. Within the window a reference resolves without touching the
//! repository; after it the repository is asked again and the entry is
//! overwritten. A zero window disables the cache entirely.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use thiserror::Error;
use tracing::debug;

use crate::core::types::{BranchName, Oid, Reference};
use crate::git::{CommitInfo, GitError, RepositoryAccessor};

/// A reference that does not map to any commit.
#[derive(Debug, Error)]
#[error("could not resolve {reference}: {source}")]
pub struct ResolveError {
    /// The reference as the caller gave it.
    pub reference: Reference,
    /// What the repository reported.
    #[source]
    pub source: GitError,
}

impl ResolveError {
    /// Whether the reference simply does not exist.
    pub fn is_not_found(&self) -> bool {
        self.source.is_not_found()
    }
}

/// A resolved reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Resolution {
    pub tree: Oid,
    pub commit: Oid,
    /// First line of the commit message.
    pub summary: String,
}

impl From<CommitInfo> for Resolution {
    fn from(info: CommitInfo) -> Self {
        Self {
            tree: info.tree,
            commit: info.oid,
            summary: info.summary,
        }
    }
}

#[derive(Debug)]
struct CachedResolution {
    created_at: Instant,
    resolution: Resolution,
}

/// Reference resolver with a short-lived cache.
pub struct Resolver {
    repo: Arc<dyn RepositoryAccessor>,
    default_branch: BranchName,
    ttl: Duration,
    cache: RwLock<HashMap<String, CachedResolution>>,
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("default_branch", &self.default_branch)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl Resolver {
    /// Create a resolver.
    ///
    /// `ttl` is how long a resolution is trusted; `Duration::ZERO` means
    /// every call goes to the repository.
    pub fn new(repo: Arc<dyn RepositoryAccessor>, default_branch: BranchName, ttl: Duration) -> Self {
        Self {
            repo,
            default_branch,
            ttl,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Branch used for [`Reference::Default`].
    pub fn default_branch(&self) -> &BranchName {
        &self.default_branch
    }

    /// Validity window of cached resolutions.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Resolve a reference.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError`] if the branch or commit does not exist or the
    /// repository cannot be read. Failures are not cached and not retried.
    pub fn resolve(&self, reference: &Reference) -> Result<Resolution, ResolveError> {
        let key = reference.cache_key(&self.default_branch);

        if !self.ttl.is_zero() {
            let cache = self.cache.read();
            if let Some(cached) = cache.get(&key) {
                if cached.created_at.elapsed() < self.ttl {
                    return Ok(cached.resolution.clone());
                }
            }
        }

        let info = match reference {
            Reference::Default => self.repo.commit_of_branch(&self.default_branch),
            Reference::Branch(name) => self.repo.commit_of_branch(name),
            Reference::Commit(id) => self.repo.commit(id),
        }
        .map_err(|source| ResolveError {
            reference: reference.clone(),
            source,
        })?;

        let resolution = Resolution::from(info);
        debug!(reference = %key, commit = %resolution.commit, tree = %resolution.tree, "Reference resolved");

        if !self.ttl.is_zero() {
            self.cache.write().insert(
                key,
                CachedResolution {
                    created_at: Instant::now(),
                    resolution: resolution.clone(),
                },
            );
        }
        Ok(resolution)
    }

    /// Forget every cached resolution.
    pub fn clear(&self) {
        self.cache.write().clear();
    }

    /// Number of cached resolutions, expired ones included.
    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    /// Whether nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::mock::{MockEntry, MockRepository};

    fn resolver(repo: &MockRepository, ttl: Duration) -> Resolver {
        Resolver::new(
            Arc::new(repo.clone()),
            BranchName::new("master").unwrap(),
            ttl,
        )
    }

    #[test]
    fn default_follows_default_branch() {
        let repo = MockRepository::new();
        let head = repo.commit_on("master", vec![MockEntry::file("a.md", "a", 1)]);
        let r = resolver(&repo, Duration::from_secs(60));

        let resolved = r.resolve(&Reference::Default).unwrap();
        assert_eq!(resolved.commit, head.oid);
        assert_eq!(resolved.tree, head.tree);
        assert_eq!(resolved.summary, "commit on master");
    }

    #[test]
    fn default_and_explicit_default_branch_share_an_entry() {
        let repo = MockRepository::new();
        repo.commit_on("master", vec![]);
        let r = resolver(&repo, Duration::from_secs(60));

        r.resolve(&Reference::Default).unwrap();
        r.resolve(&Reference::branch("master").unwrap()).unwrap();
        assert_eq!(repo.branch_lookups(), 1);
        assert_eq!(r.len(), 1);
    }

    #[test]
    fn within_window_hits_repository_once() {
        let repo = MockRepository::new();
        repo.commit_on("main", vec![]);
        let r = resolver(&repo, Duration::from_secs(60));
        let main = Reference::branch("main").unwrap();

        r.resolve(&main).unwrap();
        r.resolve(&main).unwrap();
        assert_eq!(repo.branch_lookups(), 1);
    }

    #[test]
    fn after_window_hits_repository_again() {
        let repo = MockRepository::new();
        let first = repo.commit_on("main", vec![]);
        let r = resolver(&repo, Duration::from_millis(30));
        let main = Reference::branch("main").unwrap();

        assert_eq!(r.resolve(&main).unwrap().commit, first.oid);
        let second = repo.commit_on("main", vec![]);
        std::thread::sleep(Duration::from_millis(60));

        assert_eq!(r.resolve(&main).unwrap().commit, second.oid);
        assert_eq!(repo.branch_lookups(), 2);
    }

    #[test]
    fn zero_ttl_always_hits_repository() {
        let repo = MockRepository::new();
        repo.commit_on("main", vec![]);
        let r = resolver(&repo, Duration::ZERO);
        let main = Reference::branch("main").unwrap();

        r.resolve(&main).unwrap();
        r.resolve(&main).unwrap();
        assert_eq!(repo.branch_lookups(), 2);
        assert!(r.is_empty());
    }

    #[test]
    fn commit_ids_resolve_by_prefix() {
        let repo = MockRepository::new();
        let head = repo.commit_on("main", vec![]);
        let r = resolver(&repo, Duration::from_secs(60));

        let resolved = r.resolve(&Reference::commit(head.oid.as_str()).unwrap()).unwrap();
        assert_eq!(resolved.commit, head.oid);
        assert_eq!(repo.commit_lookups(), 1);
    }

    #[test]
    fn unknown_branch_fails_and_is_not_cached() {
        let repo = MockRepository::new();
        let r = resolver(&repo, Duration::from_secs(60));
        let missing = Reference::branch("missing").unwrap();

        let err = r.resolve(&missing).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.reference, missing);
        assert!(r.resolve(&missing).is_err());
        assert_eq!(repo.branch_lookups(), 2);
    }

    #[test]
    fn clear_forces_lookup() {
        let repo = MockRepository::new();
        repo.commit_on("master", vec![]);
        let r = resolver(&repo, Duration::from_secs(60));

        r.resolve(&Reference::Default).unwrap();
        r.clear();
        r.resolve(&Reference::Default).unwrap();
        assert_eq!(repo.branch_lookups(), 2);
    }
}
