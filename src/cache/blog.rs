//! cache::blog
//!
//! The read operations the presentation layer uses.
//!
//! Every query resolves its [`Reference`] first, then asks the store,
//! building the snapshot on a miss. Only resolution failures surface as
//! errors; a snapshot that cannot be built reads as "not found" (`None`).

use std::io;
use std::sync::Arc;
use std::time::Duration;

use super::builder::SnapshotBuilder;
use super::janitor::Janitor;
use super::resolver::{Resolution, ResolveError, Resolver};
use super::snapshot::{Article, DocumentIndex, Snapshot};
use super::store::SnapshotStore;
use crate::core::config::Config;
use crate::core::types::{Oid, Reference};
use crate::git::RepositoryAccessor;
use crate::render::{DefaultTemplates, MarkdownRenderer, Template, TemplateRole};

/// Query façade over a resolver and a snapshot store.
#[derive(Debug)]
pub struct Blog {
    resolver: Resolver,
    store: Arc<SnapshotStore>,
    sweep_interval: Duration,
}

impl Blog {
    /// Assemble a façade from its parts.
    ///
    /// The janitor sweeps once per retention period until
    /// [`with_sweep_interval`](Self::with_sweep_interval) says otherwise.
    pub fn new(resolver: Resolver, store: Arc<SnapshotStore>) -> Self {
        let sweep_interval = store.retention();
        Self {
            resolver,
            store,
            sweep_interval,
        }
    }

    /// Set the period used by [`start_janitor`](Self::start_janitor).
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Wire a façade over `repo` with the markdown renderer and the given
    /// default templates, tuned by `config`.
    pub fn with_repository(
        repo: Arc<dyn RepositoryAccessor>,
        defaults: DefaultTemplates,
        config: &Config,
    ) -> Self {
        let resolver = Resolver::new(
            Arc::clone(&repo),
            config.default_branch().clone(),
            config.resolve_ttl(),
        );
        let builder = SnapshotBuilder::new(repo, Arc::new(MarkdownRenderer::new()), defaults);
        let store = Arc::new(SnapshotStore::new(builder, config.retention()));
        Self::new(resolver, store).with_sweep_interval(config.sweep_interval())
    }

    /// The resolver.
    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Period of the background sweep.
    pub fn sweep_interval(&self) -> Duration {
        self.sweep_interval
    }

    /// The snapshot store.
    pub fn store(&self) -> &Arc<SnapshotStore> {
        &self.store
    }

    /// Resolve a reference to its tree and commit.
    pub fn resolve(&self, reference: &Reference) -> Result<Resolution, ResolveError> {
        self.resolver.resolve(reference)
    }

    /// The whole snapshot for a reference.
    pub fn snapshot(&self, reference: &Reference) -> Result<Option<Arc<Snapshot>>, ResolveError> {
        let r = self.resolve(reference)?;
        Ok(self.store.ensure(&r.tree, &r.commit))
    }

    /// The document index for a reference.
    pub fn index(&self, reference: &Reference) -> Result<Option<DocumentIndex>, ResolveError> {
        let r = self.resolve(reference)?;
        Ok(self.store.ensure_index(&r.tree, &r.commit))
    }

    /// One document by name.
    pub fn article(&self, reference: &Reference, name: &str) -> Result<Option<Arc<Article>>, ResolveError> {
        let r = self.resolve(reference)?;
        Ok(self.store.ensure_article(&r.tree, &r.commit, name))
    }

    /// Raw bytes of any blob in the reference's tree.
    pub fn file(&self, reference: &Reference, path: &str) -> Result<Option<Vec<u8>>, ResolveError> {
        let r = self.resolve(reference)?;
        Ok(self.store.ensure_file(&r.tree, &r.commit, path))
    }

    /// The template for `role`; the built-in default if the commit has none.
    pub fn template(&self, reference: &Reference, role: TemplateRole) -> Result<Template, ResolveError> {
        let r = self.resolve(reference)?;
        Ok(self.store.ensure_template(&r.tree, &r.commit, role))
    }

    /// Drop the snapshot of one commit.
    pub fn invalidate(&self, commit: &Oid) -> bool {
        self.store.invalidate(commit)
    }

    /// Drop every snapshot and every cached resolution.
    pub fn invalidate_all(&self) -> usize {
        self.resolver.clear();
        self.store.invalidate_all()
    }

    /// Start sweeping expired snapshots every [`sweep_interval`](Self::sweep_interval).
    pub fn start_janitor(&self) -> io::Result<Janitor> {
        Janitor::start(Arc::clone(&self.store), self.sweep_interval, self.store.retention())
    }
}
