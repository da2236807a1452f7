//! cache::store
//!
//! Concurrency-safe map from commit id to [`Snapshot`].
//!
//! # Locking
//!
//! - `entries` is read under a shared lock and written (install, remove,
//!   sweep) under an exclusive one. The exclusive lock is never held across
//!   a build.
//! - Builds are serialized per commit id by a gate. A caller that misses
//!   takes the gate for its key, checks again whether another caller has
//!   finished the build in the meantime, and only then builds. Unrelated
//!   keys build concurrently.
//! - Gates are created on demand and dropped by the last caller to leave,
//!   so the gate map only holds keys with a build in flight.
//!
//! A key present and not expired always maps to a complete snapshot: the
//! snapshot is installed only after the builder returns.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, error, info};

use super::builder::{BuildError, SnapshotBuilder};
use super::snapshot::{Article, DocumentIndex, Snapshot};
use crate::core::types::Oid;
use crate::render::{Template, TemplateRole};

type Gate = Arc<Mutex<()>>;

/// A caller's hold on the gate of one commit.
///
/// Dropping it, on return or on unwind, removes the gate from the map once
/// no other caller holds it.
struct GateTicket<'a> {
    gates: &'a Mutex<HashMap<Oid, Gate>>,
    commit: &'a Oid,
    gate: Gate,
}

impl Drop for GateTicket<'_> {
    fn drop(&mut self) {
        let mut gates = self.gates.lock();
        // One reference in the map plus ours: nobody else is waiting.
        let idle = Arc::strong_count(&self.gate) <= 2;
        if idle && gates.get(self.commit).is_some_and(|g| Arc::ptr_eq(g, &self.gate)) {
            gates.remove(self.commit);
        }
    }
}

/// The snapshot cache.
#[derive(Debug)]
pub struct SnapshotStore {
    builder: SnapshotBuilder,
    retention: Duration,
    entries: RwLock<HashMap<Oid, Arc<Snapshot>>>,
    gates: Mutex<HashMap<Oid, Gate>>,
}

impl SnapshotStore {
    /// Create an empty store.
    ///
    /// Snapshots older than `retention` are treated as absent and are
    /// removed by [`sweep`](Self::sweep).
    pub fn new(builder: SnapshotBuilder, retention: Duration) -> Self {
        Self {
            builder,
            retention,
            entries: RwLock::new(HashMap::new()),
            gates: Mutex::new(HashMap::new()),
        }
    }

    /// The builder used on misses.
    pub fn builder(&self) -> &SnapshotBuilder {
        &self.builder
    }

    /// How long a snapshot stays live.
    pub fn retention(&self) -> Duration {
        self.retention
    }

    /// Number of stored snapshots, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the store holds nothing.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Whether a live snapshot exists for `commit`.
    pub fn exists(&self, commit: &Oid) -> bool {
        self.snapshot(commit).is_some()
    }

    /// The live snapshot for `commit`, without building.
    pub fn snapshot(&self, commit: &Oid) -> Option<Arc<Snapshot>> {
        self.entries
            .read()
            .get(commit)
            .filter(|s| !s.is_expired(self.retention))
            .cloned()
    }

    /// The document index of a live snapshot.
    pub fn index(&self, commit: &Oid) -> Option<DocumentIndex> {
        self.snapshot(commit).map(|s| s.index().clone())
    }

    /// One document of a live snapshot.
    pub fn article(&self, commit: &Oid, name: &str) -> Option<Arc<Article>> {
        self.snapshot(commit)
            .and_then(|s| s.article(name).cloned())
    }

    /// Raw bytes at `path` in the tree of a live snapshot.
    ///
    /// Any blob in the tree qualifies, documents or not.
    pub fn file(&self, commit: &Oid, path: &str) -> Option<Vec<u8>> {
        let snapshot = self.snapshot(commit)?;
        self.read_file(&snapshot, path)
    }

    /// The template of a live snapshot for `role`.
    pub fn template(&self, commit: &Oid, role: TemplateRole) -> Option<Template> {
        self.snapshot(commit).map(|s| s.template(role).clone())
    }

    /// The live snapshot for `commit`, building it on a miss.
    ///
    /// Returns `None` if the build fails. The failure is logged and not
    /// cached, so the next call builds again.
    pub fn ensure(&self, tree: &Oid, commit: &Oid) -> Option<Arc<Snapshot>> {
        if let Some(snapshot) = self.snapshot(commit) {
            return Some(snapshot);
        }
        self.build_gated(tree, commit, false).ok()
    }

    /// [`index`](Self::index), building on a miss.
    pub fn ensure_index(&self, tree: &Oid, commit: &Oid) -> Option<DocumentIndex> {
        self.ensure(tree, commit).map(|s| s.index().clone())
    }

    /// [`article`](Self::article), building on a miss.
    pub fn ensure_article(&self, tree: &Oid, commit: &Oid, name: &str) -> Option<Arc<Article>> {
        self.ensure(tree, commit)
            .and_then(|s| s.article(name).cloned())
    }

    /// [`file`](Self::file), building on a miss.
    pub fn ensure_file(&self, tree: &Oid, commit: &Oid, path: &str) -> Option<Vec<u8>> {
        let snapshot = self.ensure(tree, commit)?;
        self.read_file(&snapshot, path)
    }

    /// [`template`](Self::template), building on a miss.
    ///
    /// Never fails: if the snapshot cannot be built the built-in default
    /// for `role` is returned.
    pub fn ensure_template(&self, tree: &Oid, commit: &Oid, role: TemplateRole) -> Template {
        match self.ensure(tree, commit) {
            Some(snapshot) => snapshot.template(role).clone(),
            None => self.builder.defaults().get(role).clone(),
        }
    }

    /// Build `commit` again and replace whatever is stored.
    ///
    /// On failure the previous snapshot, if any, stays in place.
    pub fn rebuild(&self, tree: &Oid, commit: &Oid) -> Result<Arc<Snapshot>, BuildError> {
        self.build_gated(tree, commit, true)
    }

    /// Drop the snapshot of `commit`. Returns whether one was stored.
    pub fn invalidate(&self, commit: &Oid) -> bool {
        let removed = self.entries.write().remove(commit);
        if let Some(snapshot) = &removed {
            info!(commit = %commit, built_at = %snapshot.built_at(), "Snapshot invalidated");
        }
        removed.is_some()
    }

    /// Drop every snapshot. Returns how many were stored.
    pub fn invalidate_all(&self) -> usize {
        let removed = {
            let mut entries = self.entries.write();
            let n = entries.len();
            entries.clear();
            n
        };
        info!(removed, "All snapshots invalidated");
        removed
    }

    /// Remove every snapshot older than `retention`. Returns how many went.
    pub fn sweep(&self, retention: Duration) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|commit, snapshot| {
            let keep = !snapshot.is_expired(retention);
            if !keep {
                info!(
                    commit = %commit,
                    built_at = %snapshot.built_at(),
                    age_ms = snapshot.age().as_millis() as u64,
                    "Snapshot expired"
                );
            }
            keep
        });
        before - entries.len()
    }

    /// [`sweep`](Self::sweep) with the store's own retention.
    pub fn sweep_expired(&self) -> usize {
        self.sweep(self.retention)
    }

    fn read_file(&self, snapshot: &Snapshot, path: &str) -> Option<Vec<u8>> {
        match self.builder.repository().blob_at_path(snapshot.tree(), path) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                debug!(error = %e, commit = %snapshot.commit(), path, "Raw file not available");
                None
            }
        }
    }

    fn build_gated(&self, tree: &Oid, commit: &Oid, force: bool) -> Result<Arc<Snapshot>, BuildError> {
        let ticket = self.acquire_gate(commit);
        let _building = ticket.gate.lock();
        match self.snapshot(commit) {
            Some(snapshot) if !force => Ok(snapshot),
            _ => self.build_and_install(tree, commit),
        }
    }

    fn build_and_install(&self, tree: &Oid, commit: &Oid) -> Result<Arc<Snapshot>, BuildError> {
        match self.builder.build(tree, commit) {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                self.entries
                    .write()
                    .insert(commit.clone(), Arc::clone(&snapshot));
                Ok(snapshot)
            }
            Err(e) => {
                error!(error = %e, commit = %commit, tree = %tree, "Could not build snapshot");
                Err(e)
            }
        }
    }

    fn acquire_gate<'a>(&'a self, commit: &'a Oid) -> GateTicket<'a> {
        let gate = Arc::clone(self.gates.lock().entry(commit.clone()).or_default());
        GateTicket {
            gates: &self.gates,
            commit,
            gate,
        }
    }

    #[cfg(test)]
    fn gate_count(&self) -> usize {
        self.gates.lock().len()
    }
}
