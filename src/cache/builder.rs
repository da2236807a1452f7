//! cache::builder
//!
//! Builds a [`Snapshot`] from a `(tree, commit)` pair.
//!
//! # Failure isolation
//!
//! - A tree that cannot be read fails the whole build ([`BuildError`]).
//!   Nothing is cached and the next request tries again.
//! - A document whose blob or history cannot be read is skipped with a
//!   warning. One broken file never hides the rest of the site.
//! - A template that cannot be read or compiled falls back to the built-in
//!   default for that role only.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use super::snapshot::{Article, DocumentIndex, Snapshot, SnapshotParts};
use crate::core::types::Oid;
use crate::git::{GitError, RepositoryAccessor, TreeEntry};
use crate::render::{DefaultTemplates, Renderer, Template, TemplateRole};

/// Extension of files that become documents.
pub const DOCUMENT_EXTENSION: &str = ".md";

/// A build that produced nothing.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The tree could not be enumerated.
    #[error("could not read tree {tree}: {source}")]
    Tree { tree: Oid, source: GitError },
}

/// Document name for a tree entry, if it qualifies as a document.
///
/// Directories, files without the `.md` extension, and files named just
/// `.md` are not documents.
pub fn document_name(entry: &TreeEntry) -> Option<&str> {
    if entry.is_dir() {
        return None;
    }
    entry
        .name
        .strip_suffix(DOCUMENT_EXTENSION)
        .filter(|stem| !stem.is_empty())
}

/// Walks a commit's tree and assembles its snapshot.
#[derive(Clone)]
pub struct SnapshotBuilder {
    repo: Arc<dyn RepositoryAccessor>,
    renderer: Arc<dyn Renderer>,
    defaults: DefaultTemplates,
}

impl std::fmt::Debug for SnapshotBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotBuilder").finish_non_exhaustive()
    }
}

impl SnapshotBuilder {
    /// Create a builder.
    pub fn new(
        repo: Arc<dyn RepositoryAccessor>,
        renderer: Arc<dyn Renderer>,
        defaults: DefaultTemplates,
    ) -> Self {
        Self {
            repo,
            renderer,
            defaults,
        }
    }

    /// The repository the builder reads from.
    pub fn repository(&self) -> &Arc<dyn RepositoryAccessor> {
        &self.repo
    }

    /// The fallback templates.
    pub fn defaults(&self) -> &DefaultTemplates {
        &self.defaults
    }

    /// Build the snapshot of `commit`, whose root tree is `tree`.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Tree`] if the tree cannot be enumerated.
    /// Per-document and per-template problems never fail the build.
    pub fn build(&self, tree: &Oid, commit: &Oid) -> Result<Snapshot, BuildError> {
        info!(commit = %commit, tree = %tree, "Building snapshot");

        let entries = self
            .repo
            .tree_entries(tree)
            .map_err(|source| BuildError::Tree {
                tree: tree.clone(),
                source,
            })?;

        let mut articles = Vec::new();
        for entry in &entries {
            if entry.is_dir() {
                debug!(tree = %tree, directory = %entry.name, "Directory ignored");
                continue;
            }
            let Some(name) = document_name(entry) else {
                debug!(tree = %tree, filename = %entry.name, "Non markdown file ignored");
                continue;
            };
            if let Some(article) = self.load_article(commit, entry, name) {
                articles.push(Arc::new(article));
            }
        }

        let index = DocumentIndex::new(articles);
        let snapshot = Snapshot::new(SnapshotParts {
            tree: tree.clone(),
            commit: commit.clone(),
            index,
            index_template: self.load_template(tree, TemplateRole::Index),
            article_template: self.load_template(tree, TemplateRole::Article),
        });

        info!(
            commit = %commit,
            tree = %tree,
            articles = snapshot.index().len(),
            "Snapshot built"
        );
        Ok(snapshot)
    }

    /// Read, date and render one document. `None` skips it.
    fn load_article(&self, commit: &Oid, entry: &TreeEntry, name: &str) -> Option<Article> {
        let source = match self.repo.read_blob(&entry.oid) {
            Ok(source) => source,
            Err(e) => {
                warn!(error = %e, commit = %commit, filename = %entry.name, "File blob could not be read");
                return None;
            }
        };

        let last = match self.repo.last_commit_touching(commit, &entry.name) {
            Ok(last) => last,
            Err(e) => {
                warn!(error = %e, commit = %commit, filename = %entry.name, "Could not get relative commit");
                return None;
            }
        };

        let Some(committer) = last.committer else {
            warn!(commit = %last.oid, filename = %entry.name, "Committer information not set");
            return None;
        };

        let article = Article::new(name, committer.when, self.renderer.render(&source));
        debug!(commit = %commit, article = article.name(), "Article cached");
        Some(article)
    }

    /// The commit's own template for `role`, or the default.
    fn load_template(&self, tree: &Oid, role: TemplateRole) -> Template {
        let source = match self.repo.blob_at_path(tree, role.file_name()) {
            Ok(source) => source,
            Err(e) if e.is_not_found() => {
                debug!(tree = %tree, template = %role, "No template override, using default");
                return self.defaults.get(role).clone();
            }
            Err(e) => {
                warn!(error = %e, tree = %tree, template = %role, "Could not read template blob");
                return self.defaults.get(role).clone();
            }
        };

        match Template::from_bytes(role, source) {
            Ok(template) => template,
            Err(e) => {
                warn!(error = %e, tree = %tree, template = %role, "Could not parse template");
                self.defaults.get(role).clone()
            }
        }
    }
}
