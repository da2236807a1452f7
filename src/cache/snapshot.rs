//! cache::snapshot
//!
//! The materialized view of one commit.
//!
//! # Invariants
//!
//! - A [`Snapshot`] is immutable once built. Rebuilding a commit replaces
//!   the whole `Arc<Snapshot>` in the store; nothing is patched in place.
//! - A [`DocumentIndex`] is sorted by modification time, newest first, with
//!   ties kept in tree order.
//! - Every article in the index is also reachable by name, and vice versa.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

use crate::core::types::Oid;
use crate::render::{Template, TemplateRole};

/// Preview length, in bytes of HTML, before the "read more" link.
const PREVIEW_LENGTH: usize = 500;

/// One rendered document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    name: String,
    modified: DateTime<Utc>,
    content: String,
}

impl Article {
    /// Create an article from already sanitized HTML.
    pub fn new(name: impl Into<String>, modified: DateTime<Utc>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            modified,
            content: content.into(),
        }
    }

    /// File name without the `.md` extension.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Committer time of the latest commit that touched the file.
    pub fn modified(&self) -> DateTime<Utc> {
        self.modified
    }

    /// The full rendered HTML.
    pub fn full(&self) -> &str {
        &self.content
    }

    /// A short HTML teaser for the index page.
    ///
    /// Only headings and links survive; headings are demoted to `<h3>` so
    /// they do not compete with the page title. Long previews are cut and
    /// followed by a link to `{base_url}article/{name}`.
    ///
    /// ```
    /// use chrono::Utc;
    /// use gitblog::cache::Article;
    ///
    /// let article = Article::new("hello", Utc::now(), "<h1>Hello</h1><p>world</p>");
    /// assert_eq!(article.preview("/"), "<h3>Hello</h3>world");
    /// ```
    pub fn preview(&self, base_url: &str) -> String {
        let data = ammonia::Builder::default()
            .tags(["h1", "a"].into_iter().collect())
            .clean(&self.content)
            .to_string()
            .replace("<h1>", "<h3>")
            .replace("</h1>", "</h3>");

        if data.len() <= PREVIEW_LENGTH {
            return data;
        }

        let mut cut = PREVIEW_LENGTH;
        while !data.is_char_boundary(cut) {
            cut -= 1;
        }
        format!(
            r#"{}... <a href="{}">(Read more)</a>"#,
            &data[..cut],
            self.url(base_url)
        )
    }

    /// Link to this article relative to a site base URL.
    pub fn url(&self, base_url: &str) -> String {
        format!("{}article/{}", base_url, self.name)
    }
}

/// Articles of one snapshot, newest first.
///
/// Cheap to clone; clones share the underlying list.
#[derive(Debug, Clone, Default)]
pub struct DocumentIndex {
    articles: Arc<Vec<Arc<Article>>>,
}

impl DocumentIndex {
    /// Build an index, sorting by modification time (newest first).
    ///
    /// The sort is stable: articles modified at the same instant keep the
    /// order they were given in.
    pub fn new(mut articles: Vec<Arc<Article>>) -> Self {
        articles.sort_by(|a, b| b.modified.cmp(&a.modified));
        Self {
            articles: Arc::new(articles),
        }
    }

    /// Number of articles.
    pub fn len(&self) -> usize {
        self.articles.len()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }

    /// All articles in order.
    pub fn articles(&self) -> &[Arc<Article>] {
        &self.articles
    }

    /// Iterate over the articles in order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Article>> {
        self.articles.iter()
    }

    /// Number of pages needed to show every article with `length` per page.
    pub fn pages(&self, length: usize) -> usize {
        if length == 0 {
            return 0;
        }
        self.articles.len().div_ceil(length)
    }

    /// The articles on page `page` (zero based). Empty past the end.
    pub fn page(&self, page: usize, length: usize) -> &[Arc<Article>] {
        let Some(offset) = page.checked_mul(length) else {
            return &[];
        };
        if offset >= self.articles.len() {
            return &[];
        }
        let end = offset.saturating_add(length).min(self.articles.len());
        &self.articles[offset..end]
    }
}

/// Parts of a snapshot, handed over by the builder.
#[derive(Debug)]
pub(crate) struct SnapshotParts {
    pub tree: Oid,
    pub commit: Oid,
    pub index: DocumentIndex,
    pub index_template: Template,
    pub article_template: Template,
}

/// One commit, fully materialized.
///
/// Raw files that are not documents are not loaded; the snapshot keeps the
/// tree id so they can be read from the repository on demand. The tree id
/// is a reference into the store, not ownership of anything.
#[derive(Debug)]
pub struct Snapshot {
    created_at: Instant,
    built_at: DateTime<Utc>,
    tree: Oid,
    commit: Oid,
    index: DocumentIndex,
    by_name: HashMap<String, Arc<Article>>,
    index_template: Template,
    article_template: Template,
}

impl Snapshot {
    pub(crate) fn new(parts: SnapshotParts) -> Self {
        let by_name = parts
            .index
            .iter()
            .map(|article| (article.name().to_string(), Arc::clone(article)))
            .collect();

        Self {
            created_at: Instant::now(),
            built_at: Utc::now(),
            tree: parts.tree,
            commit: parts.commit,
            index: parts.index,
            by_name,
            index_template: parts.index_template,
            article_template: parts.article_template,
        }
    }

    /// Tree the snapshot was built from.
    pub fn tree(&self) -> &Oid {
        &self.tree
    }

    /// Commit the snapshot was built from.
    pub fn commit(&self) -> &Oid {
        &self.commit
    }

    /// Wall-clock build time.
    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    /// Time since the snapshot was built.
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Whether the snapshot is older than `retention`.
    pub fn is_expired(&self, retention: Duration) -> bool {
        self.age() >= retention
    }

    /// The ordered list of articles.
    pub fn index(&self) -> &DocumentIndex {
        &self.index
    }

    /// Look an article up by name.
    pub fn article(&self, name: &str) -> Option<&Arc<Article>> {
        self.by_name.get(name)
    }

    /// The template for a role (commit override or built-in default).
    pub fn template(&self, role: TemplateRole) -> &Template {
        match role {
            TemplateRole::Index => &self.index_template,
            TemplateRole::Article => &self.article_template,
        }
    }
}
