//! cache
//!
//! The snapshot cache: per-commit materialized views of the repository.
//!
//! # Modules
//!
//! - [`resolver`] - Reference to `(tree, commit)` resolution with a short TTL
//! - [`snapshot`] - Article, DocumentIndex and Snapshot
//! - [`builder`] - Builds a snapshot from a tree
//! - [`store`] - Commit-keyed snapshot map with per-key build gates
//! - [`janitor`] - Background sweep of expired snapshots
//! - [`blog`] - Query façade used by the presentation layer
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use gitblog::cache::Blog;
//! use gitblog::core::config::{Config, FileConfig};
//! use gitblog::core::types::Reference;
//! use gitblog::git::mock::{MockEntry, MockRepository};
//! use gitblog::render::DefaultTemplates;
//!
//! let repo = MockRepository::new();
//! repo.commit_on("master", vec![MockEntry::file("hello.md", "# Hello", 100)]);
//!
//! let config = Config::from_file(FileConfig::default()).unwrap();
//! let blog = Blog::with_repository(Arc::new(repo), DefaultTemplates::builtin().unwrap(), &config);
//!
//! let index = blog.index(&Reference::Default).unwrap().unwrap();
//! assert_eq!(index.articles()[0].name(), "hello");
//! ```

pub mod blog;
pub mod builder;
pub mod janitor;
pub mod resolver;
pub mod snapshot;
pub mod store;

pub use blog::Blog;
pub use builder::{BuildError, SnapshotBuilder};
pub use janitor::Janitor;
pub use resolver::{Resolution, ResolveError, Resolver};
pub use snapshot::{Article, DocumentIndex, Snapshot};
pub use store::SnapshotStore;
