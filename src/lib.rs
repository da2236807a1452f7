//! gitblog - Serve a git repository's markdown files as a blog
//!
//! Every branch and commit of the repository is a separate, immutable view
//! of the site. Views are materialized once per commit into a snapshot and
//! served from memory until they expire or are invalidated.
//!
//! # Architecture
//!
//! The codebase follows a strict layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, reads through the cache)
//! - [`site`] - Models handed to page templates
//! - [`cache`] - Reference resolution, snapshot building and the snapshot store
//! - [`render`] - Markdown rendering and page templates
//! - [`git`] - Single interface for all Git operations
//! - [`core`] - Domain types and configuration
//!
//! # Correctness Invariants
//!
//! gitblog maintains the following invariants:
//!
//! 1. A commit id always maps to the same materialized content
//! 2. Readers only ever see fully built snapshots
//! 3. At most one build per commit is in flight at a time
//! 4. The repository is never written to

pub mod cache;
pub mod cli;
pub mod core;
pub mod git;
pub mod render;
pub mod site;
