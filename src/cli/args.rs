//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--repo <path>`: Repository to read (overrides the config file)
//! - `--config <path>`: Config file to load instead of the default locations
//! - `--debug`: Enable debug logging
//! - `--branch <name>` / `--commit <id>`: View to read (default branch otherwise)

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::core::types::{Reference, TypeError};

/// gitblog - Serve a git repository's markdown files as a blog
#[derive(Parser, Debug)]
#[command(name = "gitblog")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Repository to read (a bare repository works)
    #[arg(long, global = true, value_name = "PATH")]
    pub repo: Option<PathBuf>,

    /// Config file to load instead of the default locations
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Read this branch instead of the default branch
    #[arg(long, global = true, conflicts_with = "commit")]
    pub branch: Option<String>,

    /// Read this commit (full or abbreviated id)
    #[arg(long, global = true)]
    pub commit: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }

    /// The view selected by `--branch` / `--commit`.
    pub fn reference(&self) -> Result<Reference, TypeError> {
        Reference::from_parts(self.branch.as_deref(), self.commit.as_deref())
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the tree and commit a reference resolves to
    Resolve {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List documents, most recently modified first
    #[command(
        name = "list",
        after_help = "\
EXAMPLES:
    # Documents on the default branch
    gitblog --repo blog.git list

    # Documents of a draft branch, as JSON
    gitblog --repo blog.git --branch drafts list --json"
    )]
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Render an index page with the commit's index template
    Index {
        /// Zero-based page number
        #[arg(long, default_value_t = 0)]
        page: usize,
    },

    /// Render one document with the commit's article template
    Article {
        /// Document name (file name without `.md`)
        name: String,
    },

    /// Write a raw file from the commit's tree to stdout
    File {
        /// Path relative to the tree root
        path: String,
    },
}
