//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Reads through the [`Blog`] façade held by the [`Context`]
//! 2. Formats and writes the result to stdout
//!
//! Handlers never open the repository themselves.

mod article;
mod file_cmd;
mod index;
mod list;
mod resolve;

pub use article::article;
pub use file_cmd::file;
pub use index::index;
pub use list::list;
pub use resolve::resolve;

use std::sync::Arc;

use anyhow::{bail, Context as _, Result};
use tracing::{debug, warn};

use crate::cache::Blog;
use crate::cli::args::{Cli, Command};
use crate::core::config::Config;
use crate::core::types::Reference;
use crate::git::Git;
use crate::render::DefaultTemplates;

/// Everything a handler needs.
#[derive(Debug)]
pub struct Context {
    pub config: Config,
    pub reference: Reference,
    pub blog: Blog,
}

impl Context {
    /// Load config, open the repository and wire the cache.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let loaded = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
        for warning in &loaded.warnings {
            warn!(path = %warning.path.display(), "{}", warning.message);
        }

        let mut config = loaded.config;
        if let Some(repo) = &cli.repo {
            config = config.with_repository(repo);
        }
        let reference = cli.reference().context("Invalid reference")?;

        let Some(path) = config.repository() else {
            bail!("No repository configured. Pass --repo or set `repository` in the config file.");
        };
        debug!(repository = %path.display(), config = ?config.loaded_from(), "Opening repository");

        let git = Git::open(path).with_context(|| format!("Failed to open repository at {}", path.display()))?;
        let defaults = DefaultTemplates::builtin().context("Built-in templates do not compile")?;
        let blog = Blog::with_repository(Arc::new(git), defaults, &config);

        Ok(Self {
            config,
            reference,
            blog,
        })
    }
}

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Resolve { json } => resolve::resolve(ctx, json),
        Command::List { json } => list::list(ctx, json),
        Command::Index { page } => index::index(ctx, page),
        Command::Article { name } => article::article(ctx, &name),
        Command::File { path } => file_cmd::file(ctx, &path),
    }
}
