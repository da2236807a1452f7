//! cli
//!
//! Command-line interface layer for gitblog.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Load configuration and open the repository
//! - Delegate to command handlers, which read through [`crate::cache::Blog`]
//!
//! The CLI never touches git directly; every read goes through the snapshot
//! cache exactly as a page request would.

pub mod args;
pub mod commands;

pub use args::{Cli, Command};

use anyhow::Result;

/// Run the CLI application with already parsed arguments.
///
/// This is the main entry point called from `main.rs`.
pub fn run(cli: Cli) -> Result<()> {
    let ctx = commands::Context::from_cli(&cli)?;
    commands::dispatch(cli.command, &ctx)
}
