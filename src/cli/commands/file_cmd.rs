//! file command - Copy a raw blob to stdout
//!
//! Any blob in the tree can be read, documents or not.

use super::Context;
use anyhow::{anyhow, Context as _, Result};
use std::io::Write;

/// Write the blob at `path` to stdout.
pub fn file(ctx: &Context, path: &str) -> Result<()> {
    let bytes = ctx
        .blog
        .file(&ctx.reference, path)?
        .ok_or_else(|| anyhow!("File '{}' not found in {}", path, ctx.reference))?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&bytes).context("Failed to write to stdout")?;
    stdout.flush()?;
    Ok(())
}
