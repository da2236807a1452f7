//! list command - List documents, newest first

use super::Context;
use anyhow::{anyhow, Result};
use serde::Serialize;

#[derive(Serialize)]
struct Entry<'a> {
    name: &'a str,
    modified: String,
}

/// Print the document index of the selected reference.
pub fn list(ctx: &Context, json: bool) -> Result<()> {
    let index = ctx
        .blog
        .index(&ctx.reference)?
        .ok_or_else(|| anyhow!("Could not build a snapshot for {}", ctx.reference))?;

    if json {
        let entries: Vec<_> = index
            .iter()
            .map(|a| Entry {
                name: a.name(),
                modified: a.modified().to_rfc3339(),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if index.is_empty() {
        println!("No documents.");
        return Ok(());
    }
    for article in index.iter() {
        println!("{}  {}", article.modified().format("%Y-%m-%d %H:%M"), article.name());
    }
    Ok(())
}
