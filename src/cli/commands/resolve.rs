//! resolve command - Show the tree and commit a reference points at

use super::Context;
use anyhow::Result;

/// Print the resolution of the selected reference.
pub fn resolve(ctx: &Context, json: bool) -> Result<()> {
    let resolution = ctx.blog.resolve(&ctx.reference)?;

    if json {
        let value = serde_json::json!({
            "reference": ctx.reference.to_string(),
            "tree": resolution.tree.as_str(),
            "commit": resolution.commit.as_str(),
            "summary": resolution.summary,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("commit {}", resolution.commit);
        println!("tree {}", resolution.tree);
        println!();
        println!("    {}", resolution.summary);
    }
    Ok(())
}
