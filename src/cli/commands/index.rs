//! index command - Render one index page

use super::Context;
use crate::render::TemplateRole;
use crate::site::IndexModel;
use anyhow::{anyhow, Result};

/// Render page `page` (zero based) of the index to stdout.
pub fn index(ctx: &Context, page: usize) -> Result<()> {
    let index = ctx
        .blog
        .index(&ctx.reference)?
        .ok_or_else(|| anyhow!("Could not build a snapshot for {}", ctx.reference))?;

    let model = IndexModel::new(&ctx.config, &ctx.reference, &index, page);
    let template = ctx.blog.template(&ctx.reference, TemplateRole::Index)?;
    print!("{}", template.render(&model)?);
    Ok(())
}
