//! article command - Render one document

use super::Context;
use crate::render::TemplateRole;
use crate::site::ArticleModel;
use anyhow::{anyhow, Result};

/// Render the document `name` to stdout.
pub fn article(ctx: &Context, name: &str) -> Result<()> {
    let article = ctx
        .blog
        .article(&ctx.reference, name)?
        .ok_or_else(|| anyhow!("Article '{}' not found in {}", name, ctx.reference))?;

    let model = ArticleModel::new(&ctx.config, &ctx.reference, &article);
    let template = ctx.blog.template(&ctx.reference, TemplateRole::Article)?;
    print!("{}", template.render(&model)?);
    Ok(())
}
