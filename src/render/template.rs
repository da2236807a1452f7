//! render::template
//!
//! Page templates.
//!
//! A commit may override the look of the site by committing `index.tpl` and
//! `article.tpl` at the top of its tree. Templates use jinja syntax
//! (`minijinja`) and are HTML auto-escaped; fields that already hold HTML
//! (previews, article bodies, the logo) need `|safe`, and so do URLs, since
//! the escaper also rewrites `/`.
//!
//! The built-in templates are compiled once into a [`DefaultTemplates`]
//! value at startup and handed to the snapshot builder, which substitutes
//! them whenever a commit's own template is missing or does not compile.
//!
//! # Example
//!
//! ```
//! use gitblog::render::{Template, TemplateRole};
//!
//! let tpl = Template::compile(TemplateRole::Index, "<h1>{{ title }}</h1>").unwrap();
//! let html = tpl.render(&serde_json::json!({ "title": "a < b" })).unwrap();
//! assert_eq!(html, "<h1>a &lt; b</h1>");
//! ```

use std::sync::Arc;

use minijinja::{AutoEscape, Environment};
use serde::Serialize;
use thiserror::Error;

/// Errors from compiling or rendering a template.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// Template source is not valid UTF-8.
    #[error("{role} template is not valid UTF-8")]
    InvalidUtf8 { role: TemplateRole },

    /// Template source does not compile.
    #[error("failed to compile {role} template: {source}")]
    Compile {
        role: TemplateRole,
        source: minijinja::Error,
    },

    /// Rendering failed (undefined filter, bad model, ...).
    #[error("failed to render {role} template: {source}")]
    Render {
        role: TemplateRole,
        source: minijinja::Error,
    },
}

/// Which page a template renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateRole {
    /// The paginated list of documents
    Index,
    /// A single document
    Article,
}

impl TemplateRole {
    /// File name of the per-commit override in the tree root.
    pub fn file_name(self) -> &'static str {
        match self {
            TemplateRole::Index => "index.tpl",
            TemplateRole::Article => "article.tpl",
        }
    }
}

impl std::fmt::Display for TemplateRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TemplateRole::Index => f.write_str("index"),
            TemplateRole::Article => f.write_str("article"),
        }
    }
}

/// A compiled template.
///
/// Cheap to clone; clones share the compiled form.
#[derive(Clone)]
pub struct Template {
    role: TemplateRole,
    env: Arc<Environment<'static>>,
}

impl std::fmt::Debug for Template {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Template").field("role", &self.role).finish()
    }
}

impl Template {
    /// Compile template source for a role.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Compile`] on syntax errors.
    pub fn compile(role: TemplateRole, source: impl Into<String>) -> Result<Self, TemplateError> {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::Html);
        env.add_template_owned(role.file_name(), source.into())
            .map_err(|source| TemplateError::Compile { role, source })?;

        Ok(Self {
            role,
            env: Arc::new(env),
        })
    }

    /// Compile template source read from a blob.
    pub fn from_bytes(role: TemplateRole, source: Vec<u8>) -> Result<Self, TemplateError> {
        let source = String::from_utf8(source).map_err(|_| TemplateError::InvalidUtf8 { role })?;
        Self::compile(role, source)
    }

    /// The role this template was compiled for.
    pub fn role(&self) -> TemplateRole {
        self.role
    }

    /// Render the template against a model.
    pub fn render<S: Serialize>(&self, model: &S) -> Result<String, TemplateError> {
        let role = self.role;
        self.env
            .get_template(role.file_name())
            .and_then(|tpl| tpl.render(model))
            .map_err(|source| TemplateError::Render { role, source })
    }
}

const DEFAULT_STYLE: &str = r#"<style>
html, body { padding: 0; margin: 0; font-family: 'Open Sans', sans-serif; }
.header { background: #222; padding: 0.8em 1em; color: #ccc; }
.header:after { content: ''; display: block; clear: both; }
.header__logo { display: inline-block; text-align: center; font-weight: 900; font-family: monospace; font-size: 25px; border: 2px solid #ccc; padding: 2px 5px; margin: 0 0.8em; vertical-align: middle; }
.header__title { display: inline-block; vertical-align: middle; }
.header__git { display: inline-block; float: right; font-style: italic; font-family: monospace; }
.home { display: block; margin: 1em; }
.article { border: 2px solid #222; margin: 1em; padding: 1em; }
.pagination { text-align: center; }
</style>"#;

const DEFAULT_HEADER: &str = r#"<header class="header">
<div class="header__logo">{{ logo|safe }}</div>
<h1 class="header__title">{{ title }}</h1>
<div class="header__git">git clone {{ git_url|safe }}</div>
</header>"#;

fn default_index_source() -> String {
    format!(
        r#"<!doctype html>
<html lang="en">
<head><meta charset="utf-8"><title>{{{{ title }}}}</title>{DEFAULT_STYLE}</head>
<body>
{DEFAULT_HEADER}
{{% for article in articles %}}
<div class="article">
<p>{{{{ article.preview|safe }}}}</p>
<i>Posted on {{{{ article.modified }}}}</i>
</div>
{{% else %}}
<div class="article"><p>Nothing here yet.</p></div>
{{% endfor %}}
<div class="pagination">Page {{{{ page + 1 }}}} of {{{{ [pages, 1]|max }}}}</div>
</body>
</html>
"#
    )
}

fn default_article_source() -> String {
    format!(
        r#"<!doctype html>
<html lang="en">
<head><meta charset="utf-8"><title>{{{{ article.name }}}} - {{{{ title }}}}</title>{DEFAULT_STYLE}</head>
<body>
{DEFAULT_HEADER}
<a class="home" href="{{{{ base_url|safe }}}}">Home</a>
<div class="article">
{{{{ article.content|safe }}}}
<i>Posted on {{{{ article.modified }}}}</i>
</div>
</body>
</html>
"#
    )
}

/// The built-in template for each role.
#[derive(Debug, Clone)]
pub struct DefaultTemplates {
    index: Template,
    article: Template,
}

impl DefaultTemplates {
    /// Compile the built-in templates.
    ///
    /// # Errors
    ///
    /// Only fails if the built-in sources are broken, which the unit tests
    /// rule out.
    pub fn builtin() -> Result<Self, TemplateError> {
        Ok(Self {
            index: Template::compile(TemplateRole::Index, default_index_source())?,
            article: Template::compile(TemplateRole::Article, default_article_source())?,
        })
    }

    /// Use caller-provided templates as the defaults.
    pub fn new(index: Template, article: Template) -> Self {
        Self { index, article }
    }

    /// The default template for a role.
    pub fn get(&self, role: TemplateRole) -> &Template {
        match role {
            TemplateRole::Index => &self.index,
            TemplateRole::Article => &self.article,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn file_names() {
        assert_eq!(TemplateRole::Index.file_name(), "index.tpl");
        assert_eq!(TemplateRole::Article.file_name(), "article.tpl");
    }

    #[test]
    fn compile_error_is_reported() {
        let err = Template::compile(TemplateRole::Article, "{% for %}").unwrap_err();
        assert!(matches!(
            err,
            TemplateError::Compile {
                role: TemplateRole::Article,
                ..
            }
        ));
    }

    #[test]
    fn invalid_utf8_is_reported() {
        let err = Template::from_bytes(TemplateRole::Index, vec![0xff, 0xfe]).unwrap_err();
        assert!(matches!(err, TemplateError::InvalidUtf8 { .. }));
    }

    #[test]
    fn html_is_escaped_unless_safe() {
        let tpl = Template::compile(TemplateRole::Index, "{{ a }}|{{ a|safe }}").unwrap();
        let out = tpl.render(&json!({ "a": "<b>" })).unwrap();
        assert_eq!(out, "&lt;b&gt;|<b>");
    }

    #[test]
    fn builtin_index_renders() {
        let defaults = DefaultTemplates::builtin().unwrap();
        let html = defaults
            .get(TemplateRole::Index)
            .render(&json!({
                "title": "Blog",
                "logo": "BL<br/>OG",
                "git_url": "http://localhost/blog.git",
                "base_url": "/",
                "page": 0,
                "pages": 1,
                "articles": [{
                    "name": "hello",
                    "modified": "2024-01-01T00:00:00Z",
                    "preview": "<h3>Hello</h3>",
                    "url": "/article/hello",
                }],
            }))
            .unwrap();
        assert!(html.contains("<h3>Hello</h3>"));
        assert!(html.contains("BL<br/>OG"));
        assert!(html.contains("Page 1 of 1"));
        assert!(html.contains("git clone http://localhost/blog.git"));
    }

    #[test]
    fn builtin_article_renders() {
        let defaults = DefaultTemplates::builtin().unwrap();
        let html = defaults
            .get(TemplateRole::Article)
            .render(&json!({
                "title": "Blog",
                "logo": "B",
                "git_url": "http://localhost/blog.git",
                "base_url": "/branch/drafts/",
                "article": {
                    "name": "hello",
                    "modified": "2024-01-01T00:00:00Z",
                    "content": "<p>Body</p>",
                },
            }))
            .unwrap();
        assert!(html.contains("<p>Body</p>"));
        assert!(html.contains("href=\"/branch/drafts/\""));
        assert!(html.contains("git clone http://localhost/blog.git"));
        assert!(!html.contains("&#x2f;"));
    }

    #[test]
    fn defaults_are_per_role() {
        let defaults = DefaultTemplates::builtin().unwrap();
        assert_eq!(defaults.get(TemplateRole::Index).role(), TemplateRole::Index);
        assert_eq!(
            defaults.get(TemplateRole::Article).role(),
            TemplateRole::Article
        );
    }
}
