//! render
//!
//! Turning repository bytes into HTML.
//!
//! # Modules
//!
//! - [`markdown`] - The document renderer: markdown to sanitized HTML
//! - [`template`] - Compiled page templates and the built-in defaults
//!
//! Rendering is pure. The snapshot builder renders every document once and
//! the result is never touched again.

pub mod markdown;
pub mod template;

pub use markdown::{MarkdownRenderer, Renderer};
pub use template::{DefaultTemplates, Template, TemplateError, TemplateRole};
