//! site
//!
//! Models handed to page templates.
//!
//! Templates see plain serializable structs, never cache types, so a
//! commit's `index.tpl` or `article.tpl` depends only on the field names
//! below.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cache::{Article, DocumentIndex};
use crate::core::config::Config;
use crate::core::types::Reference;

/// Base URL under which a reference's pages live.
///
/// ```
/// use gitblog::core::types::Reference;
/// use gitblog::site::base_url;
///
/// assert_eq!(base_url(&Reference::Default), "/");
/// assert_eq!(base_url(&Reference::branch("drafts").unwrap()), "/branch/drafts/");
/// ```
pub fn base_url(reference: &Reference) -> String {
    match reference {
        Reference::Default => "/".to_string(),
        Reference::Branch(name) => format!("/branch/{name}/"),
        Reference::Commit(id) => format!("/commit/{id}/"),
    }
}

/// Page header fields shared by both templates.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SiteHeader {
    pub title: String,
    pub logo: String,
    pub git_url: String,
    pub base_url: String,
}

impl SiteHeader {
    /// Header for pages of `reference`.
    pub fn new(config: &Config, reference: &Reference) -> Self {
        Self {
            title: config.title().to_string(),
            logo: config.logo().to_string(),
            git_url: config.git_url().to_string(),
            base_url: base_url(reference),
        }
    }
}

/// One entry of the index page.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ArticleSummary {
    pub name: String,
    pub modified: DateTime<Utc>,
    pub preview: String,
    pub url: String,
}

impl ArticleSummary {
    fn new(article: &Article, base_url: &str) -> Self {
        Self {
            name: article.name().to_string(),
            modified: article.modified(),
            preview: article.preview(base_url),
            url: article.url(base_url),
        }
    }
}

/// Model for `index.tpl`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct IndexModel {
    #[serde(flatten)]
    pub header: SiteHeader,
    /// Zero-based page number
    pub page: usize,
    /// Total number of pages
    pub pages: usize,
    pub articles: Vec<ArticleSummary>,
}

impl IndexModel {
    /// Model for page `page` of `index`.
    pub fn new(config: &Config, reference: &Reference, index: &DocumentIndex, page: usize) -> Self {
        let header = SiteHeader::new(config, reference);
        let length = config.page_length();
        let articles = index
            .page(page, length)
            .iter()
            .map(|a| ArticleSummary::new(a, &header.base_url))
            .collect();

        Self {
            page,
            pages: index.pages(length),
            articles,
            header,
        }
    }
}

/// The document shown by `article.tpl`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ArticleBody {
    pub name: String,
    pub modified: DateTime<Utc>,
    pub content: String,
}

/// Model for `article.tpl`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ArticleModel {
    #[serde(flatten)]
    pub header: SiteHeader,
    pub article: ArticleBody,
}

impl ArticleModel {
    /// Model for one article.
    pub fn new(config: &Config, reference: &Reference, article: &Article) -> Self {
        Self {
            header: SiteHeader::new(config, reference),
            article: ArticleBody {
                name: article.name().to_string(),
                modified: article.modified(),
                content: article.full().to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{FileConfig, SiteConfig};
    use chrono::TimeZone;
    use std::sync::Arc;

    fn config(page_length: usize) -> Config {
        Config::from_file(FileConfig {
            site: Some(SiteConfig {
                page_length: Some(page_length),
                ..Default::default()
            }),
            ..Default::default()
        })
        .unwrap()
    }

    fn index(n: i64) -> DocumentIndex {
        DocumentIndex::new(
            (0..n)
                .map(|i| {
                    Arc::new(Article::new(
                        format!("post-{i}"),
                        Utc.timestamp_opt(i, 0).unwrap(),
                        format!("<h1>Post {i}</h1>"),
                    ))
                })
                .collect(),
        )
    }

    #[test]
    fn base_urls() {
        assert_eq!(base_url(&Reference::Default), "/");
        assert_eq!(base_url(&Reference::branch("a/b").unwrap()), "/branch/a/b/");
        assert_eq!(base_url(&Reference::commit("ABCDEF").unwrap()), "/commit/abcdef/");
    }

    #[test]
    fn index_model_pages() {
        let model = IndexModel::new(&config(2), &Reference::branch("drafts").unwrap(), &index(5), 2);
        assert_eq!(model.pages, 3);
        assert_eq!(model.page, 2);
        assert_eq!(model.articles.len(), 1);
        assert_eq!(model.articles[0].name, "post-0");
        assert_eq!(model.articles[0].url, "/branch/drafts/article/post-0");
        assert_eq!(model.articles[0].preview, "<h3>Post 0</h3>");
    }

    #[test]
    fn models_serialize_flat() {
        let index = index(1);
        let article = &index.articles()[0];
        let model = ArticleModel::new(&config(20), &Reference::Default, article);

        let value = serde_json::to_value(&model).unwrap();
        assert_eq!(value["title"], "Git based blogging");
        assert_eq!(value["base_url"], "/");
        assert_eq!(value["article"]["content"], "<h1>Post 0</h1>");
        assert!(value.get("header").is_none());
    }
}
