//! Flat list of archived articles.

use std::path::Path;

use anyhow::Result;

use crate::adapters::display_host;
use crate::domain::Article;

use super::template::{load_or_default, DateStyle, Template};

/// Templates for the articles document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleTemplates {
    pub header: Template,

    /// One article, takes `{title}`, `{share_url}`, `{tag_line}`,
    /// `{archived}`, `{created}`, `{host}` and `{original_url}`
    pub article: Template,
}

impl ArticleTemplates {
    pub const HEADER: &'static str = "public:: true";
    pub const ARTICLE: &'static str = "- [{title}]({share_url}) ({host}) {tag_line}\n  archived:: {archived}";

    /// Load `articles.md` and `articles-article.md` overrides from `dir`
    pub async fn load(dir: Option<&Path>) -> Result<Self> {
        Ok(Self {
            header: load_or_default(dir, "articles.md", Self::HEADER).await?,
            article: load_or_default(dir, "articles-article.md", Self::ARTICLE).await?,
        })
    }
}

impl Default for ArticleTemplates {
    fn default() -> Self {
        Self {
            header: Template::new(Self::HEADER),
            article: Template::new(Self::ARTICLE),
        }
    }
}

/// Renders articles in the order given
#[derive(Debug, Clone, Default)]
pub struct ArticleListRenderer {
    templates: ArticleTemplates,
    dates: DateStyle,
}

impl ArticleListRenderer {
    pub fn new(templates: ArticleTemplates, dates: DateStyle) -> Self {
        Self { templates, dates }
    }

    pub fn render_document(&self, articles: &[Article]) -> String {
        let mut document = self.templates.header.render(&[]).trim().to_string();
        document.push('\n');

        for article in articles {
            for line in self.render_article(article).lines() {
                document.push_str(line.trim_end());
                document.push('\n');
            }
        }

        document
    }

    pub fn render_article(&self, article: &Article) -> String {
        let host = display_host(&article.original_url);
        let tag_line = article.tag_references();
        let archived = self.dates.format(article.archived_at);
        let created = self.dates.format(article.created_at);

        self.templates.article.render(&[
            ("title", article.title.as_str()),
            ("share_url", article.share_url.as_str()),
            ("tag_line", tag_line.as_str()),
            ("archived", archived.as_str()),
            ("created", created.as_str()),
            ("host", host.as_str()),
            ("original_url", article.original_url.as_str()),
        ])
    }
}
