use std::fs;
use std::path::Path;

use anyhow::Context;
use askama::Template;
use chrono::{Datelike, NaiveDate};
use tracing::info;

use crate::archive::ReportingWindow;
use crate::article::{Article, Category};

#[derive(Template)]
#[template(path = "digest.html")]
pub struct DigestTemplate {
    pub generated_at: String,
    pub tabs: Vec<DateTab>,
    pub chips: Vec<CategoryChip>,
    pub sections: Vec<DateSection>,
}

pub struct DateTab {
    pub date: String,
    pub label: String,
}

pub struct CategoryChip {
    /// Exact value matched against each card's `data-category`
    pub value: String,
    pub label: String,
    pub color: String,
}

pub struct DateSection {
    pub date: String,
    pub cards: Vec<ArticleCard>,
}

pub struct ArticleCard {
    pub title: String,
    pub url: String,
    pub source: String,
    pub lang: String,
    pub lang_badge: String,
    pub category: String,
    pub color: String,
}

impl From<&Article> for ArticleCard {
    fn from(article: &Article) -> Self {
        Self {
            title: article.title.clone(),
            url: article.url.clone(),
            source: article.source.clone(),
            lang: article.lang.to_lowercase(),
            lang_badge: article.lang.to_uppercase(),
            category: article.category.label().to_string(),
            color: article.category.color().to_string(),
        }
    }
}

/// Tab label such as `10/18 (Sun)`.
pub fn tab_label(date: NaiveDate) -> String {
    format!("{}/{} ({})", date.month(), date.day(), date.format("%a"))
}

impl DigestTemplate {
    pub fn build(window: &ReportingWindow, generated_at: &str) -> Self {
        let tabs = window
            .days
            .iter()
            .map(|day| DateTab {
                date: day.date.to_string(),
                label: tab_label(day.date),
            })
            .collect();

        let mut chips = vec![CategoryChip {
            value: "all".to_string(),
            label: "All".to_string(),
            color: "#3b82f6".to_string(),
        }];
        chips.extend(Category::ALL.iter().map(|c| CategoryChip {
            value: c.label().to_string(),
            label: c.label().to_string(),
            color: c.color().to_string(),
        }));

        let sections = window
            .days
            .iter()
            .map(|day| DateSection {
                date: day.date.to_string(),
                cards: day.articles.iter().map(ArticleCard::from).collect(),
            })
            .collect();

        Self {
            generated_at: generated_at.to_string(),
            tabs,
            chips,
            sections,
        }
    }
}

pub fn render_digest(window: &ReportingWindow, generated_at: &str) -> anyhow::Result<String> {
    DigestTemplate::build(window, generated_at)
        .render()
        .context("Failed to render digest template")
}

pub fn write_digest(path: &Path, html: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    fs::write(path, html).with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), bytes = html.len(), "Wrote digest");
    Ok(())
}
