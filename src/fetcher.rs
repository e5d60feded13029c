use std::time::Duration;

use chrono::NaiveDate;
use feed_rs::model::Feed;
use feed_rs::parser;
use reqwest::Client;
use thiserror::Error;
use tracing::{info, warn};

use crate::article::RawArticle;
use crate::config::{FetchConfig, SourceConfig};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unparseable feed: {0}")]
    Parse(#[from] parser::ParseFeedError),
}

/// Something that turns a registry entry into raw articles.
#[allow(async_fn_in_trait)]
pub trait ArticleSource {
    async fn fetch(
        &self,
        source: &SourceConfig,
        today: NaiveDate,
    ) -> Result<Vec<RawArticle>, FetchError>;
}

pub struct Fetcher {
    client: Client,
    max_items: usize,
}

impl Fetcher {
    pub fn new(config: &FetchConfig, max_items: usize) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self { client, max_items })
    }
}

impl ArticleSource for Fetcher {
    async fn fetch(
        &self,
        source: &SourceConfig,
        today: NaiveDate,
    ) -> Result<Vec<RawArticle>, FetchError> {
        info!("Fetching feed: {} ({})", source.name, source.url);

        let bytes = self
            .client
            .get(&source.url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        let parsed = parser::parse(&bytes[..])?;
        Ok(entries_to_articles(parsed, source, today, self.max_items))
    }
}

/// Convert the first `limit` feed entries into articles for `source`.
///
/// Entries without a title or link are skipped. The article date is the
/// UTC calendar date of the entry's published (else updated) timestamp, or
/// `today` when the feed gives neither.
pub fn entries_to_articles(
    feed: Feed,
    source: &SourceConfig,
    today: NaiveDate,
    limit: usize,
) -> Vec<RawArticle> {
    let mut articles = Vec::new();

    for entry in feed.entries.into_iter().take(limit) {
        let title = entry
            .title
            .as_ref()
            .map(|t| t.content.trim().to_string())
            .unwrap_or_default();

        // The first link is the article itself
        let link = entry
            .links
            .first()
            .map(|l| l.href.trim().to_string())
            .unwrap_or_default();

        if title.is_empty() || link.is_empty() {
            warn!(source = %source.name, id = %entry.id, "Skipping entry without title or link");
            continue;
        }

        let date = entry
            .published
            .or(entry.updated)
            .map(|dt| dt.date_naive())
            .unwrap_or(today);

        articles.push(RawArticle {
            title,
            url: link,
            source: source.name.clone(),
            lang: source.lang.clone(),
            date,
        });
    }

    articles
}

/// Fetch every source in registry order.
///
/// A source that fails is logged and contributes nothing.
pub async fn collect_all<S: ArticleSource>(
    fetcher: &S,
    sources: &[SourceConfig],
    today: NaiveDate,
) -> Vec<RawArticle> {
    let mut all = Vec::new();

    for source in sources {
        match fetcher.fetch(source, today).await {
            Ok(articles) => {
                info!("Collected {} articles from '{}'", articles.len(), source.name);
                all.extend(articles);
            }
            Err(e) => {
                warn!("Failed to fetch feed '{}': {}", source.name, e);
            }
        }
    }

    info!("Collected {} articles from {} sources", all.len(), sources.len());
    all
}
