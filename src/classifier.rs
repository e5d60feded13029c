use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::article::{Article, Category, RawArticle};
use crate::config::ClassifierConfig;

const API_VERSION: &str = "2023-06-01";

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("classifier request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("classifier returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("classifier response contained no text")]
    EmptyResponse,

    #[error("classifier response contained no JSON array")]
    NoArray,

    #[error("classifier response is not an array of strings: {0}")]
    Json(#[from] serde_json::Error),
}

/// Anything that can propose one category label per article.
#[allow(async_fn_in_trait)]
pub trait LabelSource {
    async fn label_batch(
        &self,
        batch: &[RawArticle],
        categories: &[Category],
    ) -> Result<Vec<String>, ClassifyError>;
}

/// Classify `articles` in batches of `batch_size`.
///
/// With no classifier every article gets `fallback`. A failing batch gets
/// `fallback` throughout without affecting other batches.
pub async fn classify_all<C: LabelSource>(
    articles: Vec<RawArticle>,
    classifier: Option<&C>,
    batch_size: usize,
    fallback: Category,
) -> Vec<Article> {
    let Some(classifier) = classifier else {
        warn!(
            fallback = %fallback,
            "No classifier credentials, assigning fallback category to all articles"
        );
        return articles.into_iter().map(|a| a.classify(fallback)).collect();
    };

    let batch_size = batch_size.max(1);
    let mut classified = Vec::with_capacity(articles.len());

    for (idx, batch) in articles.chunks(batch_size).enumerate() {
        let labels = match classifier.label_batch(batch, &Category::ALL).await {
            Ok(labels) => Some(labels),
            Err(e) => {
                warn!(batch = idx + 1, size = batch.len(), error = %e, "Classification batch failed");
                None
            }
        };

        let categories = resolve_labels(labels.as_deref(), batch.len(), fallback);
        classified.extend(
            batch
                .iter()
                .cloned()
                .zip(categories)
                .map(|(article, category)| article.classify(category)),
        );
        info!(batch = idx + 1, size = batch.len(), "Classified batch");
    }

    classified
}

/// Map proposed labels onto categories, one per article.
///
/// Missing or unknown labels become `fallback`; surplus labels are ignored.
pub fn resolve_labels(labels: Option<&[String]>, len: usize, fallback: Category) -> Vec<Category> {
    let labels = labels.unwrap_or_default();
    (0..len)
        .map(|i| {
            labels
                .get(i)
                .and_then(|label| Category::from_label(label))
                .unwrap_or(fallback)
        })
        .collect()
}

/// Isolate the outermost `[...]` span of a model reply and parse it.
pub fn extract_label_array(text: &str) -> Result<Vec<String>, ClassifyError> {
    let start = text.find('[').ok_or(ClassifyError::NoArray)?;
    let end = text.rfind(']').ok_or(ClassifyError::NoArray)?;
    if end < start {
        return Err(ClassifyError::NoArray);
    }
    Ok(serde_json::from_str(&text[start..=end])?)
}

pub fn build_prompt(batch: &[RawArticle], categories: &[Category]) -> String {
    let category_list = categories
        .iter()
        .map(|c| format!("- {}", c.label()))
        .collect::<Vec<_>>()
        .join("\n");
    let article_list = batch
        .iter()
        .enumerate()
        .map(|(i, a)| format!("{}. [{}] {}", i + 1, a.lang.to_uppercase(), a.title))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Classify each of the following article titles into exactly one category.

## Categories
{category_list}

## Articles
{article_list}

## Output format
A JSON array whose n-th element is the category name for article n (1-based).
Category names must match the list above exactly.
Output only the JSON array and no other text.

Example: ["{first}", "{second}", ...]"#,
        first = Category::LlmChat.label(),
        second = Category::ImageVideo.label(),
    )
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// Client for a Messages-style chat completion endpoint.
pub struct MessagesClassifier {
    client: Client,
    config: ClassifierConfig,
    api_key: String,
}

impl MessagesClassifier {
    pub fn new(config: ClassifierConfig, api_key: String) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            config,
            api_key,
        })
    }

    /// Build a client from the key in `config.api_key_env`, if it is set.
    pub fn from_env(config: &ClassifierConfig) -> anyhow::Result<Option<Self>> {
        match std::env::var(&config.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(Some(Self::new(config.clone(), key)?)),
            _ => Ok(None),
        }
    }

    async fn complete(&self, prompt: String) -> Result<String, ClassifyError> {
        let url = format!("{}/v1/messages", self.config.endpoint.trim_end_matches('/'));
        let request = MessagesRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ClassifyError::Status { status, body });
        }

        let parsed: MessagesResponse = response.json().await?;
        parsed
            .content
            .into_iter()
            .find(|block| block.kind == "text")
            .and_then(|block| block.text)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(ClassifyError::EmptyResponse)
    }
}

impl LabelSource for MessagesClassifier {
    async fn label_batch(
        &self,
        batch: &[RawArticle],
        categories: &[Category],
    ) -> Result<Vec<String>, ClassifyError> {
        let text = self.complete(build_prompt(batch, categories)).await?;
        extract_label_array(&text)
    }
}
