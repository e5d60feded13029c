use std::path::PathBuf;

use chrono::{DateTime, FixedOffset, NaiveDate};
use tracing::info;

use crate::archive::ArchiveStore;
use crate::classifier::{classify_all, LabelSource};
use crate::config::Config;
use crate::fetcher::{collect_all, ArticleSource};
use crate::filter::{filter_recent, WindowPolicy};
use crate::render::{render_digest, write_digest};
use crate::selector::select_balanced;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Nothing survived filtering; no archive write, no render.
    NoArticles,
    Published {
        date: NaiveDate,
        selected: usize,
        window_days: usize,
        window_articles: usize,
        output: PathBuf,
    },
}

pub struct Pipeline<S, C> {
    config: Config,
    source: S,
    classifier: Option<C>,
    archive: ArchiveStore,
}

impl<S: ArticleSource, C: LabelSource> Pipeline<S, C> {
    pub fn new(config: Config, source: S, classifier: Option<C>) -> Self {
        let archive = ArchiveStore::new(config.pipeline.archive_dir.clone());
        Self {
            config,
            source,
            classifier,
            archive,
        }
    }

    pub fn archive(&self) -> &ArchiveStore {
        &self.archive
    }

    /// Run every stage for the reporting day that contains `now`.
    pub async fn run(&self, now: DateTime<FixedOffset>) -> anyhow::Result<RunOutcome> {
        let settings = &self.config.pipeline;
        let today = now.date_naive();
        info!(%today, sources = self.config.sources.len(), "Starting digest run");

        let collected = collect_all(&self.source, &self.config.sources, today).await;

        let recent = filter_recent(collected, today, &WindowPolicy::from(settings));
        info!(count = recent.len(), "Articles in reporting window");
        if recent.is_empty() {
            info!("No articles collected, nothing to publish");
            return Ok(RunOutcome::NoArticles);
        }

        let classified = classify_all(
            recent,
            self.classifier.as_ref(),
            self.config.classifier.batch_size,
            settings.fallback_category,
        )
        .await;

        let selected = select_balanced(classified, settings.max_articles);
        info!(count = selected.len(), "Selected articles");

        self.archive.persist(today, &selected)?;

        let window = self.archive.load_window(today, settings.retention_days)?;
        info!(
            days = window.days.len(),
            articles = window.total_articles(),
            "Loaded reporting window"
        );

        let generated_at = now.format("%Y-%m-%d %H:%M %:z").to_string();
        let html = render_digest(&window, &generated_at)?;
        write_digest(&settings.output_path, &html)?;

        Ok(RunOutcome::Published {
            date: today,
            selected: selected.len(),
            window_days: window.days.len(),
            window_articles: window.total_articles(),
            output: settings.output_path.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::article::{Category, RawArticle};
    use crate::classifier::ClassifyError;
    use crate::config::SourceConfig;
    use crate::fetcher::FetchError;
    use chrono::{Days, TimeZone};
    use std::collections::HashMap;
    use tempfile::TempDir;

    /// Serves canned articles keyed by source name.
    struct CannedSource(HashMap<String, Vec<RawArticle>>);

    impl ArticleSource for CannedSource {
        async fn fetch(
            &self,
            source: &SourceConfig,
            _today: NaiveDate,
        ) -> Result<Vec<RawArticle>, FetchError> {
            Ok(self.0.get(&source.name).cloned().unwrap_or_default())
        }
    }

    /// Labels every article after the first word of its title.
    struct TitleLabels;

    impl LabelSource for TitleLabels {
        async fn label_batch(
            &self,
            batch: &[RawArticle],
            _categories: &[Category],
        ) -> Result<Vec<String>, ClassifyError> {
            Ok(batch
                .iter()
                .map(|a| match a.title.split_whitespace().next() {
                    Some("research") => "Research & Papers".to_string(),
                    Some("policy") => "AI Regulation & Policy".to_string(),
                    _ => "LLM & Chat AI".to_string(),
                })
                .collect())
        }
    }

    fn now() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(9 * 3600)
            .unwrap()
            .with_ymd_and_hms(2026, 10, 18, 7, 30, 0)
            .unwrap()
    }

    fn today() -> NaiveDate {
        now().date_naive()
    }

    fn raw(source: &str, title: &str, days_ago: u64) -> RawArticle {
        RawArticle {
            title: title.to_string(),
            url: format!("https://{}.example.com/{}", source, title.replace(' ', "-")),
            source: source.to_string(),
            lang: "en".to_string(),
            date: today() - Days::new(days_ago),
        }
    }

    fn config(dir: &TempDir, max_articles: usize) -> Config {
        let mut config = Config::from_str(
            r#"
            [[sources]]
            name = "alpha"
            url = "https://alpha.example.com/feed"
            lang = "en"

            [[sources]]
            name = "beta"
            url = "https://beta.example.com/feed"
            lang = "en"
            "#,
        )
        .unwrap();
        config.pipeline.archive_dir = dir.path().join("articles");
        config.pipeline.output_path = dir.path().join("site").join("index.html");
        config.pipeline.max_articles = max_articles;
        config
    }

    fn canned(entries: Vec<RawArticle>) -> CannedSource {
        let mut map: HashMap<String, Vec<RawArticle>> = HashMap::new();
        for a in entries {
            map.entry(a.source.clone()).or_default().push(a);
        }
        CannedSource(map)
    }

    #[tokio::test]
    async fn test_no_articles_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir, 15);
        let output = config.pipeline.output_path.clone();
        let source = canned(vec![raw("alpha", "ancient news", 30)]);

        let pipeline = Pipeline::new(config, source, Some(TitleLabels));
        let outcome = pipeline.run(now()).await.unwrap();

        assert_eq!(outcome, RunOutcome::NoArticles);
        assert!(!pipeline.archive().path_for(today()).exists());
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_full_run_persists_and_renders() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir, 4);
        let source = canned(vec![
            raw("alpha", "llm one", 0),
            raw("alpha", "llm two", 0),
            raw("alpha", "llm three", 1),
            raw("beta", "research one", 0),
            raw("beta", "policy one", 1),
            raw("beta", "llm one", 1),
        ]);

        let pipeline = Pipeline::new(config, source, Some(TitleLabels));
        let outcome = pipeline.run(now()).await.unwrap();

        let RunOutcome::Published {
            date,
            selected,
            window_days,
            output,
            ..
        } = outcome
        else {
            panic!("expected a published run");
        };
        assert_eq!(date, today());
        assert_eq!(selected, 4);
        assert_eq!(window_days, 1);
        assert!(output.exists());

        let window = pipeline.archive().list_valid_entries(today(), 7).unwrap();
        let cats: Vec<_> = window.days[0].articles.iter().map(|a| a.category).collect();
        assert_eq!(
            cats,
            vec![
                Category::LlmChat,
                Category::Research,
                Category::Regulation,
                Category::LlmChat
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_classifier_uses_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir, 15);
        let source = canned(vec![raw("alpha", "research one", 0)]);

        let pipeline: Pipeline<_, TitleLabels> = Pipeline::new(config, source, None);
        pipeline.run(now()).await.unwrap();

        let window = pipeline.archive().list_valid_entries(today(), 7).unwrap();
        assert_eq!(window.days[0].articles[0].category, Category::ProductsTools);
    }

    #[tokio::test]
    async fn test_run_prunes_expired_days() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir, 15);
        let archive = ArchiveStore::new(config.pipeline.archive_dir.clone());
        let old = today().checked_sub_days(Days::new(8)).unwrap();
        archive.persist(old, &[]).unwrap();

        let source = canned(vec![raw("alpha", "llm one", 0)]);
        let pipeline = Pipeline::new(config, source, Some(TitleLabels));
        pipeline.run(now()).await.unwrap();

        assert!(!archive.path_for(old).exists());
        assert!(archive.path_for(today()).exists());
    }
}
