use anyhow::Context;
use chrono::{NaiveTime, TimeZone, Utc};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ai_topics::classifier::MessagesClassifier;
use ai_topics::cli::Cli;
use ai_topics::config::Config;
use ai_topics::fetcher::Fetcher;
use ai_topics::pipeline::{Pipeline, RunOutcome};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ai_topics=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Cli::parse();

    // Load configuration
    let mut config = Config::load(&args.config)?;
    if let Some(dir) = args.archive_dir {
        config.pipeline.archive_dir = dir;
    }
    if let Some(output) = args.output {
        config.pipeline.output_path = output;
    }
    info!("Loaded {} sources from configuration", config.sources.len());

    let timezone = config.pipeline.timezone()?;
    let now = match args.date {
        Some(date) => timezone
            .from_local_datetime(&date.and_time(NaiveTime::MIN))
            .single()
            .context("reporting date is not representable in the configured timezone")?,
        None => Utc::now().with_timezone(&timezone),
    };

    let fetcher = Fetcher::new(&config.fetch, config.pipeline.max_items_per_source)?;
    let classifier = MessagesClassifier::from_env(&config.classifier)?;
    if classifier.is_none() {
        info!(
            "{} is not set, classification disabled",
            config.classifier.api_key_env
        );
    }

    let pipeline = Pipeline::new(config, fetcher, classifier);
    match pipeline.run(now).await? {
        RunOutcome::NoArticles => info!("No articles found, exiting without changes"),
        RunOutcome::Published {
            date,
            selected,
            window_days,
            window_articles,
            output,
        } => info!(
            %date,
            selected,
            window_days,
            window_articles,
            output = %output.display(),
            "Digest published"
        ),
    }

    Ok(())
}
