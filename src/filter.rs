use std::collections::HashSet;

use chrono::{Days, NaiveDate};
use tracing::{debug, info};

use crate::article::RawArticle;
use crate::config::PipelineConfig;

/// Which publication dates count as "current" for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowPolicy {
    /// Days before today still inside the primary window
    pub primary_days: u32,
    /// Below this many primary-window articles the window is widened
    pub min_primary: usize,
    /// Days before today covered by the widened window
    pub fallback_days: u32,
}

impl Default for WindowPolicy {
    fn default() -> Self {
        Self {
            primary_days: 1,
            min_primary: 5,
            fallback_days: 3,
        }
    }
}

impl From<&PipelineConfig> for WindowPolicy {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            primary_days: config.primary_window_days,
            min_primary: config.min_primary_articles,
            fallback_days: config.fallback_window_days,
        }
    }
}

fn days_before(today: NaiveDate, days: u32) -> NaiveDate {
    today
        .checked_sub_days(Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MIN)
}

/// Keep the articles of the current reporting window, first occurrence of
/// each URL only.
///
/// The primary window is `today - primary_days ..= today`. When it holds
/// fewer than `min_primary` articles every article dated on or after
/// `today - fallback_days` is taken instead. Output follows input order.
pub fn filter_recent(
    articles: Vec<RawArticle>,
    today: NaiveDate,
    policy: &WindowPolicy,
) -> Vec<RawArticle> {
    let primary_start = days_before(today, policy.primary_days);
    let primary_count = articles
        .iter()
        .filter(|a| a.date >= primary_start && a.date <= today)
        .count();

    let recent: Vec<RawArticle> = if primary_count >= policy.min_primary {
        articles
            .into_iter()
            .filter(|a| a.date >= primary_start && a.date <= today)
            .collect()
    } else {
        let cutoff = days_before(today, policy.fallback_days);
        info!(
            primary_count,
            min = policy.min_primary,
            %cutoff,
            "Primary window too sparse, widening"
        );
        articles.into_iter().filter(|a| a.date >= cutoff).collect()
    };

    dedup_by_url(recent)
}

/// Drop every article whose URL was already seen earlier in the list.
pub fn dedup_by_url(articles: Vec<RawArticle>) -> Vec<RawArticle> {
    let before = articles.len();
    let mut seen = HashSet::new();
    let unique: Vec<RawArticle> = articles
        .into_iter()
        .filter(|a| seen.insert(a.url.clone()))
        .collect();

    if unique.len() < before {
        debug!(dropped = before - unique.len(), "Removed duplicate URLs");
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    fn article(url: &str, days_ago: u64) -> RawArticle {
        RawArticle {
            title: format!("Title for {}", url),
            url: url.to_string(),
            source: "Test".to_string(),
            lang: "en".to_string(),
            date: today() - Days::new(days_ago),
        }
    }

    fn urls(articles: &[RawArticle]) -> Vec<&str> {
        articles.iter().map(|a| a.url.as_str()).collect()
    }

    mod window_tests {
        use super::*;

        #[test]
        fn test_primary_window_used_when_dense_enough() {
            let input = vec![
                article("a", 0),
                article("b", 0),
                article("c", 0),
                article("d", 1),
                article("e", 1),
                article("old", 3),
            ];

            let result = filter_recent(input, today(), &WindowPolicy::default());
            assert_eq!(urls(&result), vec!["a", "b", "c", "d", "e"]);
        }

        #[test]
        fn test_sparse_primary_window_escalates() {
            let input = vec![
                article("a", 0),
                article("b", 1),
                article("two-days", 2),
                article("three-days", 3),
                article("four-days", 4),
            ];

            let result = filter_recent(input, today(), &WindowPolicy::default());
            assert_eq!(urls(&result), vec!["a", "b", "two-days", "three-days"]);
        }

        #[test]
        fn test_primary_window_excludes_future_dates() {
            let mut future = article("future", 0);
            future.date = today() + Days::new(1);
            let mut input: Vec<_> = (0..5).map(|i| article(&format!("n{}", i), 0)).collect();
            input.push(future);

            let result = filter_recent(input, today(), &WindowPolicy::default());
            assert_eq!(result.len(), 5);
            assert!(result.iter().all(|a| a.url != "future"));
        }

        #[test]
        fn test_widened_window_keeps_future_dates() {
            let mut future = article("future", 0);
            future.date = today() + Days::new(1);

            let result = filter_recent(vec![future], today(), &WindowPolicy::default());
            assert_eq!(urls(&result), vec!["future"]);
        }

        #[test]
        fn test_empty_input_yields_empty_output() {
            let result = filter_recent(Vec::new(), today(), &WindowPolicy::default());
            assert!(result.is_empty());
        }

        #[test]
        fn test_everything_too_old_yields_empty_output() {
            let input = vec![article("a", 10), article("b", 4)];
            let result = filter_recent(input, today(), &WindowPolicy::default());
            assert!(result.is_empty());
        }

        #[test]
        fn test_primary_count_includes_duplicates() {
            // five primary rows, but only two distinct URLs
            let input = vec![
                article("a", 0),
                article("a", 0),
                article("a", 1),
                article("b", 0),
                article("b", 1),
                article("older", 2),
            ];

            let result = filter_recent(input, today(), &WindowPolicy::default());
            assert_eq!(urls(&result), vec!["a", "b"]);
        }

        #[test]
        fn test_custom_policy() {
            let policy = WindowPolicy {
                primary_days: 0,
                min_primary: 1,
                fallback_days: 7,
            };
            let input = vec![article("today", 0), article("yesterday", 1)];

            let result = filter_recent(input, today(), &policy);
            assert_eq!(urls(&result), vec!["today"]);
        }

        #[test]
        fn test_policy_from_pipeline_config() {
            let config = PipelineConfig {
                primary_window_days: 2,
                min_primary_articles: 8,
                fallback_window_days: 4,
                ..PipelineConfig::default()
            };
            let policy = WindowPolicy::from(&config);
            assert_eq!(
                policy,
                WindowPolicy {
                    primary_days: 2,
                    min_primary: 8,
                    fallback_days: 4
                }
            );
        }
    }

    mod dedup_tests {
        use super::*;

        #[test]
        fn test_keeps_first_occurrence() {
            let mut second = article("a", 1);
            second.source = "Mirror".to_string();
            let input = vec![article("a", 0), article("b", 0), second];

            let result = dedup_by_url(input);
            assert_eq!(urls(&result), vec!["a", "b"]);
            assert_eq!(result[0].source, "Test");
        }

        #[test]
        fn test_preserves_source_order() {
            let input = vec![article("z", 1), article("a", 0), article("m", 1)];
            let result = dedup_by_url(input);
            assert_eq!(urls(&result), vec!["z", "a", "m"]);
        }

        #[test]
        fn test_filter_is_idempotent() {
            let input = vec![
                article("a", 0),
                article("b", 1),
                article("a", 1),
                article("c", 3),
                article("b", 0),
            ];
            let once = filter_recent(input, today(), &WindowPolicy::default());
            let twice = filter_recent(once.clone(), today(), &WindowPolicy::default());
            assert_eq!(once, twice);
        }
    }
}
