use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{Days, NaiveDate};
use thiserror::Error;
use tracing::{debug, info};

use crate::article::Article;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("archive I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("corrupt archive file {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize articles for {date}: {source}")]
    Serialize {
        date: NaiveDate,
        #[source]
        source: serde_json::Error,
    },
}

/// One archived day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyEntry {
    pub date: NaiveDate,
    pub articles: Vec<Article>,
}

/// The retained days, most recent first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportingWindow {
    pub days: Vec<DailyEntry>,
}

impl ReportingWindow {
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn total_articles(&self) -> usize {
        self.days.iter().map(|d| d.articles.len()).sum()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.days.iter().map(|d| d.date).collect()
    }
}

/// Oldest date still inside a horizon of `retention_days` days ending today.
pub fn horizon_start(today: NaiveDate, retention_days: u32) -> NaiveDate {
    let back = u64::from(retention_days.saturating_sub(1));
    today
        .checked_sub_days(Days::new(back))
        .unwrap_or(NaiveDate::MIN)
}

/// One `<YYYY-MM-DD>.json` file per reporting day, each a pretty-printed
/// array of articles in selection order.
pub struct ArchiveStore {
    dir: PathBuf,
}

impl ArchiveStore {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.dir.join(format!("{}.json", date.format("%Y-%m-%d")))
    }

    /// Write the full article list for `date`, replacing any earlier file.
    pub fn persist(&self, date: NaiveDate, articles: &[Article]) -> Result<PathBuf, ArchiveError> {
        fs::create_dir_all(&self.dir).map_err(|source| ArchiveError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let json = serde_json::to_string_pretty(articles)
            .map_err(|source| ArchiveError::Serialize { date, source })?;

        let path = self.path_for(date);
        fs::write(&path, json).map_err(|source| ArchiveError::Io {
            path: path.clone(),
            source,
        })?;

        info!(path = %path.display(), count = articles.len(), "Saved daily archive");
        Ok(path)
    }

    /// Load every retained day without touching expired files.
    ///
    /// A retained file that fails to parse aborts the load.
    pub fn list_valid_entries(
        &self,
        today: NaiveDate,
        retention_days: u32,
    ) -> Result<ReportingWindow, ArchiveError> {
        let start = horizon_start(today, retention_days);
        let mut by_date = BTreeMap::new();

        for (date, path) in self.dated_files()? {
            if date < start {
                continue;
            }
            let content = fs::read_to_string(&path).map_err(|source| ArchiveError::Io {
                path: path.clone(),
                source,
            })?;
            let articles: Vec<Article> = serde_json::from_str(&content)
                .map_err(|source| ArchiveError::Corrupt { path, source })?;
            by_date.insert(date, articles);
        }

        let days = by_date
            .into_iter()
            .rev()
            .map(|(date, articles)| DailyEntry { date, articles })
            .collect();
        Ok(ReportingWindow { days })
    }

    /// Delete the files of every day older than the horizon.
    pub fn prune_expired(
        &self,
        today: NaiveDate,
        retention_days: u32,
    ) -> Result<Vec<NaiveDate>, ArchiveError> {
        let start = horizon_start(today, retention_days);
        let mut removed = Vec::new();

        for (date, path) in self.dated_files()? {
            if date >= start {
                continue;
            }
            fs::remove_file(&path).map_err(|source| ArchiveError::Io {
                path: path.clone(),
                source,
            })?;
            info!(path = %path.display(), "Removed expired archive");
            removed.push(date);
        }

        removed.sort();
        Ok(removed)
    }

    /// Prune, then list: the view the renderer is handed.
    pub fn load_window(
        &self,
        today: NaiveDate,
        retention_days: u32,
    ) -> Result<ReportingWindow, ArchiveError> {
        self.prune_expired(today, retention_days)?;
        self.list_valid_entries(today, retention_days)
    }

    /// `*.json` files in the archive directory whose stem is an ISO date.
    fn dated_files(&self) -> Result<Vec<(NaiveDate, PathBuf)>, ArchiveError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(ArchiveError::Io {
                    path: self.dir.clone(),
                    source,
                })
            }
        };

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| ArchiveError::Io {
                path: self.dir.clone(),
                source,
            })?;
            let path = entry.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match NaiveDate::parse_from_str(stem, "%Y-%m-%d") {
                Ok(date) => files.push((date, path)),
                Err(_) => debug!(path = %path.display(), "Skipping non-date archive file"),
            }
        }

        Ok(files)
    }
}
