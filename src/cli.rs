use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Parser;

/// Collect AI news feeds, classify and balance the day's selection, and
/// regenerate the static digest.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Source registry and pipeline settings
    #[arg(short, long, default_value = "sources.toml")]
    pub config: PathBuf,

    /// Override the archive directory from the config file
    #[arg(long)]
    pub archive_dir: Option<PathBuf>,

    /// Override the output HTML path from the config file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Run for this reporting day (YYYY-MM-DD) instead of today
    #[arg(long)]
    pub date: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["ai-topics"]);
        assert_eq!(cli.config, PathBuf::from("sources.toml"));
        assert!(cli.archive_dir.is_none());
        assert!(cli.output.is_none());
        assert!(cli.date.is_none());
    }

    #[test]
    fn test_overrides() {
        let cli = Cli::parse_from([
            "ai-topics",
            "-c",
            "/etc/ai-topics.toml",
            "--archive-dir",
            "/var/lib/ai-topics",
            "-o",
            "/srv/www/index.html",
            "--date",
            "2026-10-17",
        ]);

        assert_eq!(cli.config, PathBuf::from("/etc/ai-topics.toml"));
        assert_eq!(cli.archive_dir, Some(PathBuf::from("/var/lib/ai-topics")));
        assert_eq!(cli.output, Some(PathBuf::from("/srv/www/index.html")));
        assert_eq!(cli.date, NaiveDate::from_ymd_opt(2026, 10, 17));
    }

    #[test]
    fn test_bad_date_rejected() {
        assert!(Cli::try_parse_from(["ai-topics", "--date", "yesterday"]).is_err());
    }
}
