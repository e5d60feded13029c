use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Topical bucket an article is filed under.
///
/// The set is closed: labels coming back from the classifier are matched
/// against [`Category::label`] exactly, and anything else is replaced by the
/// configured fallback before it can reach the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "LLM & Chat AI")]
    LlmChat,
    #[serde(rename = "Image & Video Generation")]
    ImageVideo,
    #[serde(rename = "Voice & Music AI")]
    VoiceMusic,
    #[serde(rename = "Robotics & Autonomous Driving")]
    Robotics,
    #[serde(rename = "AI Regulation & Policy")]
    Regulation,
    #[serde(rename = "AI Ethics & Safety")]
    EthicsSafety,
    #[serde(rename = "Research & Papers")]
    Research,
    #[serde(rename = "AI Products & Tools")]
    ProductsTools,
    #[serde(rename = "Business & Funding")]
    BusinessFunding,
    #[serde(rename = "Medicine & Science")]
    MedicineScience,
}

impl Category {
    pub const ALL: [Category; 10] = [
        Category::LlmChat,
        Category::ImageVideo,
        Category::VoiceMusic,
        Category::Robotics,
        Category::Regulation,
        Category::EthicsSafety,
        Category::Research,
        Category::ProductsTools,
        Category::BusinessFunding,
        Category::MedicineScience,
    ];

    /// Human-readable label, identical to the serialized form.
    pub fn label(self) -> &'static str {
        match self {
            Category::LlmChat => "LLM & Chat AI",
            Category::ImageVideo => "Image & Video Generation",
            Category::VoiceMusic => "Voice & Music AI",
            Category::Robotics => "Robotics & Autonomous Driving",
            Category::Regulation => "AI Regulation & Policy",
            Category::EthicsSafety => "AI Ethics & Safety",
            Category::Research => "Research & Papers",
            Category::ProductsTools => "AI Products & Tools",
            Category::BusinessFunding => "Business & Funding",
            Category::MedicineScience => "Medicine & Science",
        }
    }

    /// Badge colour used by the rendered digest.
    pub fn color(self) -> &'static str {
        match self {
            Category::LlmChat => "#8B5CF6",
            Category::ImageVideo => "#EC4899",
            Category::VoiceMusic => "#F59E0B",
            Category::Robotics => "#10B981",
            Category::Regulation => "#EF4444",
            Category::EthicsSafety => "#F97316",
            Category::Research => "#3B82F6",
            Category::ProductsTools => "#06B6D4",
            Category::BusinessFunding => "#84CC16",
            Category::MedicineScience => "#14B8A6",
        }
    }

    /// Exact, case-sensitive label lookup.
    pub fn from_label(label: &str) -> Option<Category> {
        Category::ALL.into_iter().find(|c| c.label() == label)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown category label: {0:?}")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::from_label(s).ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// An article as collected from a feed, before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawArticle {
    pub title: String,
    pub url: String,
    pub source: String,
    pub lang: String,
    pub date: NaiveDate,
}

impl RawArticle {
    pub fn classify(self, category: Category) -> Article {
        Article {
            title: self.title,
            url: self.url,
            source: self.source,
            lang: self.lang,
            date: self.date,
            category,
        }
    }
}

/// A classified article; the unit persisted in the daily archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub url: String,
    pub source: String,
    pub lang: String,
    pub date: NaiveDate,
    pub category: Category,
}
