//! Keyword tagging of free-text answers: impression sentiment and purchase barriers
//!
//! Keyword lists are configuration, loadable from TOML. The defaults match the
//! Thai-language survey this tool was built for.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::aggregate::ValueCounts;
use crate::columns::is_placeholder;
use crate::error::SurveyError;

/// All keyword lists used by the taggers.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct KeywordConfig {
    pub sentiment: SentimentLexicon,
    pub barriers: BarrierLexicon,
}

impl KeywordConfig {
    pub fn from_toml_str(source: &str) -> crate::Result<Self> {
        toml::from_str(source).map_err(|e| SurveyError::Config(format!("invalid keyword config: {e}")))
    }

    pub fn from_path(path: impl AsRef<Path>) -> crate::Result<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|e| {
            SurveyError::Config(format!("cannot read keyword config '{}': {e}", path.display()))
        })?;
        Self::from_toml_str(&source)
    }
}

fn owned(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

/// Number of distinct keywords occurring in `text` (already lower-cased).
fn hits(text: &str, keywords: &[String]) -> usize {
    keywords
        .iter()
        .filter(|k| !k.is_empty() && text.contains(k.to_lowercase().as_str()))
        .count()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
    Unspecified,
}

impl Sentiment {
    pub fn as_str(self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Neutral => "neutral",
            Sentiment::Negative => "negative",
            Sentiment::Unspecified => "unspecified",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SentimentLexicon {
    pub positive: Vec<String>,
    pub negative: Vec<String>,
}

impl Default for SentimentLexicon {
    fn default() -> Self {
        Self {
            positive: owned(&["ดี", "สวย", "น่าสนใจ", "ชอบ", "ทันสมัย", "หรู", "คุณภาพ"]),
            negative: owned(&["ไม่", "แพง", "เก่า", "น่าเบื่อ"]),
        }
    }
}

impl SentimentLexicon {
    /// Tag one impression. Ties, including no hits at all, are neutral.
    pub fn tag(&self, text: Option<&str>) -> Sentiment {
        let Some(text) = text.filter(|t| !is_placeholder(t)) else {
            return Sentiment::Unspecified;
        };
        let text = text.to_lowercase();
        let positive = hits(&text, &self.positive);
        let negative = hits(&text, &self.negative);

        if positive > negative {
            Sentiment::Positive
        } else if negative > positive {
            Sentiment::Negative
        } else {
            Sentiment::Neutral
        }
    }

    /// Sentiment distribution over the answered impressions.
    pub fn distribution<'a, I>(&self, answers: I) -> ValueCounts
    where
        I: IntoIterator<Item = Option<&'a str>>,
    {
        ValueCounts::from_values(
            answers
                .into_iter()
                .flatten()
                .filter(|a| !is_placeholder(a))
                .map(|a| self.tag(Some(a)).as_str()),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BarrierCategory {
    Price,
    Quality,
    Availability,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BarrierLexicon {
    pub price: Vec<String>,
    pub quality: Vec<String>,
    pub availability: Vec<String>,
}

impl Default for BarrierLexicon {
    fn default() -> Self {
        Self {
            price: owned(&["แพง", "ราคา", "คุ้ม"]),
            quality: owned(&["คุณภาพ", "ทน", "รีวิว"]),
            availability: owned(&["หา", "ซื้อ", "ไม่รู้"]),
        }
    }
}

/// How many answered barriers touch each category. One answer may hit several.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BarrierSummary {
    pub responses: usize,
    pub price: usize,
    pub quality: usize,
    pub availability: usize,
}

impl BarrierLexicon {
    /// Categories mentioned by one answer.
    pub fn categorize(&self, text: &str) -> Vec<BarrierCategory> {
        let text = text.to_lowercase();
        [
            (BarrierCategory::Price, &self.price),
            (BarrierCategory::Quality, &self.quality),
            (BarrierCategory::Availability, &self.availability),
        ]
        .into_iter()
        .filter(|(_, keywords)| hits(&text, keywords) > 0)
        .map(|(category, _)| category)
        .collect()
    }

    pub fn summarize<'a, I>(&self, answers: I) -> BarrierSummary
    where
        I: IntoIterator<Item = Option<&'a str>>,
    {
        let mut summary = BarrierSummary::default();
        for answer in answers.into_iter().flatten().filter(|a| !is_placeholder(a)) {
            summary.responses += 1;
            for category in self.categorize(answer) {
                match category {
                    BarrierCategory::Price => summary.price += 1,
                    BarrierCategory::Quality => summary.quality += 1,
                    BarrierCategory::Availability => summary.availability += 1,
                }
            }
        }
        summary
    }
}
