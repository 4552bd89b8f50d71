//! Text normalization and multi-select expansion

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use unicode_normalization::UnicodeNormalization;

use crate::error::SurveyError;

/// Delimiters respondents (and earlier exports) use between selections.
pub const DEFAULT_DELIMITERS: &str = r"[;,/|]";

const CANONICAL_SEPARATOR: char = ',';

static DEFAULT_DELIMITER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(DEFAULT_DELIMITERS).expect("valid delimiter pattern"));

/// Canonical form of a free-text token: NFKC, single spaces, trimmed, lower case.
pub fn normalize(text: &str) -> String {
    let composed: String = text.nfkc().collect();
    composed
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// [`normalize`] lifted over missing values.
pub fn normalize_opt(text: Option<&str>) -> Option<String> {
    text.map(normalize)
}

/// One selected option, tied back to the respondent row it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub record: usize,
    pub value: String,
}

/// Splits multi-select answers into a long relation of `(record, value)` rows.
#[derive(Debug, Clone)]
pub struct MultiSelectExpander {
    delimiters: Regex,
}

impl Default for MultiSelectExpander {
    fn default() -> Self {
        Self {
            delimiters: DEFAULT_DELIMITER_RE.clone(),
        }
    }
}

impl MultiSelectExpander {
    /// Expander using a custom delimiter pattern (a regex character class such as `[;,/|]`).
    pub fn with_pattern(pattern: &str) -> crate::Result<Self> {
        let delimiters = Regex::new(pattern)
            .map_err(|e| SurveyError::Config(format!("invalid delimiter pattern '{pattern}': {e}")))?;
        Ok(Self { delimiters })
    }

    /// Tokens of a single answer, in the order they were written.
    pub fn split(&self, answer: Option<&str>) -> Vec<String> {
        let cleaned: String = answer
            .unwrap_or("")
            .chars()
            .filter(|c| !matches!(c, '[' | ']' | '\'' | '"'))
            .collect();
        let separator = CANONICAL_SEPARATOR.to_string();
        let unified = self.delimiters.replace_all(&cleaned, separator.as_str());

        unified
            .split(CANONICAL_SEPARATOR)
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::to_owned)
            .collect()
    }

    /// Expand a column; `normalizer` is applied to every surviving token.
    pub fn expand<'a, I>(&self, answers: I, normalizer: Option<&dyn Fn(&str) -> String>) -> Vec<Selection>
    where
        I: IntoIterator<Item = Option<&'a str>>,
    {
        let mut rows = Vec::new();
        for (record, answer) in answers.into_iter().enumerate() {
            for token in self.split(answer) {
                let value = match normalizer {
                    Some(f) => f(&token),
                    None => token,
                };
                rows.push(Selection { record, value });
            }
        }
        rows
    }
}
