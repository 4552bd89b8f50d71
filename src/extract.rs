//! Numeric midpoints from free-text income and price answers

use once_cell::sync::Lazy;
use regex::Regex;

static DIGIT_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]+").expect("valid digit pattern"));

/// All maximal digit runs in `text`, after dropping thousands separators.
pub fn extract_numbers(text: &str) -> Vec<f64> {
    let stripped = text.replace(',', "");
    DIGIT_RUN
        .find_iter(&stripped)
        .filter_map(|m| m.as_str().parse::<f64>().ok())
        .collect()
}

/// Income midpoint: mean of every number in the answer.
///
/// `"15,000-20,000"` gives `17500.0`; text without digits gives `None`.
pub fn extract_income(text: &str) -> Option<f64> {
    mean(&extract_numbers(text))
}

/// Price midpoint: a single number is returned verbatim, two or more are
/// averaged (all of them, not only the first pair).
pub fn extract_price_range(text: &str) -> Option<f64> {
    match extract_numbers(text).as_slice() {
        [] => None,
        [single] => Some(*single),
        many => mean(many),
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}
