//! Distributions, group means and cross-tabulations over a survey table
//!
//! Every function here is pure over its input table. Empty tables give empty
//! results; groups without observations give undefined (`None`) means rather
//! than errors.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde::Serialize;

use crate::columns::{display_name, is_placeholder};
use crate::data::{median, Bin, SurveyTable};

/// One distinct value and how often it was observed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
}

/// Value distribution ordered by descending count (ties: first seen first).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValueCounts {
    entries: Vec<ValueCount>,
    total: usize,
}

impl ValueCounts {
    /// Count observed values.
    pub fn from_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut counts: IndexMap<String, usize> = IndexMap::new();
        for value in values {
            *counts.entry(value.into()).or_insert(0) += 1;
        }

        let mut entries: Vec<ValueCount> = counts
            .into_iter()
            .map(|(value, count)| ValueCount { value, count })
            .collect();
        // Stable sort keeps first-encountered order among ties.
        entries.sort_by(|a, b| b.count.cmp(&a.count));

        let total = entries.iter().map(|e| e.count).sum();
        Self { entries, total }
    }

    pub fn entries(&self) -> &[ValueCount] {
        &self.entries
    }

    /// Number of observations counted (before any `top` truncation).
    pub fn total(&self) -> usize {
        self.total
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, value: &str) -> Option<usize> {
        self.entries
            .iter()
            .find(|e| e.value == value)
            .map(|e| e.count)
    }

    /// Fraction of all observations equal to `value`.
    pub fn share(&self, value: &str) -> Option<f64> {
        if self.total == 0 {
            return None;
        }
        self.get(value).map(|count| count as f64 / self.total as f64)
    }

    /// Most frequent value.
    pub fn mode(&self) -> Option<&ValueCount> {
        self.entries.first()
    }

    /// The `n` most frequent values; `total` still refers to all observations.
    pub fn top(&self, n: usize) -> ValueCounts {
        Self {
            entries: self.entries.iter().take(n).cloned().collect(),
            total: self.total,
        }
    }
}

/// Distribution of a column's non-missing values.
pub fn value_counts(table: &SurveyTable, column: &str) -> crate::Result<ValueCounts> {
    let values = table.text_column(column)?;
    Ok(ValueCounts::from_values(values.into_iter().flatten()))
}

/// Like [`value_counts`] but also drops "no answer" placeholders.
pub fn answered_counts(table: &SurveyTable, column: &str) -> crate::Result<ValueCounts> {
    let values = table.text_column(column)?;
    Ok(ValueCounts::from_values(
        values
            .into_iter()
            .flatten()
            .filter(|value| !is_placeholder(value)),
    ))
}

/// Counts for every label of `bin`, in bin order, zero counts included.
pub fn binned_counts(table: &SurveyTable, bin: Bin) -> crate::Result<ValueCounts> {
    let observed = value_counts(table, bin.column())?;
    let entries: Vec<ValueCount> = bin
        .labels()
        .into_iter()
        .map(|label| ValueCount {
            value: label.to_string(),
            count: observed.get(label).unwrap_or(0),
        })
        .collect();
    Ok(ValueCounts {
        total: observed.total(),
        entries,
    })
}

/// Arithmetic mean, `None` for no values.
pub fn mean<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let (sum, n) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

/// Mean, minimum and maximum of a numeric column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NumericSummary {
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

pub fn summarize(table: &SurveyTable, column: &str) -> crate::Result<Option<NumericSummary>> {
    let values: Vec<f64> = table.numeric_column(column)?.into_iter().flatten().collect();
    let Some(mean) = mean(values.iter().copied()) else {
        return Ok(None);
    };
    Ok(Some(NumericSummary {
        count: values.len(),
        mean,
        min: values.iter().copied().fold(f64::INFINITY, f64::min),
        max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    }))
}

/// Mean score of a single column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnMean {
    pub column: String,
    pub label: String,
    pub mean: Option<f64>,
}

/// Column means sorted high to low; undefined means sort last.
pub fn ranked_means(table: &SurveyTable, columns: &[String]) -> crate::Result<Vec<ColumnMean>> {
    let mut ranked = Vec::with_capacity(columns.len());
    for column in columns {
        let values = table.numeric_column(column)?;
        ranked.push(ColumnMean {
            column: column.clone(),
            label: display_name(column),
            mean: mean(values.into_iter().flatten()),
        });
    }
    ranked.sort_by(|a, b| match (a.mean, b.mean) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    Ok(ranked)
}

/// Means of each value column for one group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupMean {
    pub group: String,
    /// Rows in the group.
    pub size: usize,
    /// One entry per value column, aligned with [`GroupMeans::columns`].
    pub means: Vec<Option<f64>>,
    /// Non-missing values behind each mean.
    pub observations: Vec<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GroupMeans {
    pub group_column: String,
    pub columns: Vec<String>,
    pub groups: Vec<GroupMean>,
}

impl GroupMeans {
    pub fn get(&self, group: &str, column: &str) -> Option<f64> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.groups
            .iter()
            .find(|g| g.group == group)
            .and_then(|g| g.means[idx])
    }
}

/// Per-group means of `value_columns`. Only groups with rows appear.
pub fn group_means(
    table: &SurveyTable,
    group_column: &str,
    value_columns: &[String],
) -> crate::Result<GroupMeans> {
    let keys = table.text_column(group_column)?;
    let mut members: IndexMap<String, Vec<usize>> = IndexMap::new();
    for (row, key) in keys.into_iter().enumerate() {
        if let Some(key) = key {
            members.entry(key).or_default().push(row);
        }
    }

    let value_data = value_columns
        .iter()
        .map(|c| table.numeric_column(c))
        .collect::<crate::Result<Vec<_>>>()?;

    let order = category_order(group_column, members.keys().cloned().collect(), false);
    let groups = order
        .into_iter()
        .filter_map(|group| {
            let rows = members.get(&group)?;
            let (means, observations) = value_data
                .iter()
                .map(|values| {
                    let observed: Vec<f64> = rows.iter().filter_map(|&r| values[r]).collect();
                    (mean(observed.iter().copied()), observed.len())
                })
                .unzip();
            Some(GroupMean {
                size: rows.len(),
                group,
                means,
                observations,
            })
        })
        .collect();

    Ok(GroupMeans {
        group_column: group_column.to_string(),
        columns: value_columns.to_vec(),
        groups,
    })
}

/// Distribution of one numeric column within a group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    pub group: String,
    /// Non-missing values of the summarised column.
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    /// Most common answer of the companion column, if one was requested.
    pub mode: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GroupSummaries {
    pub group_column: String,
    pub value_column: String,
    pub mode_column: Option<String>,
    pub groups: Vec<GroupSummary>,
}

impl GroupSummaries {
    pub fn get(&self, group: &str) -> Option<&GroupSummary> {
        self.groups.iter().find(|g| g.group == group)
    }
}

/// Count, mean and median of `value_column` per group, over rows where the
/// value is present. Groups with no values do not appear. With `mode_column`,
/// each group also reports that column's most common answered value among
/// the same rows.
pub fn group_summaries(
    table: &SurveyTable,
    group_column: &str,
    value_column: &str,
    mode_column: Option<&str>,
) -> crate::Result<GroupSummaries> {
    let keys = table.text_column(group_column)?;
    let values = table.numeric_column(value_column)?;
    let modes = mode_column.map(|c| table.text_column(c)).transpose()?;

    let mut members: IndexMap<String, Vec<usize>> = IndexMap::new();
    for (row, key) in keys.into_iter().enumerate() {
        if let (Some(key), Some(_)) = (key, values[row]) {
            members.entry(key).or_default().push(row);
        }
    }

    let order = category_order(group_column, members.keys().cloned().collect(), false);
    let groups = order
        .into_iter()
        .filter_map(|group| {
            let rows = members.get(&group)?;
            let observed: Vec<Option<f64>> = rows.iter().map(|&r| values[r]).collect();
            let mode = modes.as_ref().and_then(|answers| {
                ValueCounts::from_values(
                    rows.iter()
                        .filter_map(|&r| answers[r].as_deref())
                        .filter(|a| !is_placeholder(a)),
                )
                .mode()
                .map(|m| m.value.clone())
            });
            Some(GroupSummary {
                count: rows.len(),
                mean: mean(observed.iter().flatten().copied())?,
                median: median(&observed)?,
                mode,
                group,
            })
        })
        .collect();

    Ok(GroupSummaries {
        group_column: group_column.to_string(),
        value_column: value_column.to_string(),
        mode_column: mode_column.map(str::to_string),
        groups,
    })
}

/// Joint counts of two categorical columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CrossTab {
    pub row_dimension: String,
    pub col_dimension: String,
    pub rows: Vec<String>,
    pub columns: Vec<String>,
    /// `counts[r][c]` pairs `rows[r]` with `columns[c]`.
    pub counts: Vec<Vec<usize>>,
}

impl CrossTab {
    pub fn get(&self, row: &str, column: &str) -> Option<usize> {
        let r = self.rows.iter().position(|v| v == row)?;
        let c = self.columns.iter().position(|v| v == column)?;
        Some(self.counts[r][c])
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }
}

/// Contingency table over rows where both dimensions are answered.
/// Placeholder answers count as missing.
pub fn cross_tab(table: &SurveyTable, row_dimension: &str, col_dimension: &str) -> crate::Result<CrossTab> {
    let row_values = table.text_column(row_dimension)?;
    let col_values = table.text_column(col_dimension)?;

    let pairs: Vec<(String, String)> = row_values
        .into_iter()
        .zip(col_values)
        .filter_map(|(r, c)| Some((r?, c?)))
        .filter(|(r, c)| !is_placeholder(r) && !is_placeholder(c))
        .collect();

    let rows = category_order(row_dimension, pairs.iter().map(|(r, _)| r.clone()).collect(), true);
    let columns = category_order(col_dimension, pairs.iter().map(|(_, c)| c.clone()).collect(), true);

    let mut counts = vec![vec![0usize; columns.len()]; rows.len()];
    for (r, c) in &pairs {
        if let (Some(ri), Some(ci)) = (
            rows.iter().position(|v| v == r),
            columns.iter().position(|v| v == c),
        ) {
            counts[ri][ci] += 1;
        }
    }

    Ok(CrossTab {
        row_dimension: row_dimension.to_string(),
        col_dimension: col_dimension.to_string(),
        rows,
        columns,
        counts,
    })
}

/// Order observed categories: bin order for binned columns, otherwise
/// lexicographic (`sorted`) or as given.
fn category_order(column: &str, observed: Vec<String>, sorted: bool) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(observed.len());
    for value in observed {
        if !unique.contains(&value) {
            unique.push(value);
        }
    }

    if let Some(bin) = Bin::for_column(column) {
        return bin
            .labels()
            .into_iter()
            .filter(|label| unique.iter().any(|v| v == label))
            .map(str::to_owned)
            .collect();
    }
    if sorted {
        return unique.into_iter().collect::<BTreeSet<_>>().into_iter().collect();
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn table() -> SurveyTable {
        let frame = df!(
            "gender" => [Some("A"), Some("A"), Some("B"), None],
            "income_group" => [Some("50k+"), Some("<15k"), Some("<15k"), Some("15-30k")],
            "factor_price" => [Some(4.0), Some(2.0), None, Some(5.0)],
            "factor_style" => [Some(3.0), Some(3.0), Some(3.0), Some(3.0)],
            "platform" => [Some("x"), Some("-"), Some("y"), Some("x")]
        )
        .unwrap();
        SurveyTable::from_frame(frame)
    }

    #[test]
    fn test_value_counts() {
        let counts = value_counts(&table(), "gender").unwrap();
        assert_eq!(counts.get("A"), Some(2));
        assert_eq!(counts.get("B"), Some(1));
        assert_eq!(counts.total(), 3);
        assert_eq!(counts.mode().unwrap().value, "A");
        assert!((counts.share("B").unwrap() - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_value_counts_ties_keep_first_seen() {
        let counts = ValueCounts::from_values(["b", "a", "a", "b", "c"]);
        let order: Vec<&str> = counts.entries().iter().map(|e| e.value.as_str()).collect();
        assert_eq!(order, vec!["b", "a", "c"]);
        assert_eq!(counts.top(1).len(), 1);
        assert_eq!(counts.top(1).total(), 5);
    }

    #[test]
    fn test_answered_counts_skip_placeholders() {
        let counts = answered_counts(&table(), "platform").unwrap();
        assert_eq!(counts.get("-"), None);
        assert_eq!(counts.total(), 3);
    }

    #[test]
    fn test_binned_counts_include_empty_bins() {
        let counts = binned_counts(&table(), Bin::Income).unwrap();
        let labels: Vec<&str> = counts.entries().iter().map(|e| e.value.as_str()).collect();
        assert_eq!(labels, vec!["<15k", "15-30k", "30-50k", "50k+"]);
        assert_eq!(counts.get("30-50k"), Some(0));
        assert_eq!(counts.get("<15k"), Some(2));
    }

    #[test]
    fn test_group_means() {
        let columns = vec!["factor_price".to_string(), "factor_style".to_string()];
        let means = group_means(&table(), "gender", &columns).unwrap();

        assert_eq!(means.groups.len(), 2);
        assert_eq!(means.get("A", "factor_price"), Some(3.0));
        // B's only price answer is missing.
        assert_eq!(means.get("B", "factor_price"), None);
        assert_eq!(means.get("B", "factor_style"), Some(3.0));
        let b = means.groups.iter().find(|g| g.group == "B").unwrap();
        assert_eq!(b.size, 1);
        assert_eq!(b.observations, vec![0, 1]);
        // No rows, no entry.
        assert!(means.groups.iter().all(|g| g.group != "C"));
    }

    #[test]
    fn test_group_means_follow_bin_order() {
        let columns = vec!["factor_style".to_string()];
        let means = group_means(&table(), "income_group", &columns).unwrap();
        let order: Vec<&str> = means.groups.iter().map(|g| g.group.as_str()).collect();
        assert_eq!(order, vec!["<15k", "15-30k", "50k+"]);
    }

    #[test]
    fn test_cross_tab() {
        let tab = cross_tab(&table(), "income_group", "gender").unwrap();
        assert_eq!(tab.rows, vec!["<15k", "50k+"]);
        assert_eq!(tab.columns, vec!["A", "B"]);
        assert_eq!(tab.get("<15k", "A"), Some(1));
        assert_eq!(tab.get("<15k", "B"), Some(1));
        assert_eq!(tab.get("50k+", "B"), Some(0));
        assert_eq!(tab.total(), 3);
    }

    #[test]
    fn test_cross_tab_skips_placeholders() {
        let tab = cross_tab(&table(), "income_group", "platform").unwrap();
        assert_eq!(tab.columns, vec!["x", "y"]);
        assert_eq!(tab.get("<15k", "y"), Some(1));
        assert_eq!(tab.total(), 3);
    }

    #[test]
    fn test_group_summaries_count_observed_values() {
        let frame = df!(
            "income_group" => ["<15k", "<15k", "<15k", "15-30k", "50k+"],
            "price_midpoint" => [None, Some(100.0), Some(300.0), Some(250.0), None],
            "preferred_price_range" => ["-", "100", "100-500", "250", "900"]
        )
        .unwrap();
        let table = SurveyTable::from_frame(frame);
        let summary = group_summaries(&table, "income_group", "price_midpoint", Some("preferred_price_range")).unwrap();

        let order: Vec<&str> = summary.groups.iter().map(|g| g.group.as_str()).collect();
        assert_eq!(order, vec!["<15k", "15-30k"]);

        let low = summary.get("<15k").unwrap();
        assert_eq!(low.count, 2);
        assert_eq!(low.mean, 200.0);
        assert_eq!(low.median, 200.0);
        // The placeholder row has no price, so it is not considered.
        assert_eq!(low.mode.as_deref(), Some("100"));
        assert!(summary.get("50k+").is_none());
    }

    #[test]
    fn test_ranked_means() {
        let columns = vec!["factor_style".to_string(), "factor_price".to_string()];
        let ranked = ranked_means(&table(), &columns).unwrap();
        assert_eq!(ranked[0].column, "factor_price");
        assert_eq!(ranked[0].label, "Price");
        assert_eq!(ranked[0].mean, Some(11.0 / 3.0));
    }

    #[test]
    fn test_empty_table_gives_empty_results() {
        let empty = table().filter_rows(&[false, false, false, false]).unwrap();
        assert!(value_counts(&empty, "gender").unwrap().is_empty());
        assert!(cross_tab(&empty, "gender", "platform").unwrap().rows.is_empty());
        let columns = vec!["factor_price".to_string()];
        assert!(group_means(&empty, "gender", &columns).unwrap().groups.is_empty());
        assert_eq!(summarize(&empty, "factor_price").unwrap(), None);
    }

    #[test]
    fn test_missing_column() {
        let err = value_counts(&table(), "occupation").unwrap_err();
        assert!(matches!(err, crate::error::SurveyError::MissingColumn(_)));
    }
}
