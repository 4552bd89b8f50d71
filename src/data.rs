//! Survey loading, cleaning and binning using Polars

use std::collections::HashMap;
use std::fs;
use std::io::{self, Cursor};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use polars::prelude::*;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::columns::{self, LikertFamily};
use crate::error::SurveyError;
use crate::extract::{extract_income, extract_price_range};

const AGE_BINS: [(f64, &str); 5] = [
    (0.0, "<18"),
    (18.0, "18-24"),
    (25.0, "25-34"),
    (35.0, "35-44"),
    (45.0, "45+"),
];

const INCOME_BINS: [(f64, &str); 4] = [
    (0.0, "<15k"),
    (15_000.0, "15-30k"),
    (30_000.0, "30-50k"),
    (50_000.0, "50k+"),
];

/// Ordered categorical groupings derived from continuous columns.
///
/// Bins are half-open `[lower, next_lower)` and the last one is unbounded,
/// so every non-negative value lands in exactly one bin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bin {
    Age,
    Income,
}

impl Bin {
    /// Name of the derived column holding this grouping.
    pub fn column(self) -> &'static str {
        match self {
            Bin::Age => columns::AGE_GROUP,
            Bin::Income => columns::INCOME_GROUP,
        }
    }

    fn edges(self) -> &'static [(f64, &'static str)] {
        match self {
            Bin::Age => &AGE_BINS,
            Bin::Income => &INCOME_BINS,
        }
    }

    /// Labels in bin order.
    pub fn labels(self) -> Vec<&'static str> {
        self.edges().iter().map(|(_, label)| *label).collect()
    }

    /// Label for `value`; `None` for negative or non-finite input.
    pub fn assign(self, value: f64) -> Option<&'static str> {
        if !value.is_finite() || value < 0.0 {
            return None;
        }
        self.edges()
            .iter()
            .rev()
            .find(|(lower, _)| value >= *lower)
            .map(|(_, label)| *label)
    }

    /// The binning behind a derived column name, if any.
    pub fn for_column(column: &str) -> Option<Bin> {
        [Bin::Age, Bin::Income]
            .into_iter()
            .find(|bin| bin.column() == column)
    }
}

/// Cleaned survey table. Immutable once built; slices are copies.
#[derive(Debug, Clone)]
pub struct SurveyTable {
    frame: DataFrame,
    fingerprint: String,
}

impl SurveyTable {
    /// Wrap an already-cleaned frame (used for in-memory data).
    pub fn from_frame(frame: DataFrame) -> Self {
        Self {
            frame,
            fingerprint: String::from("in-memory"),
        }
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    /// SHA-256 of the source bytes this table was cleaned from.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn len(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    pub fn column_names(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .into_iter()
            .map(str::to_owned)
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.frame.get_column_index(name).is_some()
    }

    /// Likert items of `family`, in table order.
    pub fn likert_columns(&self, family: LikertFamily) -> Vec<String> {
        self.frame
            .get_column_names()
            .into_iter()
            .filter(|name| family.contains(name))
            .map(str::to_owned)
            .collect()
    }

    /// Column values rendered as text.
    pub fn text_column(&self, name: &str) -> crate::Result<Vec<Option<String>>> {
        text_values(&self.frame, name)
    }

    /// Column values as floats; cells that are not numbers read as missing.
    pub fn numeric_column(&self, name: &str) -> crate::Result<Vec<Option<f64>>> {
        let series = require(&self.frame, name)?.cast(&DataType::Float64)?;
        let values = series.f64()?.into_iter().collect();
        Ok(values)
    }

    /// Copy of the rows where `keep` is true.
    pub fn filter_rows(&self, keep: &[bool]) -> crate::Result<SurveyTable> {
        let mask = BooleanChunked::from_slice("keep", keep);
        Ok(SurveyTable {
            frame: self.frame.filter(&mask)?,
            fingerprint: self.fingerprint.clone(),
        })
    }
}

/// Load and clean a survey CSV.
///
/// # Errors
/// * `DataSourceNotFound` when `path` does not exist
/// * `DataFormat` when a required column is absent or an age is not a number
pub fn load_survey(path: impl AsRef<Path>) -> crate::Result<SurveyTable> {
    let bytes = read_source(path.as_ref())?;
    let fingerprint = content_fingerprint(&bytes);
    load_from_bytes(bytes, fingerprint)
}

/// Load and clean survey CSV content held in memory.
pub fn load_survey_from_bytes(bytes: Vec<u8>) -> crate::Result<SurveyTable> {
    let fingerprint = content_fingerprint(&bytes);
    load_from_bytes(bytes, fingerprint)
}

fn load_from_bytes(bytes: Vec<u8>, fingerprint: String) -> crate::Result<SurveyTable> {
    // Every column is read as text; coercion happens in `clean`.
    let raw = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()?;
    debug!(rows = raw.height(), columns = raw.width(), "read raw survey");

    let frame = clean(raw)?;
    info!(
        respondents = frame.height(),
        fingerprint = &fingerprint[..12],
        "survey loaded"
    );
    Ok(SurveyTable { frame, fingerprint })
}

/// Apply the cleaning steps to a raw frame.
pub fn clean(mut df: DataFrame) -> crate::Result<DataFrame> {
    resolve_aliases(&mut df)?;
    for name in columns::REQUIRED {
        if df.get_column_index(name).is_none() {
            return Err(SurveyError::DataFormat(format!(
                "required column '{name}' not found"
            )));
        }
    }

    let mut df = df
        .lazy()
        .filter(
            col(columns::GENDER)
                .is_not_null()
                .and(col(columns::AGE).is_not_null())
                .and(col(columns::MONTHLY_INCOME).is_not_null()),
        )
        .collect()?;
    debug!(rows = df.height(), "dropped rows missing required fields");

    let ages = coerce_ages(&df)?;

    let income_mid: Vec<Option<f64>> = text_values(&df, columns::MONTHLY_INCOME)?
        .iter()
        .map(|v| v.as_deref().and_then(extract_income))
        .collect();

    if df.get_column_index(columns::PREFERRED_PRICE_RANGE).is_some() {
        let price_midpoint: Vec<Option<f64>> = text_values(&df, columns::PREFERRED_PRICE_RANGE)?
            .iter()
            .map(|v| v.as_deref().and_then(extract_price_range))
            .collect();
        df.with_column(Series::new(columns::PRICE_MIDPOINT, price_midpoint))?;
    }

    impute_likert(&mut df)?;

    let age_group: Vec<Option<&str>> = ages
        .iter()
        .map(|age| Bin::Age.assign(*age as f64))
        .collect();
    let income_group: Vec<Option<&str>> = income_mid
        .iter()
        .map(|mid| mid.and_then(|m| Bin::Income.assign(m)))
        .collect();

    df.with_column(Series::new(columns::AGE, ages))?;
    df.with_column(Series::new(columns::INCOME_MID, income_mid))?;
    df.with_column(Series::new(columns::AGE_GROUP, age_group))?;
    df.with_column(Series::new(columns::INCOME_GROUP, income_group))?;

    let df = df
        .lazy()
        .filter(col(columns::INCOME_GROUP).is_not_null())
        .collect()?;
    debug!(rows = df.height(), "dropped rows without an income group");

    Ok(df)
}

/// Rename header variants to their canonical name. The variant's values win
/// when both are present.
fn resolve_aliases(df: &mut DataFrame) -> crate::Result<()> {
    for (alias, canonical) in columns::ALIASES {
        if df.get_column_index(alias).is_none() {
            continue;
        }
        if df.get_column_index(canonical).is_some() {
            let _replaced = df.drop_in_place(canonical)?;
        }
        df.rename(alias, canonical)?;
        debug!(alias, canonical, "resolved column alias");
    }
    Ok(())
}

fn coerce_ages(df: &DataFrame) -> crate::Result<Vec<i64>> {
    text_values(df, columns::AGE)?
        .into_iter()
        .enumerate()
        .map(|(row, raw)| {
            let raw = raw.unwrap_or_default();
            parse_age(&raw).ok_or_else(|| {
                SurveyError::DataFormat(format!("age '{raw}' at row {row} is not a non-negative number"))
            })
        })
        .collect()
}

fn parse_age(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(age) = raw.parse::<i64>() {
        return (age >= 0).then_some(age);
    }
    // Decimal ages truncate toward zero: "23.5" is 23.
    let age = raw.parse::<f64>().ok()?;
    (age.is_finite() && age >= 0.0).then(|| age.trunc() as i64)
}

/// Fill missing Likert answers with the column's own median.
fn impute_likert(df: &mut DataFrame) -> crate::Result<()> {
    let likert: Vec<String> = df
        .get_column_names()
        .into_iter()
        .filter(|name| LikertFamily::of(name).is_some())
        .map(str::to_owned)
        .collect();

    for name in likert {
        let mut values: Vec<Option<f64>> = text_values(df, &name)?
            .iter()
            .map(|v| v.as_deref().and_then(|s| s.trim().parse::<f64>().ok()))
            .collect();

        if let Some(fill) = median(&values) {
            let mut filled = 0usize;
            for value in values.iter_mut().filter(|v| v.is_none()) {
                *value = Some(fill);
                filled += 1;
            }
            if filled > 0 {
                debug!(column = %name, filled, median = fill, "imputed Likert answers");
            }
        }
        df.with_column(Series::new(&name, values))?;
    }
    Ok(())
}

/// Median of the observed values; mean of the middle pair for even counts.
pub fn median(values: &[Option<f64>]) -> Option<f64> {
    let mut observed: Vec<f64> = values.iter().flatten().copied().collect();
    if observed.is_empty() {
        return None;
    }
    observed.sort_by(|a, b| a.total_cmp(b));
    let mid = observed.len() / 2;
    if observed.len() % 2 == 0 {
        Some((observed[mid - 1] + observed[mid]) / 2.0)
    } else {
        Some(observed[mid])
    }
}

fn require<'a>(df: &'a DataFrame, name: &str) -> crate::Result<&'a Series> {
    df.column(name)
        .map_err(|_| SurveyError::MissingColumn(name.to_string()))
}

fn text_values(df: &DataFrame, name: &str) -> crate::Result<Vec<Option<String>>> {
    let series = require(df, name)?.cast(&DataType::String)?;
    let values = series
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_owned))
        .collect();
    Ok(values)
}

fn read_source(path: &Path) -> crate::Result<Vec<u8>> {
    fs::read(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => SurveyError::DataSourceNotFound {
            path: path.to_path_buf(),
        },
        _ => SurveyError::Io(e),
    })
}

/// Hex SHA-256 of the raw source bytes.
pub fn content_fingerprint(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Memoized cleaned tables keyed by source content.
///
/// A table is cleaned at most once per distinct content; callers share the
/// same `Arc` until the entry is invalidated.
#[derive(Debug, Default)]
pub struct DatasetCache {
    entries: Mutex<HashMap<String, Arc<SurveyTable>>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cleaned table for the current content of `path`.
    pub fn get_or_load(&self, path: impl AsRef<Path>) -> crate::Result<Arc<SurveyTable>> {
        let bytes = read_source(path.as_ref())?;
        let fingerprint = content_fingerprint(&bytes);

        // Held across the load so concurrent callers never clean twice.
        let mut entries = self.lock();
        if let Some(table) = entries.get(&fingerprint) {
            info!(fingerprint = &fingerprint[..12], "serving cached survey");
            return Ok(Arc::clone(table));
        }

        let table = Arc::new(load_from_bytes(bytes, fingerprint.clone())?);
        entries.insert(fingerprint, Arc::clone(&table));
        Ok(table)
    }

    /// Drop one entry; returns whether it was cached.
    pub fn invalidate(&self, fingerprint: &str) -> bool {
        self.lock().remove(fingerprint).is_some()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<SurveyTable>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
