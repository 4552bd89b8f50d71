//! Page content: named, display-agnostic sections built from the aggregation layer
//!
//! Every presentation adapter (JSON for an interactive front end, Markdown and
//! PNG for static export) consumes the same [`PageReport`], so the numbers they
//! show cannot drift apart.

use clap::ValueEnum;
use serde::Serialize;
use tracing::{debug, warn};

use crate::aggregate::{
    answered_counts, binned_counts, cross_tab, group_means, group_summaries, ranked_means, summarize, value_counts,
    ColumnMean, CrossTab, GroupMeans, GroupSummaries, ValueCounts,
};
use crate::columns::{self, LikertFamily};
use crate::data::{Bin, SurveyTable};
use crate::persona::{classify_respondents, persona_profiles, PersonaAssignment, PersonaProfile};
use crate::sentiment::{BarrierSummary, KeywordConfig};
use crate::text::{normalize, MultiSelectExpander};

/// Analysis pages, in navigation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum PageId {
    Overview,
    Demographics,
    Factors,
    Products,
    Pricing,
    Channels,
    Marketing,
    BrandAwareness,
    BrandImage,
    Personas,
}

impl PageId {
    pub const ALL: [PageId; 10] = [
        PageId::Overview,
        PageId::Demographics,
        PageId::Factors,
        PageId::Products,
        PageId::Pricing,
        PageId::Channels,
        PageId::Marketing,
        PageId::BrandAwareness,
        PageId::BrandImage,
        PageId::Personas,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            PageId::Overview => "overview",
            PageId::Demographics => "demographics",
            PageId::Factors => "factors",
            PageId::Products => "products",
            PageId::Pricing => "pricing",
            PageId::Channels => "channels",
            PageId::Marketing => "marketing",
            PageId::BrandAwareness => "brand-awareness",
            PageId::BrandImage => "brand-image",
            PageId::Personas => "personas",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            PageId::Overview => "Survey Overview",
            PageId::Demographics => "Demographics",
            PageId::Factors => "Purchase Decision Factors",
            PageId::Products => "Product Preferences",
            PageId::Pricing => "Price Sensitivity",
            PageId::Channels => "Sales Channels",
            PageId::Marketing => "Marketing Preferences",
            PageId::BrandAwareness => "Brand Awareness",
            PageId::BrandImage => "Brand Image & Barriers",
            PageId::Personas => "Customer Personas",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    Number(f64),
    Text(String),
}

/// A single headline figure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metric {
    pub key: &'static str,
    pub label: &'static str,
    pub value: MetricValue,
}

impl Metric {
    fn number(key: &'static str, label: &'static str, value: f64) -> Self {
        Self {
            key,
            label,
            value: MetricValue::Number(value),
        }
    }

    fn text(key: &'static str, label: &'static str, value: impl Into<String>) -> Self {
        Self {
            key,
            label,
            value: MetricValue::Text(value.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum SectionContent {
    Metrics(Vec<Metric>),
    Counts(ValueCounts),
    Means(Vec<ColumnMean>),
    GroupMeans(GroupMeans),
    GroupSummaries(GroupSummaries),
    CrossTab(CrossTab),
    Barriers(BarrierSummary),
    PersonaScores(Vec<PersonaAssignment>),
    Personas(Vec<PersonaProfile>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    pub id: &'static str,
    pub title: &'static str,
    pub content: SectionContent,
}

/// A section that could not be computed, and why.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedSection {
    pub id: &'static str,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageReport {
    pub page: PageId,
    pub title: &'static str,
    pub respondents: usize,
    pub sections: Vec<Section>,
    pub skipped: Vec<SkippedSection>,
}

impl PageReport {
    pub fn section(&self, id: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == id)
    }
}

type SectionResult = crate::Result<Option<SectionContent>>;

/// Collects sections; a failing section is recorded and its siblings carry on.
struct PageBuilder<'a> {
    table: &'a SurveyTable,
    report: PageReport,
}

impl<'a> PageBuilder<'a> {
    fn new(table: &'a SurveyTable, page: PageId) -> Self {
        Self {
            table,
            report: PageReport {
                page,
                title: page.title(),
                respondents: table.len(),
                sections: Vec::new(),
                skipped: Vec::new(),
            },
        }
    }

    fn section<F>(&mut self, id: &'static str, title: &'static str, build: F) -> &mut Self
    where
        F: FnOnce(&SurveyTable) -> SectionResult,
    {
        match build(self.table) {
            Ok(Some(content)) => self.report.sections.push(Section { id, title, content }),
            Ok(None) => debug!(section = id, "no data for section"),
            Err(e) => {
                warn!(section = id, error = %e, "section skipped");
                self.report.skipped.push(SkippedSection {
                    id,
                    reason: e.to_string(),
                });
            }
        }
        self
    }

    fn finish(self) -> PageReport {
        self.report
    }
}

/// Build one page of analysis from the cleaned table.
pub fn build_page(table: &SurveyTable, page: PageId, keywords: &KeywordConfig) -> PageReport {
    let mut builder = PageBuilder::new(table, page);
    match page {
        PageId::Overview => {
            builder
                .section("key_metrics", "Key metrics", overview_metrics)
                .section("gender_distribution", "Respondents by gender", |t| {
                    counts(value_counts(t, columns::GENDER)?)
                })
                .section("top_factor", "Most important factor", |t| {
                    ranked_family(t, LikertFamily::Factor, Some(1))
                })
                .section("popular_price_range", "Most popular price range", |t| {
                    optional_counts(t, columns::PREFERRED_PRICE_RANGE, 1)
                })
                .section("luggage_frequency", "Most common travel frequency", |t| {
                    optional_counts(t, columns::LUGGAGE_FREQUENCY, 1)
                });
        }
        PageId::Demographics => {
            builder
                .section("gender_distribution", "Respondents by gender", |t| {
                    counts(value_counts(t, columns::GENDER)?)
                })
                .section("age_groups", "Respondents by age group", |t| {
                    counts(binned_counts(t, Bin::Age)?)
                })
                .section("income_groups", "Respondents by income group", |t| {
                    counts(binned_counts(t, Bin::Income)?)
                })
                .section("occupations", "Occupations (top 10)", |t| {
                    optional_counts(t, columns::OCCUPATION, 10)
                });
        }
        PageId::Factors => {
            builder
                .section("factor_ranking", "Average importance of each factor", |t| {
                    ranked_family(t, LikertFamily::Factor, None)
                })
                .section("factors_by_gender", "Factor importance by gender", |t| {
                    family_by_group(t, LikertFamily::Factor, columns::GENDER)
                })
                .section("factors_by_income", "Factor importance by income group", |t| {
                    family_by_group(t, LikertFamily::Factor, columns::INCOME_GROUP)
                });
        }
        PageId::Products => {
            builder
                .section("preferred_styles", "Preferred styles and colours (top 10)", |t| {
                    exploded_counts(t, columns::PREFERRED_STYLES, 10)
                })
                .section("used_bag_types", "Bag types in use (top 8)", |t| {
                    exploded_counts(t, columns::USED_BAG_TYPES, 8)
                })
                .section("short_trip_sizes", "Luggage size for short trips", |t| {
                    optional_counts(t, columns::LUGGAGE_SIZE_SHORT_TRIP, usize::MAX)
                });
        }
        PageId::Pricing => {
            builder
                .section("price_ranges", "Preferred price ranges", |t| {
                    optional_counts(t, columns::PREFERRED_PRICE_RANGE, usize::MAX)
                })
                .section("price_factor_ranking", "Importance of price factors", |t| {
                    ranked_family(t, LikertFamily::Price, None)
                })
                .section("price_range_by_income", "Preferred price range by income group", |t| {
                    if !t.has_column(columns::PREFERRED_PRICE_RANGE) {
                        return Ok(None);
                    }
                    let tab = cross_tab(t, columns::INCOME_GROUP, columns::PREFERRED_PRICE_RANGE)?;
                    Ok((tab.total() > 0).then_some(SectionContent::CrossTab(tab)))
                })
                .section("price_midpoint_by_income", "Preferred price by income group", |t| {
                    if !t.has_column(columns::PRICE_MIDPOINT) {
                        return Ok(None);
                    }
                    let summary = group_summaries(
                        t,
                        columns::INCOME_GROUP,
                        columns::PRICE_MIDPOINT,
                        Some(columns::PREFERRED_PRICE_RANGE),
                    )?;
                    Ok((!summary.groups.is_empty()).then_some(SectionContent::GroupSummaries(summary)))
                });
        }
        PageId::Channels => {
            builder
                .section("platforms", "Most used platforms (top 10)", |t| {
                    optional_counts(t, columns::MOST_USED_PLATFORM, 10)
                })
                .section("purchase_channels", "Purchase channels (top 10)", |t| {
                    exploded_counts(t, columns::PURCHASE_CHANNELS, 10)
                })
                .section("platforms_by_age", "Platforms by age group", |t| {
                    if !t.has_column(columns::MOST_USED_PLATFORM) {
                        return Ok(None);
                    }
                    let tab = cross_tab(t, columns::AGE_GROUP, columns::MOST_USED_PLATFORM)?;
                    Ok(Some(SectionContent::CrossTab(tab)))
                });
        }
        PageId::Marketing => {
            builder
                .section("promotion_ranking", "Effectiveness of promotions", |t| {
                    ranked_family(t, LikertFamily::Promo, None)
                })
                .section("preferred_presenters", "Preferred presenters (top 10)", |t| {
                    optional_counts(t, columns::PREFERRED_PRESENTER, 10)
                });
        }
        PageId::BrandAwareness => {
            builder
                .section("brand_recognition", "Brand recognition", |t| {
                    optional_counts(t, columns::KNOW_BRAND, usize::MAX)
                })
                .section("first_contact_channels", "Where respondents first saw the brand (top 10)", |t| {
                    optional_counts(t, columns::BRAND_FIRST_CHANNEL, 10)
                });
        }
        PageId::BrandImage => {
            builder
                .section("brand_positioning", "Perceived brand positioning (top 8)", |t| {
                    optional_counts(t, columns::BRAND_POSITIONING, 8)
                })
                .section("impression_sentiment", "First impression sentiment", |t| {
                    if !t.has_column(columns::FIRST_IMPRESSION) {
                        return Ok(None);
                    }
                    let answers = t.text_column(columns::FIRST_IMPRESSION)?;
                    let dist = keywords
                        .sentiment
                        .distribution(answers.iter().map(|a| a.as_deref()));
                    counts(dist)
                })
                .section("considered_brand", "Considered buying the brand", |t| {
                    optional_counts(t, columns::CONSIDERED_BRAND, usize::MAX)
                })
                .section("purchase_barriers", "Reasons for not buying (top 10)", |t| {
                    optional_counts(t, columns::REASON_NOT_CHOSEN, 10)
                })
                .section("barrier_categories", "Barrier themes", |t| {
                    if !t.has_column(columns::REASON_NOT_CHOSEN) {
                        return Ok(None);
                    }
                    let answers = t.text_column(columns::REASON_NOT_CHOSEN)?;
                    let summary = keywords
                        .barriers
                        .summarize(answers.iter().map(|a| a.as_deref()));
                    Ok((summary.responses > 0).then_some(SectionContent::Barriers(summary)))
                });
        }
        PageId::Personas => {
            builder
                .section("persona_distribution", "Persona distribution", |t| {
                    let assignments = classify_respondents(t)?;
                    counts(ValueCounts::from_values(
                        assignments.iter().map(|a| a.persona.label()),
                    ))
                })
                .section("persona_scores", "Price sensitivity vs quality focus", |t| {
                    Ok(Some(SectionContent::PersonaScores(classify_respondents(t)?)))
                })
                .section("persona_profiles", "Persona profiles", |t| {
                    Ok(Some(SectionContent::Personas(persona_profiles(t)?)))
                });
        }
    }
    builder.finish()
}

/// Every page, in navigation order.
pub fn build_all(table: &SurveyTable, keywords: &KeywordConfig) -> Vec<PageReport> {
    PageId::ALL
        .into_iter()
        .map(|page| build_page(table, page, keywords))
        .collect()
}

fn counts(counts: ValueCounts) -> SectionResult {
    Ok((!counts.is_empty()).then_some(SectionContent::Counts(counts)))
}

/// Top `n` answered values of a column that may not exist.
fn optional_counts(table: &SurveyTable, column: &str, n: usize) -> SectionResult {
    if !table.has_column(column) {
        return Ok(None);
    }
    counts(answered_counts(table, column)?.top(n))
}

/// Top `n` selections of a multi-select column that may not exist.
fn exploded_counts(table: &SurveyTable, column: &str, n: usize) -> SectionResult {
    if !table.has_column(column) {
        return Ok(None);
    }
    let answers = table.text_column(column)?;
    let selections = MultiSelectExpander::default().expand(answers.iter().map(|a| a.as_deref()), Some(&normalize));
    counts(ValueCounts::from_values(selections.into_iter().map(|s| s.value)).top(n))
}

fn ranked_family(table: &SurveyTable, family: LikertFamily, limit: Option<usize>) -> SectionResult {
    let items = table.likert_columns(family);
    if items.is_empty() {
        return Ok(None);
    }
    let mut ranked = ranked_means(table, &items)?;
    if let Some(limit) = limit {
        ranked.truncate(limit);
    }
    Ok(Some(SectionContent::Means(ranked)))
}

fn family_by_group(table: &SurveyTable, family: LikertFamily, group: &str) -> SectionResult {
    let items = table.likert_columns(family);
    if items.is_empty() {
        return Ok(None);
    }
    Ok(Some(SectionContent::GroupMeans(group_means(table, group, &items)?)))
}

fn overview_metrics(table: &SurveyTable) -> SectionResult {
    let mut metrics = vec![
        Metric::number("respondents", "Respondents", table.len() as f64),
        Metric::number("questions", "Questions", table.column_names().len() as f64),
    ];
    if let Some(age) = summarize(table, columns::AGE)? {
        metrics.push(Metric::number("mean_age", "Average age", age.mean));
        metrics.push(Metric::number("min_age", "Youngest respondent", age.min));
        metrics.push(Metric::number("max_age", "Oldest respondent", age.max));
    }
    let genders = value_counts(table, columns::GENDER)?;
    if let Some(top) = genders.mode() {
        metrics.push(Metric::text("top_gender", "Largest gender group", top.value.clone()));
        if let Some(share) = genders.share(&top.value) {
            metrics.push(Metric::number("top_gender_share", "Largest gender group share", share));
        }
    }
    Ok(Some(SectionContent::Metrics(metrics)))
}
