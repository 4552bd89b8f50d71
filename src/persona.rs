//! Rule-based customer personas
//!
//! Each respondent gets four composite scores from fixed Likert columns and
//! exactly one persona from an ordered decision list. The first matching rule
//! wins, so a respondent qualifying for several personas takes the earliest.

use std::fmt;

use serde::Serialize;

use crate::aggregate::{mean, ranked_means, value_counts, ColumnMean, ValueCount, ValueCounts};
use crate::columns::{self, LikertFamily};
use crate::data::SurveyTable;

/// Composite scores for one respondent. `None` when every input was missing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PersonaScores {
    pub quality_focus: Option<f64>,
    pub price_sensitive: Option<f64>,
    pub brand_conscious: Option<f64>,
    pub convenience_focus: Option<f64>,
}

const QUALITY_FOCUS: [&str; 3] = [
    columns::FACTOR_DURABILITY,
    columns::FACTOR_WARRANTY,
    columns::PRICE_VALUE_FOR_QUALITY,
];
const PRICE_SENSITIVE: [&str; 2] = [columns::PRICE_WITHIN_BUDGET, columns::PROMO_DISCOUNT];
const BRAND_CONSCIOUS: [&str; 2] = [columns::FACTOR_BRAND_TRUST, columns::PRICE_IMAGE_BOOST];
const CONVENIENCE_FOCUS: [&str; 2] = [columns::CHANNEL_FAST_SHIPPING, columns::CHANNEL_EASY_TO_FIND];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PersonaType {
    #[serde(rename = "Premium Quality Seeker")]
    PremiumQualitySeeker,
    #[serde(rename = "Value Hunter")]
    ValueHunter,
    #[serde(rename = "Brand Loyalist")]
    BrandLoyalist,
    #[serde(rename = "Convenience Lover")]
    ConvenienceLover,
    #[serde(rename = "Practical Buyer")]
    PracticalBuyer,
}

/// Marketing approach recommended for a persona.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MarketingStrategy {
    pub strategy: &'static str,
    pub messaging: &'static str,
    pub channels: &'static str,
    pub promotion: &'static str,
}

impl PersonaType {
    pub const ALL: [PersonaType; 5] = [
        PersonaType::PremiumQualitySeeker,
        PersonaType::ValueHunter,
        PersonaType::BrandLoyalist,
        PersonaType::ConvenienceLover,
        PersonaType::PracticalBuyer,
    ];

    /// Assign a persona. Rules are checked in order; do not reorder.
    pub fn classify(scores: &PersonaScores) -> PersonaType {
        let at_least = |score: Option<f64>, threshold: f64| score.is_some_and(|s| s >= threshold);
        let at_most = |score: Option<f64>, threshold: f64| score.is_some_and(|s| s <= threshold);

        if at_least(scores.quality_focus, 4.5) && at_most(scores.price_sensitive, 3.5) {
            PersonaType::PremiumQualitySeeker
        } else if at_least(scores.price_sensitive, 4.5) && at_least(scores.quality_focus, 4.0) {
            PersonaType::ValueHunter
        } else if at_least(scores.brand_conscious, 4.0) {
            PersonaType::BrandLoyalist
        } else if at_least(scores.convenience_focus, 4.5) {
            PersonaType::ConvenienceLover
        } else {
            PersonaType::PracticalBuyer
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PersonaType::PremiumQualitySeeker => "Premium Quality Seeker",
            PersonaType::ValueHunter => "Value Hunter",
            PersonaType::BrandLoyalist => "Brand Loyalist",
            PersonaType::ConvenienceLover => "Convenience Lover",
            PersonaType::PracticalBuyer => "Practical Buyer",
        }
    }

    pub fn strategy(self) -> MarketingStrategy {
        match self {
            PersonaType::PremiumQualitySeeker => MarketingStrategy {
                strategy: "Lead with premium quality",
                messaging: "Durability, warranty, world-class build quality",
                channels: "Official stores, brand website",
                promotion: "Premium bundles, in-depth quality content",
            },
            PersonaType::ValueHunter => MarketingStrategy {
                strategy: "Lead with value for money",
                messaging: "Good quality at a fair price, competitor comparisons",
                channels: "E-commerce marketplaces, online discounts",
                promotion: "Flash sales, special discounts, bundle deals",
            },
            PersonaType::BrandLoyalist => MarketingStrategy {
                strategy: "Build brand image",
                messaging: "Brand heritage, identity, social status",
                channels: "Social media, influencers, events",
                promotion: "Member exclusives, limited editions",
            },
            PersonaType::ConvenienceLover => MarketingStrategy {
                strategy: "Lead with convenience",
                messaging: "Easy, fast, always in stock",
                channels: "App, fast delivery, one-click checkout",
                promotion: "Free shipping, same-day delivery",
            },
            PersonaType::PracticalBuyer => MarketingStrategy {
                strategy: "Lead with everyday practicality",
                messaging: "Practical, fits daily life, no complications",
                channels: "Real user reviews, tutorials, demos",
                promotion: "Trial periods, usage guarantees",
            },
        }
    }
}

impl fmt::Display for PersonaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Scores and persona of one respondent row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PersonaAssignment {
    pub row: usize,
    pub scores: PersonaScores,
    pub persona: PersonaType,
}

/// Composite scores for every respondent.
///
/// # Errors
/// `MissingColumn` if any of the nine input columns is absent.
pub fn score_respondents(table: &SurveyTable) -> crate::Result<Vec<PersonaScores>> {
    let quality = composite(table, &QUALITY_FOCUS)?;
    let price = composite(table, &PRICE_SENSITIVE)?;
    let brand = composite(table, &BRAND_CONSCIOUS)?;
    let convenience = composite(table, &CONVENIENCE_FOCUS)?;

    let scores = (0..table.len())
        .map(|row| PersonaScores {
            quality_focus: quality[row],
            price_sensitive: price[row],
            brand_conscious: brand[row],
            convenience_focus: convenience[row],
        })
        .collect();
    Ok(scores)
}

/// Row-wise mean of `inputs`, skipping missing cells.
fn composite(table: &SurveyTable, inputs: &[&str]) -> crate::Result<Vec<Option<f64>>> {
    let data = inputs
        .iter()
        .map(|column| table.numeric_column(column))
        .collect::<crate::Result<Vec<_>>>()?;

    Ok((0..table.len())
        .map(|row| mean(data.iter().filter_map(|values| values[row])))
        .collect())
}

/// Score and classify every respondent.
pub fn classify_respondents(table: &SurveyTable) -> crate::Result<Vec<PersonaAssignment>> {
    let assignments = score_respondents(table)?
        .into_iter()
        .enumerate()
        .map(|(row, scores)| PersonaAssignment {
            row,
            scores,
            persona: PersonaType::classify(&scores),
        })
        .collect();
    Ok(assignments)
}

/// Summary of the respondents assigned to one persona.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonaProfile {
    pub persona: PersonaType,
    pub count: usize,
    /// Fraction of all respondents.
    pub share: f64,
    pub dominant_gender: Option<ValueCount>,
    pub mean_age: Option<f64>,
    pub modal_income: Option<String>,
    pub modal_luggage_frequency: Option<String>,
    pub modal_platform: Option<String>,
    pub top_factors: Vec<ColumnMean>,
    pub top_price: Vec<ColumnMean>,
    pub top_channels: Vec<ColumnMean>,
    pub top_promotions: Vec<ColumnMean>,
    pub strategy: MarketingStrategy,
}

/// Profiles of every persona present, largest first.
pub fn persona_profiles(table: &SurveyTable) -> crate::Result<Vec<PersonaProfile>> {
    let assignments = classify_respondents(table)?;
    let distribution = ValueCounts::from_values(
        assignments.iter().map(|a| a.persona.label()),
    );

    let mut profiles = Vec::with_capacity(distribution.len());
    for entry in distribution.entries() {
        let Some(persona) = PersonaType::ALL
            .into_iter()
            .find(|p| p.label() == entry.value)
        else {
            continue;
        };
        let keep: Vec<bool> = assignments.iter().map(|a| a.persona == persona).collect();
        let members = table.filter_rows(&keep)?;
        profiles.push(profile(&members, persona, table.len())?);
    }
    Ok(profiles)
}

fn profile(members: &SurveyTable, persona: PersonaType, population: usize) -> crate::Result<PersonaProfile> {
    let modal = |column: &str| -> crate::Result<Option<String>> {
        if !members.has_column(column) {
            return Ok(None);
        }
        Ok(value_counts(members, column)?.mode().map(|m| m.value.clone()))
    };
    let top = |family: LikertFamily, n: usize| -> crate::Result<Vec<ColumnMean>> {
        let mut ranked = ranked_means(members, &members.likert_columns(family))?;
        ranked.truncate(n);
        Ok(ranked)
    };

    let count = members.len();
    Ok(PersonaProfile {
        persona,
        count,
        share: if population == 0 {
            0.0
        } else {
            count as f64 / population as f64
        },
        dominant_gender: value_counts(members, columns::GENDER)?.mode().cloned(),
        mean_age: mean(members.numeric_column(columns::AGE)?.into_iter().flatten()),
        modal_income: modal(columns::MONTHLY_INCOME)?,
        modal_luggage_frequency: modal(columns::LUGGAGE_FREQUENCY)?,
        modal_platform: modal(columns::MOST_USED_PLATFORM)?,
        top_factors: top(LikertFamily::Factor, 3)?,
        top_price: top(LikertFamily::Price, 2)?,
        top_channels: top(LikertFamily::Channel, 2)?,
        top_promotions: top(LikertFamily::Promo, 2)?,
        strategy: persona.strategy(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn scores(quality: f64, price: f64, brand: f64, convenience: f64) -> PersonaScores {
        PersonaScores {
            quality_focus: Some(quality),
            price_sensitive: Some(price),
            brand_conscious: Some(brand),
            convenience_focus: Some(convenience),
        }
    }

    /// One row per respondent: durability, warranty, value_for_quality,
    /// within_budget, discount, brand_trust, image_boost, fast_shipping, easy_to_find.
    fn table(rows: &[[f64; 9]], genders: &[&str]) -> SurveyTable {
        let column_values = |i: usize| rows.iter().map(|r| r[i]).collect::<Vec<f64>>();
        let frame = df!(
            "gender" => genders,
            "age" => (0..rows.len()).map(|i| 20 + i as i64).collect::<Vec<_>>(),
            "monthly_income" => vec!["15000"; rows.len()],
            "factor_durability" => column_values(0),
            "factor_warranty" => column_values(1),
            "price_value_for_quality" => column_values(2),
            "price_within_budget" => column_values(3),
            "promo_discount" => column_values(4),
            "factor_brand_trust" => column_values(5),
            "price_image_boost" => column_values(6),
            "channel_fast_shipping" => column_values(7),
            "channel_easy_to_find" => column_values(8)
        )
        .unwrap();
        SurveyTable::from_frame(frame)
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let s = PersonaScores {
            quality_focus: Some(4.6),
            price_sensitive: Some(3.0),
            brand_conscious: Some(4.2),
            convenience_focus: None,
        };
        assert_eq!(PersonaType::classify(&s), PersonaType::PremiumQualitySeeker);
    }

    #[test]
    fn test_each_rule() {
        assert_eq!(PersonaType::classify(&scores(4.0, 4.5, 5.0, 5.0)), PersonaType::ValueHunter);
        assert_eq!(PersonaType::classify(&scores(3.0, 4.5, 4.0, 5.0)), PersonaType::BrandLoyalist);
        assert_eq!(PersonaType::classify(&scores(3.0, 3.0, 3.9, 4.5)), PersonaType::ConvenienceLover);
        assert_eq!(PersonaType::classify(&scores(3.0, 3.0, 3.0, 3.0)), PersonaType::PracticalBuyer);
        // High quality but price sensitive falls through rule 1 to rule 2.
        assert_eq!(PersonaType::classify(&scores(4.5, 4.5, 1.0, 1.0)), PersonaType::ValueHunter);
    }

    #[test]
    fn test_classification_is_deterministic() {
        let s = scores(4.2, 4.7, 3.1, 4.9);
        let first = PersonaType::classify(&s);
        assert!((0..10).all(|_| PersonaType::classify(&s) == first));
    }

    #[test]
    fn test_undefined_scores_match_nothing() {
        let s = PersonaScores {
            quality_focus: Some(5.0),
            price_sensitive: None,
            brand_conscious: None,
            convenience_focus: None,
        };
        assert_eq!(PersonaType::classify(&s), PersonaType::PracticalBuyer);
    }

    #[test]
    fn test_score_respondents() {
        let t = table(&[[5.0, 4.0, 4.5, 2.0, 3.0, 4.0, 5.0, 1.0, 2.0]], &["F"]);
        let s = score_respondents(&t).unwrap();
        assert_eq!(s[0].quality_focus, Some(4.5));
        assert_eq!(s[0].price_sensitive, Some(2.5));
        assert_eq!(s[0].brand_conscious, Some(4.5));
        assert_eq!(s[0].convenience_focus, Some(1.5));
    }

    #[test]
    fn test_missing_input_column() {
        let frame = df!("gender" => ["F"], "factor_durability" => [5.0]).unwrap();
        let err = score_respondents(&SurveyTable::from_frame(frame)).unwrap_err();
        assert!(matches!(err, crate::error::SurveyError::MissingColumn(_)));
    }

    #[test]
    fn test_profiles() {
        let premium = [5.0, 5.0, 5.0, 2.0, 2.0, 3.0, 3.0, 3.0, 3.0];
        let practical = [3.0; 9];
        let t = table(&[premium, practical, premium], &["F", "M", "M"]);

        let profiles = persona_profiles(&t).unwrap();
        assert_eq!(profiles.len(), 2);

        let first = &profiles[0];
        assert_eq!(first.persona, PersonaType::PremiumQualitySeeker);
        assert_eq!(first.count, 2);
        assert!((first.share - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(first.mean_age, Some(21.0));
        assert_eq!(first.modal_income.as_deref(), Some("15000"));
        assert_eq!(first.modal_platform, None);
        assert_eq!(first.top_factors.len(), 3);
        assert_eq!(first.top_price.len(), 2);
        assert_eq!(first.top_price[0].column, "price_value_for_quality");
        assert_eq!(first.strategy, PersonaType::PremiumQualitySeeker.strategy());

        let counts: usize = profiles.iter().map(|p| p.count).sum();
        assert_eq!(counts, 3);
    }
}
