//! Integration tests for SurveyForge

use std::io::Write;
use std::sync::Arc;

use surveyforge::export::{to_json, to_markdown};
use surveyforge::report::SectionContent;
use surveyforge::{
    build_all, build_page, classify_respondents, load_survey, persona_profiles, DatasetCache, KeywordConfig,
    PageId, PersonaType, SurveyError,
};
use tempfile::NamedTempFile;

const HEADER: &str = "gender,age,monthly_income,occupation,preferred_price_range ,factor_durability,factor_warranty,factor_brand_trust,price_value_for_quality,price_within_budget,price_image_boost,promo_discount,channel_fast_shipping,channel_easy_to_find,purchase_channels,first_impression,reason_not_chosen";

/// Create a test CSV file with sample survey answers
fn create_test_csv() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{HEADER}").unwrap();

    // Quality seeker
    writeln!(file, "F,22,\"15,000-30,000\",Student,\"1,000-2,000\",5,5,3,5,3,3,3,3,3,Shopee; Lazada,สวยดี,ราคาแพง").unwrap();
    // Value hunter
    writeln!(file, "M,35,\"30,000-50,000\",Engineer,3000,4,4,3,4,5,3,5,3,3,shopee,แพง,-").unwrap();
    // Brand loyalist
    writeln!(file, "F,41,50000,Manager,\"3,000-4,000\",3,3,5,3,3,5,3,3,3,Store/LAZADA,-,หาซื้อยาก").unwrap();
    // Convenience lover, no price answer
    writeln!(file, "M,19,10000,Student,,3,3,3,3,3,3,3,5,4,,ปกติ,").unwrap();
    // Practical buyer, durability imputed
    writeln!(file, "F,28,\"20,000\",Designer,2000,,3,2,3,3,2,3,3,3,Lazada,,").unwrap();
    // Missing gender: dropped
    writeln!(file, ",30,20000,Designer,2000,5,5,5,5,5,5,5,5,5,Lazada,ดี,").unwrap();
    // Income without digits: dropped after imputation
    writeln!(file, "M,50,ไม่ระบุ,Retired,2000,5,3,3,3,3,3,3,3,3,Lazada,ดี,").unwrap();

    file
}

fn write_csv(lines: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{line}").unwrap();
    }
    file
}

fn counts(content: &SectionContent) -> &surveyforge::ValueCounts {
    match content {
        SectionContent::Counts(counts) => counts,
        other => panic!("expected counts, got {other:?}"),
    }
}

#[test]
fn test_end_to_end_load() {
    let test_file = create_test_csv();
    let table = load_survey(test_file.path()).unwrap();

    assert_eq!(table.len(), 5);
    assert_eq!(table.fingerprint().len(), 64);

    // The trailing-space header variant is renamed to the canonical name.
    assert!(table.has_column("preferred_price_range"));
    assert!(!table.has_column("preferred_price_range "));

    let midpoints = table.numeric_column("price_midpoint").unwrap();
    assert_eq!(midpoints, vec![Some(1500.0), Some(3000.0), Some(3500.0), None, Some(2000.0)]);

    let income = table.numeric_column("income_mid").unwrap();
    assert_eq!(income[0], Some(22500.0));
    assert_eq!(income[1], Some(40000.0));

    // Median of 5, 4, 3, 3, 5 includes the row dropped later for its income.
    let durability = table.numeric_column("factor_durability").unwrap();
    assert_eq!(durability[4], Some(4.0));
}

#[test]
fn test_demographics_page() {
    let test_file = create_test_csv();
    let table = load_survey(test_file.path()).unwrap();
    let report = build_page(&table, PageId::Demographics, &KeywordConfig::default());

    assert_eq!(report.respondents, 5);
    assert!(report.skipped.is_empty());

    let genders = counts(&report.section("gender_distribution").unwrap().content);
    assert_eq!(genders.get("F"), Some(3));
    assert_eq!(genders.get("M"), Some(2));

    let ages = counts(&report.section("age_groups").unwrap().content);
    let order: Vec<&str> = ages.entries().iter().map(|e| e.value.as_str()).collect();
    assert_eq!(order, vec!["<18", "18-24", "25-34", "35-44", "45+"]);
    assert_eq!(ages.get("<18"), Some(0));
    assert_eq!(ages.get("18-24"), Some(2));
    assert_eq!(ages.get("35-44"), Some(2));

    let incomes = counts(&report.section("income_groups").unwrap().content);
    assert_eq!(incomes.get("15-30k"), Some(2));
    assert_eq!(incomes.get("50k+"), Some(1));
    assert_eq!(incomes.total(), 5);
}

#[test]
fn test_persona_assignment() {
    let test_file = create_test_csv();
    let table = load_survey(test_file.path()).unwrap();

    let personas: Vec<PersonaType> = classify_respondents(&table)
        .unwrap()
        .into_iter()
        .map(|a| a.persona)
        .collect();
    assert_eq!(
        personas,
        vec![
            PersonaType::PremiumQualitySeeker,
            PersonaType::ValueHunter,
            PersonaType::BrandLoyalist,
            PersonaType::ConvenienceLover,
            PersonaType::PracticalBuyer,
        ]
    );

    let profiles = persona_profiles(&table).unwrap();
    assert_eq!(profiles.len(), 5);
    assert_eq!(profiles.iter().map(|p| p.count).sum::<usize>(), 5);
    let premium = profiles
        .iter()
        .find(|p| p.persona == PersonaType::PremiumQualitySeeker)
        .unwrap();
    assert_eq!(premium.mean_age, Some(22.0));
    assert!((premium.share - 0.2).abs() < 1e-9);
}

#[test]
fn test_channels_and_brand_image() {
    let test_file = create_test_csv();
    let table = load_survey(test_file.path()).unwrap();

    let channels = build_page(&table, PageId::Channels, &KeywordConfig::default());
    let selections = counts(&channels.section("purchase_channels").unwrap().content);
    assert_eq!(selections.get("lazada"), Some(3));
    assert_eq!(selections.get("shopee"), Some(2));
    assert_eq!(selections.get("store"), Some(1));

    let image = build_page(&table, PageId::BrandImage, &KeywordConfig::default());
    let sentiment = counts(&image.section("impression_sentiment").unwrap().content);
    assert_eq!(sentiment.total(), 3);
    assert_eq!(sentiment.get("positive"), Some(1));
    assert_eq!(sentiment.get("negative"), Some(1));
    assert_eq!(sentiment.get("neutral"), Some(1));

    match &image.section("barrier_categories").unwrap().content {
        SectionContent::Barriers(summary) => {
            assert_eq!(summary.responses, 2);
            assert_eq!(summary.price, 1);
            assert_eq!(summary.availability, 1);
        }
        other => panic!("expected barriers, got {other:?}"),
    }
}

#[test]
fn test_keyword_override() {
    let test_file = create_test_csv();
    let table = load_survey(test_file.path()).unwrap();
    let keywords = KeywordConfig::from_toml_str("[sentiment]\npositive = [\"ปกติ\"]\nnegative = []").unwrap();

    let image = build_page(&table, PageId::BrandImage, &keywords);
    let sentiment = counts(&image.section("impression_sentiment").unwrap().content);
    assert_eq!(sentiment.get("positive"), Some(1));
    assert_eq!(sentiment.get("neutral"), Some(2));
}

#[test]
fn test_reload_is_deterministic() {
    let test_file = create_test_csv();
    let first = load_survey(test_file.path()).unwrap();
    let second = load_survey(test_file.path()).unwrap();

    assert_eq!(first.fingerprint(), second.fingerprint());
    assert!(first.frame().equals_missing(second.frame()));

    let keywords = KeywordConfig::default();
    for (a, b) in build_all(&first, &keywords).iter().zip(build_all(&second, &keywords).iter()) {
        assert_eq!(to_json(a).unwrap(), to_json(b).unwrap());
    }
}

#[test]
fn test_json_and_markdown_agree() {
    let test_file = create_test_csv();
    let table = load_survey(test_file.path()).unwrap();
    let report = build_page(&table, PageId::Demographics, &KeywordConfig::default());

    let json: serde_json::Value = serde_json::from_str(&to_json(&report).unwrap()).unwrap();
    let markdown = to_markdown(&report);

    let entries = json["sections"][0]["content"]["data"]["entries"].as_array().unwrap();
    for entry in entries {
        let value = entry["value"].as_str().unwrap();
        let count = entry["count"].as_u64().unwrap();
        assert!(markdown.contains(&format!("| {value} | {count} |")));
    }
    assert!(markdown.contains("| F | 3 | 60.0% |"));
}

#[test]
fn test_cache_reuses_cleaned_table() {
    let test_file = create_test_csv();
    let cache = DatasetCache::new();

    let first = cache.get_or_load(test_file.path()).unwrap();
    let second = cache.get_or_load(test_file.path()).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(cache.len(), 1);

    assert!(cache.invalidate(first.fingerprint()));
    let third = cache.get_or_load(test_file.path()).unwrap();
    assert!(!Arc::ptr_eq(&first, &third));
    assert!(first.frame().equals_missing(third.frame()));
}

#[test]
fn test_missing_source() {
    let err = load_survey("/nonexistent/survey.csv").unwrap_err();
    assert!(matches!(err, SurveyError::DataSourceNotFound { .. }));
    assert!(err.is_recoverable());

    let cache = DatasetCache::new();
    assert!(cache.get_or_load("/nonexistent/survey.csv").is_err());
    assert!(cache.is_empty());
}

#[test]
fn test_malformed_rows_are_rejected() {
    let bad_age = write_csv(&["gender,age,monthly_income", "F,22,20000", "M,twenty,30000"]);
    let err = load_survey(bad_age.path()).unwrap_err();
    assert!(matches!(err, SurveyError::DataFormat(_)));

    let no_income = write_csv(&["gender,age", "F,22"]);
    let err = load_survey(no_income.path()).unwrap_err();
    assert!(matches!(err, SurveyError::DataFormat(_)));
}

#[test]
fn test_failing_section_does_not_hide_siblings() {
    // Only the required columns: persona scoring has nothing to work with.
    let minimal = write_csv(&["gender,age,monthly_income", "F,22,20000", "M,40,60000"]);
    let table = load_survey(minimal.path()).unwrap();

    let personas = build_page(&table, PageId::Personas, &KeywordConfig::default());
    assert!(personas.sections.is_empty());
    assert_eq!(personas.skipped.len(), 3);
    assert!(personas.skipped[0].reason.contains("missing"));

    let overview = build_page(&table, PageId::Overview, &KeywordConfig::default());
    assert!(overview.skipped.is_empty());
    assert!(overview.section("key_metrics").is_some());
    assert!(overview.section("gender_distribution").is_some());
    assert!(overview.section("top_factor").is_none());
}
