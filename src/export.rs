//! Presentation adapters over [`PageReport`]
//!
//! `to_json` feeds an interactive front end; `to_markdown` is the static
//! report markup handed to a document renderer. Neither computes anything.

use crate::persona::PersonaProfile;
use crate::report::{MetricValue, PageReport, SectionContent};

/// Pretty JSON payload for one page.
pub fn to_json(report: &PageReport) -> crate::Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Pretty JSON payload for several pages.
pub fn to_json_all(reports: &[PageReport]) -> crate::Result<String> {
    Ok(serde_json::to_string_pretty(reports)?)
}

/// Format a figure the way the static report shows it.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

fn format_optional(value: Option<f64>) -> String {
    value.map(format_number).unwrap_or_else(|| "n/a".to_string())
}

fn format_share(count: usize, total: usize) -> String {
    if total == 0 {
        return "n/a".to_string();
    }
    format!("{:.1}%", count as f64 / total as f64 * 100.0)
}

fn table_header(out: &mut String, headers: &[String]) {
    out.push_str(&format!("| {} |\n", headers.join(" | ")));
    out.push_str(&format!("|{}\n", "---|".repeat(headers.len())));
}

fn table_row(out: &mut String, cells: &[String]) {
    out.push_str(&format!("| {} |\n", cells.join(" | ")));
}

/// Markdown for one page.
pub fn to_markdown(report: &PageReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("# {}\n\n", report.title));
    out.push_str(&format!("_{} respondents_\n\n", report.respondents));

    for section in &report.sections {
        out.push_str(&format!("## {}\n\n", section.title));
        render_content(&mut out, &section.content);
        out.push('\n');
    }

    for skipped in &report.skipped {
        out.push_str(&format!("> Section `{}` unavailable: {}\n\n", skipped.id, skipped.reason));
    }
    out
}

/// Markdown for several pages, separated by page breaks.
pub fn to_markdown_all(reports: &[PageReport]) -> String {
    reports
        .iter()
        .map(to_markdown)
        .collect::<Vec<_>>()
        .join("\n---\n\n")
}

fn render_content(out: &mut String, content: &SectionContent) {
    match content {
        SectionContent::Metrics(metrics) => {
            for metric in metrics {
                let value = match &metric.value {
                    MetricValue::Number(n) => format_number(*n),
                    MetricValue::Text(t) => t.clone(),
                };
                out.push_str(&format!("- **{}**: {}\n", metric.label, value));
            }
        }
        SectionContent::Counts(counts) => {
            table_header(out, &["Value".into(), "Count".into(), "Share".into()]);
            for entry in counts.entries() {
                table_row(
                    out,
                    &[
                        entry.value.clone(),
                        entry.count.to_string(),
                        format_share(entry.count, counts.total()),
                    ],
                );
            }
        }
        SectionContent::Means(means) => {
            table_header(out, &["Item".into(), "Mean (1-5)".into()]);
            for item in means {
                table_row(out, &[item.label.clone(), format_optional(item.mean)]);
            }
        }
        SectionContent::GroupMeans(means) => {
            let mut headers = vec![means.group_column.clone(), "Respondents".to_string()];
            headers.extend(means.columns.iter().map(|c| crate::columns::display_name(c)));
            table_header(out, &headers);
            for group in &means.groups {
                let mut cells = vec![group.group.clone(), group.size.to_string()];
                cells.extend(group.means.iter().map(|m| format_optional(*m)));
                table_row(out, &cells);
            }
        }
        SectionContent::GroupSummaries(summary) => {
            let mut headers = vec![
                summary.group_column.clone(),
                "Answers".to_string(),
                "Mean".to_string(),
                "Median".to_string(),
            ];
            if let Some(mode_column) = &summary.mode_column {
                headers.push(format!("Most common {}", crate::columns::display_name(mode_column)));
            }
            table_header(out, &headers);
            for group in &summary.groups {
                let mut cells = vec![
                    group.group.clone(),
                    group.count.to_string(),
                    format_number(group.mean),
                    format_number(group.median),
                ];
                if summary.mode_column.is_some() {
                    cells.push(group.mode.clone().unwrap_or_else(|| "n/a".to_string()));
                }
                table_row(out, &cells);
            }
        }
        SectionContent::CrossTab(tab) => {
            let mut headers = vec![format!("{} \\ {}", tab.row_dimension, tab.col_dimension)];
            headers.extend(tab.columns.iter().cloned());
            table_header(out, &headers);
            for (row, counts) in tab.rows.iter().zip(&tab.counts) {
                let mut cells = vec![row.clone()];
                cells.extend(counts.iter().map(|c| c.to_string()));
                table_row(out, &cells);
            }
        }
        SectionContent::Barriers(summary) => {
            out.push_str(&format!("- **Responses**: {}\n", summary.responses));
            out.push_str(&format!("- **Price related**: {}\n", summary.price));
            out.push_str(&format!("- **Quality related**: {}\n", summary.quality));
            out.push_str(&format!("- **Availability related**: {}\n", summary.availability));
        }
        SectionContent::PersonaScores(assignments) => {
            table_header(
                out,
                &[
                    "Row".into(),
                    "Persona".into(),
                    "Quality".into(),
                    "Price".into(),
                    "Brand".into(),
                    "Convenience".into(),
                ],
            );
            for a in assignments {
                table_row(
                    out,
                    &[
                        a.row.to_string(),
                        a.persona.to_string(),
                        format_optional(a.scores.quality_focus),
                        format_optional(a.scores.price_sensitive),
                        format_optional(a.scores.brand_conscious),
                        format_optional(a.scores.convenience_focus),
                    ],
                );
            }
        }
        SectionContent::Personas(profiles) => {
            for profile in profiles {
                render_profile(out, profile);
            }
        }
    }
}

fn render_profile(out: &mut String, profile: &PersonaProfile) {
    out.push_str(&format!(
        "### {} ({} respondents, {:.1}%)\n\n",
        profile.persona,
        profile.count,
        profile.share * 100.0
    ));

    if let Some(gender) = &profile.dominant_gender {
        out.push_str(&format!("- **Main gender**: {} ({})\n", gender.value, gender.count));
    }
    out.push_str(&format!("- **Average age**: {}\n", format_optional(profile.mean_age)));
    let optional = [
        ("Typical income", &profile.modal_income),
        ("Travel frequency", &profile.modal_luggage_frequency),
        ("Main platform", &profile.modal_platform),
    ];
    for (label, value) in optional {
        if let Some(value) = value {
            out.push_str(&format!("- **{label}**: {value}\n"));
        }
    }

    let ranked = [
        ("Top factors", &profile.top_factors),
        ("Price drivers", &profile.top_price),
        ("Preferred channels", &profile.top_channels),
        ("Effective promotions", &profile.top_promotions),
    ];
    for (label, items) in ranked {
        if items.is_empty() {
            continue;
        }
        let listed: Vec<String> = items
            .iter()
            .map(|i| format!("{} {}", i.label, format_optional(i.mean)))
            .collect();
        out.push_str(&format!("- **{label}**: {}\n", listed.join(", ")));
    }

    let strategy = &profile.strategy;
    out.push_str(&format!("- **Strategy**: {}\n", strategy.strategy));
    out.push_str(&format!("- **Messaging**: {}\n", strategy.messaging));
    out.push_str(&format!("- **Channels**: {}\n", strategy.channels));
    out.push_str(&format!("- **Promotion**: {}\n\n", strategy.promotion));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{GroupSummaries, GroupSummary, ValueCounts};
    use crate::report::{PageId, Section, SkippedSection};

    fn report() -> PageReport {
        PageReport {
            page: PageId::Demographics,
            title: "Demographics",
            respondents: 3,
            sections: vec![Section {
                id: "gender_distribution",
                title: "Respondents by gender",
                content: SectionContent::Counts(ValueCounts::from_values(["F", "F", "M"])),
            }],
            skipped: vec![SkippedSection {
                id: "occupations",
                reason: "required column 'occupation' is missing".into(),
            }],
        }
    }

    #[test]
    fn test_markdown_tables() {
        let md = to_markdown(&report());
        assert!(md.starts_with("# Demographics"));
        assert!(md.contains("| F | 2 | 66.7% |"));
        assert!(md.contains("| M | 1 | 33.3% |"));
        assert!(md.contains("Section `occupations` unavailable"));
    }

    #[test]
    fn test_json_payload() {
        let json = to_json(&report()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["page"], "demographics");
        let section = &value["sections"][0];
        assert_eq!(section["content"]["kind"], "counts");
        assert_eq!(section["content"]["data"]["entries"][0]["count"], 2);
        assert_eq!(section["content"]["data"]["total"], 3);
    }

    #[test]
    fn test_price_summary_table() {
        let report = PageReport {
            page: PageId::Pricing,
            title: "Pricing",
            respondents: 2,
            sections: vec![Section {
                id: "price_midpoint_by_income",
                title: "Preferred price by income group",
                content: SectionContent::GroupSummaries(GroupSummaries {
                    group_column: "income_group".into(),
                    value_column: "price_midpoint".into(),
                    mode_column: Some("preferred_price_range".into()),
                    groups: vec![GroupSummary {
                        group: "<15k".into(),
                        count: 1,
                        mean: 100.0,
                        median: 100.0,
                        mode: Some("100".into()),
                    }],
                }),
            }],
            skipped: Vec::new(),
        };
        let md = to_markdown(&report);
        assert!(md.contains("| income_group | Answers | Mean | Median | Most common Preferred Price Range |"));
        assert!(md.contains("| <15k | 1 | 100 | 100 | 100 |"));
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(42.0), "42");
        assert_eq!(format_number(3.14159), "3.14");
        assert_eq!(format_optional(None), "n/a");
    }
}
