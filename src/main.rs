//! SurveyForge: survey analytics CLI
//!
//! Loads and cleans the survey export, builds the requested pages and writes
//! them as JSON or Markdown, optionally with PNG charts.

use std::fs;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use surveyforge::{build_page, export, viz, Args, DatasetCache, Format, PageReport, SurveyError};
use tracing::Level;

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::WARN })
        .with_writer(std::io::stderr)
        .init();

    let keywords = args.keyword_config()?;
    let start_time = Instant::now();

    let cache = DatasetCache::new();
    let table = match cache.get_or_load(&args.input) {
        Ok(table) => table,
        Err(SurveyError::DataSourceNotFound { path }) => {
            eprintln!("No survey data found at {}.", path.display());
            eprintln!("Place the questionnaire export there or pass --input <file>.");
            return Ok(());
        }
        Err(e) => return Err(e).context("failed to load survey data"),
    };

    if args.verbose {
        eprintln!(
            "✓ Data loaded: {} respondents ({:.2}s)",
            table.len(),
            start_time.elapsed().as_secs_f64()
        );
    }

    let reports: Vec<PageReport> = args
        .pages()
        .into_iter()
        .map(|page| build_page(&table, page, &keywords))
        .collect();

    match &args.output {
        Some(dir) => {
            fs::create_dir_all(dir)
                .with_context(|| format!("cannot create output directory {}", dir.display()))?;
            for report in &reports {
                let path = dir.join(format!("{}.{}", report.page.slug(), args.format.extension()));
                fs::write(&path, render(report, args.format)?)
                    .with_context(|| format!("cannot write {}", path.display()))?;
                println!("Report saved to: {}", path.display());
            }
        }
        None => {
            let body = match args.format {
                Format::Json => export::to_json_all(&reports)?,
                Format::Markdown => export::to_markdown_all(&reports),
            };
            println!("{body}");
        }
    }

    if args.charts {
        let dir = args.chart_dir();
        let mut written = 0;
        for report in &reports {
            written += viz::render_charts(report, &dir)?.len();
        }
        println!("✓ {} charts saved to: {}", written, dir.display());
    }

    for report in &reports {
        for skipped in &report.skipped {
            eprintln!("! {}: section '{}' unavailable ({})", report.page.slug(), skipped.id, skipped.reason);
        }
    }

    if args.verbose {
        eprintln!("Total processing time: {:.2}s", start_time.elapsed().as_secs_f64());
    }

    Ok(())
}

fn render(report: &PageReport, format: Format) -> surveyforge::Result<String> {
    match format {
        Format::Json => export::to_json(report),
        Format::Markdown => Ok(export::to_markdown(report)),
    }
}
