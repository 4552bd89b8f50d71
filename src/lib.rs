//! SurveyForge: analytics over a consumer questionnaire export
//!
//! The pipeline loads the raw CSV, cleans it into a [`SurveyTable`], and builds
//! display-agnostic [`PageReport`]s (demographics, factor rankings, pricing,
//! channels, brand perception, personas) that the JSON, Markdown and chart
//! adapters render.

pub mod aggregate;
pub mod cli;
pub mod columns;
pub mod data;
pub mod error;
pub mod export;
pub mod extract;
pub mod persona;
pub mod report;
pub mod sentiment;
pub mod text;
pub mod viz;

// Re-export public items for easier access
pub use aggregate::{value_counts, ValueCounts};
pub use cli::{Args, Format};
pub use data::{load_survey, DatasetCache, SurveyTable};
pub use error::SurveyError;
pub use persona::{classify_respondents, persona_profiles, PersonaType};
pub use report::{build_all, build_page, PageId, PageReport};
pub use sentiment::KeywordConfig;
pub use text::MultiSelectExpander;

/// Common result type used throughout the library
pub type Result<T> = std::result::Result<T, SurveyError>;
