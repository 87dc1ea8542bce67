//! Natural-language query pipeline.
//!
//! question → SQL (LLM) → rows (read-only SQLite) → optional per-row document
//! enrichment (fetch → parse → entity extraction) → insight synthesis (LLM).

pub mod document;
pub mod executor;
pub mod insight;
pub mod medical;
pub mod orchestrator;
pub mod schema_context;
pub mod sqlgen;

pub use document::{DocumentParser, ParsedDocument};
pub use executor::{clean_sql, execute, ResultRow};
pub use insight::InsightSynthesizer;
pub use medical::{extract_medical_info, MedicalEntities, VitalSigns};
pub use orchestrator::{QueryOutcome, QueryPipeline};
pub use sqlgen::SqlGenerator;

use thiserror::Error;

/// Pipeline failures that terminate a request. Everything else in the
/// pipeline degrades in place: document parsing absorbs its own errors and
/// insight synthesis falls back to canned text.
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Failed to generate SQL query: {0}")]
    SqlGeneration(String),

    #[error("Failed to execute database query: {0}")]
    QueryExecution(String),

    #[error("Generated SQL rejected: {0}")]
    RejectedSql(String),
}
