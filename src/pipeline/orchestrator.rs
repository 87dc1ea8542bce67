use chrono::Utc;
use rusqlite::Connection;
use serde::Serialize;
use serde_json::{json, Value};

use crate::llm::ChatClient;
use crate::storage::ObjectStore;

use super::document::DocumentParser;
use super::executor::{execute, ResultRow};
use super::insight::InsightSynthesizer;
use super::medical::extract_medical_info;
use super::sqlgen::SqlGenerator;
use super::QueryError;

/// Row-level excerpt budget. Deliberately smaller than the synthesizer's
/// own excerpt budget: several rows' excerpts must jointly fit one prompt.
const ROW_EXCERPT_CHARS: usize = 1000;

/// Document enrichment is sequential per row; cap how many rows get it so
/// one broad query cannot fan out into unbounded fetch+parse work.
const MAX_ENRICHED_ROWS: usize = 5;

const REPHRASE_SUGGESTION: &str = "Try rephrasing your question. Ask about departments, \
    protocols, medications, or dosages. Examples: \"What is the epinephrine dose for cardiac \
    arrest?\" or \"Show me all pediatric protocols\"";

/// Per-request response object. Successes and failures share the envelope
/// fields clients key on (`success`, `query`, `timestamp`).
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum QueryOutcome {
    Success(QuerySuccess),
    Failure(QueryFailure),
}

#[derive(Debug, Serialize)]
pub struct QuerySuccess {
    pub success: bool,
    pub query: String,
    pub sql: String,
    pub data: Vec<ResultRow>,
    pub insight: String,
    pub count: usize,
    /// Present only on the document-augmented path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_documents: Option<bool>,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct QueryFailure {
    pub success: bool,
    pub query: String,
    pub error: String,
    pub suggestion: String,
    pub timestamp: String,
}

impl QueryOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, QueryOutcome::Success(_))
    }

    fn failure(question: &str, error: &QueryError) -> Self {
        QueryOutcome::Failure(QueryFailure {
            success: false,
            query: question.to_string(),
            error: error.to_string(),
            suggestion: REPHRASE_SUGGESTION.to_string(),
            timestamp: Utc::now().to_rfc3339(),
        })
    }
}

/// Full query pipeline for one request.
///
/// Coordinates: generate SQL → execute → (optionally) enrich rows with
/// parsed documents → synthesize insight. Collaborators are injected so
/// tests can swap in mocks and an in-memory store.
pub struct QueryPipeline<'a> {
    llm: &'a dyn ChatClient,
    store: &'a dyn ObjectStore,
    conn: &'a Connection,
}

impl<'a> QueryPipeline<'a> {
    pub fn new(llm: &'a dyn ChatClient, store: &'a dyn ObjectStore, conn: &'a Connection) -> Self {
        Self { llm, store, conn }
    }

    /// Data-only pipeline. SQL generation/execution failures are terminal
    /// and produce the failure-shaped outcome; insight failures are not.
    pub fn run_basic(&self, question: &str) -> QueryOutcome {
        tracing::info!(question, "Processing query");

        let sql = match SqlGenerator::new(self.llm).generate(question) {
            Ok(sql) => sql,
            Err(e) => {
                tracing::error!(error = %e, "SQL generation failed");
                return QueryOutcome::failure(question, &e);
            }
        };

        let rows = match execute(self.conn, &sql) {
            Ok(rows) => rows,
            Err(e) => {
                tracing::error!(error = %e, "Query execution failed");
                return QueryOutcome::failure(question, &e);
            }
        };
        tracing::info!(count = rows.len(), "Query returned rows");

        let insight = InsightSynthesizer::new(self.llm).synthesize(&rows, question);

        QueryOutcome::Success(QuerySuccess {
            success: true,
            query: question.to_string(),
            sql,
            count: rows.len(),
            data: rows,
            insight,
            has_documents: None,
            timestamp: Utc::now().to_rfc3339(),
        })
    }

    /// Document-augmented pipeline. Document work is best-effort: if any
    /// step fails outright, fall back to the basic pipeline rather than
    /// failing a request the basic path could satisfy.
    pub fn run_with_documents(&self, question: &str) -> QueryOutcome {
        tracing::info!(question, "Processing query with document context");

        match self.attempt_with_documents(question) {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(error = %e, "Document-augmented pipeline failed, falling back to basic pipeline");
                self.run_basic(question)
            }
        }
    }

    fn attempt_with_documents(&self, question: &str) -> Result<QueryOutcome, QueryError> {
        let sql = SqlGenerator::new(self.llm).generate(question)?;
        let rows = execute(self.conn, &sql)?;

        let parser = DocumentParser::new(self.store);
        let mut enriched_rows = Vec::with_capacity(rows.len());
        let mut enriched_count = 0usize;

        // Sequential per row; row order is preserved.
        for mut row in rows {
            let reference = document_reference(&row);
            if let Some(reference) = reference {
                if enriched_count < MAX_ENRICHED_ROWS {
                    let parsed = parser.parse(&reference);
                    let medical_info = extract_medical_info(&parsed.text);

                    row.insert(
                        "document_content".to_string(),
                        json!({
                            "text": truncate_chars(&parsed.text, ROW_EXCERPT_CHARS),
                            "medical_info": medical_info,
                            "file_info": {
                                "type": parsed.document_type,
                                "filename": parsed.filename,
                                "pages": parsed.pages.unwrap_or(1),
                                "success": parsed.success,
                            },
                        }),
                    );
                    enriched_count += 1;
                }
            }
            enriched_rows.push(row);
        }

        let insight =
            InsightSynthesizer::new(self.llm).synthesize_enhanced(&enriched_rows, question);

        Ok(QueryOutcome::Success(QuerySuccess {
            success: true,
            query: question.to_string(),
            sql,
            count: enriched_rows.len(),
            has_documents: Some(enriched_count > 0),
            data: enriched_rows,
            insight,
            timestamp: Utc::now().to_rfc3339(),
        }))
    }
}

/// The well-known document-reference column, when present and non-empty.
fn document_reference(row: &ResultRow) -> Option<String> {
    match row.get("file_url") {
        Some(Value::String(url)) if !url.trim().is_empty() => Some(url.clone()),
        _ => None,
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
