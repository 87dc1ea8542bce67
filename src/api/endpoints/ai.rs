//! Natural-language query endpoints.
//!
//! - `POST /api/ai/query`: data-only pipeline
//! - `POST /api/ai/query-with-docs`: document-augmented pipeline
//! - `GET /api/ai/samples`: canned example questions

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db;
use crate::pipeline::{QueryOutcome, QueryPipeline};

const MAX_QUERY_CHARS: usize = 500;

#[derive(Deserialize)]
pub struct AiQueryRequest {
    pub query: Option<String>,
}

fn validate_query(req: AiQueryRequest) -> Result<String, ApiError> {
    let query = req
        .query
        .ok_or_else(|| ApiError::BadRequest("Query is required and must be a string".into()))?;
    if query.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Query is required and must be a string".into(),
        ));
    }
    if query.chars().count() > MAX_QUERY_CHARS {
        return Err(ApiError::BadRequest(
            "Query too long. Please keep queries under 500 characters.".into(),
        ));
    }
    Ok(query)
}

enum PipelineMode {
    Basic,
    WithDocuments,
}

/// Run the blocking pipeline off the async runtime. Each request gets a
/// fresh read-only connection; the pipeline itself never writes.
async fn run_pipeline(
    ctx: ApiContext,
    question: String,
    mode: PipelineMode,
) -> Result<QueryOutcome, ApiError> {
    let outcome = tokio::task::spawn_blocking(move || -> Result<QueryOutcome, ApiError> {
        let conn = db::open_read_only(&ctx.db_path)?;
        let pipeline = QueryPipeline::new(&*ctx.llm, &*ctx.store, &conn);
        Ok(match mode {
            PipelineMode::Basic => pipeline.run_basic(&question),
            PipelineMode::WithDocuments => pipeline.run_with_documents(&question),
        })
    })
    .await
    .map_err(|e| ApiError::Internal(format!("pipeline task panicked: {e}")))??;

    Ok(outcome)
}

fn outcome_response(outcome: QueryOutcome) -> Response {
    // Failure outcomes keep their body shape but signal a server-side error.
    let status = if outcome.is_success() {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(outcome)).into_response()
}

/// `POST /api/ai/query`: process a natural-language query.
pub async fn query(
    State(ctx): State<ApiContext>,
    Json(req): Json<AiQueryRequest>,
) -> Result<Response, ApiError> {
    let question = validate_query(req)?;
    let outcome = run_pipeline(ctx, question, PipelineMode::Basic).await?;
    Ok(outcome_response(outcome))
}

/// `POST /api/ai/query-with-docs`: process a query with document parsing.
pub async fn query_with_docs(
    State(ctx): State<ApiContext>,
    Json(req): Json<AiQueryRequest>,
) -> Result<Response, ApiError> {
    let question = validate_query(req)?;
    let outcome = run_pipeline(ctx, question, PipelineMode::WithDocuments).await?;
    Ok(outcome_response(outcome))
}

/// `GET /api/ai/samples`: sample questions grouped by category.
pub async fn samples() -> Json<serde_json::Value> {
    Json(json!({
        "success": true,
        "data": [
            {
                "category": "Medication Dosing",
                "queries": [
                    "What is the epinephrine dose for adult cardiac arrest?",
                    "Show me all IV medications and their doses",
                    "What medications are used for anaphylaxis?",
                    "List all pediatric medication doses",
                ],
            },
            {
                "category": "Protocol Information",
                "queries": [
                    "What protocols use epinephrine?",
                    "Show me all emergency medicine protocols",
                    "What is the STEMI protocol?",
                    "List all cardiology protocols",
                ],
            },
            {
                "category": "Department Overview",
                "queries": [
                    "What departments do we have?",
                    "Show me all protocols in the pediatrics department",
                    "What medications are in the emergency medicine department?",
                    "Compare departments by number of protocols",
                ],
            },
            {
                "category": "Route Analysis",
                "queries": [
                    "What medications are given IV?",
                    "Show me all IM injections",
                    "Compare oral vs IV medications",
                    "What are the most common administration routes?",
                ],
            },
        ],
        "message": "Try asking these sample questions to explore the EMS database",
    }))
}
