//! Health check for the query assistant.

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use crate::api::types::ApiContext;

#[derive(Serialize)]
pub struct AiHealthResponse {
    pub success: bool,
    pub ai_service: &'static str,
    pub openai_configured: bool,
    /// Length only; the key value is never reported.
    pub api_key_length: String,
    pub timestamp: String,
}

/// `GET /api/ai/health` reports whether the LLM credential is configured.
pub async fn check(State(ctx): State<ApiContext>) -> Json<AiHealthResponse> {
    let api_key_length = if ctx.llm_key_length > 0 {
        format!("{} characters", ctx.llm_key_length)
    } else {
        "not configured".to_string()
    };

    Json(AiHealthResponse {
        success: true,
        ai_service: "operational",
        openai_configured: ctx.llm_configured,
        api_key_length,
        timestamp: Utc::now().to_rfc3339(),
    })
}
