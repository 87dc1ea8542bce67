use crate::llm::{ChatClient, GenerationParams};

use super::schema_context::SCHEMA_CONTEXT;
use super::QueryError;

/// Near-deterministic sampling, budget for one moderately complex statement.
const SQL_PARAMS: GenerationParams = GenerationParams {
    temperature: 0.1,
    max_tokens: 400,
};

/// Turns a natural-language question into one SQL statement via the LLM.
///
/// The output is the model's trimmed text, nothing more. Syntactic
/// validation and the read-only guard live in the executor.
pub struct SqlGenerator<'a> {
    llm: &'a dyn ChatClient,
}

impl<'a> SqlGenerator<'a> {
    pub fn new(llm: &'a dyn ChatClient) -> Self {
        Self { llm }
    }

    pub fn generate(&self, question: &str) -> Result<String, QueryError> {
        let prompt = build_sql_prompt(question);

        let sql = self
            .llm
            .complete(&prompt, &SQL_PARAMS)
            .map_err(|e| QueryError::SqlGeneration(e.to_string()))?;

        Ok(sql.trim().to_string())
    }
}

fn build_sql_prompt(question: &str) -> String {
    format!(
        r#"{SCHEMA_CONTEXT}

User Question: "{question}"

CRITICAL: When users ask about protocol information, medications, or doses:
1. ALWAYS SELECT the protocol's file_url to check for attached documents
2. For protocol-specific queries, query the protocols table directly
3. Only use medication_doses table if specifically asking about database dose records
4. The protocol documents (PDFs) contain the actual medication information

Generate a SQLite SQL query. Rules:
1. For protocol queries: SELECT id, name, description_summary, file_url, file_name FROM protocols
2. Include file_url to enable document parsing
3. Use LIKE with % wildcards for text searches
4. If asking about specific protocol ID, use WHERE id = X
5. Return only the SQL statement, no explanation

Examples:
- "What medications are in protocol ID 8?" -> SELECT from protocols WHERE id = 8 (to get file_url)
- "ACLS protocol medications" -> SELECT from protocols WHERE name LIKE '%ACLS%'

SQL Query:"#
    )
}
