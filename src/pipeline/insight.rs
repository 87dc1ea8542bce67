//! Insight synthesis: the second LLM call, turning rows (and optional
//! document context) into a clinical answer.
//!
//! Synthesis never fails the request: enhanced mode falls back to basic
//! mode, and basic mode falls back to a fixed string.

use serde_json::Value;

use crate::llm::{ChatClient, GenerationParams};

use super::executor::ResultRow;

/// Warmer than SQL generation; this is prose.
const BASIC_PARAMS: GenerationParams = GenerationParams {
    temperature: 0.3,
    max_tokens: 500,
};

/// Enhanced mode carries document context, so it gets a larger budget.
const ENHANCED_PARAMS: GenerationParams = GenerationParams {
    temperature: 0.3,
    max_tokens: 700,
};

/// Per-document excerpt budget inside the enhanced prompt. Larger than the
/// row-level excerpt the orchestrator attaches, so the excerpt is never the
/// limiting factor here.
pub const INSIGHT_EXCERPT_CHARS: usize = 2000;

const INSIGHT_FALLBACK: &str = "Unable to generate medical insights at this time.";

pub struct InsightSynthesizer<'a> {
    llm: &'a dyn ChatClient,
}

impl<'a> InsightSynthesizer<'a> {
    pub fn new(llm: &'a dyn ChatClient) -> Self {
        Self { llm }
    }

    /// Basic mode: rows only. Always returns usable text.
    pub fn synthesize(&self, rows: &[ResultRow], question: &str) -> String {
        let prompt = build_basic_prompt(rows, question);
        match self.llm.complete(&prompt, &BASIC_PARAMS) {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                tracing::warn!(error = %e, "Insight generation failed, using fallback text");
                INSIGHT_FALLBACK.to_string()
            }
        }
    }

    /// Enhanced mode: rows plus the document context attached by the
    /// orchestrator. Falls back to basic synthesis over the same rows if
    /// the enhanced call fails.
    pub fn synthesize_enhanced(&self, rows: &[ResultRow], question: &str) -> String {
        let prompt = build_enhanced_prompt(rows, question);
        match self.llm.complete(&prompt, &ENHANCED_PARAMS) {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                tracing::warn!(error = %e, "Enhanced insight failed, falling back to basic mode");
                self.synthesize(rows, question)
            }
        }
    }
}

fn rows_as_json(rows: &[ResultRow]) -> String {
    serde_json::to_string_pretty(rows).unwrap_or_else(|_| "[]".to_string())
}

/// Rows with `document_content` stripped, for the "Database Results" block
/// of the enhanced prompt. The document side gets its own block.
fn rows_without_documents(rows: &[ResultRow]) -> Vec<ResultRow> {
    rows.iter()
        .map(|row| {
            let mut clean = row.clone();
            clean.remove("document_content");
            clean
        })
        .collect()
}

fn row_label(row: &ResultRow) -> &str {
    for key in ["protocol_name", "medication_name", "name"] {
        if let Some(Value::String(s)) = row.get(key) {
            return s;
        }
    }
    "Item"
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

fn build_basic_prompt(rows: &[ResultRow], question: &str) -> String {
    format!(
        r#"As an EMS medical expert, provide insights about this query result:

Original Question: "{question}"

Data Retrieved: {data}

Provide a helpful, medical-focused response that:
1. Directly answers the original question
2. Summarizes the key findings from the data
3. Adds relevant medical context, safety considerations, or clinical notes
4. Mentions any important protocols, contraindications, or guidelines
5. Keeps response professional but accessible
6. If no data found, suggest related alternatives

Format your response in clear paragraphs, not bullet points.

Medical Insight:"#,
        data = rows_as_json(rows),
    )
}

fn build_enhanced_prompt(rows: &[ResultRow], question: &str) -> String {
    let mut documents_block = String::new();
    for row in rows {
        let Some(Value::Object(content)) = row.get("document_content") else {
            continue;
        };
        let text = content
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let medical_info = content
            .get("medical_info")
            .map(|v| v.to_string())
            .unwrap_or_else(|| "{}".to_string());
        let file_type = content
            .get("file_info")
            .and_then(|info| info.get("type"))
            .and_then(Value::as_str)
            .unwrap_or("Unknown");

        documents_block.push_str(&format!(
            "Document for {item}:\n- File Type: {file_type}\n- Document Content Preview: \"{preview}\"\n- Medical Keywords Detected: {medical_info}\n\n",
            item = row_label(row),
            preview = truncate_chars(text, INSIGHT_EXCERPT_CHARS),
        ));
    }

    let documents_section = if documents_block.is_empty() {
        "No documents with medical content found.".to_string()
    } else {
        format!("Additional Document Context Found:\n{documents_block}")
    };

    format!(
        r#"As an EMS medical expert, provide comprehensive insights about this query result:

Original Question: "{question}"

Database Results: {data}

{documents_section}

Provide a comprehensive response that:
1. Answers the original question using the database information
2. If documents contain relevant medical information, incorporate it
3. If documents don't contain relevant medical info, focus on database results
4. Add medical context and clinical guidelines from your knowledge
5. Note when documents are attached but don't contain relevant medical information
6. Provide actionable insights for EMS professionals

Important: Even if attached documents don't contain relevant medical information,
still provide valuable medical insights based on the database results and your medical knowledge.

Enhanced Medical Insight:"#,
        data = rows_as_json(&rows_without_documents(rows)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{MockChatClient, MockReply};
    use serde_json::json;

    fn row(pairs: Value) -> ResultRow {
        pairs.as_object().unwrap().clone()
    }

    #[test]
    fn basic_prompt_embeds_question_and_rows() {
        let rows = vec![row(json!({"name": "Adult Cardiac Arrest", "id": 1}))];
        let prompt = build_basic_prompt(&rows, "What protocols exist?");
        assert!(prompt.contains("What protocols exist?"));
        assert!(prompt.contains("Adult Cardiac Arrest"));
        assert!(prompt.contains("suggest related alternatives"));
    }

    #[test]
    fn basic_failure_returns_fixed_fallback() {
        let llm = MockChatClient::failing("down");
        let synthesizer = InsightSynthesizer::new(&llm);
        let insight = synthesizer.synthesize(&[], "anything");
        assert_eq!(insight, INSIGHT_FALLBACK);
        assert!(!insight.is_empty());
    }

    #[test]
    fn enhanced_failure_falls_back_to_basic_mode() {
        let llm = MockChatClient::sequence(vec![
            MockReply::Fail("enhanced call down".into()),
            MockReply::Text("Basic insight about epinephrine.".into()),
        ]);
        let synthesizer = InsightSynthesizer::new(&llm);
        let insight = synthesizer.synthesize_enhanced(&[], "epinephrine dose?");
        assert_eq!(insight, "Basic insight about epinephrine.");
    }

    #[test]
    fn enhanced_prompt_strips_document_content_from_database_block() {
        let rows = vec![row(json!({
            "protocol_name": "ACLS",
            "file_url": "https://x.amazonaws.com/acls.pdf",
            "document_content": {
                "text": "Epinephrine 1 mg IV",
                "medical_info": {"dosages": ["1 mg"]},
                "file_info": {"type": "PDF", "filename": "acls.pdf", "pages": 1, "success": true}
            }
        }))];
        let prompt = build_enhanced_prompt(&rows, "ACLS meds?");

        assert!(prompt.contains("Document for ACLS:"));
        assert!(prompt.contains("File Type: PDF"));
        assert!(prompt.contains("Epinephrine 1 mg IV"));
        // document_content must not leak into the Database Results JSON
        let database_block = prompt.split("Additional Document Context").next().unwrap();
        assert!(!database_block.contains("document_content"));
    }

    #[test]
    fn enhanced_prompt_notes_missing_documents() {
        let rows = vec![row(json!({"name": "STEMI Protocol"}))];
        let prompt = build_enhanced_prompt(&rows, "STEMI?");
        assert!(prompt.contains("No documents with medical content found."));
    }

    #[test]
    fn enhanced_prompt_truncates_long_excerpts() {
        let long_text = "x".repeat(INSIGHT_EXCERPT_CHARS + 500);
        let rows = vec![row(json!({
            "name": "Long",
            "document_content": {
                "text": long_text,
                "medical_info": {},
                "file_info": {"type": "PDF"}
            }
        }))];
        let prompt = build_enhanced_prompt(&rows, "q");
        assert!(!prompt.contains(&long_text));
        assert!(prompt.contains(&"x".repeat(INSIGHT_EXCERPT_CHARS)));
    }

    #[test]
    fn row_label_prefers_protocol_then_medication_then_name() {
        assert_eq!(row_label(&row(json!({"protocol_name": "A", "name": "B"}))), "A");
        assert_eq!(row_label(&row(json!({"medication_name": "M"}))), "M");
        assert_eq!(row_label(&row(json!({"name": "N"}))), "N");
        assert_eq!(row_label(&row(json!({"id": 3}))), "Item");
    }
}
