use std::sync::LazyLock;

use regex::Regex;
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use serde_json::{Map, Value};

use super::QueryError;

/// One result row: column name → JSON value. Row order is whatever the SQL
/// produced; the pipeline never reorders.
pub type ResultRow = Map<String, Value>;

/// Statement keywords that have no business in a generated query. `\b`
/// boundaries keep column names like `created_at` from tripping the check.
static FORBIDDEN_KEYWORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(insert|update|delete|drop|alter|create|attach|detach|pragma|vacuum|reindex|grant|revoke)\b",
    )
    .unwrap()
});

/// Strip the Markdown code fences LLMs like to wrap SQL in.
pub fn clean_sql(raw: &str) -> String {
    raw.replace("```sql", "").replace("```", "").trim().to_string()
}

/// Reject anything that is not a single read-only statement.
///
/// Generated SQL is untrusted text. The connection is read-only anyway, but
/// this keeps obviously hostile output from ever reaching the store.
fn ensure_read_only(sql: &str) -> Result<(), QueryError> {
    let body = sql.trim().trim_end_matches(';').trim();

    if body.is_empty() {
        return Err(QueryError::RejectedSql("empty statement".to_string()));
    }
    if body.contains(';') {
        return Err(QueryError::RejectedSql(
            "expected a single SQL statement".to_string(),
        ));
    }

    let first = body
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    if first != "select" && first != "with" {
        return Err(QueryError::RejectedSql(format!(
            "only SELECT statements are allowed, got '{first}'"
        )));
    }

    if let Some(m) = FORBIDDEN_KEYWORDS.find(body) {
        return Err(QueryError::RejectedSql(format!(
            "forbidden keyword '{}'",
            m.as_str()
        )));
    }

    Ok(())
}

/// Clean and execute one generated statement, returning rows as JSON maps.
pub fn execute(conn: &Connection, sql: &str) -> Result<Vec<ResultRow>, QueryError> {
    let cleaned = clean_sql(sql);
    ensure_read_only(&cleaned)?;

    tracing::info!(sql = %cleaned, "Executing generated SQL");

    let mut stmt = conn
        .prepare(&cleaned)
        .map_err(|e| QueryError::QueryExecution(e.to_string()))?;

    let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();

    let mut rows = stmt
        .query([])
        .map_err(|e| QueryError::QueryExecution(e.to_string()))?;

    let mut out = Vec::new();
    while let Some(row) = rows
        .next()
        .map_err(|e| QueryError::QueryExecution(e.to_string()))?
    {
        let mut map = Map::new();
        for (i, name) in columns.iter().enumerate() {
            let value = match row
                .get_ref(i)
                .map_err(|e| QueryError::QueryExecution(e.to_string()))?
            {
                ValueRef::Null => Value::Null,
                ValueRef::Integer(n) => Value::from(n),
                ValueRef::Real(f) => serde_json::Number::from_f64(f)
                    .map(Value::Number)
                    .unwrap_or(Value::Null),
                ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
                ValueRef::Blob(b) => Value::String(format!("<blob: {} bytes>", b.len())),
            };
            map.insert(name.clone(), value);
        }
        out.push(map);
    }

    Ok(out)
}
