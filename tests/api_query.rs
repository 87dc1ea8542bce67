//! End-to-end tests for the query assistant API, with a mock LLM, an
//! in-memory object store, and a seeded SQLite file.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::util::ServiceExt;

use ems_portal::api::{api_router, ApiContext};
use ems_portal::db;
use ems_portal::llm::{ChatClient, MockChatClient, MockReply};
use ems_portal::storage::InMemoryObjectStore;

const PROTOCOL_SQL: &str =
    "SELECT id, name AS protocol_name, description_summary, file_url, file_name FROM protocols";

const CARDIAC_PDF_URL: &str = "https://ems-docs.s3.amazonaws.com/protocols/cardiac-arrest.pdf";

/// Generate a valid single-page PDF with embedded text.
fn make_test_pdf(text: &str) -> Vec<u8> {
    use lopdf::dictionary;
    use lopdf::{Document, Object, Stream};

    let mut doc = Document::with_version("1.4");
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let content = format!("BT /F1 12 Tf 100 700 Td ({text}) Tj ET");
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        "Contents" => content_id,
        "Resources" => dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        },
    });
    let pages_id = doc.add_object(dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
    });
    if let Ok(Object::Dictionary(dict)) = doc.get_object_mut(page_id) {
        dict.set("Parent", pages_id);
    }
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

/// Seed a reference database with one department and a cardiac arrest
/// protocol carrying a document reference.
fn seeded_db(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("portal.db");
    let conn = db::open_database(&path).unwrap();
    conn.execute(
        "INSERT INTO departments (name, description) VALUES ('Emergency Medicine', 'EM')",
        [],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO protocols (department_id, name, description_summary, file_url, file_name)
         VALUES (1, 'Adult Cardiac Arrest', 'ACLS arrest algorithm', ?1, 'cardiac-arrest.pdf')",
        [CARDIAC_PDF_URL],
    )
    .unwrap();
    path
}

fn app_with(dir: &TempDir, llm: Arc<dyn ChatClient>, store: InMemoryObjectStore) -> Router {
    let db_path = seeded_db(dir);
    let ctx = ApiContext::new(db_path, llm, Arc::new(store), false, 0);
    api_router(ctx)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn query_returns_success_outcome() {
    let dir = TempDir::new().unwrap();
    let llm = Arc::new(MockChatClient::sequence(vec![
        MockReply::Text(PROTOCOL_SQL.into()),
        MockReply::Text("Epinephrine 1 mg IV is standard in adult cardiac arrest.".into()),
    ]));
    let app = app_with(&dir, llm, InMemoryObjectStore::new());

    let response = app
        .oneshot(post_json(
            "/api/ai/query",
            json!({"query": "What is the epinephrine dose?"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["count"], 1);
    assert_eq!(body["sql"], PROTOCOL_SQL);
    assert_eq!(body["data"][0]["protocol_name"], "Adult Cardiac Arrest");
    assert!(body["insight"].as_str().unwrap().contains("Epinephrine"));
    // Basic pipeline does not report has_documents.
    assert!(body.get("has_documents").is_none());
}

#[tokio::test]
async fn query_with_docs_enriches_and_reports_documents() {
    let dir = TempDir::new().unwrap();
    let llm = Arc::new(MockChatClient::sequence(vec![
        MockReply::Text(PROTOCOL_SQL.into()),
        MockReply::Text("Per the attached protocol, give epinephrine 1 mg IV.".into()),
    ]));
    let mut store = InMemoryObjectStore::new();
    store.insert(
        CARDIAC_PDF_URL,
        make_test_pdf("Epinephrine 1 mg IV every 3-5 minutes"),
        "application/pdf",
    );
    let app = app_with(&dir, llm, store);

    let response = app
        .oneshot(post_json(
            "/api/ai/query-with-docs",
            json!({"query": "What is the epinephrine dose for adult cardiac arrest?"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["has_documents"], true);
    assert!(body["count"].as_u64().unwrap() >= 1);
    assert!(body["insight"]
        .as_str()
        .unwrap()
        .to_lowercase()
        .contains("epinephrine"));

    let content = &body["data"][0]["document_content"];
    assert_eq!(content["file_info"]["type"], "PDF");
    assert!(content["medical_info"]["medications"]
        .as_array()
        .unwrap()
        .iter()
        .any(|m| m == "epinephrine"));
}

#[tokio::test]
async fn query_with_docs_survives_unreachable_storage() {
    let dir = TempDir::new().unwrap();
    let llm = Arc::new(MockChatClient::sequence(vec![
        MockReply::Text(PROTOCOL_SQL.into()),
        MockReply::Text("Standard ACLS dosing applies.".into()),
    ]));
    // Store has no objects: every fetch degrades.
    let app = app_with(&dir, llm, InMemoryObjectStore::new());

    let response = app
        .oneshot(post_json(
            "/api/ai/query-with-docs",
            json!({"query": "cardiac arrest protocol?"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    let content = &body["data"][0]["document_content"];
    assert_eq!(content["file_info"]["success"], false);
    assert!(content["text"]
        .as_str()
        .unwrap()
        .starts_with("Error parsing document:"));
}

#[tokio::test]
async fn llm_unreachable_yields_failure_shape_and_500() {
    let dir = TempDir::new().unwrap();
    let llm = Arc::new(MockChatClient::failing("provider unreachable"));
    let app = app_with(&dir, llm, InMemoryObjectStore::new());

    let response = app
        .oneshot(post_json("/api/ai/query", json!({"query": "anything"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("Failed to generate SQL query"));
    assert!(!body["suggestion"].as_str().unwrap().is_empty());
    assert!(body.get("data").is_none());
}

#[tokio::test]
async fn missing_query_returns_400() {
    let dir = TempDir::new().unwrap();
    let app = app_with(
        &dir,
        Arc::new(MockChatClient::new("SELECT 1")),
        InMemoryObjectStore::new(),
    );

    let response = app
        .oneshot(post_json("/api/ai/query", json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn oversized_query_returns_400() {
    let dir = TempDir::new().unwrap();
    let app = app_with(
        &dir,
        Arc::new(MockChatClient::new("SELECT 1")),
        InMemoryObjectStore::new(),
    );

    let response = app
        .oneshot(post_json(
            "/api/ai/query",
            json!({"query": "x".repeat(501)}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn samples_lists_four_categories() {
    let dir = TempDir::new().unwrap();
    let app = app_with(
        &dir,
        Arc::new(MockChatClient::new("SELECT 1")),
        InMemoryObjectStore::new(),
    );

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/ai/samples")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    let categories = body["data"].as_array().unwrap();
    assert_eq!(categories.len(), 4);
    assert_eq!(categories[0]["category"], "Medication Dosing");
}

#[tokio::test]
async fn health_reports_unconfigured_credential_without_value() {
    let dir = TempDir::new().unwrap();
    let app = app_with(
        &dir,
        Arc::new(MockChatClient::new("SELECT 1")),
        InMemoryObjectStore::new(),
    );

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/ai/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["ai_service"], "operational");
    assert_eq!(body["openai_configured"], false);
    assert_eq!(body["api_key_length"], "not configured");
}
