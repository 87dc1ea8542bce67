//! Object storage read interface.
//!
//! The pipeline only ever downloads: given a document reference (a full
//! object-storage URL), fetch the bytes and the declared content type.
//! Uploads and deletes belong to the CRUD side of the portal, not here.

use std::collections::HashMap;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Invalid storage reference: {0}")]
    InvalidReference(String),

    #[error("Failed to download document: {0}")]
    FetchFailed(String),

    #[error("Document not found: {0}")]
    NotFound(String),
}

/// A fetched object: raw bytes plus the metadata the parser dispatches on.
#[derive(Debug, Clone)]
pub struct FetchedObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub filename: String,
}

/// Read access to document storage.
pub trait ObjectStore: Send + Sync {
    fn fetch(&self, reference: &str) -> Result<FetchedObject, FetchError>;
}

/// Extract the object key from a reference URL.
///
/// References look like `https://<bucket>.amazonaws.com/<key>`; the marker
/// (configurable, `.amazonaws.com/` by default) separates host from key.
/// A reference without the marker, or with nothing after it, is malformed.
pub fn extract_key<'a>(reference: &'a str, marker: &str) -> Result<&'a str, FetchError> {
    match reference.split_once(marker) {
        Some((_, key)) if !key.is_empty() => Ok(key),
        _ => Err(FetchError::InvalidReference(reference.to_string())),
    }
}

fn filename_from_key(key: &str) -> String {
    key.rsplit('/').next().unwrap_or(key).to_string()
}

/// HTTP-backed object store. Downloads the reference URL directly and
/// trusts the `Content-Type` header on the response.
pub struct HttpObjectStore {
    client: reqwest::blocking::Client,
    key_marker: String,
}

impl HttpObjectStore {
    pub fn new(key_marker: &str, timeout_secs: u64) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            key_marker: key_marker.to_string(),
        }
    }
}

impl ObjectStore for HttpObjectStore {
    fn fetch(&self, reference: &str) -> Result<FetchedObject, FetchError> {
        let key = extract_key(reference, &self.key_marker)?;
        let filename = filename_from_key(key);

        let response = self
            .client
            .get(reference)
            .send()
            .map_err(|e| FetchError::FetchFailed(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(key.to_string()));
        }
        if !status.is_success() {
            return Err(FetchError::FetchFailed(format!(
                "storage returned status {status}"
            )));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let bytes = response
            .bytes()
            .map_err(|e| FetchError::FetchFailed(e.to_string()))?
            .to_vec();

        Ok(FetchedObject {
            bytes,
            content_type,
            filename,
        })
    }
}

/// In-memory object store for testing, keyed by full reference URL.
#[derive(Default)]
pub struct InMemoryObjectStore {
    objects: HashMap<String, (Vec<u8>, String)>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, reference: &str, bytes: Vec<u8>, content_type: &str) {
        self.objects
            .insert(reference.to_string(), (bytes, content_type.to_string()));
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn fetch(&self, reference: &str) -> Result<FetchedObject, FetchError> {
        let key = extract_key(reference, ".amazonaws.com/")?;
        let (bytes, content_type) = self
            .objects
            .get(reference)
            .ok_or_else(|| FetchError::NotFound(key.to_string()))?;
        Ok(FetchedObject {
            bytes: bytes.clone(),
            content_type: content_type.clone(),
            filename: filename_from_key(key),
        })
    }
}
