//! Shared state for the API router.

use std::path::PathBuf;
use std::sync::Arc;

use crate::llm::ChatClient;
use crate::storage::ObjectStore;

/// Shared context for all API routes. Collaborators are trait objects so
/// tests can wire in a mock LLM and an in-memory object store.
#[derive(Clone)]
pub struct ApiContext {
    /// Path to the reference database; each pipeline request opens its own
    /// read-only connection.
    pub db_path: Arc<PathBuf>,
    pub llm: Arc<dyn ChatClient>,
    pub store: Arc<dyn ObjectStore>,
    /// Credential status for the health endpoint. The key itself stays
    /// inside the client.
    pub llm_configured: bool,
    pub llm_key_length: usize,
}

impl ApiContext {
    pub fn new(
        db_path: PathBuf,
        llm: Arc<dyn ChatClient>,
        store: Arc<dyn ObjectStore>,
        llm_configured: bool,
        llm_key_length: usize,
    ) -> Self {
        Self {
            db_path: Arc::new(db_path),
            llm,
            store,
            llm_configured,
            llm_key_length,
        }
    }
}
