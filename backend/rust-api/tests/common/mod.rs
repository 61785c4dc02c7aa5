use async_trait::async_trait;
use axum::Router;
use fractionmania_api::error::ProgressError;
use fractionmania_api::models::UserProgress;
use fractionmania_api::services::progress_store::ProgressStore;
use fractionmania_api::{config::Config, create_router, services::AppState};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory store with the same load/save contract as the Mongo-backed
/// one. Lets the full router run in tests without external services, and
/// can simulate an unreachable backend via `fail`.
#[derive(Default)]
pub struct MemoryProgressStore {
    records: RwLock<HashMap<String, UserProgress>>,
    pub fail: AtomicBool,
}

impl MemoryProgressStore {
    fn check_available(&self) -> Result<(), ProgressError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ProgressError::StorageUnavailable(
                "simulated storage outage".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl ProgressStore for MemoryProgressStore {
    async fn load(&self, user_id: &str) -> Result<UserProgress, ProgressError> {
        self.check_available()?;
        let records = self.records.read().await;
        Ok(records
            .get(user_id)
            .cloned()
            .unwrap_or_else(|| UserProgress::new(user_id)))
    }

    async fn save(&self, record: &UserProgress) -> Result<UserProgress, ProgressError> {
        self.check_available()?;
        let mut records = self.records.write().await;
        records.insert(record.user_id.clone(), record.clone());
        Ok(records[&record.user_id].clone())
    }

    async fn ping(&self) -> Result<(), ProgressError> {
        self.check_available()
    }
}

pub fn test_config() -> Config {
    Config {
        project_name: "FractionMania".to_string(),
        api_v1_str: "/api/v1".to_string(),
        secret_key: "test-secret".to_string(),
        access_token_expire_minutes: 60,
        mongo_uri: "mongodb://localhost:27017".to_string(),
        mongo_database: "fractionmania_test".to_string(),
        google_api_key: None,
        backend_cors_origins: vec!["http://localhost:3000".to_string()],
    }
}

pub async fn create_test_app() -> (Router, Arc<MemoryProgressStore>) {
    // Initialize tracing for tests
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    let store = Arc::new(MemoryProgressStore::default());
    let app_state = Arc::new(AppState::new(test_config(), store.clone()));

    (create_router(app_state), store)
}
