use std::time::Duration;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use mongodb::bson::doc;
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, Database, IndexModel};

use crate::config::Config;
use crate::error::ProgressError;
use crate::metrics::track_db_operation;
use crate::models::UserProgress;
use crate::utils::retry::{retry_async, RetryConfig};

const COLLECTION: &str = "user_progress";

/// Short bound on every store round-trip so a slow backend cannot stall a
/// request handler.
const OP_TIMEOUT: Duration = Duration::from_secs(5);

/// Key-value access to a user's full progress record.
///
/// `load` treats a missing key as a fresh default record, never as an error.
/// `save` is a full-record overwrite and returns the record as stored.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    async fn load(&self, user_id: &str) -> Result<UserProgress, ProgressError>;
    async fn save(&self, record: &UserProgress) -> Result<UserProgress, ProgressError>;
    async fn ping(&self) -> Result<(), ProgressError>;
}

/// MongoDB-backed store: one document per user in the `user_progress`
/// collection, keyed by a unique `user_id` index.
pub struct MongoProgressStore {
    db: Database,
    collection: Collection<UserProgress>,
    retry: RetryConfig,
}

impl MongoProgressStore {
    pub async fn connect(config: &Config) -> anyhow::Result<Self> {
        let client = Client::with_uri_str(&config.mongo_uri)
            .await
            .context("Failed to create MongoDB client")?;
        let db = client.database(&config.mongo_database);

        tokio::time::timeout(OP_TIMEOUT, db.run_command(doc! { "ping": 1 }))
            .await
            .map_err(|_| anyhow!("MongoDB ping timeout after {:?}", OP_TIMEOUT))?
            .context("MongoDB ping failed")?;

        let collection = db.collection::<UserProgress>(COLLECTION);

        // The collection is used as a key-value table; enforce one document
        // per user up front (mirrors table creation on startup).
        let index = IndexModel::builder()
            .keys(doc! { "user_id": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        collection
            .create_index(index)
            .await
            .context("Failed to create user_id index")?;

        tracing::info!("Progress store ready (collection: {})", COLLECTION);

        Ok(Self {
            db,
            collection,
            retry: RetryConfig::default(),
        })
    }

    async fn find_by_user_id(&self, user_id: &str) -> anyhow::Result<Option<UserProgress>> {
        track_db_operation("find_one", COLLECTION, async {
            retry_async(self.retry.clone(), || async {
                tokio::time::timeout(
                    OP_TIMEOUT,
                    self.collection.find_one(doc! { "user_id": user_id }),
                )
                .await
                .map_err(|_| anyhow!("find_one timed out after {:?}", OP_TIMEOUT))?
                .context("find_one failed")
            })
            .await
        })
        .await
    }
}

#[async_trait]
impl ProgressStore for MongoProgressStore {
    async fn load(&self, user_id: &str) -> Result<UserProgress, ProgressError> {
        let found = self
            .find_by_user_id(user_id)
            .await
            .map_err(|e| ProgressError::StorageUnavailable(e.to_string()))?;

        // Absence is the normal first-contact case: synthesize a default
        // record without persisting it.
        Ok(found.unwrap_or_else(|| UserProgress::new(user_id)))
    }

    async fn save(&self, record: &UserProgress) -> Result<UserProgress, ProgressError> {
        track_db_operation("replace_one", COLLECTION, async {
            retry_async(self.retry.clone(), || async {
                tokio::time::timeout(
                    OP_TIMEOUT,
                    self.collection
                        .replace_one(doc! { "user_id": &record.user_id }, record)
                        .upsert(true),
                )
                .await
                .map_err(|_| anyhow!("replace_one timed out after {:?}", OP_TIMEOUT))?
                .context("replace_one failed")
            })
            .await
        })
        .await
        .map_err(|e| ProgressError::StorageUnavailable(e.to_string()))?;

        // Read back so the caller sees exactly what was persisted.
        let stored = self
            .find_by_user_id(&record.user_id)
            .await
            .map_err(|e| ProgressError::StorageUnavailable(e.to_string()))?;

        Ok(stored.unwrap_or_else(|| record.clone()))
    }

    async fn ping(&self) -> Result<(), ProgressError> {
        tokio::time::timeout(OP_TIMEOUT, self.db.run_command(doc! { "ping": 1 }))
            .await
            .map_err(|_| {
                ProgressError::StorageUnavailable(format!("ping timeout after {:?}", OP_TIMEOUT))
            })?
            .map_err(|e| ProgressError::StorageUnavailable(e.to_string()))?;
        Ok(())
    }
}
