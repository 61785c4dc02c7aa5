use std::sync::Arc;

use crate::error::ProgressError;
use crate::metrics::{LEVELS_COMPLETED_TOTAL, PROGRESS_UPDATES_TOTAL};
use crate::models::{Level, UserProgress};
use crate::services::progress_store::ProgressStore;

/// Applies the level-progress rules on top of the store: load, update,
/// persist, return what was stored.
pub struct ProgressService {
    store: Arc<dyn ProgressStore>,
}

impl ProgressService {
    pub fn new(store: Arc<dyn ProgressStore>) -> Self {
        Self { store }
    }

    /// Full record for a user; unknown users get a fresh default.
    pub async fn get_progress(&self, user_id: &str) -> Result<UserProgress, ProgressError> {
        self.store.load(user_id).await
    }

    /// Records one attempt on `level_name` and persists the result.
    ///
    /// The whole update happens on the in-memory record: if the save fails
    /// nothing was written and the stored record is unchanged, so the caller
    /// retries the whole request.
    pub async fn update_level(
        &self,
        user_id: &str,
        level_name: &str,
        score: u32,
        completed: bool,
    ) -> Result<UserProgress, ProgressError> {
        let level: Level = level_name.parse()?;

        let mut record = self.store.load(user_id).await?;
        let first_completion = completed && !record.completed_levels.contains(&level);

        record.apply_update(level, score, completed);
        let stored = self.store.save(&record).await?;

        let outcome = if completed { "completed" } else { "attempted" };
        PROGRESS_UPDATES_TOTAL
            .with_label_values(&[level.as_str(), outcome])
            .inc();
        if first_completion {
            LEVELS_COMPLETED_TOTAL
                .with_label_values(&[level.as_str()])
                .inc();
            tracing::info!(
                "User {} completed level {}, current level is now {}",
                user_id,
                level,
                stored.current_level
            );
        }

        Ok(stored)
    }

    /// Projection of just the level the user is currently on.
    pub async fn current_level(&self, user_id: &str) -> Result<Level, ProgressError> {
        Ok(self.store.load(user_id).await?.current_level)
    }
}
