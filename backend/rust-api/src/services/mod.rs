use std::sync::Arc;

use crate::config::Config;
use crate::services::progress_store::ProgressStore;

pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn ProgressStore>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn ProgressStore>) -> Self {
        Self { config, store }
    }
}

pub mod progress_service;
pub mod progress_store;
