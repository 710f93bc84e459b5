//! Shared application state.

use std::sync::Arc;

use tally_db::Database;

use crate::auth::{JwtManager, TokenService};
use crate::catalog::Catalog;
use crate::config::ApiConfig;
use crate::reports::{DelimitedRenderer, ReportRenderer};
use crate::storage::{LocalObjectStore, ObjectStore};

/// Everything a handler can reach. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub tokens: Arc<dyn TokenService>,
    pub store: Arc<dyn ObjectStore>,
    pub renderer: Arc<dyn ReportRenderer>,
    pub config: Arc<ApiConfig>,
}

impl AppState {
    /// Wires the default collaborators from configuration.
    pub fn new(db: Database, config: ApiConfig) -> Self {
        AppState {
            db,
            tokens: Arc::new(JwtManager::new(
                config.jwt_secret.clone(),
                config.jwt_lifetime_secs,
            )),
            store: Arc::new(LocalObjectStore::new(config.storage_dir.clone())),
            renderer: Arc::new(DelimitedRenderer::csv()),
            config: Arc::new(config),
        }
    }

    pub fn catalog(&self) -> Catalog {
        Catalog::new(self.db.products(), self.store.clone())
    }
}
