use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use horizon_core::config::ConfigStore;
use horizon_core::curation::ReportCuration;
use serde::Serialize;
use tokio::sync::RwLock;
use utoipa::ToSchema;
use uuid::Uuid;

/// A tenant organization on the platform.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
}

/// Shared application state. Each collection sits behind its own `RwLock`;
/// mutations hold the write guard for the whole read-modify-write, which is
/// the single-writer discipline the curation and config models assume.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RwLock<ConfigStore>>,
    pub reports: Arc<RwLock<HashMap<Uuid, ReportCuration>>>,
    pub orgs: Arc<RwLock<Vec<Organization>>>,
    /// SHA-256 digest of the admin bearer token. `None` = open dev mode.
    pub admin_token_hash: Option<Arc<str>>,
}

impl AppState {
    pub fn new(config: ConfigStore, admin_token_hash: Option<String>) -> Self {
        Self {
            config: Arc::new(RwLock::new(config)),
            reports: Arc::new(RwLock::new(HashMap::new())),
            orgs: Arc::new(RwLock::new(Vec::new())),
            admin_token_hash: admin_token_hash.map(Arc::from),
        }
    }
}
