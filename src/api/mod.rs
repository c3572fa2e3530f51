use sqlx::PgPool;
use std::sync::Arc;

use crate::config::Config;

pub mod auth;
pub mod billing;
pub mod health;
pub mod routes;
pub mod scan;

// ============================================
// Application State
// ============================================

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }
}
