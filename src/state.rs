use std::sync::Arc;

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::accounts::{PgUserStore, UserStore};
use crate::config::{AppConfig, DatabaseConfig};
use crate::documents::DocumentGenerator;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserStore>,
    pub documents: DocumentGenerator,
}

pub async fn connect(database: &DatabaseConfig) -> anyhow::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(database.max_connections)
        .connect(&database.url)
        .await
        .context("connect to database")
}

impl AppState {
    /// Connects to Postgres; returns the pool too so startup can run migrations on it.
    pub async fn init() -> anyhow::Result<(Self, PgPool)> {
        let config = Arc::new(AppConfig::from_env()?);
        let db = connect(&config.database).await?;
        let users = Arc::new(PgUserStore::new(db.clone())) as Arc<dyn UserStore>;
        Ok((Self::from_parts(config, users), db))
    }

    pub fn from_parts(config: Arc<AppConfig>, users: Arc<dyn UserStore>) -> Self {
        let documents = DocumentGenerator::new(config.organization_name.clone());
        Self {
            config,
            users,
            documents,
        }
    }

    #[cfg(test)]
    pub fn fake(users: Arc<dyn UserStore>) -> Self {
        Self::from_parts(Arc::new(AppConfig::for_tests()), users)
    }
}
