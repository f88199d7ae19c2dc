use std::sync::Arc;

use sqlx::SqlitePool;

use crate::{auth::jwt::JwtKeys, config::AppConfig, db};

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
    pub jwt: JwtKeys,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;
        let db = db::connect(&config.database_url).await?;
        db::migrate(&db).await?;
        Ok(Self::from_parts(db, config))
    }

    /// Keys are derived from the config here, once, and shared by every request.
    pub fn from_parts(db: SqlitePool, config: AppConfig) -> Self {
        let jwt = JwtKeys::from_config(&config.jwt);
        Self {
            db,
            config: Arc::new(config),
            jwt,
        }
    }
}
