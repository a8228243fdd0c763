use std::sync::Arc;

use sqlx::SqlitePool;

use crate::auth::JwtService;
use crate::core::{Config, Result, ServerError};
use crate::db::{DbService, SqliteCatalog};
use crate::services::ProductService;

/// Shared server state
///
/// Cheap to clone; every handler receives it through `State<ServerState>`.
#[derive(Clone, Debug)]
pub struct ServerState {
    pub config: Config,
    pub db: DbService,
    pub jwt_service: Arc<JwtService>,
    pub product_service: ProductService,
}

impl ServerState {
    /// Open the database and wire the services
    pub async fn initialize(config: &Config) -> Result<Self> {
        let db = DbService::new(&config.database_path)
            .await
            .map_err(|e| ServerError::Database(e.message))?;

        let catalog = Arc::new(SqliteCatalog::new(db.pool.clone()));
        let product_service = ProductService::new(
            catalog.clone(),
            catalog.clone(),
            catalog,
            config.guard_config(),
        );
        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));

        Ok(Self {
            config: config.clone(),
            db,
            jwt_service,
            product_service,
        })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.db.pool
    }

    pub fn jwt_service(&self) -> Arc<JwtService> {
        self.jwt_service.clone()
    }

    pub fn products(&self) -> &ProductService {
        &self.product_service
    }
}
