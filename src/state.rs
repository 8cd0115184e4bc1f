use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{
    cache::ListingCache,
    config::AppConfig,
    db::DbPool,
    mail::Mailer,
    models::ProductWithVersion,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: DatabaseConnection,
    pub config: Arc<AppConfig>,
    pub mailer: Arc<dyn Mailer>,
    pub product_cache: ListingCache<ProductWithVersion>,
}

impl AppState {
    pub fn new(orm: DatabaseConnection, config: AppConfig, mailer: Arc<dyn Mailer>) -> Self {
        let pool = orm.get_postgres_connection_pool().clone();
        let product_cache = if config.cache_enabled {
            ListingCache::new(config.product_cache_ttl)
        } else {
            ListingCache::disabled()
        };
        Self {
            pool,
            orm,
            config: Arc::new(config),
            mailer,
            product_cache,
        }
    }
}
