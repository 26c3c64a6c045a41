use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};
use sqlx::{Executor, MySqlPool};
use std::time::Duration;
use tracing::info;

use crate::app_config::DatabaseConfig;

#[derive(Clone)]
pub struct DbClient {
    pub pool: MySqlPool,
}

impl DbClient {
    /// Builds the pool without opening a connection, so the service can start
    /// while the database is unreachable.
    pub fn new(config: &DatabaseConfig) -> Self {
        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(config.password.expose())
            .database(&config.name)
            .charset(&config.charset);

        let pool = MySqlPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
            .after_connect(|conn, _meta| {
                Box::pin(async move {
                    conn.execute("SET SESSION sql_mode = 'TRADITIONAL'").await?;
                    Ok(())
                })
            })
            .connect_lazy_with(options);

        info!(host = %config.host, database = %config.name, "Database pool configured");
        Self { pool }
    }

}
