use serde::Deserialize;
use std::env;
use tsorders_core::carrier::CarrierConfig;
use tsorders_shared::Masked;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    pub gls: CarrierConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub name: String,
    pub version: String,
    #[serde(default = "default_environment")]
    pub environment: String,
    #[serde(default)]
    pub debug: bool,
}

fn default_environment() -> String {
    "development".into()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".into()
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub host: String,
    #[serde(default = "default_db_port")]
    pub port: u16,
    pub name: String,
    pub user: String,
    pub password: Masked<String>,
    #[serde(default = "default_charset")]
    pub charset: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_seconds: u64,
}

fn default_db_port() -> u16 { 3306 }
fn default_charset() -> String { "utf8".into() }
fn default_max_connections() -> u32 { 5 }
fn default_acquire_timeout() -> u64 { 3 }

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: Masked<String>,
    #[serde(default = "default_algorithm")]
    pub jwt_algorithm: String,
    #[serde(default = "default_access_minutes")]
    pub access_token_expire_minutes: i64,
    #[serde(default = "default_refresh_days")]
    pub refresh_token_expire_days: i64,
    pub username: String,
    pub password: Masked<String>,
    #[serde(default)]
    pub secure_cookies: bool,
}

fn default_algorithm() -> String { "HS256".into() }
fn default_access_minutes() -> i64 { 480 }
fn default_refresh_days() -> i64 { 7 }

#[derive(Debug, Deserialize, Clone, Default)]
pub struct CorsConfig {
    #[serde(default)]
    pub origins: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Also append logs to this file. Unset or empty logs to stdout only.
    #[serde(default)]
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level(), file: None }
    }
}

fn default_log_level() -> String {
    "tsorders_api=info,tower_http=info".into()
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // optional per-environment overrides
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // never checked in
            .add_source(config::File::with_name("config/local").required(false))
            // Eg.. `TSORDERS__DATABASE__PASSWORD=secret` sets `database.password`
            .add_source(environment(None))
            .build()?;

        s.try_deserialize()
    }
}

/// `TSORDERS__*` variables; `cors.origins` is read as a comma-separated list.
fn environment(vars: Option<config::Map<String, String>>) -> config::Environment {
    config::Environment::with_prefix("TSORDERS")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("cors.origins")
        .source(vars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{File, FileFormat};

    const MINIMAL: &str = r#"
        [app]
        name = "TS Orders API"
        version = "2.0.0"

        [server]
        port = 8000

        [database]
        host = "127.0.0.1"
        name = "toolstock_amz"
        user = "orders"
        password = "db-secret"

        [auth]
        jwt_secret = "jwt-secret"
        username = "operator"
        password = "op-secret"

        [gls]
        uid_cliente = "uid-secret"
        save_ship_url = "https://wsclientes.asmred.com/b2b.asmx"

        [gls.sender]
        nombre = "Toolstock"
        direccion = "Poligono 1"
        poblacion = "Madrid"
        pais = "34"
        cp = "28001"
    "#;

    fn parse(toml: &str) -> Config {
        parse_with_env(toml, &[])
    }

    fn parse_with_env(toml: &str, vars: &[(&str, &str)]) -> Config {
        let vars = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();

        config::Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .add_source(environment(Some(vars)))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_defaults_fill_optional_sections() {
        let config = parse(MINIMAL);

        assert_eq!(config.database.port, 3306);
        assert_eq!(config.database.charset, "utf8");
        assert_eq!(config.auth.access_token_expire_minutes, 480);
        assert_eq!(config.auth.refresh_token_expire_days, 7);
        assert_eq!(config.auth.jwt_algorithm, "HS256");
        assert!(!config.auth.secure_cookies);
        assert!(config.cors.origins.is_empty());
        assert_eq!(config.gls.timeout_seconds, 30);
        assert_eq!(config.app.environment, "development");
        assert!(!config.app.debug);
        assert!(config.logging.file.is_none());
    }

    #[test]
    fn test_secrets_do_not_leak_into_debug_output() {
        let config = parse(MINIMAL);
        let debug = format!("{:?}", config);

        assert!(!debug.contains("db-secret"));
        assert!(!debug.contains("jwt-secret"));
        assert!(!debug.contains("op-secret"));
        assert!(!debug.contains("uid-secret"));
        assert_eq!(config.auth.password.expose(), "op-secret");
    }

    #[test]
    fn test_environment_overrides_origins_and_scalars() {
        let config = parse_with_env(
            MINIMAL,
            &[
                ("TSORDERS__CORS__ORIGINS", "http://localhost:5173,https://app.example.com"),
                ("TSORDERS__SERVER__PORT", "9000"),
                ("TSORDERS__AUTH__PASSWORD", "env-secret"),
                ("TSORDERS__LOGGING__FILE", "orders.log"),
                ("TSORDERS__APP__DEBUG", "true"),
            ],
        );

        assert_eq!(
            config.cors.origins,
            vec!["http://localhost:5173".to_string(), "https://app.example.com".to_string()]
        );
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.auth.password.expose(), "env-secret");
        assert_eq!(config.logging.file.as_deref(), Some("orders.log"));
        assert!(config.app.debug);
    }
}
