//! Application settings, read from an optional `settings` file (any format
//! the `config` crate knows, picked by extension) overlaid with `SYFT__*`
//! environment variables, e.g. `SYFT__TELEGRAM__TOKEN`.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

impl Default for Database {
    fn default() -> Self {
        Self::Sqlite("syft.db".to_string())
    }
}

#[derive(Debug, Deserialize)]
pub struct Ledger {
    pub horizon_days: i64,
}

impl Default for Ledger {
    fn default() -> Self {
        Self {
            horizon_days: engine::DEFAULT_HORIZON_DAYS,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Telegram {
    pub token: String,
    #[serde(default)]
    pub allowed_users: Vec<u64>,
    pub timezone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: App,
    #[serde(default)]
    pub database: Database,
    #[serde(default)]
    pub ledger: Ledger,
    pub telegram: Option<Telegram>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_builder(Config::builder().add_source(File::with_name("settings").required(false)))
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, ConfigError> {
        builder
            .add_source(Environment::with_prefix("SYFT").separator("__"))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use config::FileFormat;

    use super::*;

    fn from_toml(raw: &str) -> Settings {
        Settings::from_builder(Config::builder().add_source(File::from_str(raw, FileFormat::Toml)))
            .unwrap()
    }

    #[test]
    fn empty_file_uses_defaults() {
        let settings = from_toml("");

        assert_eq!(settings.app.level, "info");
        assert_eq!(settings.database, Database::Sqlite("syft.db".to_string()));
        assert_eq!(settings.ledger.horizon_days, 7);
        assert!(settings.telegram.is_none());
    }

    #[test]
    fn full_file_is_read() {
        let settings = from_toml(
            r#"
            database = "memory"

            [app]
            level = "debug"

            [ledger]
            horizon_days = 14

            [telegram]
            token = "123:abc"
            allowed_users = [1, 2]
            timezone = "Asia/Shanghai"
            "#,
        );

        assert_eq!(settings.app.level, "debug");
        assert_eq!(settings.database, Database::Memory);
        assert_eq!(settings.ledger.horizon_days, 14);

        let telegram = settings.telegram.unwrap();
        assert_eq!(telegram.token, "123:abc");
        assert_eq!(telegram.allowed_users, vec![1, 2]);
        assert_eq!(telegram.timezone.as_deref(), Some("Asia/Shanghai"));
    }

    #[test]
    fn sqlite_path_is_read() {
        let settings = from_toml(
            r#"
            [database]
            sqlite = "/var/lib/syft/ledger.db"
            "#,
        );

        assert_eq!(
            settings.database,
            Database::Sqlite("/var/lib/syft/ledger.db".to_string())
        );
    }
}
