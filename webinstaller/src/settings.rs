// Installer settings
//
// Layered: built-in defaults, then an optional TOML file, then `WEBINSTALLER_*`
// environment variables. The bare `DB_TYPE` variable still provides the
// fallback database type, as the application itself reads it.

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::database::config::{env_db_type, DEFAULT_DB_TYPE};
use crate::error::Result;
use crate::models::requests::ConnectionFields;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Log folder; the per-user data dir when unset
    #[serde(default)]
    pub dir: Option<PathBuf>,
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub stdout: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            dir: None,
            level: default_log_level(),
            stdout: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstallerSettings {
    /// Fallback database type when the form names neither driver nor type
    #[serde(default = "env_db_type")]
    pub db_type: String,
    /// Backing config name that "default" resolves to (e.g. "test")
    #[serde(default)]
    pub default_alias: Option<String>,
    #[serde(default)]
    pub logging: LoggingSettings,
    #[serde(default)]
    pub database: Option<ConnectionFields>,
}

impl Default for InstallerSettings {
    fn default() -> Self {
        InstallerSettings {
            db_type: env_db_type(),
            default_alias: None,
            logging: LoggingSettings::default(),
            database: None,
        }
    }
}

impl InstallerSettings {
    /// Load settings from `path` (optional) and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("db_type", env_db_type())?
            .set_default("logging.level", default_log_level())?;

        if let Some(path) = path {
            builder = builder.add_source(
                File::from(path)
                    .format(FileFormat::Toml)
                    .required(true),
            );
        }

        let settings = builder
            .add_source(
                Environment::with_prefix("WEBINSTALLER")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<InstallerSettings>()?;

        Ok(settings)
    }

    /// Parse settings from a TOML string (no environment overlay).
    pub fn from_toml(contents: &str) -> Result<Self> {
        let settings = Config::builder()
            .set_default("db_type", DEFAULT_DB_TYPE)?
            .add_source(File::from_str(contents, FileFormat::Toml))
            .build()?
            .try_deserialize::<InstallerSettings>()?;
        Ok(settings)
    }

    /// Render the settings back to TOML, e.g. to persist a validated database section.
    pub fn to_toml(&self) -> std::result::Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    pub fn log_level(&self) -> log::LevelFilter {
        self.logging
            .level
            .parse()
            .unwrap_or(log::LevelFilter::Info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::config::DB_TYPE_ENV;
    use serial_test::serial;
    use std::io::Write;

    const SAMPLE: &str = r#"
db_type = "postgres"
default_alias = "test"

[logging]
level = "debug"
stdout = true

[database]
dbType = "postgres"
host = "db"
port = 5432
username = "u"
password = "p"
database = "app"
"#;

    #[test]
    fn from_toml_reads_all_sections() {
        let settings = InstallerSettings::from_toml(SAMPLE).unwrap();

        assert_eq!(settings.db_type, "postgres");
        assert_eq!(settings.default_alias.as_deref(), Some("test"));
        assert!(settings.logging.stdout);
        assert_eq!(settings.log_level(), log::LevelFilter::Debug);

        let db = settings.database.unwrap();
        assert_eq!(db.db_type.as_deref(), Some("postgres"));
        assert_eq!(db.port, 5432);
    }

    #[test]
    fn from_toml_defaults() {
        let settings = InstallerSettings::from_toml("").unwrap();
        assert_eq!(settings.db_type, DEFAULT_DB_TYPE);
        assert!(settings.database.is_none());
        assert_eq!(settings.log_level(), log::LevelFilter::Info);
    }

    #[test]
    #[serial]
    fn default_db_type_follows_environment() {
        std::env::set_var(DB_TYPE_ENV, "postgres");
        assert_eq!(InstallerSettings::default().db_type, "postgres");

        std::env::remove_var(DB_TYPE_ENV);
        assert_eq!(InstallerSettings::default().db_type, DEFAULT_DB_TYPE);
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let settings = InstallerSettings::load(Some(file.path())).unwrap();
        assert_eq!(settings.default_alias.as_deref(), Some("test"));
        assert_eq!(settings.database.unwrap().host, "db");
    }

    #[test]
    fn load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        assert!(InstallerSettings::load(Some(&missing)).is_err());
    }

    #[test]
    fn to_toml_round_trips_database_section() {
        let settings = InstallerSettings::from_toml(SAMPLE).unwrap();
        let rendered = settings.to_toml().unwrap();
        assert!(rendered.contains("[database]"), "{}", rendered);
        assert!(rendered.contains("dbType = \"postgres\""), "{}", rendered);

        let reparsed = InstallerSettings::from_toml(&rendered).unwrap();
        assert_eq!(reparsed, settings);
    }
}
