// Web installer database setup and role listing
// Library entry point

pub mod api;
pub mod database;
pub mod error;
pub mod models;
pub mod settings;
pub mod utils;

use anyhow::{Context, Result};
use log::{error, info};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::database::healthchecks::{Healthchecks, SchemaTables};
use crate::database::registry::{ConnectionRegistry, DEFAULT_CONNECTION};
use crate::models::requests::ConnectionFields;
use crate::models::responses::ApiResponse;
use crate::settings::InstallerSettings;

/// What the command line asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Apply the configured database and test the connection
    DbCheck,
    /// Same as `DbCheck`, then validate the schema
    SchemaCheck,
    /// List roles through the configured database
    Roles,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    pub mode: Mode,
    pub config: Option<PathBuf>,
    pub write_config: Option<PathBuf>,
}

impl CliArgs {
    /// Parse `--db-check | --schema-check | --roles [--config=PATH] [--write-config=PATH]`.
    pub fn parse(args: &[String]) -> Option<Self> {
        let mode = if args.iter().any(|a| a == "--schema-check") {
            Mode::SchemaCheck
        } else if args.iter().any(|a| a == "--db-check") {
            Mode::DbCheck
        } else if args.iter().any(|a| a == "--roles") {
            Mode::Roles
        } else {
            return None;
        };

        let value_of = |flag: &str| {
            args.iter()
                .find_map(|a| a.strip_prefix(flag))
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
        };

        Some(CliArgs {
            mode,
            config: value_of("--config="),
            write_config: value_of("--write-config="),
        })
    }
}

pub const USAGE: &str = "Usage: webinstaller (--db-check | --schema-check | --roles) [--config=PATH] [--write-config=PATH]";

/// Registry for the given settings, with "default" aliased when configured.
pub fn registry_for(settings: &InstallerSettings) -> ConnectionRegistry {
    let mut registry = ConnectionRegistry::with_sqlx();
    if let Some(alias) = settings.default_alias.as_deref() {
        registry.alias(DEFAULT_CONNECTION, alias);
    }
    registry
}

fn print_json<T: Serialize>(response: &ApiResponse<T>) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(response)?);
    Ok(())
}

fn write_settings(settings: &InstallerSettings, path: &Path) -> Result<()> {
    let rendered = settings.to_toml().context("Failed to render settings")?;
    std::fs::write(path, rendered)
        .with_context(|| format!("Failed to write settings to {:?}", path))?;
    info!(
        "[PHASE: setup] [STEP: write_config] Database settings written to {:?}",
        path
    );
    Ok(())
}

async fn run_mode(
    args: &CliArgs,
    settings: &InstallerSettings,
    fields: &ConnectionFields,
) -> Result<bool> {
    let mut registry = registry_for(settings);

    match args.mode {
        Mode::DbCheck | Mode::SchemaCheck => {
            let healthchecks = Healthchecks;
            let schema_tables: Option<&dyn SchemaTables> = match args.mode {
                Mode::SchemaCheck => Some(&healthchecks),
                _ => None,
            };

            let response =
                api::setup::check_database(&mut registry, fields, &settings.db_type, schema_tables)
                    .await;
            print_json(&response)?;

            let connected = response.is_success()
                && response.body.as_ref().map(|b| b.connected).unwrap_or(false);
            if connected {
                if let Some(path) = &args.write_config {
                    write_settings(settings, path)?;
                }
            }
            Ok(connected)
        }
        Mode::Roles => {
            registry
                .set_default_config(fields, &settings.db_type)
                .await
                .context("Invalid database settings")?;
            let response = api::roles::roles_index(&mut registry).await;
            print_json(&response)?;
            Ok(response.is_success())
        }
    }
}

/// Run the command line. Returns the process exit code.
pub fn run_cli(args: &[String]) -> i32 {
    let Some(cli) = CliArgs::parse(args) else {
        eprintln!("{}", USAGE);
        return 2;
    };

    let settings = match InstallerSettings::load(cli.config.as_deref()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to load settings: {}", e);
            return 2;
        }
    };

    match utils::path_resolver::resolve_log_folder(settings.logging.dir.as_deref()) {
        Ok(dir) => {
            if let Err(e) =
                utils::logging::init_logging(&dir, settings.log_level(), settings.logging.stdout)
            {
                eprintln!("Failed to initialize logging: {}", e);
            }
        }
        Err(e) => eprintln!("Failed to resolve log folder: {}", e),
    }

    info!(
        "[PHASE: initialization] webinstaller starting at {} (mode={:?})",
        chrono::Utc::now(),
        cli.mode
    );

    let Some(fields) = settings.database.clone() else {
        eprintln!("No [database] section in settings");
        return 2;
    };

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to start async runtime: {}", e);
            return 1;
        }
    };

    match runtime.block_on(run_mode(&cli, &settings, &fields)) {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(e) => {
            error!("[PHASE: cli] [STEP: fatal] {:#}", e);
            eprintln!("webinstaller error: {:#}", e);
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parse_modes_and_paths() {
        let cli = CliArgs::parse(&args(&[
            "webinstaller",
            "--db-check",
            "--config=/etc/webinstaller.toml",
            "--write-config=/tmp/app.toml",
        ]))
        .unwrap();

        assert_eq!(cli.mode, Mode::DbCheck);
        assert_eq!(cli.config, Some(PathBuf::from("/etc/webinstaller.toml")));
        assert_eq!(cli.write_config, Some(PathBuf::from("/tmp/app.toml")));
    }

    #[test]
    fn schema_check_wins_over_db_check() {
        let cli = CliArgs::parse(&args(&["x", "--db-check", "--schema-check"])).unwrap();
        assert_eq!(cli.mode, Mode::SchemaCheck);
    }

    #[test]
    fn no_mode_is_none() {
        assert!(CliArgs::parse(&args(&["x", "--config=a.toml"])).is_none());
    }

    #[test]
    fn empty_path_values_are_ignored() {
        let cli = CliArgs::parse(&args(&["x", "--roles", "--config="])).unwrap();
        assert_eq!(cli.mode, Mode::Roles);
        assert!(cli.config.is_none());
    }

    #[test]
    fn registry_for_applies_alias() {
        let settings = InstallerSettings {
            default_alias: Some("test".to_string()),
            ..InstallerSettings::default()
        };
        let registry = registry_for(&settings);
        assert_eq!(registry.config_name(DEFAULT_CONNECTION), "test");
    }

    #[test]
    fn write_settings_persists_database_section() {
        let settings = InstallerSettings::from_toml(
            "[database]\ndbType = \"mysql\"\nhost = \"h\"\nport = 3306\nusername = \"u\"\npassword = \"p\"\ndatabase = \"d\"\n",
        )
        .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.toml");

        write_settings(&settings, &path).unwrap();
        let reloaded = InstallerSettings::load(Some(&path)).unwrap();
        assert_eq!(reloaded.database, settings.database);
    }
}
