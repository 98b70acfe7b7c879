// Connection registry
//
// Single-owner store of connection configs and their live handles. Logical
// names ("default") can be aliased onto a different backing config so a test
// suite can point "default" at its own database.

use log::{debug, info};
use std::collections::HashMap;
use std::sync::Arc;

use crate::database::config::{build_config, ConnectionConfig};
use crate::database::connection::{Connection, DbConnector, SqlxConnector};
use crate::database::table::{Table, TableLocator};
use crate::error::{InstallerError, Result};
use crate::models::requests::ConnectionFields;
use crate::models::role::{RolesTable, ROLES_ALIAS};

pub const DEFAULT_CONNECTION: &str = "default";

pub struct ConnectionRegistry {
    connector: Arc<dyn DbConnector>,
    configs: HashMap<String, ConnectionConfig>,
    connections: HashMap<String, Arc<dyn Connection>>,
    aliases: HashMap<String, String>,
    tables: TableLocator,
}

impl ConnectionRegistry {
    pub fn new(connector: Arc<dyn DbConnector>) -> Self {
        let mut tables = TableLocator::new();
        tables.register(ROLES_ALIAS, RolesTable::SCHEMA);

        ConnectionRegistry {
            connector,
            configs: HashMap::new(),
            connections: HashMap::new(),
            aliases: HashMap::new(),
            tables,
        }
    }

    /// Registry backed by real sqlx connections.
    pub fn with_sqlx() -> Self {
        Self::new(Arc::new(SqlxConnector))
    }

    /// Route lookups of `alias` to the config registered as `source`.
    pub fn alias(&mut self, alias: &str, source: &str) {
        self.aliases.insert(alias.to_string(), source.to_string());
    }

    /// Backing config name for `name` after aliasing.
    pub fn config_name(&self, name: &str) -> String {
        self.aliases
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }

    pub fn config(&self, name: &str) -> Option<&ConnectionConfig> {
        self.configs.get(&self.config_name(name))
    }

    /// Register `config` under `name`. Names are write-once until dropped.
    pub fn set_config(&mut self, name: &str, config: ConnectionConfig) -> Result<()> {
        if self.configs.contains_key(name) {
            return Err(InstallerError::ConfigExists(name.to_string()));
        }
        debug!(
            "[PHASE: database] [STEP: set_config] Registered \"{}\" ({})",
            name,
            config.describe()
        );
        self.configs.insert(name.to_string(), config);
        Ok(())
    }

    /// Disconnect and forget the config registered under `name`.
    /// Returns whether anything was registered.
    pub async fn drop_config(&mut self, name: &str) -> bool {
        if let Some(conn) = self.connections.remove(name) {
            conn.disconnect().await;
        }
        self.configs.remove(name).is_some()
    }

    /// Handle for `name`, created from its config on first use.
    pub fn get(&mut self, name: &str) -> Result<Arc<dyn Connection>> {
        let backing = self.config_name(name);
        if let Some(conn) = self.connections.get(&backing) {
            return Ok(Arc::clone(conn));
        }

        let config = self
            .configs
            .get(&backing)
            .ok_or_else(|| InstallerError::MissingConnection(backing.clone()))?;
        let conn = self.connector.create(&backing, config)?;
        self.connections.insert(backing, Arc::clone(&conn));
        Ok(conn)
    }

    /// Replace whatever backs "default" with `config`.
    ///
    /// The old registration is dropped (and its handle disconnected) before the
    /// new one goes through the write-once [`set_config`](Self::set_config).
    /// Every cached table instance is discarded, since it may describe the
    /// previous database.
    pub async fn apply_as_default(&mut self, config: ConnectionConfig) -> Result<()> {
        let backing = self.config_name(DEFAULT_CONNECTION);
        self.drop_config(&backing).await;

        info!(
            "[PHASE: database] [STEP: apply_default] \"{}\" now backs \"{}\" ({})",
            backing,
            DEFAULT_CONNECTION,
            config.describe()
        );
        self.set_config(&backing, config)?;
        self.tables.clear();
        Ok(())
    }

    /// Build a config from form fields and apply it as the default connection.
    pub async fn set_default_config(
        &mut self,
        fields: &ConnectionFields,
        fallback_db_type: &str,
    ) -> Result<()> {
        let config = build_config(fields, fallback_db_type)?;
        self.apply_as_default(config).await
    }

    /// Table instance for `alias`, bound to the current default connection.
    pub fn table(&mut self, alias: &str) -> Result<Arc<Table>> {
        let backing = self.config_name(DEFAULT_CONNECTION);
        self.tables.fetch(alias, &backing)
    }

    pub fn table_locator(&self) -> &TableLocator {
        &self.tables
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::database::connection::ConnectError;
    use crate::database::driver::DriverId;
    use crate::database::table::Record;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    // -------------------------------------------------------------------------
    // Stub connector shared by the database tests
    // -------------------------------------------------------------------------

    #[derive(Default)]
    pub struct StubState {
        pub connect_error: Option<ConnectError>,
        pub tables: Vec<String>,
        pub records: Vec<Record>,
        pub created: AtomicU32,
        pub connects: AtomicU32,
        pub disconnects: Mutex<Vec<String>>,
    }

    pub struct StubConnector {
        pub state: Arc<StubState>,
    }

    impl StubConnector {
        pub fn new(state: StubState) -> (Arc<Self>, Arc<StubState>) {
            let state = Arc::new(state);
            (
                Arc::new(StubConnector {
                    state: Arc::clone(&state),
                }),
                state,
            )
        }
    }

    struct StubConnection {
        name: String,
        config: ConnectionConfig,
        state: Arc<StubState>,
    }

    impl DbConnector for StubConnector {
        fn create(&self, name: &str, config: &ConnectionConfig) -> Result<Arc<dyn Connection>> {
            if let DriverId::Other(d) = &config.driver {
                return Err(InstallerError::MissingDriver(d.clone()));
            }
            self.state.created.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(StubConnection {
                name: name.to_string(),
                config: config.clone(),
                state: Arc::clone(&self.state),
            }))
        }
    }

    #[async_trait]
    impl Connection for StubConnection {
        fn config_name(&self) -> &str {
            &self.name
        }

        fn config(&self) -> &ConnectionConfig {
            &self.config
        }

        async fn connect(&self) -> std::result::Result<(), ConnectError> {
            self.state.connects.fetch_add(1, Ordering::SeqCst);
            match &self.state.connect_error {
                Some(e) => Err(e.clone()),
                None => Ok(()),
            }
        }

        async fn list_tables(&self) -> Result<Vec<String>> {
            Ok(self.state.tables.clone())
        }

        async fn fetch_all(&self, _table: &Table) -> Result<Vec<Record>> {
            Ok(self.state.records.clone())
        }

        async fn disconnect(&self) {
            self.state
                .disconnects
                .lock()
                .unwrap()
                .push(self.name.clone());
        }
    }

    pub fn config_for(host: &str) -> ConnectionConfig {
        ConnectionConfig {
            driver: DriverId::Mysql,
            host: host.to_string(),
            port: 3306,
            username: "u".to_string(),
            password: "p".to_string(),
            database: "app".to_string(),
            encoding: "utf8".to_string(),
            timezone: "UTC".to_string(),
            persistent: false,
        }
    }

    // -------------------------------------------------------------------------
    // Registry tests
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn apply_as_default_registers_under_default() {
        let (connector, _state) = StubConnector::new(StubState::default());
        let mut registry = ConnectionRegistry::new(connector);

        registry.apply_as_default(config_for("db1")).await.unwrap();
        assert_eq!(registry.config(DEFAULT_CONNECTION).unwrap().host, "db1");

        let conn = registry.get(DEFAULT_CONNECTION).unwrap();
        assert_eq!(conn.config_name(), "default");
    }

    #[tokio::test]
    async fn apply_as_default_disconnects_previous_handle() {
        let (connector, state) = StubConnector::new(StubState::default());
        let mut registry = ConnectionRegistry::new(connector);

        registry.apply_as_default(config_for("db1")).await.unwrap();
        let first = registry.get(DEFAULT_CONNECTION).unwrap();
        assert_eq!(first.config().host, "db1");

        registry.apply_as_default(config_for("db2")).await.unwrap();
        assert_eq!(*state.disconnects.lock().unwrap(), vec!["default".to_string()]);

        let second = registry.get(DEFAULT_CONNECTION).unwrap();
        assert_eq!(second.config().host, "db2");
        assert_eq!(state.created.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn apply_as_default_respects_alias() {
        let (connector, state) = StubConnector::new(StubState::default());
        let mut registry = ConnectionRegistry::new(connector);
        registry.set_config("default", config_for("real")).unwrap();
        registry.set_config("test", config_for("test-db")).unwrap();
        registry.alias(DEFAULT_CONNECTION, "test");

        registry.get(DEFAULT_CONNECTION).unwrap();
        registry.apply_as_default(config_for("replacement")).await.unwrap();

        assert_eq!(*state.disconnects.lock().unwrap(), vec!["test".to_string()]);
        assert_eq!(registry.config("test").unwrap().host, "replacement");
        // The real default config is untouched; only lookups are aliased.
        assert_eq!(registry.configs.get("default").unwrap().host, "real");
        assert_eq!(registry.get(DEFAULT_CONNECTION).unwrap().config_name(), "test");
    }

    #[tokio::test]
    async fn apply_as_default_clears_table_cache() {
        let (connector, _state) = StubConnector::new(StubState::default());
        let mut registry = ConnectionRegistry::new(connector);
        registry.apply_as_default(config_for("db1")).await.unwrap();

        registry.table(ROLES_ALIAS).unwrap();
        assert_eq!(registry.table_locator().cached(), 1);

        registry.apply_as_default(config_for("db2")).await.unwrap();
        assert_eq!(registry.table_locator().cached(), 0);
    }

    #[tokio::test]
    async fn set_default_config_builds_then_applies() {
        let (connector, _state) = StubConnector::new(StubState::default());
        let mut registry = ConnectionRegistry::new(connector);
        let fields = ConnectionFields {
            driver: None,
            db_type: Some("postgres".to_string()),
            host: "db".to_string(),
            port: 5432,
            username: "u".to_string(),
            password: "p".to_string(),
            database: "app".to_string(),
        };

        registry.set_default_config(&fields, "mysql").await.unwrap();
        assert_eq!(
            registry.config(DEFAULT_CONNECTION).unwrap().driver,
            DriverId::Postgres
        );
    }

    #[tokio::test]
    async fn set_default_config_rejects_unknown_type_without_touching_registry() {
        let (connector, _state) = StubConnector::new(StubState::default());
        let mut registry = ConnectionRegistry::new(connector);
        registry.apply_as_default(config_for("kept")).await.unwrap();

        let fields = ConnectionFields {
            driver: None,
            db_type: Some("oracle".to_string()),
            host: "db".to_string(),
            port: 1521,
            username: "u".to_string(),
            password: "p".to_string(),
            database: "app".to_string(),
        };
        let err = registry.set_default_config(&fields, "mysql").await.unwrap_err();

        assert!(matches!(err, InstallerError::UnsupportedDriver(_)));
        assert_eq!(registry.config(DEFAULT_CONNECTION).unwrap().host, "kept");
    }

    #[test]
    fn get_without_config_is_missing_connection() {
        let (connector, _state) = StubConnector::new(StubState::default());
        let mut registry = ConnectionRegistry::new(connector);
        match registry.get(DEFAULT_CONNECTION) {
            Err(InstallerError::MissingConnection(name)) => assert_eq!(name, "default"),
            Err(other) => panic!("unexpected error: {:?}", other),
            Ok(_) => panic!("expected an error"),
        }
    }

    #[test]
    fn set_config_is_write_once() {
        let (connector, _state) = StubConnector::new(StubState::default());
        let mut registry = ConnectionRegistry::new(connector);
        registry.set_config("default", config_for("a")).unwrap();
        let err = registry.set_config("default", config_for("b")).unwrap_err();
        assert!(matches!(err, InstallerError::ConfigExists(_)));
    }

    #[tokio::test]
    async fn apply_as_default_replaces_write_once_registration() {
        let (connector, _state) = StubConnector::new(StubState::default());
        let mut registry = ConnectionRegistry::new(connector);
        registry.set_config("default", config_for("a")).unwrap();

        registry.apply_as_default(config_for("b")).await.unwrap();
        assert_eq!(registry.config(DEFAULT_CONNECTION).unwrap().host, "b");

        // The applied config is itself a write-once registration.
        let err = registry.set_config("default", config_for("c")).unwrap_err();
        assert!(matches!(err, InstallerError::ConfigExists(ref name) if name == "default"));
    }

    #[tokio::test]
    async fn drop_config_reports_whether_anything_was_registered() {
        let (connector, _state) = StubConnector::new(StubState::default());
        let mut registry = ConnectionRegistry::new(connector);
        assert!(!registry.drop_config("default").await);
        registry.set_config("default", config_for("a")).unwrap();
        assert!(registry.drop_config("default").await);
        assert!(registry.config("default").is_none());
    }
}
