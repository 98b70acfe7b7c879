// Database connection management
//
// `DbConnector` builds unopened `Connection` handles from a `ConnectionConfig`;
// the registry owns them. Production code uses `SqlxConnector`; tests plug in
// stubs so connection failure paths are exercised without a real database.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use futures::TryStreamExt;
use log::{debug, info};
use serde_json::Value;
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions, MySqlRow};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgRow};
use sqlx::{ConnectOptions, Executor, MySql, Pool, Postgres, Row};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::timeout;

use crate::database::config::ConnectionConfig;
use crate::database::driver::DatabaseType;
use crate::database::table::{ColumnKind, Record, Table};
use crate::error::{InstallerError, Result};

/// Upper bound for physically opening a connection.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

// =============================================================================
// Connection errors
// =============================================================================

/// Error returned by connection attempts.
/// Keeps user-friendly messages separate from internal details.
#[derive(Debug, Clone)]
pub struct ConnectError {
    /// User-friendly message (safe to show in UI)
    pub user_message: String,
    /// Internal details for logging
    pub internal_details: String,
}

impl ConnectError {
    pub fn from_sqlx(e: &sqlx::Error) -> Self {
        let user_message = match e {
            sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut => {
                "Unable to reach the database server. Check host, port and network access."
            }
            sqlx::Error::Tls(_) => "TLS negotiation with the database server failed.",
            sqlx::Error::Configuration(_) => "The database configuration is invalid.",
            _ => "Unable to connect. Verify host, credentials, and network access.",
        };
        ConnectError {
            user_message: user_message.to_string(),
            internal_details: e.to_string(),
        }
    }
}

impl std::fmt::Display for ConnectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.user_message)
    }
}

impl std::error::Error for ConnectError {}

// =============================================================================
// Connection traits
// =============================================================================

/// A registered connection. Creating one does not touch the network;
/// `connect` opens it.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Backing config name this handle was registered under.
    fn config_name(&self) -> &str;

    fn config(&self) -> &ConnectionConfig;

    /// Physically open the connection.
    async fn connect(&self) -> std::result::Result<(), ConnectError>;

    /// Table names in the connected database, straight from the server.
    async fn list_tables(&self) -> Result<Vec<String>>;

    /// Every row of `table`, mapped column by column.
    async fn fetch_all(&self, table: &Table) -> Result<Vec<Record>>;

    /// Release any resources held by the handle.
    async fn disconnect(&self);
}

/// Factory for [`Connection`] handles.
pub trait DbConnector: Send + Sync {
    /// Fails with `MissingDriver` when the config names a driver this connector cannot serve.
    fn create(&self, name: &str, config: &ConnectionConfig) -> Result<Arc<dyn Connection>>;
}

// =============================================================================
// sqlx implementation
// =============================================================================

/// Production connector backed by sqlx pools.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqlxConnector;

impl DbConnector for SqlxConnector {
    fn create(&self, name: &str, config: &ConnectionConfig) -> Result<Arc<dyn Connection>> {
        let db_type = config
            .driver
            .database_type()
            .ok_or_else(|| InstallerError::MissingDriver(config.driver.to_string()))?;

        Ok(Arc::new(SqlxConnection {
            name: name.to_string(),
            db_type,
            config: config.clone(),
            pool: Mutex::new(None),
        }))
    }
}

/// Pool for one of the supported engines.
#[derive(Clone)]
pub enum DatabaseConnection {
    MySql(Pool<MySql>),
    Postgres(Pool<Postgres>),
}

impl DatabaseConnection {
    /// Physically open one connection, then keep a pool over the same options.
    ///
    /// The first connection is made directly so the driver's own failure
    /// (refused, bad credentials, unknown database) comes back instead of a
    /// pool acquire timeout.
    pub async fn open(db_type: DatabaseType, config: &ConnectionConfig) -> sqlx::Result<Self> {
        // Non-persistent configs get a single short-lived connection.
        let max_connections = if config.persistent { 5 } else { 1 };

        match db_type {
            DatabaseType::Mysql => {
                let options = mysql_options(config);
                let first = options.connect().await?;
                sqlx::Connection::close(first).await?;

                let set_time_zone = format!(
                    "SET time_zone = '{}'",
                    mysql_time_zone(&config.timezone)
                );
                let pool = MySqlPoolOptions::new()
                    .max_connections(max_connections)
                    .acquire_timeout(CONNECT_TIMEOUT)
                    .after_connect(move |conn, _meta| {
                        let stmt = set_time_zone.clone();
                        Box::pin(async move {
                            conn.execute(stmt.as_str()).await?;
                            Ok(())
                        })
                    })
                    .connect_lazy_with(options);
                Ok(DatabaseConnection::MySql(pool))
            }
            DatabaseType::Postgres => {
                let options = pg_options(config);
                let first = options.connect().await?;
                sqlx::Connection::close(first).await?;

                let pool = PgPoolOptions::new()
                    .max_connections(max_connections)
                    .acquire_timeout(CONNECT_TIMEOUT)
                    .connect_lazy_with(options);
                Ok(DatabaseConnection::Postgres(pool))
            }
        }
    }

    pub async fn close(&self) {
        match self {
            DatabaseConnection::MySql(pool) => pool.close().await,
            DatabaseConnection::Postgres(pool) => pool.close().await,
        }
    }

    pub async fn list_tables(&self) -> sqlx::Result<Vec<String>> {
        match self {
            DatabaseConnection::MySql(pool) => {
                // CAST avoids VARBINARY decoding of information_schema on MySQL 8.
                sqlx::query_scalar::<_, String>(
                    r#"
                    SELECT CAST(table_name AS CHAR)
                    FROM information_schema.tables
                    WHERE table_schema = DATABASE()
                    ORDER BY table_name
                    "#,
                )
                .fetch_all(pool)
                .await
            }
            DatabaseConnection::Postgres(pool) => {
                sqlx::query_scalar::<_, String>(
                    r#"
                    SELECT table_name::text
                    FROM information_schema.tables
                    WHERE table_schema = current_schema()
                    ORDER BY table_name
                    "#,
                )
                .fetch_all(pool)
                .await
            }
        }
    }

    pub async fn fetch_all(&self, table: &Table) -> Result<Vec<Record>> {
        let mut records = Vec::new();

        match self {
            DatabaseConnection::MySql(pool) => {
                let sql = select_all_sql(DatabaseType::Mysql, table);
                let mut rows = sqlx::query(&sql).fetch(pool);
                while let Some(row) = rows.try_next().await? {
                    records.push(mysql_record(&row, table)?);
                }
            }
            DatabaseConnection::Postgres(pool) => {
                let sql = select_all_sql(DatabaseType::Postgres, table);
                let mut rows = sqlx::query(&sql).fetch(pool);
                while let Some(row) = rows.try_next().await? {
                    records.push(pg_record(&row, table)?);
                }
            }
        }

        Ok(records)
    }
}

/// sqlx-backed [`Connection`]; the pool is opened on first use.
pub struct SqlxConnection {
    name: String,
    db_type: DatabaseType,
    config: ConnectionConfig,
    pool: Mutex<Option<DatabaseConnection>>,
}

impl SqlxConnection {
    async fn pool(&self) -> sqlx::Result<DatabaseConnection> {
        let mut guard = self.pool.lock().await;
        if let Some(pool) = guard.as_ref() {
            return Ok(pool.clone());
        }

        info!(
            "[PHASE: database] [STEP: connect] Opening {} connection \"{}\" ({})",
            self.db_type.as_str(),
            self.name,
            self.config.describe()
        );
        let pool = DatabaseConnection::open(self.db_type, &self.config).await?;
        *guard = Some(pool.clone());
        Ok(pool)
    }
}

#[async_trait]
impl Connection for SqlxConnection {
    fn config_name(&self) -> &str {
        &self.name
    }

    fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    async fn connect(&self) -> std::result::Result<(), ConnectError> {
        match timeout(CONNECT_TIMEOUT, self.pool()).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(ConnectError::from_sqlx(&e)),
            Err(_) => Err(ConnectError {
                user_message: "Connection timed out. Check network connectivity and firewall."
                    .to_string(),
                internal_details: format!(
                    "Connection attempt timed out after {}s",
                    CONNECT_TIMEOUT.as_secs()
                ),
            }),
        }
    }

    async fn list_tables(&self) -> Result<Vec<String>> {
        let pool = self.pool().await?;
        Ok(pool.list_tables().await?)
    }

    async fn fetch_all(&self, table: &Table) -> Result<Vec<Record>> {
        let pool = self.pool().await?;
        pool.fetch_all(table).await
    }

    async fn disconnect(&self) {
        if let Some(pool) = self.pool.lock().await.take() {
            debug!(
                "[PHASE: database] [STEP: disconnect] Closing connection \"{}\"",
                self.name
            );
            pool.close().await;
        }
    }
}

// =============================================================================
// SQL helpers
// =============================================================================

fn mysql_options(config: &ConnectionConfig) -> MySqlConnectOptions {
    MySqlConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .username(&config.username)
        .password(&config.password)
        .database(&config.database)
        .charset(&config.encoding)
}

fn pg_options(config: &ConnectionConfig) -> PgConnectOptions {
    PgConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .username(&config.username)
        .password(&config.password)
        .database(&config.database)
        .options([("timezone", config.timezone.as_str())])
}

fn mysql_time_zone(timezone: &str) -> &str {
    match timezone {
        "UTC" => "+00:00",
        other => other,
    }
}

pub(crate) fn quote_identifier(db_type: DatabaseType, ident: &str) -> String {
    match db_type {
        DatabaseType::Mysql => format!("`{}`", ident.replace('`', "``")),
        DatabaseType::Postgres => format!("\"{}\"", ident.replace('"', "\"\"")),
    }
}

pub(crate) fn select_all_sql(db_type: DatabaseType, table: &Table) -> String {
    let columns: Vec<String> = table
        .columns()
        .iter()
        .map(|c| {
            let quoted = quote_identifier(db_type, c.name);
            match (db_type, c.kind) {
                (DatabaseType::Postgres, ColumnKind::Uuid) => format!("{}::text AS {}", quoted, quoted),
                _ => quoted,
            }
        })
        .collect();

    format!(
        "SELECT {} FROM {}",
        columns.join(", "),
        quote_identifier(db_type, table.name())
    )
}

fn timestamp_value(ts: Option<NaiveDateTime>) -> Value {
    ts.map(|t| Value::String(DateTime::<Utc>::from_naive_utc_and_offset(t, Utc).to_rfc3339()))
        .unwrap_or(Value::Null)
}

fn text_value(s: Option<String>) -> Value {
    s.map(Value::String).unwrap_or(Value::Null)
}

fn mysql_record(row: &MySqlRow, table: &Table) -> Result<Record> {
    let mut record = Record::new();
    for column in table.columns() {
        let value = match column.kind {
            ColumnKind::Text | ColumnKind::Uuid => text_value(row.try_get(column.name)?),
            ColumnKind::DateTime => timestamp_value(row.try_get(column.name)?),
        };
        record.insert(column.name.to_string(), value);
    }
    Ok(record)
}

fn pg_record(row: &PgRow, table: &Table) -> Result<Record> {
    let mut record = Record::new();
    for column in table.columns() {
        let value = match column.kind {
            ColumnKind::Text | ColumnKind::Uuid => text_value(row.try_get(column.name)?),
            ColumnKind::DateTime => timestamp_value(row.try_get(column.name)?),
        };
        record.insert(column.name.to_string(), value);
    }
    Ok(record)
}
