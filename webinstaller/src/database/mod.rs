// Database setup for the web installer
//
// Build a connection config from the form, make it the default connection,
// then probe it and check its schema.

pub mod config;
pub mod connection;
pub mod driver;
pub mod healthchecks;
pub mod prober;
pub mod registry;
pub mod schema_verifier;
pub mod table;

pub use config::{build_config, build_config_from_env, ConnectionConfig};
pub use driver::{resolve_driver, DatabaseType, DriverId};
pub use healthchecks::{Healthchecks, SchemaTables};
pub use prober::{probe, test_connection, ProbeOutcome};
pub use registry::{ConnectionRegistry, DEFAULT_CONNECTION};
pub use schema_verifier::validate_schema;
