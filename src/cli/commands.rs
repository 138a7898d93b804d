//! CLI command implementations
//!
//! Every command loads and validates the configuration, opens the row store
//! and builds a [`Catalog`] before doing its work.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::catalog::Catalog;
use crate::errors::CatalogError;
use crate::http_server::{HttpServer, HttpServerConfig};
use crate::model::validate_code;
use crate::observability::{init_logging, Event};
use crate::records::{plain_attributes, LegacyConfig};
use crate::schema::{check, ValidationMode};
use crate::seed::seed_defaults;
use crate::store::{FileRowStore, MemoryRowStore, RowStore};

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::{read_request, write_error, write_response};

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Snapshot file; the catalog lives in memory when absent
    #[serde(default)]
    pub data_file: Option<String>,

    #[serde(default)]
    pub http: HttpServerConfig,

    /// `tracing` filter directive (default: "info"); `RUST_LOG` overrides it
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// Install the default types and attributes when serving (default: false)
    #[serde(default)]
    pub seed_defaults: bool,

    #[serde(default)]
    pub legacy: LegacyConfig,
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        if let Some(data_file) = &self.data_file {
            if data_file.trim().is_empty() {
                return Err(CliError::config_error("data_file must not be empty"));
            }
        }

        if self.http.port == 0 {
            return Err(CliError::config_error("http.port must be > 0"));
        }

        EnvFilter::try_new(&self.log_filter).map_err(|e| {
            CliError::config_error(format!("Invalid log_filter '{}': {}", self.log_filter, e))
        })?;

        validate_code(&self.legacy.default_type_code).map_err(|e| {
            CliError::config_error(format!("Invalid legacy.default_type_code: {}", e))
        })?;
        for (category, code) in &self.legacy.category_types {
            validate_code(code).map_err(|e| {
                CliError::config_error(format!(
                    "Invalid legacy type for category '{}': {}",
                    category, e
                ))
            })?;
        }

        Ok(())
    }

    /// Opens the configured row store
    pub fn open_store(&self) -> CliResult<Arc<dyn RowStore>> {
        let store: Arc<dyn RowStore> = match &self.data_file {
            Some(path) => Arc::new(FileRowStore::open(path)?),
            None => Arc::new(MemoryRowStore::new()),
        };
        info!(
            event = %Event::StoreOpened,
            data_file = self.data_file.as_deref().unwrap_or("<memory>"),
            "row store opened"
        );
        Ok(store)
    }

    /// Builds the catalog over a freshly opened store
    pub fn open_catalog(&self) -> CliResult<Catalog> {
        Ok(Catalog::new(self.open_store()?, self.legacy.clone()))
    }
}

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Serve { config, port } => serve(&config, port),
        Command::Seed { config } => seed(&config),
        Command::Schema { config, type_code } => schema(&config, &type_code),
        Command::Validate {
            config,
            type_code,
            update,
        } => validate(&config, &type_code, update),
    }
}

fn boot(config_path: &Path) -> CliResult<Config> {
    let config = Config::load(config_path)?;
    init_logging(&config.log_filter);
    info!(event = %Event::ConfigLoaded, path = %config_path.display(), "configuration loaded");
    Ok(config)
}

/// Start the HTTP API
pub fn serve(config_path: &Path, port: Option<u16>) -> CliResult<()> {
    let config = boot(config_path)?;
    info!(event = %Event::BootStart, "starting channel registry");

    let catalog = config.open_catalog()?;
    if config.seed_defaults {
        seed_defaults(&catalog)?;
    }

    let mut http_config = config.http.clone();
    if let Some(port) = port {
        http_config.port = port;
    }
    let server = HttpServer::with_config(http_config, catalog);

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))?;

    info!(event = %Event::BootComplete, addr = %server.socket_addr(), "boot complete");
    rt.block_on(async {
        server
            .start()
            .await
            .map_err(|e| CliError::boot_failed(format!("HTTP server failed: {}", e)))
    })?;

    Ok(())
}

/// Install the default catalog and report what changed
pub fn seed(config_path: &Path) -> CliResult<()> {
    let config = boot(config_path)?;
    let catalog = config.open_catalog()?;
    let report = seed_defaults(&catalog)?;
    write_response(&report)
}

/// Print the resolved schema of one type
pub fn schema(config_path: &Path, type_code: &str) -> CliResult<()> {
    let config = boot(config_path)?;
    let catalog = config.open_catalog()?;

    let channel_type = catalog.types.require_code(type_code)?;
    let resolved = catalog.resolver.resolve(channel_type.id)?;
    write_response(&json!({
        "channelTypeId": channel_type.id,
        "channelTypeCode": channel_type.code,
        "fields": resolved.views(),
    }))
}

/// Validate a `{"name": ..., "attributes": {...}}` object from stdin
pub fn validate(config_path: &Path, type_code: &str, update: bool) -> CliResult<()> {
    let config = boot(config_path)?;
    let catalog = config.open_catalog()?;

    let channel_type = catalog.types.require_code(type_code)?;
    let resolved = catalog.resolver.resolve(channel_type.id)?;

    let request = read_request()?;
    let name = request.get("name").and_then(Value::as_str).unwrap_or("");
    let attributes = match request.get("attributes") {
        Some(Value::Object(map)) => map.clone(),
        Some(Value::Null) | None => Map::new(),
        Some(_) => return Err(CliError::io_error("'attributes' must be a JSON object")),
    };

    let mode = if update {
        ValidationMode::Update
    } else {
        ValidationMode::Create
    };

    match check(&resolved, name, &attributes, mode) {
        Ok(record) => write_response(&json!({
            "valid": true,
            "name": record.name,
            "attributes": plain_attributes(&record.attributes),
        })),
        Err(CatalogError::Validation(issues)) => {
            let err = CliError::invalid_record(issues.len());
            write_error(err.code_str(), &serde_json::to_string(&issues)?)?;
            Err(err)
        }
        Err(other) => Err(other.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::super::errors::CliErrorCode;
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_config(temp_dir: &TempDir, config: Value) -> std::path::PathBuf {
        let config_path = temp_dir.path().join("channel-registry.json");
        fs::write(&config_path, config.to_string()).unwrap();
        config_path
    }

    #[test]
    fn test_config_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = write_config(&temp_dir, json!({}));

        let config = Config::load(&config_path).unwrap();
        assert!(config.data_file.is_none());
        assert_eq!(config.http, HttpServerConfig::default());
        assert_eq!(config.log_filter, "info");
        assert!(!config.seed_defaults);
        assert_eq!(config.legacy, LegacyConfig::default());
    }

    #[test]
    fn test_config_rejects_bad_legacy_type_code() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = write_config(
            &temp_dir,
            json!({"legacy": {"default_type_code": "Not A Code"}}),
        );

        let err = Config::load(&config_path).unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::ConfigError);
    }

    #[test]
    fn test_config_rejects_port_zero() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = write_config(&temp_dir, json!({"http": {"port": 0}}));
        assert!(Config::load(&config_path).is_err());
    }

    #[test]
    fn test_missing_config_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let err = Config::load(&temp_dir.path().join("absent.json")).unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::ConfigError);
    }

    #[test]
    fn test_seeded_file_store_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let data_file = temp_dir.path().join("data").join("catalog.json");
        let config_path = write_config(
            &temp_dir,
            json!({"data_file": data_file.to_string_lossy()}),
        );
        let config = Config::load(&config_path).unwrap();

        let first = config.open_catalog().unwrap();
        assert!(first.types.list().unwrap().is_empty());
        let report = seed_defaults(&first).unwrap();
        assert!(report.types_created > 0);
        drop(first);

        let second = config.open_catalog().unwrap();
        assert_eq!(second.types.list().unwrap().len(), report.types_created);
        assert_eq!(seed_defaults(&second).unwrap().types_created, 0);
        assert!(data_file.exists());
    }
}
