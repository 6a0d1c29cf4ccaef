//! Reading connector configuration and JSON request bodies.

use std::path::Path;

use serde::de::DeserializeOwned;
use tokio::io::AsyncReadExt;

use idgov_connector::config::ConnectorConfig;
use idgov_connector::operation::AttributeChange;
use idgov_connector_rest::RestDirectoryConfig;

use crate::error::{CliError, CliResult};

/// Load the connector configuration from a JSON file, or from the environment.
pub async fn load_config(path: Option<&Path>) -> CliResult<RestDirectoryConfig> {
    let config = match path {
        Some(path) => {
            let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
                CliError::Config(format!("cannot read {}: {e}", path.display()))
            })?;
            RestDirectoryConfig::from_json(&raw)?
        }
        None => {
            // A missing .env file is fine
            let _ = dotenvy::dotenv();
            RestDirectoryConfig::from_env()?
        }
    };

    config.validate()?;
    Ok(config)
}

/// Read a request body from a file, or from stdin when no path (or `-`) is given.
pub async fn read_input(path: Option<&Path>) -> CliResult<String> {
    match path {
        Some(path) if path != Path::new("-") => tokio::fs::read_to_string(path)
            .await
            .map_err(|e| CliError::Input(format!("cannot read {}: {e}", path.display()))),
        _ => {
            let mut buf = String::new();
            tokio::io::stdin().read_to_string(&mut buf).await?;
            Ok(buf)
        }
    }
}

/// Parse a JSON document, mapping failures to input errors.
pub fn parse_json<T: DeserializeOwned>(raw: &str) -> CliResult<T> {
    serde_json::from_str(raw).map_err(|e| CliError::Input(format!("malformed JSON: {e}")))
}

/// Parse update changes: either a bare list or a single change object.
pub fn parse_changes(raw: &str) -> CliResult<Vec<AttributeChange>> {
    let value: serde_json::Value = parse_json(raw)?;
    if value.is_array() {
        Ok(serde_json::from_value(value)?)
    } else {
        Ok(vec![serde_json::from_value(value)?])
    }
}
