//! REST directory configuration
//!
//! Read once at startup, from the platform's JSON configuration or from
//! environment variables.

use serde::{Deserialize, Serialize};
use url::Url;

use idgov_connector::config::{ConnectionSettings, ConnectorConfig, REDACTED};
use idgov_connector::error::{ConnectorError, ConnectorResult};

/// Resource collections exposed by the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    User,
    Group,
}

impl Resource {
    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::User => "user",
            Resource::Group => "group",
        }
    }
}

/// Configuration for the REST directory connector.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestDirectoryConfig {
    /// Base URL of the directory (e.g., "https://directory.example.com").
    pub base_url: String,

    /// OAuth2 client id.
    pub client_id: String,

    /// OAuth2 client secret.
    pub client_secret: String,

    /// Skip TLS certificate validation for this connector's HTTP client.
    #[serde(default, rename = "ignoreSSL")]
    pub ignore_ssl: bool,

    /// Transport timeouts.
    #[serde(default)]
    pub connection: ConnectionSettings,

    /// Path of the client-credentials token endpoint.
    #[serde(default = "default_token_path")]
    pub token_path: String,

    /// Path of the user collection.
    #[serde(default = "default_users_path")]
    pub users_path: String,

    /// Path of the group collection.
    #[serde(default = "default_groups_path")]
    pub groups_path: String,
}

fn default_token_path() -> String {
    "/connect/token".to_string()
}

fn default_users_path() -> String {
    "/api/users".to_string()
}

fn default_groups_path() -> String {
    "/api/securityGroups".to_string()
}

impl std::fmt::Debug for RestDirectoryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestDirectoryConfig")
            .field("base_url", &self.base_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &REDACTED)
            .field("ignore_ssl", &self.ignore_ssl)
            .field("connection", &self.connection)
            .finish()
    }
}

impl RestDirectoryConfig {
    /// Create a new config with required fields.
    pub fn new(
        base_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            ignore_ssl: false,
            connection: ConnectionSettings::default(),
            token_path: default_token_path(),
            users_path: default_users_path(),
            groups_path: default_groups_path(),
        }
    }

    /// Disable certificate validation for this connector only.
    pub fn with_ignore_ssl(mut self, ignore_ssl: bool) -> Self {
        self.ignore_ssl = ignore_ssl;
        self
    }

    /// Set transport timeouts.
    pub fn with_connection(mut self, connection: ConnectionSettings) -> Self {
        self.connection = connection;
        self
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> ConnectorResult<Self> {
        Self::from_reader(|key| std::env::var(key))
    }

    /// Load configuration from a custom variable reader.
    ///
    /// This allows tests to supply variables without mutating process-global
    /// environment state.
    pub fn from_reader<F>(reader: F) -> ConnectorResult<Self>
    where
        F: Fn(&str) -> Result<String, std::env::VarError>,
    {
        let required = |key: &str| {
            reader(key).map_err(|_| ConnectorError::InvalidConfiguration {
                message: format!("missing required environment variable: {key}"),
            })
        };

        let base_url = required("IDGOV_BASE_URL")?;
        let client_id = required("IDGOV_CLIENT_ID")?;
        let client_secret = required("IDGOV_CLIENT_SECRET")?;

        let ignore_ssl = reader("IDGOV_IGNORE_SSL")
            .unwrap_or_else(|_| "false".to_string())
            .parse::<bool>()
            .map_err(|e| invalid_value("IDGOV_IGNORE_SSL", e))?;

        let defaults = ConnectionSettings::default();
        let connection_timeout_secs = match reader("IDGOV_CONNECT_TIMEOUT_SECS") {
            Ok(v) => v
                .parse::<u64>()
                .map_err(|e| invalid_value("IDGOV_CONNECT_TIMEOUT_SECS", e))?,
            Err(_) => defaults.connection_timeout_secs,
        };
        let read_timeout_secs = match reader("IDGOV_READ_TIMEOUT_SECS") {
            Ok(v) => v
                .parse::<u64>()
                .map_err(|e| invalid_value("IDGOV_READ_TIMEOUT_SECS", e))?,
            Err(_) => defaults.read_timeout_secs,
        };

        Ok(Self::new(base_url, client_id, client_secret)
            .with_ignore_ssl(ignore_ssl)
            .with_connection(
                ConnectionSettings::new()
                    .with_connection_timeout(connection_timeout_secs)
                    .with_read_timeout(read_timeout_secs),
            ))
    }

    /// Parse configuration from the platform's JSON document.
    pub fn from_json(json: &str) -> ConnectorResult<Self> {
        serde_json::from_str(json).map_err(|e| ConnectorError::InvalidConfiguration {
            message: format!("invalid configuration document: {e}"),
        })
    }

    /// Build the full URL for a path below the base URL.
    pub fn url(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{base}/{path}")
    }

    /// URL of the token endpoint.
    pub fn token_url(&self) -> String {
        self.url(&self.token_path)
    }

    /// URL of a resource collection.
    pub fn collection_url(&self, resource: Resource) -> String {
        match resource {
            Resource::User => self.url(&self.users_path),
            Resource::Group => self.url(&self.groups_path),
        }
    }

    /// URL of a single resource; the id is percent-encoded as one path segment.
    pub fn item_url(&self, resource: Resource, id: &str) -> ConnectorResult<Url> {
        let mut url = Url::parse(&self.collection_url(resource)).map_err(|e| {
            ConnectorError::InvalidConfiguration {
                message: format!("invalid {} endpoint: {e}", resource.as_str()),
            }
        })?;
        url.path_segments_mut()
            .map_err(|()| ConnectorError::InvalidConfiguration {
                message: format!("{} endpoint cannot have path segments", resource.as_str()),
            })?
            .pop_if_empty()
            .push(id);
        Ok(url)
    }

    /// Log a warning when certificate validation is turned off.
    pub fn validate_security(&self) {
        if self.ignore_ssl {
            tracing::warn!(
                target: "security",
                base_url = %self.base_url,
                "TLS certificate verification is DISABLED for this connector. \
                 This should ONLY be used against development directories."
            );
        }
    }
}

fn invalid_value(key: &str, e: impl std::fmt::Display) -> ConnectorError {
    ConnectorError::InvalidConfiguration {
        message: format!("invalid value for {key}: {e}"),
    }
}

impl ConnectorConfig for RestDirectoryConfig {
    fn validate(&self) -> ConnectorResult<()> {
        if self.base_url.is_empty() {
            return Err(ConnectorError::InvalidConfiguration {
                message: "baseUrl is required".to_string(),
            });
        }

        let url = Url::parse(&self.base_url).map_err(|e| ConnectorError::InvalidConfiguration {
            message: format!("invalid baseUrl: {e}"),
        })?;

        if url.scheme() != "https" && url.scheme() != "http" {
            return Err(ConnectorError::InvalidConfiguration {
                message: format!("unsupported baseUrl scheme: {}", url.scheme()),
            });
        }

        if self.client_id.is_empty() {
            return Err(ConnectorError::InvalidConfiguration {
                message: "clientId is required".to_string(),
            });
        }

        if self.client_secret.is_empty() {
            return Err(ConnectorError::InvalidConfiguration {
                message: "clientSecret is required".to_string(),
            });
        }

        Ok(())
    }

    fn redacted(&self) -> Self {
        let mut config = self.clone();
        config.client_secret = REDACTED.to_string();
        config
    }
}
