//! Directory REST client
//!
//! Thin typed calls over the directory's user and group collections. Every
//! call acquires a fresh bearer token, and every non-2xx response is logged
//! and turned into [`ConnectorError::DownstreamRequest`].

use reqwest::{header, Client, Method, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, error, instrument, warn};
use url::Url;

use idgov_connector::config::ConnectorConfig;
use idgov_connector::error::{ConnectorError, ConnectorResult};

use crate::auth::TokenProvider;
use crate::config::{Resource, RestDirectoryConfig};

const MERGE_PATCH: &str = "application/merge-patch+json";

/// A user as returned by the directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A group as returned by the directory.
///
/// Member ids are kept as the directory sent them and compared as strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRecord {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub users: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl GroupRecord {
    /// Whether the account identity is listed as a member.
    pub fn has_member(&self, identity: &str) -> bool {
        self.users.iter().any(|u| member_id(u).as_deref() == Some(identity))
    }

    /// The member list with the identity appended.
    pub fn users_with(&self, identity: &str) -> Vec<Value> {
        let mut users = self.users.clone();
        users.push(Value::String(identity.to_string()));
        users
    }

    /// The member list with every entry matching the identity removed.
    pub fn users_without(&self, identity: &str) -> Vec<Value> {
        self.users
            .iter()
            .filter(|u| member_id(u).as_deref() != Some(identity))
            .cloned()
            .collect()
    }
}

fn member_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    member_id(&value).ok_or_else(|| serde::de::Error::custom(format!("invalid id: {value}")))
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Read the body of a failed response; an unreadable body is logged and reported as empty.
pub(crate) async fn error_body(operation: &str, response: Response) -> String {
    match response.text().await {
        Ok(body) => body,
        Err(e) => {
            warn!(operation, error = %e, "Could not read error response body");
            String::new()
        }
    }
}

/// Authenticated client for the directory's REST API.
#[derive(Clone)]
pub struct DirectoryClient {
    config: RestDirectoryConfig,
    http: Client,
    tokens: TokenProvider,
}

impl std::fmt::Debug for DirectoryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryClient")
            .field("config", &self.config.redacted())
            .finish_non_exhaustive()
    }
}

impl DirectoryClient {
    /// Create a new client with the given configuration.
    pub fn new(config: RestDirectoryConfig) -> ConnectorResult<Self> {
        config.validate()?;
        config.validate_security();

        let http = Self::build_client(&config)?;
        let tokens = TokenProvider::new(&config, http.clone());

        Ok(Self {
            config,
            http,
            tokens,
        })
    }

    /// Build the reqwest client with configuration.
    fn build_client(config: &RestDirectoryConfig) -> ConnectorResult<Client> {
        let mut builder = Client::builder()
            .timeout(config.connection.read_timeout())
            .connect_timeout(config.connection.connection_timeout());

        if config.ignore_ssl {
            builder = builder.danger_accept_invalid_certs(true);
        }

        builder
            .build()
            .map_err(|e| ConnectorError::InvalidConfiguration {
                message: format!("Failed to build HTTP client: {e}"),
            })
    }

    /// The configuration this client was built from.
    pub fn config(&self) -> &RestDirectoryConfig {
        &self.config
    }

    /// Reach the user collection to prove the credentials and endpoint work.
    #[instrument(skip(self))]
    pub async fn probe(&self) -> ConnectorResult<()> {
        let url = self.collection(Resource::User)?;
        self.send("perform test connection", Method::GET, url, None)
            .await
            .map(|_| ())
    }

    /// List every user.
    #[instrument(skip(self))]
    pub async fn list_users(&self) -> ConnectorResult<Vec<UserRecord>> {
        let url = self.collection(Resource::User)?;
        self.send_json("list accounts", Method::GET, url, None).await
    }

    /// Get a single user.
    #[instrument(skip(self))]
    pub async fn get_user(&self, id: &str) -> ConnectorResult<UserRecord> {
        let url = self.config.item_url(Resource::User, id)?;
        self.send_json(&format!("read account `{id}`"), Method::GET, url, None)
            .await
    }

    /// Create a user from a JSON body; returns the stored record.
    #[instrument(skip(self, body))]
    pub async fn create_user(&self, body: &Value) -> ConnectorResult<UserRecord> {
        let url = self.collection(Resource::User)?;
        self.send_json("create account", Method::POST, url, Some(body))
            .await
    }

    /// Merge-patch a user.
    #[instrument(skip(self, patch))]
    pub async fn patch_user(&self, id: &str, patch: &Value) -> ConnectorResult<Value> {
        let url = self.config.item_url(Resource::User, id)?;
        self.send_patch(&format!("update user `{id}`"), url, patch)
            .await
    }

    /// List every group.
    #[instrument(skip(self))]
    pub async fn list_groups(&self) -> ConnectorResult<Vec<GroupRecord>> {
        let url = self.collection(Resource::Group)?;
        self.send_json("list groups", Method::GET, url, None).await
    }

    /// Get a single group.
    #[instrument(skip(self))]
    pub async fn get_group(&self, id: &str) -> ConnectorResult<GroupRecord> {
        let url = self.config.item_url(Resource::Group, id)?;
        self.send_json(&format!("retrieve group `{id}`"), Method::GET, url, None)
            .await
    }

    /// Merge-patch a group.
    #[instrument(skip(self, patch))]
    pub async fn patch_group(&self, id: &str, patch: &Value) -> ConnectorResult<Value> {
        let url = self.config.item_url(Resource::Group, id)?;
        self.send_patch(&format!("update group `{id}`"), url, patch)
            .await
    }

    /// Groups whose member list contains the user.
    #[instrument(skip(self))]
    pub async fn list_groups_containing_user(
        &self,
        user_id: &str,
    ) -> ConnectorResult<Vec<GroupRecord>> {
        let url = self.collection(Resource::Group)?;
        let groups: Vec<GroupRecord> = self
            .send_json("retrieve user groups", Method::GET, url, None)
            .await?;

        Ok(groups
            .into_iter()
            .filter(|g| g.has_member(user_id))
            .collect())
    }

    fn collection(&self, resource: Resource) -> ConnectorResult<Url> {
        Url::parse(&self.config.collection_url(resource)).map_err(|e| {
            ConnectorError::InvalidConfiguration {
                message: format!("invalid {} endpoint: {e}", resource.as_str()),
            }
        })
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        method: Method,
        url: Url,
        body: Option<&Value>,
    ) -> ConnectorResult<T> {
        let response = self.send(operation, method, url, body).await?;
        response.json::<T>().await.map_err(|e| {
            error!(operation, error = %e, "Unexpected response payload");
            ConnectorError::invalid_data(format!(
                "unexpected response when trying to {operation}: {e}"
            ))
        })
    }

    async fn send_patch(&self, operation: &str, url: Url, patch: &Value) -> ConnectorResult<Value> {
        let response = self.send(operation, Method::PATCH, url, Some(patch)).await?;
        let text = response
            .text()
            .await
            .map_err(|e| ConnectorError::transport_with_source(operation, e))?;

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| {
            ConnectorError::invalid_data(format!(
                "unexpected response when trying to {operation}: {e}"
            ))
        })
    }

    async fn send(
        &self,
        operation: &str,
        method: Method,
        url: Url,
        body: Option<&Value>,
    ) -> ConnectorResult<Response> {
        let token = self.tokens.acquire_token().await?;

        debug!(operation, method = %method, url = %url, "Sending directory request");

        let mut request = self
            .http
            .request(method.clone(), url.clone())
            .bearer_auth(token)
            .header(header::ACCEPT, "application/json");

        if let Some(body) = body {
            request = if method == Method::PATCH {
                let bytes = serde_json::to_vec(body).map_err(|e| {
                    ConnectorError::invalid_data(format!("unserializable patch body: {e}"))
                })?;
                request.header(header::CONTENT_TYPE, MERGE_PATCH).body(bytes)
            } else {
                request.json(body)
            };
        }

        let response = request.send().await.map_err(|e| {
            error!(operation, url = %url, error = %e, "Issue when trying to {operation}");
            ConnectorError::transport_with_source(operation, e)
        })?;

        let status = response.status();
        debug!(operation, status = status.as_u16(), "Received directory response");

        if !status.is_success() {
            let body = error_body(operation, response).await;
            error!(
                operation,
                status = status.as_u16(),
                body = %body,
                "Issue when trying to {operation}"
            );
            return Err(ConnectorError::downstream(operation, status.as_u16(), body));
        }

        Ok(response)
    }
}
