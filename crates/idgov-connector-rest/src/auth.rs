//! OAuth2 client-credentials token acquisition.
//!
//! A fresh token is requested for every directory call. Nothing is cached.

use reqwest::{header, Client};
use serde::Deserialize;
use tracing::{debug, error, instrument};

use idgov_connector::error::{ConnectorError, ConnectorResult};

use crate::client::error_body;
use crate::config::RestDirectoryConfig;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
}

/// Requests bearer tokens from the directory's token endpoint.
#[derive(Clone)]
pub struct TokenProvider {
    token_url: String,
    client_id: String,
    client_secret: String,
    http_client: Client,
}

impl std::fmt::Debug for TokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenProvider")
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

impl TokenProvider {
    /// Create a provider that shares the connector's HTTP client.
    pub fn new(config: &RestDirectoryConfig, http_client: Client) -> Self {
        Self {
            token_url: config.token_url(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            http_client,
        }
    }

    /// Acquire an access token using the client-credentials grant.
    #[instrument(skip(self), fields(token_url = %self.token_url))]
    pub async fn acquire_token(&self) -> ConnectorResult<String> {
        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];

        let response = self
            .http_client
            .post(&self.token_url)
            .header(header::ACCEPT, "application/json")
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Token request could not be sent");
                ConnectorError::authentication_failed_with_source("token request failed", e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = error_body("acquire token", response).await;
            error!(status = status.as_u16(), body = %body, "Token endpoint rejected the request");
            return Err(ConnectorError::authentication_failed(format!(
                "token request failed with status {}: {}",
                status.as_u16(),
                body
            )));
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            error!(error = %e, "Token response is not valid JSON");
            ConnectorError::authentication_failed_with_source("invalid token response", e)
        })?;

        match token.access_token {
            Some(token) if !token.is_empty() => {
                debug!("Access token acquired");
                Ok(token)
            }
            _ => {
                error!("Token response did not contain an access_token");
                Err(ConnectorError::authentication_failed(
                    "token response did not contain an access_token",
                ))
            }
        }
    }
}
