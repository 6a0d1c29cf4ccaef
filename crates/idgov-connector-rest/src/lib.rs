//! # REST Directory Connector
//!
//! Connects an identity-governance platform to a REST user directory that
//! is protected by OAuth2 client credentials.
//!
//! ## Features
//!
//! - Client-credentials token acquisition before every call
//! - Account list, read, create, update, enable and disable
//! - Group entitlements plus a synthetic `Admin` entitlement backed by the
//!   user's role
//! - Per-connector TLS verification toggle
//!
//! ## Example
//!
//! ```ignore
//! use idgov_connector::prelude::*;
//! use idgov_connector_rest::{DirectoryConnector, RestDirectoryConfig};
//!
//! let config = RestDirectoryConfig::new("https://directory.example.com", "client", "secret");
//!
//! let connector = DirectoryConnector::new(config)?;
//! connector.test_connection().await?;
//! let account = connector.read_account("1").await?;
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod connector;
pub mod mapper;

// Re-exports
pub use auth::TokenProvider;
pub use client::{DirectoryClient, GroupRecord, UserRecord};
pub use config::{Resource, RestDirectoryConfig};
pub use connector::DirectoryConnector;
