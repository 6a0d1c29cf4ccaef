//! # Connector Framework
//!
//! Core abstractions for connecting an identity-governance platform to a
//! downstream user directory.
//!
//! ## Architecture
//!
//! Operations are grouped into capability traits:
//!
//! - [`Connector`] - Base trait all connectors implement
//! - [`AccountOp`] - List, read, create and update accounts
//! - [`EnableOp`] - Enable and disable accounts
//! - [`EntitlementOp`] - List and read entitlements
//!
//! ## Example
//!
//! ```ignore
//! use futures::TryStreamExt;
//! use idgov_connector::prelude::*;
//!
//! connector.test_connection().await?;
//!
//! let accounts: Vec<Account> = connector.list_accounts().try_collect().await?;
//!
//! let changes = vec![AttributeChange::new(AttributeChangeOp::Add, "groups", "10")];
//! let account = connector.update_account("1", changes).await?;
//! ```
//!
//! ## Crate Organization
//!
//! - [`error`] - Error type surfaced to the host
//! - [`config`] - Configuration trait and transport settings
//! - [`model`] - Canonical `Account` and `Group` shapes
//! - [`operation`] - Attribute-change requests
//! - [`traits`] - Connector capability traits

pub mod config;
pub mod error;
pub mod model;
pub mod operation;
pub mod traits;

/// Prelude module for convenient imports.
///
/// ```
/// use idgov_connector::prelude::*;
/// ```
pub mod prelude {
    // Error handling
    pub use crate::error::{ConnectorError, ConnectorResult};

    // Traits
    pub use crate::traits::{
        AccountOp, AccountStream, Connector, EnableOp, EntitlementOp, EntitlementStream,
    };

    // Model
    pub use crate::model::{
        Account, AccountAttributes, AccountCreateAttributes, Group, GroupAttributes, ADMIN_GROUP,
    };

    // Operations
    pub use crate::operation::{AttributeChange, AttributeChangeOp, MembershipOp};

    // Configuration
    pub use crate::config::{ConnectionSettings, ConnectorConfig};
}

// Re-export async_trait for connector implementors
pub use async_trait::async_trait;

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_prelude_imports() {
        let _settings = ConnectionSettings::default();
        let _group = Group::admin();
        let _change = AttributeChange::new(AttributeChangeOp::Set, "name", "test");
        let _op = MembershipOp::Add;
        let _err = ConnectorError::invalid_data("test");
    }
}
