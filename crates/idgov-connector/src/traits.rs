//! Connector capability traits
//!
//! One trait per group of platform operations. A host drives a connector by
//! calling these methods; list operations hand back streams so records can be
//! forwarded as soon as each one is composed.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::ConnectorResult;
use crate::model::{Account, AccountCreateAttributes, Group};
use crate::operation::AttributeChange;

/// Stream of accounts emitted one at a time.
pub type AccountStream<'a> = BoxStream<'a, ConnectorResult<Account>>;

/// Stream of entitlements emitted one at a time.
pub type EntitlementStream<'a> = BoxStream<'a, ConnectorResult<Group>>;

/// Base trait for all connectors.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Get the display name for this connector instance.
    fn display_name(&self) -> &str;

    /// Test the connection to the target system.
    ///
    /// Returns `Ok(())` if the directory is reachable and accepts the
    /// configured credentials.
    async fn test_connection(&self) -> ConnectorResult<()>;
}

/// Account lifecycle operations.
#[async_trait]
pub trait AccountOp: Connector {
    /// Emit every account, fully composed, one after the other.
    fn list_accounts(&self) -> AccountStream<'_>;

    /// Read a single account by identity.
    async fn read_account(&self, identity: &str) -> ConnectorResult<Account>;

    /// Create an account, or adopt an existing one with the same email.
    async fn create_account(&self, attributes: AccountCreateAttributes)
        -> ConnectorResult<Account>;

    /// Apply attribute changes and return the resulting account.
    async fn update_account(
        &self,
        identity: &str,
        changes: Vec<AttributeChange>,
    ) -> ConnectorResult<Account>;
}

/// Capability for enabling and disabling accounts.
#[async_trait]
pub trait EnableOp: Connector {
    /// Enable an account and return its new state.
    async fn enable_account(&self, identity: &str) -> ConnectorResult<Account>;

    /// Disable an account and return its new state.
    async fn disable_account(&self, identity: &str) -> ConnectorResult<Account>;
}

/// Entitlement aggregation.
#[async_trait]
pub trait EntitlementOp: Connector {
    /// Emit every entitlement, including synthetic ones.
    fn list_entitlements(&self) -> EntitlementStream<'_>;

    /// Read a single entitlement by identity.
    async fn read_entitlement(&self, identity: &str) -> ConnectorResult<Group>;
}
