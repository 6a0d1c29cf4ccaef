//! REST directory connector
//!
//! Maps the platform's account and entitlement lifecycle onto sequences of
//! directory calls. Each step is awaited before the next; the first failure
//! aborts the operation and nothing is rolled back.

use async_stream::stream;
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, info, instrument};

use idgov_connector::config::ConnectorConfig;
use idgov_connector::error::{ConnectorError, ConnectorResult};
use idgov_connector::model::{
    Account, AccountCreateAttributes, Group, ADMIN_GROUP, ADMIN_ROLE, USER_ROLE,
};
use idgov_connector::operation::{
    ensure_supported, value_as_id, AttributeChange, AttributeChangeOp, MembershipOp,
};
use idgov_connector::traits::{
    AccountOp, AccountStream, Connector, EnableOp, EntitlementOp, EntitlementStream,
};

use crate::client::DirectoryClient;
use crate::config::RestDirectoryConfig;
use crate::mapper::{to_account, to_group};

/// Connector for a REST user directory protected by OAuth2 client credentials.
pub struct DirectoryConnector {
    client: DirectoryClient,
    display_name: String,
}

impl std::fmt::Debug for DirectoryConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryConnector")
            .field("config", &self.client.config().redacted())
            .field("display_name", &self.display_name)
            .finish()
    }
}

impl DirectoryConnector {
    /// Create a new connector with the given configuration.
    pub fn new(config: RestDirectoryConfig) -> ConnectorResult<Self> {
        let display_name = format!("REST directory: {}", config.base_url);
        let client = DirectoryClient::new(config)?;

        Ok(Self {
            client,
            display_name,
        })
    }

    /// The underlying directory client.
    pub fn client(&self) -> &DirectoryClient {
        &self.client
    }

    /// Read a user and attach its entitlements.
    async fn compose_account(&self, identity: &str) -> ConnectorResult<Account> {
        let user = self.client.get_user(identity).await?;
        let mut account = to_account(&user);

        let groups = self.client.list_groups_containing_user(&account.identity).await?;
        account.set_groups(groups.into_iter().map(|g| g.id).collect());

        debug!(
            identity = %account.identity,
            groups = ?account.attributes.groups,
            "Account composed"
        );
        Ok(account)
    }

    /// Grant or revoke one entitlement.
    ///
    /// The admin entitlement is carried by the user's role. Any other
    /// entitlement is a directory group; no write is issued when the
    /// membership is already in the requested state.
    #[instrument(skip(self, account), fields(identity = %account.identity))]
    pub async fn update_group_membership(
        &self,
        account: &Account,
        group: &str,
        op: MembershipOp,
    ) -> ConnectorResult<()> {
        if group == ADMIN_GROUP {
            let role = match op {
                MembershipOp::Add => ADMIN_ROLE,
                MembershipOp::Remove => USER_ROLE,
            };
            info!(role, "Updating role of {}", account.identity);
            self.client
                .patch_user(&account.identity, &json!({ "role": role }))
                .await?;
            return Ok(());
        }

        let record = self.client.get_group(group).await?;
        let present = record.has_member(&account.identity);

        let users = match (op, present) {
            (MembershipOp::Add, false) => {
                info!("Adding {} to group {}", account.identity, group);
                record.users_with(&account.identity)
            }
            (MembershipOp::Remove, true) => {
                info!("Removing {} from group {}", account.identity, group);
                record.users_without(&account.identity)
            }
            _ => {
                debug!(%op, present, "Membership already in requested state");
                return Ok(());
            }
        };

        self.client
            .patch_group(group, &json!({ "users": users }))
            .await?;
        Ok(())
    }

    async fn grant_all(&self, account: &Account, groups: &[String]) -> ConnectorResult<()> {
        for group in groups {
            self.update_group_membership(account, group, MembershipOp::Add)
                .await?;
        }
        Ok(())
    }

    async fn set_active(&self, identity: &str, active: bool) -> ConnectorResult<Account> {
        let account = self.compose_account(identity).await?;
        info!(identity = %account.identity, active, "Setting account activation");
        self.client
            .patch_user(&account.identity, &json!({ "isActive": active }))
            .await?;
        self.compose_account(&account.identity).await
    }
}

#[async_trait]
impl Connector for DirectoryConnector {
    fn display_name(&self) -> &str {
        &self.display_name
    }

    #[instrument(skip(self))]
    async fn test_connection(&self) -> ConnectorResult<()> {
        self.client.probe().await.map_err(|e| {
            ConnectorError::connection_failed_with_source(e.to_string(), e)
        })?;

        info!(base_url = %self.client.config().base_url, "Directory connection test successful");
        Ok(())
    }
}

#[async_trait]
impl AccountOp for DirectoryConnector {
    fn list_accounts(&self) -> AccountStream<'_> {
        Box::pin(stream! {
            info!("Listing accounts");
            let users = match self.client.list_users().await {
                Ok(users) => users,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };

            for user in users {
                let result = self.compose_account(&user.id).await;
                let failed = result.is_err();
                yield result;
                if failed {
                    return;
                }
            }
        })
    }

    #[instrument(skip(self))]
    async fn read_account(&self, identity: &str) -> ConnectorResult<Account> {
        self.compose_account(identity).await
    }

    #[instrument(skip(self, attributes), fields(email = ?attributes.email))]
    async fn create_account(
        &self,
        attributes: AccountCreateAttributes,
    ) -> ConnectorResult<Account> {
        let users = self.client.list_users().await?;
        let existing = attributes
            .email
            .as_deref()
            .and_then(|email| users.iter().find(|u| u.email.as_deref() == Some(email)));

        let account = match existing {
            Some(user) => {
                info!(
                    identity = %user.id,
                    "Account not created, an account with the same email already exists"
                );
                self.compose_account(&user.id).await?
            }
            None => {
                let created = self.client.create_user(&attributes.to_create_body()).await?;
                let account = self.compose_account(&created.id).await?;
                info!(identity = %account.identity, "New account created");
                account
            }
        };

        if attributes.groups.is_empty() {
            return Ok(account);
        }

        self.grant_all(&account, &attributes.groups).await?;
        self.compose_account(&account.identity).await
    }

    #[instrument(skip(self, changes), fields(changes = changes.len()))]
    async fn update_account(
        &self,
        identity: &str,
        changes: Vec<AttributeChange>,
    ) -> ConnectorResult<Account> {
        ensure_supported(&changes)?;

        for change in &changes {
            for value in change.values() {
                let account = self.compose_account(identity).await?;
                match &change.op {
                    AttributeChangeOp::Add => {
                        let group = value_as_id(&value)?;
                        info!("Sending provisioning request for {} to group {}", account.identity, group);
                        self.update_group_membership(&account, &group, MembershipOp::Add)
                            .await?;
                    }
                    AttributeChangeOp::Remove => {
                        let group = value_as_id(&value)?;
                        info!("Sending deprovisioning request for {} from group {}", account.identity, group);
                        self.update_group_membership(&account, &group, MembershipOp::Remove)
                            .await?;
                    }
                    AttributeChangeOp::Set => {
                        info!(
                            attribute = %change.attribute,
                            "Sending attribute update request for {}", account.identity
                        );
                        let mut patch = serde_json::Map::new();
                        patch.insert(change.attribute.clone(), value);
                        self.client
                            .patch_user(&account.identity, &Value::Object(patch))
                            .await?;
                    }
                    AttributeChangeOp::Other(op) => {
                        return Err(ConnectorError::UnsupportedOperation { op: op.clone() });
                    }
                }
            }
        }

        self.compose_account(identity).await
    }
}

#[async_trait]
impl EnableOp for DirectoryConnector {
    #[instrument(skip(self))]
    async fn enable_account(&self, identity: &str) -> ConnectorResult<Account> {
        self.set_active(identity, true).await
    }

    #[instrument(skip(self))]
    async fn disable_account(&self, identity: &str) -> ConnectorResult<Account> {
        self.set_active(identity, false).await
    }
}

#[async_trait]
impl EntitlementOp for DirectoryConnector {
    fn list_entitlements(&self) -> EntitlementStream<'_> {
        Box::pin(stream! {
            info!("Listing entitlements");
            match self.client.list_groups().await {
                Ok(groups) => {
                    for group in &groups {
                        yield Ok(to_group(group));
                    }
                    yield Ok(Group::admin());
                }
                Err(e) => yield Err(e),
            }
        })
    }

    #[instrument(skip(self))]
    async fn read_entitlement(&self, identity: &str) -> ConnectorResult<Group> {
        if identity == ADMIN_GROUP {
            return Ok(Group::admin());
        }
        let group = self.client.get_group(identity).await?;
        Ok(to_group(&group))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connector_creation() {
        let config = RestDirectoryConfig::new("https://directory.example.com", "id", "secret");
        let connector = DirectoryConnector::new(config).unwrap();
        assert_eq!(
            connector.display_name(),
            "REST directory: https://directory.example.com"
        );
    }

    #[test]
    fn test_connector_rejects_missing_secret() {
        let config = RestDirectoryConfig::new("https://directory.example.com", "id", "");
        let err = DirectoryConnector::new(config).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CONFIG");
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = RestDirectoryConfig::new("https://directory.example.com", "id", "hunter2");
        let connector = DirectoryConnector::new(config).unwrap();
        let debug = format!("{connector:?}");
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("hunter2"));
    }

    #[tokio::test]
    async fn test_admin_entitlement_needs_no_directory() {
        // Nothing listens here; the admin entitlement must not trigger a call.
        let config = RestDirectoryConfig::new("http://127.0.0.1:9", "id", "secret");
        let connector = DirectoryConnector::new(config).unwrap();
        let group = connector.read_entitlement("Admin").await.unwrap();
        assert_eq!(group, Group::admin());
    }

    #[tokio::test]
    async fn test_unsupported_op_rejected_before_any_call() {
        let config = RestDirectoryConfig::new("http://127.0.0.1:9", "id", "secret");
        let connector = DirectoryConnector::new(config).unwrap();
        let changes = vec![AttributeChange::new(
            AttributeChangeOp::Other("Replace".into()),
            "name",
            "x",
        )];
        let err = connector.update_account("1", changes).await.unwrap_err();
        assert!(matches!(err, ConnectorError::UnsupportedOperation { .. }));
    }
}
