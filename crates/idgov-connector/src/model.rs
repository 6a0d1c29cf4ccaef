//! Canonical account and entitlement shapes exchanged with the governance platform.
//!
//! Every record is rebuilt from the directory on each read; nothing here is
//! persisted by the connector.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::operation::value_as_id;

/// Identity, name and membership key of the synthetic admin entitlement.
pub const ADMIN_GROUP: &str = "Admin";

/// Description reported for the synthetic admin entitlement.
pub const ADMIN_GROUP_DESCRIPTION: &str = "Grants Admin role to user";

/// Role value that grants the admin entitlement.
pub const ADMIN_ROLE: &str = "Admin";

/// Role value written when the admin entitlement is revoked.
pub const USER_ROLE: &str = "User";

/// Entitlement type tag reported for every group.
pub const GROUP_TYPE: &str = "groups";

/// Directory statuses that count as enabled.
const ENABLED_STATUSES: [&str; 2] = ["Active", "Invited"];

/// A user account as reported to the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Stable identifier (directory `id`).
    pub identity: String,
    /// Secondary identifier (directory `email`).
    pub uuid: String,
    pub attributes: AccountAttributes,
    pub disabled: bool,
}

impl Account {
    /// Whether the directory status marks the account as disabled.
    pub fn is_disabled_status(status: Option<&str>) -> bool {
        !status.is_some_and(|s| ENABLED_STATUSES.contains(&s))
    }

    /// Whether this account holds the admin role.
    pub fn is_admin(&self) -> bool {
        self.attributes.role.as_deref() == Some(ADMIN_ROLE)
    }

    /// Replace the entitlement list, appending the admin entitlement when the role grants it.
    pub fn set_groups(&mut self, group_ids: Vec<String>) {
        let mut groups = group_ids;
        if self.is_admin() {
            groups.push(ADMIN_GROUP.to_string());
        }
        self.attributes.groups = groups;
    }
}

/// Attributes of an [`Account`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountAttributes {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub groups: Vec<String>,
}

/// An entitlement (directory group or the synthetic admin group).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub identity: String,
    pub uuid: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub attributes: GroupAttributes,
}

impl Group {
    /// Build an entitlement from its attributes.
    pub fn new(attributes: GroupAttributes) -> Self {
        Self {
            identity: attributes.id.clone(),
            uuid: attributes.name.clone().unwrap_or_default(),
            kind: GROUP_TYPE.to_string(),
            attributes,
        }
    }

    /// The synthetic entitlement backed by the account `role` attribute.
    pub fn admin() -> Self {
        Self::new(GroupAttributes {
            id: ADMIN_GROUP.to_string(),
            name: Some(ADMIN_GROUP.to_string()),
            description: Some(ADMIN_GROUP_DESCRIPTION.to_string()),
        })
    }
}

/// Attributes of a [`Group`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupAttributes {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Attributes supplied by the platform when creating an account.
///
/// `groups` are entitlements to grant after the account exists; every other
/// field is sent to the directory as part of the create body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountCreateAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub groups: Vec<String>,
    /// Additional directory fields forwarded verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AccountCreateAttributes {
    /// The directory create body: every attribute except `groups`.
    pub fn to_create_body(&self) -> Value {
        let mut body = self.extra.clone();
        body.remove("groups");
        if let Some(email) = &self.email {
            body.insert("email".to_string(), Value::String(email.clone()));
        }
        if let Some(name) = &self.name {
            body.insert("name".to_string(), Value::String(name.clone()));
        }
        if let Some(role) = &self.role {
            body.insert("role".to_string(), Value::String(role.clone()));
        }
        Value::Object(body)
    }
}

/// Accept a single entitlement id or a list of them; ids may be strings or numbers.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = match Value::deserialize(deserializer)? {
        Value::Null => Vec::new(),
        Value::Array(values) => values,
        other => vec![other],
    };

    values
        .iter()
        .map(|v| value_as_id(v).map_err(<D::Error as serde::de::Error>::custom))
        .collect()
}
