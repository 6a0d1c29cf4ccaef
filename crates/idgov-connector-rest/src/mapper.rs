//! Directory records to platform shapes.

use idgov_connector::model::{Account, AccountAttributes, Group, GroupAttributes};

use crate::client::{GroupRecord, UserRecord};

/// Map a directory user to an account with no entitlements yet.
pub fn to_account(user: &UserRecord) -> Account {
    Account {
        identity: user.id.clone(),
        uuid: user.email.clone().unwrap_or_default(),
        attributes: AccountAttributes {
            id: user.id.clone(),
            status: user.status.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role.clone(),
            groups: Vec::new(),
        },
        disabled: Account::is_disabled_status(user.status.as_deref()),
    }
}

/// Map a directory group to an entitlement.
pub fn to_group(group: &GroupRecord) -> Group {
    Group::new(GroupAttributes {
        id: group.id.clone(),
        name: group.name.clone(),
        description: group.description.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_to_account() {
        let user: UserRecord = serde_json::from_value(json!({
            "id": 1,
            "status": "Invited",
            "name": "Jane Doe",
            "email": "jane.doe@example.com",
            "role": "User"
        }))
        .unwrap();

        let account = to_account(&user);
        assert_eq!(account.identity, "1");
        assert_eq!(account.uuid, "jane.doe@example.com");
        assert_eq!(account.attributes.name.as_deref(), Some("Jane Doe"));
        assert!(!account.disabled);
        assert!(account.attributes.groups.is_empty());
    }

    #[test]
    fn test_to_account_without_status_is_disabled() {
        let user: UserRecord = serde_json::from_value(json!({"id": "1"})).unwrap();
        let account = to_account(&user);
        assert!(account.disabled);
        assert_eq!(account.uuid, "");
    }

    #[test]
    fn test_to_group() {
        let group: GroupRecord = serde_json::from_value(json!({
            "id": 10,
            "name": "Finance",
            "description": "Finance team",
            "users": [1]
        }))
        .unwrap();

        let group = to_group(&group);
        assert_eq!(group.identity, "10");
        assert_eq!(group.uuid, "Finance");
        assert_eq!(group.kind, "groups");
        assert_eq!(group.attributes.description.as_deref(), Some("Finance team"));
    }
}
