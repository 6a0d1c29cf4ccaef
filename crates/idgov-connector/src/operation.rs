//! Operation types
//!
//! Attribute-change requests sent by the platform on account update, and the
//! membership direction used when granting or revoking an entitlement.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::{ConnectorError, ConnectorResult};

/// Operation tag of an [`AttributeChange`].
///
/// Unknown tags deserialize into [`AttributeChangeOp::Other`] so they can be
/// rejected with a clear error instead of a parse failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AttributeChangeOp {
    Add,
    Remove,
    Set,
    Other(String),
}

impl AttributeChangeOp {
    /// Get the string representation.
    pub fn as_str(&self) -> &str {
        match self {
            AttributeChangeOp::Add => "Add",
            AttributeChangeOp::Remove => "Remove",
            AttributeChangeOp::Set => "Set",
            AttributeChangeOp::Other(op) => op,
        }
    }

    /// Whether the connector knows how to apply this operation.
    pub fn is_supported(&self) -> bool {
        !matches!(self, AttributeChangeOp::Other(_))
    }
}

impl From<String> for AttributeChangeOp {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Add" => AttributeChangeOp::Add,
            "Remove" => AttributeChangeOp::Remove,
            "Set" => AttributeChangeOp::Set,
            _ => AttributeChangeOp::Other(s),
        }
    }
}

impl From<AttributeChangeOp> for String {
    fn from(op: AttributeChangeOp) -> Self {
        op.as_str().to_string()
    }
}

impl fmt::Display for AttributeChangeOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single requested mutation of an account attribute or entitlement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeChange {
    pub op: AttributeChangeOp,
    pub attribute: String,
    /// A scalar or a list; lists are applied one value at a time.
    #[serde(default)]
    pub value: Value,
}

impl AttributeChange {
    /// Create a new change.
    pub fn new(op: AttributeChangeOp, attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            op,
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// The individual values carried by this change.
    ///
    /// `null` is a value of its own: a Set with `null` clears the attribute.
    pub fn values(&self) -> Vec<Value> {
        match &self.value {
            Value::Array(values) => values.clone(),
            other => vec![other.clone()],
        }
    }
}

/// Reject the whole batch if any change carries an unsupported tag.
pub fn ensure_supported(changes: &[AttributeChange]) -> ConnectorResult<()> {
    match changes.iter().find(|c| !c.op.is_supported()) {
        Some(change) => Err(ConnectorError::UnsupportedOperation {
            op: change.op.to_string(),
        }),
        None => Ok(()),
    }
}

/// Direction of an entitlement membership change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MembershipOp {
    Add,
    Remove,
}

impl fmt::Display for MembershipOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MembershipOp::Add => write!(f, "Add"),
            MembershipOp::Remove => write!(f, "Remove"),
        }
    }
}

/// Render an entitlement value (string or number) as a group identifier.
pub fn value_as_id(value: &Value) -> ConnectorResult<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(ConnectorError::invalid_data(format!(
            "expected an entitlement id, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_op_parsing() {
        let change: AttributeChange =
            serde_json::from_value(json!({"op": "Add", "attribute": "groups", "value": "10"}))
                .unwrap();
        assert_eq!(change.op, AttributeChangeOp::Add);

        let change: AttributeChange =
            serde_json::from_value(json!({"op": "Replace", "attribute": "x", "value": 1}))
                .unwrap();
        assert_eq!(change.op, AttributeChangeOp::Other("Replace".to_string()));
        assert!(!change.op.is_supported());
    }

    #[test]
    fn test_op_serializes_as_tag() {
        let change = AttributeChange::new(AttributeChangeOp::Set, "isActive", false);
        let value = serde_json::to_value(&change).unwrap();
        assert_eq!(value, json!({"op": "Set", "attribute": "isActive", "value": false}));
    }

    #[test]
    fn test_values_flatten_lists() {
        let change = AttributeChange::new(AttributeChangeOp::Add, "groups", json!(["10", "11"]));
        assert_eq!(change.values(), vec![json!("10"), json!("11")]);

        let change = AttributeChange::new(AttributeChangeOp::Set, "name", "Jane");
        assert_eq!(change.values(), vec![json!("Jane")]);

        let change = AttributeChange::new(AttributeChangeOp::Set, "name", Value::Null);
        assert_eq!(change.values(), vec![Value::Null]);

        let change: AttributeChange =
            serde_json::from_value(json!({"op": "Set", "attribute": "name"})).unwrap();
        assert_eq!(change.values(), vec![Value::Null]);
    }

    #[test]
    fn test_ensure_supported() {
        let ok = vec![
            AttributeChange::new(AttributeChangeOp::Add, "groups", "10"),
            AttributeChange::new(AttributeChangeOp::Set, "name", "Jane"),
        ];
        assert!(ensure_supported(&ok).is_ok());

        let bad = vec![
            AttributeChange::new(AttributeChangeOp::Add, "groups", "10"),
            AttributeChange::new(AttributeChangeOp::Other("Merge".into()), "name", "Jane"),
        ];
        let err = ensure_supported(&bad).unwrap_err();
        assert!(matches!(err, ConnectorError::UnsupportedOperation { ref op } if op == "Merge"));
    }

    #[test]
    fn test_value_as_id() {
        assert_eq!(value_as_id(&json!("10")).unwrap(), "10");
        assert_eq!(value_as_id(&json!(10)).unwrap(), "10");
        assert!(value_as_id(&json!(true)).is_err());
    }
}
