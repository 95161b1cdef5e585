//! The uniform result envelope for automation operations.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What every automation step returns: success flag, human-readable message,
/// and optional structured payload.
///
/// Operations never raise past their boundary for expected failure modes;
/// unexpected engine failures are caught and converted with [`failed`].
///
/// [`failed`]: OperationResult::failed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationResult {
    pub success: bool,
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl OperationResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
        }
    }

    pub fn ok_with(message: impl Into<String>, data: Value) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_result_serializes_without_data() {
        let json = serde_json::to_value(OperationResult::failed("list frame not found")).unwrap();
        assert_eq!(json["success"], serde_json::json!(false));
        assert!(json.get("data").is_none());
    }
}
