use crate::v16::protocol_error::ProtocolError;

/// `[2, uniqueId, action, payload]`
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
pub struct Call {
    pub unique_id: String,
    pub action: String,
    pub payload: serde_json::Value,
}

impl Call {
    pub fn new(unique_id: String, action: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            unique_id,
            action: action.into(),
            payload,
        }
    }
}

/// `[3, uniqueId, payload]`
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
pub struct CallResult {
    pub unique_id: String,
    pub payload: serde_json::Value,
}

impl CallResult {
    pub fn new<T: serde::Serialize>(unique_id: String, payload: T) -> Result<Self, serde_json::Error> {
        Ok(Self {
            unique_id,
            payload: serde_json::to_value(payload)?,
        })
    }
}

/// `[4, uniqueId, errorCode, errorDescription, errorDetails]`
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
pub struct CallError {
    pub unique_id: String,
    pub error_code: ProtocolError,
    pub error_description: String,
    pub error_details: serde_json::Value,
}

impl CallError {
    pub fn new(unique_id: String, error_code: ProtocolError) -> Self {
        Self {
            unique_id,
            error_code,
            error_description: String::new(),
            error_details: serde_json::json!({}),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.error_description = description.into();
        self
    }
}
