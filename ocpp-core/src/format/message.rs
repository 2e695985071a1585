use serde_json::Value;

use super::error::MalformedEnvelope;
use super::frame::{Call, CallError, CallResult};
use crate::v16::protocol_error::ProtocolError;

const CALL: u64 = 2;
const CALL_RESULT: u64 = 3;
const CALL_ERROR: u64 = 4;

#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    Call(Call),
    CallResult(CallResult),
    CallError(CallError),
}

pub trait EncodeDecode {
    fn encode(&self) -> String;
}

impl Envelope {
    pub fn unique_id(&self) -> &str {
        match self {
            Envelope::Call(t) => &t.unique_id,
            Envelope::CallResult(t) => &t.unique_id,
            Envelope::CallError(t) => &t.unique_id,
        }
    }

    pub fn decode(message: &str) -> Result<Envelope, MalformedEnvelope> {
        let raw: Value = serde_json::from_str(message)
            .map_err(|e| MalformedEnvelope::new(None, format!("JSON parse error: {}", e)))?;

        let mut arr = match raw {
            Value::Array(arr) => arr,
            _ => return Err(MalformedEnvelope::new(None, "Expected JSON array")),
        };

        let unique_id = arr.get(1).and_then(|v| v.as_str()).map(|s| s.to_string());

        match arr.first().and_then(|v| v.as_u64()) {
            Some(CALL) if arr.len() == 4 => {
                let action = arr[2].as_str().map(|s| s.to_string());
                let payload = arr.swap_remove(3);
                match (unique_id, action) {
                    (Some(unique_id), Some(action)) if payload.is_object() => {
                        Ok(Envelope::Call(Call {
                            unique_id,
                            action,
                            payload,
                        }))
                    }
                    (unique_id, _) => Err(MalformedEnvelope::new(unique_id, "Invalid Call structure")),
                }
            }

            Some(CALL_RESULT) if arr.len() == 3 => {
                let payload = arr.swap_remove(2);
                match unique_id {
                    Some(unique_id) if payload.is_object() => {
                        Ok(Envelope::CallResult(CallResult { unique_id, payload }))
                    }
                    unique_id => Err(MalformedEnvelope::new(
                        unique_id,
                        "Invalid CallResult structure",
                    )),
                }
            }

            Some(CALL_ERROR) if arr.len() == 5 => {
                let error_details = arr.swap_remove(4);
                let error_description = arr[3].as_str().unwrap_or_default().to_string();
                let error_code = arr[2]
                    .as_str()
                    .map(ProtocolError::from_wire)
                    .unwrap_or(ProtocolError::GenericError);
                match unique_id {
                    Some(unique_id) => Ok(Envelope::CallError(CallError {
                        unique_id,
                        error_code,
                        error_description,
                        error_details,
                    })),
                    None => Err(MalformedEnvelope::new(None, "Invalid CallError structure")),
                }
            }

            Some(CALL | CALL_RESULT | CALL_ERROR) => Err(MalformedEnvelope::new(
                unique_id,
                format!("Wrong arity {} for message type", arr.len()),
            )),

            _ => Err(MalformedEnvelope::new(
                None,
                "Unknown or malformed message type",
            )),
        }
    }
}

impl EncodeDecode for Call {
    fn encode(&self) -> String {
        Value::Array(vec![
            Value::from(CALL),
            Value::from(self.unique_id.as_str()),
            Value::from(self.action.as_str()),
            self.payload.clone(),
        ])
        .to_string()
    }
}

impl EncodeDecode for CallResult {
    fn encode(&self) -> String {
        Value::Array(vec![
            Value::from(CALL_RESULT),
            Value::from(self.unique_id.as_str()),
            self.payload.clone(),
        ])
        .to_string()
    }
}

impl EncodeDecode for CallError {
    fn encode(&self) -> String {
        Value::Array(vec![
            Value::from(CALL_ERROR),
            Value::from(self.unique_id.as_str()),
            Value::from(self.error_code.as_str()),
            Value::from(self.error_description.as_str()),
            self.error_details.clone(),
        ])
        .to_string()
    }
}

impl EncodeDecode for Envelope {
    fn encode(&self) -> String {
        match self {
            Envelope::Call(t) => t.encode(),
            Envelope::CallResult(t) => t.encode(),
            Envelope::CallError(t) => t.encode(),
        }
    }
}
