/// A frame that could not be decoded into an envelope. `unique_id` is kept
/// when the frame got far enough to carry one.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("malformed frame: {reason}")]
pub struct MalformedEnvelope {
    pub unique_id: Option<String>,
    pub reason: String,
}

impl MalformedEnvelope {
    pub(crate) fn new(unique_id: Option<String>, reason: impl Into<String>) -> Self {
        Self {
            unique_id,
            reason: reason.into(),
        }
    }
}
