/// OCPP-J 1.6 CallError codes.
#[derive(serde::Serialize, serde::Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProtocolError {
    InternalError,
    ProtocolError,
    SecurityError,
    FormationViolation,
    PropertyConstraintViolation,
    /// Spelled `OccurenceConstraintViolation` on the 1.6 wire.
    #[serde(
        rename = "OccurenceConstraintViolation",
        alias = "OccurrenceConstraintViolation"
    )]
    OccurrenceConstraintViolation,
    TypeConstraintViolation,
    GenericError,
    NotImplemented,
    NotSupported,
}

impl ProtocolError {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProtocolError::InternalError => "InternalError",
            ProtocolError::ProtocolError => "ProtocolError",
            ProtocolError::SecurityError => "SecurityError",
            ProtocolError::FormationViolation => "FormationViolation",
            ProtocolError::PropertyConstraintViolation => "PropertyConstraintViolation",
            ProtocolError::OccurrenceConstraintViolation => "OccurenceConstraintViolation",
            ProtocolError::TypeConstraintViolation => "TypeConstraintViolation",
            ProtocolError::GenericError => "GenericError",
            ProtocolError::NotImplemented => "NotImplemented",
            ProtocolError::NotSupported => "NotSupported",
        }
    }
}

impl ProtocolError {
    /// Codes outside the 1.6 set are read as `GenericError`.
    pub fn from_wire(code: &str) -> Self {
        serde_json::from_value(serde_json::Value::from(code)).unwrap_or(ProtocolError::GenericError)
    }
}

impl std::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
