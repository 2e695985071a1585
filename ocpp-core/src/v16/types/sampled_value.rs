use super::{Location, Measurand, ReadingContext, UnitOfMeasure};

#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq)]
pub struct SampledValue {
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<ReadingContext>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measurand: Option<Measurand>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<UnitOfMeasure>,
}

impl SampledValue {
    pub fn energy_wh(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            context: Some(ReadingContext::SamplePeriodic),
            measurand: Some(Measurand::EnergyActiveImportRegister),
            location: None,
            unit: Some(super::UnitOfMeasure::Wh),
        }
    }
}
