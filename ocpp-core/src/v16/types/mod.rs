mod authorization_status;
mod charge_point_error_code;
mod charge_point_status;
mod configuration_status;
mod id_tag_info;
mod key_value;
mod location;
mod measurand;
mod meter_value;
mod reading_context;
mod reason;
mod registration_status;
mod remote_start_stop_status;
mod sampled_value;
mod unit_of_measure;

pub use authorization_status::AuthorizationStatus;
pub use charge_point_error_code::ChargePointErrorCode;
pub use charge_point_status::ChargePointStatus;
pub use configuration_status::ConfigurationStatus;
pub use id_tag_info::IdTagInfo;
pub use key_value::KeyValue;
pub use location::Location;
pub use measurand::Measurand;
pub use meter_value::MeterValue;
pub use reading_context::ReadingContext;
pub use reason::Reason;
pub use registration_status::RegistrationStatus;
pub use remote_start_stop_status::RemoteStartStopStatus;
pub use sampled_value::SampledValue;
pub use unit_of_measure::UnitOfMeasure;
