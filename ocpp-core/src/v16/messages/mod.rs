pub mod authorize;
pub mod boot_notification;
pub mod change_configuration;
pub mod get_configuration;
pub mod heart_beat;
pub mod meter_values;
pub mod remote_start_transaction;
pub mod remote_stop_transaction;
pub mod start_transaction;
pub mod status_notification;
pub mod stop_transaction;
