mod change_configuration;
mod get_configuration;
mod remote_start_transaction;
mod remote_stop_transaction;
