pub(crate) mod config_source;
pub(crate) mod websocket;
