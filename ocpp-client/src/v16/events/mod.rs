mod ocpp;
mod timeouts;
mod websocket;
