pub(crate) mod config;
pub(crate) mod core;

pub(crate) use self::core::ChargePoint;
