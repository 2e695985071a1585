pub(crate) mod boot;
pub(crate) mod call;
pub(crate) mod clock;
pub(crate) mod config;
pub(crate) mod connector;
pub(crate) mod registry;
pub(crate) mod rng;
pub(crate) mod scenario;
