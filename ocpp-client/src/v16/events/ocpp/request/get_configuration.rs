use cpsim_core::v16::{
    messages::get_configuration::{GetConfigurationRequest, GetConfigurationResponse},
    protocol_error::ProtocolError,
};

use crate::v16::{
    cp::ChargePoint,
    interfaces::{ConfigSource, Websocket},
};

impl<W: Websocket, C: ConfigSource> ChargePoint<W, C> {
    pub(crate) fn get_configuration_ocpp(
        &self,
        req: GetConfigurationRequest,
    ) -> Result<GetConfigurationResponse, ProtocolError> {
        let keys = req.keys();
        let configs = self.inner.configs.lock();
        if keys.len() > configs.max_keys() {
            return Err(ProtocolError::OccurrenceConstraintViolation);
        }
        let (configuration_key, unknown_key) = if keys.is_empty() {
            (configs.all(), Vec::new())
        } else {
            configs.lookup(keys)
        };
        Ok(GetConfigurationResponse {
            configuration_key: (!configuration_key.is_empty()).then_some(configuration_key),
            unknown_key: (!unknown_key.is_empty()).then_some(unknown_key),
        })
    }
}
