use cpsim_core::v16::{
    messages::change_configuration::{ChangeConfigurationRequest, ChangeConfigurationResponse},
    protocol_error::ProtocolError,
};

use crate::v16::{
    cp::ChargePoint,
    interfaces::{ConfigSource, Websocket},
};

impl<W: Websocket, C: ConfigSource> ChargePoint<W, C> {
    pub(crate) fn change_configuration_ocpp(
        &self,
        req: ChangeConfigurationRequest,
    ) -> Result<ChangeConfigurationResponse, ProtocolError> {
        let status = self.inner.configs.lock().change(&req.key, req.value.clone());
        log::info!("ChangeConfiguration: {}={} -> {:?}", req.key, req.value, status);
        Ok(ChangeConfigurationResponse { status })
    }
}
