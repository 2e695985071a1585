use cpsim_core::v16::{
    messages::remote_stop_transaction::{RemoteStopTransactionRequest, RemoteStopTransactionResponse},
    protocol_error::ProtocolError,
    types::{ChargePointStatus, RemoteStartStopStatus},
};

use crate::v16::{
    cp::ChargePoint,
    interfaces::{ConfigSource, Websocket},
};

impl<W: Websocket, C: ConfigSource> ChargePoint<W, C> {
    pub(crate) fn remote_stop_transaction_ocpp(
        &self,
        req: RemoteStopTransactionRequest,
    ) -> Result<RemoteStopTransactionResponse, ProtocolError> {
        let stopped = req.transaction_id.and_then(|transaction_id| {
            self.update_connector(
                |c| c.current_transaction_id == Some(transaction_id),
                |c| c.status = ChargePointStatus::Finishing,
            )
        });

        let status = match stopped {
            Some(_) => RemoteStartStopStatus::Accepted,
            None => RemoteStartStopStatus::Rejected,
        };
        Ok(RemoteStopTransactionResponse { status })
    }
}
