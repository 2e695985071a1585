use cpsim_core::v16::{
    messages::{
        remote_start_transaction::{RemoteStartTransactionRequest, RemoteStartTransactionResponse},
        status_notification::StatusNotificationRequest,
    },
    protocol_error::ProtocolError,
    types::{ChargePointStatus, RemoteStartStopStatus},
};

use crate::v16::{
    cp::ChargePoint,
    interfaces::{ConfigSource, Websocket},
    state_machine::connector::Connector,
};

impl<W: Websocket, C: ConfigSource> ChargePoint<W, C> {
    /// `connectorId` 0 or absent selects the first `Available` connector.
    fn get_remote_start_connector(&self, connector_id: Option<usize>) -> Option<usize> {
        let state = self.inner.state.lock();
        let available = |c: &&Connector| c.status == ChargePointStatus::Available;
        match connector_id {
            None | Some(0) => state.connectors.iter().find(available),
            Some(id) => state
                .connectors
                .iter()
                .filter(|c| c.connector_id == id)
                .find(available),
        }
        .map(|c| c.connector_id)
    }

    pub(crate) fn remote_start_transaction_ocpp(
        &self,
        req: RemoteStartTransactionRequest,
    ) -> Result<RemoteStartTransactionResponse, ProtocolError> {
        let id_tag = req.id_tag.filter(|t| !t.is_empty());
        let connector_id = self.get_remote_start_connector(req.connector_id);

        let accepted = match (connector_id, id_tag) {
            (Some(connector_id), Some(id_tag)) => self
                .update_connector(
                    |c| c.connector_id == connector_id && c.status == ChargePointStatus::Available,
                    |c| {
                        c.status = ChargePointStatus::Preparing;
                        c.id_tag = Some(id_tag);
                    },
                )
                .is_some(),
            _ => false,
        };

        let status = if accepted {
            if let Some(connector_id) = connector_id {
                let mut notification =
                    StatusNotificationRequest::new(connector_id, ChargePointStatus::Preparing);
                notification.timestamp = Some(chrono::Utc::now());
                self.inner
                    .state
                    .lock()
                    .pending_status_notifications
                    .push(notification);
            }
            RemoteStartStopStatus::Accepted
        } else {
            RemoteStartStopStatus::Rejected
        };
        Ok(RemoteStartTransactionResponse { status })
    }
}
