use std::time::Instant;

use crate::v16::{
    cp::ChargePoint,
    interfaces::{ConfigSource, Websocket},
};

impl<W: Websocket, C: ConfigSource> ChargePoint<W, C> {
    pub(crate) fn handle_timeout(&self, now: Instant) {
        let expired = self.inner.registry.lock().expire(now);
        for (unique_id, action) in expired {
            log::warn!("Timeout waiting for {} confirmation ({})", action, unique_id);
        }
    }
}
