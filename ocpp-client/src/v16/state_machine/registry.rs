use std::{
    collections::HashMap,
    future::Future,
    pin::Pin,
    task::{Context, Poll},
    time::Instant,
};

use futures::{channel::oneshot, FutureExt};
use serde_json::Value;

use super::{
    call::{CallAction, CallFailure},
    rng::IdGenerator,
};

pub(crate) type CallOutcome = Result<Value, CallFailure>;

struct PendingCall {
    action: CallAction,
    deadline: Instant,
    completion: oneshot::Sender<CallOutcome>,
}

/// Outstanding charge-point-initiated calls keyed by unique id. Removing an
/// entry is the only way to complete it, so each call completes once.
pub(crate) struct CallRegistry {
    ids: IdGenerator,
    pending: HashMap<String, PendingCall>,
}

/// Resolves with the reply payload or the failure recorded by the registry.
/// Dropping the registry completes it as `Cancelled`.
pub struct CallHandle {
    action: CallAction,
    rx: oneshot::Receiver<CallOutcome>,
}

impl Future for CallHandle {
    type Output = CallOutcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let action = self.action;
        match self.rx.poll_unpin(cx) {
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
            Poll::Ready(Err(oneshot::Canceled)) => Poll::Ready(Err(CallFailure::Cancelled { action })),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl CallRegistry {
    pub fn new(ids: IdGenerator) -> Self {
        Self {
            ids,
            pending: HashMap::new(),
        }
    }

    pub fn register(&mut self, action: CallAction, deadline: Instant) -> (String, CallHandle) {
        let unique_id = loop {
            let id = self.ids.next_id();
            if !self.pending.contains_key(&id) {
                break id;
            }
        };
        let (completion, rx) = oneshot::channel();
        self.pending.insert(
            unique_id.clone(),
            PendingCall {
                action,
                deadline,
                completion,
            },
        );
        log::trace!("registered {} {}", action, unique_id);
        (unique_id, CallHandle { action, rx })
    }

    pub fn resolve(&mut self, unique_id: &str, payload: Value) -> Option<CallAction> {
        self.complete(unique_id, |_| Ok(payload))
    }

    pub fn reject(
        &mut self,
        unique_id: &str,
        failure: impl FnOnce(CallAction) -> CallFailure,
    ) -> Option<CallAction> {
        self.complete(unique_id, |action| Err(failure(action)))
    }

    fn complete(
        &mut self,
        unique_id: &str,
        outcome: impl FnOnce(CallAction) -> CallOutcome,
    ) -> Option<CallAction> {
        let call = self.pending.remove(unique_id)?;
        // the caller may have stopped waiting
        let _ = call.completion.send(outcome(call.action));
        Some(call.action)
    }

    /// Completes every call whose deadline is at or before `now` with `Timeout`.
    pub fn expire(&mut self, now: Instant) -> Vec<(String, CallAction)> {
        let overdue: Vec<String> = self
            .pending
            .iter()
            .filter(|(_, call)| call.deadline <= now)
            .map(|(id, _)| id.clone())
            .collect();
        overdue
            .into_iter()
            .filter_map(|id| {
                let action = self.reject(&id, |action| CallFailure::Timeout { action })?;
                Some((id, action))
            })
            .collect()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().map(|call| call.deadline).min()
    }

    pub fn fail_all(&mut self, failure: impl Fn(CallAction) -> CallFailure) -> usize {
        let drained: Vec<_> = self.pending.drain().collect();
        let count = drained.len();
        for (_, call) in drained {
            let _ = call.completion.send(Err(failure(call.action)));
        }
        count
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }
}
