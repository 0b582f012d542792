//! Request/response layered on the one-way broadcast.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use tokio::sync::oneshot;
use tracing::{debug, trace};

use harbor_common::{Action, CorrelationId, Envelope, IpcError};

/// Tracks outstanding requests and settles each exactly once.
///
/// There is no built-in timeout: a request whose responder never answers
/// stays pending until a matching response is finally observed. Callers
/// needing a bounded wait layer `tokio::time::timeout` on top (see
/// `Replica::invoke_timeout`).
#[derive(Default)]
pub struct Correlator {
    pending: HashMap<CorrelationId, oneshot::Sender<Result<Action, IpcError>>>,
}

impl Correlator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp the envelope as a request with a fresh id and record the
    /// pending entry. The returned receiver settles when a matching
    /// response is observed.
    pub fn begin(
        &mut self,
        envelope: &mut Envelope,
    ) -> oneshot::Receiver<Result<Action, IpcError>> {
        let id = CorrelationId::new();
        envelope.meta.request = true;
        envelope.meta.id = Some(id.clone());

        let (tx, rx) = oneshot::channel();
        self.pending.insert(id, tx);
        rx
    }

    /// Drop a pending entry without settling it (e.g. the request envelope
    /// could not be sent at all).
    pub fn abandon(&mut self, id: &CorrelationId) {
        self.pending.remove(id);
    }

    /// Settle the pending request matching this envelope, if any.
    ///
    /// Returns true iff a pending entry was settled. A second response for
    /// an already-settled id is a silent no-op; the first observed response
    /// wins.
    pub fn observe(&mut self, envelope: &Envelope) -> bool {
        if !envelope.is_response() {
            return false;
        }
        let Some(id) = envelope.meta.id.as_ref() else {
            return false;
        };
        let Some(tx) = self.pending.remove(id) else {
            trace!(id = %id, "response without pending request, ignoring");
            return false;
        };

        let result = if envelope.meta.error {
            let message = match &envelope.action {
                Action::RequestFailed { message } => message.clone(),
                other => format!("request failed: {}", other.name()),
            };
            Err(IpcError::Request(message))
        } else {
            Ok(envelope.action.clone())
        };

        debug!(id = %id, error = envelope.meta.error, "request settled");
        // the caller may have stopped waiting; that is their business
        let _ = tx.send(result);
        true
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

type HandlerFuture = Pin<Box<dyn Future<Output = Result<Action, String>> + Send>>;
type Handler = Box<dyn Fn(Envelope) -> HandlerFuture + Send>;

/// Responder table: one async handler per request wire type.
///
/// Registering a second handler for the same type replaces the first;
/// steady state has exactly one responder per type, and a racing duplicate
/// response elsewhere is absorbed by the correlator's idempotency.
#[derive(Default)]
pub struct Responders {
    handlers: HashMap<&'static str, Handler>,
}

impl Responders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<F, Fut>(&mut self, kind: &'static str, handler: F)
    where
        F: Fn(Envelope) -> Fut + Send + 'static,
        Fut: Future<Output = Result<Action, String>> + Send + 'static,
    {
        self.handlers
            .insert(kind, Box::new(move |envelope| Box::pin(handler(envelope))));
    }

    /// If this is a request we have a handler for, return the correlation
    /// id and the running handler future.
    pub fn accept(&self, envelope: &Envelope) -> Option<(CorrelationId, HandlerFuture)> {
        if !envelope.is_request() {
            return None;
        }
        let id = envelope.meta.id.clone()?;
        let handler = self.handlers.get(envelope.action.name())?;
        Some((id, handler(envelope.clone())))
    }
}

/// Build the response envelope for a finished handler.
pub(crate) fn response_envelope(id: CorrelationId, result: Result<Action, String>) -> Envelope {
    match result {
        Ok(action) => Envelope::response_to(id, action),
        Err(message) => Envelope::error_response_to(id, message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> (Envelope, Correlator, oneshot::Receiver<Result<Action, IpcError>>) {
        let mut correlator = Correlator::new();
        let mut envelope = Envelope::new(Action::ServerUrlResolutionRequested {
            input: "a.test".into(),
        });
        let rx = correlator.begin(&mut envelope);
        (envelope, correlator, rx)
    }

    #[tokio::test]
    async fn resolves_with_the_response_action() {
        let (envelope, mut correlator, rx) = request();
        let id = envelope.meta.id.clone().unwrap();

        let response = Envelope::response_to(id, Action::UpdateNotAvailable);
        assert!(correlator.observe(&response));

        let action = rx.await.unwrap().unwrap();
        assert_eq!(action, Action::UpdateNotAvailable);
        assert_eq!(correlator.pending_count(), 0);
    }

    #[tokio::test]
    async fn rejects_with_the_failure_payload() {
        let (envelope, mut correlator, rx) = request();
        let id = envelope.meta.id.clone().unwrap();

        let response = Envelope::error_response_to(id, "no such host");
        assert!(correlator.observe(&response));

        let err = rx.await.unwrap().unwrap_err();
        assert_eq!(err, IpcError::Request("no such host".into()));
    }

    #[tokio::test]
    async fn duplicate_response_is_a_silent_no_op() {
        let (envelope, mut correlator, rx) = request();
        let id = envelope.meta.id.clone().unwrap();

        let first = Envelope::response_to(id.clone(), Action::UpdateNotAvailable);
        let second = Envelope::error_response_to(id, "late and wrong");
        assert!(correlator.observe(&first));
        assert!(!correlator.observe(&second));

        // the first observed response won
        let action = rx.await.unwrap().unwrap();
        assert_eq!(action, Action::UpdateNotAvailable);
    }

    #[test]
    fn non_responses_are_ignored() {
        let (envelope, mut correlator, _rx) = request();
        assert!(!correlator.observe(&envelope));
        assert!(!correlator.observe(&Envelope::new(Action::UpdateCheckStarted)));
        assert_eq!(correlator.pending_count(), 1);
    }

    #[test]
    fn abandon_reclaims_the_entry() {
        let (envelope, mut correlator, _rx) = request();
        correlator.abandon(envelope.meta.id.as_ref().unwrap());
        assert_eq!(correlator.pending_count(), 0);
    }

    #[tokio::test]
    async fn responders_accept_matching_requests_only() {
        let mut responders = Responders::new();
        responders.insert("server_url_resolution_requested", |_env| async {
            Ok(Action::UpdateNotAvailable)
        });

        let (envelope, _, _rx) = request();
        let (id, future) = responders.accept(&envelope).unwrap();
        assert_eq!(Some(&id), envelope.meta.id.as_ref());
        assert_eq!(future.await.unwrap(), Action::UpdateNotAvailable);

        // same action without request meta is not accepted
        let plain = Envelope::new(Action::ServerUrlResolutionRequested {
            input: "a.test".into(),
        });
        assert!(responders.accept(&plain).is_none());
    }
}
