//! Dependent-process side: a read replica driven by forwarded envelopes.

use std::future::Future;
use std::time::Duration;

use tracing::trace;

use harbor_common::{Action, Envelope, IpcError};
use harbor_store::{AppState, Store};

use crate::channel::{Channel, HubHandle};
use crate::correlator::{response_envelope, Correlator, Responders};

/// A dependent process's view of the application.
///
/// The replica is never authoritative: envelopes it dispatches without
/// local scope are sent up to the hub instead of applied, and come back
/// down stamped local once the coordinator has applied them. Envelopes
/// pushed down are applied as-is and never re-forwarded.
pub struct Replica {
    store: Store,
    channel: Channel,
    correlator: Correlator,
    responders: Responders,
}

impl Replica {
    /// Connect to the hub and seed the local store from the snapshot.
    pub async fn connect(handle: &HubHandle) -> Result<Self, IpcError> {
        let mut channel = handle.connect().await?;
        let store = Store::new(channel.take_initial_state());
        Ok(Self {
            store,
            channel,
            correlator: Correlator::new(),
            responders: Responders::new(),
        })
    }

    pub fn state(&self) -> &AppState {
        self.store.state()
    }

    /// The local store, for subscribing render listeners.
    pub fn store_mut(&mut self) -> &mut Store {
        &mut self.store
    }

    pub fn pending_requests(&self) -> usize {
        self.correlator.pending_count()
    }

    /// Dispatch from this process. Local scope applies here and nowhere
    /// else; anything else goes up to the coordinator.
    pub fn dispatch(&mut self, envelope: Envelope) -> Result<(), IpcError> {
        if envelope.is_local() {
            self.store.dispatch(&envelope);
            Ok(())
        } else {
            trace!(action = envelope.action.name(), "forwarding dispatch up");
            self.channel.send_up(envelope)
        }
    }

    /// Receive and apply the next pushed-down envelope. Returns the
    /// envelope so callers can react to it; `None` means the hub is gone.
    pub async fn pump(&mut self) -> Option<Envelope> {
        let envelope = self.channel.recv_pushed().await?;
        self.apply_pushed(&envelope).await;
        Some(envelope)
    }

    async fn apply_pushed(&mut self, envelope: &Envelope) {
        // already stamped local by the hub; applying cannot echo upward
        self.store.dispatch(envelope);
        self.correlator.observe(envelope);

        if let Some((id, future)) = self.responders.accept(envelope) {
            let response = response_envelope(id, future.await);
            let _ = self.channel.send_up(response);
        }
    }

    /// Register a responder for a request wire type.
    pub fn handle<F, Fut>(&mut self, kind: &'static str, handler: F)
    where
        F: Fn(Envelope) -> Fut + Send + 'static,
        Fut: Future<Output = Result<Action, String>> + Send + 'static,
    {
        self.responders.insert(kind, handler);
    }

    /// Fire a request without waiting: the returned receiver settles when
    /// a matching response is pushed down (and pumped).
    pub fn request(
        &mut self,
        action: Action,
    ) -> tokio::sync::oneshot::Receiver<Result<Action, IpcError>> {
        let mut envelope = Envelope::new(action);
        let rx = self.correlator.begin(&mut envelope);
        let id = envelope.meta.id.clone().expect("begin stamps an id");
        if self.channel.send_up(envelope).is_err() {
            // hub gone; reclaim the entry so the receiver errors out
            self.correlator.abandon(&id);
        }
        rx
    }

    /// Request and pump until the response arrives.
    ///
    /// No built-in timeout: if no responder ever answers, this waits
    /// forever and the pending entry leaks until a response shows up. Use
    /// [`Replica::invoke_timeout`] for a bounded wait.
    pub async fn invoke(&mut self, action: Action) -> Result<Action, IpcError> {
        let mut rx = self.request(action);
        loop {
            tokio::select! {
                result = &mut rx => {
                    return result.map_err(|_| IpcError::ChannelClosed)?;
                }
                pushed = self.channel.recv_pushed() => match pushed {
                    Some(envelope) => {
                        // inlined pump body; `pump` itself would re-borrow self
                        self.store.dispatch(&envelope);
                        self.correlator.observe(&envelope);
                        if let Some((id, future)) = self.responders.accept(&envelope) {
                            let response = response_envelope(id, future.await);
                            let _ = self.channel.send_up(response);
                        }
                    }
                    None => return Err(IpcError::HubClosed),
                },
            }
        }
    }

    /// [`Replica::invoke`] with an explicit deadline.
    pub async fn invoke_timeout(
        &mut self,
        action: Action,
        deadline: Duration,
    ) -> Result<Action, IpcError> {
        tokio::time::timeout(deadline, self.invoke(action))
            .await
            .map_err(|_| IpcError::Timeout(deadline))?
    }
}
