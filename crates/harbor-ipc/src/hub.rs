//! Coordinating-process side of the broadcast bus.

use std::collections::HashMap;
use std::future::Future;

use tokio::sync::mpsc;
use tracing::{debug, trace};

use harbor_common::{Action, Envelope, IpcError};
use harbor_store::Store;

use crate::channel::{ChannelId, Handshake, HubHandle, UpMsg};
use crate::correlator::{response_envelope, Correlator, Responders};

/// Owns the canonical store and the table of live dependent channels.
///
/// Every non-local envelope dispatched here is cloned, stamped with local
/// scope, pushed down every registered channel, and then applied to the
/// canonical store exactly once. The channel table is kept accurate by
/// goodbye messages from channel teardown, never by probing: pushing to a
/// channel whose receiver is already gone is a no-op.
pub struct Hub {
    store: Store,
    channels: HashMap<ChannelId, mpsc::UnboundedSender<Envelope>>,
    correlator: Correlator,
    responders: Responders,
    next_channel: u64,
    rx: mpsc::UnboundedReceiver<UpMsg>,
    handle: HubHandle,
}

impl Hub {
    pub fn new(store: Store) -> Self {
        let (up, rx) = mpsc::unbounded_channel();
        Self {
            store,
            channels: HashMap::new(),
            correlator: Correlator::new(),
            responders: Responders::new(),
            next_channel: 0,
            rx,
            handle: HubHandle { up },
        }
    }

    pub fn handle(&self) -> HubHandle {
        self.handle.clone()
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut Store {
        &mut self.store
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn pending_requests(&self) -> usize {
        self.correlator.pending_count()
    }

    /// Register a coordinator-side responder for a request wire type.
    pub fn respond<F, Fut>(&mut self, kind: &'static str, handler: F)
    where
        F: Fn(Envelope) -> Fut + Send + 'static,
        Fut: Future<Output = Result<Action, String>> + Send + 'static,
    {
        self.responders.insert(kind, handler);
    }

    /// Issue a request from the coordinator side. The receiver settles
    /// when a response envelope with the same id is dispatched.
    pub fn request(
        &mut self,
        action: Action,
    ) -> tokio::sync::oneshot::Receiver<Result<Action, IpcError>> {
        let mut envelope = Envelope::new(action);
        let rx = self.correlator.begin(&mut envelope);
        self.dispatch(envelope);
        rx
    }

    /// Authoritative dispatch: forward first (stamped local), then apply
    /// to the canonical store exactly once.
    pub fn dispatch(&mut self, envelope: Envelope) {
        if !envelope.is_local() {
            let mut forwarded = envelope.clone();
            forwarded.mark_local();
            for (id, tx) in &self.channels {
                // a closed receiver means a goodbye is already in flight
                if tx.send(forwarded.clone()).is_err() {
                    trace!(channel = %id, "push to closed channel skipped");
                }
            }
        }

        self.store.dispatch(&envelope);
        self.correlator.observe(&envelope);
        self.run_responder(&envelope);
    }

    fn run_responder(&mut self, envelope: &Envelope) {
        if let Some((id, future)) = self.responders.accept(envelope) {
            let handle = self.handle.clone();
            tokio::spawn(async move {
                let response = response_envelope(id, future.await);
                let _ = handle.dispatch_envelope(response);
            });
        }
    }

    fn register(&mut self, reply: tokio::sync::oneshot::Sender<Handshake>) {
        let id = ChannelId(self.next_channel);
        self.next_channel += 1;

        let (tx, down) = mpsc::unbounded_channel();
        self.channels.insert(id, tx);

        let handshake = Handshake {
            id,
            state: self.store.state().clone(),
            down,
        };
        if reply.send(handshake).is_err() {
            // the connector gave up before the snapshot arrived
            self.channels.remove(&id);
        } else {
            debug!(channel = %id, total = self.channels.len(), "channel registered");
        }
    }

    fn deregister(&mut self, id: ChannelId) {
        if self.channels.remove(&id).is_some() {
            debug!(channel = %id, total = self.channels.len(), "channel deregistered");
        }
    }

    fn process(&mut self, msg: UpMsg) {
        match msg {
            UpMsg::Hello { reply } => self.register(reply),
            UpMsg::Deliver(envelope) => self.dispatch(envelope),
            UpMsg::Goodbye(id) => self.deregister(id),
        }
    }

    /// Process one queued message without waiting. Returns false when the
    /// queue is empty.
    pub fn try_tick(&mut self) -> bool {
        match self.rx.try_recv() {
            Ok(msg) => {
                self.process(msg);
                true
            }
            Err(_) => false,
        }
    }

    /// Process the next message sent up by any handle or channel.
    pub async fn tick(&mut self) {
        // the hub holds its own handle, so the channel never closes
        if let Some(msg) = self.rx.recv().await {
            self.process(msg);
        }
    }

    /// Serve forever. The owning task is expected to be dropped or
    /// aborted at shutdown.
    pub async fn run(mut self) {
        loop {
            self.tick().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harbor_common::types::ServerUrl;

    fn url(s: &str) -> ServerUrl {
        ServerUrl::parse(s).unwrap()
    }

    fn server_added(s: &str) -> Envelope {
        Envelope::new(Action::ServerAdded {
            url: url(s),
            title: s.into(),
        })
    }

    #[tokio::test]
    async fn connect_registers_and_seeds_from_the_snapshot() {
        let mut hub = Hub::new(Store::default());
        hub.dispatch(server_added("a.test"));

        let handle = hub.handle();
        let (channel, _) = tokio::join!(handle.connect(), hub.tick());
        let mut channel = channel.unwrap();

        assert_eq!(hub.channel_count(), 1);
        let state = channel.take_initial_state();
        assert_eq!(state.servers.servers.len(), 1);
    }

    #[tokio::test]
    async fn dispatch_pushes_a_local_stamped_clone_down() {
        let mut hub = Hub::new(Store::default());
        let handle = hub.handle();
        let (channel, _) = tokio::join!(handle.connect(), hub.tick());
        let mut channel = channel.unwrap();

        hub.dispatch(server_added("a.test"));

        let pushed = channel.recv_pushed().await.unwrap();
        assert!(pushed.is_local());
        assert!(matches!(pushed.action, Action::ServerAdded { .. }));
        // applied exactly once on the hub side too
        assert_eq!(hub.store().state().servers.servers.len(), 1);
    }

    #[tokio::test]
    async fn local_scope_envelopes_are_not_forwarded() {
        let mut hub = Hub::new(Store::default());
        let handle = hub.handle();
        let (channel, _) = tokio::join!(handle.connect(), hub.tick());
        let mut channel = channel.unwrap();

        hub.dispatch(Envelope::local(Action::UpdateCheckStarted));
        hub.dispatch(server_added("a.test"));

        // only the non-local envelope comes down
        let pushed = channel.recv_pushed().await.unwrap();
        assert!(matches!(pushed.action, Action::ServerAdded { .. }));
    }

    #[tokio::test]
    async fn goodbye_deregisters_the_channel() {
        let mut hub = Hub::new(Store::default());
        let handle = hub.handle();
        let (channel, _) = tokio::join!(handle.connect(), hub.tick());
        assert_eq!(hub.channel_count(), 1);

        drop(channel.unwrap());
        hub.tick().await;
        assert_eq!(hub.channel_count(), 0);
    }

    #[tokio::test]
    async fn push_to_a_dead_receiver_is_a_no_op() {
        let mut hub = Hub::new(Store::default());
        let handle = hub.handle();
        let (channel, _) = tokio::join!(handle.connect(), hub.tick());
        let mut channel = channel.unwrap();

        // kill the receiving side without processing the goodbye yet
        channel.take_initial_state();
        drop(channel);

        // must not error or panic even though the receiver is gone
        hub.dispatch(server_added("a.test"));
        assert_eq!(hub.store().state().servers.servers.len(), 1);
    }

    #[tokio::test]
    async fn coordinator_side_request_resolves_via_responder() {
        let mut hub = Hub::new(Store::default());
        hub.respond("server_url_resolution_requested", |envelope| async move {
            match envelope.action {
                Action::ServerUrlResolutionRequested { input } => {
                    let url = ServerUrl::parse(&input).map_err(|e| e.to_string())?;
                    let title = url.host().to_string();
                    Ok(Action::ServerUrlResolutionResponded {
                        server: harbor_common::types::Server::new(url, title),
                    })
                }
                _ => Err("wrong request".into()),
            }
        });

        let mut rx = hub.request(Action::ServerUrlResolutionRequested {
            input: "a.test".into(),
        });
        // the spawned responder dispatches the response; tick it in
        hub.tick().await;

        let action = (&mut rx).await.unwrap().unwrap();
        match action {
            Action::ServerUrlResolutionResponded { server } => {
                assert_eq!(server.url, url("a.test"));
                assert_eq!(server.title, "a.test");
            }
            other => panic!("unexpected response: {other:?}"),
        }
        assert_eq!(hub.pending_requests(), 0);
    }
}
