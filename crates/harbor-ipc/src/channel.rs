//! Connection plumbing between the hub and one dependent process.

use std::fmt;

use tokio::sync::{mpsc, oneshot};

use harbor_common::{Action, Envelope, IpcError};
use harbor_store::AppState;

/// Identifies one dependent-process connection for its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelId(pub(crate) u64);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chan-{}", self.0)
    }
}

/// Messages flowing up into the hub.
pub(crate) enum UpMsg {
    /// A dependent asks for the current full state snapshot; answering it
    /// registers the down-channel.
    Hello {
        reply: oneshot::Sender<Handshake>,
    },
    /// An envelope to dispatch authoritatively.
    Deliver(Envelope),
    /// Connection teardown; deregisters the down-channel.
    Goodbye(ChannelId),
}

pub(crate) struct Handshake {
    pub(crate) id: ChannelId,
    pub(crate) state: AppState,
    pub(crate) down: mpsc::UnboundedReceiver<Envelope>,
}

/// Cloneable client for the hub. Every coordinator-side component that
/// needs to dispatch gets one of these; dependent processes use it once to
/// connect.
#[derive(Clone)]
pub struct HubHandle {
    pub(crate) up: mpsc::UnboundedSender<UpMsg>,
}

impl HubHandle {
    /// Fetch the initial state snapshot and register a down-channel.
    pub async fn connect(&self) -> Result<Channel, IpcError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.up
            .send(UpMsg::Hello { reply: reply_tx })
            .map_err(|_| IpcError::HubClosed)?;
        let handshake = reply_rx.await.map_err(|_| IpcError::HubClosed)?;
        Ok(Channel {
            id: handshake.id,
            initial_state: Some(handshake.state),
            down: handshake.down,
            up: self.up.clone(),
        })
    }

    /// Send an envelope up for authoritative dispatch.
    pub fn dispatch_envelope(&self, envelope: Envelope) -> Result<(), IpcError> {
        self.up
            .send(UpMsg::Deliver(envelope))
            .map_err(|_| IpcError::HubClosed)
    }

    /// Convenience for the common plain-action case.
    pub fn dispatch(&self, action: Action) -> Result<(), IpcError> {
        self.dispatch_envelope(Envelope::new(action))
    }
}

/// One registered dependent-process connection.
///
/// Dropping the channel sends a goodbye, which is what keeps the hub's
/// broadcast table accurate — deregistration is tied to teardown, never to
/// probing.
pub struct Channel {
    id: ChannelId,
    up: mpsc::UnboundedSender<UpMsg>,
    down: mpsc::UnboundedReceiver<Envelope>,
    initial_state: Option<AppState>,
}

impl Channel {
    pub fn id(&self) -> ChannelId {
        self.id
    }

    /// The snapshot that seeded this connection. One-shot.
    pub fn take_initial_state(&mut self) -> AppState {
        self.initial_state.take().unwrap_or_default()
    }

    pub fn send_up(&self, envelope: Envelope) -> Result<(), IpcError> {
        self.up
            .send(UpMsg::Deliver(envelope))
            .map_err(|_| IpcError::HubClosed)
    }

    /// Next envelope pushed down by the hub. `None` when the hub is gone.
    pub async fn recv_pushed(&mut self) -> Option<Envelope> {
        self.down.recv().await
    }
}

impl Drop for Channel {
    fn drop(&mut self) {
        let _ = self.up.send(UpMsg::Goodbye(self.id));
    }
}
