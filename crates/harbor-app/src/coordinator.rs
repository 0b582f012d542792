//! The coordinating-process routing loop.
//!
//! One task owns the hub and the session registry and routes everything
//! explicitly: platform guest events into the registry, command actions
//! observed on the bus back into the registry, transfer progress into
//! per-item patches. Routing is a single match per source — never
//! dependent on listener registration order.

use tokio::sync::mpsc;
use tracing::info;

use harbor_common::types::DownloadId;
use harbor_common::Action;
use harbor_ipc::Hub;
use harbor_sessions::{GuestEvent, RegistryOptions, SessionRegistry, TransferEvent};

pub struct Coordinator {
    hub: Hub,
    registry: SessionRegistry,
    actions_rx: mpsc::UnboundedReceiver<Action>,
    guest_rx: mpsc::UnboundedReceiver<GuestEvent>,
    transfer_tx: mpsc::UnboundedSender<(DownloadId, TransferEvent)>,
    transfer_rx: mpsc::UnboundedReceiver<(DownloadId, TransferEvent)>,
}

impl Coordinator {
    /// Wire a coordinator around an existing hub. `guest_rx` is the host
    /// platform's event stream.
    pub fn new(
        mut hub: Hub,
        options: RegistryOptions,
        guest_rx: mpsc::UnboundedReceiver<GuestEvent>,
    ) -> Self {
        let (actions_tx, actions_rx) = mpsc::unbounded_channel();
        hub.store_mut().subscribe(move |_, envelope| {
            let _ = actions_tx.send(envelope.action.clone());
        });

        let registry = SessionRegistry::new(hub.handle(), options);
        let (transfer_tx, transfer_rx) = mpsc::unbounded_channel();

        Self {
            hub,
            registry,
            actions_rx,
            guest_rx,
            transfer_tx,
            transfer_rx,
        }
    }

    fn route_action(&mut self, action: &Action) {
        self.registry.on_action(self.hub.store().state(), action);
    }

    fn route_guest_event(&mut self, event: GuestEvent) {
        let intercepted = self
            .registry
            .handle_event(self.hub.store().state(), event);

        // a new transfer: pump its progress stream into the routing loop
        if let Some((id, mut events)) = intercepted {
            let tx = self.transfer_tx.clone();
            tokio::spawn(async move {
                while let Some(event) = events.recv().await {
                    if tx.send((id, event)).is_err() {
                        break;
                    }
                }
            });
        }
    }

    /// Serve until interrupted. Returns the hub so the caller can flush
    /// the final snapshot.
    pub async fn run(mut self) -> Hub {
        info!("coordinator running");
        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("interrupt received, shutting down");
                    break;
                }
                _ = self.hub.tick() => {}
                Some(action) = self.actions_rx.recv() => {
                    self.route_action(&action);
                }
                Some(event) = self.guest_rx.recv() => {
                    self.route_guest_event(event);
                }
                Some((id, event)) = self.transfer_rx.recv() => {
                    self.registry.transfer_event(id, event);
                }
            }
        }

        self.registry.shutdown();
        // apply anything still queued before the final snapshot
        while self.hub.try_tick() {}
        self.hub
    }
}
