//! The guest session registry.
//!
//! Owned tables addressed by explicit identity keys: sessions by server
//! url, trust requests by certificate fingerprint, client-certificate
//! requests by platform request id, transfers by download id. No ambient
//! singletons — whoever needs the registry gets handed the registry.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use harbor_common::types::{ClientCertChoice, DownloadId, ServerUrl, WebContentsId};
use harbor_common::Action;
use harbor_ipc::HubHandle;
use harbor_store::AppState;

use crate::platform::{GuestEvent, GuestPage, StoragePartition, TransferEvent, TransferHandle};

mod certificates;
mod downloads;
mod lifecycle;
mod navigation;
pub mod permissions;

/// Tunables. Defaults match the shipped configuration.
#[derive(Debug, Clone)]
pub struct RegistryOptions {
    /// Automatic reloads after a genuine main-frame load failure.
    pub reload_attempt_cap: u32,
    /// Countdown between failure and automatic reload.
    pub reload_delay: Duration,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            reload_attempt_cap: 3,
            reload_delay: Duration::from_secs(5),
        }
    }
}

/// Runtime-only record of one attached guest. At most one per server url.
pub(crate) struct GuestSession {
    pub(crate) web_contents_id: WebContentsId,
    pub(crate) page: Box<dyn GuestPage>,
    pub(crate) partition: Box<dyn StoragePartition>,
}

/// Single-flight trust arbitration for one certificate fingerprint.
pub(crate) struct TrustRequest {
    pub(crate) host: String,
    pub(crate) serialized: String,
    pub(crate) waiters: Vec<oneshot::Sender<bool>>,
}

/// Single-flight client-certificate selection for one platform request.
pub(crate) struct ClientCertRequest {
    pub(crate) waiters: Vec<oneshot::Sender<ClientCertChoice>>,
}

pub struct SessionRegistry {
    pub(crate) bus: HubHandle,
    pub(crate) options: RegistryOptions,
    pub(crate) sessions: HashMap<ServerUrl, GuestSession>,
    pub(crate) trust_requests: HashMap<String, TrustRequest>,
    pub(crate) client_cert_requests: HashMap<u64, ClientCertRequest>,
    pub(crate) transfers: HashMap<DownloadId, Box<dyn TransferHandle>>,
    pub(crate) reload_attempts: HashMap<ServerUrl, u32>,
}

impl SessionRegistry {
    pub fn new(bus: HubHandle, options: RegistryOptions) -> Self {
        Self {
            bus,
            options,
            sessions: HashMap::new(),
            trust_requests: HashMap::new(),
            client_cert_requests: HashMap::new(),
            transfers: HashMap::new(),
            reload_attempts: HashMap::new(),
        }
    }

    pub fn has_session(&self, url: &ServerUrl) -> bool {
        self.sessions.contains_key(url)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn active_transfers(&self) -> usize {
        self.transfers.len()
    }

    pub fn pending_trust_requests(&self) -> usize {
        self.trust_requests.len()
    }

    /// Dispatch an action into the bus. A closed hub only happens during
    /// shutdown, when the outcome no longer matters.
    pub(crate) fn emit(&self, action: Action) {
        if self.bus.dispatch(action).is_err() {
            debug!("bus gone, action dropped");
        }
    }

    /// Route one platform event.
    ///
    /// For `WillDownload` the minted download id and the transfer's event
    /// stream are handed back so the caller can pump progress into
    /// [`SessionRegistry::transfer_event`].
    pub fn handle_event(
        &mut self,
        state: &AppState,
        event: GuestEvent,
    ) -> Option<(DownloadId, mpsc::UnboundedReceiver<TransferEvent>)> {
        match event {
            GuestEvent::Attached {
                server_url,
                page,
                partition,
            } => {
                self.attach(server_url, page, partition);
                None
            }
            GuestEvent::Destroyed { server_url } => {
                self.destroyed(state, &server_url);
                None
            }
            GuestEvent::NavigationStarted { server_url, url } => {
                debug!(server = %server_url, url = %url, "guest navigation started");
                None
            }
            GuestEvent::InPageNavigated { server_url, path } => {
                self.emit(Action::ServerPathChanged {
                    url: server_url,
                    path,
                });
                None
            }
            GuestEvent::LoadFinished { server_url } => {
                self.load_finished(&server_url);
                None
            }
            GuestEvent::LoadFailed {
                server_url,
                error_code,
                description,
                main_frame,
            } => {
                self.load_failed(state, server_url, error_code, &description, main_frame);
                None
            }
            GuestEvent::TitleChanged { server_url, title } => {
                self.emit(Action::ServerTitleChanged {
                    url: server_url,
                    title,
                });
                None
            }
            GuestEvent::FaviconChanged {
                server_url,
                favicon,
            } => {
                self.emit(Action::ServerFaviconChanged {
                    url: server_url,
                    favicon,
                });
                None
            }
            GuestEvent::CertificateError {
                server_url,
                host,
                certificate,
                reply,
            } => {
                self.certificate_error(state, &server_url, host, certificate, reply);
                None
            }
            GuestEvent::ClientCertificateRequested {
                server_url,
                request_id,
                certificates,
                reply,
            } => {
                self.client_certificate_requested(&server_url, request_id, certificates, reply);
                None
            }
            GuestEvent::WillDownload {
                server_url,
                handle,
                events,
            } => {
                let id = self.intercept_download(state, &server_url, handle);
                Some((id, events))
            }
            GuestEvent::PermissionRequested {
                server_url,
                kind,
                reply,
            } => {
                let granted = permissions::is_granted(kind);
                debug!(server = %server_url, ?kind, granted, "permission request");
                let _ = reply.send(granted);
                None
            }
            GuestEvent::BeforeInput { server_url, input } => {
                self.before_input(state, &server_url, &input);
                None
            }
        }
    }

    /// Route one command action observed on the bus. `state` is the
    /// post-reduction canonical state.
    pub fn on_action(&mut self, state: &AppState, action: &Action) {
        match action {
            Action::ServerRemoved { url } => self.server_removed(url),
            Action::ServerReloadRequested { url } => self.reload_now(state, url),
            Action::ServerReloadDue { url, attempt } => self.reload_due(state, url, *attempt),
            Action::DownloadPauseRequested { id } => self.pause_download(*id),
            Action::DownloadResumeRequested { id } => self.resume_download(*id),
            Action::DownloadCancelRequested { id } => self.cancel_download(*id),
            Action::DownloadRetryRequested { id } => self.retry_download(state, *id),
            Action::DownloadRemoveRequested { id } => self.remove_download(*id),
            Action::CertificateDecisionMade {
                fingerprint,
                trusted,
            } => self.certificate_decided(fingerprint, *trusted),
            Action::ClientCertificateSelected { request_id, choice } => {
                self.client_certificate_selected(*request_id, choice.clone())
            }
            _ => {}
        }
    }

    /// Drop every session at shutdown, flushing each partition.
    pub fn shutdown(&mut self) {
        for (url, mut session) in self.sessions.drain() {
            if let Err(e) = session.partition.flush() {
                warn!(server = %url, error = %e, "partition flush failed at shutdown");
            }
        }
    }
}
