//! Download interception and command routing.

use tracing::{debug, info, warn};

use harbor_common::types::{
    DownloadId, DownloadItem, DownloadPatch, DownloadState, DownloadStatus, ServerUrl,
};
use harbor_common::Action;
use harbor_store::AppState;

use crate::platform::{TransferEvent, TransferHandle};

use super::SessionRegistry;

impl SessionRegistry {
    /// Wall-clock milliseconds, probed forward past any collision. At most
    /// one transfer starts per tick in practice; when two do collide the
    /// allocation fails closed into the next free id instead of
    /// overwriting.
    fn mint_download_id(&self, state: &AppState) -> DownloadId {
        let mut id = DownloadId(chrono::Utc::now().timestamp_millis());
        while self.transfers.contains_key(&id) || state.downloads.items.contains_key(&id) {
            id = id.next();
        }
        id
    }

    /// A new transfer is starting: mint an id, register the handle, and
    /// publish the initial item snapshot.
    pub(super) fn intercept_download(
        &mut self,
        state: &AppState,
        server_url: &ServerUrl,
        handle: Box<dyn TransferHandle>,
    ) -> DownloadId {
        let id = self.mint_download_id(state);
        let server_title = state
            .servers
            .get(server_url)
            .map(|s| s.title.clone())
            .unwrap_or_else(|| server_url.to_string());

        let item = DownloadItem {
            id,
            state: DownloadState::Progressing,
            status: DownloadStatus::All,
            file_name: handle.file_name().to_string(),
            received_bytes: 0,
            total_bytes: handle.total_bytes(),
            start_time: chrono::Utc::now(),
            end_time: None,
            url: handle.url().to_string(),
            server_url: server_url.clone(),
            server_title,
            mime_type: handle.mime_type().to_string(),
            save_path: handle.save_path().to_string(),
        };

        info!(id = %id, file = %item.file_name, server = %server_url, "download intercepted");
        self.transfers.insert(id, handle);
        self.emit(Action::DownloadCreated { item });
        id
    }

    /// Progress or terminal callback from the platform.
    pub fn transfer_event(&mut self, id: DownloadId, event: TransferEvent) {
        if !self.transfers.contains_key(&id) {
            debug!(id = %id, "event for unregistered transfer ignored");
            return;
        }

        let patch = match event {
            TransferEvent::Progress {
                received_bytes,
                paused,
            } => DownloadPatch {
                state: Some(if paused {
                    DownloadState::Paused
                } else {
                    DownloadState::Progressing
                }),
                status: Some(if paused {
                    DownloadStatus::Paused
                } else {
                    DownloadStatus::All
                }),
                received_bytes: Some(received_bytes),
                ..Default::default()
            },
            TransferEvent::Completed => DownloadPatch {
                state: Some(DownloadState::Completed),
                status: Some(DownloadStatus::All),
                end_time: Some(chrono::Utc::now()),
                ..Default::default()
            },
            TransferEvent::Cancelled => DownloadPatch {
                state: Some(DownloadState::Cancelled),
                status: Some(DownloadStatus::Cancelled),
                end_time: Some(chrono::Utc::now()),
                ..Default::default()
            },
            TransferEvent::Interrupted => DownloadPatch {
                state: Some(DownloadState::Interrupted),
                end_time: Some(chrono::Utc::now()),
                ..Default::default()
            },
        };

        // terminal states unregister the handle
        if patch.state.map(DownloadState::is_terminal).unwrap_or(false) {
            self.transfers.remove(&id);
            info!(id = %id, state = ?patch.state, "transfer finished");
        }

        self.emit(Action::DownloadUpdated { id, patch });
    }

    pub(super) fn pause_download(&mut self, id: DownloadId) {
        match self.transfers.get_mut(&id) {
            Some(handle) => handle.pause(),
            None => warn!(id = %id, "pause for unknown transfer"),
        }
    }

    pub(super) fn resume_download(&mut self, id: DownloadId) {
        match self.transfers.get_mut(&id) {
            Some(handle) => handle.resume(),
            None => warn!(id = %id, "resume for unknown transfer"),
        }
    }

    pub(super) fn cancel_download(&mut self, id: DownloadId) {
        match self.transfers.get_mut(&id) {
            Some(handle) => handle.cancel(),
            None => warn!(id = %id, "cancel for unknown transfer"),
        }
    }

    /// Retry starts a brand-new transfer for the same URL; the old item is
    /// removed and its id is never reused.
    pub(super) fn retry_download(&mut self, state: &AppState, id: DownloadId) {
        let Some(item) = state.downloads.items.get(&id) else {
            warn!(id = %id, "retry for unknown download");
            return;
        };

        if let Some(mut stale) = self.transfers.remove(&id) {
            stale.cancel();
        }
        self.emit(Action::DownloadRemoved { id });

        match self.sessions.get_mut(&item.server_url) {
            Some(session) => {
                info!(id = %id, url = %item.url, "retrying as a new transfer");
                if let Err(e) = session.page.download_url(&item.url) {
                    warn!(id = %id, error = %e, "retry request failed");
                }
            }
            None => warn!(id = %id, server = %item.server_url, "no live session to retry in"),
        }
    }

    pub(super) fn remove_download(&mut self, id: DownloadId) {
        // removing an active item cancels its transfer first
        if let Some(mut handle) = self.transfers.remove(&id) {
            handle.cancel();
        }
        self.emit(Action::DownloadRemoved { id });
    }
}
