//! Durable snapshot of the persistable slices.
//!
//! The snapshot is a flat JSON object keyed by slice name. Runtime-only
//! fields (attached web contents, presence, load failures, queued trust
//! prompts, update status) are stripped through dedicated snapshot records
//! and reconstructed as empty on load.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use harbor_common::types::{DownloadItem, Server, ServerStyle, ServerUrl};
use harbor_common::{Action, PersistError};

use crate::state::{AppState, CertificatesState, DownloadsState, ServersState, ViewState};
use crate::store::{Store, SubscriptionId};

/// The persistable subset of a [`Server`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct SnapshotServer {
    url: ServerUrl,
    title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    favicon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    style: Option<ServerStyle>,
}

impl From<&Server> for SnapshotServer {
    fn from(server: &Server) -> Self {
        Self {
            url: server.url.clone(),
            title: server.title.clone(),
            last_path: server.last_path.clone(),
            favicon: server.favicon.clone(),
            style: server.style.clone(),
        }
    }
}

impl SnapshotServer {
    fn into_server(self) -> Server {
        let mut server = Server::new(self.url, self.title);
        server.last_path = self.last_path;
        server.favicon = self.favicon;
        server.style = self.style;
        server
    }
}

/// On-disk shape, one key per persisted slice.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    servers: Vec<SnapshotServer>,
    #[serde(default)]
    downloads: Vec<DownloadItem>,
    #[serde(default, rename = "trustedCertificates")]
    trusted_certificates: BTreeMap<String, String>,
    #[serde(default)]
    view: ViewState,
}

impl Snapshot {
    pub fn capture(state: &AppState) -> Self {
        Self {
            servers: state.servers.servers.iter().map(SnapshotServer::from).collect(),
            downloads: state.downloads.items.values().cloned().collect(),
            trusted_certificates: state.certificates.trusted.clone(),
            view: state.view.clone(),
        }
    }

    /// Build the initial canonical state from this snapshot.
    pub fn seed(self) -> AppState {
        AppState {
            servers: ServersState {
                servers: self
                    .servers
                    .into_iter()
                    .map(SnapshotServer::into_server)
                    .collect(),
            },
            downloads: DownloadsState {
                items: self.downloads.into_iter().map(|d| (d.id, d)).collect(),
            },
            certificates: CertificatesState {
                trusted: self.trusted_certificates,
                queued: Vec::new(),
            },
            view: self.view,
            ..Default::default()
        }
    }
}

/// Read the snapshot, treating every failure as "no prior state".
pub fn load(path: &Path) -> AppState {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!(path = %path.display(), "no snapshot yet, starting fresh");
            return AppState::default();
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "snapshot unreadable, starting fresh");
            return AppState::default();
        }
    };

    match serde_json::from_str::<Snapshot>(&contents) {
        Ok(snapshot) => {
            let state = snapshot.seed();
            info!(
                path = %path.display(),
                servers = state.servers.servers.len(),
                downloads = state.downloads.items.len(),
                "snapshot loaded"
            );
            state
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "snapshot corrupt, starting fresh");
            AppState::default()
        }
    }
}

/// Write the persistable slices out.
pub fn save(path: &Path, state: &AppState) -> Result<(), PersistError> {
    let snapshot = Snapshot::capture(state);
    let json = serde_json::to_string_pretty(&snapshot)
        .map_err(|e| PersistError::Encode(e.to_string()))?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, json)?;
    debug!(path = %path.display(), "snapshot written");
    Ok(())
}

/// Does this action change anything the snapshot records?
pub fn is_persistable(action: &Action) -> bool {
    matches!(
        action,
        Action::ServerAdded { .. }
            | Action::ServerRemoved { .. }
            | Action::ServersReordered { .. }
            | Action::ServerTitleChanged { .. }
            | Action::ServerPathChanged { .. }
            | Action::ServerFaviconChanged { .. }
            | Action::ServerStyleChanged { .. }
            | Action::DownloadCreated { .. }
            | Action::DownloadUpdated { .. }
            | Action::DownloadRemoved { .. }
            | Action::DownloadsCleared
            | Action::CertificateTrusted { .. }
            | Action::CertificatesCleared
            | Action::ViewChanged { .. }
            | Action::SideBarToggled { .. }
    )
}

/// Debounced write-back watcher.
///
/// A store listener queues the post-mutation state whenever a persistable
/// action lands; the writer task waits out a quiet period and writes the
/// most recent state it has seen. The channel closing (persister dropped)
/// triggers one final flush.
pub struct Persister {
    tx: mpsc::UnboundedSender<AppState>,
}

impl Persister {
    pub fn spawn(path: PathBuf, debounce: Duration) -> (Self, tokio::task::JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(write_back(path, debounce, rx));
        (Self { tx }, handle)
    }

    /// Subscribe the write-back trigger to a store.
    pub fn attach(&self, store: &mut Store) -> SubscriptionId {
        let tx = self.tx.clone();
        store.subscribe(move |state, envelope| {
            if is_persistable(&envelope.action) {
                let _ = tx.send(state.clone());
            }
        })
    }
}

async fn write_back(path: PathBuf, debounce: Duration, mut rx: mpsc::UnboundedReceiver<AppState>) {
    while let Some(mut state) = rx.recv().await {
        // quiet-period loop: newer states reset the timer and win
        loop {
            tokio::select! {
                _ = tokio::time::sleep(debounce) => break,
                next = rx.recv() => match next {
                    Some(newer) => state = newer,
                    None => break,
                },
            }
        }

        if let Err(e) = save(&path, &state) {
            warn!(path = %path.display(), error = %e, "snapshot save skipped");
        }
    }
}
