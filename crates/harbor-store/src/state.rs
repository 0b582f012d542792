//! State slices. Each slice is reduced independently by its own reducer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use harbor_common::types::{DownloadId, DownloadItem, Server, ServerUrl, View};

/// Ordered list of hosted servers. Order is user-controlled (sidebar order).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ServersState {
    pub servers: Vec<Server>,
}

impl ServersState {
    pub fn get(&self, url: &ServerUrl) -> Option<&Server> {
        self.servers.iter().find(|s| &s.url == url)
    }

    pub fn get_mut(&mut self, url: &ServerUrl) -> Option<&mut Server> {
        self.servers.iter_mut().find(|s| &s.url == url)
    }

    pub fn contains(&self, url: &ServerUrl) -> bool {
        self.get(url).is_some()
    }

    pub fn urls(&self) -> impl Iterator<Item = &ServerUrl> {
        self.servers.iter().map(|s| &s.url)
    }
}

/// Intercepted transfers, keyed and iterated by id (ids are time-ordered).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DownloadsState {
    pub items: BTreeMap<DownloadId, DownloadItem>,
}

/// A trust prompt that has been surfaced and not yet decided.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedCertificate {
    pub fingerprint: String,
    pub host: String,
    pub issuer: String,
}

/// Durable trust cache plus the runtime prompt queue.
///
/// `trusted` is persisted (`host -> serialized certificate`); `queued` is
/// runtime-only and never written to the snapshot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CertificatesState {
    pub trusted: BTreeMap<String, String>,
    pub queued: Vec<QueuedCertificate>,
}

/// What the main window shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub view: View,
    pub sidebar_visible: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            view: View::Home,
            sidebar_visible: true,
        }
    }
}

/// Auto-update progress as reported by the external updater.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "lowercase")]
pub enum UpdateStatus {
    #[default]
    Idle,
    Checking,
    Available {
        version: String,
    },
    UpToDate,
    Downloaded {
        version: String,
    },
    Errored {
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UpdateState {
    pub status: UpdateStatus,
}

/// The whole canonical tree.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AppState {
    pub servers: ServersState,
    pub downloads: DownloadsState,
    pub certificates: CertificatesState,
    pub view: ViewState,
    pub update: UpdateState,
}
