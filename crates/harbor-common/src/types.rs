//! Core entity types shared by every process.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::SessionError;

/// Identity key of a server: its normalized base URL.
///
/// Normalization is deliberately conservative: trim whitespace, default to
/// `https://` when no scheme is given, strip one trailing slash. Two servers
/// are the same server iff their normalized URLs are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ServerUrl(String);

impl ServerUrl {
    /// Parse user input into a server URL.
    pub fn parse(input: &str) -> Result<Self, SessionError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(SessionError::InvalidUrl(input.to_string()));
        }

        let with_scheme = if trimmed.contains("://") {
            trimmed.to_string()
        } else {
            format!("https://{trimmed}")
        };

        if !with_scheme.starts_with("https://") && !with_scheme.starts_with("http://") {
            return Err(SessionError::InvalidUrl(input.to_string()));
        }

        let host_part = with_scheme.split("://").nth(1).unwrap_or("");
        if host_part.is_empty() || host_part.starts_with('/') {
            return Err(SessionError::InvalidUrl(input.to_string()));
        }

        Ok(Self(with_scheme.trim_end_matches('/').to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Host portion (without scheme, path, or port).
    pub fn host(&self) -> &str {
        let rest = self.0.split("://").nth(1).unwrap_or(&self.0);
        let rest = rest.split('/').next().unwrap_or(rest);
        rest.split(':').next().unwrap_or(rest)
    }
}

impl fmt::Display for ServerUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of an attached guest content host, assigned by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WebContentsId(pub u64);

impl fmt::Display for WebContentsId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "wc-{}", self.0)
    }
}

/// User presence reported by a server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Presence {
    Online,
    Away,
    Busy,
    Offline,
}

/// Sidebar styling pushed by a server.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ServerStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Main-frame load failure surfaced on a server entry while a retry
/// countdown runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadFailure {
    pub error_code: i32,
    pub description: String,
    /// Seconds until the next automatic reload; zero when retries are
    /// exhausted and only a manual reload remains.
    pub retry_in_secs: u64,
    pub attempt: u32,
}

/// One hosted server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    pub url: ServerUrl,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_path: Option<String>,
    /// Populated asynchronously once the guest content host attaches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_contents_id: Option<WebContentsId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favicon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<ServerStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presence: Option<Presence>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<LoadFailure>,
}

impl Server {
    pub fn new(url: ServerUrl, title: impl Into<String>) -> Self {
        Self {
            url,
            title: title.into(),
            last_path: None,
            web_contents_id: None,
            favicon: None,
            style: None,
            presence: None,
            version: None,
            failure: None,
        }
    }
}

/// Identity key of a download: wall-clock milliseconds at interception time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DownloadId(pub i64);

impl DownloadId {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for DownloadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dl-{}", self.0)
    }
}

/// Transfer state reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadState {
    Progressing,
    Paused,
    Completed,
    Cancelled,
    Interrupted,
}

impl DownloadState {
    /// Terminal states never transition again; the transfer handle is
    /// unregistered once one is reached.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Cancelled | Self::Interrupted
        )
    }
}

/// Coarse user-facing status bucket used for filtering the downloads view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DownloadStatus {
    All,
    Paused,
    Cancelled,
}

/// One intercepted file transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadItem {
    pub id: DownloadId,
    pub state: DownloadState,
    pub status: DownloadStatus,
    pub file_name: String,
    pub received_bytes: u64,
    pub total_bytes: u64,
    pub start_time: chrono::DateTime<chrono::Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<chrono::DateTime<chrono::Utc>>,
    pub url: String,
    pub server_url: ServerUrl,
    pub server_title: String,
    pub mime_type: String,
    pub save_path: String,
}

/// Typed partial update for a [`DownloadItem`].
///
/// Only these fields may change after creation; everything else is fixed at
/// interception time.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DownloadPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<DownloadState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<DownloadStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received_bytes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_bytes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub save_path: Option<String>,
}

impl DownloadItem {
    /// Merge a patch into this item. Absent fields are left untouched.
    pub fn apply(&mut self, patch: &DownloadPatch) {
        if let Some(state) = patch.state {
            self.state = state;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(received) = patch.received_bytes {
            self.received_bytes = received;
        }
        if let Some(total) = patch.total_bytes {
            self.total_bytes = total;
        }
        if let Some(end) = patch.end_time {
            self.end_time = Some(end);
        }
        if let Some(ref path) = patch.save_path {
            self.save_path = path.clone();
        }
    }
}

/// A certificate as reported by the platform on a TLS error.
///
/// `serialized` is the platform's opaque encoding; harbor compares it
/// byte-for-byte and never inspects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    pub fingerprint: String,
    pub subject: String,
    pub issuer: String,
    pub serialized: String,
}

/// Outcome of a client-certificate selection prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ClientCertChoice {
    Certificate { fingerprint: String },
    Dismissed,
}

/// What the main window is currently showing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "url", rename_all = "lowercase")]
pub enum View {
    Home,
    Server(ServerUrl),
    Downloads,
}

impl Default for View {
    fn default() -> Self {
        Self::Home
    }
}
