use std::path::PathBuf;
use std::time::Duration;

use crate::types::{DownloadId, ServerUrl};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IpcError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("response channel closed before a response arrived")]
    ChannelClosed,

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("hub is gone")]
    HubClosed,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    #[error("not a valid server url: {0:?}")]
    InvalidUrl(String),

    #[error("no guest session for {0}")]
    UnknownServer(ServerUrl),

    #[error("no registered transfer for {0}")]
    UnknownDownload(DownloadId),

    #[error("storage partition error: {0}")]
    Partition(String),

    #[error("guest navigation error: {0}")]
    Navigation(String),
}

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("snapshot io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot encode error: {0}")]
    Encode(String),
}

#[derive(Debug, thiserror::Error)]
pub enum HarborError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Ipc(#[from] IpcError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Persist(#[from] PersistError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}
