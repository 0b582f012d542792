pub mod actions;
pub mod envelope;
pub mod errors;
pub mod id;
pub mod types;

pub use actions::Action;
pub use envelope::{Envelope, EnvelopeMeta, Scope};
pub use errors::{ConfigError, HarborError, IpcError, PersistError, SessionError};
pub use id::CorrelationId;
pub use types::{
    Certificate, ClientCertChoice, DownloadId, DownloadItem, DownloadPatch, DownloadState,
    DownloadStatus, LoadFailure, Presence, Server, ServerStyle, ServerUrl, View, WebContentsId,
};

pub type Result<T> = std::result::Result<T, HarborError>;
