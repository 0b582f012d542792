//! Seams to the host platform.
//!
//! The registry never talks to a real embedding engine directly; it
//! consumes these traits and the [`GuestEvent`] stream. Each is an opaque
//! event source the registry subscribes to per session, which is also what
//! makes the whole crate testable with in-memory fakes.

use tokio::sync::{mpsc, oneshot};

use harbor_common::types::{Certificate, ClientCertChoice, ServerUrl, WebContentsId};
use harbor_common::SessionError;

/// One guest content host (an isolated, independently-navigating embedded
/// content session representing one server).
pub trait GuestPage: Send {
    fn web_contents_id(&self) -> WebContentsId;

    /// Navigate the main frame.
    fn load_url(&mut self, url: &str) -> Result<(), SessionError>;

    /// Ask the platform to start a file transfer from this session.
    fn download_url(&mut self, url: &str) -> Result<(), SessionError>;
}

/// Per-server cookie/cache/storage backing. Never shared across servers.
pub trait StoragePartition: Send {
    /// Durable write-back; loses nothing.
    fn flush(&mut self) -> Result<(), SessionError>;

    /// Irrecoverable purge. Only for a server the user has removed.
    fn clear(&mut self) -> Result<(), SessionError>;
}

/// Platform handle for one in-flight file transfer.
pub trait TransferHandle: Send {
    fn url(&self) -> &str;
    fn file_name(&self) -> &str;
    fn mime_type(&self) -> &str;
    fn total_bytes(&self) -> u64;
    fn save_path(&self) -> &str;

    fn pause(&mut self);
    fn resume(&mut self);
    fn cancel(&mut self);
}

/// Progress and terminal callbacks for one transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEvent {
    Progress { received_bytes: u64, paused: bool },
    Completed,
    Cancelled,
    Interrupted,
}

/// A permission the guest page is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionKind {
    Notifications,
    Fullscreen,
    Media,
    Geolocation,
    ClipboardRead,
    OpenExternal,
}

/// A key chord seen by a guest before the page handles it, forwarded so
/// global shortcuts keep working while an embedded session has focus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyInput {
    pub key: String,
    pub control: bool,
    pub shift: bool,
    pub alt: bool,
    pub meta: bool,
}

impl KeyInput {
    /// Primary modifier chord (ctrl, or cmd on the mac).
    pub fn primary(&self) -> bool {
        self.control || self.meta
    }
}

/// Everything the platform reports about guest sessions.
pub enum GuestEvent {
    /// A guest content host finished attaching for this server.
    Attached {
        server_url: ServerUrl,
        page: Box<dyn GuestPage>,
        partition: Box<dyn StoragePartition>,
    },
    /// The guest content host is gone (navigation away, crash, or
    /// explicit removal).
    Destroyed { server_url: ServerUrl },
    NavigationStarted { server_url: ServerUrl, url: String },
    InPageNavigated { server_url: ServerUrl, path: String },
    LoadFinished { server_url: ServerUrl },
    LoadFailed {
        server_url: ServerUrl,
        error_code: i32,
        description: String,
        main_frame: bool,
    },
    TitleChanged { server_url: ServerUrl, title: String },
    FaviconChanged { server_url: ServerUrl, favicon: String },
    /// TLS error; `reply` answers whether to proceed.
    CertificateError {
        server_url: ServerUrl,
        host: String,
        certificate: Certificate,
        reply: oneshot::Sender<bool>,
    },
    /// The server asked for a client certificate.
    ClientCertificateRequested {
        server_url: ServerUrl,
        request_id: u64,
        certificates: Vec<Certificate>,
        reply: oneshot::Sender<ClientCertChoice>,
    },
    /// A transfer is starting; `events` delivers its progress callbacks.
    WillDownload {
        server_url: ServerUrl,
        handle: Box<dyn TransferHandle>,
        events: mpsc::UnboundedReceiver<TransferEvent>,
    },
    PermissionRequested {
        server_url: ServerUrl,
        kind: PermissionKind,
        reply: oneshot::Sender<bool>,
    },
    BeforeInput {
        server_url: ServerUrl,
        input: KeyInput,
    },
}
