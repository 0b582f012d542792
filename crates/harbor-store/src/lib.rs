//! Canonical application state: slices, pure reducers, and the store.
//!
//! Only the coordinating process's store is authoritative; dependent
//! processes hold replicas that apply the exact same envelopes through the
//! exact same reducers.

pub mod persist;
pub mod reducers;
pub mod state;
pub mod store;

pub use persist::{Persister, Snapshot};
pub use state::{
    AppState, CertificatesState, DownloadsState, QueuedCertificate, ServersState, UpdateStatus,
    ViewState,
};
pub use store::{Store, SubscriptionId};
