//! Guest session lifecycle, isolation, and resource cleanup.
//!
//! One [`registry::SessionRegistry`] in the coordinating process tracks
//! every attached guest content host, arbitrates certificate trust,
//! intercepts downloads, and retries failed main-frame loads. The host
//! platform is consumed through the opaque seams in [`platform`].

pub mod platform;
pub mod registry;

#[cfg(test)]
pub(crate) mod fakes;

pub use platform::{
    GuestEvent, GuestPage, KeyInput, PermissionKind, StoragePartition, TransferEvent,
    TransferHandle,
};
pub use registry::{RegistryOptions, SessionRegistry};
