//! In-memory platform fakes shared by the registry tests.

use std::sync::{Arc, Mutex};

use harbor_ipc::Hub;
use harbor_store::Store;

use crate::registry::{RegistryOptions, SessionRegistry};

/// A hub plus a registry wired to it.
pub fn harness() -> (Hub, SessionRegistry) {
    harness_with(RegistryOptions::default())
}

pub fn harness_with(options: RegistryOptions) -> (Hub, SessionRegistry) {
    let hub = Hub::new(Store::default());
    let registry = SessionRegistry::new(hub.handle(), options);
    (hub, registry)
}

/// Apply everything the registry has dispatched so far.
pub fn drain(hub: &mut Hub) {
    while hub.try_tick() {}
}

use harbor_common::types::WebContentsId;
use harbor_common::SessionError;

use crate::platform::{GuestPage, StoragePartition, TransferHandle};

/// Shared log of calls a fake has seen.
pub type CallLog = Arc<Mutex<Vec<String>>>;

pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn calls(log: &CallLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

pub struct FakePage {
    pub id: WebContentsId,
    pub log: CallLog,
}

impl FakePage {
    pub fn new(id: u64, log: CallLog) -> Box<Self> {
        Box::new(Self {
            id: WebContentsId(id),
            log,
        })
    }
}

impl GuestPage for FakePage {
    fn web_contents_id(&self) -> WebContentsId {
        self.id
    }

    fn load_url(&mut self, url: &str) -> Result<(), SessionError> {
        self.log.lock().unwrap().push(format!("load {url}"));
        Ok(())
    }

    fn download_url(&mut self, url: &str) -> Result<(), SessionError> {
        self.log.lock().unwrap().push(format!("download {url}"));
        Ok(())
    }
}

pub struct FakePartition {
    pub log: CallLog,
}

impl FakePartition {
    pub fn new(log: CallLog) -> Box<Self> {
        Box::new(Self { log })
    }
}

impl StoragePartition for FakePartition {
    fn flush(&mut self) -> Result<(), SessionError> {
        self.log.lock().unwrap().push("flush".into());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), SessionError> {
        self.log.lock().unwrap().push("clear".into());
        Ok(())
    }
}

pub struct FakeTransfer {
    pub url: String,
    pub file_name: String,
    pub total: u64,
    pub log: CallLog,
}

impl FakeTransfer {
    pub fn new(url: &str, file_name: &str, total: u64, log: CallLog) -> Box<Self> {
        Box::new(Self {
            url: url.into(),
            file_name: file_name.into(),
            total,
            log,
        })
    }
}

impl TransferHandle for FakeTransfer {
    fn url(&self) -> &str {
        &self.url
    }

    fn file_name(&self) -> &str {
        &self.file_name
    }

    fn mime_type(&self) -> &str {
        "application/octet-stream"
    }

    fn total_bytes(&self) -> u64 {
        self.total
    }

    fn save_path(&self) -> &str {
        "/tmp/harbor-test-download"
    }

    fn pause(&mut self) {
        self.log.lock().unwrap().push("pause".into());
    }

    fn resume(&mut self) {
        self.log.lock().unwrap().push("resume".into());
    }

    fn cancel(&mut self) {
        self.log.lock().unwrap().push("cancel".into());
    }
}
