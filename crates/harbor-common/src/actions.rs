use serde::{Deserialize, Serialize};

use crate::types::{
    Certificate, ClientCertChoice, DownloadId, DownloadItem, DownloadPatch, LoadFailure, Presence,
    Server, ServerStyle, ServerUrl, View, WebContentsId,
};

/// Every state-changing or request/response event in the application.
///
/// This is the `type` + `payload` half of the wire envelope. Reducers match
/// on it with a no-op default arm, so any process can safely ignore events
/// it does not care about; wire types from a newer peer deserialize to
/// [`Action::Unknown`] and fall through the same way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Action {
    // -- Servers --
    #[serde(rename = "server_added")]
    ServerAdded { url: ServerUrl, title: String },

    #[serde(rename = "server_removed")]
    ServerRemoved { url: ServerUrl },

    #[serde(rename = "servers_reordered")]
    ServersReordered { urls: Vec<ServerUrl> },

    #[serde(rename = "server_title_changed")]
    ServerTitleChanged { url: ServerUrl, title: String },

    #[serde(rename = "server_path_changed")]
    ServerPathChanged { url: ServerUrl, path: String },

    #[serde(rename = "server_favicon_changed")]
    ServerFaviconChanged { url: ServerUrl, favicon: String },

    #[serde(rename = "server_style_changed")]
    ServerStyleChanged { url: ServerUrl, style: ServerStyle },

    #[serde(rename = "server_presence_changed")]
    ServerPresenceChanged { url: ServerUrl, presence: Presence },

    #[serde(rename = "server_version_changed")]
    ServerVersionChanged { url: ServerUrl, version: String },

    /// The guest content host for this server has attached.
    #[serde(rename = "server_attached")]
    ServerAttached {
        url: ServerUrl,
        web_contents_id: WebContentsId,
    },

    #[serde(rename = "server_load_failed")]
    ServerLoadFailed { url: ServerUrl, failure: LoadFailure },

    #[serde(rename = "server_load_succeeded")]
    ServerLoadSucceeded { url: ServerUrl },

    /// Manual reload command from the UI; resets the retry counter.
    #[serde(rename = "server_reload_requested")]
    ServerReloadRequested { url: ServerUrl },

    /// Internal countdown firing. Ignored if `attempt` is stale.
    #[serde(rename = "server_reload_due")]
    ServerReloadDue { url: ServerUrl, attempt: u32 },

    // -- View --
    #[serde(rename = "view_changed")]
    ViewChanged { view: View },

    #[serde(rename = "side_bar_toggled")]
    SideBarToggled { visible: bool },

    // -- Downloads --
    #[serde(rename = "download_created")]
    DownloadCreated { item: DownloadItem },

    #[serde(rename = "download_updated")]
    DownloadUpdated {
        id: DownloadId,
        patch: DownloadPatch,
    },

    #[serde(rename = "download_removed")]
    DownloadRemoved { id: DownloadId },

    #[serde(rename = "downloads_cleared")]
    DownloadsCleared,

    #[serde(rename = "download_pause_requested")]
    DownloadPauseRequested { id: DownloadId },

    #[serde(rename = "download_resume_requested")]
    DownloadResumeRequested { id: DownloadId },

    #[serde(rename = "download_cancel_requested")]
    DownloadCancelRequested { id: DownloadId },

    /// Starts a brand-new transfer for the same URL; the old item is
    /// removed, never resumed.
    #[serde(rename = "download_retry_requested")]
    DownloadRetryRequested { id: DownloadId },

    #[serde(rename = "download_remove_requested")]
    DownloadRemoveRequested { id: DownloadId },

    // -- Certificates --
    #[serde(rename = "certificate_trusted")]
    CertificateTrusted { host: String, serialized: String },

    #[serde(rename = "certificates_cleared")]
    CertificatesCleared,

    /// A trust prompt is pending for this fingerprint.
    #[serde(rename = "certificate_error_queued")]
    CertificateErrorQueued {
        fingerprint: String,
        host: String,
        issuer: String,
    },

    /// User decision for a queued trust prompt.
    #[serde(rename = "certificate_decision_made")]
    CertificateDecisionMade { fingerprint: String, trusted: bool },

    // -- Client certificates --
    #[serde(rename = "client_certificate_requested")]
    ClientCertificateRequested {
        request_id: u64,
        certificates: Vec<Certificate>,
    },

    #[serde(rename = "client_certificate_selected")]
    ClientCertificateSelected {
        request_id: u64,
        choice: ClientCertChoice,
    },

    // -- Update --
    #[serde(rename = "update_check_started")]
    UpdateCheckStarted,

    #[serde(rename = "update_available")]
    UpdateAvailable { version: String },

    #[serde(rename = "update_not_available")]
    UpdateNotAvailable,

    #[serde(rename = "update_downloaded")]
    UpdateDownloaded { version: String },

    #[serde(rename = "update_errored")]
    UpdateErrored { message: String },

    // -- Request / response --
    #[serde(rename = "server_url_resolution_requested")]
    ServerUrlResolutionRequested { input: String },

    #[serde(rename = "server_url_resolution_responded")]
    ServerUrlResolutionResponded { server: Server },

    /// Failure payload of an error response (`meta.error`).
    #[serde(rename = "request_failed")]
    RequestFailed { message: String },

    // -- Unknown --
    #[serde(other)]
    Unknown,
}

impl Action {
    /// The wire `type` string, for correlation matching and logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ServerAdded { .. } => "server_added",
            Self::ServerRemoved { .. } => "server_removed",
            Self::ServersReordered { .. } => "servers_reordered",
            Self::ServerTitleChanged { .. } => "server_title_changed",
            Self::ServerPathChanged { .. } => "server_path_changed",
            Self::ServerFaviconChanged { .. } => "server_favicon_changed",
            Self::ServerStyleChanged { .. } => "server_style_changed",
            Self::ServerPresenceChanged { .. } => "server_presence_changed",
            Self::ServerVersionChanged { .. } => "server_version_changed",
            Self::ServerAttached { .. } => "server_attached",
            Self::ServerLoadFailed { .. } => "server_load_failed",
            Self::ServerLoadSucceeded { .. } => "server_load_succeeded",
            Self::ServerReloadRequested { .. } => "server_reload_requested",
            Self::ServerReloadDue { .. } => "server_reload_due",
            Self::ViewChanged { .. } => "view_changed",
            Self::SideBarToggled { .. } => "side_bar_toggled",
            Self::DownloadCreated { .. } => "download_created",
            Self::DownloadUpdated { .. } => "download_updated",
            Self::DownloadRemoved { .. } => "download_removed",
            Self::DownloadsCleared => "downloads_cleared",
            Self::DownloadPauseRequested { .. } => "download_pause_requested",
            Self::DownloadResumeRequested { .. } => "download_resume_requested",
            Self::DownloadCancelRequested { .. } => "download_cancel_requested",
            Self::DownloadRetryRequested { .. } => "download_retry_requested",
            Self::DownloadRemoveRequested { .. } => "download_remove_requested",
            Self::CertificateTrusted { .. } => "certificate_trusted",
            Self::CertificatesCleared => "certificates_cleared",
            Self::CertificateErrorQueued { .. } => "certificate_error_queued",
            Self::CertificateDecisionMade { .. } => "certificate_decision_made",
            Self::ClientCertificateRequested { .. } => "client_certificate_requested",
            Self::ClientCertificateSelected { .. } => "client_certificate_selected",
            Self::UpdateCheckStarted => "update_check_started",
            Self::UpdateAvailable { .. } => "update_available",
            Self::UpdateNotAvailable => "update_not_available",
            Self::UpdateDownloaded { .. } => "update_downloaded",
            Self::UpdateErrored { .. } => "update_errored",
            Self::ServerUrlResolutionRequested { .. } => "server_url_resolution_requested",
            Self::ServerUrlResolutionResponded { .. } => "server_url_resolution_responded",
            Self::RequestFailed { .. } => "request_failed",
            Self::Unknown => "unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_type_and_payload() {
        let action = Action::ServerAdded {
            url: ServerUrl::parse("a.test").unwrap(),
            title: "A".into(),
        };
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["type"], "server_added");
        assert_eq!(json["payload"]["url"], "https://a.test");
        assert_eq!(json["payload"]["title"], "A");
    }

    #[test]
    fn unit_variant_has_no_payload() {
        let json = serde_json::to_value(Action::DownloadsCleared).unwrap();
        assert_eq!(json["type"], "downloads_cleared");
        assert!(json.get("payload").is_none());
    }

    #[test]
    fn round_trips() {
        let action = Action::DownloadUpdated {
            id: DownloadId(7),
            patch: DownloadPatch {
                received_bytes: Some(10),
                ..Default::default()
            },
        };
        let json = serde_json::to_string(&action).unwrap();
        let back: Action = serde_json::from_str(&json).unwrap();
        assert_eq!(action, back);
    }

    #[test]
    fn unknown_wire_type_deserializes_to_unknown() {
        let json = r#"{"type":"some_future_event","payload":{"x":1}}"#;
        let action: Action = serde_json::from_str(json).unwrap();
        assert_eq!(action, Action::Unknown);
    }

    #[test]
    fn name_matches_wire_type() {
        let action = Action::CertificateDecisionMade {
            fingerprint: "ab:cd".into(),
            trusted: true,
        };
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["type"], action.name());
    }

    #[test]
    fn name_matches_wire_type_for_unit_variants() {
        for action in [
            Action::DownloadsCleared,
            Action::CertificatesCleared,
            Action::UpdateCheckStarted,
            Action::UpdateNotAvailable,
        ] {
            let json = serde_json::to_value(&action).unwrap();
            assert_eq!(json["type"], action.name());
        }
    }
}
