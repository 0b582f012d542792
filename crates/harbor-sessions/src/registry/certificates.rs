//! Certificate trust arbitration and client-certificate selection.
//!
//! Both follow the single-flight pattern: concurrent requests for the same
//! key coalesce into one waiter list behind one surfaced prompt, and every
//! waiter resolves identically when the decision lands.

use tokio::sync::oneshot;
use tracing::{debug, info};

use harbor_common::types::{Certificate, ClientCertChoice, ServerUrl};
use harbor_common::Action;
use harbor_store::AppState;

use super::{ClientCertRequest, SessionRegistry, TrustRequest};

impl SessionRegistry {
    /// A TLS error from a guest session.
    ///
    /// The durable trust cache (`host -> serialized certificate`) is
    /// consulted first; a byte-for-byte match auto-approves without a
    /// prompt. Anything else joins (or creates) the single-flight entry
    /// for the fingerprint.
    pub(super) fn certificate_error(
        &mut self,
        state: &AppState,
        server_url: &ServerUrl,
        host: String,
        certificate: Certificate,
        reply: oneshot::Sender<bool>,
    ) {
        if state.certificates.trusted.get(&host) == Some(&certificate.serialized) {
            debug!(server = %server_url, host = %host, "certificate matches trust cache");
            let _ = reply.send(true);
            return;
        }

        if let Some(request) = self.trust_requests.get_mut(&certificate.fingerprint) {
            debug!(
                host = %host,
                fingerprint = %certificate.fingerprint,
                waiters = request.waiters.len() + 1,
                "coalescing concurrent certificate error"
            );
            request.waiters.push(reply);
            return;
        }

        info!(
            server = %server_url,
            host = %host,
            fingerprint = %certificate.fingerprint,
            "certificate error, surfacing trust prompt"
        );
        self.trust_requests.insert(
            certificate.fingerprint.clone(),
            TrustRequest {
                host: host.clone(),
                serialized: certificate.serialized.clone(),
                waiters: vec![reply],
            },
        );
        self.emit(Action::CertificateErrorQueued {
            fingerprint: certificate.fingerprint,
            host,
            issuer: certificate.issuer,
        });
    }

    /// Commit a user decision: cache on trust, then resolve every waiter
    /// with the same boolean, then drop the entry. The only outcomes are
    /// trusted and denied; there is no error outcome.
    pub(super) fn certificate_decided(&mut self, fingerprint: &str, trusted: bool) {
        let Some(request) = self.trust_requests.remove(fingerprint) else {
            debug!(fingerprint = %fingerprint, "decision for unknown trust request ignored");
            return;
        };

        if trusted {
            self.emit(Action::CertificateTrusted {
                host: request.host,
                serialized: request.serialized,
            });
        }

        info!(
            fingerprint = %fingerprint,
            trusted,
            waiters = request.waiters.len(),
            "trust decision committed"
        );
        for waiter in request.waiters {
            // a waiter whose session died in the meantime is fine to miss
            let _ = waiter.send(trusted);
        }
    }

    /// The server asked for a client certificate.
    pub(super) fn client_certificate_requested(
        &mut self,
        server_url: &ServerUrl,
        request_id: u64,
        certificates: Vec<Certificate>,
        reply: oneshot::Sender<ClientCertChoice>,
    ) {
        if let Some(request) = self.client_cert_requests.get_mut(&request_id) {
            request.waiters.push(reply);
            return;
        }

        info!(server = %server_url, request_id, "client certificate selection requested");
        self.client_cert_requests
            .insert(request_id, ClientCertRequest {
                waiters: vec![reply],
            });
        self.emit(Action::ClientCertificateRequested {
            request_id,
            certificates,
        });
    }

    /// Resolution: a chosen certificate, or dismissed.
    pub(super) fn client_certificate_selected(&mut self, request_id: u64, choice: ClientCertChoice) {
        let Some(request) = self.client_cert_requests.remove(&request_id) else {
            debug!(request_id, "selection for unknown request ignored");
            return;
        };
        for waiter in request.waiters {
            let _ = waiter.send(choice.clone());
        }
    }
}
