use harbor_common::{Action, Envelope};

use crate::state::{CertificatesState, QueuedCertificate};

pub fn reduce(mut slice: CertificatesState, envelope: &Envelope) -> CertificatesState {
    match &envelope.action {
        Action::CertificateTrusted { host, serialized } => {
            slice.trusted.insert(host.clone(), serialized.clone());
            slice
        }
        Action::CertificatesCleared => {
            slice.trusted.clear();
            slice
        }
        Action::CertificateErrorQueued {
            fingerprint,
            host,
            issuer,
        } => {
            // one prompt per fingerprint; concurrent errors coalesce
            if !slice.queued.iter().any(|q| &q.fingerprint == fingerprint) {
                slice.queued.push(QueuedCertificate {
                    fingerprint: fingerprint.clone(),
                    host: host.clone(),
                    issuer: issuer.clone(),
                });
            }
            slice
        }
        Action::CertificateDecisionMade { fingerprint, .. } => {
            slice.queued.retain(|q| &q.fingerprint != fingerprint);
            slice
        }
        _ => slice,
    }
}
