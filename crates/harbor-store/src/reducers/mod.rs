//! Pure per-slice reducers.
//!
//! Every reducer is `fn(slice, &Envelope) -> slice` with a no-op default
//! arm: unrecognized actions return the input unchanged. Reducers never
//! perform I/O and never panic; effects live in watchers.

mod certificates;
mod downloads;
mod servers;
mod update;
mod view;

use harbor_common::Envelope;

use crate::state::AppState;

/// Apply one envelope across every slice.
pub fn reduce(state: AppState, envelope: &Envelope) -> AppState {
    AppState {
        servers: servers::reduce(state.servers, envelope),
        downloads: downloads::reduce(state.downloads, envelope),
        certificates: certificates::reduce(state.certificates, envelope),
        view: view::reduce(state.view, envelope),
        update: update::reduce(state.update, envelope),
    }
}
