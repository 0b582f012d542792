//! Attach/destroy lifecycle and the flush-vs-clear invariant.

use tracing::{debug, info, warn};

use harbor_common::types::{ServerUrl, View};
use harbor_common::Action;
use harbor_store::AppState;

use crate::platform::{GuestPage, KeyInput, StoragePartition};

use super::{GuestSession, SessionRegistry};

impl SessionRegistry {
    /// `Attaching -> Attached`: record the session and publish the
    /// assigned web contents id.
    pub(super) fn attach(
        &mut self,
        server_url: ServerUrl,
        page: Box<dyn GuestPage>,
        partition: Box<dyn StoragePartition>,
    ) {
        let web_contents_id = page.web_contents_id();

        // at most one active session per server url
        if let Some(mut stale) = self.sessions.remove(&server_url) {
            warn!(server = %server_url, "replacing a session that never reported destruction");
            if let Err(e) = stale.partition.flush() {
                warn!(server = %server_url, error = %e, "stale partition flush failed");
            }
        }

        info!(server = %server_url, id = %web_contents_id, "guest attached");
        self.sessions.insert(
            server_url.clone(),
            GuestSession {
                web_contents_id,
                page,
                partition,
            },
        );
        self.reload_attempts.remove(&server_url);
        self.emit(Action::ServerAttached {
            url: server_url,
            web_contents_id,
        });
    }

    /// `Attached -> Destroyed`.
    ///
    /// The load-bearing invariant: a destroyed session whose server still
    /// exists gets its storage flushed (durable write-back, loses
    /// nothing); a destroyed session whose server was removed gets its
    /// storage cleared (irrecoverable purge).
    pub(super) fn destroyed(&mut self, state: &AppState, server_url: &ServerUrl) {
        let Some(mut session) = self.sessions.remove(server_url) else {
            debug!(server = %server_url, "destroy for unknown session ignored");
            return;
        };
        self.reload_attempts.remove(server_url);

        if state.servers.contains(server_url) {
            debug!(server = %server_url, "guest destroyed, flushing storage");
            if let Err(e) = session.partition.flush() {
                warn!(server = %server_url, error = %e, "partition flush failed");
            }
        } else {
            info!(server = %server_url, "guest destroyed after removal, clearing storage");
            if let Err(e) = session.partition.clear() {
                warn!(server = %server_url, error = %e, "partition clear failed");
            }
        }
    }

    /// The user removed the server; purge its session outright.
    pub(super) fn server_removed(&mut self, server_url: &ServerUrl) {
        self.reload_attempts.remove(server_url);
        let Some(mut session) = self.sessions.remove(server_url) else {
            return;
        };
        info!(server = %server_url, "server removed, clearing storage");
        if let Err(e) = session.partition.clear() {
            warn!(server = %server_url, error = %e, "partition clear failed");
        }
    }

    /// Global shortcuts that must keep working while a guest has focus.
    pub(super) fn before_input(&mut self, state: &AppState, server_url: &ServerUrl, input: &KeyInput) {
        if !input.primary() {
            return;
        }

        // primary+digit selects the nth server
        if let Some(digit) = input.key.chars().next().and_then(|c| c.to_digit(10)) {
            if input.key.len() == 1 && digit >= 1 {
                if let Some(server) = state.servers.servers.get(digit as usize - 1) {
                    self.emit(Action::ViewChanged {
                        view: View::Server(server.url.clone()),
                    });
                }
                return;
            }
        }

        match (input.key.as_str(), input.shift) {
            ("d", true) | ("D", true) => {
                self.emit(Action::ViewChanged {
                    view: View::Downloads,
                });
            }
            ("b", false) => {
                self.emit(Action::SideBarToggled {
                    visible: !state.view.sidebar_visible,
                });
            }
            _ => {
                debug!(server = %server_url, key = %input.key, "guest chord passed through");
            }
        }
    }
}
