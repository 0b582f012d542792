//! Main-frame load failure handling: spurious-abort filtering and the
//! capped auto-reload loop.

use tracing::{debug, info, warn};

use harbor_common::types::{LoadFailure, ServerUrl};
use harbor_common::Action;
use harbor_store::AppState;

use super::SessionRegistry;

/// The platform raises this code erroneously on benign navigation aborts
/// (in-page redirects, cancelled provisional loads). A documented quirk,
/// not a real failure.
pub const ERR_ABORTED: i32 = -3;

impl SessionRegistry {
    /// A main-frame load completed; the failure banner (if any) comes down
    /// and the retry counter starts over.
    pub(super) fn load_finished(&mut self, server_url: &ServerUrl) {
        self.reload_attempts.remove(server_url);
        self.emit(Action::ServerLoadSucceeded {
            url: server_url.clone(),
        });
    }

    pub(super) fn load_failed(
        &mut self,
        state: &AppState,
        server_url: ServerUrl,
        error_code: i32,
        description: &str,
        main_frame: bool,
    ) {
        if error_code == ERR_ABORTED {
            debug!(server = %server_url, "spurious abort filtered");
            return;
        }
        if !main_frame {
            debug!(server = %server_url, error_code, "subframe load failure ignored");
            return;
        }
        if !state.servers.contains(&server_url) {
            debug!(server = %server_url, "load failure for unknown server ignored");
            return;
        }

        let attempt = self.reload_attempts.get(&server_url).copied().unwrap_or(0) + 1;
        self.reload_attempts.insert(server_url.clone(), attempt);

        if attempt > self.options.reload_attempt_cap {
            warn!(
                server = %server_url,
                error_code,
                attempt,
                "load failed, retries exhausted"
            );
            self.emit(Action::ServerLoadFailed {
                url: server_url,
                failure: LoadFailure {
                    error_code,
                    description: description.to_string(),
                    retry_in_secs: 0,
                    attempt,
                },
            });
            return;
        }

        let delay = self.options.reload_delay;
        info!(
            server = %server_url,
            error_code,
            attempt,
            retry_in = ?delay,
            "load failed, scheduling reload"
        );
        self.emit(Action::ServerLoadFailed {
            url: server_url.clone(),
            failure: LoadFailure {
                error_code,
                description: description.to_string(),
                retry_in_secs: delay.as_secs(),
                attempt,
            },
        });

        let bus = self.bus.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = bus.dispatch(Action::ServerReloadDue {
                url: server_url,
                attempt,
            });
        });
    }

    /// Countdown fired. Stale firings — superseded by a manual reload or a
    /// successful navigation — are ignored.
    pub(super) fn reload_due(&mut self, state: &AppState, server_url: &ServerUrl, attempt: u32) {
        if self.reload_attempts.get(server_url) != Some(&attempt) {
            debug!(server = %server_url, attempt, "stale reload countdown ignored");
            return;
        }
        self.navigate_home(state, server_url);
    }

    /// Manual "retry now": resets the counter and reloads immediately.
    pub(super) fn reload_now(&mut self, state: &AppState, server_url: &ServerUrl) {
        self.reload_attempts.remove(server_url);
        self.navigate_home(state, server_url);
    }

    fn navigate_home(&mut self, state: &AppState, server_url: &ServerUrl) {
        let Some(server) = state.servers.get(server_url) else {
            debug!(server = %server_url, "reload for unknown server ignored");
            return;
        };
        let Some(session) = self.sessions.get_mut(server_url) else {
            debug!(server = %server_url, "reload without a live session ignored");
            return;
        };
        info!(server = %server_url, "reloading");
        if let Err(e) = session.page.load_url(server.url.as_str()) {
            warn!(server = %server_url, error = %e, "reload navigation failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use crate::fakes::{call_log, calls, drain, harness_with, CallLog, FakePage, FakePartition};
    use crate::platform::GuestEvent;
    use crate::registry::{RegistryOptions, SessionRegistry};
    use harbor_common::types::ServerUrl;
    use harbor_common::{Action, Envelope};
    use harbor_ipc::Hub;

    use super::ERR_ABORTED;

    fn url(s: &str) -> ServerUrl {
        ServerUrl::parse(s).unwrap()
    }

    fn options() -> RegistryOptions {
        RegistryOptions {
            reload_attempt_cap: 2,
            reload_delay: Duration::from_millis(10),
        }
    }

    fn setup() -> (Hub, SessionRegistry, CallLog) {
        let (mut hub, mut registry) = harness_with(options());
        hub.dispatch(Envelope::new(Action::ServerAdded {
            url: url("a.test"),
            title: "A".into(),
        }));
        let log = call_log();
        let state = hub.store().state().clone();
        registry.handle_event(&state, GuestEvent::Attached {
            server_url: url("a.test"),
            page: FakePage::new(1, log.clone()),
            partition: FakePartition::new(call_log()),
        });
        drain(&mut hub);
        (hub, registry, log)
    }

    fn fail(hub: &Hub, registry: &mut SessionRegistry, code: i32, main_frame: bool) {
        let state = hub.store().state().clone();
        registry.handle_event(&state, GuestEvent::LoadFailed {
            server_url: url("a.test"),
            error_code: code,
            description: "ERR_CONNECTION_REFUSED".into(),
            main_frame,
        });
    }

    #[tokio::test]
    async fn spurious_abort_is_filtered() {
        let (mut hub, mut registry, _log) = setup();
        fail(&hub, &mut registry, ERR_ABORTED, true);
        drain(&mut hub);
        assert!(hub.store().state().servers.servers[0].failure.is_none());
    }

    #[tokio::test]
    async fn subframe_failures_are_ignored() {
        let (mut hub, mut registry, _log) = setup();
        fail(&hub, &mut registry, -105, false);
        drain(&mut hub);
        assert!(hub.store().state().servers.servers[0].failure.is_none());
    }

    #[tokio::test]
    async fn genuine_failure_surfaces_a_countdown() {
        let (mut hub, mut registry, _log) = setup();
        fail(&hub, &mut registry, -105, true);
        drain(&mut hub);

        let failure = hub.store().state().servers.servers[0]
            .failure
            .clone()
            .unwrap();
        assert_eq!(failure.error_code, -105);
        assert_eq!(failure.attempt, 1);
        assert_eq!(failure.retry_in_secs, 0); // 10ms rounds down to 0s
    }

    #[tokio::test]
    async fn countdown_fires_a_due_action_and_reloads() {
        let (mut hub, mut registry, log) = setup();

        // observe every envelope the bus applies
        let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let seen_in_listener = Arc::clone(&seen);
        hub.store_mut().subscribe(move |_, envelope| {
            seen_in_listener
                .lock()
                .unwrap()
                .push(envelope.action.name().to_string());
        });

        fail(&hub, &mut registry, -105, true);
        tokio::time::sleep(Duration::from_millis(50)).await;
        drain(&mut hub);
        assert!(seen
            .lock()
            .unwrap()
            .iter()
            .any(|name| name == "server_reload_due"));

        // the coordinator routes the due action back into the registry
        let state = hub.store().state().clone();
        registry.on_action(&state, &Action::ServerReloadDue {
            url: url("a.test"),
            attempt: 1,
        });
        assert_eq!(calls(&log), vec!["load https://a.test"]);
    }

    #[tokio::test]
    async fn stale_countdowns_are_ignored() {
        let (mut hub, mut registry, log) = setup();
        fail(&hub, &mut registry, -105, true);
        drain(&mut hub);

        // a success in between resets the counter
        let state = hub.store().state().clone();
        registry.handle_event(&state, GuestEvent::LoadFinished {
            server_url: url("a.test"),
        });
        drain(&mut hub);

        let state = hub.store().state().clone();
        registry.on_action(&state, &Action::ServerReloadDue {
            url: url("a.test"),
            attempt: 1,
        });
        assert!(calls(&log).is_empty());
        assert!(hub.store().state().servers.servers[0].failure.is_none());
    }

    #[tokio::test]
    async fn retries_cap_out_and_stop_scheduling() {
        let (mut hub, mut registry, _log) = setup();
        for _ in 0..3 {
            fail(&hub, &mut registry, -105, true);
        }
        drain(&mut hub);

        let failure = hub.store().state().servers.servers[0]
            .failure
            .clone()
            .unwrap();
        assert_eq!(failure.attempt, 3);
        assert_eq!(failure.retry_in_secs, 0);
    }

    #[tokio::test]
    async fn manual_reload_resets_the_counter_and_navigates() {
        let (mut hub, mut registry, log) = setup();
        for _ in 0..3 {
            fail(&hub, &mut registry, -105, true);
        }
        drain(&mut hub);

        let state = hub.store().state().clone();
        registry.on_action(&state, &Action::ServerReloadRequested { url: url("a.test") });
        assert_eq!(calls(&log), vec!["load https://a.test"]);

        // the next failure counts from one again
        fail(&hub, &mut registry, -105, true);
        drain(&mut hub);
        assert_eq!(
            hub.store().state().servers.servers[0]
                .failure
                .as_ref()
                .unwrap()
                .attempt,
            1
        );
    }
}
