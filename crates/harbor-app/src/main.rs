mod cli;
mod config;
mod coordinator;

use std::path::PathBuf;

use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use harbor_ipc::Hub;
use harbor_store::{persist, Persister, Store};

use coordinator::Coordinator;

#[tokio::main]
async fn main() {
    let args = cli::parse();

    // Initialize logging
    let log_directive = args.log_level.as_deref().unwrap_or("harbor=info");
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(
                log_directive
                    .parse()
                    .unwrap_or_else(|_| "harbor=info".parse().unwrap()),
            ),
        )
        .init();

    tracing::info!("Harbor v{} starting...", env!("CARGO_PKG_VERSION"));

    // Load config
    let mut config = config::load_or_default(args.config.as_deref().map(std::path::Path::new));
    if let Some(dir) = args.state_dir {
        config.state_dir = Some(PathBuf::from(dir));
    }

    // Seed the canonical store from the persisted snapshot
    let state_path = config.state_path();
    let store = Store::new(persist::load(&state_path));
    let mut hub = Hub::new(store);

    // Debounced snapshot write-back
    let (persister, persister_task) = Persister::spawn(state_path.clone(), config.save_debounce());
    persister.attach(hub.store_mut());

    // The embedding platform hands its guest event stream in here. The
    // sender stays alive for the lifetime of the process so the routing
    // loop keeps its arm armed even before an embedder attaches.
    let (_platform_tx, platform_rx) = mpsc::unbounded_channel();

    let coordinator = Coordinator::new(hub, config.registry_options(), platform_rx);

    tracing::info!("Entering coordinator loop");
    let hub = coordinator.run().await;

    // Final flush, then let the write-back task drain and exit
    if let Err(e) = persist::save(&state_path, hub.store().state()) {
        tracing::warn!("final snapshot save failed: {e}");
    }
    drop(persister);
    drop(hub);
    let _ = persister_task.await;
    tracing::info!("Shutdown complete");
}
