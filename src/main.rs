use anyhow::{Context, Result};
use fav_tray::daemon::{self, Daemon, EventBus, Services};
use fav_tray::store::JsonStore;
use fav_tray::{pane, paths, tray};
use std::sync::Arc;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting Favourites Tray...");

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;

    let events = Arc::new(EventBus::new());
    let store = JsonStore::open(paths::store_path()?, events)?;
    let (commands_tx, commands_rx) = daemon::command_channel();

    let services = Services::native(runtime.handle().clone(), commands_tx.clone())?;
    let mut daemon = Daemon::new(store.clone(), services);
    daemon.sync_login_item();

    let _pane = match runtime.block_on(pane::start(store, commands_tx)) {
        Ok(handle) => Some(handle),
        Err(e) => {
            log::warn!("Preferences pane unavailable: {}", e);
            None
        }
    };

    if daemon.take_first_launch()? {
        log::info!("First launch, opening preferences");
        daemon.show_preferences(true);
    }

    log::info!("Favourites Tray started");
    tray::run(daemon, commands_rx)?;

    log::info!("Shutting down");
    runtime.shutdown_background();
    Ok(())
}
