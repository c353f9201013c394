use std::sync::Arc;

use gatebot_core::{config::Config, lifecycle::ApplicationLifecycle, store::JsonFileStore};

#[tokio::main]
async fn main() -> Result<(), gatebot_core::Error> {
    gatebot_core::logging::init("gatebot");

    let cfg = Arc::new(Config::load()?);
    let store = Arc::new(JsonFileStore::open(cfg.store_file.clone())?);
    let lifecycle = Arc::new(ApplicationLifecycle::new(store));

    gatebot_telegram::router::run_polling(cfg, lifecycle)
        .await
        .map_err(|e| gatebot_core::Error::Transport(format!("telegram bot failed: {e}")))?;

    Ok(())
}
