use std::sync::Arc;

use palisade::auth::{AuthTable, SystemDb};
use palisade::config::Config;
use palisade::server::{self, registry::Registry};
use tokio::sync::RwLock;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let cfg = Config::load();
    cfg.validate()?;

    let mut realms = AuthTable::new();
    for cred in &cfg.auth.credentials {
        if !realms.add(&cred.path, &cred.user, &cred.pass, &SystemDb) {
            tracing::warn!(
                path = %cred.path,
                user = %cred.user,
                "Ignoring auth entry without usable credentials"
            );
        }
    }

    let cfg = Arc::new(cfg);
    let realms = Arc::new(realms);
    let registry = Arc::new(RwLock::new(Registry::new()));

    tokio::select! {
        res = server::listener::run(cfg, realms, registry.clone()) => {
            res?;
        }

        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");

            let mut reg = registry.write().await;
            if !reg.is_empty() {
                tracing::info!(clients = reg.len(), "Aborting in-flight connections");
                reg.shutdown_all();
            }
        }
    }

    Ok(())
}
