use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::auth::AuthTable;
use crate::config::Config;
use crate::http::connection::Connection;
use crate::server::registry::Registry;

pub async fn run(
    cfg: Arc<Config>,
    realms: Arc<AuthTable>,
    registry: Arc<RwLock<Registry>>,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(&cfg.server.listen_addr).await?;
    let local = listener.local_addr()?;
    info!("Listening on {}", local);

    loop {
        let (socket, peer) = listener.accept().await?;
        let local = socket.local_addr().unwrap_or(local);

        let (id, count) = {
            let mut reg = registry.write().await;
            let id = reg.add(peer, local);
            (id, reg.len())
        };
        info!(client = id, clients = count, "Accepted connection from {}", peer);

        let cfg = cfg.clone();
        let realms = realms.clone();
        let reg = registry.clone();

        let task = tokio::spawn(async move {
            let mut conn = Connection::new(socket, peer, cfg, realms);
            if let Err(e) = conn.run().await {
                debug!(client = id, error = %e, "Connection ended with error");
            }
            reg.write().await.remove(id);
        });

        registry.write().await.attach(id, task.abort_handle());
    }
}
