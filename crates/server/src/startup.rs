use std::net::SocketAddr;

use axum::Router;
use configs::{AppConfig, ServerConfig};
use service::{cart::CartService, runtime};
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::errors::StartupError;
use crate::routes;
use crate::state::ServerState;

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

fn bind_addr(server: &ServerConfig) -> Result<SocketAddr, StartupError> {
    format!("{}:{}", server.host, server.port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("server address {}:{}: {e}", server.host, server.port)))
}

/// Connect the store and assemble the router. A store that cannot be reached
/// here is fatal: the service is useless without it.
pub async fn build_app(cfg: &AppConfig) -> Result<Router, StartupError> {
    let store = runtime::open_store(&cfg.store).await?;
    let state = ServerState::new(CartService::new(store, &cfg.cart));
    Ok(routes::build_router(state, build_cors()))
}

/// Serve an already loaded configuration until the listener fails.
pub async fn run_with_config(cfg: AppConfig) -> Result<(), StartupError> {
    let app = build_app(&cfg).await?;

    let addr = bind_addr(&cfg.server)?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| anyhow::anyhow!("cannot bind {addr}: {e}"))?;
    info!(%addr, store = %cfg.store.address, backend = ?cfg.store.backend, "cart service listening");
    axum::serve(listener, app).await.map_err(anyhow::Error::from)?;
    Ok(())
}
