mod logging;
mod routes;
mod singleton;
mod state;

use anyhow::Result;
use calendrier_core::config::{BackendKind, Settings};
use tracing::info;

use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let settings = Settings::load()?;

    // Only one process may write a given calendar file
    let _lock = match settings.store.backend {
        BackendKind::File => Some(singleton::acquire_lock(&settings.store.data_path())?),
        BackendKind::Memory => None,
    };

    let state = AppState::new(&settings.store)?;
    let app = routes::app(state);

    let addr = settings.listen_addr()?;
    info!(%addr, backend = ?settings.store.backend, "calendrier-server listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("calendrier-server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Could not listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
