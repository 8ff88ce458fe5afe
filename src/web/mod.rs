//! Local settings panel
//!
//! Runs alongside the Discord bot so operators can edit `settings.json` and
//! watch the log without using slash commands.

mod settings_panel;

use std::net::SocketAddr;
use tracing::info;

pub use settings_panel::{panel_router, PanelState};

/// Serve the panel on `addr` until the process exits
pub async fn start_panel(addr: SocketAddr, state: PanelState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Settings panel listening on http://{}", addr);
    axum::serve(listener, panel_router(state).into_make_service()).await?;
    Ok(())
}
