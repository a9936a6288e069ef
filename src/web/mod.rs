//! HTTP surface
//!
//! Serves the viewer page, JPEG snapshots of the latest frame, and the
//! control endpoints.

pub mod handlers;
pub mod routes;

pub use routes::create_router;

use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

use crate::error::Result;
use crate::state::AppState;

/// Bind and serve until the task is cancelled. A failed bind (port in
/// use, permission denied) surfaces as an error instead of aborting the
/// process.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> Result<()> {
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("HTTP surface listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::NoopHost;
    use crate::video::{FilterCell, FrameMailbox, PipelineMetrics};

    #[tokio::test]
    async fn occupied_port_surfaces_as_error() {
        let holder = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = holder.local_addr().unwrap();
        let state = AppState::new(
            Arc::new(FilterCell::default()),
            Arc::new(FrameMailbox::new()),
            Arc::new(PipelineMetrics::default()),
            Arc::new(NoopHost),
            85,
        );
        // the port is held, so serve must fail with an error rather
        // than panic or exit the process
        assert!(serve(state, addr).await.is_err());
    }
}
