//! Read-only monitoring API
//!
//! Exposes the engine's summary snapshot over HTTP. Handlers only take
//! the engine lock long enough to copy the snapshot out.

use crate::paper::{PaperEngine, Position, Summary, TradeLog};
use axum::{extract::State, response::Json, routing::get, Router};
use parking_lot::Mutex;
use std::sync::Arc;

/// Engine handle shared between the driver and the dashboard
pub type SharedEngine<L> = Arc<Mutex<PaperEngine<L>>>;

/// Health check
async fn health_check() -> &'static str {
    "OK"
}

/// Stats, derived rates and the open position
async fn get_summary<L: TradeLog + 'static>(
    State(engine): State<SharedEngine<L>>,
) -> Json<Summary> {
    Json(engine.lock().get_summary())
}

/// Open position only
async fn get_position<L: TradeLog + 'static>(
    State(engine): State<SharedEngine<L>>,
) -> Json<Option<Position>> {
    Json(engine.lock().position().cloned())
}

/// Create dashboard router
pub fn create_router<L: TradeLog + 'static>(engine: SharedEngine<L>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/summary", get(get_summary::<L>))
        .route("/position", get(get_position::<L>))
        .with_state(engine)
}

/// Start dashboard server
pub async fn start_dashboard<L: TradeLog + 'static>(
    engine: SharedEngine<L>,
    port: u16,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let app = create_router(engine);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Dashboard server starting on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
