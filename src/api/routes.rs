// =============================================================================
// HTTP Endpoints — Axum 0.7
// =============================================================================
//
//   GET  /        ticker form
//   POST /        form field `ticker` → chart page, or the form plus an error
//   GET  /health  liveness probe (JSON)
//
// The POST handler is the only error boundary of the pipeline: any fetch,
// signal or rendering failure is logged and shown to the user as text; the
// status stays 200 either way.
// =============================================================================

use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::{Form, State},
    response::{Html, IntoResponse},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, info_span, warn, Instrument, Span};
use uuid::Uuid;

use crate::api::templates;
use crate::app_state::AppState;
use crate::chart::{render_chart, ChartImage};
use crate::signals::calculate_signals;
use crate::types::Ticker;

// =============================================================================
// Router construction
// =============================================================================

/// Build the router with request tracing and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index).post(submit))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// Form page
// =============================================================================

#[derive(Debug, Deserialize)]
struct TickerForm {
    /// A missing field is treated like an empty ticker and fails at fetch time.
    #[serde(default)]
    ticker: String,
}

async fn index() -> Html<String> {
    Html(templates::render_index(None))
}

async fn submit(
    State(state): State<Arc<AppState>>,
    Form(form): Form<TickerForm>,
) -> Html<String> {
    let ticker = Ticker::normalize(&form.ticker);
    let request_id = Uuid::new_v4();
    let span = info_span!("chart_request", request_id = %request_id, ticker = %ticker);

    async move {
        match build_chart(&state, &ticker).await {
            Ok(image) => {
                info!(encoded_len = image.as_base64().len(), "chart served");
                Html(templates::render_result(&ticker, &image))
            }
            Err(e) => {
                warn!(error = %format!("{e:#}"), "chart request failed");
                Html(templates::render_index(Some(&e.to_string())))
            }
        }
    }
    .instrument(span)
    .await
}

/// Fetch → signals → render for one ticker.
///
/// Signal calculation and rendering are CPU-bound and run on the blocking
/// pool.
pub async fn build_chart(state: &AppState, ticker: &Ticker) -> anyhow::Result<ChartImage> {
    let series = state.price_source.daily_history(ticker).await?;
    debug!(
        bars = series.len(),
        first = %series.first_date(),
        last = %series.last_date(),
        "price history received"
    );

    let style = state.chart_style();
    let ticker = ticker.clone();
    let span = Span::current();

    tokio::task::spawn_blocking(move || {
        let _entered = span.enter();

        let frame = calculate_signals(&series);
        info!(
            bars = frame.len(),
            buys = frame.buy_points().count(),
            sells = frame.sell_points().count(),
            latest_signal = frame.latest().map(|r| r.signal).unwrap_or(0),
            "crossover signals calculated"
        );

        render_chart(&frame, &ticker, &style)
    })
    .await
    .context("chart rendering task failed")?
}

// =============================================================================
// Health (public)
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    server_time: i64,
}

async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        server_time: chrono::Utc::now().timestamp_millis(),
    })
}
