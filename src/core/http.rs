//! HTTP endpoint server using Axum

use axum::{
    extract::{Path, Query, Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{error, warn, Level};

use super::commands::{AddOutcome, DeleteOutcome, WatchlistService};
use crate::error::{StoreError, TickError};
use crate::metrics::Metrics;
use crate::signals::{render_quotes, CrossoverEngine};

pub const API_KEY_HEADER: &str = "X-API-Key";
pub const SERVICE_NAME: &str = "emawatch";

#[derive(Clone)]
pub struct AppState {
    pub metrics: Arc<Metrics>,
    pub start_time: Arc<Instant>,
    pub commands: Arc<WatchlistService>,
    pub engine: Arc<CrossoverEngine>,
    pub api_key: Option<Arc<str>>,
}

impl AppState {
    pub fn new(
        metrics: Arc<Metrics>,
        commands: Arc<WatchlistService>,
        engine: Arc<CrossoverEngine>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            metrics,
            start_time: Arc::new(Instant::now()),
            commands,
            engine,
            api_key: api_key.map(Arc::from),
        }
    }
}

/// `degraded` while the most recent tick could not persist the status map.
pub async fn health_check(State(state): State<AppState>) -> Result<Json<Value>, StatusCode> {
    let status = if state.engine.last_tick_failed() {
        "degraded"
    } else {
        "healthy"
    };
    let uptime_seconds = state.start_time.elapsed().as_secs();
    Ok(Json(json!({
        "status": status,
        "tick_in_flight": state.engine.is_running(),
        "uptime_seconds": uptime_seconds,
        "service": SERVICE_NAME
    })))
}

pub async fn metrics_handler(State(state): State<AppState>) -> Result<String, StatusCode> {
    state
        .metrics
        .export()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// Middleware to track HTTP request metrics
async fn metrics_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    state.metrics.http_requests_in_flight.inc();

    let response = next.run(request).await;
    let status = response.status();
    let duration = start.elapsed();

    state.metrics.http_requests_in_flight.dec();

    state.metrics.http_requests_total.inc();
    state
        .metrics
        .http_request_duration_seconds
        .observe(duration.as_secs_f64());

    if status.is_server_error() {
        error!(
            method = %method,
            path = %path,
            status = %status,
            duration_ms = duration.as_millis(),
            "HTTP request error"
        );
    }

    response
}

/// Rejects `/api` requests without the configured `X-API-Key`.
async fn require_api_key(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if let Some(expected) = state.api_key.as_deref() {
        let provided = request
            .headers()
            .get(API_KEY_HEADER)
            .and_then(|value| value.to_str().ok());

        if provided != Some(expected) {
            warn!(path = %request.uri().path(), "Rejected request without valid API key");
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "unauthorized" })),
            )
                .into_response();
        }
    }

    next.run(request).await
}

fn store_failure(e: StoreError) -> StatusCode {
    error!(error = %e, "Store operation failed");
    StatusCode::INTERNAL_SERVER_ERROR
}

#[derive(Debug, Deserialize)]
struct AddTickerRequest {
    ticker: String,
}

#[derive(Debug, Deserialize)]
struct QuoteQuery {
    format: Option<String>,
}

async fn list_watchlist(State(state): State<AppState>) -> Result<Json<Value>, StatusCode> {
    let watchlist = state.commands.list().await.map_err(store_failure)?;
    Ok(Json(json!({ "tickers": watchlist })))
}

async fn add_ticker(
    State(state): State<AppState>,
    Json(request): Json<AddTickerRequest>,
) -> Result<(StatusCode, Json<Value>), StatusCode> {
    let outcome = state
        .commands
        .add_ticker(&request.ticker)
        .await
        .map_err(store_failure)?;

    Ok(match outcome {
        AddOutcome::Added(ticker) => (
            StatusCode::CREATED,
            Json(json!({ "result": "added", "ticker": ticker })),
        ),
        AddOutcome::AlreadyPresent(ticker) => (
            StatusCode::OK,
            Json(json!({ "result": "already_present", "ticker": ticker })),
        ),
        AddOutcome::Invalid(reason) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "result": "invalid", "error": reason })),
        ),
    })
}

async fn delete_ticker(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
) -> Result<Response, StatusCode> {
    let outcome = state
        .commands
        .delete_ticker(&ticker)
        .await
        .map_err(store_failure)?;

    Ok(match outcome {
        DeleteOutcome::Removed(_) => StatusCode::NO_CONTENT.into_response(),
        DeleteOutcome::NotFound => (
            StatusCode::NOT_FOUND,
            Json(json!({ "result": "not_found", "ticker": ticker })),
        )
            .into_response(),
    })
}

/// Snapshot of every fetchable ticker, as JSON or as a grid table.
async fn query_quotes(
    State(state): State<AppState>,
    Query(params): Query<QuoteQuery>,
) -> Result<Response, StatusCode> {
    let as_table = params.format.as_deref() == Some("table");

    let watchlist = state.commands.list().await.map_err(store_failure)?;
    let (quotes, message) = if watchlist.is_empty() {
        (Vec::new(), Some("No tickers found."))
    } else {
        let quotes = state.commands.query_all().await.map_err(store_failure)?;
        let message = quotes
            .is_empty()
            .then_some("No valid data found for the tickers.");
        (quotes, message)
    };

    if as_table {
        let body = match message {
            Some(message) => message.to_string(),
            None => render_quotes(&quotes),
        };
        return Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], body).into_response());
    }

    let mut body = json!({ "quotes": quotes });
    if let Some(message) = message {
        body["message"] = json!(message);
    }
    Ok(Json(body).into_response())
}

async fn get_status(State(state): State<AppState>) -> Result<Json<Value>, StatusCode> {
    let status = state.commands.status().await.map_err(store_failure)?;
    Ok(Json(json!(status)))
}

/// Run a tick outside the schedule.
async fn trigger_tick(State(state): State<AppState>) -> Result<Response, StatusCode> {
    match state.engine.run_tick().await {
        Ok(report) => Ok(Json(report).into_response()),
        Err(TickError::Busy) => Ok((
            StatusCode::CONFLICT,
            Json(json!({ "error": "a tick is already in flight" })),
        )
            .into_response()),
        Err(TickError::Store(e)) => Err(store_failure(e)),
    }
}

pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/watchlist", get(list_watchlist).post(add_ticker))
        .route("/watchlist/{ticker}", delete(delete_ticker))
        .route("/quotes", get(query_quotes))
        .route("/status", get(get_status))
        .route("/ticks", post(trigger_tick))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_api_key,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .nest("/api", api)
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::DEBUG))
                        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                        .on_response(DefaultOnResponse::new().level(Level::DEBUG)),
                )
                .layer(axum::middleware::from_fn_with_state(
                    state.clone(),
                    metrics_middleware,
                ))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
