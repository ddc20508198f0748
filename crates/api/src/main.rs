use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use signals_core::domain::recommendation::InferenceResponse;
use signals_core::domain::snapshot::StructuredSnapshot;
use signals_core::domain::ticker::TickerSymbol;
use signals_core::{SignalError, SignalService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = signals_core::config::Settings::from_env();
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    // No credential, no server.
    let service = match SignalService::from_settings(&settings) {
        Ok(service) => Arc::new(service),
        Err(e) => {
            let err = anyhow::Error::new(e);
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(error = %err, "startup configuration invalid");
            return Err(err);
        }
    };

    let app = router(AppState { service });

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/signals/:ticker", get(get_signals))
        .route("/snapshots/:ticker", get(get_snapshot))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    service: Arc<SignalService>,
}

#[derive(Debug, Deserialize)]
struct SignalsQuery {
    available_funds: Option<f64>,
    as_of_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SnapshotQuery {
    as_of_date: Option<String>,
}

async fn get_signals(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
    Query(query): Query<SignalsQuery>,
) -> Result<Json<InferenceResponse>, ApiError> {
    let as_of_date = resolve_as_of(query.as_of_date.as_deref())?;
    let response = state
        .service
        .get_signals_as_of(&ticker, query.available_funds, as_of_date)
        .await?;
    Ok(Json(response))
}

async fn get_snapshot(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
    Query(query): Query<SnapshotQuery>,
) -> Result<Json<StructuredSnapshot>, ApiError> {
    let ticker = TickerSymbol::parse(&ticker)?;
    let as_of_date = resolve_as_of(query.as_of_date.as_deref())?;
    let snapshot = state.service.snapshot(&ticker, as_of_date).await?;
    Ok(Json(snapshot))
}

fn resolve_as_of(raw: Option<&str>) -> Result<NaiveDate, SignalError> {
    signals_core::time::resolve_as_of_date(raw, chrono::Utc::now())
        .map_err(|e| SignalError::InvalidInput(format!("as_of_date: {e}")))
}

struct ApiError(SignalError);

impl From<SignalError> for ApiError {
    fn from(value: SignalError) -> Self {
        Self(value)
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    kind: &'static str,
    message: String,
}

fn status_for(err: &SignalError) -> StatusCode {
    match err {
        SignalError::InvalidTicker(_) | SignalError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        SignalError::InsufficientHistory { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        SignalError::DataUnavailable { .. }
        | SignalError::UpstreamUnavailable { .. }
        | SignalError::MalformedResponse { .. }
        | SignalError::SchemaViolation { .. } => StatusCode::BAD_GATEWAY,
        SignalError::Configuration(_) | SignalError::Serialization(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            tracing::error!(kind = self.0.kind(), error = %self.0, "request failed");
        }
        if let SignalError::MalformedResponse { raw, .. } = &self.0 {
            tracing::warn!(raw_output = %raw, "model output was not JSON");
        }

        let body = ErrorBody {
            kind: self.0.kind(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

fn init_sentry(settings: &signals_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        if let Ok(mut sig) = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            sig.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
