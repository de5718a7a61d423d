//! Purpose: Provide the HTTP/JSON cart document endpoint.
//! Exports: `ServeConfig`, `serve`.
//! Role: Axum-based loopback server; the whole document is the unit of storage.
//! Invariants: `PUT /cart` overwrites the stored document; `GET /cart` returns it verbatim.
//! Invariants: An empty store reads as `{}` so clients share one normalization path.
//! Invariants: Loopback-only unless explicitly allowed.

use axum::Json;
use axum::Router;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde::Serialize;
use serde_json::json;
use std::future::IntoFuture;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tokio::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use cartlite::api::{Error, ErrorKind};

#[derive(Clone, Debug)]
pub struct ServeConfig {
    pub bind: SocketAddr,
    pub store: Option<PathBuf>,
    pub allow_non_loopback: bool,
    pub cors_origins: Vec<String>,
    pub max_body_bytes: u64,
}

struct AppState {
    document: RwLock<serde_json::Value>,
    store: Option<PathBuf>,
}

pub async fn serve(config: ServeConfig) -> Result<(), Error> {
    validate_config(&config)?;

    init_tracing();

    let max_body_bytes: usize = config
        .max_body_bytes
        .try_into()
        .map_err(|_| Error::new(ErrorKind::Usage).with_message("--max-body-bytes is too large"))?;

    let document = match &config.store {
        Some(path) => load_store(path)?,
        None => json!({}),
    };
    let state = Arc::new(AppState {
        document: RwLock::new(document),
        store: config.store,
    });

    let mut app = Router::new()
        .route("/healthz", get(healthz))
        .route("/cart", get(get_cart).put(put_cart))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http());
    if !config.cors_origins.is_empty() {
        app = app.layer(cors_layer(&config.cors_origins)?);
    }
    let app = app.with_state(state);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to bind server")
                .with_source(err)
        })?;
    tracing::info!("serving cart document on http://{}", config.bind);

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = shutdown_rx.await;
        })
        .into_future();
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => {
            result.map_err(|err| {
                Error::new(ErrorKind::Io)
                    .with_message("server failed")
                    .with_source(err)
            })?;
        }
        _ = shutdown_signal() => {
            let _ = shutdown_tx.send(());
            match tokio::time::timeout(Duration::from_secs(10), &mut server).await {
                Ok(result) => result.map_err(|err| {
                    Error::new(ErrorKind::Io)
                        .with_message("server failed")
                        .with_source(err)
                })?,
                Err(_) => {
                    return Err(Error::new(ErrorKind::Io).with_message("server shutdown timed out"));
                }
            }
        }
    };
    Ok(())
}

fn is_loopback(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(addr) => addr.is_loopback(),
        IpAddr::V6(addr) => addr.is_loopback(),
    }
}

fn validate_config(config: &ServeConfig) -> Result<(), Error> {
    if !is_loopback(config.bind.ip()) && !config.allow_non_loopback {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("non-loopback bind requires explicit opt-in")
            .with_hint("Re-run with --allow-non-loopback or use a loopback address."));
    }

    if config.max_body_bytes == 0 {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("--max-body-bytes must be greater than zero")
            .with_hint("Use a positive value like 1048576."));
    }

    for origin in &config.cors_origins {
        if HeaderValue::from_str(origin).is_err() {
            return Err(Error::new(ErrorKind::Usage)
                .with_message(format!("invalid CORS origin: {origin}"))
                .with_hint("Use full origins like http://localhost:3000."));
        }
    }

    Ok(())
}

fn cors_layer(origins: &[String]) -> Result<CorsLayer, Error> {
    let mut values = Vec::with_capacity(origins.len());
    for origin in origins {
        let value = HeaderValue::from_str(origin).map_err(|_| {
            Error::new(ErrorKind::Usage).with_message(format!("invalid CORS origin: {origin}"))
        })?;
        values.push(value);
    }
    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(values))
        .allow_methods([Method::GET, Method::PUT])
        .allow_headers([header::CONTENT_TYPE]))
}

fn load_store(path: &Path) -> Result<serde_json::Value, Error> {
    match std::fs::read_to_string(path) {
        Ok(contents) => serde_json::from_str(&contents).map_err(|err| {
            Error::new(ErrorKind::Internal)
                .with_message("store file is not valid json")
                .with_source(err)
        }),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(json!({})),
        Err(err) => Err(Error::new(ErrorKind::Io)
            .with_message("failed to read store file")
            .with_source(err)),
    }
}

fn persist_store(path: &Path, document: &serde_json::Value) -> Result<(), Error> {
    let contents = serde_json::to_string_pretty(document).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("failed to encode store json")
            .with_source(err)
    })?;
    std::fs::write(path, contents).map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to write store file")
            .with_source(err)
    })
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .try_init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        let mut signal = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("install SIGTERM handler");
        signal.recv().await;
    };
    #[cfg(unix)]
    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    #[cfg(not(unix))]
    ctrl_c.await;
}

#[derive(Debug, Serialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    kind: String,
    message: String,
}

async fn healthz() -> Response {
    json_response(json!({ "ok": true }))
}

async fn get_cart(State(state): State<Arc<AppState>>) -> Response {
    let document = match state.document.read() {
        Ok(document) => document.clone(),
        Err(_) => {
            return error_response(
                Error::new(ErrorKind::Internal).with_message("document lock poisoned"),
            );
        }
    };
    json_response(document)
}

async fn put_cart(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<serde_json::Value>,
) -> Response {
    {
        let mut document = match state.document.write() {
            Ok(document) => document,
            Err(_) => {
                return error_response(
                    Error::new(ErrorKind::Internal).with_message("document lock poisoned"),
                );
            }
        };
        *document = payload.clone();
    }
    if let Some(path) = &state.store {
        if let Err(err) = persist_store(path, &payload) {
            return error_response(err);
        }
    }
    json_response(json!({ "ok": true }))
}

fn json_response(payload: serde_json::Value) -> Response {
    let mut response = Json(payload).into_response();
    response
        .headers_mut()
        .insert("cartlite-version", HeaderValue::from_static("0"));
    response
}

fn error_response(err: Error) -> Response {
    let status = match err.kind() {
        ErrorKind::Usage => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Remote | ErrorKind::Io | ErrorKind::Internal => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    let body = ErrorEnvelope {
        error: ErrorBody {
            kind: format!("{:?}", err.kind()),
            message: err.message().unwrap_or("error").to_string(),
        },
    };
    let mut response = (status, Json(body)).into_response();
    response
        .headers_mut()
        .insert("cartlite-version", HeaderValue::from_static("0"));
    response
}
