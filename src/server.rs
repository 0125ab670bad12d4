use std::net::SocketAddr;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use axum::body::{Body, HttpBody};
use axum::extract::rejection::JsonRejection;
use axum::extract::{self, State};
use axum::http::{header, Method, Request, StatusCode, Uri};
use axum::middleware::{self, Next};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Local;
use serde_json::json;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use crate::person::{Person, PersonId, PersonPayload};
use crate::{PhonebookEngine, PhonebookError, Result};

// request bodies larger than this are refused before they reach a handler
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// An HTTP server exposing a [`PhonebookEngine`] as a REST resource.
///
/// The collection lives at `/api/persons` and its members at `/api/persons/{id}`. Besides the
/// resource, the server answers `/info` and `/health`, serves the client bundle from an optional
/// static directory, and answers everything else with a 404 `unknown endpoint` body.
///
/// Every engine call is executed on tokio's blocking pool with its own handle to the engine.
///
pub struct PhonebookServer<E: PhonebookEngine> {
    /// the storage engine to use
    engine: E,
    /// directory holding the built client bundle, if any
    static_dir: Option<PathBuf>,
}

#[derive(Clone)]
struct AppState<E: PhonebookEngine> {
    engine: E,
    static_dir: Option<Arc<PathBuf>>,
}

impl<E: PhonebookEngine> PhonebookServer<E> {
    /// Create a new `PhonebookServer` using the given [`PhonebookEngine`] implementation
    pub fn new(engine: E) -> Self {
        PhonebookServer {
            engine,
            static_dir: None,
        }
    }

    /// serve static files (the client bundle) for GET requests no route matches
    pub fn with_static_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.static_dir = Some(dir.into());
        self
    }

    /// builds the axum [`Router`] with all routes, the fallback and the request logger
    pub fn router(&self) -> Router {
        let state = AppState {
            engine: self.engine.clone(),
            static_dir: self.static_dir.clone().map(Arc::new),
        };

        Router::new()
            .route("/health", get(health))
            .route("/info", get(info_page::<E>))
            .route("/api/persons", get(list_persons::<E>).post(create_person::<E>))
            .route(
                "/api/persons/:id",
                get(get_person::<E>)
                    .put(update_person::<E>)
                    .delete(delete_person::<E>),
            )
            .fallback(fallback::<E>)
            .with_state(state)
            .layer(middleware::from_fn(log_requests))
    }

    /// serves requests arriving on an already bound `listener` until ctrl-c is received
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        info!("Listening on {}", listener.local_addr()?);
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }

    /// binds to the given address and serves requests on it
    ///
    /// # Errors
    /// returns [`PhonebookError::Io`] if the server could not be started
    pub async fn run(self, addr: SocketAddr) -> Result<()> {
        let listener = TcpListener::bind(addr).await?;
        self.serve(listener).await
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutting down");
    }
}

/// runs `job` on the blocking pool with a cloned handle to the engine
async fn with_engine<E, T, F>(engine: &E, job: F) -> Result<T>
where
    E: PhonebookEngine,
    T: Send + 'static,
    F: FnOnce(E) -> Result<T> + Send + 'static,
{
    let engine = engine.clone();
    tokio::task::spawn_blocking(move || job(engine))
        .await
        .map_err(|e| PhonebookError::StringErr(format!("engine task failed: {}", e)))?
}

fn parse_id(raw: &str) -> Result<PersonId> {
    raw.parse()
}

fn parse_payload(payload: std::result::Result<Json<PersonPayload>, JsonRejection>) -> Result<PersonPayload> {
    payload
        .map(|Json(payload)| payload)
        .map_err(|rejection| PhonebookError::Validation(rejection.body_text()))
}

async fn health() -> &'static str {
    "ok"
}

async fn info_page<E: PhonebookEngine>(State(state): State<AppState<E>>) -> Result<Html<String>> {
    let count = with_engine(&state.engine, |engine| engine.count()).await?;
    let now = Local::now().format("%a %b %d %Y %H:%M:%S GMT%z");
    Ok(Html(format!("Phonebook has info for {} people</br>{}", count, now)))
}

async fn list_persons<E: PhonebookEngine>(State(state): State<AppState<E>>) -> Result<Json<Vec<Person>>> {
    let persons = with_engine(&state.engine, |engine| engine.list()).await?;
    Ok(Json(persons))
}

async fn get_person<E: PhonebookEngine>(
    State(state): State<AppState<E>>,
    extract::Path(raw_id): extract::Path<String>,
) -> Result<Json<Person>> {
    let id = parse_id(&raw_id)?;
    match with_engine(&state.engine, move |engine| engine.get(id)).await? {
        Some(person) => Ok(Json(person)),
        None => Err(PhonebookError::NotFound(format!(
            "Information of {} has already been removed from server",
            id
        ))),
    }
}

async fn create_person<E: PhonebookEngine>(
    State(state): State<AppState<E>>,
    payload: std::result::Result<Json<PersonPayload>, JsonRejection>,
) -> Result<Json<Person>> {
    let payload = parse_payload(payload)?;
    let person = with_engine(&state.engine, move |engine| engine.create(payload)).await?;
    Ok(Json(person))
}

async fn update_person<E: PhonebookEngine>(
    State(state): State<AppState<E>>,
    extract::Path(raw_id): extract::Path<String>,
    payload: std::result::Result<Json<PersonPayload>, JsonRejection>,
) -> Result<Json<Person>> {
    let id = parse_id(&raw_id)?;
    let payload = parse_payload(payload)?;
    let name = payload.name.clone().unwrap_or_else(|| id.to_string());
    match with_engine(&state.engine, move |engine| engine.update(id, payload)).await? {
        Some(person) => Ok(Json(person)),
        None => Err(PhonebookError::NotFound(format!(
            "Information of {} has already been removed from server, please refresh the page",
            name
        ))),
    }
}

async fn delete_person<E: PhonebookEngine>(
    State(state): State<AppState<E>>,
    extract::Path(raw_id): extract::Path<String>,
) -> Result<StatusCode> {
    let id = parse_id(&raw_id)?;
    with_engine(&state.engine, move |engine| engine.remove(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// The terminal state of the router: static assets for GET requests, `unknown endpoint` for the
/// rest
async fn fallback<E: PhonebookEngine>(
    State(state): State<AppState<E>>,
    method: Method,
    uri: Uri,
) -> Response {
    if method == Method::GET {
        if let Some(dir) = state.static_dir.as_deref() {
            if let Some(response) = static_file(dir, uri.path()).await {
                return response;
            }
        }
    }
    unknown_endpoint()
}

fn unknown_endpoint() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "unknown endpoint" }))).into_response()
}

/// reads the file `uri_path` names under `dir`, `/` maps to `index.html`.
/// returns `None` if the path escapes `dir` or the file can't be read
async fn static_file(dir: &Path, uri_path: &str) -> Option<Response> {
    let relative = match uri_path.trim_start_matches('/') {
        "" => "index.html",
        path => path,
    };
    let relative = Path::new(relative);
    if !relative.components().all(|c| matches!(c, Component::Normal(_))) {
        return None;
    }

    let path = dir.join(relative);
    let bytes = tokio::fs::read(&path).await.ok()?;
    debug!("serving static file {:?}", path);
    Some(([(header::CONTENT_TYPE, content_type(&path))], bytes).into_response())
}

fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("html") => "text/html; charset=utf-8",
        Some("js") | Some("mjs") => "text/javascript; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("json") => "application/json",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("ico") => "image/x-icon",
        _ => "application/octet-stream",
    }
}

/// logs one line per request: method, url, status, response length, elapsed time and body
async fn log_requests(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let (parts, body) = request.into_parts();
    let method = parts.method.clone();
    let uri = parts.uri.clone();

    let bytes = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            info!("{} {} rejected: {}", method, uri, e);
            return (
                StatusCode::PAYLOAD_TOO_LARGE,
                Json(json!({ "error": "request body too large" })),
            )
                .into_response();
        }
    };
    let logged_body = if bytes.is_empty() {
        "-".to_string()
    } else {
        String::from_utf8_lossy(&bytes).into_owned()
    };

    let response = next.run(Request::from_parts(parts, Body::from(bytes))).await;

    let length = response
        .body()
        .size_hint()
        .exact()
        .map(|len| len.to_string())
        .unwrap_or_else(|| "-".to_string());
    info!(
        "{} {} {} {} - {:.3} ms {}",
        method,
        uri,
        response.status().as_u16(),
        length,
        start.elapsed().as_secs_f64() * 1000.0,
        logged_body
    );
    response
}

/// maps each failure kind onto its status code and body
impl IntoResponse for PhonebookError {
    fn into_response(self) -> Response {
        match self {
            PhonebookError::Validation(message) => {
                debug!("validation failed: {}", message);
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            PhonebookError::MalformedIdentifier(raw) => {
                debug!("malformatted id: {}", raw);
                (StatusCode::BAD_REQUEST, Json(json!({ "error": "malformatted id" }))).into_response()
            }
            PhonebookError::NotFound(message) => (StatusCode::NOT_FOUND, message).into_response(),
            other => {
                error!("{}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "internal server error" })),
                )
                    .into_response()
            }
        }
    }
}
