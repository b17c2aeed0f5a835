//! Local HTTP front end: the embedded web page and its JSON API.
//!
//! Every request takes the same lock, so handlers run one at a time and
//! always see the settings saved by the previous request.

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::State,
    response::Html,
    routing::{get, post},
};
use log::{info, warn};
use serde::Deserialize;
use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

use crate::{
    commands::{Config, Settings},
    mods::{ModService, ModStatus, PathResolver, PrivilegeState, probe_privilege},
    runtime::Runtime,
};

mod response;

pub use response::{ActionResponse, ApiError, status_code};

const INDEX_HTML: &str = include_str!("../../assets/index.html");

struct Current {
    config_path: PathBuf,
    settings: Settings,
}

/// Shared by all handlers.
pub struct AppState<R: Runtime> {
    runtime: R,
    current: Mutex<Current>,
}

impl<R: Runtime> AppState<R> {
    pub fn new(runtime: R, config: Config) -> Self {
        Self {
            runtime,
            current: Mutex::new(Current {
                config_path: config.path,
                settings: config.settings,
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NameRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConfigRequest {
    pub source_root: PathBuf,
    pub target_root: PathBuf,
}

type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

pub fn router<R: Runtime + 'static>(state: Arc<AppState<R>>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/status", get(status::<R>))
        .route("/api/install", post(install::<R>))
        .route("/api/uninstall", post(uninstall::<R>))
        .route("/api/cleanup", post(cleanup::<R>))
        .route("/api/delete", post(delete::<R>))
        .route("/api/privilege", get(privilege::<R>))
        .route("/api/config", get(get_config::<R>).post(set_config::<R>))
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

fn service<'a, R: Runtime>(
    runtime: &'a R,
    settings: &Settings,
) -> std::result::Result<ModService<'a, R>, ApiError> {
    Ok(ModService::open(
        runtime,
        settings.source_root.as_deref(),
        settings.target_root.as_deref(),
    )?)
}

/// Run `f` on the blocking pool while holding the request lock.
async fn locked<R, T, F>(state: Arc<AppState<R>>, f: F) -> std::result::Result<T, ApiError>
where
    R: Runtime + 'static,
    T: Send + 'static,
    F: FnOnce(&R, &mut Current) -> std::result::Result<T, ApiError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut current = state.current.blocking_lock();
        f(&state.runtime, &mut current)
    })
    .await
    .context("Request worker failed")?
}

async fn status<R: Runtime + 'static>(
    State(state): State<Arc<AppState<R>>>,
) -> ApiResult<Vec<ModStatus>> {
    let statuses = locked(state, |runtime, current| {
        Ok(service(runtime, &current.settings)?.statuses()?)
    })
    .await?;
    Ok(Json(statuses))
}

async fn install<R: Runtime + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Json(req): Json<NameRequest>,
) -> ApiResult<ActionResponse> {
    let result = locked(state, move |runtime, current| {
        Ok(service(runtime, &current.settings)?.install(&req.name)?)
    })
    .await?;
    Ok(Json(ActionResponse { result }))
}

async fn uninstall<R: Runtime + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Json(req): Json<NameRequest>,
) -> ApiResult<ActionResponse> {
    let result = locked(state, move |runtime, current| {
        Ok(service(runtime, &current.settings)?.uninstall(&req.name)?)
    })
    .await?;
    Ok(Json(ActionResponse { result }))
}

async fn cleanup<R: Runtime + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Json(req): Json<NameRequest>,
) -> ApiResult<ActionResponse> {
    let result = locked(state, move |runtime, current| {
        Ok(service(runtime, &current.settings)?.cleanup(&req.name)?)
    })
    .await?;
    Ok(Json(ActionResponse { result }))
}

async fn delete<R: Runtime + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Json(req): Json<NameRequest>,
) -> ApiResult<ActionResponse> {
    let result = locked(state, move |runtime, current| {
        Ok(service(runtime, &current.settings)?.delete(&req.name)?)
    })
    .await?;
    Ok(Json(ActionResponse { result }))
}

async fn privilege<R: Runtime + 'static>(
    State(state): State<Arc<AppState<R>>>,
) -> ApiResult<PrivilegeState> {
    let privilege = locked(state, |runtime, _| Ok(probe_privilege(runtime))).await?;
    Ok(Json(privilege))
}

async fn get_config<R: Runtime + 'static>(
    State(state): State<Arc<AppState<R>>>,
) -> Json<Settings> {
    let current = state.current.lock().await;
    Json(current.settings.clone())
}

async fn set_config<R: Runtime + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Json(req): Json<ConfigRequest>,
) -> ApiResult<Settings> {
    let settings = locked(state, move |runtime, current| {
        let roots = PathResolver::new(runtime).validate_roots(
            Some(req.source_root.as_path()),
            Some(req.target_root.as_path()),
        )?;
        let settings = Settings {
            source_root: Some(roots.source),
            target_root: Some(roots.target),
        };
        settings.save(runtime, &current.config_path)?;

        current.settings = settings.clone();
        Ok(settings)
    })
    .await?;
    Ok(Json(settings))
}

/// Bind the listening socket. Port 0 picks a free port.
pub async fn bind(addr: SocketAddr) -> Result<TcpListener> {
    TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to listen on {}", addr))
}

/// Serve requests on `listener` until `shutdown` completes.
pub async fn run<R, F>(listener: TcpListener, state: Arc<AppState<R>>, shutdown: F) -> Result<()>
where
    R: Runtime + 'static,
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .context("Server error")
}

/// Serve on `addr` until Ctrl-C.
pub async fn serve<R: Runtime + 'static>(
    runtime: R,
    config: Config,
    addr: SocketAddr,
) -> Result<()> {
    let listener = bind(addr).await?;
    let local = listener
        .local_addr()
        .context("Failed to read listening address")?;
    info!("Serving on http://{}", local);
    println!("modlink is running at http://{} (Ctrl-C to stop)", local);

    let state = Arc::new(AppState::new(runtime, config));
    run(listener, state, shutdown_signal()).await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Cannot listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
