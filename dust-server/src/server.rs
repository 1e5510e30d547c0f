use crate::config::HostConfig;
use crate::disk_store::{DiskStore, PutOutcome, StoreError};
use axum::{
    Router,
    body::Bytes,
    extract::{Path, State},
    http::{Method, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{any, get},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub struct ServerState {
    pub store: DiskStore,
    pub readonly: bool,
}

pub async fn run_server(config: HostConfig) -> anyhow::Result<()> {
    let store = DiskStore::new(config.data_dir.clone())?;
    tracing::info!(
        "Serving objects from {} (readonly={})",
        store.base_path().display(),
        config.readonly
    );

    let state = Arc::new(ServerState {
        store,
        readonly: config.readonly,
    });

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, router(state)).await?;

    Ok(())
}

pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/*name", any(object_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn health_handler() -> impl IntoResponse {
    StatusCode::OK
}

async fn object_handler(
    State(state): State<Arc<ServerState>>,
    method: Method,
    Path(name): Path<String>,
    body: Bytes,
) -> Response {
    let result = match method {
        Method::PUT | Method::DELETE if state.readonly => {
            return StatusCode::FORBIDDEN.into_response();
        }
        Method::PUT => put_object(&state, &name, body).await,
        Method::GET => get_object(&state, &name).await,
        Method::HEAD => head_object(&state, &name).await,
        Method::DELETE => delete_object(&state, &name).await,
        _ => return StatusCode::METHOD_NOT_ALLOWED.into_response(),
    };

    match result {
        Ok(response) => response,
        Err(StoreError::InvalidName(name)) => {
            tracing::warn!("Rejected {} on invalid name {}", method, name);
            StatusCode::BAD_REQUEST.into_response()
        }
        Err(error) => {
            tracing::error!("Failed to handle {} {}: {}", method, name, error);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn put_object(state: &ServerState, name: &str, body: Bytes) -> Result<Response, StoreError> {
    let status = match state.store.put(name, body).await? {
        PutOutcome::Created => StatusCode::CREATED,
        PutOutcome::Replaced => StatusCode::NO_CONTENT,
    };
    Ok(status.into_response())
}

async fn get_object(state: &ServerState, name: &str) -> Result<Response, StoreError> {
    Ok(match state.store.get(name).await? {
        Some(data) => (StatusCode::OK, data).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    })
}

async fn head_object(state: &ServerState, name: &str) -> Result<Response, StoreError> {
    Ok(match state.store.size(name).await? {
        Some(size) => (StatusCode::OK, [(header::CONTENT_LENGTH, size.to_string())]).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    })
}

async fn delete_object(state: &ServerState, name: &str) -> Result<Response, StoreError> {
    Ok(if state.store.delete(name).await? {
        StatusCode::NO_CONTENT.into_response()
    } else {
        StatusCode::NOT_FOUND.into_response()
    })
}
