//! Provider RPC endpoint
//!
//! GET  /info           capability advertisement
//! POST /negotiate      contract proposal in, (un)signed contract out
//! PUT  /blocks/:id     store raw block bytes (409 if already stored)
//! GET  /blocks/:id     fetch raw block bytes (404 if absent)
//! PUT  /metadata/:id   create or replace a metadata object
//! POST /cancel         release a contract (403 if not sealed here)

use super::{LocalProvider, ProviderLink};
use crate::error::{ApiError, StorageError};
use crate::model::{Contract, ProviderInfo};
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;

type ProviderState = State<Arc<LocalProvider>>;

/// Error wrapper mapping store errors onto HTTP statuses.
struct ServerError(ApiError);

impl From<ApiError> for ServerError {
    fn from(e: ApiError) -> Self {
        ServerError(e)
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            ApiError::Storage(StorageError::AlreadyExists(_)) => StatusCode::CONFLICT,
            ApiError::Storage(StorageError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Storage(StorageError::InvalidId(_)) => StatusCode::BAD_REQUEST,
            ApiError::InvalidSeal { .. } => StatusCode::FORBIDDEN,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self.0, "provider request failed");
        }
        (status, self.0.to_string()).into_response()
    }
}

async fn info(State(provider): ProviderState) -> Result<Json<ProviderInfo>, ServerError> {
    Ok(Json(provider.info().await?))
}

async fn negotiate(
    State(provider): ProviderState,
    Json(contract): Json<Contract>,
) -> Result<Json<Contract>, ServerError> {
    Ok(Json(provider.negotiate(&contract).await?))
}

async fn store_block(
    State(provider): ProviderState,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<StatusCode, ServerError> {
    tracing::debug!(block_id = %id, size = body.len(), "store block");
    provider.store_block(&id, &body).await?;
    Ok(StatusCode::CREATED)
}

async fn update_block(
    State(provider): ProviderState,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<StatusCode, ServerError> {
    tracing::debug!(block_id = %id, size = body.len(), "update metadata");
    provider.update_block(&id, &body).await?;
    Ok(StatusCode::OK)
}

async fn get_block(
    State(provider): ProviderState,
    Path(id): Path<String>,
) -> Result<Vec<u8>, ServerError> {
    tracing::debug!(block_id = %id, "get block");
    Ok(provider.get_block(&id).await?)
}

async fn cancel(
    State(provider): ProviderState,
    Json(contract): Json<Contract>,
) -> Result<StatusCode, ServerError> {
    provider.cancel(&contract).await?;
    Ok(StatusCode::OK)
}

/// Routes for one local provider. Request bodies are capped at the
/// provider's advertised maximum block size.
pub fn router(provider: Arc<LocalProvider>) -> Router {
    let limit = usize::try_from(provider.provider_info().max_block_size).unwrap_or(usize::MAX);
    Router::new()
        .route("/info", get(info))
        .route("/negotiate", post(negotiate))
        .route("/blocks/:id", put(store_block).get(get_block))
        .route("/metadata/:id", put(update_block))
        .route("/cancel", post(cancel))
        .layer(DefaultBodyLimit::max(limit))
        .with_state(provider)
}

/// Serve `provider` on an already bound listener until the task is dropped.
pub async fn serve_listener(
    listener: TcpListener,
    provider: Arc<LocalProvider>,
) -> std::io::Result<()> {
    axum::serve(listener, router(provider)).await
}

/// Bind `addr` and serve `provider` on it.
pub async fn serve(addr: &str, provider: Arc<LocalProvider>) -> Result<(), ApiError> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(
        addr = %listener.local_addr()?,
        provider = %provider.provider_info().id,
        "starting provider server"
    );
    serve_listener(listener, provider).await?;
    Ok(())
}
