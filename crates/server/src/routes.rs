//! HTTP routes over a [`Ledger`].

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use http::StatusCode;
use serde::Serialize;
use std::sync::Arc;
use tledger_chain::{Ledger, LedgerError};
use tledger_core::{Namespace, ProposedTransaction};
use tower_http::cors::CorsLayer;
use tracing::warn;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<Ledger>,
}

/// Build the application router.
pub fn router(ledger: Arc<Ledger>) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/ledger/:namespace/transactions", post(propose_transaction))
        .route("/ledger/:namespace/blocks/:block_num", get(get_block))
        .route(
            "/ledger/:namespace/blocks/:block_num/transactions/:tx_number",
            get(get_transaction),
        )
        .route("/ledger/:namespace/stats", get(stats))
        .layer(CorsLayer::permissive())
        .with_state(AppState { ledger })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposeResponse {
    pub block_num: u64,
    pub tx_number: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub namespace: String,
    pub latest_index: Option<u64>,
    pub cached_blocks: usize,
    pub highest_cached_block: Option<u64>,
    pub generation: u64,
}

/// A ledger error rendered as `{ "error": ... }` with a matching status.
pub struct ApiError(LedgerError);

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            LedgerError::StoreUnavailable(_)
            | LedgerError::StoreTimeout(_)
            | LedgerError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
            LedgerError::TooManyRetries { .. } => StatusCode::CONFLICT,
            LedgerError::InvalidNamespace(_) | LedgerError::TransactionOutOfRange { .. } => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(error = %self.0, "request failed");
        }
        let body = serde_json::json!({ "error": self.0.to_string() });
        (status, Json(body)).into_response()
    }
}

fn namespace(raw: String) -> Result<Namespace, ApiError> {
    Ok(Namespace::new(raw).map_err(LedgerError::from)?)
}

async fn health() -> &'static str {
    "tledger"
}

async fn propose_transaction(
    State(state): State<AppState>,
    Path(raw): Path<String>,
    Json(proposed): Json<ProposedTransaction>,
) -> Result<(StatusCode, Json<ProposeResponse>), ApiError> {
    let ctx = state.ledger.context(namespace(raw)?);
    let sequenced = state.ledger.propose_transaction(&ctx, proposed).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(ProposeResponse {
            block_num: sequenced.block_num,
            tx_number: sequenced.tx_number,
        }),
    ))
}

async fn get_block(
    State(state): State<AppState>,
    Path((raw, block_num)): Path<(String, u64)>,
) -> Result<Response, ApiError> {
    let ctx = state.ledger.context(namespace(raw)?);
    Ok(match state.ledger.get_block(&ctx, block_num).await? {
        Some(block) => Json(block.as_ref()).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    })
}

async fn get_transaction(
    State(state): State<AppState>,
    Path((raw, block_num, tx_number)): Path<(String, u64, u64)>,
) -> Result<Response, ApiError> {
    let ctx = state.ledger.context(namespace(raw)?);
    Ok(
        match state.ledger.get_transaction(&ctx, block_num, tx_number).await? {
            Some(tx) => Json(tx).into_response(),
            None => StatusCode::NO_CONTENT.into_response(),
        },
    )
}

async fn stats(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Json<StatsResponse>, ApiError> {
    let namespace = namespace(raw)?;
    let stats = state.ledger.stats(&namespace).await;
    Ok(Json(StatsResponse {
        namespace: namespace.to_string(),
        latest_index: stats.latest_index,
        cached_blocks: stats.cached_blocks,
        highest_cached_block: stats.highest_cached_block,
        generation: stats.generation,
    }))
}
