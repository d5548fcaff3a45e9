//! REST endpoints for the proof service.
//!
//! Endpoints:
//! - GET  /api/leaves - all leaves
//! - POST /api/leaves - leaves committed by a checkpoint
//! - GET  /api/checkpoints - the checkpoint list
//! - POST /api/blockid - checkpoint covering a leaf
//! - POST /api/proof - inclusion proof for a leaf at a checkpoint
//! - POST /api/verify - check a proof against a checkpoint
//! - GET  /api/status - service status
//!
//! Leaves and proof entries travel hex-encoded. Caller mistakes come back
//! as 4xx JSON `{"_error": message}` and never take the service down.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::debug;

use charon_core::{BlockId, Leaf};
use charon_ledger::LedgerStore;
use charon_merkle::MerklePath;

use crate::server::ApiState;

/// REST API error response.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed caller input.
    #[error("{0}")]
    BadRequest(String),

    /// Unknown leaf, checkpoint, or block id.
    #[error("{0}")]
    NotFound(String),

    /// Engine fault.
    #[error("{0}")]
    Internal(String),
}

impl From<charon_core::Error> for ApiError {
    fn from(e: charon_core::Error) -> Self {
        match &e {
            charon_core::Error::NotFound { .. } => ApiError::NotFound(e.to_string()),
            _ if e.is_client_error() => ApiError::BadRequest(e.to_string()),
            _ => ApiError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = serde_json::json!({ "_error": self.to_string() });
        (status, Json(body)).into_response()
    }
}

// ============================================================================
// Leaves
// ============================================================================

/// Leaves, hex-encoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeavesResponse {
    /// Hex-encoded leaf records.
    pub leaves: Vec<String>,
}

/// Request for a checkpoint's leaf prefix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointLeavesRequest {
    /// Destination block id, hex-encoded.
    pub blockid: String,
}

/// GET /api/leaves - all leaves recorded so far.
async fn list_leaves<S: LedgerStore + 'static>(
    State(state): State<Arc<ApiState<S>>>,
) -> Result<Json<LeavesResponse>, ApiError> {
    let leaves = state.service().leaves()?;
    Ok(Json(LeavesResponse {
        leaves: leaves.iter().map(Leaf::to_hex).collect(),
    }))
}

/// POST /api/leaves - the prefix committed by a checkpoint.
async fn checkpoint_leaves<S: LedgerStore + 'static>(
    State(state): State<Arc<ApiState<S>>>,
    Json(request): Json<CheckpointLeavesRequest>,
) -> Result<Json<LeavesResponse>, ApiError> {
    let block_id = BlockId::from_hex(&request.blockid)?;
    let leaves = state.service().leaves_for_checkpoint(block_id)?;
    Ok(Json(LeavesResponse {
        leaves: leaves.iter().map(Leaf::to_hex).collect(),
    }))
}

// ============================================================================
// Checkpoints
// ============================================================================

/// The checkpoint list as parallel columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointsResponse {
    /// Leaf counts, in append order.
    pub index: Vec<usize>,
    /// Destination block ids, hex-encoded, index-aligned.
    #[serde(rename = "blockId")]
    pub block_id: Vec<String>,
}

/// GET /api/checkpoints - the full checkpoint list.
async fn list_checkpoints<S: LedgerStore + 'static>(
    State(state): State<Arc<ApiState<S>>>,
) -> Result<Json<CheckpointsResponse>, ApiError> {
    let checkpoints = state.service().checkpoints()?;
    Ok(Json(CheckpointsResponse {
        index: checkpoints.iter().map(|c| c.leaf_count).collect(),
        block_id: checkpoints.iter().map(|c| c.block_id.to_hex()).collect(),
    }))
}

// ============================================================================
// Block id lookup
// ============================================================================

/// Request to resolve a leaf to its covering checkpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockIdRequest {
    /// Hex-encoded leaf.
    pub leaf: String,
}

/// The covering checkpoint's block id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockIdResponse {
    /// Destination block id, hex-encoded.
    #[serde(rename = "blockId")]
    pub block_id: String,
}

/// POST /api/blockid - the checkpoint covering a leaf.
async fn lookup_block_id<S: LedgerStore + 'static>(
    State(state): State<Arc<ApiState<S>>>,
    Json(request): Json<BlockIdRequest>,
) -> Result<Json<BlockIdResponse>, ApiError> {
    let leaf = Leaf::from_hex(&request.leaf)?;
    let block_id = state.service().lookup_block_id(&leaf)?;
    Ok(Json(BlockIdResponse {
        block_id: block_id.to_hex(),
    }))
}

// ============================================================================
// Proofs
// ============================================================================

/// Request for an inclusion proof.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProofRequest {
    /// Hex-encoded leaf.
    pub leaf: String,
    /// Destination block id, hex-encoded.
    pub blockid: String,
}

/// An inclusion proof: direction-tagged sibling hashes, leaf to root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProofResponse {
    /// Hex-encoded proof entries.
    pub proof: Vec<String>,
}

/// POST /api/proof - inclusion proof for a leaf at a checkpoint.
async fn get_proof<S: LedgerStore + 'static>(
    State(state): State<Arc<ApiState<S>>>,
    Json(request): Json<ProofRequest>,
) -> Result<Json<ProofResponse>, ApiError> {
    let leaf = Leaf::from_hex(&request.leaf)?;
    let block_id = BlockId::from_hex(&request.blockid)?;

    debug!(block_id = %block_id, "building proof");
    let path = state.service().proof(&leaf, block_id)?;
    Ok(Json(ProofResponse {
        proof: path.to_hex_entries(),
    }))
}

/// Request to check a proof.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyRequest {
    /// Hex-encoded leaf.
    pub leaf: String,
    /// Hex-encoded proof entries.
    pub proof: Vec<String>,
    /// Destination block id, hex-encoded.
    pub blockid: String,
}

/// Verification outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyResponse {
    /// Whether the proof connects the leaf to the checkpoint's root.
    pub verified: bool,
}

/// POST /api/verify - check a proof against a checkpoint.
///
/// A convenience mirror of the destination contract's check; the contract
/// remains the authority.
async fn verify_proof<S: LedgerStore + 'static>(
    State(state): State<Arc<ApiState<S>>>,
    Json(request): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let leaf = Leaf::from_hex(&request.leaf)?;
    let block_id = BlockId::from_hex(&request.blockid)?;
    let path = MerklePath::from_hex_entries(&request.proof)?;

    let verified = state.service().verify(&leaf, &path, block_id)?;
    Ok(Json(VerifyResponse { verified }))
}

// ============================================================================
// Status
// ============================================================================

/// Service status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Crate version.
    pub version: String,
    /// Total leaves recorded.
    pub leaf_count: usize,
    /// Total checkpoints recorded.
    pub checkpoint_count: usize,
    /// Whether the relay worker is live (absent when none is attached).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relay_running: Option<bool>,
    /// Service uptime in seconds.
    pub uptime_seconds: u64,
}

/// GET /api/status - service status.
async fn get_status<S: LedgerStore + 'static>(
    State(state): State<Arc<ApiState<S>>>,
) -> Result<Json<StatusResponse>, ApiError> {
    Ok(Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        leaf_count: state.service().leaf_count(),
        checkpoint_count: state.service().checkpoint_count(),
        relay_running: state.relay_running(),
        uptime_seconds: state.uptime().as_secs(),
    }))
}

// ============================================================================
// Combined Router
// ============================================================================

/// Create the complete REST router.
pub fn create_router<S: LedgerStore + 'static>() -> Router<Arc<ApiState<S>>> {
    Router::new()
        .route(
            "/api/leaves",
            get(list_leaves::<S>).post(checkpoint_leaves::<S>),
        )
        .route("/api/checkpoints", get(list_checkpoints::<S>))
        .route("/api/blockid", post(lookup_block_id::<S>))
        .route("/api/proof", post(get_proof::<S>))
        .route("/api/verify", post(verify_proof::<S>))
        .route("/api/status", get(get_status::<S>))
}
