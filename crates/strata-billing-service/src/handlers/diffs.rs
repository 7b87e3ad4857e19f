//! Diff log ingestion handlers.
//!
//! The upstream stream processor turns invocation receipts into size-delta
//! events and batch-writes them here. Input is trusted to be deduplicated
//! by `cause` upstream; re-sending a diff is an idempotent overwrite.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use strata_billing_core::{Cause, ProviderDid, SpaceDid, SpaceDiff};
use strata_billing_store::SpaceDiffStore;

use crate::auth::ServiceAuth;
use crate::error::ApiError;
use crate::state::AppState;

/// A diff in request format. The server stamps `inserted_at`.
#[derive(Debug, Clone, Deserialize)]
pub struct DiffInput {
    /// Storage provider for the space.
    pub provider: ProviderDid,
    /// Space that changed size.
    pub space: SpaceDid,
    /// Subscription in use when the size changed.
    pub subscription: String,
    /// Invocation that caused the size change.
    pub cause: Cause,
    /// Signed byte delta.
    pub delta: i64,
    /// Time the receipt was issued by the service.
    pub receipt_at: DateTime<Utc>,
}

/// Batch diff request.
#[derive(Debug, Deserialize)]
pub struct BatchDiffRequest {
    /// Diffs to append.
    pub diffs: Vec<DiffInput>,
}

/// Batch diff response.
#[derive(Debug, Serialize)]
pub struct BatchDiffResponse {
    /// Results for each diff, in request order.
    pub results: Vec<BatchDiffResult>,
    /// Total diffs appended.
    pub appended: usize,
    /// Total diffs failed.
    pub failed: usize,
}

/// Result for a single diff in a batch.
#[derive(Debug, Serialize)]
pub struct BatchDiffResult {
    /// Cause identifier of the diff.
    pub cause: String,
    /// Whether the append succeeded.
    pub success: bool,
    /// Error message if failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Append a batch of diffs to the diff log.
///
/// Appends are per record: one record failing does not roll back the
/// others, and the caller retries failed records individually using the
/// per-record results.
pub async fn append_diffs(
    State(state): State<Arc<AppState>>,
    auth: ServiceAuth,
    Json(body): Json<BatchDiffRequest>,
) -> Result<Json<BatchDiffResponse>, ApiError> {
    let mut results = Vec::with_capacity(body.diffs.len());
    let mut appended = 0;
    let mut failed = 0;
    let now = Utc::now();

    for input in body.diffs {
        let cause = input.cause.to_string();
        let diff = SpaceDiff {
            provider: input.provider,
            space: input.space,
            subscription: input.subscription,
            cause: input.cause,
            delta: input.delta,
            receipt_at: input.receipt_at,
            inserted_at: now,
        };

        match state.store.batch_put(std::slice::from_ref(&diff)).await {
            Ok(()) => {
                results.push(BatchDiffResult {
                    cause,
                    success: true,
                    error: None,
                });
                appended += 1;
            }
            Err(e) => {
                tracing::warn!(cause = %cause, error = %e, "failed to append diff");
                results.push(BatchDiffResult {
                    cause,
                    success: false,
                    error: Some(e.to_string()),
                });
                failed += 1;
            }
        }
    }

    tracing::debug!(
        service = %auth.service_name,
        appended,
        failed,
        "processed diff batch"
    );

    Ok(Json(BatchDiffResponse {
        results,
        appended,
        failed,
    }))
}
