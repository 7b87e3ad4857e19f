//! Billing instruction execution handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use strata_billing_core::{BillingInstruction, ByteMs, ProviderDid, SpaceDid};
use strata_billing_engine::{calculate_period_usage, store_space_usage};

use crate::auth::ServiceAuth;
use crate::error::ApiError;
use crate::state::AppState;

/// Result of executing one billing instruction.
#[derive(Debug, Serialize)]
pub struct RunBillingResponse {
    /// Space the instruction billed.
    pub space: SpaceDid,
    /// Storage provider for the space.
    pub provider: ProviderDid,
    /// Period start (inclusive).
    pub from: DateTime<Utc>,
    /// Period end (exclusive).
    pub to: DateTime<Utc>,
    /// Total bytes in the space as of the period end.
    pub size: u64,
    /// Cumulative month-to-date usage in byte·milliseconds as of the
    /// period end.
    pub usage: ByteMs,
}

/// Execute one billing instruction: calculate the period's usage and
/// settle it.
///
/// Instructions for the same space must be submitted in period order; a
/// mid-month instruction with no settled predecessor is rejected with a
/// `missing_previous_usage` conflict. Re-submitting an instruction (for
/// example after a timeout) is safe: settlement writes are idempotent
/// overwrites.
pub async fn run_instruction(
    State(state): State<Arc<AppState>>,
    auth: ServiceAuth,
    Json(instruction): Json<BillingInstruction>,
) -> Result<Json<RunBillingResponse>, ApiError> {
    tracing::debug!(
        service = %auth.service_name,
        space = %instruction.space,
        customer = %instruction.customer,
        from = %instruction.from,
        to = %instruction.to,
        "executing billing instruction"
    );

    let ctx = state.billing_ctx();
    let calculation = calculate_period_usage(&instruction, &ctx).await?;
    store_space_usage(&instruction, &calculation, &ctx).await?;

    Ok(Json(RunBillingResponse {
        space: instruction.space,
        provider: instruction.provider,
        from: instruction.from,
        to: instruction.to,
        size: calculation.size,
        usage: calculation.usage,
    }))
}
