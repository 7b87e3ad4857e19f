//! Period usage settlement.

use chrono::Utc;

use strata_billing_core::{BillingInstruction, SpaceSnapshot, UsageRecord};

use crate::calculator::PeriodCalculation;
use crate::error::Result;
use crate::SpaceBillingContext;

/// Durably record a calculated period: a usage ledger entry for the period
/// and a fresh snapshot at the period end, so the next period's calculation
/// has O(1) lookback.
///
/// The two writes are not atomic with each other, but both must succeed for
/// the period to count as settled — a partial failure surfaces as an error
/// and the caller retries the whole instruction. Retrying is safe because
/// both writes are idempotent overwrites keyed by (provider/space, instant)
/// and (customer/space/provider, period end).
///
/// # Errors
///
/// Store failures from either write, propagated unchanged.
pub async fn store_space_usage(
    instruction: &BillingInstruction,
    calculation: &PeriodCalculation,
    ctx: &SpaceBillingContext<'_>,
) -> Result<()> {
    let now = Utc::now();

    ctx.space_snapshot_store
        .put(&SpaceSnapshot {
            provider: instruction.provider.clone(),
            space: instruction.space.clone(),
            size: calculation.size,
            recorded_at: instruction.to,
            inserted_at: now,
        })
        .await?;

    ctx.usage_store
        .put(&UsageRecord {
            customer: instruction.customer.clone(),
            account: instruction.account.clone(),
            product: instruction.product.clone(),
            provider: instruction.provider.clone(),
            space: instruction.space.clone(),
            from: instruction.from,
            to: instruction.to,
            usage: calculation.usage,
            inserted_at: now,
        })
        .await?;

    tracing::info!(
        space = %instruction.space,
        customer = %instruction.customer,
        size = calculation.size,
        usage = %calculation.usage,
        gib = calculation.usage.gib_for_duration(instruction.duration_ms()),
        "settled period usage"
    );

    Ok(())
}
