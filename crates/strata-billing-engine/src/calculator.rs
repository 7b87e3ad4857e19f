//! Period usage calculation.

use chrono::{DateTime, Utc};

use strata_billing_core::{period, BillingInstruction, ByteMs};

use crate::error::{BillingError, Result};
use crate::SpaceBillingContext;

/// The result of calculating one billing period for one space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodCalculation {
    /// Total bytes in the space as of the period end.
    pub size: u64,

    /// Cumulative month-to-date usage in byte·milliseconds as of the
    /// period end.
    pub usage: ByteMs,
}

/// Calculate the usage integral for one billing instruction.
///
/// Read-only: queries the snapshot store, diff log and usage ledger but
/// writes nothing. Settlement is the persister's job.
///
/// The size at the period start is reconstructed from the most recent
/// snapshot at or before `from` plus a replay of every later diff, so the
/// snapshot may be arbitrarily stale (or absent entirely) as long as the
/// diff history since then is retained. Within the period, size is
/// integrated over time with an interval walk — each diff is weighted by
/// its own sub-interval, never by the flat period duration.
///
/// # Errors
///
/// - [`BillingError::InvalidPeriod`] if `from` does not precede `to`.
/// - [`BillingError::MissingPreviousUsage`] if the period starts mid-month
///   and no ledger record ends at `from`.
/// - [`BillingError::SizeOutOfRange`] if the walk ends on a negative size.
/// - Store failures, propagated unchanged.
pub async fn calculate_period_usage(
    instruction: &BillingInstruction,
    ctx: &SpaceBillingContext<'_>,
) -> Result<PeriodCalculation> {
    if instruction.from >= instruction.to {
        return Err(BillingError::InvalidPeriod {
            from: instruction.from,
            to: instruction.to,
        });
    }

    tracing::debug!(
        space = %instruction.space,
        provider = %instruction.provider,
        customer = %instruction.customer,
        from = %instruction.from,
        to = %instruction.to,
        "calculating period usage"
    );

    let size_at_start = size_at_period_start(instruction, ctx).await?;

    tracing::debug!(
        space = %instruction.space,
        size = size_at_start,
        at = %instruction.from,
        "size at period start"
    );

    // Interval walk over [from, to): each diff closes the sub-interval that
    // preceded it at the size held throughout that sub-interval.
    let mut period_usage = ByteMs::ZERO;
    let mut current = i128::from(size_at_start);
    let mut cursor = instruction.from;
    let diffs = ctx
        .space_diff_store
        .list_between(
            &instruction.provider,
            &instruction.space,
            instruction.from,
            instruction.to,
        )
        .await?;
    for diff in &diffs {
        period_usage += ByteMs::new(current * millis_between(cursor, diff.receipt_at));
        current += i128::from(diff.delta);
        cursor = diff.receipt_at;
    }
    period_usage += ByteMs::new(current * millis_between(cursor, instruction.to));

    let size_at_end = u64::try_from(current).map_err(|_| BillingError::SizeOutOfRange {
        space: instruction.space.clone(),
        size: current,
    })?;

    tracing::debug!(
        space = %instruction.space,
        size = size_at_end,
        at = %instruction.to,
        diffs = diffs.len(),
        "size at period end"
    );

    let usage = cumulative_usage(instruction, period_usage, ctx).await?;

    Ok(PeriodCalculation {
        size: size_at_end,
        usage,
    })
}

/// Reconstruct the space's size as of the period start.
///
/// Uses the most recent snapshot with `recorded_at <= from` (later
/// snapshots describe a future state and must never be considered), then
/// replays all diffs in `[recorded_at, from)`. Without a snapshot, replay
/// covers the whole diff log and starts from zero.
async fn size_at_period_start(
    instruction: &BillingInstruction,
    ctx: &SpaceBillingContext<'_>,
) -> Result<u64> {
    let snapshot = ctx
        .space_snapshot_store
        .latest_at_or_before(&instruction.provider, &instruction.space, instruction.from)
        .await?;

    let (seed, replay_from) = match snapshot {
        Some(snap) => (i128::from(snap.size), snap.recorded_at),
        None => {
            tracing::warn!(
                space = %instruction.space,
                provider = %instruction.provider,
                "no snapshot at or before period start, replaying the whole diff log"
            );
            (0, DateTime::UNIX_EPOCH)
        }
    };

    let mut size = seed;
    let replayed = ctx
        .space_diff_store
        .list_between(
            &instruction.provider,
            &instruction.space,
            replay_from,
            instruction.from,
        )
        .await?;
    for diff in &replayed {
        size += i128::from(diff.delta);
    }

    u64::try_from(size).map_err(|_| BillingError::SizeOutOfRange {
        space: instruction.space.clone(),
        size,
    })
}

/// Chain the period's own integral into the month-to-date total.
///
/// A period starting at the first instant of a calendar month resets the
/// chain. Any other period requires its contiguous predecessor — the
/// ledger record ending exactly at `from` — and fails without it rather
/// than silently assuming zero prior usage. Store failures during the
/// lookup propagate unchanged; they are never treated as "no previous
/// usage".
async fn cumulative_usage(
    instruction: &BillingInstruction,
    period_usage: ByteMs,
    ctx: &SpaceBillingContext<'_>,
) -> Result<ByteMs> {
    if period::is_month_start(&instruction.from) {
        return Ok(period_usage);
    }

    let previous = ctx
        .usage_store
        .get_period_ending_at(
            &instruction.customer,
            &instruction.provider,
            &instruction.space,
            instruction.from,
        )
        .await?;

    match previous {
        Some(previous) => Ok(previous.usage + period_usage),
        None => Err(BillingError::MissingPreviousUsage {
            customer: instruction.customer.clone(),
            provider: instruction.provider.clone(),
            space: instruction.space.clone(),
            from: instruction.from,
        }),
    }
}

fn millis_between(from: DateTime<Utc>, to: DateTime<Utc>) -> i128 {
    i128::from(to.timestamp_millis() - from.timestamp_millis())
}
