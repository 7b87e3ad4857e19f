//! Space usage accounting engine.
//!
//! This crate converts the append-only diff log into exact, auditable
//! per-period usage: for each billing instruction it reconstructs the
//! space's size at the period start (snapshot plus diff replay), integrates
//! size over the period with an interval walk, chains the result into the
//! month-to-date cumulative total, and settles the period by writing a
//! usage ledger record and a fresh end-of-period snapshot.
//!
//! # Control flow
//!
//! One instruction per (customer, space, provider, period), delivered by an
//! external scheduler in period order per space:
//!
//! ```no_run
//! # async fn run() -> Result<(), strata_billing_engine::BillingError> {
//! # let instruction: strata_billing_core::BillingInstruction = todo!();
//! # let ctx: strata_billing_engine::SpaceBillingContext<'_> = todo!();
//! use strata_billing_engine::{calculate_period_usage, store_space_usage};
//!
//! let calculation = calculate_period_usage(&instruction, &ctx).await?;
//! store_space_usage(&instruction, &calculation, &ctx).await?;
//! # Ok(())
//! # }
//! ```
//!
//! Both steps are safe to re-run for the same period: the calculation is
//! read-only and settlement writes are idempotent overwrites.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod calculator;
pub mod error;
pub mod persister;

pub use calculator::{calculate_period_usage, PeriodCalculation};
pub use error::{BillingError, Result};
pub use persister::store_space_usage;

use strata_billing_store::{SpaceDiffStore, SpaceSnapshotStore, UsageStore};

/// The stores a space billing instruction is processed against.
pub struct SpaceBillingContext<'a> {
    /// The append-only size-change log.
    pub space_diff_store: &'a dyn SpaceDiffStore,

    /// The size checkpoint store.
    pub space_snapshot_store: &'a dyn SpaceSnapshotStore,

    /// The usage ledger.
    pub usage_store: &'a dyn UsageStore,
}
