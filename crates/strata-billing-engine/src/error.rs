//! Error types for the accounting engine.

use chrono::{DateTime, Utc};

use strata_billing_core::{CustomerDid, ProviderDid, SpaceDid};
use strata_billing_store::StoreError;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, BillingError>;

/// Errors that can occur while calculating or settling period usage.
///
/// Store failures pass through unchanged so the caller can distinguish
/// "retry safely" (transient storage trouble) from "operator must backfill
/// data" (`MissingPreviousUsage`).
#[derive(Debug, thiserror::Error)]
pub enum BillingError {
    /// The instruction's period is empty or inverted.
    #[error("invalid billing period: {from} does not precede {to}")]
    InvalidPeriod {
        /// Period start.
        from: DateTime<Utc>,
        /// Period end.
        to: DateTime<Utc>,
    },

    /// A mid-month period has no contiguous predecessor in the usage
    /// ledger.
    ///
    /// Assuming zero prior usage here would undercharge the customer for
    /// everything before the gap, so the instruction fails instead. It can
    /// be retried once the predecessor period has been settled.
    #[error(
        "missing previous usage for space {space} (customer {customer}, provider {provider}): \
         no ledger record ends at {from}, required for a period starting mid-month"
    )]
    MissingPreviousUsage {
        /// Customer the instruction bills.
        customer: CustomerDid,
        /// Storage provider for the space.
        provider: ProviderDid,
        /// Space whose usage chain is broken.
        space: SpaceDid,
        /// Period start no ledger record ends at.
        from: DateTime<Utc>,
    },

    /// Diff replay produced a size outside `0..=u64::MAX`, which means the
    /// diff history is inconsistent. Refusing to snapshot it keeps the
    /// corruption from propagating into later periods.
    #[error("space {space} diff history is inconsistent: computed size {size} is out of range")]
    SizeOutOfRange {
        /// Space whose diff history is inconsistent.
        space: SpaceDid,
        /// The out-of-range computed size.
        size: i128,
    },

    /// A store operation failed. Propagated unchanged — never coerced into
    /// an absent record or a zero quantity.
    #[error(transparent)]
    Store(#[from] StoreError),
}
