//! Space diff records.
//!
//! A diff captures one signed change in the stored size of a space, caused
//! by a single invocation receipt. The diff log is append-only: diffs are
//! never mutated or retroactively corrected.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Cause, ProviderDid, SpaceDid};

/// A size change that occurred in a space.
///
/// Diffs are written by the upstream stream processor from invocation
/// receipts and only read (or batch-appended) by the billing engine. For a
/// fixed (provider, space) the multiset of `(cause, delta)` pairs is
/// append-only; `receipt_at` establishes logical event order and may arrive
/// out of order relative to `inserted_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceDiff {
    /// Storage provider for the space.
    pub provider: ProviderDid,

    /// Space that changed size.
    pub space: SpaceDid,

    /// Subscription in use when the size changed.
    pub subscription: String,

    /// Invocation that caused the size change.
    ///
    /// The upstream processor deduplicates by `cause`; the engine trusts
    /// each cause to appear at most once.
    pub cause: Cause,

    /// Number of bytes that were added (positive) or removed (negative).
    pub delta: i64,

    /// Time the receipt was issued by the service.
    pub receipt_at: DateTime<Utc>,

    /// Time the diff was added to the database.
    pub inserted_at: DateTime<Utc>,
}
