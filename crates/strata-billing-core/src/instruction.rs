//! Billing instructions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{CustomerDid, ProviderDid, SpaceDid};

/// Details about a space that should be billed for a given customer in the
/// given period of usage.
///
/// Instructions are ephemeral work items produced by the external scheduler
/// — typically one per (customer, space, provider) per day, with periods
/// chained so each period's `from` equals the previous period's `to`,
/// except at month boundaries where the usage chain resets. Instructions
/// for the same space must be delivered in period order; instructions for
/// different spaces are independent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingInstruction {
    /// Customer to bill.
    pub customer: CustomerDid,

    /// Opaque identifier of the customer's account in the payment system.
    pub account: String,

    /// Unique identifier of the product a.k.a. tier.
    pub product: String,

    /// Storage provider for the space.
    pub provider: ProviderDid,

    /// Space to calculate usage for.
    pub space: SpaceDid,

    /// Time the billing period spans from (inclusive).
    pub from: DateTime<Utc>,

    /// Time the billing period spans to (exclusive).
    pub to: DateTime<Utc>,
}

impl BillingInstruction {
    /// Length of the billing period in milliseconds.
    #[must_use]
    pub fn duration_ms(&self) -> i64 {
        self.to.timestamp_millis() - self.from.timestamp_millis()
    }
}
