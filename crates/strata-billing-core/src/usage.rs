//! Usage records and the byte·millisecond quantity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

use crate::{CustomerDid, ProviderDid, SpaceDid};

/// One gibibyte in bytes.
const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// A quantity of usage in byte·milliseconds.
///
/// Byte counts up to ~10¹² combined with millisecond durations up to
/// ~2.6×10⁹ per month make the raw product exceed `i64`, so the quantity is
/// carried as `i128` end to end. Serialized as a decimal string so JSON
/// consumers never receive a lossy floating-point number.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ByteMs(i128);

impl ByteMs {
    /// The zero quantity.
    pub const ZERO: Self = Self(0);

    /// Create a quantity from a raw byte·millisecond count.
    #[must_use]
    pub const fn new(value: i128) -> Self {
        Self(value)
    }

    /// The contribution of holding `size` bytes for `duration_ms`
    /// milliseconds.
    #[must_use]
    pub fn of(size: i64, duration_ms: i64) -> Self {
        Self(i128::from(size) * i128::from(duration_ms))
    }

    /// Return the raw byte·millisecond count.
    #[must_use]
    pub const fn value(self) -> i128 {
        self.0
    }

    /// Approximate reading of this quantity as GiB held for the given
    /// duration, for operator-facing logs.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn gib_for_duration(self, duration_ms: i64) -> f64 {
        if duration_ms == 0 {
            return 0.0;
        }
        self.0 as f64 / duration_ms as f64 / GIB
    }
}

impl Add for ByteMs {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for ByteMs {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sum for ByteMs {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Debug for ByteMs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ByteMs({})", self.0)
    }
}

impl fmt::Display for ByteMs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ByteMs {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(i128::from_str(s)?))
    }
}

impl TryFrom<String> for ByteMs {
    type Error = std::num::ParseIntError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ByteMs> for String {
    fn from(value: ByteMs) -> Self {
        value.0.to_string()
    }
}

/// Storage usage by a customer for a space in a billing period.
///
/// `usage` is the **cumulative month-to-date** integral of size over time,
/// valid as of `to` — not merely this period's own contribution. Within a
/// calendar month, records for a (customer, provider, space) form a chain
/// where record *n*'s `to` equals record *n+1*'s `from` and usage
/// accumulates; the chain resets at the first instant of each month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    /// Customer responsible for paying for the space.
    pub customer: CustomerDid,

    /// Opaque identifier of the customer's account in the payment system.
    pub account: String,

    /// Unique identifier of the product a.k.a. tier.
    pub product: String,

    /// Storage provider for the space.
    pub provider: ProviderDid,

    /// Space the usage was accrued in.
    pub space: SpaceDid,

    /// Time the usage period spans from (inclusive).
    pub from: DateTime<Utc>,

    /// Time the usage period spans to (exclusive).
    pub to: DateTime<Utc>,

    /// Cumulative month-to-date usage in byte·milliseconds as of `to`.
    pub usage: ByteMs,

    /// Time the record was added to the database.
    pub inserted_at: DateTime<Utc>,
}
