//! Key encoding utilities for `RocksDB`.
//!
//! DIDs are variable-length ASCII strings, so compound keys delimit them
//! with NUL bytes (which cannot occur inside a DID). Timestamps are encoded
//! as big-endian millisecond counts so that lexicographic key order is
//! chronological; within one millisecond, diff keys order by `cause` bytes,
//! giving range scans a deterministic tie-break.

use chrono::{DateTime, Utc};

use strata_billing_core::{Cause, CustomerDid, ProviderDid, SpaceDid};

/// Encode a timestamp as 8 big-endian bytes of Unix milliseconds.
///
/// Times before the Unix epoch clamp to the epoch; billing periods predate
/// neither the service nor 1970.
#[must_use]
pub fn encode_ts(t: &DateTime<Utc>) -> [u8; 8] {
    u64::try_from(t.timestamp_millis()).unwrap_or(0).to_be_bytes()
}

/// Decode a big-endian millisecond timestamp from the first 8 bytes of a
/// slice. Returns `None` when the slice is too short.
#[must_use]
pub fn decode_ts(bytes: &[u8]) -> Option<u64> {
    let head: [u8; 8] = bytes.get(..8)?.try_into().ok()?;
    Some(u64::from_be_bytes(head))
}

/// Key prefix for all records of one (provider, space).
///
/// Format: `provider \0 space \0`
#[must_use]
pub fn space_partition(provider: &ProviderDid, space: &SpaceDid) -> Vec<u8> {
    let mut key = Vec::with_capacity(provider.as_bytes().len() + space.as_bytes().len() + 2);
    key.extend_from_slice(provider.as_bytes());
    key.push(0);
    key.extend_from_slice(space.as_bytes());
    key.push(0);
    key
}

/// Create a diff key.
///
/// Format: `provider \0 space \0 be64(receipt_at ms) ++ cause`
#[must_use]
pub fn diff_key(
    provider: &ProviderDid,
    space: &SpaceDid,
    receipt_at: &DateTime<Utc>,
    cause: &Cause,
) -> Vec<u8> {
    let mut key = space_partition(provider, space);
    key.extend_from_slice(&encode_ts(receipt_at));
    key.extend_from_slice(cause.as_bytes());
    key
}

/// Create a snapshot key.
///
/// Format: `provider \0 space \0 be64(recorded_at ms)`
#[must_use]
pub fn snapshot_key(
    provider: &ProviderDid,
    space: &SpaceDid,
    recorded_at: &DateTime<Utc>,
) -> Vec<u8> {
    let mut key = space_partition(provider, space);
    key.extend_from_slice(&encode_ts(recorded_at));
    key
}

/// Key prefix for all usage records of one customer.
///
/// Format: `customer \0`
#[must_use]
pub fn customer_prefix(customer: &CustomerDid) -> Vec<u8> {
    let mut key = Vec::with_capacity(customer.as_bytes().len() + 1);
    key.extend_from_slice(customer.as_bytes());
    key.push(0);
    key
}

/// Create a usage ledger key.
///
/// Format: `customer \0 space \0 provider \0 be64(to ms)`
///
/// The period end is the key's time component because the calculator chains
/// periods by looking up the record whose period ends at the next period's
/// start.
#[must_use]
pub fn usage_key(
    customer: &CustomerDid,
    space: &SpaceDid,
    provider: &ProviderDid,
    to: &DateTime<Utc>,
) -> Vec<u8> {
    let mut key = customer_prefix(customer);
    key.extend_from_slice(space.as_bytes());
    key.push(0);
    key.extend_from_slice(provider.as_bytes());
    key.push(0);
    key.extend_from_slice(&encode_ts(to));
    key
}
