//! `RocksDB` storage layer for strata-billing.
//!
//! This crate defines the three store contracts the accounting engine
//! depends on — the diff log, the snapshot store and the usage ledger —
//! and provides a `RocksDB` implementation using column families.
//!
//! # Architecture
//!
//! The storage uses the following column families:
//!
//! - `space_diffs`: append-only size-change log, keyed by
//!   `(provider, space, receipt_at, cause)` so a range scan yields diffs in
//!   receipt order with a deterministic `cause` tie-break
//! - `space_snapshots`: size checkpoints, keyed by
//!   `(provider, space, recorded_at)`
//! - `usage`: the usage ledger, keyed by
//!   `(customer, space, provider, period end)`
//!
//! Lookups that can legitimately find nothing return `Option::None`; a
//! [`StoreError`] always means the operation itself failed. Callers must
//! never treat a failure as an empty result — for billing, that distinction
//! is the difference between "no history" and "undercharging".

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
pub mod rocks;
pub mod schema;

pub use error::{Result, StoreError};
pub use rocks::RocksStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use strata_billing_core::{CustomerDid, ProviderDid, SpaceDid, SpaceDiff, SpaceSnapshot, UsageRecord};

/// The append-only log of space size changes.
#[async_trait]
pub trait SpaceDiffStore: Send + Sync {
    /// Append a batch of diffs.
    ///
    /// Atomicity across the batch is not part of the contract: callers must
    /// retry failed batches at the record level. Re-appending a diff with
    /// the same `(provider, space, receipt_at, cause)` is an idempotent
    /// overwrite.
    ///
    /// # Errors
    ///
    /// Returns an error if any record cannot be encoded or written.
    async fn batch_put(&self, diffs: &[SpaceDiff]) -> Result<()>;

    /// List diffs for a space with `from <= receipt_at < to`, ordered by
    /// `(receipt_at, cause)` ascending.
    ///
    /// # Errors
    ///
    /// Returns an error if the scan or record decoding fails.
    async fn list_between(
        &self,
        provider: &ProviderDid,
        space: &SpaceDid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<SpaceDiff>>;
}

/// The store of space size checkpoints.
#[async_trait]
pub trait SpaceSnapshotStore: Send + Sync {
    /// Insert or overwrite a snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be encoded or written.
    async fn put(&self, snapshot: &SpaceSnapshot) -> Result<()>;

    /// The most recent snapshot with `recorded_at <= at`, if any.
    ///
    /// Snapshots recorded after `at` describe a future state and are never
    /// returned. `None` means no qualifying snapshot exists — a data
    /// condition, not a failure.
    ///
    /// # Errors
    ///
    /// Returns an error if the scan or record decoding fails.
    async fn latest_at_or_before(
        &self,
        provider: &ProviderDid,
        space: &SpaceDid,
        at: DateTime<Utc>,
    ) -> Result<Option<SpaceSnapshot>>;
}

/// The usage ledger: one record per (customer, provider, space, period).
#[async_trait]
pub trait UsageStore: Send + Sync {
    /// Insert or overwrite a usage record.
    ///
    /// Records are keyed by (customer, space, provider, period end), so
    /// re-settling the same period is an idempotent overwrite.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be encoded or written.
    async fn put(&self, usage: &UsageRecord) -> Result<()>;

    /// The record for this (customer, provider, space) whose period ends
    /// exactly at `to`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the read or record decoding fails.
    async fn get_period_ending_at(
        &self,
        customer: &CustomerDid,
        provider: &ProviderDid,
        space: &SpaceDid,
        to: DateTime<Utc>,
    ) -> Result<Option<UsageRecord>>;

    /// List a customer's usage records whose periods fall entirely within
    /// `[from, to]`, across all spaces and providers.
    ///
    /// # Errors
    ///
    /// Returns an error if the scan or record decoding fails.
    async fn list_by_customer(
        &self,
        customer: &CustomerDid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<UsageRecord>>;
}
