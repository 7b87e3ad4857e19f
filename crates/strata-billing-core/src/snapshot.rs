//! Space snapshot records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ProviderDid, SpaceDid};

/// A checkpoint of the total size of a space at a given instant.
///
/// A snapshot at `recorded_at` covers every diff with
/// `receipt_at < recorded_at`, so replay after a snapshot starts at
/// `recorded_at` inclusive. Snapshots bound how far back the calculator
/// must replay the diff log; they may be arbitrarily stale as long as the
/// diff history since then is retained.
///
/// A snapshot is never retroactively corrected. If it is wrong, a later
/// snapshot supersedes it. Snapshots are created exclusively by the usage
/// persister at the end of every calculated period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceSnapshot {
    /// Storage provider this snapshot refers to.
    pub provider: ProviderDid,

    /// Space this snapshot refers to.
    pub space: SpaceDid,

    /// Total allocated size in bytes.
    pub size: u64,

    /// Time the total allocated size was recorded at.
    pub recorded_at: DateTime<Utc>,

    /// Time the snapshot was added to the database.
    pub inserted_at: DateTime<Utc>,
}
