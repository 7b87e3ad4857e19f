//! Database schema definitions and column families.
//!
//! This module defines the column families used in `RocksDB` storage.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// Append-only space size-change log, keyed by
    /// `provider \0 space \0 be64(receipt_at ms) ++ cause`.
    pub const SPACE_DIFFS: &str = "space_diffs";

    /// Space size checkpoints, keyed by
    /// `provider \0 space \0 be64(recorded_at ms)`.
    pub const SPACE_SNAPSHOTS: &str = "space_snapshots";

    /// Usage ledger, keyed by
    /// `customer \0 space \0 provider \0 be64(to ms)`.
    pub const USAGE: &str = "usage";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![cf::SPACE_DIFFS, cf::SPACE_SNAPSHOTS, cf::USAGE]
}
