//! `RocksDB` storage implementation.
//!
//! This module provides the `RocksStore` implementation of the three store
//! contracts used by the billing engine.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, Direction, IteratorMode,
    MultiThreaded, Options, WriteBatch,
};

use strata_billing_core::{CustomerDid, ProviderDid, SpaceDid, SpaceDiff, SpaceSnapshot, UsageRecord};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf};
use crate::{SpaceDiffStore, SpaceSnapshotStore, UsageStore};

/// RocksDB-backed storage implementing the diff log, snapshot store and
/// usage ledger.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf).map_err(|e| StoreError::Encode(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Decode(e.to_string()))
    }

    /// Millisecond count used for key comparisons, matching
    /// [`keys::encode_ts`].
    fn ts_millis(t: &DateTime<Utc>) -> u64 {
        u64::try_from(t.timestamp_millis()).unwrap_or(0)
    }
}

#[async_trait]
impl SpaceDiffStore for RocksStore {
    async fn batch_put(&self, diffs: &[SpaceDiff]) -> Result<()> {
        let cf = self.cf(cf::SPACE_DIFFS)?;

        let mut batch = WriteBatch::default();
        for diff in diffs {
            let key = keys::diff_key(&diff.provider, &diff.space, &diff.receipt_at, &diff.cause);
            let value = Self::serialize(diff)?;
            batch.put_cf(&cf, key, value);
        }

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        tracing::debug!(count = diffs.len(), "appended space diffs");
        Ok(())
    }

    async fn list_between(
        &self,
        provider: &ProviderDid,
        space: &SpaceDid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<SpaceDiff>> {
        let cf = self.cf(cf::SPACE_DIFFS)?;
        let partition = keys::space_partition(provider, space);
        let to_ms = Self::ts_millis(&to);

        let mut start = partition.clone();
        start.extend_from_slice(&keys::encode_ts(&from));

        let mut diffs = Vec::new();
        let iter = self
            .db
            .iterator_cf(&cf, IteratorMode::From(&start, Direction::Forward));
        for item in iter {
            let (key, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;

            if !key.starts_with(&partition) {
                break;
            }

            let ts = keys::decode_ts(&key[partition.len()..])
                .ok_or_else(|| StoreError::Decode("diff key missing timestamp".to_string()))?;
            if ts >= to_ms {
                break;
            }

            diffs.push(Self::deserialize(&value)?);
        }

        Ok(diffs)
    }
}

#[async_trait]
impl SpaceSnapshotStore for RocksStore {
    async fn put(&self, snapshot: &SpaceSnapshot) -> Result<()> {
        let cf = self.cf(cf::SPACE_SNAPSHOTS)?;
        let key = keys::snapshot_key(&snapshot.provider, &snapshot.space, &snapshot.recorded_at);
        let value = Self::serialize(snapshot)?;

        self.db
            .put_cf(&cf, key, value)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    async fn latest_at_or_before(
        &self,
        provider: &ProviderDid,
        space: &SpaceDid,
        at: DateTime<Utc>,
    ) -> Result<Option<SpaceSnapshot>> {
        let cf = self.cf(cf::SPACE_SNAPSHOTS)?;
        let partition = keys::space_partition(provider, space);
        let at_ms = Self::ts_millis(&at);

        // Upper bound strictly above every qualifying key: snapshot keys end
        // in the 8-byte timestamp, so `partition ++ be64(at) ++ 0xff` sorts
        // after any key with `recorded_at <= at` and before none of them.
        let mut upper = partition.clone();
        upper.extend_from_slice(&keys::encode_ts(&at));
        upper.push(0xff);

        let iter = self
            .db
            .iterator_cf(&cf, IteratorMode::From(&upper, Direction::Reverse));
        for item in iter {
            let (key, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;

            if !key.starts_with(&partition) {
                return Ok(None);
            }

            let ts = keys::decode_ts(&key[partition.len()..])
                .ok_or_else(|| StoreError::Decode("snapshot key missing timestamp".to_string()))?;
            if ts > at_ms {
                continue;
            }

            return Ok(Some(Self::deserialize(&value)?));
        }

        Ok(None)
    }
}

#[async_trait]
impl UsageStore for RocksStore {
    async fn put(&self, usage: &UsageRecord) -> Result<()> {
        let cf = self.cf(cf::USAGE)?;
        let key = keys::usage_key(&usage.customer, &usage.space, &usage.provider, &usage.to);
        let value = Self::serialize(usage)?;

        self.db
            .put_cf(&cf, key, value)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    async fn get_period_ending_at(
        &self,
        customer: &CustomerDid,
        provider: &ProviderDid,
        space: &SpaceDid,
        to: DateTime<Utc>,
    ) -> Result<Option<UsageRecord>> {
        let cf = self.cf(cf::USAGE)?;
        let key = keys::usage_key(customer, space, provider, &to);

        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    async fn list_by_customer(
        &self,
        customer: &CustomerDid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<UsageRecord>> {
        let cf = self.cf(cf::USAGE)?;
        let prefix = keys::customer_prefix(customer);

        let mut records = Vec::new();
        let iter = self
            .db
            .iterator_cf(&cf, IteratorMode::From(&prefix, Direction::Forward));
        for item in iter {
            let (key, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;

            if !key.starts_with(&prefix) {
                break;
            }

            let record: UsageRecord = Self::deserialize(&value)?;
            if record.from >= from && record.to <= to {
                records.push(record);
            }
        }

        Ok(records)
    }
}
