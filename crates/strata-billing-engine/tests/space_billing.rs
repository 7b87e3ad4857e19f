//! Accounting engine integration tests against the RocksDB store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tempfile::TempDir;

use strata_billing_core::{
    BillingInstruction, ByteMs, CustomerDid, ProviderDid, SpaceDid, SpaceDiff, SpaceSnapshot,
    UsageRecord,
};
use strata_billing_engine::{
    calculate_period_usage, store_space_usage, BillingError, SpaceBillingContext,
};
use strata_billing_store::{
    RocksStore, SpaceDiffStore, SpaceSnapshotStore, StoreError, UsageStore,
};

const HOUR_MS: i64 = 60 * 60 * 1000;
const DAY_MS: i64 = 24 * HOUR_MS;
const GIB: i64 = 1024 * 1024 * 1024;

fn create_test_store() -> (RocksStore, TempDir) {
    let dir = TempDir::new().unwrap();
    let store = RocksStore::open(dir.path()).unwrap();
    (store, dir)
}

fn ctx(store: &RocksStore) -> SpaceBillingContext<'_> {
    SpaceBillingContext {
        space_diff_store: store,
        space_snapshot_store: store,
        usage_store: store,
    }
}

fn provider() -> ProviderDid {
    "did:web:storage.example.net".parse().unwrap()
}

fn space() -> SpaceDid {
    "did:key:z6MkhaXgBZDvotDkL5257faiztiGiC2QtKLGpbnnEGta2doK"
        .parse()
        .unwrap()
}

fn customer() -> CustomerDid {
    "did:mailto:alice@example.com".parse().unwrap()
}

fn at(s: &str) -> DateTime<Utc> {
    s.parse().unwrap()
}

fn instruction(from: &str, to: &str) -> BillingInstruction {
    BillingInstruction {
        customer: customer(),
        account: "stripe:cus_test".to_string(),
        product: "lite".to_string(),
        provider: provider(),
        space: space(),
        from: at(from),
        to: at(to),
    }
}

fn diff(receipt_at: &str, cause: &str, delta: i64) -> SpaceDiff {
    SpaceDiff {
        provider: provider(),
        space: space(),
        subscription: "sub-1".to_string(),
        cause: cause.parse().unwrap(),
        delta,
        receipt_at: at(receipt_at),
        inserted_at: Utc::now(),
    }
}

fn snapshot(recorded_at: &str, size: u64) -> SpaceSnapshot {
    SpaceSnapshot {
        provider: provider(),
        space: space(),
        size,
        recorded_at: at(recorded_at),
        inserted_at: Utc::now(),
    }
}

fn ledger_record(from: &str, to: &str, usage: i128) -> UsageRecord {
    UsageRecord {
        customer: customer(),
        account: "stripe:cus_test".to_string(),
        product: "lite".to_string(),
        provider: provider(),
        space: space(),
        from: at(from),
        to: at(to),
        usage: ByteMs::new(usage),
        inserted_at: Utc::now(),
    }
}

async fn settle(store: &RocksStore, inst: &BillingInstruction) -> ByteMs {
    let calculation = calculate_period_usage(inst, &ctx(store)).await.unwrap();
    store_space_usage(inst, &calculation, &ctx(store)).await.unwrap();
    calculation.usage
}

// ============================================================================
// Integral correctness
// ============================================================================

#[tokio::test]
async fn single_item_added_at_period_start_bills_the_whole_period() {
    let (store, _dir) = create_test_store();
    let delta = GIB;

    store
        .batch_put(&[diff("2024-03-01T00:00:00Z", "bafya", delta)])
        .await
        .unwrap();

    let inst = instruction("2024-03-01T00:00:00Z", "2024-04-01T00:00:00Z");
    let calculation = calculate_period_usage(&inst, &ctx(&store)).await.unwrap();
    store_space_usage(&inst, &calculation, &ctx(&store)).await.unwrap();

    // 1 GiB for the whole 31-day period.
    assert_eq!(calculation.usage, ByteMs::of(delta, 31 * DAY_MS));
    assert_eq!(calculation.size, u64::try_from(delta).unwrap());

    let snap = store
        .latest_at_or_before(&provider(), &space(), at("2024-04-01T00:00:00Z"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(snap.size, u64::try_from(delta).unwrap());
    assert_eq!(snap.recorded_at, at("2024-04-01T00:00:00Z"));
}

#[tokio::test]
async fn intra_period_diffs_are_interval_weighted_not_flat_rate() {
    let (store, _dir) = create_test_store();

    // Day 1: 100 bytes all day. Day 2: +50 at noon.
    store
        .batch_put(&[
            diff("2024-03-01T00:00:00Z", "bafya", 100),
            diff("2024-03-02T12:00:00Z", "bafyb", 50),
        ])
        .await
        .unwrap();

    let day1 = settle(
        &store,
        &instruction("2024-03-01T00:00:00Z", "2024-03-02T00:00:00Z"),
    )
    .await;
    assert_eq!(day1, ByteMs::of(100, DAY_MS));

    let day2 = settle(
        &store,
        &instruction("2024-03-02T00:00:00Z", "2024-03-03T00:00:00Z"),
    )
    .await;

    // Day 2 contributes 100×12h + 150×12h; cumulative adds day 1's 100×24h.
    let expected =
        ByteMs::of(100, DAY_MS) + ByteMs::of(100, 12 * HOUR_MS) + ByteMs::of(150, 12 * HOUR_MS);
    assert_eq!(day2, expected);

    // Never the flat-rate readings.
    assert_ne!(day2, ByteMs::of(150, 2 * DAY_MS));
    assert_ne!(day2, ByteMs::of(100, 2 * DAY_MS));
}

#[tokio::test]
async fn removal_between_additions_reduces_the_remainder_of_the_period() {
    let (store, _dir) = create_test_store();

    store
        .batch_put(&[
            diff("2024-03-01T00:00:00Z", "bafya", 100),
            diff("2024-03-01T06:00:00Z", "bafyb", -40),
            diff("2024-03-01T18:00:00Z", "bafyc", 20),
        ])
        .await
        .unwrap();

    let inst = instruction("2024-03-01T00:00:00Z", "2024-03-02T00:00:00Z");
    let calculation = calculate_period_usage(&inst, &ctx(&store)).await.unwrap();

    let expected = ByteMs::of(100, 6 * HOUR_MS)
        + ByteMs::of(60, 12 * HOUR_MS)
        + ByteMs::of(80, 6 * HOUR_MS);
    assert_eq!(calculation.usage, expected);
    assert_eq!(calculation.size, 80);
}

#[tokio::test]
async fn full_removal_half_way_bills_half_the_period() {
    let (store, _dir) = create_test_store();
    let delta = GIB;

    SpaceSnapshotStore::put(&store, &snapshot("2024-03-01T00:00:00Z", 0))
        .await
        .unwrap();
    store
        .batch_put(&[
            diff("2024-03-01T00:00:00Z", "bafya", delta),
            // removed exactly half way through the month
            diff("2024-03-16T12:00:00Z", "bafyb", -delta),
        ])
        .await
        .unwrap();

    let inst = instruction("2024-03-01T00:00:00Z", "2024-04-01T00:00:00Z");
    let calculation = calculate_period_usage(&inst, &ctx(&store)).await.unwrap();

    assert_eq!(calculation.usage, ByteMs::of(delta, 31 * DAY_MS / 2));
    assert_eq!(calculation.size, 0);
}

#[tokio::test]
async fn considers_existing_space_size_from_snapshot() {
    let (store, _dir) = create_test_store();
    let size = 1024_u64.pow(4); // 1 TiB
    let delta = GIB;

    SpaceSnapshotStore::put(&store, &snapshot("2024-03-01T00:00:00Z", size))
        .await
        .unwrap();
    // store/add 24h prior to end of billing
    store
        .batch_put(&[diff("2024-03-31T00:00:00Z", "bafya", delta)])
        .await
        .unwrap();

    let inst = instruction("2024-03-01T00:00:00Z", "2024-04-01T00:00:00Z");
    let calculation = calculate_period_usage(&inst, &ctx(&store)).await.unwrap();

    let expected = ByteMs::of(i64::try_from(size).unwrap(), 31 * DAY_MS) + ByteMs::of(delta, DAY_MS);
    assert_eq!(calculation.usage, expected);
    assert_eq!(calculation.size, size + u64::try_from(delta).unwrap());
}

#[tokio::test]
async fn diff_stamped_exactly_at_period_end_belongs_to_the_next_period() {
    let (store, _dir) = create_test_store();

    store
        .batch_put(&[
            diff("2024-03-01T00:00:00Z", "bafya", 100),
            diff("2024-03-02T00:00:00Z", "bafyb", 999),
        ])
        .await
        .unwrap();

    let inst = instruction("2024-03-01T00:00:00Z", "2024-03-02T00:00:00Z");
    let calculation = calculate_period_usage(&inst, &ctx(&store)).await.unwrap();

    assert_eq!(calculation.usage, ByteMs::of(100, DAY_MS));
    assert_eq!(calculation.size, 100);
}

// ============================================================================
// Snapshot lookback
// ============================================================================

#[tokio::test]
async fn lookback_uses_only_the_latest_snapshot_at_or_before_from() {
    let (store, _dir) = create_test_store();

    SpaceSnapshotStore::put(&store, &snapshot("2024-03-01T00:00:00Z", 100))
        .await
        .unwrap();
    SpaceSnapshotStore::put(&store, &snapshot("2024-03-03T00:00:00Z", 200))
        .await
        .unwrap();
    // Recorded after `from`; describes a future state, must never be used.
    SpaceSnapshotStore::put(&store, &snapshot("2024-03-10T00:00:00Z", 999))
        .await
        .unwrap();

    store
        .batch_put(&[diff("2024-03-04T00:00:00Z", "bafya", 50)])
        .await
        .unwrap();

    UsageStore::put(
        &store,
        &ledger_record("2024-03-04T00:00:00Z", "2024-03-05T00:00:00Z", 7_000),
    )
    .await
    .unwrap();

    let inst = instruction("2024-03-05T00:00:00Z", "2024-03-06T00:00:00Z");
    let calculation = calculate_period_usage(&inst, &ctx(&store)).await.unwrap();

    // Size at `from` is the 2024-03-03 snapshot (200) plus the replayed
    // +50 diff; the 2024-03-10 snapshot is invisible.
    assert_eq!(calculation.size, 250);
    assert_eq!(calculation.usage, ByteMs::new(7_000) + ByteMs::of(250, DAY_MS));
}

#[tokio::test]
async fn tolerates_a_snapshot_gap_spanning_months() {
    let (store, _dir) = create_test_store();

    SpaceSnapshotStore::put(&store, &snapshot("2024-01-15T00:00:00Z", 100))
        .await
        .unwrap();
    store
        .batch_put(&[diff("2024-02-10T00:00:00Z", "bafya", 50)])
        .await
        .unwrap();

    let inst = instruction("2024-03-01T00:00:00Z", "2024-03-02T00:00:00Z");
    let calculation = calculate_period_usage(&inst, &ctx(&store)).await.unwrap();

    assert_eq!(calculation.size, 150);
    assert_eq!(calculation.usage, ByteMs::of(150, DAY_MS));
}

#[tokio::test]
async fn absent_snapshot_means_empty_space_plus_full_replay() {
    let (store, _dir) = create_test_store();

    let inst = instruction("2024-03-01T00:00:00Z", "2024-03-02T00:00:00Z");
    let calculation = calculate_period_usage(&inst, &ctx(&store)).await.unwrap();

    assert_eq!(calculation.size, 0);
    assert_eq!(calculation.usage, ByteMs::ZERO);
}

// ============================================================================
// Month-to-date chaining
// ============================================================================

#[tokio::test]
async fn month_start_resets_the_cumulative_chain() {
    let (store, _dir) = create_test_store();

    // A large prior-month total that must not leak into March.
    UsageStore::put(
        &store,
        &ledger_record(
            "2024-02-29T00:00:00Z",
            "2024-03-01T00:00:00Z",
            1_000_000_000_000,
        ),
    )
    .await
    .unwrap();
    SpaceSnapshotStore::put(&store, &snapshot("2024-03-01T00:00:00Z", 100))
        .await
        .unwrap();

    let inst = instruction("2024-03-01T00:00:00Z", "2024-03-02T00:00:00Z");
    let calculation = calculate_period_usage(&inst, &ctx(&store)).await.unwrap();

    assert_eq!(calculation.usage, ByteMs::of(100, DAY_MS));
}

#[tokio::test]
async fn chained_accumulation_over_diff_free_days() {
    let (store, _dir) = create_test_store();
    let size = 4096_i64;

    store
        .batch_put(&[diff("2024-03-01T00:00:00Z", "bafya", size)])
        .await
        .unwrap();

    let daily = ByteMs::of(size, DAY_MS);
    let days = [
        ("2024-03-01T00:00:00Z", "2024-03-02T00:00:00Z"),
        ("2024-03-02T00:00:00Z", "2024-03-03T00:00:00Z"),
        ("2024-03-03T00:00:00Z", "2024-03-04T00:00:00Z"),
        ("2024-03-04T00:00:00Z", "2024-03-05T00:00:00Z"),
    ];

    for (n, (from, to)) in days.iter().enumerate() {
        let cumulative = settle(&store, &instruction(from, to)).await;
        let expected: ByteMs = std::iter::repeat(daily).take(n + 1).sum();
        assert_eq!(cumulative, expected, "after day {}", n + 1);
    }
}

#[tokio::test]
async fn missing_previous_usage_fails_and_writes_nothing() {
    let (store, _dir) = create_test_store();

    SpaceSnapshotStore::put(&store, &snapshot("2024-03-05T00:00:00Z", 10))
        .await
        .unwrap();

    let inst = instruction("2024-03-05T00:00:00Z", "2024-03-06T00:00:00Z");
    let result = calculate_period_usage(&inst, &ctx(&store)).await;

    match result {
        Err(BillingError::MissingPreviousUsage { space: s, from, .. }) => {
            assert_eq!(s, space());
            assert_eq!(from, at("2024-03-05T00:00:00Z"));
        }
        other => panic!("expected MissingPreviousUsage, got {other:?}"),
    }

    // Nothing was settled: no ledger record, no new snapshot.
    let records = store
        .list_by_customer(&customer(), at("2024-03-01T00:00:00Z"), at("2024-04-01T00:00:00Z"))
        .await
        .unwrap();
    assert!(records.is_empty());

    let snap = store
        .latest_at_or_before(&provider(), &space(), at("2024-03-06T00:00:00Z"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(snap.recorded_at, at("2024-03-05T00:00:00Z"));
}

#[tokio::test]
async fn ledger_failure_is_not_treated_as_missing_history() {
    struct FailingUsageStore;

    #[async_trait]
    impl UsageStore for FailingUsageStore {
        async fn put(&self, _usage: &UsageRecord) -> strata_billing_store::Result<()> {
            Err(StoreError::Database("usage ledger unavailable".to_string()))
        }

        async fn get_period_ending_at(
            &self,
            _customer: &CustomerDid,
            _provider: &ProviderDid,
            _space: &SpaceDid,
            _to: DateTime<Utc>,
        ) -> strata_billing_store::Result<Option<UsageRecord>> {
            Err(StoreError::Database("usage ledger unavailable".to_string()))
        }

        async fn list_by_customer(
            &self,
            _customer: &CustomerDid,
            _from: DateTime<Utc>,
            _to: DateTime<Utc>,
        ) -> strata_billing_store::Result<Vec<UsageRecord>> {
            Err(StoreError::Database("usage ledger unavailable".to_string()))
        }
    }

    let (store, _dir) = create_test_store();
    let failing = FailingUsageStore;
    let ctx = SpaceBillingContext {
        space_diff_store: &store,
        space_snapshot_store: &store,
        usage_store: &failing,
    };

    let inst = instruction("2024-03-05T00:00:00Z", "2024-03-06T00:00:00Z");
    let result = calculate_period_usage(&inst, &ctx).await;

    assert!(
        matches!(result, Err(BillingError::Store(StoreError::Database(_)))),
        "a transport failure must propagate unchanged, got {result:?}"
    );
}

// ============================================================================
// Settlement
// ============================================================================

#[tokio::test]
async fn resettling_a_period_is_idempotent() {
    let (store, _dir) = create_test_store();

    store
        .batch_put(&[diff("2024-03-01T00:00:00Z", "bafya", 100)])
        .await
        .unwrap();

    let day1 = instruction("2024-03-01T00:00:00Z", "2024-03-02T00:00:00Z");
    let day2 = instruction("2024-03-02T00:00:00Z", "2024-03-03T00:00:00Z");
    settle(&store, &day1).await;
    let first = settle(&store, &day2).await;

    // Re-run the whole second instruction, as a retry after a timeout
    // would.
    let second = settle(&store, &day2).await;
    assert_eq!(first, second);

    let records = store
        .list_by_customer(&customer(), at("2024-03-02T00:00:00Z"), at("2024-03-03T00:00:00Z"))
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].usage, first);

    let snap = store
        .latest_at_or_before(&provider(), &space(), at("2024-03-03T00:00:00Z"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(snap.size, 100);
    assert_eq!(snap.recorded_at, at("2024-03-03T00:00:00Z"));
}

#[tokio::test]
async fn empty_period_is_rejected() {
    let (store, _dir) = create_test_store();

    let inst = instruction("2024-03-02T00:00:00Z", "2024-03-02T00:00:00Z");
    let result = calculate_period_usage(&inst, &ctx(&store)).await;
    assert!(matches!(result, Err(BillingError::InvalidPeriod { .. })));
}

#[tokio::test]
async fn inconsistent_history_refuses_to_snapshot_negative_size() {
    let (store, _dir) = create_test_store();

    // A removal with no matching addition anywhere in the log.
    store
        .batch_put(&[diff("2024-03-01T06:00:00Z", "bafya", -500)])
        .await
        .unwrap();

    let inst = instruction("2024-03-01T00:00:00Z", "2024-03-02T00:00:00Z");
    let result = calculate_period_usage(&inst, &ctx(&store)).await;
    assert!(matches!(result, Err(BillingError::SizeOutOfRange { .. })));
}
