//! Account usage reporting handlers.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use strata_billing_core::{ByteMs, CustomerDid, ProviderDid, SpaceDid, UsageRecord};
use strata_billing_store::UsageStore;

use crate::auth::ServiceAuth;
use crate::error::ApiError;
use crate::state::AppState;

/// Reporting window query parameters.
#[derive(Debug, Deserialize)]
pub struct UsageReportQuery {
    /// Window start (inclusive).
    pub from: DateTime<Utc>,
    /// Window end (exclusive).
    pub to: DateTime<Utc>,
}

/// Usage of one space within the reporting window.
#[derive(Debug, Serialize)]
pub struct SpaceUsageSummary {
    /// The space.
    pub space: SpaceDid,
    /// Storage provider for the space.
    pub provider: ProviderDid,
    /// Start of the most recent settled period.
    pub from: DateTime<Utc>,
    /// End of the most recent settled period.
    pub to: DateTime<Utc>,
    /// Cumulative month-to-date usage as of `to`, in byte·milliseconds.
    pub usage: ByteMs,
}

/// Aggregate usage report for a customer.
#[derive(Debug, Serialize)]
pub struct UsageReportResponse {
    /// The customer the report covers.
    pub customer: CustomerDid,
    /// Window start (inclusive).
    pub from: DateTime<Utc>,
    /// Window end (exclusive).
    pub to: DateTime<Utc>,
    /// Total usage across all spaces and providers, in byte·milliseconds.
    pub total: ByteMs,
    /// Per-space breakdown.
    pub spaces: Vec<SpaceUsageSummary>,
}

/// Build a customer's usage report for a time window.
///
/// A space settles one ledger record per billing period, so several
/// records per space can fall inside the window; each (space, provider)
/// contributes its most recent record, whose `usage` is the month-to-date
/// cumulative total as of that record's period end.
pub async fn customer_usage_report(
    State(state): State<Arc<AppState>>,
    _auth: ServiceAuth,
    Path(customer): Path<String>,
    Query(query): Query<UsageReportQuery>,
) -> Result<Json<UsageReportResponse>, ApiError> {
    let customer: CustomerDid = customer
        .parse()
        .map_err(|_| ApiError::BadRequest("Invalid customer DID".into()))?;

    let records = state
        .store
        .list_by_customer(&customer, query.from, query.to)
        .await?;

    let mut latest: BTreeMap<(SpaceDid, ProviderDid), UsageRecord> = BTreeMap::new();
    for record in records {
        let key = (record.space.clone(), record.provider.clone());
        let newer = latest
            .get(&key)
            .map_or(true, |existing| record.to > existing.to);
        if newer {
            latest.insert(key, record);
        }
    }

    let total = latest.values().map(|r| r.usage).sum();
    let spaces = latest
        .into_values()
        .map(|r| SpaceUsageSummary {
            space: r.space,
            provider: r.provider,
            from: r.from,
            to: r.to,
            usage: r.usage,
        })
        .collect();

    Ok(Json(UsageReportResponse {
        customer,
        from: query.from,
        to: query.to,
        total,
        spaces,
    }))
}
