//! Application state.

use std::sync::Arc;

use strata_billing_engine::SpaceBillingContext;
use strata_billing_store::RocksStore;

use crate::config::ServiceConfig;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The storage backend, implementing all three engine store contracts.
    pub store: Arc<RocksStore>,

    /// Service configuration.
    pub config: ServiceConfig,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(store: Arc<RocksStore>, config: ServiceConfig) -> Self {
        if config.service_api_key.is_none() {
            tracing::warn!("SERVICE_API_KEY not configured - all /v1 requests will be rejected");
        }

        Self { store, config }
    }

    /// The store context billing instructions are processed against.
    #[must_use]
    pub fn billing_ctx(&self) -> SpaceBillingContext<'_> {
        SpaceBillingContext {
            space_diff_store: &*self.store,
            space_snapshot_store: &*self.store,
            usage_store: &*self.store,
        }
    }
}
