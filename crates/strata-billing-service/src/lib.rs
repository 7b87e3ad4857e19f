//! Strata Billing Service — operational HTTP surface for the accounting
//! engine.
//!
//! This crate exposes the engine's data-level boundary over HTTP:
//!
//! - Diff-log ingestion for the upstream stream processor
//! - Billing-instruction execution for the external scheduler
//! - The account-usage reporting read surface
//!
//! # Authentication
//!
//! All `/v1` endpoints require service-to-service authentication via the
//! `x-api-key` header; callers identify themselves with `x-service-name`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Handlers need async for routing consistency

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::ServiceConfig;
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
