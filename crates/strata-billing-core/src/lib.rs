//! Core types and utilities for strata-billing.
//!
//! This crate provides the foundational types used throughout the strata
//! billing platform:
//!
//! - **Identifiers**: `CustomerDid`, `SpaceDid`, `ProviderDid`, `Cause`
//! - **Records**: `SpaceDiff`, `SpaceSnapshot`, `UsageRecord`
//! - **Work items**: `BillingInstruction`
//! - **Quantities**: `ByteMs`
//! - **Calendar**: billing period helpers in [`period`]
//!
//! # Usage unit
//!
//! **Usage is metered in byte·milliseconds**: the time-weighted integral of
//! a space's stored size over a billing period. A terabyte held for a month
//! is on the order of 2.6×10²¹ byte·ms, which overflows `i64`, so usage
//! arithmetic is carried in [`ByteMs`], an `i128` newtype.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod diff;
pub mod ids;
pub mod instruction;
pub mod period;
pub mod snapshot;
pub mod usage;

pub use diff::SpaceDiff;
pub use ids::{Cause, CustomerDid, IdError, ProviderDid, SpaceDid};
pub use instruction::BillingInstruction;
pub use snapshot::SpaceSnapshot;
pub use usage::{ByteMs, UsageRecord};
