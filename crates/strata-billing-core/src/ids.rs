//! Identifier types for strata-billing.
//!
//! This module provides strongly-typed identifiers for the actors of the
//! billing domain. Customers, spaces and providers are all addressed by DID,
//! each with a fixed method prefix.
//!
//! # Macro-based DID Types
//!
//! The `did_type!` macro reduces boilerplate for DID-based identifier types,
//! ensuring consistent implementation of validation, serialization, parsing
//! and display traits.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Macro to define a DID-based identifier type with standard trait
/// implementations.
///
/// This macro generates a newtype wrapper around `String` with
/// implementations for:
/// - `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - `Serialize`, `Deserialize` (as string, validated)
/// - `FromStr`, `Display`, `Debug`
/// - `TryFrom<String>`, `Into<String>`
/// - `AsRef<str>`
///
/// The generated `parse` path rejects any string that does not start with
/// the given DID method prefix.
macro_rules! did_type {
    ($name:ident, $prefix:expr, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// The DID method prefix required of this identifier type.
            pub const PREFIX: &'static str = $prefix;

            /// Return the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Return the bytes of the DID string.
            #[must_use]
            pub fn as_bytes(&self) -> &[u8] {
                self.0.as_bytes()
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                if !s.starts_with(Self::PREFIX) || s.len() == Self::PREFIX.len() {
                    return Err(IdError::InvalidDid {
                        expected: Self::PREFIX,
                        value: s.to_string(),
                    });
                }
                Ok(Self(s.to_string()))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

// Define DID-based identifier types using the macro
did_type!(
    CustomerDid,
    "did:mailto:",
    "A customer identifier (`did:mailto:` DID).\n\nCustomers are accounts that pay for storage across one or more spaces."
);
did_type!(
    SpaceDid,
    "did:key:",
    "A space identifier (`did:key:` DID).\n\nA space is a named collection of stored content whose size is metered."
);
did_type!(
    ProviderDid,
    "did:web:",
    "A storage provider identifier (`did:web:` DID)."
);

/// The identifier of the invocation that caused a size change.
///
/// Causes are content identifiers (CIDs) of invocation receipts. They are
/// opaque to the billing engine, which only relies on them being unique per
/// invocation (upstream deduplication) and stably ordered as byte strings
/// (tie-breaking diffs that share a receipt time).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Cause(String);

impl Cause {
    /// Return the cause as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Return the bytes of the cause identifier.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl FromStr for Cause {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(IdError::EmptyCause);
        }
        Ok(Self(s.to_string()))
    }
}

impl fmt::Debug for Cause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cause({})", self.0)
    }
}

impl fmt::Display for Cause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Cause {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Cause> for String {
    fn from(id: Cause) -> Self {
        id.0
    }
}

impl AsRef<str> for Cause {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Errors that can occur when parsing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// The input does not carry the required DID method prefix.
    #[error("invalid DID, expected `{expected}...`: {value}")]
    InvalidDid {
        /// The DID method prefix the type requires.
        expected: &'static str,
        /// The rejected input.
        value: String,
    },

    /// The cause identifier is empty.
    #[error("empty cause identifier")]
    EmptyCause,
}
