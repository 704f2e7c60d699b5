//! CrossLedger Reconciliation Core
//!
//! Record model, reference normalization, multi-strategy matching, and
//! ledger routing shared by the reconciliation engine.
//!
//! # Invariants
//!
//! - Raw references are never mutated; canonical forms are derived once and
//!   are comparison-stable
//! - Matching is deterministic: identical inputs produce identical outcomes
//! - Strategy order is fixed; a success short-circuits remaining strategies
//! - No component reads process-wide state; configuration is passed in

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod config;
pub mod error;
pub mod matcher;
pub mod normalize;
pub mod router;
pub mod snapshot;
pub mod types;

// Re-exports
pub use config::{AnomalyConfig, PairingConfig, ReconConfig};
pub use error::{Error, Result};
pub use matcher::{MatchCandidate, MatchOutcome, MatchStats, MatchStrategy, ReferenceMatcher};
pub use normalize::{normalize, normalize_opt, CanonicalRef};
pub use router::{KeyField, LedgerRouter, RouteTarget};
pub use snapshot::LedgerSnapshot;
pub use types::{
    AuthorizationKind, AuthorizationRecord, CounterpartyId, ItemId, KeySet, LedgerKind,
    MovementRecord, MovementType, PaymentRecord, PaymentType, Period, StatisticsRecord,
};
