//! CrossLedger Link Building
//!
//! Builds reconciliation links from an immutable ledger snapshot: routes
//! every movement and payment to its authorization ledger, matches
//! references with the ordered strategies, and propagates invoice links to
//! paired cheque records.
//!
//! # Invariants
//!
//! - One link per movement and payment record, created once
//! - The only post-creation mutation is adopting an inherited resolution
//!   into an unresolved link; direct matches always take precedence
//! - Partitions never split a counterparty's payment sequence

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod engine;
pub mod error;
pub mod inheritance;
pub mod link;
pub mod partition;

// Re-exports
pub use engine::{LinkBatch, LinkEngine, UnroutableRecord};
pub use error::{Error, Result};
pub use inheritance::PairLinker;
pub use link::{LinkResolution, LinkSet, LinkSource, ReconciliationLink};
pub use partition::{partition_snapshot, BatchPartition};
