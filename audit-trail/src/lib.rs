//! CrossLedger Audit Trail Assembly
//!
//! Assembles, per canonical reference, the cross-ledger lineage an auditor
//! needs: movement, authorization, settling payments, and statistics, with a
//! completeness score over the four layers. Also produces the run summary
//! consumed by reporting and export collaborators.
//!
//! Assembly is atomic per reference and idempotent over one snapshot; no
//! operation here can fail, so the crate exposes no error type.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod assembler;
pub mod summary;
pub mod trail;

// Re-exports
pub use assembler::TrailAssembler;
pub use summary::{summarize, MatchRate, ReconciliationSummary};
pub use trail::{AuditTrail, TRAIL_LAYERS};
