//! CrossLedger Anomaly Detection
//!
//! Statistical and structural checks over a reconciled batch, in five
//! categories: financial, volume, timing, relationship, and data quality.
//!
//! Every rule is a pure function over the immutable snapshot and link
//! batch. Rules are independently computable and order-insensitive, and
//! none of them can fail, so the crate exposes no error type. Thresholds
//! come from `recon_core::AnomalyConfig`, handed in at construction.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod detector;
pub mod financial;
pub mod quality;
pub mod relationship;
pub mod stats;
pub mod timing;
pub mod types;
pub mod volume;

// Re-exports
pub use detector::AnomalyDetector;
pub use types::{AnomalyCategory, AnomalyFinding, Severity};
