//! Anomaly detection entry point
//!
//! Runs every rule set over one immutable snapshot and its link batch.
//! Rules are independent and order-insensitive; detection never mutates
//! ledger or link data, and the combined result is sorted for stable
//! output.

use crate::types::AnomalyFinding;
use crate::{financial, quality, relationship, timing, volume};
use linkage::LinkBatch;
use recon_core::{AnomalyConfig, LedgerSnapshot};
use std::collections::BTreeMap;

/// Runs the anomaly rule sets from an immutable configuration
pub struct AnomalyDetector {
    config: AnomalyConfig,
}

impl AnomalyDetector {
    /// Create a detector
    pub fn new(config: AnomalyConfig) -> Self {
        Self { config }
    }

    /// Run all rules over one reconciliation run's data
    pub fn detect(&self, snapshot: &LedgerSnapshot, batch: &LinkBatch) -> Vec<AnomalyFinding> {
        let mut findings = Vec::new();
        findings.extend(financial::detect(snapshot, &self.config));
        findings.extend(volume::detect(snapshot, &self.config));
        findings.extend(timing::detect(snapshot, &self.config));
        findings.extend(relationship::detect(snapshot, batch, &self.config));
        findings.extend(quality::detect(snapshot, batch));

        findings.sort_by(|a, b| {
            a.category
                .cmp(&b.category)
                .then_with(|| b.severity.cmp(&a.severity))
                .then_with(|| a.subject_references.cmp(&b.subject_references))
                .then_with(|| a.description.cmp(&b.description))
        });

        let mut per_category: BTreeMap<&str, usize> = BTreeMap::new();
        for finding in &findings {
            *per_category.entry(finding.category.code()).or_default() += 1;
        }
        tracing::info!(total = findings.len(), ?per_category, "anomaly detection complete");

        findings
    }
}
