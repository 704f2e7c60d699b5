//! Reconciliation run summary
//!
//! Aggregate statistics for downstream reporting and export collaborators:
//! record totals per ledger, match rates per transaction type, per-strategy
//! usage, and cross-ledger coverage.

use crate::trail::AuditTrail;
use chrono::{DateTime, Utc};
use linkage::{LinkBatch, LinkSource};
use recon_core::{AuthorizationKind, LedgerKind, LedgerSnapshot};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Match-rate counters for one transaction type
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchRate {
    /// Records of this type processed
    pub total: u64,
    /// Records whose link resolved, directly or by inheritance
    pub matched: u64,
}

impl MatchRate {
    /// Matched fraction in [0, 1]; zero when nothing was processed
    pub fn rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.matched as f64 / self.total as f64
        }
    }
}

/// Aggregate result of one reconciliation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationSummary {
    /// Run identifier
    pub run_id: Uuid,

    /// Generation timestamp
    pub generated_at: DateTime<Utc>,

    /// Record totals per ledger kind
    pub record_counts: BTreeMap<String, u64>,

    /// Match rates per transaction type (`movement/issue`, `payment/cheque`, …)
    pub match_rates: BTreeMap<String, MatchRate>,

    /// Winning-strategy counts per strategy code
    pub strategy_usage: BTreeMap<String, u64>,

    /// Links created by pair inheritance
    pub inherited_links: u64,

    /// Records with no routing rule
    pub unroutable_records: u64,

    /// Ties resolved by the deterministic tie-break
    pub ambiguous_matches: u64,

    /// References no strategy could resolve
    pub unmatched_references: u64,

    /// Trails assembled in the run
    pub trails_assembled: u64,

    /// Mean completeness score across assembled trails
    pub average_completeness: f64,

    /// Movements whose link resolved, percent
    pub movement_authorization_coverage_pct: f64,

    /// Receipt authorizations with at least one settling payment, percent
    pub authorization_payment_coverage_pct: f64,
}

/// Build the summary for one run
pub fn summarize(
    snapshot: &LedgerSnapshot,
    batch: &LinkBatch,
    trails: &[AuditTrail],
) -> ReconciliationSummary {
    let mut record_counts: BTreeMap<String, u64> = BTreeMap::new();
    record_counts.insert(
        LedgerKind::Movement.code().to_string(),
        snapshot.movements().len() as u64,
    );
    for kind in [
        AuthorizationKind::Issue,
        AuthorizationKind::Receipt,
        AuthorizationKind::PaymentVoucher,
        AuthorizationKind::Redundancy,
    ] {
        record_counts.insert(
            LedgerKind::Authorization(kind).code().to_string(),
            snapshot.authorizations_of(kind).count() as u64,
        );
    }
    record_counts.insert(
        LedgerKind::Payment.code().to_string(),
        snapshot.payments().len() as u64,
    );
    record_counts.insert(
        LedgerKind::Statistics.code().to_string(),
        snapshot.statistics().len() as u64,
    );

    let mut match_rates: BTreeMap<String, MatchRate> = BTreeMap::new();
    let mut movements_matched = 0u64;
    for movement in snapshot.movements() {
        let key = format!("movement/{}", movement.movement_type.code());
        let entry = match_rates.entry(key).or_default();
        entry.total += 1;
        let resolved = batch
            .links
            .link_for(movement.record_id)
            .map_or(false, |l| l.is_resolved());
        if resolved {
            entry.matched += 1;
            movements_matched += 1;
        }
    }
    for payment in snapshot.payments() {
        let key = format!("payment/{}", payment.payment_type.code());
        let entry = match_rates.entry(key).or_default();
        entry.total += 1;
        if batch
            .links
            .link_for(payment.record_id)
            .map_or(false, |l| l.is_resolved())
        {
            entry.matched += 1;
        }
    }

    let movement_total = snapshot.movements().len() as u64;
    let movement_authorization_coverage_pct = if movement_total == 0 {
        0.0
    } else {
        movements_matched as f64 / movement_total as f64 * 100.0
    };

    // Receipt authorizations settled by at least one payment link
    let mut receipts = 0u64;
    let mut receipts_paid = 0u64;
    for authorization in snapshot.authorizations_of(AuthorizationKind::Receipt) {
        receipts += 1;
        let paid = batch
            .links
            .links_to(authorization.record_id)
            .any(|link| matches!(link.source, LinkSource::Payment(_)));
        if paid {
            receipts_paid += 1;
        }
    }
    let authorization_payment_coverage_pct = if receipts == 0 {
        0.0
    } else {
        receipts_paid as f64 / receipts as f64 * 100.0
    };

    let average_completeness = if trails.is_empty() {
        0.0
    } else {
        trails.iter().map(|t| t.completeness_score).sum::<f64>() / trails.len() as f64
    };

    ReconciliationSummary {
        run_id: Uuid::new_v4(),
        generated_at: Utc::now(),
        record_counts,
        match_rates,
        strategy_usage: batch.stats.successes_by_code().clone(),
        inherited_links: batch.inherited_count,
        unroutable_records: batch.unroutable.len() as u64,
        ambiguous_matches: batch.stats.ambiguous(),
        unmatched_references: batch.stats.unmatched(),
        trails_assembled: trails.len() as u64,
        average_completeness,
        movement_authorization_coverage_pct,
        authorization_payment_coverage_pct,
    }
}
