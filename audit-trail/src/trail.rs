//! Audit trail objects
//!
//! One trail per canonical reference, aggregating the records the four
//! ledgers hold for it. Trails are pure derived output; recomputation over
//! the same snapshot yields the same trail.

use chrono::{DateTime, Utc};
use recon_core::CanonicalRef;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Ledger layers a trail can contain
pub const TRAIL_LAYERS: u8 = 4;

/// Cross-ledger lineage for one canonical reference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditTrail {
    /// Reference the trail was assembled for
    pub canonical_reference: CanonicalRef,

    /// Movement record, where the ledger has one
    pub movement: Option<Uuid>,

    /// Matched authorization record
    pub authorization: Option<Uuid>,

    /// Payment records whose links resolve to the authorization, or whose
    /// own reference matches
    pub payments: Vec<Uuid>,

    /// Statistics records for the same counterparty and period
    pub statistics: Vec<Uuid>,

    /// Fraction of the four ledger layers present, in [0, 1]
    pub completeness_score: f64,

    /// Assembly timestamp
    pub assembled_at: DateTime<Utc>,
}

impl AuditTrail {
    /// Build a trail, deriving the completeness score from the layers
    pub fn new(
        canonical_reference: CanonicalRef,
        movement: Option<Uuid>,
        authorization: Option<Uuid>,
        payments: Vec<Uuid>,
        statistics: Vec<Uuid>,
    ) -> Self {
        let mut present = 0u8;
        if movement.is_some() {
            present += 1;
        }
        if authorization.is_some() {
            present += 1;
        }
        if !payments.is_empty() {
            present += 1;
        }
        if !statistics.is_empty() {
            present += 1;
        }

        Self {
            canonical_reference,
            movement,
            authorization,
            payments,
            statistics,
            completeness_score: f64::from(present) / f64::from(TRAIL_LAYERS),
            assembled_at: Utc::now(),
        }
    }

    /// Number of ledger layers present (0–4)
    pub fn present_layers(&self) -> u8 {
        (self.completeness_score * f64::from(TRAIL_LAYERS)).round() as u8
    }

    /// Whether every layer is present
    pub fn is_complete(&self) -> bool {
        self.present_layers() == TRAIL_LAYERS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> CanonicalRef {
        CanonicalRef::Value("89322".into())
    }

    #[test]
    fn test_score_counts_layers() {
        let empty = AuditTrail::new(reference(), None, None, vec![], vec![]);
        assert_eq!(empty.completeness_score, 0.0);
        assert_eq!(empty.present_layers(), 0);

        let half = AuditTrail::new(reference(), Some(Uuid::now_v7()), None, vec![Uuid::now_v7()], vec![]);
        assert_eq!(half.completeness_score, 0.5);

        let full = AuditTrail::new(
            reference(),
            Some(Uuid::now_v7()),
            Some(Uuid::now_v7()),
            vec![Uuid::now_v7()],
            vec![Uuid::now_v7()],
        );
        assert_eq!(full.completeness_score, 1.0);
        assert!(full.is_complete());
    }

    #[test]
    fn test_score_monotonic_in_layers() {
        // Adding a matched layer never decreases the score
        let without = AuditTrail::new(reference(), Some(Uuid::now_v7()), None, vec![], vec![]);
        let with = AuditTrail::new(
            reference(),
            Some(Uuid::now_v7()),
            Some(Uuid::now_v7()),
            vec![],
            vec![],
        );
        assert!(with.completeness_score > without.completeness_score);
        assert!(without.completeness_score >= 0.0 && with.completeness_score <= 1.0);
    }
}
