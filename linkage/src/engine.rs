//! Batch link building
//!
//! One pass over an immutable snapshot: route every movement and payment to
//! its authorization ledger, match references with the ordered strategies,
//! then propagate invoice links to paired cheques. Records the router has no
//! rule for are collected for data-quality reporting, never dropped.

use crate::inheritance::PairLinker;
use crate::link::{LinkSet, LinkSource, ReconciliationLink};
use crate::partition::partition_snapshot;
use recon_core::{
    LedgerKind, LedgerRouter, LedgerSnapshot, MatchCandidate, MatchStats, ReconConfig,
    ReferenceMatcher, RouteTarget,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Record the router had no rule for
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnroutableRecord {
    /// Source record
    pub record_id: Uuid,
    /// Ledger the record came from
    pub ledger: LedgerKind,
    /// Transaction type as declared by the source
    pub declared_type: String,
}

/// Output of one link-building run
#[derive(Debug)]
pub struct LinkBatch {
    /// One link per movement and payment record
    pub links: LinkSet,

    /// Matching quality counters
    pub stats: MatchStats,

    /// Records with no routing rule, for data-quality reporting
    pub unroutable: Vec<UnroutableRecord>,

    /// Links created by pair inheritance
    pub inherited_count: u64,
}

/// Builds reconciliation links for a snapshot
pub struct LinkEngine {
    router: LedgerRouter,
    pair_linker: PairLinker,
}

impl LinkEngine {
    /// Create an engine from an immutable configuration
    pub fn new(config: &ReconConfig) -> Self {
        Self {
            router: LedgerRouter::new(),
            pair_linker: PairLinker::new(config.pairing.clone()),
        }
    }

    /// Build links for every movement and payment in the snapshot.
    ///
    /// Matching runs per reporting-period partition; candidate sets are
    /// built once per routing target and shared. Pair inheritance runs last,
    /// after every direct match is known.
    pub fn run(&self, snapshot: &LedgerSnapshot) -> LinkBatch {
        let partitions = partition_snapshot(snapshot);

        let mut links = LinkSet::new();
        let mut stats = MatchStats::default();
        let mut unroutable = Vec::new();
        let mut candidates: HashMap<RouteTarget, Vec<MatchCandidate>> = HashMap::new();

        for partition in &partitions {
            let mut matcher = ReferenceMatcher::new();

            for movement in &partition.movements {
                match self.router.route_movement(&movement.movement_type) {
                    Ok(target) => {
                        let pool = candidates
                            .entry(target)
                            .or_insert_with(|| snapshot.candidates_for(target));
                        let link = match matcher.best_match(
                            &movement.raw_reference,
                            movement.occurred_on,
                            pool,
                        ) {
                            Some(outcome) => ReconciliationLink::direct(
                                LinkSource::Movement(movement.record_id),
                                outcome.record_id,
                                outcome.strategy,
                            ),
                            None => {
                                ReconciliationLink::unresolved(LinkSource::Movement(movement.record_id))
                            }
                        };
                        links.insert(link);
                    }
                    Err(err) => {
                        tracing::warn!(record = %movement.record_id, %err, "movement not routed");
                        unroutable.push(UnroutableRecord {
                            record_id: movement.record_id,
                            ledger: LedgerKind::Movement,
                            declared_type: movement.movement_type.code().to_string(),
                        });
                        links.insert(ReconciliationLink::unresolved(LinkSource::Movement(
                            movement.record_id,
                        )));
                    }
                }
            }

            for payment in &partition.payments {
                match self.router.route_payment(&payment.payment_type) {
                    Ok(target) => {
                        let pool = candidates
                            .entry(target)
                            .or_insert_with(|| snapshot.candidates_for(target));
                        let link = match matcher.best_match(
                            &payment.raw_reference,
                            payment.occurred_on,
                            pool,
                        ) {
                            Some(outcome) => ReconciliationLink::direct(
                                LinkSource::Payment(payment.record_id),
                                outcome.record_id,
                                outcome.strategy,
                            ),
                            None => {
                                ReconciliationLink::unresolved(LinkSource::Payment(payment.record_id))
                            }
                        };
                        links.insert(link);
                    }
                    Err(err) => {
                        tracing::warn!(record = %payment.record_id, %err, "payment not routed");
                        unroutable.push(UnroutableRecord {
                            record_id: payment.record_id,
                            ledger: LedgerKind::Payment,
                            declared_type: payment.payment_type.code().to_string(),
                        });
                        links.insert(ReconciliationLink::unresolved(LinkSource::Payment(
                            payment.record_id,
                        )));
                    }
                }
            }

            stats.merge(matcher.stats());
        }

        let inherited_count = self.pair_linker.apply(snapshot, &mut links);
        for _ in 0..inherited_count {
            stats.note_inherited();
        }

        tracing::info!(
            links = links.len(),
            resolved = links.resolved_count(),
            inherited = inherited_count,
            unroutable = unroutable.len(),
            "link building complete"
        );

        LinkBatch {
            links,
            stats,
            unroutable,
            inherited_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use recon_core::{
        AuthorizationKind, AuthorizationRecord, CounterpartyId, KeyField, MatchStrategy,
        MovementRecord, MovementType, PaymentRecord, PaymentType, Period,
    };
    use rust_decimal::Decimal;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn period() -> Period {
        Period::new("2022-11")
    }

    fn issue_authorization(requisition: &str, amount: i64) -> AuthorizationRecord {
        AuthorizationRecord::new(
            AuthorizationKind::Issue,
            Decimal::ONE,
            Decimal::new(amount, 2),
            date("2022-11-15"),
            period(),
        )
        .with_key(KeyField::RequisitionNo, requisition)
    }

    fn receipt_authorization(invoice_no: &str, amount: i64) -> AuthorizationRecord {
        AuthorizationRecord::new(
            AuthorizationKind::Receipt,
            Decimal::ONE,
            Decimal::new(amount, 2),
            date("2022-11-15"),
            period(),
        )
        .with_key(KeyField::ReceiptNo, "7001")
        .with_key(KeyField::InvoiceNo, invoice_no)
    }

    fn engine() -> LinkEngine {
        LinkEngine::new(&ReconConfig::default())
    }

    #[test]
    fn test_movement_matches_issue_authorization() {
        // Zero-padded movement reference against an unpadded requisition key
        let movement = MovementRecord::new(
            "089322",
            MovementType::Issue,
            Decimal::from(4),
            Decimal::new(120_00, 2),
            date("2022-11-18"),
            period(),
        );
        let movement_id = movement.record_id;
        let authorization = issue_authorization("89322", 120_00);
        let auth_id = authorization.record_id;
        let snapshot = LedgerSnapshot::new(vec![movement], vec![authorization], vec![], vec![]);

        let batch = engine().run(&snapshot);

        let link = batch.links.link_for(movement_id).unwrap();
        let resolution = link.resolution.unwrap();
        assert_eq!(resolution.authorization_id, auth_id);
        assert_eq!(resolution.strategy, MatchStrategy::Canonical);
        assert_eq!(batch.stats.successes(MatchStrategy::Canonical), 1);
    }

    #[test]
    fn test_invoice_then_cheque_inherits() {
        // Invoice matches a receipt authorization by invoice number; the
        // cheque that settles it inherits the same authorization
        let supplier = CounterpartyId::new("SUP-A");
        let invoice = PaymentRecord::new(
            "0001015578",
            PaymentType::Invoice,
            Decimal::new(140_000_00, 2),
            date("2022-11-18"),
            supplier.clone(),
            period(),
            1,
        );
        let cheque = PaymentRecord::new(
            "34211",
            PaymentType::Cheque,
            Decimal::new(140_000_00, 2),
            date("2022-11-18"),
            supplier,
            period(),
            2,
        );
        let invoice_id = invoice.record_id;
        let cheque_id = cheque.record_id;
        let authorization = receipt_authorization("1015578", 140_000_00);
        let auth_id = authorization.record_id;
        let snapshot =
            LedgerSnapshot::new(vec![], vec![authorization], vec![invoice, cheque], vec![]);

        let batch = engine().run(&snapshot);

        let invoice_link = batch.links.link_for(invoice_id).unwrap();
        assert_eq!(
            invoice_link.resolution.unwrap().strategy,
            MatchStrategy::Canonical
        );

        let cheque_link = batch.links.link_for(cheque_id).unwrap();
        let resolution = cheque_link.resolution.unwrap();
        assert_eq!(resolution.authorization_id, auth_id);
        assert_eq!(resolution.strategy, MatchStrategy::InheritedPair);
        assert_eq!(cheque_link.inherited_from, Some(invoice_link.link_id));
        assert_eq!(batch.inherited_count, 1);
    }

    #[test]
    fn test_voucher_payments_never_inherit() {
        // Only the invoice→cheque adjacency propagates; a voucher row of
        // identical date and amount does not
        let supplier = CounterpartyId::new("SUP-A");
        let voucher = PaymentRecord::new(
            "INVI0042",
            PaymentType::Voucher,
            Decimal::new(9_000_00, 2),
            date("2022-11-18"),
            supplier.clone(),
            period(),
            1,
        );
        let cheque = PaymentRecord::new(
            "55555",
            PaymentType::Cheque,
            Decimal::new(9_000_00, 2),
            date("2022-11-18"),
            supplier,
            period(),
            2,
        );
        let cheque_id = cheque.record_id;
        let authorization = AuthorizationRecord::new(
            AuthorizationKind::PaymentVoucher,
            Decimal::ZERO,
            Decimal::new(9_000_00, 2),
            date("2022-11-15"),
            period(),
        )
        .with_key(KeyField::VoucherNo, "INVI0042");
        let snapshot =
            LedgerSnapshot::new(vec![], vec![authorization], vec![voucher, cheque], vec![]);

        let batch = engine().run(&snapshot);
        assert_eq!(batch.inherited_count, 0);
        assert!(!batch.links.link_for(cheque_id).unwrap().is_resolved());
    }

    #[test]
    fn test_unknown_type_is_collected_not_dropped() {
        let movement = MovementRecord::new(
            "77",
            MovementType::Other("ADJ".into()),
            Decimal::ONE,
            Decimal::from(10),
            date("2022-11-18"),
            period(),
        );
        let movement_id = movement.record_id;
        let snapshot = LedgerSnapshot::new(vec![movement], vec![], vec![], vec![]);

        let batch = engine().run(&snapshot);

        assert_eq!(batch.unroutable.len(), 1);
        assert_eq!(batch.unroutable[0].record_id, movement_id);
        assert_eq!(batch.unroutable[0].declared_type, "ADJ");
        // The record still carries an (unresolved) link
        assert!(batch.links.link_for(movement_id).is_some());
    }

    #[test]
    fn test_run_is_deterministic() {
        let movement = MovementRecord::new(
            "100",
            MovementType::Issue,
            Decimal::ONE,
            Decimal::from(10),
            date("2022-11-18"),
            period(),
        );
        let movement_id = movement.record_id;
        let auths = vec![
            issue_authorization("0100", 10_00),
            issue_authorization("00100", 10_00),
        ];
        let snapshot = LedgerSnapshot::new(vec![movement], auths, vec![], vec![]);

        let eng = engine();
        let first = eng.run(&snapshot);
        let second = eng.run(&snapshot);

        let a = first.links.link_for(movement_id).unwrap().resolution.unwrap();
        let b = second.links.link_for(movement_id).unwrap().resolution.unwrap();
        assert_eq!(a.authorization_id, b.authorization_id);
        assert_eq!(a.strategy, b.strategy);
    }
}
