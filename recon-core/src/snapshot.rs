//! Immutable ledger snapshot for one reconciliation run
//!
//! All ledger data is loaded up front; indexes are built once at
//! construction and never change. Concurrent runs never share a snapshot.

use crate::matcher::MatchCandidate;
use crate::router::RouteTarget;
use crate::types::{
    AuthorizationKind, AuthorizationRecord, CounterpartyId, MovementRecord, PaymentRecord,
    StatisticsRecord,
};
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

/// All records for one reconciliation run, with lookup indexes
#[derive(Debug)]
pub struct LedgerSnapshot {
    movements: Vec<MovementRecord>,
    authorizations: Vec<AuthorizationRecord>,
    payments: Vec<PaymentRecord>,
    statistics: Vec<StatisticsRecord>,

    movement_by_id: HashMap<Uuid, usize>,
    authorization_by_id: HashMap<Uuid, usize>,
    payment_by_id: HashMap<Uuid, usize>,
    auth_by_kind: HashMap<AuthorizationKind, Vec<usize>>,
    payments_by_counterparty: BTreeMap<CounterpartyId, Vec<usize>>,
}

impl LedgerSnapshot {
    /// Build a snapshot and its indexes.
    ///
    /// Payment sequences are ordered by source position (`seq`) within each
    /// counterparty; that order drives pair inheritance.
    pub fn new(
        movements: Vec<MovementRecord>,
        authorizations: Vec<AuthorizationRecord>,
        payments: Vec<PaymentRecord>,
        statistics: Vec<StatisticsRecord>,
    ) -> Self {
        let movement_by_id = movements
            .iter()
            .enumerate()
            .map(|(i, r)| (r.record_id, i))
            .collect();
        let authorization_by_id = authorizations
            .iter()
            .enumerate()
            .map(|(i, r)| (r.record_id, i))
            .collect();
        let payment_by_id = payments
            .iter()
            .enumerate()
            .map(|(i, r)| (r.record_id, i))
            .collect();

        let mut auth_by_kind: HashMap<AuthorizationKind, Vec<usize>> = HashMap::new();
        for (i, record) in authorizations.iter().enumerate() {
            auth_by_kind.entry(record.kind).or_default().push(i);
        }

        let mut payments_by_counterparty: BTreeMap<CounterpartyId, Vec<usize>> = BTreeMap::new();
        for (i, record) in payments.iter().enumerate() {
            payments_by_counterparty
                .entry(record.counterparty_id.clone())
                .or_default()
                .push(i);
        }
        for indexes in payments_by_counterparty.values_mut() {
            indexes.sort_by_key(|&i| payments[i].seq);
        }

        Self {
            movements,
            authorizations,
            payments,
            statistics,
            movement_by_id,
            authorization_by_id,
            payment_by_id,
            auth_by_kind,
            payments_by_counterparty,
        }
    }

    /// All movement records in source order
    pub fn movements(&self) -> &[MovementRecord] {
        &self.movements
    }

    /// All authorization records in source order
    pub fn authorizations(&self) -> &[AuthorizationRecord] {
        &self.authorizations
    }

    /// All payment records in source order
    pub fn payments(&self) -> &[PaymentRecord] {
        &self.payments
    }

    /// All statistics records in source order
    pub fn statistics(&self) -> &[StatisticsRecord] {
        &self.statistics
    }

    /// Look up a movement record by ID
    pub fn movement(&self, record_id: Uuid) -> Option<&MovementRecord> {
        self.movement_by_id
            .get(&record_id)
            .map(|&i| &self.movements[i])
    }

    /// Look up an authorization record by ID
    pub fn authorization(&self, record_id: Uuid) -> Option<&AuthorizationRecord> {
        self.authorization_by_id
            .get(&record_id)
            .map(|&i| &self.authorizations[i])
    }

    /// Look up a payment record by ID
    pub fn payment(&self, record_id: Uuid) -> Option<&PaymentRecord> {
        self.payment_by_id
            .get(&record_id)
            .map(|&i| &self.payments[i])
    }

    /// Authorization rows of one sub-ledger
    pub fn authorizations_of(
        &self,
        kind: AuthorizationKind,
    ) -> impl Iterator<Item = &AuthorizationRecord> + '_ {
        self.auth_by_kind
            .get(&kind)
            .into_iter()
            .flatten()
            .map(move |&i| &self.authorizations[i])
    }

    /// Match candidates for a routing target.
    ///
    /// Rows lacking the key field are skipped; they can never satisfy any
    /// strategy.
    pub fn candidates_for(&self, target: RouteTarget) -> Vec<MatchCandidate> {
        self.authorizations_of(target.ledger)
            .filter_map(|record| {
                record.keys.get(target.key).map(|raw| MatchCandidate {
                    record_id: record.record_id,
                    raw: raw.to_string(),
                    occurred_on: record.occurred_on,
                })
            })
            .collect()
    }

    /// Payment sequences per counterparty, each in source order
    pub fn payment_sequences(&self) -> Vec<(&CounterpartyId, Vec<&PaymentRecord>)> {
        self.payments_by_counterparty
            .iter()
            .map(|(counterparty, indexes)| {
                let sequence = indexes.iter().map(|&i| &self.payments[i]).collect();
                (counterparty, sequence)
            })
            .collect()
    }

    /// Latest document date across movement and payment ledgers
    pub fn latest_activity_date(&self) -> Option<NaiveDate> {
        let movements = self.movements.iter().map(|r| r.occurred_on);
        let payments = self.payments.iter().map(|r| r.occurred_on);
        movements.chain(payments).max()
    }
}
