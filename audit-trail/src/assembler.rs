//! Audit trail assembly
//!
//! Gathers, per canonical reference, the records the four ledgers hold for
//! it: the movement row, the authorization its link resolved to, every
//! payment settling that authorization, and the statistics rows for the
//! same counterparty and period. Assembly for one reference is atomic (all
//! layers are resolved before the trail is returned) and absence of a
//! layer is not an error.

use crate::trail::AuditTrail;
use linkage::{LinkSet, LinkSource};
use recon_core::{CanonicalRef, CounterpartyId, LedgerSnapshot, Period};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Assembles audit trails from a snapshot and its links
pub struct TrailAssembler<'a> {
    snapshot: &'a LedgerSnapshot,
    links: &'a LinkSet,
}

impl<'a> TrailAssembler<'a> {
    /// Create an assembler over one run's snapshot and links
    pub fn new(snapshot: &'a LedgerSnapshot, links: &'a LinkSet) -> Self {
        Self { snapshot, links }
    }

    /// Assemble the audit trail for one canonical reference
    pub fn assemble(&self, canonical: &CanonicalRef) -> AuditTrail {
        let movement = self
            .snapshot
            .movements()
            .iter()
            .find(|m| m.canonical_reference.matches(canonical));

        // Authorization via the movement's link, else via a matching payment's
        let mut authorization =
            movement.and_then(|m| self.resolved_authorization(m.record_id));

        let mut payments: Vec<Uuid> = Vec::new();
        for payment in self.snapshot.payments() {
            if payment.canonical_reference.matches(canonical) {
                payments.push(payment.record_id);
                if authorization.is_none() {
                    authorization = self.resolved_authorization(payment.record_id);
                }
            }
        }

        // Every payment whose link (direct or inherited) settles the same
        // authorization belongs to the trail
        if let Some(authorization_id) = authorization {
            for link in self.links.links_to(authorization_id) {
                if let LinkSource::Payment(record_id) = link.source {
                    if !payments.contains(&record_id) {
                        payments.push(record_id);
                    }
                }
            }
        }

        let statistics = self.attached_statistics(movement.map(|m| m.record_id), &payments, authorization);

        AuditTrail::new(
            canonical.clone(),
            movement.map(|m| m.record_id),
            authorization,
            payments,
            statistics,
        )
    }

    /// Assemble trails for every distinct canonical reference in the
    /// movement and payment ledgers
    pub fn assemble_all(&self) -> Vec<AuditTrail> {
        let mut references: BTreeSet<CanonicalRef> = BTreeSet::new();
        for movement in self.snapshot.movements() {
            if !movement.canonical_reference.is_empty() {
                references.insert(movement.canonical_reference.clone());
            }
        }
        for payment in self.snapshot.payments() {
            if !payment.canonical_reference.is_empty() {
                references.insert(payment.canonical_reference.clone());
            }
        }

        let trails: Vec<AuditTrail> =
            references.iter().map(|r| self.assemble(r)).collect();
        tracing::info!(trails = trails.len(), "audit trail assembly complete");
        trails
    }

    fn resolved_authorization(&self, record_id: Uuid) -> Option<Uuid> {
        self.links
            .link_for(record_id)?
            .resolution
            .map(|r| r.authorization_id)
    }

    /// Statistics rows sharing the trail's counterparty and one of its
    /// reporting periods
    fn attached_statistics(
        &self,
        movement: Option<Uuid>,
        payments: &[Uuid],
        authorization: Option<Uuid>,
    ) -> Vec<Uuid> {
        let counterparty = self.trail_counterparty(movement, payments, authorization);
        let Some(counterparty) = counterparty else {
            return Vec::new();
        };

        let mut periods: BTreeSet<&Period> = BTreeSet::new();
        if let Some(m) = movement.and_then(|id| self.snapshot.movement(id)) {
            periods.insert(&m.source_period);
        }
        for p in payments.iter().filter_map(|&id| self.snapshot.payment(id)) {
            periods.insert(&p.source_period);
        }
        if let Some(a) = authorization.and_then(|id| self.snapshot.authorization(id)) {
            periods.insert(&a.source_period);
        }

        self.snapshot
            .statistics()
            .iter()
            .filter(|s| s.counterparty_id == counterparty && periods.contains(&s.source_period))
            .map(|s| s.record_id)
            .collect()
    }

    /// Counterparty of the trail: movement first, then payments, then the
    /// authorization row
    fn trail_counterparty(
        &self,
        movement: Option<Uuid>,
        payments: &[Uuid],
        authorization: Option<Uuid>,
    ) -> Option<CounterpartyId> {
        if let Some(m) = movement.and_then(|id| self.snapshot.movement(id)) {
            if let Some(c) = &m.counterparty_id {
                return Some(c.clone());
            }
        }
        if let Some(p) = payments.iter().find_map(|&id| self.snapshot.payment(id)) {
            return Some(p.counterparty_id.clone());
        }
        if let Some(a) = authorization.and_then(|id| self.snapshot.authorization(id)) {
            if let Some(c) = &a.counterparty_id {
                return Some(c.clone());
            }
        }
        None
    }
}
