//! Snapshot partitioning
//!
//! Matching parallelizes across reporting periods, but pair inheritance
//! scans one counterparty's ordered payment sequence. Partitions therefore
//! keep every counterparty's payments together, homed to the period of that
//! counterparty's first payment.

use recon_core::{LedgerSnapshot, MovementRecord, PaymentRecord, Period};
use std::collections::BTreeMap;

/// One unit of independent matching work
#[derive(Debug)]
pub struct BatchPartition<'a> {
    /// Reporting window the partition covers
    pub period: Period,

    /// Movements from that window
    pub movements: Vec<&'a MovementRecord>,

    /// Whole payment sequences homed to that window
    pub payments: Vec<&'a PaymentRecord>,
}

/// Split a snapshot by reporting period without splitting any
/// counterparty's payment sequence.
pub fn partition_snapshot(snapshot: &LedgerSnapshot) -> Vec<BatchPartition<'_>> {
    let mut movements: BTreeMap<Period, Vec<&MovementRecord>> = BTreeMap::new();
    for movement in snapshot.movements() {
        movements
            .entry(movement.source_period.clone())
            .or_default()
            .push(movement);
    }

    let mut payments: BTreeMap<Period, Vec<&PaymentRecord>> = BTreeMap::new();
    for (_, sequence) in snapshot.payment_sequences() {
        if let Some(first) = sequence.first() {
            payments
                .entry(first.source_period.clone())
                .or_default()
                .extend(sequence);
        }
    }

    let mut periods: Vec<Period> = movements.keys().chain(payments.keys()).cloned().collect();
    periods.sort();
    periods.dedup();

    periods
        .into_iter()
        .map(|period| BatchPartition {
            movements: movements.remove(&period).unwrap_or_default(),
            payments: payments.remove(&period).unwrap_or_default(),
            period,
        })
        .collect()
}
