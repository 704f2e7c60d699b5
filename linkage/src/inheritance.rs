//! Invoice→cheque link propagation
//!
//! Cheque rows rarely carry a reference recorded anywhere else in the
//! authorization ledgers. The settlement they belong to is identified by the
//! invoice row printed directly above them in the payment ledger for the
//! same supplier with identical date and amount, and that invoice usually
//! does match. Such a cheque inherits the invoice's authorization link.
//!
//! # Algorithm
//!
//! 1. Walk each counterparty's payment sequence in source order
//! 2. For every unresolved cheque, find preceding invoices with equal date
//!    and equal amount (exact: these are settlement amounts, not estimates)
//! 3. Propagate the nearest preceding invoice's resolved link, recording
//!    the provenance in `inherited_from`
//!
//! The scan is strictly additive: a direct match found independently for a
//! cheque always takes precedence, and a cheque participates in at most one
//! pairing.

use crate::link::LinkSet;
use recon_core::{CounterpartyId, LedgerSnapshot, PairingConfig, PaymentRecord, PaymentType};

/// Propagates resolved invoice links to paired cheque records
#[derive(Debug)]
pub struct PairLinker {
    config: PairingConfig,
}

impl PairLinker {
    /// Create a pair linker
    pub fn new(config: PairingConfig) -> Self {
        Self { config }
    }

    /// Scan every counterparty's payment sequence and propagate links.
    ///
    /// Returns the number of links inherited.
    pub fn apply(&self, snapshot: &LedgerSnapshot, links: &mut LinkSet) -> u64 {
        if !self.config.enabled {
            return 0;
        }

        let mut inherited = 0;
        for (counterparty, sequence) in snapshot.payment_sequences() {
            inherited += self.scan_sequence(counterparty, &sequence, links);
        }
        inherited
    }

    fn scan_sequence(
        &self,
        counterparty: &CounterpartyId,
        sequence: &[&PaymentRecord],
        links: &mut LinkSet,
    ) -> u64 {
        let mut inherited = 0;

        for (i, payment) in sequence.iter().enumerate() {
            if payment.payment_type != PaymentType::Cheque {
                continue;
            }
            // Direct matches take precedence over inheritance
            if links
                .link_for(payment.record_id)
                .map_or(false, |l| l.is_resolved())
            {
                continue;
            }

            // Preceding invoices of identical date and amount, nearest first
            let candidates: Vec<usize> = (0..i)
                .rev()
                .filter(|&j| {
                    let prev = sequence[j];
                    prev.payment_type == PaymentType::Invoice
                        && prev.occurred_on == payment.occurred_on
                        && prev.amount == payment.amount
                })
                .collect();

            let Some(&nearest) = candidates.first() else {
                continue;
            };
            if candidates.len() > 1 {
                tracing::info!(
                    counterparty = %counterparty,
                    cheque = %payment.raw_reference,
                    candidates = candidates.len(),
                    "multiple invoice candidates for cheque, using nearest preceding"
                );
            }

            let invoice = sequence[nearest];
            let Some(invoice_link) = links.link_for(invoice.record_id) else {
                continue;
            };
            let Some(resolution) = invoice_link.resolution else {
                continue;
            };
            let from_link = invoice_link.link_id;

            if let Some(cheque_link) = links.link_for_mut(payment.record_id) {
                match cheque_link.adopt(resolution.authorization_id, from_link) {
                    Ok(()) => {
                        inherited += 1;
                        tracing::debug!(
                            cheque = %payment.raw_reference,
                            invoice = %invoice.raw_reference,
                            "cheque link inherited from paired invoice"
                        );
                    }
                    Err(err) => {
                        tracing::warn!(%err, "inheritance skipped");
                    }
                }
            }
        }

        inherited
    }
}
