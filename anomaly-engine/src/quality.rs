//! Data-quality rules
//!
//! Missing required fields, unroutable transaction types, impossible
//! negative values, and duplicate document keys. Multiple line items under
//! one document key are normal business practice and are never flagged; a
//! duplicate is only reported when rows sharing a key disagree on their
//! document header (counterparty or date) or repeat a line exactly.

use crate::types::{AnomalyCategory, AnomalyFinding, Severity};
use linkage::LinkBatch;
use recon_core::{AuthorizationRecord, LedgerSnapshot, MovementType};
use rust_decimal::Decimal;
use serde_json::json;
use std::collections::BTreeMap;

/// Records missing fields the reconciliation depends on
pub fn missing_fields(snapshot: &LedgerSnapshot) -> Vec<AnomalyFinding> {
    let mut findings = Vec::new();

    for movement in snapshot.movements() {
        if movement.roll_forward {
            continue;
        }
        if movement.canonical_reference.is_empty() {
            findings.push(
                AnomalyFinding::new(
                    AnomalyCategory::DataQuality,
                    Severity::Warning,
                    "movement record has no reference",
                )
                .with_subject(movement.record_id.to_string())
                .with_evidence(json!({ "date": movement.occurred_on.to_string() })),
            );
        }
        if movement.item_id.is_none() {
            findings.push(
                AnomalyFinding::new(
                    AnomalyCategory::DataQuality,
                    Severity::Info,
                    "movement record has no item",
                )
                .with_subject(movement.raw_reference.clone()),
            );
        }
    }

    for payment in snapshot.payments() {
        if payment.canonical_reference.is_empty() {
            findings.push(
                AnomalyFinding::new(
                    AnomalyCategory::DataQuality,
                    Severity::Warning,
                    "payment record has no reference",
                )
                .with_subject(payment.record_id.to_string())
                .with_evidence(json!({ "date": payment.occurred_on.to_string() })),
            );
        }
    }

    for authorization in snapshot.authorizations() {
        if authorization.kind.primary_key_field().is_some()
            && authorization.primary_key().is_empty()
        {
            findings.push(
                AnomalyFinding::new(
                    AnomalyCategory::DataQuality,
                    Severity::Warning,
                    format!("{} authorization has no document key", authorization.kind),
                )
                .with_subject(authorization.record_id.to_string()),
            );
        }
    }

    findings
}

/// Negative values where the ledger cannot hold them
pub fn negative_values(snapshot: &LedgerSnapshot) -> Vec<AnomalyFinding> {
    let mut findings = Vec::new();

    for movement in snapshot.movements() {
        if movement.roll_forward {
            continue;
        }
        if movement.amount < Decimal::ZERO || movement.quantity < Decimal::ZERO {
            findings.push(
                AnomalyFinding::new(
                    AnomalyCategory::DataQuality,
                    Severity::Warning,
                    "movement carries a negative amount or quantity",
                )
                .with_subject(movement.raw_reference.clone())
                .with_evidence(json!({
                    "amount": movement.amount.to_string(),
                    "quantity": movement.quantity.to_string(),
                })),
            );
        }
    }

    findings
}

/// One finding per record the router had no rule for
pub fn unroutable_records(batch: &LinkBatch) -> Vec<AnomalyFinding> {
    batch
        .unroutable
        .iter()
        .map(|record| {
            AnomalyFinding::new(
                AnomalyCategory::DataQuality,
                Severity::Warning,
                format!(
                    "no routing rule for {} transaction type {:?}",
                    record.ledger, record.declared_type
                ),
            )
            .with_subject(record.record_id.to_string())
            .with_evidence(json!({
                "ledger": record.ledger.code(),
                "declared_type": record.declared_type,
            }))
        })
        .collect()
}

/// Duplicate document keys within one authorization sub-ledger.
///
/// Rows sharing a key with a consistent header are one multi-line document.
pub fn duplicate_keys(snapshot: &LedgerSnapshot) -> Vec<AnomalyFinding> {
    let mut by_key: BTreeMap<(String, String), Vec<&AuthorizationRecord>> = BTreeMap::new();
    for authorization in snapshot.authorizations() {
        let key = authorization.primary_key();
        if let Some(text) = key.as_str() {
            by_key
                .entry((authorization.kind.code().to_string(), text.to_string()))
                .or_default()
                .push(authorization);
        }
    }

    let mut findings = Vec::new();
    for ((kind, key), rows) in by_key {
        if rows.len() < 2 {
            continue;
        }

        let header_conflict = rows.iter().any(|row| {
            row.counterparty_id != rows[0].counterparty_id
                || row.occurred_on != rows[0].occurred_on
        });
        if header_conflict {
            findings.push(
                AnomalyFinding::new(
                    AnomalyCategory::DataQuality,
                    Severity::Warning,
                    format!("{} rows share document key with conflicting headers", rows.len()),
                )
                .with_subject(key)
                .with_evidence(json!({
                    "ledger": kind,
                    "rows": rows.len(),
                })),
            );
            continue;
        }

        // Same header: line items must still differ
        let mut seen_lines = BTreeMap::new();
        for row in &rows {
            let line = (
                row.item_id.as_ref().map(|i| i.as_str().to_string()),
                row.quantity,
                row.amount,
            );
            *seen_lines.entry(line).or_insert(0u32) += 1;
        }
        let repeated: u32 = seen_lines
            .values()
            .filter(|&&count| count > 1)
            .map(|&count| count - 1)
            .sum();
        if repeated > 0 {
            findings.push(
                AnomalyFinding::new(
                    AnomalyCategory::DataQuality,
                    Severity::Warning,
                    format!("document repeats {} identical line items", repeated),
                )
                .with_subject(key)
                .with_evidence(json!({
                    "ledger": kind,
                    "repeated_lines": repeated,
                })),
            );
        }
    }
    findings
}

/// All data-quality rules
pub fn detect(snapshot: &LedgerSnapshot, batch: &LinkBatch) -> Vec<AnomalyFinding> {
    let mut findings = missing_fields(snapshot);
    findings.extend(negative_values(snapshot));
    findings.extend(unroutable_records(batch));
    findings.extend(duplicate_keys(snapshot));
    findings
}
