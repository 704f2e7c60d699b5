//! Relationship anomaly rules
//!
//! Cross-ledger consistency: orphaned authorizations, movements missing
//! their authorization, amount drift on resolved links, and supplier
//! concentration per item.

use crate::types::{AnomalyCategory, AnomalyFinding, Severity};
use linkage::{LinkBatch, LinkSource};
use recon_core::{AnomalyConfig, AuthorizationKind, LedgerSnapshot, MovementType};
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};

/// Issue authorizations no movement record links to
pub fn orphaned_issue_authorizations(
    snapshot: &LedgerSnapshot,
    batch: &LinkBatch,
) -> Vec<AnomalyFinding> {
    snapshot
        .authorizations_of(AuthorizationKind::Issue)
        .filter(|authorization| {
            !batch
                .links
                .links_to(authorization.record_id)
                .any(|link| matches!(link.source, LinkSource::Movement(_)))
        })
        .map(|authorization| {
            AnomalyFinding::new(
                AnomalyCategory::Relationship,
                Severity::Warning,
                "issue authorization has no linked movement",
            )
            .with_subject(authorization.primary_key().to_string())
            .with_evidence(json!({
                "amount": authorization.amount.to_string(),
                "date": authorization.occurred_on.to_string(),
            }))
        })
        .collect()
}

/// Receipt authorizations no payment settles
pub fn unsettled_receipt_authorizations(
    snapshot: &LedgerSnapshot,
    batch: &LinkBatch,
) -> Vec<AnomalyFinding> {
    snapshot
        .authorizations_of(AuthorizationKind::Receipt)
        .filter(|authorization| {
            !batch
                .links
                .links_to(authorization.record_id)
                .any(|link| matches!(link.source, LinkSource::Payment(_)))
        })
        .map(|authorization| {
            AnomalyFinding::new(
                AnomalyCategory::Relationship,
                Severity::Warning,
                "receipt authorization has no linked payment",
            )
            .with_subject(authorization.primary_key().to_string())
            .with_evidence(json!({
                "amount": authorization.amount.to_string(),
                "date": authorization.occurred_on.to_string(),
            }))
        })
        .collect()
}

/// Movements whose authorization layer is expected but missing.
///
/// Roll-forward totals legitimately have none and stay silent; records the
/// router could not place are reported by the data-quality rules instead.
pub fn unauthorized_movements(
    snapshot: &LedgerSnapshot,
    batch: &LinkBatch,
) -> Vec<AnomalyFinding> {
    snapshot
        .movements()
        .iter()
        .filter(|movement| {
            !movement.roll_forward
                && !matches!(movement.movement_type, MovementType::Other(_))
                && batch
                    .links
                    .link_for(movement.record_id)
                    .map_or(true, |link| !link.is_resolved())
        })
        .map(|movement| {
            AnomalyFinding::new(
                AnomalyCategory::Relationship,
                Severity::Warning,
                format!("{} movement has no authorization", movement.movement_type),
            )
            .with_subject(movement.raw_reference.clone())
            .with_evidence(json!({
                "movement_type": movement.movement_type.code(),
                "date": movement.occurred_on.to_string(),
            }))
        })
        .collect()
}

/// Resolved links whose source and authorization amounts disagree beyond
/// the rounding tolerance
pub fn amount_mismatches(
    snapshot: &LedgerSnapshot,
    batch: &LinkBatch,
    config: &AnomalyConfig,
) -> Vec<AnomalyFinding> {
    let mut findings = Vec::new();

    for link in batch.links.iter() {
        let Some(resolution) = link.resolution else {
            continue;
        };
        let Some(authorization) = snapshot.authorization(resolution.authorization_id) else {
            continue;
        };

        let (reference, source_amount) = match link.source {
            LinkSource::Movement(id) => match snapshot.movement(id) {
                Some(m) => (m.raw_reference.clone(), m.amount),
                None => continue,
            },
            LinkSource::Payment(id) => match snapshot.payment(id) {
                Some(p) => (p.raw_reference.clone(), p.amount),
                None => continue,
            },
        };

        let difference = (source_amount - authorization.amount).abs();
        if difference > config.amount_tolerance {
            findings.push(
                AnomalyFinding::new(
                    AnomalyCategory::Relationship,
                    Severity::Warning,
                    format!(
                        "linked amounts differ by {} (beyond tolerance {})",
                        difference, config.amount_tolerance
                    ),
                )
                .with_subject(reference)
                .with_evidence(json!({
                    "source_amount": source_amount.to_string(),
                    "authorization_amount": authorization.amount.to_string(),
                    "difference": difference.to_string(),
                    "strategy": resolution.strategy.code(),
                })),
            );
        }
    }
    findings
}

/// Items supplied by more distinct counterparties than expected
pub fn multi_supplier_items(
    snapshot: &LedgerSnapshot,
    config: &AnomalyConfig,
) -> Vec<AnomalyFinding> {
    let mut suppliers_by_item: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for movement in snapshot.movements() {
        if movement.movement_type != MovementType::Receipt {
            continue;
        }
        if let (Some(item), Some(counterparty)) = (&movement.item_id, &movement.counterparty_id) {
            suppliers_by_item
                .entry(item.as_str().to_string())
                .or_default()
                .insert(counterparty.as_str().to_string());
        }
    }

    suppliers_by_item
        .into_iter()
        .filter(|(_, suppliers)| suppliers.len() as u32 > config.max_suppliers_per_item)
        .map(|(item, suppliers)| {
            AnomalyFinding::new(
                AnomalyCategory::Relationship,
                Severity::Info,
                format!("item sourced from {} distinct suppliers", suppliers.len()),
            )
            .with_subject(item)
            .with_evidence(json!({
                "supplier_count": suppliers.len(),
                "threshold": config.max_suppliers_per_item,
            }))
        })
        .collect()
}

/// All relationship rules
pub fn detect(
    snapshot: &LedgerSnapshot,
    batch: &LinkBatch,
    config: &AnomalyConfig,
) -> Vec<AnomalyFinding> {
    let mut findings = orphaned_issue_authorizations(snapshot, batch);
    findings.extend(unsettled_receipt_authorizations(snapshot, batch));
    findings.extend(unauthorized_movements(snapshot, batch));
    findings.extend(amount_mismatches(snapshot, batch, config));
    findings.extend(multi_supplier_items(snapshot, config));
    findings
}
