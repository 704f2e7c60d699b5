//! Volume anomaly rules
//!
//! Quantity outliers per item, impossible running stock balances, and dead
//! stock with recent churn.

use crate::stats;
use crate::types::{AnomalyCategory, AnomalyFinding, Severity};
use chrono::Duration;
use recon_core::{AnomalyConfig, LedgerSnapshot, MovementRecord, MovementType};
use rust_decimal::Decimal;
use serde_json::json;
use std::collections::BTreeMap;

/// Quantities beyond `Q3 + k×IQR` of the same item's distribution
pub fn quantity_outliers(
    snapshot: &LedgerSnapshot,
    config: &AnomalyConfig,
) -> Vec<AnomalyFinding> {
    let mut groups: BTreeMap<String, Vec<(String, Decimal)>> = BTreeMap::new();

    for movement in snapshot.movements() {
        if movement.roll_forward {
            continue;
        }
        let Some(item) = &movement.item_id else {
            continue;
        };
        if movement.quantity <= Decimal::ZERO {
            continue;
        }
        groups
            .entry(item.as_str().to_string())
            .or_default()
            .push((movement.raw_reference.clone(), movement.quantity));
    }

    let mut findings = Vec::new();
    for (item, entries) in groups {
        let quantities: Vec<Decimal> = entries.iter().map(|(_, q)| *q).collect();
        let Some(fence) = stats::iqr_upper_fence(&quantities, config.quantity_iqr_multiplier)
        else {
            continue;
        };

        for (reference, quantity) in entries {
            if quantity > fence {
                findings.push(
                    AnomalyFinding::new(
                        AnomalyCategory::Volume,
                        Severity::Warning,
                        format!("quantity {} exceeds the item outlier fence {}", quantity, fence),
                    )
                    .with_subject(item.clone())
                    .with_subject(reference)
                    .with_evidence(json!({
                        "quantity": quantity.to_string(),
                        "fence": fence.to_string(),
                    })),
                );
            }
        }
    }
    findings
}

/// Stock effect of one movement row: receipts add, issues subtract
fn stock_delta(movement: &MovementRecord) -> Option<Decimal> {
    match movement.movement_type {
        MovementType::Receipt => Some(movement.quantity),
        MovementType::Issue => Some(-movement.quantity),
        _ => None,
    }
}

/// Negative running stock balance.
///
/// The balance runs chronologically per item; every transition from
/// non-negative to negative produces exactly one finding.
pub fn negative_stock(snapshot: &LedgerSnapshot) -> Vec<AnomalyFinding> {
    let mut by_item: BTreeMap<String, Vec<&MovementRecord>> = BTreeMap::new();
    for movement in snapshot.movements() {
        if let Some(item) = &movement.item_id {
            if stock_delta(movement).is_some() {
                by_item
                    .entry(item.as_str().to_string())
                    .or_default()
                    .push(movement);
            }
        }
    }

    let mut findings = Vec::new();
    for (item, mut movements) in by_item {
        // Record IDs are time-ordered, which keeps equal-date rows stable
        movements.sort_by_key(|m| (m.occurred_on, m.record_id));

        let mut balance = Decimal::ZERO;
        for movement in movements {
            let previous = balance;
            balance += stock_delta(movement).unwrap_or_default();
            if previous >= Decimal::ZERO && balance < Decimal::ZERO {
                findings.push(
                    AnomalyFinding::new(
                        AnomalyCategory::Volume,
                        Severity::Critical,
                        format!("running stock balance went negative ({})", balance),
                    )
                    .with_subject(item.clone())
                    .with_subject(movement.raw_reference.clone())
                    .with_evidence(json!({
                        "balance": balance.to_string(),
                        "date": movement.occurred_on.to_string(),
                    })),
                );
            }
        }
    }
    findings
}

/// Items with zero residual stock but non-trivial recent activity
pub fn zero_stock_activity(
    snapshot: &LedgerSnapshot,
    config: &AnomalyConfig,
) -> Vec<AnomalyFinding> {
    let Some(latest) = snapshot.latest_activity_date() else {
        return Vec::new();
    };
    let window_start = latest - Duration::days(i64::from(config.recent_activity_days));

    let mut balance: BTreeMap<String, Decimal> = BTreeMap::new();
    let mut recent: BTreeMap<String, u32> = BTreeMap::new();
    for movement in snapshot.movements() {
        let Some(item) = &movement.item_id else {
            continue;
        };
        let Some(delta) = stock_delta(movement) else {
            continue;
        };
        *balance.entry(item.as_str().to_string()).or_default() += delta;
        if !movement.roll_forward && movement.occurred_on >= window_start {
            *recent.entry(item.as_str().to_string()).or_default() += 1;
        }
    }

    let mut findings = Vec::new();
    for (item, residual) in balance {
        let activity = recent.get(&item).copied().unwrap_or(0);
        if residual == Decimal::ZERO && activity >= config.recent_activity_min {
            findings.push(
                AnomalyFinding::new(
                    AnomalyCategory::Volume,
                    Severity::Info,
                    format!("zero residual stock despite {} recent movements", activity),
                )
                .with_subject(item)
                .with_evidence(json!({
                    "recent_movements": activity,
                    "window_start": window_start.to_string(),
                })),
            );
        }
    }
    findings
}

/// All volume rules
pub fn detect(snapshot: &LedgerSnapshot, config: &AnomalyConfig) -> Vec<AnomalyFinding> {
    let mut findings = quantity_outliers(snapshot, config);
    findings.extend(negative_stock(snapshot));
    findings.extend(zero_stock_activity(snapshot, config));
    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use recon_core::{ItemId, Period};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn movement(
        reference: &str,
        movement_type: MovementType,
        item: &str,
        qty: i64,
        day: &str,
    ) -> MovementRecord {
        MovementRecord::new(
            reference,
            movement_type,
            Decimal::from(qty),
            Decimal::new(qty * 10_00, 2),
            date(day),
            Period::new("2022-11"),
        )
        .with_item(ItemId::new(item))
    }

    #[test]
    fn test_negative_crossing_yields_exactly_one_finding() {
        // Receipt 10, issue 6, issue 6: one crossing below zero, then a
        // further issue while already negative must not add findings
        let movements = vec![
            movement("G1", MovementType::Receipt, "ITEM-1", 10, "2022-11-01"),
            movement("I1", MovementType::Issue, "ITEM-1", 6, "2022-11-02"),
            movement("I2", MovementType::Issue, "ITEM-1", 6, "2022-11-03"),
            movement("I3", MovementType::Issue, "ITEM-1", 1, "2022-11-04"),
        ];
        let snapshot = LedgerSnapshot::new(movements, vec![], vec![], vec![]);

        let findings = negative_stock(&snapshot);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Critical);
        assert!(findings[0].subject_references.contains(&"I2".to_string()));
    }

    #[test]
    fn test_each_crossing_counts_once() {
        // Goes negative, recovers, goes negative again: two findings
        let movements = vec![
            movement("G1", MovementType::Receipt, "ITEM-1", 5, "2022-11-01"),
            movement("I1", MovementType::Issue, "ITEM-1", 8, "2022-11-02"),
            movement("G2", MovementType::Receipt, "ITEM-1", 10, "2022-11-03"),
            movement("I2", MovementType::Issue, "ITEM-1", 9, "2022-11-04"),
        ];
        let snapshot = LedgerSnapshot::new(movements, vec![], vec![], vec![]);

        assert_eq!(negative_stock(&snapshot).len(), 2);
    }

    #[test]
    fn test_healthy_balance_no_findings() {
        let movements = vec![
            movement("G1", MovementType::Receipt, "ITEM-1", 10, "2022-11-01"),
            movement("I1", MovementType::Issue, "ITEM-1", 4, "2022-11-02"),
        ];
        let snapshot = LedgerSnapshot::new(movements, vec![], vec![], vec![]);
        assert!(negative_stock(&snapshot).is_empty());
    }

    #[test]
    fn test_zero_stock_with_churn_flagged() {
        let movements = vec![
            movement("G1", MovementType::Receipt, "ITEM-1", 5, "2022-11-01"),
            movement("I1", MovementType::Issue, "ITEM-1", 2, "2022-11-10"),
            movement("I2", MovementType::Issue, "ITEM-1", 3, "2022-11-15"),
        ];
        let snapshot = LedgerSnapshot::new(movements, vec![], vec![], vec![]);

        let findings = zero_stock_activity(&snapshot, &AnomalyConfig::default());
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Info);
    }

    #[test]
    fn test_quantity_outlier_per_item() {
        let mut movements: Vec<MovementRecord> = (0..6)
            .map(|i| {
                movement(
                    &format!("G{}", i),
                    MovementType::Receipt,
                    "ITEM-1",
                    10 + i,
                    "2022-11-01",
                )
            })
            .collect();
        movements.push(movement("G-BULK", MovementType::Receipt, "ITEM-1", 5_000, "2022-11-02"));
        let snapshot = LedgerSnapshot::new(movements, vec![], vec![], vec![]);

        let findings = quantity_outliers(&snapshot, &AnomalyConfig::default());
        assert_eq!(findings.len(), 1);
        assert!(findings[0].subject_references.contains(&"G-BULK".to_string()));
    }
}
