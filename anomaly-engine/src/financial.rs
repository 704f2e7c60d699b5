//! Financial anomaly rules
//!
//! High-value outliers per transaction type and erratic unit pricing per
//! item. Rules read the snapshot only; they never mutate it.

use crate::stats;
use crate::types::{AnomalyCategory, AnomalyFinding, Severity};
use recon_core::{AnomalyConfig, LedgerSnapshot, MovementType};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::json;
use std::collections::BTreeMap;

/// Amounts beyond `Q3 + k×IQR` of the same transaction type's distribution
pub fn amount_outliers(
    snapshot: &LedgerSnapshot,
    config: &AnomalyConfig,
) -> Vec<AnomalyFinding> {
    let mut groups: BTreeMap<String, Vec<(String, Decimal)>> = BTreeMap::new();

    for movement in snapshot.movements() {
        groups
            .entry(format!("movement/{}", movement.movement_type.code()))
            .or_default()
            .push((movement.raw_reference.clone(), movement.amount));
    }
    for payment in snapshot.payments() {
        groups
            .entry(format!("payment/{}", payment.payment_type.code()))
            .or_default()
            .push((payment.raw_reference.clone(), payment.amount));
    }

    let mut findings = Vec::new();
    for (transaction_type, entries) in groups {
        let amounts: Vec<Decimal> = entries.iter().map(|(_, amount)| *amount).collect();
        let Some(fence) = stats::iqr_upper_fence(&amounts, config.amount_iqr_multiplier) else {
            continue;
        };

        for (reference, amount) in entries {
            if amount > fence {
                findings.push(
                    AnomalyFinding::new(
                        AnomalyCategory::Financial,
                        Severity::Warning,
                        format!(
                            "amount {} exceeds the {} outlier fence {}",
                            amount, transaction_type, fence
                        ),
                    )
                    .with_subject(reference)
                    .with_evidence(json!({
                        "transaction_type": transaction_type,
                        "amount": amount.to_string(),
                        "fence": fence.to_string(),
                    })),
                );
            }
        }
    }
    findings
}

/// Items whose unit price varies excessively across receipts
pub fn price_variation(
    snapshot: &LedgerSnapshot,
    config: &AnomalyConfig,
) -> Vec<AnomalyFinding> {
    let mut prices_by_item: BTreeMap<String, Vec<f64>> = BTreeMap::new();

    for movement in snapshot.movements() {
        if movement.movement_type != MovementType::Receipt || movement.roll_forward {
            continue;
        }
        let Some(item) = &movement.item_id else {
            continue;
        };
        if movement.quantity <= Decimal::ZERO {
            continue;
        }
        let unit_price = movement.amount / movement.quantity;
        if let Some(price) = unit_price.to_f64() {
            prices_by_item
                .entry(item.as_str().to_string())
                .or_default()
                .push(price);
        }
    }

    let mut findings = Vec::new();
    for (item, prices) in prices_by_item {
        if prices.len() < 2 {
            continue;
        }
        let Some(cv) = stats::coefficient_of_variation_pct(&prices) else {
            continue;
        };
        if cv > config.price_cv_threshold_pct {
            let min = prices.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = prices.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            findings.push(
                AnomalyFinding::new(
                    AnomalyCategory::Financial,
                    Severity::Warning,
                    format!(
                        "unit price variation {:.1}% across {} receipts",
                        cv,
                        prices.len()
                    ),
                )
                .with_subject(item)
                .with_evidence(json!({
                    "cv_pct": cv,
                    "receipts": prices.len(),
                    "min_price": min,
                    "max_price": max,
                })),
            );
        }
    }
    findings
}

/// All financial rules
pub fn detect(snapshot: &LedgerSnapshot, config: &AnomalyConfig) -> Vec<AnomalyFinding> {
    let mut findings = amount_outliers(snapshot, config);
    findings.extend(price_variation(snapshot, config));
    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use recon_core::{ItemId, MovementRecord, Period};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn receipt(reference: &str, item: &str, qty: i64, amount: i64) -> MovementRecord {
        MovementRecord::new(
            reference,
            MovementType::Receipt,
            Decimal::from(qty),
            Decimal::new(amount, 2),
            date("2022-11-18"),
            Period::new("2022-11"),
        )
        .with_item(ItemId::new(item))
    }

    #[test]
    fn test_amount_outlier_flagged() {
        // Seven ordinary receipts and one far outside the fence
        let mut movements: Vec<MovementRecord> = (0..7)
            .map(|i| receipt(&format!("R{}", i), "ITEM-1", 1, 100_00 + i))
            .collect();
        movements.push(receipt("R-BIG", "ITEM-1", 1, 9_000_000_00));
        let snapshot = LedgerSnapshot::new(movements, vec![], vec![], vec![]);

        let findings = amount_outliers(&snapshot, &AnomalyConfig::default());
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].subject_references, vec!["R-BIG"]);
        assert_eq!(findings[0].category, AnomalyCategory::Financial);
    }

    #[test]
    fn test_small_groups_never_flag() {
        let movements = vec![receipt("R1", "ITEM-1", 1, 100_00), receipt("R2", "ITEM-1", 1, 9_999_99)];
        let snapshot = LedgerSnapshot::new(movements, vec![], vec![], vec![]);
        assert!(amount_outliers(&snapshot, &AnomalyConfig::default()).is_empty());
    }

    #[test]
    fn test_volatile_unit_price_flagged() {
        // Same item bought at 1.00, 1.10, then 9.00 per unit
        let movements = vec![
            receipt("R1", "ITEM-9", 10, 10_00),
            receipt("R2", "ITEM-9", 10, 11_00),
            receipt("R3", "ITEM-9", 10, 90_00),
        ];
        let snapshot = LedgerSnapshot::new(movements, vec![], vec![], vec![]);

        let findings = price_variation(&snapshot, &AnomalyConfig::default());
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].subject_references, vec!["ITEM-9"]);
    }

    #[test]
    fn test_stable_unit_price_not_flagged() {
        let movements = vec![
            receipt("R1", "ITEM-9", 10, 10_00),
            receipt("R2", "ITEM-9", 20, 20_00),
            receipt("R3", "ITEM-9", 5, 5_00),
        ];
        let snapshot = LedgerSnapshot::new(movements, vec![], vec![], vec![]);
        assert!(price_variation(&snapshot, &AnomalyConfig::default()).is_empty());
    }
}
