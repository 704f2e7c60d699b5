//! Property-based tests for the anomaly rules
//!
//! - Quartile/fence ordering holds for any sample
//! - Negative-balance findings count exactly one per crossing, never zero,
//!   never more

use anomaly_engine::{stats, volume};
use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use recon_core::{ItemId, LedgerSnapshot, MovementRecord, MovementType, Period};
use rust_decimal::Decimal;

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2022, 11, 1).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Property: Q1 ≤ Q3 and the fence is never below Q3
    #[test]
    fn prop_quartiles_ordered(cents in prop::collection::vec(1i64..1_000_000, 4..50)) {
        let values: Vec<Decimal> = cents.iter().map(|&c| Decimal::new(c, 2)).collect();
        let (q1, q3) = stats::quartiles(&values).unwrap();
        prop_assert!(q1 <= q3);

        let fence = stats::iqr_upper_fence(&values, 1.5).unwrap();
        prop_assert!(fence >= q3);
    }

    /// Property: exactly one finding per below-zero crossing of the
    /// running balance
    #[test]
    fn prop_negative_crossings_counted_exactly(
        deltas in prop::collection::vec((any::<bool>(), 1i64..50), 1..30),
    ) {
        let movements: Vec<MovementRecord> = deltas
            .iter()
            .enumerate()
            .map(|(i, &(is_receipt, qty))| {
                let movement_type = if is_receipt {
                    MovementType::Receipt
                } else {
                    MovementType::Issue
                };
                MovementRecord::new(
                    format!("M{}", i),
                    movement_type,
                    Decimal::from(qty),
                    Decimal::new(qty * 10_00, 2),
                    base_date() + Duration::days(i as i64),
                    Period::new("2022-11"),
                )
                .with_item(ItemId::new("ITEM-1"))
            })
            .collect();

        // Reference simulation of the same walk
        let mut balance = 0i64;
        let mut expected = 0usize;
        for &(is_receipt, qty) in &deltas {
            let previous = balance;
            balance += if is_receipt { qty } else { -qty };
            if previous >= 0 && balance < 0 {
                expected += 1;
            }
        }

        let snapshot = LedgerSnapshot::new(movements, vec![], vec![], vec![]);
        let findings = volume::negative_stock(&snapshot);
        prop_assert_eq!(findings.len(), expected);
    }
}
