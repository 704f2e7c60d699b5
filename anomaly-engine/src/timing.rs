//! Timing anomaly rules
//!
//! Weekend activity, same-day bursts per counterparty, and period-level
//! spikes against the batch's own history.

use crate::stats;
use crate::types::{AnomalyCategory, AnomalyFinding, Severity};
use chrono::{Datelike, NaiveDate, Weekday};
use recon_core::{AnomalyConfig, LedgerSnapshot};
use serde_json::json;
use std::collections::BTreeMap;

fn is_non_business_day(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Transactions dated on a non-business day
pub fn non_business_days(snapshot: &LedgerSnapshot) -> Vec<AnomalyFinding> {
    let mut findings = Vec::new();

    for movement in snapshot.movements() {
        if !movement.roll_forward && is_non_business_day(movement.occurred_on) {
            findings.push(weekend_finding(
                &movement.raw_reference,
                movement.occurred_on,
                "movement",
            ));
        }
    }
    for payment in snapshot.payments() {
        if is_non_business_day(payment.occurred_on) {
            findings.push(weekend_finding(
                &payment.raw_reference,
                payment.occurred_on,
                "payment",
            ));
        }
    }
    findings
}

fn weekend_finding(reference: &str, date: NaiveDate, ledger: &str) -> AnomalyFinding {
    AnomalyFinding::new(
        AnomalyCategory::Timing,
        Severity::Info,
        format!("{} dated on a non-business day ({})", ledger, date.weekday()),
    )
    .with_subject(reference)
    .with_evidence(json!({ "date": date.to_string(), "ledger": ledger }))
}

/// Unexplained multi-transaction bursts for one counterparty in one day
pub fn payment_bursts(
    snapshot: &LedgerSnapshot,
    config: &AnomalyConfig,
) -> Vec<AnomalyFinding> {
    let mut per_day: BTreeMap<(String, NaiveDate), u32> = BTreeMap::new();
    for payment in snapshot.payments() {
        *per_day
            .entry((
                payment.counterparty_id.as_str().to_string(),
                payment.occurred_on,
            ))
            .or_default() += 1;
    }

    per_day
        .into_iter()
        .filter(|(_, count)| *count > config.burst_count_threshold)
        .map(|((counterparty, date), count)| {
            AnomalyFinding::new(
                AnomalyCategory::Timing,
                Severity::Warning,
                format!("{} payment transactions for one counterparty in one day", count),
            )
            .with_subject(counterparty)
            .with_evidence(json!({
                "date": date.to_string(),
                "count": count,
                "threshold": config.burst_count_threshold,
            }))
        })
        .collect()
}

/// Reporting periods whose movement activity spikes beyond `mean + k×σ`
pub fn period_spikes(
    snapshot: &LedgerSnapshot,
    config: &AnomalyConfig,
) -> Vec<AnomalyFinding> {
    let mut per_period: BTreeMap<String, u64> = BTreeMap::new();
    for movement in snapshot.movements() {
        *per_period
            .entry(movement.source_period.as_str().to_string())
            .or_default() += 1;
    }
    if per_period.len() < 3 {
        return Vec::new();
    }

    let counts: Vec<f64> = per_period.values().map(|&c| c as f64).collect();
    let Some((mean, std_dev)) = stats::mean_std(&counts) else {
        return Vec::new();
    };
    let threshold = mean + config.period_spike_sigma * std_dev;

    per_period
        .into_iter()
        .filter(|(_, count)| std_dev > 0.0 && (*count as f64) > threshold)
        .map(|(period, count)| {
            AnomalyFinding::new(
                AnomalyCategory::Timing,
                Severity::Info,
                format!("movement activity spike: {} rows in one period", count),
            )
            .with_subject(period)
            .with_evidence(json!({
                "count": count,
                "mean": mean,
                "threshold": threshold,
            }))
        })
        .collect()
}

/// All timing rules
pub fn detect(snapshot: &LedgerSnapshot, config: &AnomalyConfig) -> Vec<AnomalyFinding> {
    let mut findings = non_business_days(snapshot);
    findings.extend(payment_bursts(snapshot, config));
    findings.extend(period_spikes(snapshot, config));
    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use recon_core::{CounterpartyId, MovementRecord, MovementType, PaymentRecord, PaymentType, Period};
    use rust_decimal::Decimal;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn payment_on(day: &str, supplier: &str, seq: u32) -> PaymentRecord {
        PaymentRecord::new(
            format!("P{}", seq),
            PaymentType::Invoice,
            Decimal::from(100),
            date(day),
            CounterpartyId::new(supplier),
            Period::new("2022-11"),
            seq,
        )
    }

    fn movement_in(period: &str, reference: &str, day: &str) -> MovementRecord {
        MovementRecord::new(
            reference,
            MovementType::Issue,
            Decimal::ONE,
            Decimal::from(10),
            date(day),
            Period::new(period),
        )
    }

    #[test]
    fn test_weekend_transaction_flagged() {
        // 2022-11-19 is a Saturday
        let payments = vec![payment_on("2022-11-19", "SUP-A", 1)];
        let movements = vec![movement_in("2022-11", "M1", "2022-11-18")];
        let snapshot = LedgerSnapshot::new(movements, vec![], payments, vec![]);

        let findings = non_business_days(&snapshot);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].subject_references, vec!["P1"]);
    }

    #[test]
    fn test_burst_over_threshold_flagged() {
        let payments: Vec<PaymentRecord> = (0..6)
            .map(|seq| payment_on("2022-11-18", "SUP-A", seq))
            .collect();
        let snapshot = LedgerSnapshot::new(vec![], vec![], payments, vec![]);

        let findings = payment_bursts(&snapshot, &AnomalyConfig::default());
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].subject_references, vec!["SUP-A"]);
        assert_eq!(findings[0].evidence["count"], 6);
    }

    #[test]
    fn test_burst_at_threshold_not_flagged() {
        let payments: Vec<PaymentRecord> = (0..5)
            .map(|seq| payment_on("2022-11-18", "SUP-A", seq))
            .collect();
        let snapshot = LedgerSnapshot::new(vec![], vec![], payments, vec![]);
        assert!(payment_bursts(&snapshot, &AnomalyConfig::default()).is_empty());
    }

    #[test]
    fn test_period_spike_flagged() {
        let mut movements = Vec::new();
        let periods = [
            ("2022-06", 10),
            ("2022-07", 11),
            ("2022-08", 9),
            ("2022-09", 10),
            ("2022-10", 12),
            ("2022-11", 80),
        ];
        for (period, count) in periods {
            for i in 0..count {
                movements.push(movement_in(period, &format!("{}-{}", period, i), "2022-11-01"));
            }
        }
        let snapshot = LedgerSnapshot::new(movements, vec![], vec![], vec![]);

        let findings = period_spikes(&snapshot, &AnomalyConfig::default());
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].subject_references, vec!["2022-11"]);
    }

    #[test]
    fn test_too_few_periods_never_spike() {
        let movements = vec![
            movement_in("2022-10", "A", "2022-10-03"),
            movement_in("2022-11", "B", "2022-11-03"),
        ];
        let snapshot = LedgerSnapshot::new(movements, vec![], vec![], vec![]);
        assert!(period_spikes(&snapshot, &AnomalyConfig::default()).is_empty());
    }
}
