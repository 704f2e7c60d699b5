//! Demo orchestrator: runs the full reconciliation pipeline over a small
//! synthetic batch of municipal ledger data and prints the results.

use anomaly_engine::AnomalyDetector;
use anyhow::Result;
use audit_trail::{summarize, TrailAssembler};
use chrono::NaiveDate;
use linkage::LinkEngine;
use recon_core::{
    AuthorizationKind, AuthorizationRecord, CounterpartyId, ItemId, KeyField, LedgerSnapshot,
    MovementRecord, MovementType, PaymentRecord, PaymentType, Period, ReconConfig,
    StatisticsRecord,
};
use rust_decimal_macros::dec;
use tracing::info;

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("valid demo date")
}

/// A small batch exercising every pipeline stage: padded references,
/// an invoice/cheque settlement pair, an orphaned authorization, and a
/// stock balance that goes negative.
fn demo_snapshot() -> LedgerSnapshot {
    let period = Period::new("2022-11");
    let electrical = CounterpartyId::new("SUP-ELEC-01");
    let hardware = CounterpartyId::new("SUP-HW-02");

    let movements = vec![
        // Issue whose reference is zero-padded relative to the requisition
        MovementRecord::new(
            "089322",
            MovementType::Issue,
            dec!(4),
            dec!(1200.00),
            date("2022-11-18"),
            period.clone(),
        )
        .with_item(ItemId::new("CABLE-25MM"))
        .with_counterparty(electrical.clone()),
        // Receipt feeding the stock balance
        MovementRecord::new(
            "700441",
            MovementType::Receipt,
            dec!(10),
            dec!(5500.00),
            date("2022-11-10"),
            period.clone(),
        )
        .with_item(ItemId::new("CABLE-25MM"))
        .with_counterparty(electrical.clone()),
        // Issues more than was ever received; the balance goes negative
        MovementRecord::new(
            "089330",
            MovementType::Issue,
            dec!(14),
            dec!(7700.00),
            date("2022-11-21"),
            period.clone(),
        )
        .with_item(ItemId::new("CABLE-25MM")),
    ];

    let authorizations = vec![
        AuthorizationRecord::new(
            AuthorizationKind::Issue,
            dec!(4),
            dec!(1200.00),
            date("2022-11-15"),
            period.clone(),
        )
        .with_key(KeyField::RequisitionNo, "89322")
        .with_counterparty(electrical.clone())
        .with_vote_code("9/1513/0441"),
        AuthorizationRecord::new(
            AuthorizationKind::Receipt,
            dec!(10),
            dec!(140000.00),
            date("2022-11-15"),
            period.clone(),
        )
        .with_key(KeyField::ReceiptNo, "700441")
        .with_key(KeyField::InvoiceNo, "1015578")
        .with_counterparty(hardware.clone()),
        // Nothing ever links to this one
        AuthorizationRecord::new(
            AuthorizationKind::Issue,
            dec!(2),
            dec!(300.00),
            date("2022-11-02"),
            period.clone(),
        )
        .with_key(KeyField::RequisitionNo, "90001"),
    ];

    let payments = vec![
        // Invoice matches the receipt authorization after zero-stripping
        PaymentRecord::new(
            "0001015578",
            PaymentType::Invoice,
            dec!(140000.00),
            date("2022-11-18"),
            hardware.clone(),
            period.clone(),
            1,
        ),
        // The cheque settling it carries a number recorded nowhere else
        PaymentRecord::new(
            "34211",
            PaymentType::Cheque,
            dec!(140000.00),
            date("2022-11-18"),
            hardware.clone(),
            period.clone(),
            2,
        ),
    ];

    let statistics = vec![
        StatisticsRecord::new(hardware, period.clone(), 9).with_amount(dec!(140000.00)),
        StatisticsRecord::new(electrical, period, 14).with_amount(dec!(6700.00)),
    ];

    LedgerSnapshot::new(movements, authorizations, payments, statistics)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = ReconConfig::from_env()?;
    let snapshot = demo_snapshot();
    info!(
        movements = snapshot.movements().len(),
        authorizations = snapshot.authorizations().len(),
        payments = snapshot.payments().len(),
        statistics = snapshot.statistics().len(),
        "loaded demo snapshot"
    );

    // Link building: routing, matching, pair inheritance
    let engine = LinkEngine::new(&config);
    let batch = engine.run(&snapshot);

    // Audit trails per canonical reference
    let assembler = TrailAssembler::new(&snapshot, &batch.links);
    let trails = assembler.assemble_all();
    for trail in &trails {
        info!(
            reference = %trail.canonical_reference,
            completeness = trail.completeness_score,
            payments = trail.payments.len(),
            "trail assembled"
        );
    }

    // Anomaly detection over the reconciled batch
    let detector = AnomalyDetector::new(config.anomaly.clone());
    let findings = detector.detect(&snapshot, &batch);
    for finding in &findings {
        info!(
            category = finding.category.code(),
            severity = finding.severity.code(),
            subjects = ?finding.subject_references,
            "{}",
            finding.description
        );
    }

    let summary = summarize(&snapshot, &batch, &trails);
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}
