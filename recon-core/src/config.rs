//! Configuration for the reconciliation engine
//!
//! All thresholds live in one immutable object handed to components at
//! construction; nothing reads process-wide state.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Reconciliation engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconConfig {
    /// Payment pair inheritance
    pub pairing: PairingConfig,

    /// Anomaly detection thresholds
    pub anomaly: AnomalyConfig,
}

/// Invoice→cheque link propagation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PairingConfig {
    /// Propagate invoice links to paired cheque records
    pub enabled: bool,
}

impl Default for PairingConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Anomaly detection thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyConfig {
    /// IQR multiplier for amount outlier fences
    pub amount_iqr_multiplier: f64,

    /// IQR multiplier for quantity outlier fences
    pub quantity_iqr_multiplier: f64,

    /// Unit-price coefficient of variation threshold, percent
    pub price_cv_threshold_pct: f64,

    /// Tolerated |source amount − authorization amount| on a resolved link
    pub amount_tolerance: Decimal,

    /// Same-counterparty transactions in one day before a burst is flagged
    pub burst_count_threshold: u32,

    /// Sigma multiplier for period activity spikes
    pub period_spike_sigma: f64,

    /// Distinct suppliers per item before the relationship is flagged
    pub max_suppliers_per_item: u32,

    /// Days back from the latest ledger date that count as recent
    pub recent_activity_days: u32,

    /// Movements within the window for zero-stock activity to be non-trivial
    pub recent_activity_min: u32,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            amount_iqr_multiplier: 1.5,
            quantity_iqr_multiplier: 1.5,
            price_cv_threshold_pct: 50.0,
            amount_tolerance: Decimal::new(1, 2), // 0.01 currency units
            burst_count_threshold: 5,
            period_spike_sigma: 2.0,
            max_suppliers_per_item: 3,
            recent_activity_days: 90,
            recent_activity_min: 3,
        }
    }
}

impl ReconConfig {
    /// Load from a TOML file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Defaults with environment variable overrides
    pub fn from_env() -> crate::Result<Self> {
        let mut config = ReconConfig::default();

        if let Ok(tolerance) = std::env::var("RECON_AMOUNT_TOLERANCE") {
            config.anomaly.amount_tolerance = tolerance.parse().map_err(|e| {
                crate::Error::Config(format!("Bad RECON_AMOUNT_TOLERANCE: {}", e))
            })?;
        }

        if let Ok(threshold) = std::env::var("RECON_BURST_THRESHOLD") {
            config.anomaly.burst_count_threshold = threshold.parse().map_err(|e| {
                crate::Error::Config(format!("Bad RECON_BURST_THRESHOLD: {}", e))
            })?;
        }

        if let Ok(enabled) = std::env::var("RECON_PAIRING_ENABLED") {
            config.pairing.enabled = enabled == "1" || enabled.eq_ignore_ascii_case("true");
        }

        Ok(config)
    }
}
