//! Anomaly finding types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Category of a detected anomaly
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum AnomalyCategory {
    /// Unusual monetary values
    Financial,
    /// Unusual quantities or stock levels
    Volume,
    /// Suspicious transaction timing
    Timing,
    /// Broken or inconsistent cross-ledger links
    Relationship,
    /// Malformed, missing, or duplicated source data
    DataQuality,
}

impl AnomalyCategory {
    /// Stable identifier used in exports
    pub fn code(&self) -> &'static str {
        match self {
            AnomalyCategory::Financial => "financial",
            AnomalyCategory::Volume => "volume",
            AnomalyCategory::Timing => "timing",
            AnomalyCategory::Relationship => "relationship",
            AnomalyCategory::DataQuality => "data-quality",
        }
    }
}

/// Severity of a finding
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Severity {
    /// Worth a look during review
    Info,
    /// Needs investigation
    Warning,
    /// Impossible or clearly wrong state
    Critical,
}

impl Severity {
    /// Stable identifier used in exports
    pub fn code(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }
}

/// One detected anomaly. Pure derived output; owns no ledger data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyFinding {
    /// Unique finding ID
    pub finding_id: Uuid,

    /// Category of the rule that fired
    pub category: AnomalyCategory,

    /// Severity of the finding
    pub severity: Severity,

    /// References or identifiers of the records involved
    pub subject_references: Vec<String>,

    /// Values that triggered the finding
    pub evidence: serde_json::Value,

    /// Human-readable description
    pub description: String,

    /// Detection timestamp
    pub detected_at: DateTime<Utc>,
}

impl AnomalyFinding {
    /// Create a finding with no subjects or evidence yet
    pub fn new(
        category: AnomalyCategory,
        severity: Severity,
        description: impl Into<String>,
    ) -> Self {
        Self {
            finding_id: Uuid::new_v4(),
            category,
            severity,
            subject_references: Vec::new(),
            evidence: serde_json::Value::Null,
            description: description.into(),
            detected_at: Utc::now(),
        }
    }

    /// Attach a subject reference
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject_references.push(subject.into());
        self
    }

    /// Attach the triggering values
    pub fn with_evidence(mut self, evidence: serde_json::Value) -> Self {
        self.evidence = evidence;
        self
    }
}
