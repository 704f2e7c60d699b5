//! Reference normalization
//!
//! Two of the source report generators print the same document number with
//! and without zero-padding, while alphanumeric voucher codes carry no
//! leading-zero ambiguity and must be compared verbatim. Canonical forms make
//! both comparable across ledgers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical form of a ledger reference, stable under re-normalization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CanonicalRef {
    /// Missing or blank source reference. Never matches any reference,
    /// including another `Empty`.
    Empty,
    /// Comparable canonical text
    Value(String),
}

impl CanonicalRef {
    /// Whether the source reference was missing or blank
    pub fn is_empty(&self) -> bool {
        matches!(self, CanonicalRef::Empty)
    }

    /// Canonical text, if the reference carries one
    pub fn as_str(&self) -> Option<&str> {
        match self {
            CanonicalRef::Empty => None,
            CanonicalRef::Value(v) => Some(v.as_str()),
        }
    }

    /// Domain equality: `Empty` matches nothing
    pub fn matches(&self, other: &CanonicalRef) -> bool {
        match (self, other) {
            (CanonicalRef::Value(a), CanonicalRef::Value(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for CanonicalRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CanonicalRef::Empty => write!(f, "<empty>"),
            CanonicalRef::Value(v) => write!(f, "{}", v),
        }
    }
}

/// Canonicalize a raw ledger reference.
///
/// Purely numeric references lose their leading zeros, so `"0001015578"`
/// and `"1015578"` agree. Anything containing a non-digit is trimmed and
/// case-folded but otherwise compared verbatim.
pub fn normalize(raw: &str) -> CanonicalRef {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return CanonicalRef::Empty;
    }

    if trimmed.bytes().all(|b| b.is_ascii_digit()) {
        let stripped = trimmed.trim_start_matches('0');
        let value = if stripped.is_empty() { "0" } else { stripped };
        CanonicalRef::Value(value.to_string())
    } else {
        CanonicalRef::Value(trimmed.to_lowercase())
    }
}

/// Canonicalize an optional reference; `None` behaves like blank input
pub fn normalize_opt(raw: Option<&str>) -> CanonicalRef {
    match raw {
        Some(r) => normalize(r),
        None => CanonicalRef::Empty,
    }
}
