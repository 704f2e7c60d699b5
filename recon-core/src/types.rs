//! Record types for the four source ledgers
//!
//! All records are immutable snapshots derived from upstream tabular data:
//! - Tagged variants, one per ledger kind, with a shared field contract
//! - Raw references are never mutated; canonical forms are derived once
//! - Exact arithmetic (Decimal for money and quantities)

use crate::normalize::{normalize, CanonicalRef};
use crate::router::KeyField;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Supplier or user identifier shared across ledgers
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CounterpartyId(String);

impl CounterpartyId {
    /// Create new counterparty ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CounterpartyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stock item identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(String);

impl ItemId {
    /// Create new item ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reporting window identifier (opaque, e.g. `"2022-11"`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Period(String);

impl Period {
    /// Create new period
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ledger a record originates from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LedgerKind {
    /// Inventory movement ledger
    Movement,
    /// One of the authorization sub-ledgers
    Authorization(AuthorizationKind),
    /// Supplier payment ledger
    Payment,
    /// Expenditure statistics ledger
    Statistics,
}

impl LedgerKind {
    /// Stable identifier used in summaries and findings
    pub fn code(&self) -> &'static str {
        match self {
            LedgerKind::Movement => "movement",
            LedgerKind::Authorization(AuthorizationKind::Issue) => "authorization-issue",
            LedgerKind::Authorization(AuthorizationKind::Receipt) => "authorization-receipt",
            LedgerKind::Authorization(AuthorizationKind::PaymentVoucher) => {
                "authorization-payment-voucher"
            }
            LedgerKind::Authorization(AuthorizationKind::Redundancy) => "authorization-redundancy",
            LedgerKind::Payment => "payment",
            LedgerKind::Statistics => "statistics",
        }
    }
}

impl fmt::Display for LedgerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Authorization sub-ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AuthorizationKind {
    /// Stock issue requisitions
    Issue,
    /// Goods-received notes
    Receipt,
    /// Payment vouchers
    PaymentVoucher,
    /// Obsolete / write-off stock records; never a routing target
    Redundancy,
}

impl AuthorizationKind {
    /// Stable identifier used in summaries and findings
    pub fn code(&self) -> &'static str {
        match self {
            AuthorizationKind::Issue => "issue",
            AuthorizationKind::Receipt => "receipt",
            AuthorizationKind::PaymentVoucher => "payment-voucher",
            AuthorizationKind::Redundancy => "redundancy",
        }
    }

    /// Document key field this sub-ledger is keyed by, where it has one
    pub fn primary_key_field(&self) -> Option<KeyField> {
        match self {
            AuthorizationKind::Issue => Some(KeyField::RequisitionNo),
            AuthorizationKind::Receipt => Some(KeyField::ReceiptNo),
            AuthorizationKind::PaymentVoucher => Some(KeyField::VoucherNo),
            AuthorizationKind::Redundancy => None,
        }
    }
}

impl fmt::Display for AuthorizationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Movement transaction type as declared by the source report
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementType {
    /// Stock issued against a requisition
    Issue,
    /// Goods received against a receipt note
    Receipt,
    /// Movement settled by payment voucher
    Voucher,
    /// Declared type the engine has no rule for
    Other(String),
}

impl MovementType {
    /// Parse from a ledger-native type code
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_uppercase().as_str() {
            "ISS" | "ISSUE" => MovementType::Issue,
            "GRN" | "RECEIPT" => MovementType::Receipt,
            "VOUCH" | "VOUCHER" => MovementType::Voucher,
            other => MovementType::Other(other.to_string()),
        }
    }

    /// Stable identifier used in summaries and findings
    pub fn code(&self) -> &str {
        match self {
            MovementType::Issue => "issue",
            MovementType::Receipt => "receipt",
            MovementType::Voucher => "voucher",
            MovementType::Other(code) => code.as_str(),
        }
    }
}

impl fmt::Display for MovementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Payment transaction type as declared by the source report
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentType {
    /// Supplier invoice
    Invoice,
    /// Cheque / settlement instruction
    Cheque,
    /// Payment voucher
    Voucher,
    /// Declared type the engine has no rule for
    Other(String),
}

impl PaymentType {
    /// Parse from a ledger-native type code
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_uppercase().as_str() {
            "INV" | "INVOICE" => PaymentType::Invoice,
            "CHQ" | "CHEQUE" => PaymentType::Cheque,
            "VCH" | "VOUCH" | "VOUCHER" => PaymentType::Voucher,
            other => PaymentType::Other(other.to_string()),
        }
    }

    /// Stable identifier used in summaries and findings
    pub fn code(&self) -> &str {
        match self {
            PaymentType::Invoice => "invoice",
            PaymentType::Cheque => "cheque",
            PaymentType::Voucher => "voucher",
            PaymentType::Other(code) => code.as_str(),
        }
    }
}

impl fmt::Display for PaymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Inventory movement ledger entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementRecord {
    /// Unique record ID (UUIDv7 for stable snapshot ordering)
    pub record_id: Uuid,

    /// Reference exactly as printed by the source report
    pub raw_reference: String,

    /// Canonical form of `raw_reference`, derived once at construction
    pub canonical_reference: CanonicalRef,

    /// Declared transaction type
    pub movement_type: MovementType,

    /// Item moved, where the source records one
    pub item_id: Option<ItemId>,

    /// Quantity moved
    pub quantity: Decimal,

    /// Monetary value (exact decimal)
    pub amount: Decimal,

    /// Document date
    pub occurred_on: NaiveDate,

    /// Supplier or user, where the source records one
    pub counterparty_id: Option<CounterpartyId>,

    /// Reporting window the row came from
    pub source_period: Period,

    /// Period carried-forward total row; such rows have no authorization
    pub roll_forward: bool,
}

impl MovementRecord {
    /// Create a record, deriving the canonical reference
    pub fn new(
        raw_reference: impl Into<String>,
        movement_type: MovementType,
        quantity: Decimal,
        amount: Decimal,
        occurred_on: NaiveDate,
        source_period: Period,
    ) -> Self {
        let raw_reference = raw_reference.into();
        let canonical_reference = normalize(&raw_reference);
        Self {
            record_id: Uuid::now_v7(),
            raw_reference,
            canonical_reference,
            movement_type,
            item_id: None,
            quantity,
            amount,
            occurred_on,
            counterparty_id: None,
            source_period,
            roll_forward: false,
        }
    }

    /// Attach the item the movement concerns
    pub fn with_item(mut self, item_id: ItemId) -> Self {
        self.item_id = Some(item_id);
        self
    }

    /// Attach the supplier or user
    pub fn with_counterparty(mut self, counterparty_id: CounterpartyId) -> Self {
        self.counterparty_id = Some(counterparty_id);
        self
    }

    /// Mark the row as a period carried-forward total
    pub fn as_roll_forward(mut self) -> Self {
        self.roll_forward = true;
        self
    }
}

/// Document key fields an authorization row can carry.
///
/// Which fields are populated depends on the sub-ledger; rows missing a
/// field are skipped as candidates for that key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeySet {
    /// Stock issue requisition number
    pub requisition_no: Option<String>,
    /// Goods-received note number
    pub receipt_no: Option<String>,
    /// Supplier invoice number
    pub invoice_no: Option<String>,
    /// Payment voucher number
    pub voucher_no: Option<String>,
    /// Cheque / settlement number
    pub cheque_no: Option<String>,
}

impl KeySet {
    /// Raw value of a key field, if the row carries it
    pub fn get(&self, field: KeyField) -> Option<&str> {
        match field {
            KeyField::RequisitionNo => self.requisition_no.as_deref(),
            KeyField::ReceiptNo => self.receipt_no.as_deref(),
            KeyField::InvoiceNo => self.invoice_no.as_deref(),
            KeyField::VoucherNo => self.voucher_no.as_deref(),
            KeyField::ChequeNo => self.cheque_no.as_deref(),
        }
    }

    /// Set a key field
    pub fn set(&mut self, field: KeyField, raw: impl Into<String>) {
        let raw = raw.into();
        match field {
            KeyField::RequisitionNo => self.requisition_no = Some(raw),
            KeyField::ReceiptNo => self.receipt_no = Some(raw),
            KeyField::InvoiceNo => self.invoice_no = Some(raw),
            KeyField::VoucherNo => self.voucher_no = Some(raw),
            KeyField::ChequeNo => self.cheque_no = Some(raw),
        }
    }
}

/// Authorization ledger entry (one of four sub-ledgers)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationRecord {
    /// Unique record ID
    pub record_id: Uuid,

    /// Sub-ledger the row belongs to
    pub kind: AuthorizationKind,

    /// Document key fields, raw as printed
    pub keys: KeySet,

    /// Authorized amount
    pub amount: Decimal,

    /// Authorized quantity
    pub quantity: Decimal,

    /// Document date
    pub occurred_on: NaiveDate,

    /// Supplier or user, where the source records one
    pub counterparty_id: Option<CounterpartyId>,

    /// Item on this line, where the document has item lines
    pub item_id: Option<ItemId>,

    /// Budget vote code
    pub vote_code: Option<String>,

    /// Reporting window the row came from
    pub source_period: Period,
}

impl AuthorizationRecord {
    /// Create a record with an empty key set
    pub fn new(
        kind: AuthorizationKind,
        quantity: Decimal,
        amount: Decimal,
        occurred_on: NaiveDate,
        source_period: Period,
    ) -> Self {
        Self {
            record_id: Uuid::now_v7(),
            kind,
            keys: KeySet::default(),
            amount,
            quantity,
            occurred_on,
            counterparty_id: None,
            item_id: None,
            vote_code: None,
            source_period,
        }
    }

    /// Attach a raw document key
    pub fn with_key(mut self, field: KeyField, raw: impl Into<String>) -> Self {
        self.keys.set(field, raw);
        self
    }

    /// Attach the supplier or user
    pub fn with_counterparty(mut self, counterparty_id: CounterpartyId) -> Self {
        self.counterparty_id = Some(counterparty_id);
        self
    }

    /// Attach the item line
    pub fn with_item(mut self, item_id: ItemId) -> Self {
        self.item_id = Some(item_id);
        self
    }

    /// Attach the budget vote code
    pub fn with_vote_code(mut self, vote_code: impl Into<String>) -> Self {
        self.vote_code = Some(vote_code.into());
        self
    }

    /// Canonical form of this row's primary document key
    pub fn primary_key(&self) -> CanonicalRef {
        match self.kind.primary_key_field() {
            Some(field) => match self.keys.get(field) {
                Some(raw) => normalize(raw),
                None => CanonicalRef::Empty,
            },
            None => CanonicalRef::Empty,
        }
    }
}

/// Supplier payment ledger entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRecord {
    /// Unique record ID
    pub record_id: Uuid,

    /// Reference exactly as printed by the source report
    pub raw_reference: String,

    /// Canonical form of `raw_reference`, derived once at construction
    pub canonical_reference: CanonicalRef,

    /// Declared transaction type
    pub payment_type: PaymentType,

    /// Payment amount (exact decimal)
    pub amount: Decimal,

    /// Document date
    pub occurred_on: NaiveDate,

    /// Supplier paid
    pub counterparty_id: CounterpartyId,

    /// Reporting window the row came from
    pub source_period: Period,

    /// Position within the source ledger; adjacency in this order drives
    /// pair inheritance
    pub seq: u32,
}

impl PaymentRecord {
    /// Create a record, deriving the canonical reference
    pub fn new(
        raw_reference: impl Into<String>,
        payment_type: PaymentType,
        amount: Decimal,
        occurred_on: NaiveDate,
        counterparty_id: CounterpartyId,
        source_period: Period,
        seq: u32,
    ) -> Self {
        let raw_reference = raw_reference.into();
        let canonical_reference = normalize(&raw_reference);
        Self {
            record_id: Uuid::now_v7(),
            raw_reference,
            canonical_reference,
            payment_type,
            amount,
            occurred_on,
            counterparty_id,
            source_period,
            seq,
        }
    }
}

/// Expenditure statistics ledger entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatisticsRecord {
    /// Unique record ID
    pub record_id: Uuid,

    /// Counterparty the statistics row is attributed to
    pub counterparty_id: CounterpartyId,

    /// Reporting window
    pub source_period: Period,

    /// Transactions the statistics generator counted in the window
    pub activity_count: u64,

    /// Total value, where reported
    pub amount: Option<Decimal>,
}

impl StatisticsRecord {
    /// Create a record
    pub fn new(
        counterparty_id: CounterpartyId,
        source_period: Period,
        activity_count: u64,
    ) -> Self {
        Self {
            record_id: Uuid::now_v7(),
            counterparty_id,
            source_period,
            activity_count,
            amount: None,
        }
    }

    /// Attach the reported total value
    pub fn with_amount(mut self, amount: Decimal) -> Self {
        self.amount = Some(amount);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movement_derives_canonical_reference() {
        let record = MovementRecord::new(
            "089322",
            MovementType::Issue,
            Decimal::from(4),
            Decimal::new(120_00, 2),
            NaiveDate::from_ymd_opt(2022, 11, 18).unwrap(),
            Period::new("2022-11"),
        );
        assert_eq!(record.canonical_reference, CanonicalRef::Value("89322".into()));
        assert_eq!(record.raw_reference, "089322");
        assert!(!record.roll_forward);
    }

    #[test]
    fn test_movement_type_from_code() {
        assert_eq!(MovementType::from_code("ISS"), MovementType::Issue);
        assert_eq!(MovementType::from_code("grn"), MovementType::Receipt);
        assert_eq!(MovementType::from_code("VOUCH"), MovementType::Voucher);
        assert_eq!(
            MovementType::from_code("ADJ"),
            MovementType::Other("ADJ".into())
        );
    }

    #[test]
    fn test_payment_type_from_code() {
        assert_eq!(PaymentType::from_code("INV"), PaymentType::Invoice);
        assert_eq!(PaymentType::from_code("CHQ"), PaymentType::Cheque);
        assert_eq!(PaymentType::from_code("VCH"), PaymentType::Voucher);
    }

    #[test]
    fn test_authorization_primary_key() {
        let record = AuthorizationRecord::new(
            AuthorizationKind::Issue,
            Decimal::ONE,
            Decimal::from(500),
            NaiveDate::from_ymd_opt(2022, 11, 1).unwrap(),
            Period::new("2022-11"),
        )
        .with_key(KeyField::RequisitionNo, "000123");
        assert_eq!(record.primary_key(), CanonicalRef::Value("123".into()));
    }

    #[test]
    fn test_redundancy_has_no_primary_key() {
        let record = AuthorizationRecord::new(
            AuthorizationKind::Redundancy,
            Decimal::ONE,
            Decimal::from(10),
            NaiveDate::from_ymd_opt(2022, 11, 1).unwrap(),
            Period::new("2022-11"),
        );
        assert_eq!(record.primary_key(), CanonicalRef::Empty);
    }
}
