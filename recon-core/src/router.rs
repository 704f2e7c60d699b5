//! Ledger routing
//!
//! Maps a movement or payment transaction type to the authorization
//! sub-ledger and key field it must be matched against. The table is fixed
//! by the source systems; unknown types are surfaced to the caller, never
//! silently dropped.

use crate::error::{Error, Result};
use crate::types::{AuthorizationKind, MovementType, PaymentType};
use serde::{Deserialize, Serialize};

/// Authorization key field a source reference is compared against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyField {
    /// Stock issue requisition number
    RequisitionNo,
    /// Goods-received note number
    ReceiptNo,
    /// Supplier invoice number
    InvoiceNo,
    /// Payment voucher number
    VoucherNo,
    /// Cheque / settlement number
    ChequeNo,
}

impl KeyField {
    /// Field name as used in summaries and findings
    pub fn name(&self) -> &'static str {
        match self {
            KeyField::RequisitionNo => "requisition_no",
            KeyField::ReceiptNo => "receipt_no",
            KeyField::InvoiceNo => "invoice_no",
            KeyField::VoucherNo => "voucher_no",
            KeyField::ChequeNo => "cheque_no",
        }
    }
}

/// Target of a routing decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RouteTarget {
    /// Authorization sub-ledger to search
    pub ledger: AuthorizationKind,
    /// Key field within that ledger
    pub key: KeyField,
}

/// Pure lookup from declared transaction types to authorization keys.
///
/// Held by the link engine at construction; carries no state.
#[derive(Debug, Clone, Copy, Default)]
pub struct LedgerRouter;

impl LedgerRouter {
    /// Create a router
    pub fn new() -> Self {
        Self
    }

    /// Route a movement transaction to its authorization ledger and key
    pub fn route_movement(&self, movement_type: &MovementType) -> Result<RouteTarget> {
        match movement_type {
            MovementType::Issue => Ok(RouteTarget {
                ledger: AuthorizationKind::Issue,
                key: KeyField::RequisitionNo,
            }),
            MovementType::Receipt => Ok(RouteTarget {
                ledger: AuthorizationKind::Receipt,
                key: KeyField::ReceiptNo,
            }),
            MovementType::Voucher => Ok(RouteTarget {
                ledger: AuthorizationKind::PaymentVoucher,
                key: KeyField::VoucherNo,
            }),
            MovementType::Other(code) => {
                Err(Error::Unroutable(format!("movement type {}", code)))
            }
        }
    }

    /// Route a payment transaction to its authorization ledger and key
    pub fn route_payment(&self, payment_type: &PaymentType) -> Result<RouteTarget> {
        match payment_type {
            PaymentType::Invoice => Ok(RouteTarget {
                ledger: AuthorizationKind::Receipt,
                key: KeyField::InvoiceNo,
            }),
            PaymentType::Voucher => Ok(RouteTarget {
                ledger: AuthorizationKind::PaymentVoucher,
                key: KeyField::VoucherNo,
            }),
            PaymentType::Cheque => Ok(RouteTarget {
                ledger: AuthorizationKind::PaymentVoucher,
                key: KeyField::ChequeNo,
            }),
            PaymentType::Other(code) => {
                Err(Error::Unroutable(format!("payment type {}", code)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movement_routing_table() {
        let router = LedgerRouter::new();

        let issue = router.route_movement(&MovementType::Issue).unwrap();
        assert_eq!(issue.ledger, AuthorizationKind::Issue);
        assert_eq!(issue.key, KeyField::RequisitionNo);

        let receipt = router.route_movement(&MovementType::Receipt).unwrap();
        assert_eq!(receipt.ledger, AuthorizationKind::Receipt);
        assert_eq!(receipt.key, KeyField::ReceiptNo);

        let voucher = router.route_movement(&MovementType::Voucher).unwrap();
        assert_eq!(voucher.ledger, AuthorizationKind::PaymentVoucher);
        assert_eq!(voucher.key, KeyField::VoucherNo);
    }

    #[test]
    fn test_payment_routing_table() {
        let router = LedgerRouter::new();

        let invoice = router.route_payment(&PaymentType::Invoice).unwrap();
        assert_eq!(invoice.ledger, AuthorizationKind::Receipt);
        assert_eq!(invoice.key, KeyField::InvoiceNo);

        let voucher = router.route_payment(&PaymentType::Voucher).unwrap();
        assert_eq!(voucher.ledger, AuthorizationKind::PaymentVoucher);
        assert_eq!(voucher.key, KeyField::VoucherNo);

        let cheque = router.route_payment(&PaymentType::Cheque).unwrap();
        assert_eq!(cheque.ledger, AuthorizationKind::PaymentVoucher);
        assert_eq!(cheque.key, KeyField::ChequeNo);
    }

    #[test]
    fn test_unknown_types_are_unroutable() {
        let router = LedgerRouter::new();

        let movement = router.route_movement(&MovementType::Other("ADJ".into()));
        assert!(matches!(movement, Err(Error::Unroutable(_))));

        let payment = router.route_payment(&PaymentType::Other("DN".into()));
        assert!(matches!(payment, Err(Error::Unroutable(_))));
    }
}
