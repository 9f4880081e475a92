use crate::decimal::Money;
use crate::profile::TenantProfile;
use crate::records::{Invoice, PaymentLedgerEntry};

/// everything a receipt document needs about one committed payment
#[derive(Debug, Clone, Copy)]
pub struct ReceiptContext<'a> {
    pub entry: &'a PaymentLedgerEntry,
    pub updated_invoices: &'a [Invoice],
    pub tenant: &'a TenantProfile,
    pub overpayment_amount: Money,
    pub credit_used: Money,
}

/// post-commit collaborator that renders and stores a receipt document
///
/// Runs after the payment transaction has committed; a failure here must
/// never roll the financial state back, so the error is a plain message the
/// orchestrator attaches to the outcome as a warning.
pub trait ReceiptRenderer {
    fn render(&self, ctx: &ReceiptContext<'_>) -> std::result::Result<String, String>;
}
