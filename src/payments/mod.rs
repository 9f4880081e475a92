pub mod allocation;
pub mod commission;
pub mod overpayment;

use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::{LedgerError, Result};
use crate::records::{Invoice, PaymentLedgerEntry};
use crate::types::{
    CommissionId, InvoiceId, InvoiceStatus, ManagerId, PaymentOptions, PropertyId, TenantId,
};

pub use allocation::{allocate, resolve_invoices, AllocationOutcome};
pub use commission::accrue_commission;
pub use overpayment::{distribute_overpayment, OverpaymentBreakdown, PrepaidPeriod};

/// one incoming tenant payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub tenant_id: TenantId,
    pub amount_paid: Money,
    /// allocate across exactly these invoices when present
    pub invoice_ids: Option<Vec<InvoiceId>>,
    /// billing period key ("YYYY-MM"); defaults to the current month
    pub period_key: Option<String>,
    pub notes: Option<String>,
    pub options: PaymentOptions,
}

impl PaymentRequest {
    pub fn new(tenant_id: TenantId, amount_paid: Money) -> Self {
        Self {
            tenant_id,
            amount_paid,
            invoice_ids: None,
            period_key: None,
            notes: None,
            options: PaymentOptions::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.amount_paid.is_positive() {
            return Err(LedgerError::InvalidPaymentAmount {
                amount: self.amount_paid,
            });
        }
        if let Some(ids) = &self.invoice_ids {
            if ids.is_empty() {
                return Err(LedgerError::Validation {
                    message: "explicit invoice list must not be empty".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// per-invoice effect of one allocation run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AllocationDelta {
    pub invoice_id: InvoiceId,
    pub applied: Money,
    pub new_balance: Money,
    pub new_status: InvoiceStatus,
}

/// commission effect of one payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommissionSummary {
    pub commission_id: CommissionId,
    pub manager_id: ManagerId,
    pub property_id: PropertyId,
    /// VAT-exclusive base added by this payment
    pub base_amount: Money,
    /// commission added by this payment
    pub commission_amount: Money,
    /// accumulated commission on the row after the upsert
    pub accumulated_commission: Money,
}

/// composed result of one orchestrator run
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentOutcome {
    pub entry: PaymentLedgerEntry,
    pub updated_invoices: Vec<Invoice>,
    pub overpayment: Option<OverpaymentBreakdown>,
    pub commission: Option<CommissionSummary>,
    pub credit_used: Money,
    /// attached post-commit; None while the receipt is pending
    pub receipt_url: Option<String>,
    /// non-fatal post-commit failures ("payment recorded, receipt pending")
    pub warnings: Vec<String>,
}
