use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// unique identifier for a tenant
pub type TenantId = Uuid;
/// unique identifier for a property
pub type PropertyId = Uuid;
/// unique identifier for a property manager
pub type ManagerId = Uuid;
/// unique identifier for an invoice
pub type InvoiceId = Uuid;
/// unique identifier for a payment ledger entry
pub type LedgerEntryId = Uuid;
/// unique identifier for a commission accrual row
pub type CommissionId = Uuid;
/// unique identifier for an income record
pub type IncomeId = Uuid;

/// how often a tenant settles rent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentPolicy {
    Monthly,
    Quarterly,
    Annual,
}

impl PaymentPolicy {
    /// months covered by one billing period under this policy
    pub fn months_per_period(&self) -> u32 {
        match self {
            PaymentPolicy::Monthly => 1,
            PaymentPolicy::Quarterly => 3,
            PaymentPolicy::Annual => 12,
        }
    }
}

/// VAT treatment of a tenant's charges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VatType {
    /// VAT already contained inside the quoted amounts
    Inclusive,
    /// VAT added on top of the quoted amounts
    Exclusive,
    /// no VAT applies
    NotApplicable,
}

/// rent escalation cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EscalationFrequency {
    Annually,
    BiAnnually,
}

impl EscalationFrequency {
    pub fn interval_months(&self) -> u32 {
        match self {
            EscalationFrequency::Annually => 12,
            EscalationFrequency::BiAnnually => 6,
        }
    }
}

/// how a service charge is derived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceChargeBasis {
    Fixed,
    Percentage,
    PerSqFt,
}

/// what an invoice bills for; drives the arrears rollup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceKind {
    Rent,
    Bill,
}

/// invoice settlement status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceStatus {
    Unpaid,
    Partial,
    Paid,
    Overdue,
}

impl InvoiceStatus {
    /// outstanding invoices are the ones allocation may touch
    pub fn is_outstanding(&self) -> bool {
        matches!(
            self,
            InvoiceStatus::Unpaid | InvoiceStatus::Partial | InvoiceStatus::Overdue
        )
    }
}

/// payment ledger entry status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEntryStatus {
    /// cash receipt that fully covered the outstanding balance
    Paid,
    /// cash receipt that partially covered the outstanding balance
    Partial,
    /// cash receipt recorded against nothing outstanding
    Unpaid,
    /// the tenant's single unapplied-overpayment holder
    Credit,
    /// a future billing period pre-settled by overpayment
    Prepaid,
}

/// commission accrual lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommissionStatus {
    Pending,
    Processing,
    Paid,
    Cancelled,
}

/// per-request switches for the payment orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentOptions {
    /// synthesize an invoice for the target period when none is outstanding
    pub create_missing_invoices: bool,
    /// mutate invoice balances; when false only the ledger entry, income and
    /// commission are recorded
    pub update_existing_invoices: bool,
    /// distribute any excess over the outstanding balance instead of rejecting
    pub handle_overpayment: bool,
}

impl Default for PaymentOptions {
    fn default() -> Self {
        Self {
            create_missing_invoices: false,
            update_existing_invoices: true,
            handle_overpayment: true,
        }
    }
}
