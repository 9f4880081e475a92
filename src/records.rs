use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;
use crate::types::{
    CommissionId, CommissionStatus, IncomeId, InvoiceId, InvoiceKind, InvoiceStatus,
    LedgerEntryId, LedgerEntryStatus, ManagerId, PropertyId, TenantId, VatType,
};

/// a billed obligation; mutated only by allocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub invoice_id: InvoiceId,
    pub tenant_id: TenantId,
    pub kind: InvoiceKind,
    pub due_date: NaiveDate,
    pub period_key: String,
    pub rent: Money,
    pub service_charge: Money,
    pub vat: Money,
    pub total_due: Money,
    pub amount_paid: Money,
    pub balance: Money,
    pub status: InvoiceStatus,
    /// the ledger entry that last affected this invoice
    pub payment_entry_id: Option<LedgerEntryId>,
}

impl Invoice {
    pub fn new(
        tenant_id: TenantId,
        kind: InvoiceKind,
        due_date: NaiveDate,
        period_key: String,
        rent: Money,
        service_charge: Money,
        vat: Money,
        total_due: Money,
    ) -> Self {
        Self {
            invoice_id: Uuid::new_v4(),
            tenant_id,
            kind,
            due_date,
            period_key,
            rent,
            service_charge,
            vat,
            total_due,
            amount_paid: Money::ZERO,
            balance: total_due,
            status: InvoiceStatus::Unpaid,
            payment_entry_id: None,
        }
    }

    pub fn is_outstanding(&self) -> bool {
        self.status.is_outstanding() && self.balance > Money::ZERO
    }

    /// apply funds to this invoice, returning the amount actually absorbed
    ///
    /// invariant: balance == total_due - amount_paid and never negative
    pub fn apply_payment(&mut self, available: Money, entry_id: LedgerEntryId) -> Money {
        let applied = available.min(self.balance).max(Money::ZERO);
        if applied.is_zero() {
            return Money::ZERO;
        }

        let was_unpaid = self.status == InvoiceStatus::Unpaid;
        self.amount_paid += applied;
        self.balance -= applied;
        self.payment_entry_id = Some(entry_id);

        if self.balance.is_zero() {
            self.status = InvoiceStatus::Paid;
        } else if was_unpaid {
            self.status = InvoiceStatus::Partial;
        }

        applied
    }
}

/// one row in the payment ledger: a cash receipt, the tenant's single
/// CREDIT balance holder, or a PREPAID future-period placeholder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentLedgerEntry {
    pub entry_id: LedgerEntryId,
    pub tenant_id: TenantId,
    pub amount_paid: Money,
    /// balance still outstanding after this receipt
    pub arrears: Money,
    pub status: LedgerEntryStatus,
    pub period_key: String,
    pub date_paid: DateTime<Utc>,
    pub notes: String,
    /// attached after the transaction commits; never rolls payment state back
    pub receipt_url: Option<String>,
}

impl PaymentLedgerEntry {
    pub fn new(
        tenant_id: TenantId,
        amount_paid: Money,
        arrears: Money,
        status: LedgerEntryStatus,
        period_key: String,
        date_paid: DateTime<Utc>,
        notes: String,
    ) -> Self {
        Self {
            entry_id: Uuid::new_v4(),
            tenant_id,
            amount_paid,
            arrears,
            status,
            period_key,
            date_paid,
            notes,
            receipt_url: None,
        }
    }
}

/// manager commission accrued per property per calendar month
///
/// VAT type and rate are persisted at accrual time so commission invoicing
/// never reconstructs them from notes text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagerCommission {
    pub commission_id: CommissionId,
    pub manager_id: ManagerId,
    pub property_id: PropertyId,
    /// fee as configured on the property (percent or already-decimal)
    pub commission_fee: Decimal,
    /// accumulated VAT-exclusive base
    pub income_amount: Money,
    /// accumulated raw cash received
    pub original_income_amount: Money,
    pub commission_amount: Money,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub status: CommissionStatus,
    pub vat_type: VatType,
    pub vat_rate: Decimal,
}

/// append-only audit record of cash received
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Income {
    pub income_id: IncomeId,
    pub property_id: PropertyId,
    pub tenant_id: TenantId,
    pub amount: Money,
    pub date_received: DateTime<Utc>,
    pub source: String,
}

impl Income {
    pub fn new(
        property_id: PropertyId,
        tenant_id: TenantId,
        amount: Money,
        date_received: DateTime<Utc>,
        source: String,
    ) -> Self {
        Self {
            income_id: Uuid::new_v4(),
            property_id,
            tenant_id,
            amount,
            date_received,
            source,
        }
    }
}
