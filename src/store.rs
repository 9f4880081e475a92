use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;

use crate::decimal::Money;
use crate::errors::{LedgerError, Result};
use crate::profile::{PropertyProfile, TenantProfile};
use crate::records::{Income, Invoice, ManagerCommission, PaymentLedgerEntry};
use crate::types::{
    InvoiceId, LedgerEntryId, LedgerEntryStatus, ManagerId, PropertyId, TenantId,
};

/// storage session used by the payment orchestrator
///
/// One orchestrator run maps to one begin/commit pair; any failure inside the
/// run calls rollback and no partial state survives. Implementations must
/// keep at most one CREDIT entry per tenant and apply commission upserts
/// read-modify-write within the open transaction.
pub trait LedgerStore {
    // transaction lifecycle
    fn begin(&mut self);
    fn commit(&mut self);
    fn rollback(&mut self);

    // profiles (CRUD lives outside this core; reads only)
    fn tenant(&self, id: TenantId) -> Result<TenantProfile>;
    fn property(&self, id: PropertyId) -> Result<PropertyProfile>;
    fn tenants_for_property(&self, id: PropertyId) -> Vec<TenantProfile>;

    // invoices
    fn invoice(&self, id: InvoiceId) -> Result<Invoice>;
    /// outstanding invoices for a tenant, FIFO by due date ascending
    fn outstanding_invoices(&self, tenant_id: TenantId) -> Vec<Invoice>;
    /// the tenant's invoice for a period; when several share the period the
    /// earliest due date wins, id as tiebreak
    fn invoice_for_period(&self, tenant_id: TenantId, period_key: &str) -> Option<Invoice>;
    fn insert_invoice(&mut self, invoice: Invoice);
    fn update_invoice(&mut self, invoice: Invoice) -> Result<()>;

    // ledger entries
    fn insert_entry(&mut self, entry: PaymentLedgerEntry);
    fn entries_for_tenant(&self, tenant_id: TenantId) -> Vec<PaymentLedgerEntry>;
    /// the tenant's single CREDIT entry, if any
    fn credit_entry(&self, tenant_id: TenantId) -> Option<PaymentLedgerEntry>;
    /// create or overwrite the tenant's CREDIT entry with `amount`
    fn upsert_credit(
        &mut self,
        tenant_id: TenantId,
        amount: Money,
        now: DateTime<Utc>,
    ) -> LedgerEntryId;
    fn attach_receipt(&mut self, entry_id: LedgerEntryId, url: &str) -> Result<()>;

    // commissions
    fn commission_for_period(
        &self,
        manager_id: ManagerId,
        property_id: PropertyId,
        period_start: NaiveDate,
    ) -> Option<ManagerCommission>;
    fn upsert_commission(&mut self, commission: ManagerCommission);

    // income audit trail
    fn insert_income(&mut self, income: Income);
}

#[derive(Debug, Clone, Default)]
struct StoreData {
    tenants: HashMap<TenantId, TenantProfile>,
    properties: HashMap<PropertyId, PropertyProfile>,
    invoices: HashMap<InvoiceId, Invoice>,
    entries: Vec<PaymentLedgerEntry>,
    // (manager, property, period_start) -> commission
    commissions: HashMap<(ManagerId, PropertyId, NaiveDate), ManagerCommission>,
    incomes: Vec<Income>,
}

/// in-memory store; rollback restores the snapshot taken at begin
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    data: StoreData,
    checkpoint: Option<StoreData>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    // seeding helpers for callers and tests; profile CRUD is external

    pub fn add_tenant(&mut self, tenant: TenantProfile) {
        self.data.tenants.insert(tenant.tenant_id, tenant);
    }

    pub fn add_property(&mut self, property: PropertyProfile) {
        self.data.properties.insert(property.property_id, property);
    }

    pub fn incomes(&self) -> &[Income] {
        &self.data.incomes
    }

    pub fn all_entries(&self) -> &[PaymentLedgerEntry] {
        &self.data.entries
    }

    pub fn commissions(&self) -> Vec<ManagerCommission> {
        self.data.commissions.values().cloned().collect()
    }
}

impl LedgerStore for InMemoryLedgerStore {
    fn begin(&mut self) {
        self.checkpoint = Some(self.data.clone());
    }

    fn commit(&mut self) {
        self.checkpoint = None;
    }

    fn rollback(&mut self) {
        if let Some(saved) = self.checkpoint.take() {
            self.data = saved;
        }
    }

    fn tenant(&self, id: TenantId) -> Result<TenantProfile> {
        self.data
            .tenants
            .get(&id)
            .cloned()
            .ok_or(LedgerError::TenantNotFound { id })
    }

    fn property(&self, id: PropertyId) -> Result<PropertyProfile> {
        self.data
            .properties
            .get(&id)
            .cloned()
            .ok_or(LedgerError::PropertyNotFound { id })
    }

    fn tenants_for_property(&self, id: PropertyId) -> Vec<TenantProfile> {
        let mut tenants: Vec<TenantProfile> = self
            .data
            .tenants
            .values()
            .filter(|t| t.property_id == id)
            .cloned()
            .collect();
        tenants.sort_by(|a, b| a.name.cmp(&b.name));
        tenants
    }

    fn invoice(&self, id: InvoiceId) -> Result<Invoice> {
        self.data
            .invoices
            .get(&id)
            .cloned()
            .ok_or(LedgerError::InvoiceNotFound { id })
    }

    fn outstanding_invoices(&self, tenant_id: TenantId) -> Vec<Invoice> {
        let mut invoices: Vec<Invoice> = self
            .data
            .invoices
            .values()
            .filter(|i| i.tenant_id == tenant_id && i.is_outstanding())
            .cloned()
            .collect();
        // stable FIFO: oldest due date first, id as tiebreak
        invoices.sort_by(|a, b| {
            a.due_date
                .cmp(&b.due_date)
                .then_with(|| a.invoice_id.cmp(&b.invoice_id))
        });
        invoices
    }

    fn invoice_for_period(&self, tenant_id: TenantId, period_key: &str) -> Option<Invoice> {
        self.data
            .invoices
            .values()
            .filter(|i| i.tenant_id == tenant_id && i.period_key == period_key)
            .min_by(|a, b| {
                a.due_date
                    .cmp(&b.due_date)
                    .then_with(|| a.invoice_id.cmp(&b.invoice_id))
            })
            .cloned()
    }

    fn insert_invoice(&mut self, invoice: Invoice) {
        self.data.invoices.insert(invoice.invoice_id, invoice);
    }

    fn update_invoice(&mut self, invoice: Invoice) -> Result<()> {
        if !self.data.invoices.contains_key(&invoice.invoice_id) {
            return Err(LedgerError::InvoiceNotFound {
                id: invoice.invoice_id,
            });
        }
        self.data.invoices.insert(invoice.invoice_id, invoice);
        Ok(())
    }

    fn insert_entry(&mut self, entry: PaymentLedgerEntry) {
        self.data.entries.push(entry);
    }

    fn entries_for_tenant(&self, tenant_id: TenantId) -> Vec<PaymentLedgerEntry> {
        self.data
            .entries
            .iter()
            .filter(|e| e.tenant_id == tenant_id)
            .cloned()
            .collect()
    }

    fn credit_entry(&self, tenant_id: TenantId) -> Option<PaymentLedgerEntry> {
        self.data
            .entries
            .iter()
            .find(|e| e.tenant_id == tenant_id && e.status == LedgerEntryStatus::Credit)
            .cloned()
    }

    fn upsert_credit(
        &mut self,
        tenant_id: TenantId,
        amount: Money,
        now: DateTime<Utc>,
    ) -> LedgerEntryId {
        if let Some(existing) = self
            .data
            .entries
            .iter_mut()
            .find(|e| e.tenant_id == tenant_id && e.status == LedgerEntryStatus::Credit)
        {
            existing.amount_paid = amount;
            existing.date_paid = now;
            return existing.entry_id;
        }

        let entry = PaymentLedgerEntry::new(
            tenant_id,
            amount,
            Money::ZERO,
            LedgerEntryStatus::Credit,
            String::new(),
            now,
            "overpayment credit balance".to_string(),
        );
        let id = entry.entry_id;
        self.data.entries.push(entry);
        id
    }

    fn attach_receipt(&mut self, entry_id: LedgerEntryId, url: &str) -> Result<()> {
        let entry = self
            .data
            .entries
            .iter_mut()
            .find(|e| e.entry_id == entry_id)
            .ok_or(LedgerError::Storage {
                message: format!("ledger entry {entry_id} not found for receipt"),
            })?;
        entry.receipt_url = Some(url.to_string());
        Ok(())
    }

    fn commission_for_period(
        &self,
        manager_id: ManagerId,
        property_id: PropertyId,
        period_start: NaiveDate,
    ) -> Option<ManagerCommission> {
        self.data
            .commissions
            .get(&(manager_id, property_id, period_start))
            .cloned()
    }

    fn upsert_commission(&mut self, commission: ManagerCommission) {
        let key = (
            commission.manager_id,
            commission.property_id,
            commission.period_start,
        );
        self.data.commissions.insert(key, commission);
    }

    fn insert_income(&mut self, income: Income) {
        self.data.incomes.push(income);
    }
}
