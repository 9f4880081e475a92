use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::{
    InvoiceId, InvoiceStatus, LedgerEntryId, LedgerEntryStatus, ManagerId, PropertyId, TenantId,
};

/// all events emitted by the payment ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // payment lifecycle
    PaymentRecorded {
        tenant_id: TenantId,
        entry_id: LedgerEntryId,
        amount: Money,
        status: LedgerEntryStatus,
        period_key: String,
        timestamp: DateTime<Utc>,
    },
    InvoiceCreated {
        tenant_id: TenantId,
        invoice_id: InvoiceId,
        total_due: Money,
        period_key: String,
    },
    InvoiceAllocated {
        invoice_id: InvoiceId,
        entry_id: LedgerEntryId,
        applied: Money,
        new_balance: Money,
        new_status: InvoiceStatus,
    },

    // credit lifecycle
    CreditConsumed {
        tenant_id: TenantId,
        amount: Money,
        remaining: Money,
    },
    CreditStored {
        tenant_id: TenantId,
        amount: Money,
    },

    // overpayment distribution
    PrepaidPeriodCovered {
        tenant_id: TenantId,
        entry_id: LedgerEntryId,
        period_key: String,
        amount: Money,
        expected_total: Money,
    },

    // commission and income
    CommissionAccrued {
        manager_id: ManagerId,
        property_id: PropertyId,
        base_amount: Money,
        commission_amount: Money,
        period_start: NaiveDate,
    },
    IncomeRecorded {
        property_id: PropertyId,
        tenant_id: TenantId,
        amount: Money,
        timestamp: DateTime<Utc>,
    },

    // post-commit side effects
    ReceiptAttached {
        entry_id: LedgerEntryId,
        url: String,
    },
    ReceiptFailed {
        entry_id: LedgerEntryId,
        reason: String,
    },
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// drop events emitted after a checkpoint; used when a transaction rolls back
    pub fn truncate(&mut self, len: usize) {
        self.events.truncate(len);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
