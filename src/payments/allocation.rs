use std::collections::HashSet;

use crate::decimal::Money;
use crate::errors::{LedgerError, Result};
use crate::events::{Event, EventStore};
use crate::records::Invoice;
use crate::store::LedgerStore;
use crate::types::{InvoiceId, LedgerEntryId, TenantId};

use super::AllocationDelta;

/// result of one allocation run
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationOutcome {
    pub deltas: Vec<AllocationDelta>,
    /// portion of the available amount no invoice could absorb
    pub remainder: Money,
}

impl AllocationOutcome {
    pub fn total_applied(&self) -> Money {
        self.deltas.iter().map(|d| d.applied).sum()
    }
}

/// select the invoices one payment may touch
///
/// Explicit ids must be unique, belong to the tenant and be outstanding.
/// Otherwise all outstanding invoices are taken FIFO by due date, with
/// invoices for the target period moved to the front.
pub fn resolve_invoices<S: LedgerStore>(
    store: &S,
    tenant_id: TenantId,
    explicit_ids: Option<&[InvoiceId]>,
    period_key: &str,
) -> Result<Vec<Invoice>> {
    if let Some(ids) = explicit_ids {
        let mut invoices = Vec::with_capacity(ids.len());
        let mut seen = HashSet::with_capacity(ids.len());
        for &id in ids {
            // a repeated id would absorb funds once but decrement the
            // available amount per occurrence, breaking conservation
            if !seen.insert(id) {
                return Err(LedgerError::Validation {
                    message: format!("invoice {id} listed more than once"),
                });
            }
            let invoice = store.invoice(id)?;
            if invoice.tenant_id != tenant_id {
                return Err(LedgerError::InvoiceTenantMismatch { id, tenant_id });
            }
            if !invoice.status.is_outstanding() {
                return Err(LedgerError::InvoiceNotAllocatable {
                    id,
                    status: invoice.status,
                });
            }
            invoices.push(invoice);
        }
        return Ok(invoices);
    }

    let outstanding = store.outstanding_invoices(tenant_id);

    // scope to the target period first, then fall back to anything outstanding;
    // FIFO order is preserved within each group
    let (mut in_period, rest): (Vec<Invoice>, Vec<Invoice>) = outstanding
        .into_iter()
        .partition(|i| i.period_key == period_key);
    in_period.extend(rest);
    Ok(in_period)
}

/// apply an available amount (cash + credit) across invoices in order
///
/// Mutates both the passed invoices and their stored rows. Returns the
/// per-invoice deltas and the unapplied remainder.
pub fn allocate<S: LedgerStore>(
    store: &mut S,
    invoices: &mut [Invoice],
    available: Money,
    entry_id: LedgerEntryId,
    events: &mut EventStore,
) -> Result<AllocationOutcome> {
    let mut remaining = available;
    let mut deltas = Vec::new();

    for invoice in invoices.iter_mut() {
        if remaining.is_zero() {
            break;
        }

        let applied = invoice.apply_payment(remaining, entry_id);
        if applied.is_zero() {
            continue;
        }
        remaining -= applied;

        store.update_invoice(invoice.clone())?;
        deltas.push(AllocationDelta {
            invoice_id: invoice.invoice_id,
            applied,
            new_balance: invoice.balance,
            new_status: invoice.status,
        });
        events.emit(Event::InvoiceAllocated {
            invoice_id: invoice.invoice_id,
            entry_id,
            applied,
            new_balance: invoice.balance,
            new_status: invoice.status,
        });
    }

    Ok(AllocationOutcome {
        deltas,
        remainder: remaining,
    })
}
