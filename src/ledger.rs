use chrono::NaiveDate;
use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};

use crate::charges::{expected_charge, ChargeBreakdown, VatRateSource};
use crate::decimal::Money;
use crate::errors::{LedgerError, Result};
use crate::events::{Event, EventStore};
use crate::payments::{
    accrue_commission, allocate, distribute_overpayment, resolve_invoices, PaymentOutcome,
    PaymentRequest,
};
use crate::period::BillingPeriod;
use crate::profile::TenantProfile;
use crate::receipt::{ReceiptContext, ReceiptRenderer};
use crate::records::{Income, Invoice, PaymentLedgerEntry};
use crate::store::LedgerStore;
use crate::types::{
    InvoiceId, InvoiceKind, LedgerEntryStatus, PropertyId, TenantId,
};

/// read-only expected-charge preview
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChargePreview {
    pub rent: Money,
    pub service_charge: Money,
    pub vat: Money,
    pub total_due: Money,
    pub existing_credit: Money,
    /// credit plus any prepaid cover already recorded for the period
    pub total_available: Money,
    pub period: BillingPeriod,
}

/// a tenant's outstanding invoices with their aggregate balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutstandingSummary {
    pub invoices: Vec<Invoice>,
    pub total_balance: Money,
}

/// per-tenant arrears rollup for one property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenantArrears {
    pub tenant_id: TenantId,
    pub tenant_name: String,
    pub rent_arrears: Money,
    pub bill_arrears: Money,
    /// expected charge for the current period when no invoice exists for it
    pub current_period_gap: Money,
    pub total: Money,
}

/// the payment ledger: one atomic unit of work per payment event
///
/// Composes the charge calculator, invoice allocator, overpayment
/// distributor and commission accrual against one storage session. Every
/// mutation of a `record_payment` run happens inside one begin/commit pair;
/// any failure rolls the whole run back.
pub struct PaymentLedger<S: LedgerStore> {
    store: S,
    pub events: EventStore,
    receipt_renderer: Option<Box<dyn ReceiptRenderer>>,
}

impl<S: LedgerStore> PaymentLedger<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            events: EventStore::new(),
            receipt_renderer: None,
        }
    }

    pub fn with_receipt_renderer(mut self, renderer: Box<dyn ReceiptRenderer>) -> Self {
        self.receipt_renderer = Some(renderer);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// record one incoming tenant payment
    ///
    /// Steps 1-10 of the run execute inside one transaction. Receipt
    /// rendering happens after commit; its failure surfaces as a warning on
    /// the outcome, never as an error.
    pub fn record_payment(
        &mut self,
        request: PaymentRequest,
        time_provider: &SafeTimeProvider,
    ) -> Result<PaymentOutcome> {
        request.validate()?;

        let events_checkpoint = self.events.len();
        self.store.begin();
        let (mut outcome, tenant) = match self.run_payment(&request, time_provider) {
            Ok(result) => {
                self.store.commit();
                result
            }
            Err(err) => {
                self.store.rollback();
                self.events.truncate(events_checkpoint);
                return Err(err);
            }
        };

        self.render_receipt(&mut outcome, &tenant);
        Ok(outcome)
    }

    fn run_payment(
        &mut self,
        request: &PaymentRequest,
        time_provider: &SafeTimeProvider,
    ) -> Result<(PaymentOutcome, TenantProfile)> {
        let now = time_provider.now();

        // step 1: load tenant, property and current credit balance
        let tenant = self.store.tenant(request.tenant_id)?;
        let property = self.store.property(tenant.property_id)?;
        let existing_credit = self
            .store
            .credit_entry(tenant.tenant_id)
            .map(|e| e.amount_paid)
            .unwrap_or(Money::ZERO);

        let period = match &request.period_key {
            Some(key) => BillingPeriod::from_key(key)?,
            None => BillingPeriod::current_month(now),
        };
        let period_key = period.key();

        // step 2: resolve the invoice set
        let mut invoices = resolve_invoices(
            &self.store,
            tenant.tenant_id,
            request.invoice_ids.as_deref(),
            &period_key,
        )?;
        if invoices.is_empty() {
            if request.options.create_missing_invoices {
                let charge = expected_charge(&tenant, period, VatRateSource::Tenant)?;
                let invoice = synthesize_invoice(&tenant.tenant_id, &charge, &period_key);
                self.events.emit(Event::InvoiceCreated {
                    tenant_id: tenant.tenant_id,
                    invoice_id: invoice.invoice_id,
                    total_due: invoice.total_due,
                    period_key: period_key.clone(),
                });
                self.store.insert_invoice(invoice.clone());
                invoices.push(invoice);
            } else {
                return Err(LedgerError::NoInvoiceToAllocate {
                    tenant_id: tenant.tenant_id,
                });
            }
        }

        // step 3: availability
        let total_outstanding: Money = invoices.iter().map(|i| i.balance).sum();
        let available = request.amount_paid + existing_credit;

        // step 4: reject overpayment unless handling is enabled
        if available > total_outstanding && !request.options.handle_overpayment {
            return Err(LedgerError::OverpaymentRejected {
                outstanding: total_outstanding,
                supplied: request.amount_paid,
                existing_credit,
            });
        }

        let notes = request.notes.clone().unwrap_or_default();

        if !request.options.update_existing_invoices {
            // record-only mode: the entry, income and commission land but no
            // invoice or credit is touched
            let entry = self.create_cash_entry(
                &tenant.tenant_id,
                request.amount_paid,
                available,
                total_outstanding,
                &period_key,
                notes,
                now,
            );
            self.record_income(&property.property_id, &tenant.tenant_id, request.amount_paid, now);
            let commission_cash = total_outstanding.min(request.amount_paid);
            let commission = accrue_commission(
                &mut self.store,
                &property,
                &tenant,
                commission_cash,
                now,
                &mut self.events,
            )?;
            return Ok((
                PaymentOutcome {
                    entry,
                    updated_invoices: Vec::new(),
                    overpayment: None,
                    commission,
                    credit_used: Money::ZERO,
                    receipt_url: None,
                    warnings: Vec::new(),
                },
                tenant,
            ));
        }

        // step 5: consume credit first
        let credit_used = existing_credit.min(total_outstanding);
        if self.store.credit_entry(tenant.tenant_id).is_some() {
            let remaining_credit = existing_credit - credit_used;
            self.store
                .upsert_credit(tenant.tenant_id, remaining_credit, now);
            if credit_used > Money::ZERO {
                self.events.emit(Event::CreditConsumed {
                    tenant_id: tenant.tenant_id,
                    amount: credit_used,
                    remaining: remaining_credit,
                });
            }
        }

        // step 6: cash ledger entry
        let entry = self.create_cash_entry(
            &tenant.tenant_id,
            request.amount_paid,
            available,
            total_outstanding,
            &period_key,
            notes,
            now,
        );

        // step 7: allocate across the resolved invoices
        let allocation = allocate(
            &mut self.store,
            &mut invoices,
            available,
            entry.entry_id,
            &mut self.events,
        )?;

        // step 8: distribute the excess
        let overpayment = if available > total_outstanding {
            let touched: Vec<InvoiceId> = invoices.iter().map(|i| i.invoice_id).collect();
            Some(distribute_overpayment(
                &mut self.store,
                &tenant,
                allocation.remainder,
                &touched,
                period,
                entry.entry_id,
                now,
                &mut self.events,
            )?)
        } else {
            None
        };

        // step 9: income audit trail for the raw cash amount
        self.record_income(&property.property_id, &tenant.tenant_id, request.amount_paid, now);

        // step 10: commission on the cash cleared against current obligations,
        // never the overpayment slice
        let commission_cash = total_outstanding.min(request.amount_paid);
        let commission = accrue_commission(
            &mut self.store,
            &property,
            &tenant,
            commission_cash,
            now,
            &mut self.events,
        )?;

        // step 11: composed result
        let updated_invoices: Vec<Invoice> = invoices
            .iter()
            .filter(|i| {
                allocation
                    .deltas
                    .iter()
                    .any(|d| d.invoice_id == i.invoice_id)
            })
            .cloned()
            .collect();

        Ok((
            PaymentOutcome {
                entry,
                updated_invoices,
                overpayment,
                commission,
                credit_used,
                receipt_url: None,
                warnings: Vec::new(),
            },
            tenant,
        ))
    }

    fn create_cash_entry(
        &mut self,
        tenant_id: &TenantId,
        amount_paid: Money,
        available: Money,
        total_outstanding: Money,
        period_key: &str,
        notes: String,
        now: chrono::DateTime<chrono::Utc>,
    ) -> PaymentLedgerEntry {
        let status = if total_outstanding.is_zero() {
            LedgerEntryStatus::Unpaid
        } else if available >= total_outstanding {
            LedgerEntryStatus::Paid
        } else {
            LedgerEntryStatus::Partial
        };
        let arrears = (total_outstanding - available).max(Money::ZERO);

        let entry = PaymentLedgerEntry::new(
            *tenant_id,
            amount_paid,
            arrears,
            status,
            period_key.to_string(),
            now,
            notes,
        );
        self.events.emit(Event::PaymentRecorded {
            tenant_id: *tenant_id,
            entry_id: entry.entry_id,
            amount: amount_paid,
            status,
            period_key: period_key.to_string(),
            timestamp: now,
        });
        self.store.insert_entry(entry.clone());
        entry
    }

    fn record_income(
        &mut self,
        property_id: &PropertyId,
        tenant_id: &TenantId,
        amount: Money,
        now: chrono::DateTime<chrono::Utc>,
    ) {
        let income = Income::new(
            *property_id,
            *tenant_id,
            amount,
            now,
            "tenant payment".to_string(),
        );
        self.events.emit(Event::IncomeRecorded {
            property_id: *property_id,
            tenant_id: *tenant_id,
            amount,
            timestamp: now,
        });
        self.store.insert_income(income);
    }

    fn render_receipt(&mut self, outcome: &mut PaymentOutcome, tenant: &TenantProfile) {
        let rendered = {
            let renderer = match &self.receipt_renderer {
                Some(r) => r,
                None => return,
            };
            let overpayment_amount = outcome
                .overpayment
                .as_ref()
                .map(|o| o.total_excess)
                .unwrap_or(Money::ZERO);
            let ctx = ReceiptContext {
                entry: &outcome.entry,
                updated_invoices: &outcome.updated_invoices,
                tenant,
                overpayment_amount,
                credit_used: outcome.credit_used,
            };
            renderer.render(&ctx)
        };

        match rendered {
            Ok(url) => {
                if let Err(err) = self.store.attach_receipt(outcome.entry.entry_id, &url) {
                    outcome
                        .warnings
                        .push(format!("receipt stored but not linked: {err}"));
                }
                self.events.emit(Event::ReceiptAttached {
                    entry_id: outcome.entry.entry_id,
                    url: url.clone(),
                });
                outcome.entry.receipt_url = Some(url.clone());
                outcome.receipt_url = Some(url);
            }
            Err(reason) => {
                self.events.emit(Event::ReceiptFailed {
                    entry_id: outcome.entry.entry_id,
                    reason: reason.clone(),
                });
                outcome
                    .warnings
                    .push(format!("payment recorded, receipt pending: {reason}"));
            }
        }
    }

    /// expected charges for a tenant and period; never mutates state
    pub fn preview_expected_charge(
        &self,
        tenant_id: TenantId,
        period_start: Option<NaiveDate>,
        time_provider: &SafeTimeProvider,
    ) -> Result<ChargePreview> {
        let tenant = self.store.tenant(tenant_id)?;
        let period = match period_start {
            Some(start) => BillingPeriod::month_containing(start),
            None => BillingPeriod::current_month(time_provider.now()),
        };

        let charge = expected_charge(&tenant, period, VatRateSource::Standard)?;
        let existing_credit = self
            .store
            .credit_entry(tenant_id)
            .map(|e| e.amount_paid)
            .unwrap_or(Money::ZERO);
        let prepaid_cover: Money = self
            .store
            .entries_for_tenant(tenant_id)
            .into_iter()
            .filter(|e| e.status == LedgerEntryStatus::Prepaid && e.period_key == period.key())
            .map(|e| e.amount_paid)
            .sum();

        Ok(ChargePreview {
            rent: charge.rent,
            service_charge: charge.service_charge,
            vat: charge.vat,
            total_due: charge.total_due,
            existing_credit,
            total_available: existing_credit + prepaid_cover,
            period,
        })
    }

    /// a tenant's outstanding invoices and their aggregate balance
    pub fn outstanding(&self, tenant_id: TenantId) -> Result<OutstandingSummary> {
        // existence check so an unknown tenant is not an empty summary
        self.store.tenant(tenant_id)?;
        let invoices = self.store.outstanding_invoices(tenant_id);
        let total_balance = invoices.iter().map(|i| i.balance).sum();
        Ok(OutstandingSummary {
            invoices,
            total_balance,
        })
    }

    /// per-tenant arrears rollup for a property: unpaid rent invoices,
    /// unpaid bill invoices, and a current-period-without-invoice gap
    pub fn arrears(
        &self,
        property_id: PropertyId,
        time_provider: &SafeTimeProvider,
    ) -> Result<Vec<TenantArrears>> {
        self.store.property(property_id)?;
        let current = BillingPeriod::current_month(time_provider.now());

        let mut rollup = Vec::new();
        for tenant in self.store.tenants_for_property(property_id) {
            let outstanding = self.store.outstanding_invoices(tenant.tenant_id);
            let rent_arrears: Money = outstanding
                .iter()
                .filter(|i| i.kind == InvoiceKind::Rent)
                .map(|i| i.balance)
                .sum();
            let bill_arrears: Money = outstanding
                .iter()
                .filter(|i| i.kind == InvoiceKind::Bill)
                .map(|i| i.balance)
                .sum();

            let current_period_gap = if self
                .store
                .invoice_for_period(tenant.tenant_id, &current.key())
                .is_none()
            {
                expected_charge(&tenant, current, VatRateSource::Tenant)?.total_due
            } else {
                Money::ZERO
            };

            let total = rent_arrears + bill_arrears + current_period_gap;
            rollup.push(TenantArrears {
                tenant_id: tenant.tenant_id,
                tenant_name: tenant.name.clone(),
                rent_arrears,
                bill_arrears,
                current_period_gap,
                total,
            });
        }
        Ok(rollup)
    }
}

fn synthesize_invoice(
    tenant_id: &TenantId,
    charge: &ChargeBreakdown,
    period_key: &str,
) -> Invoice {
    Invoice::new(
        *tenant_id,
        InvoiceKind::Rent,
        charge.period.start,
        period_key.to_string(),
        charge.rent,
        charge.service_charge,
        charge.vat,
        charge.total_due,
    )
}
