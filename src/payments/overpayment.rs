use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::charges::{expected_charge, VatRateSource};
use crate::decimal::Money;
use crate::errors::Result;
use crate::events::{Event, EventStore};
use crate::period::BillingPeriod;
use crate::profile::TenantProfile;
use crate::records::{Invoice, PaymentLedgerEntry};
use crate::store::LedgerStore;
use crate::types::{InvoiceId, LedgerEntryId, LedgerEntryStatus};

use super::allocation::allocate;
use super::AllocationDelta;

/// one future billing period pre-settled by overpayment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrepaidPeriod {
    pub entry_id: LedgerEntryId,
    pub period_key: String,
    /// cash consumed for this period (one periodic rent)
    pub amount: Money,
    /// the charge calculator's total due for the period
    pub expected_total: Money,
}

/// where the excess over the outstanding balance ended up
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverpaymentBreakdown {
    pub total_excess: Money,
    pub to_other_invoices: Vec<AllocationDelta>,
    pub prepaid_periods: Vec<PrepaidPeriod>,
    /// final remainder stored in the tenant's CREDIT entry
    pub credited: Money,
}

impl OverpaymentBreakdown {
    /// conservation check: everything distributed plus the credited
    /// remainder must equal the excess, to the cent
    pub fn total_distributed(&self) -> Money {
        let to_invoices: Money = self.to_other_invoices.iter().map(|d| d.applied).sum();
        let prepaid: Money = self.prepaid_periods.iter().map(|p| p.amount).sum();
        to_invoices + prepaid + self.credited
    }
}

/// spread an overpayment across other invoices, prepaid periods, and credit
///
/// Runs only when available (cash + credit) exceeded the outstanding balance
/// of the invoices the allocator considered. Order: FIFO across outstanding
/// invoices not already touched this run, then whole future periods at one
/// periodic rent each, then the remainder into the single CREDIT entry.
pub fn distribute_overpayment<S: LedgerStore>(
    store: &mut S,
    profile: &TenantProfile,
    excess: Money,
    touched: &[InvoiceId],
    current_period: BillingPeriod,
    entry_id: LedgerEntryId,
    now: DateTime<Utc>,
    events: &mut EventStore,
) -> Result<OverpaymentBreakdown> {
    let mut remaining = excess;

    // step 1: other outstanding invoices, FIFO by due date
    let mut others: Vec<Invoice> = store
        .outstanding_invoices(profile.tenant_id)
        .into_iter()
        .filter(|i| !touched.contains(&i.invoice_id))
        .collect();
    let allocation = allocate(store, &mut others, remaining, entry_id, events)?;
    remaining = allocation.remainder;

    // step 2: whole future periods at one periodic rent each
    let mut prepaid_periods = Vec::new();
    let periodic_rent = profile.periodic_rent();
    let (periods_covered, remainder) = remaining.div_rem(periodic_rent);

    let months = profile.payment_policy.months_per_period();
    let mut period = current_period;
    for _ in 0..periods_covered {
        period = period.next(months)?;
        let charge = expected_charge(profile, period, VatRateSource::Tenant)?;

        let entry = PaymentLedgerEntry::new(
            profile.tenant_id,
            periodic_rent,
            Money::ZERO,
            LedgerEntryStatus::Prepaid,
            period.key(),
            now,
            format!("prepaid period {}; expected total {}", period.key(), charge.total_due),
        );
        events.emit(Event::PrepaidPeriodCovered {
            tenant_id: profile.tenant_id,
            entry_id: entry.entry_id,
            period_key: period.key(),
            amount: periodic_rent,
            expected_total: charge.total_due,
        });
        prepaid_periods.push(PrepaidPeriod {
            entry_id: entry.entry_id,
            period_key: period.key(),
            amount: periodic_rent,
            expected_total: charge.total_due,
        });
        store.insert_entry(entry);
    }
    remaining = remainder;

    // step 3: remainder becomes the tenant's credit balance (overwrite, the
    // orchestrator consumed any prior credit before allocation)
    if remaining > Money::ZERO || store.credit_entry(profile.tenant_id).is_some() {
        store.upsert_credit(profile.tenant_id, remaining, now);
    }
    if remaining > Money::ZERO {
        events.emit(Event::CreditStored {
            tenant_id: profile.tenant_id,
            amount: remaining,
        });
    }

    Ok(OverpaymentBreakdown {
        total_excess: excess,
        to_other_invoices: allocation.deltas,
        prepaid_periods,
        credited: remaining,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::VatConfig;
    use crate::store::InMemoryLedgerStore;
    use crate::types::{InvoiceKind, PaymentPolicy};
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn profile(rent: i64, policy: PaymentPolicy) -> TenantProfile {
        TenantProfile {
            tenant_id: Uuid::new_v4(),
            name: "Acme Stores".to_string(),
            property_id: Uuid::new_v4(),
            unit_size_sq_ft: None,
            rent: Money::from_major(rent),
            escalation: None,
            rent_start: date(2025, 1, 1),
            payment_policy: policy,
            vat: VatConfig::not_applicable(),
            service_charge: None,
        }
    }

    fn invoice(tenant_id: Uuid, due: NaiveDate, total: i64) -> Invoice {
        Invoice::new(
            tenant_id,
            InvoiceKind::Rent,
            due,
            due.format("%Y-%m").to_string(),
            Money::from_major(total),
            Money::ZERO,
            Money::ZERO,
            Money::from_major(total),
        )
    }

    #[test]
    fn test_below_one_period_goes_to_credit() {
        // floor/modulo boundary: 3000 < 5000 monthly rent covers 0 periods
        let p = profile(5_000, PaymentPolicy::Monthly);
        let mut store = InMemoryLedgerStore::new();
        let mut events = EventStore::new();
        let period = BillingPeriod::month_containing(date(2026, 3, 1));

        let breakdown = distribute_overpayment(
            &mut store,
            &p,
            Money::from_major(3_000),
            &[],
            period,
            Uuid::new_v4(),
            Utc::now(),
            &mut events,
        )
        .unwrap();

        assert!(breakdown.prepaid_periods.is_empty());
        assert_eq!(breakdown.credited, Money::from_major(3_000));
        assert_eq!(
            store.credit_entry(p.tenant_id).unwrap().amount_paid,
            Money::from_major(3_000)
        );
        assert_eq!(breakdown.total_distributed(), Money::from_major(3_000));
    }

    #[test]
    fn test_whole_periods_prepaid_with_remainder_credited() {
        let p = profile(5_000, PaymentPolicy::Monthly);
        let mut store = InMemoryLedgerStore::new();
        let mut events = EventStore::new();
        let period = BillingPeriod::month_containing(date(2026, 3, 1));

        let breakdown = distribute_overpayment(
            &mut store,
            &p,
            Money::from_major(12_500),
            &[],
            period,
            Uuid::new_v4(),
            Utc::now(),
            &mut events,
        )
        .unwrap();

        assert_eq!(breakdown.prepaid_periods.len(), 2);
        assert_eq!(breakdown.prepaid_periods[0].period_key, "2026-04");
        assert_eq!(breakdown.prepaid_periods[1].period_key, "2026-05");
        assert_eq!(breakdown.credited, Money::from_major(2_500));
        assert_eq!(breakdown.total_distributed(), Money::from_major(12_500));

        let prepaid: Vec<_> = store
            .entries_for_tenant(p.tenant_id)
            .into_iter()
            .filter(|e| e.status == LedgerEntryStatus::Prepaid)
            .collect();
        assert_eq!(prepaid.len(), 2);
    }

    #[test]
    fn test_quarterly_policy_advances_by_quarter() {
        let p = profile(5_000, PaymentPolicy::Quarterly);
        let mut store = InMemoryLedgerStore::new();
        let mut events = EventStore::new();
        let period = BillingPeriod::starting(date(2026, 1, 1), 3).unwrap();

        // one quarter costs 15000
        let breakdown = distribute_overpayment(
            &mut store,
            &p,
            Money::from_major(16_000),
            &[],
            period,
            Uuid::new_v4(),
            Utc::now(),
            &mut events,
        )
        .unwrap();

        assert_eq!(breakdown.prepaid_periods.len(), 1);
        assert_eq!(breakdown.prepaid_periods[0].period_key, "2026-04");
        assert_eq!(breakdown.prepaid_periods[0].amount, Money::from_major(15_000));
        assert_eq!(breakdown.credited, Money::from_major(1_000));
    }

    #[test]
    fn test_other_invoices_before_prepaid() {
        let p = profile(5_000, PaymentPolicy::Monthly);
        let mut store = InMemoryLedgerStore::new();
        let mut events = EventStore::new();

        let other = invoice(p.tenant_id, date(2026, 1, 1), 2_000);
        let other_id = other.invoice_id;
        store.insert_invoice(other);

        let period = BillingPeriod::month_containing(date(2026, 3, 1));
        let breakdown = distribute_overpayment(
            &mut store,
            &p,
            Money::from_major(7_500),
            &[],
            period,
            Uuid::new_v4(),
            Utc::now(),
            &mut events,
        )
        .unwrap();

        // 2000 to the other invoice, 5000 to one prepaid month, 500 credit
        assert_eq!(breakdown.to_other_invoices.len(), 1);
        assert_eq!(breakdown.to_other_invoices[0].invoice_id, other_id);
        assert_eq!(breakdown.to_other_invoices[0].applied, Money::from_major(2_000));
        assert_eq!(breakdown.prepaid_periods.len(), 1);
        assert_eq!(breakdown.credited, Money::from_major(500));
        assert_eq!(breakdown.total_distributed(), Money::from_major(7_500));
    }

    #[test]
    fn test_touched_invoices_skipped() {
        let p = profile(5_000, PaymentPolicy::Monthly);
        let mut store = InMemoryLedgerStore::new();
        let mut events = EventStore::new();

        let touched = invoice(p.tenant_id, date(2026, 1, 1), 2_000);
        let touched_id = touched.invoice_id;
        store.insert_invoice(touched);

        let period = BillingPeriod::month_containing(date(2026, 3, 1));
        let breakdown = distribute_overpayment(
            &mut store,
            &p,
            Money::from_major(1_000),
            &[touched_id],
            period,
            Uuid::new_v4(),
            Utc::now(),
            &mut events,
        )
        .unwrap();

        assert!(breakdown.to_other_invoices.is_empty());
        assert_eq!(breakdown.credited, Money::from_major(1_000));
        // the touched invoice was left alone
        assert_eq!(
            store.invoice(touched_id).unwrap().balance,
            Money::from_major(2_000)
        );
    }
}
