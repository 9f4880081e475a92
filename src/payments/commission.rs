use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::charges::vat_exclusive_base;
use crate::decimal::{Money, Rate};
use crate::errors::Result;
use crate::events::{Event, EventStore};
use crate::period::BillingPeriod;
use crate::profile::{PropertyProfile, TenantProfile};
use crate::records::ManagerCommission;
use crate::store::LedgerStore;
use crate::types::CommissionStatus;

use super::CommissionSummary;

/// accrue the manager's commission for the cash cleared against the
/// current billing period
///
/// The base is VAT-exclusive: for INCLUSIVE and EXCLUSIVE tenants the VAT
/// component is stripped before the fee applies. Accruals are keyed by
/// (manager, property, calendar month of the payment date); payments within
/// the same month accumulate into one row. Never called with the
/// overpayment slice, only the cash cleared against current obligations.
pub fn accrue_commission<S: LedgerStore>(
    store: &mut S,
    property: &PropertyProfile,
    tenant: &TenantProfile,
    cash_for_period: Money,
    paid_at: DateTime<Utc>,
    events: &mut EventStore,
) -> Result<Option<CommissionSummary>> {
    if !cash_for_period.is_positive() {
        return Ok(None);
    }
    let (manager_id, fee) = match (property.manager_id, property.commission_fee) {
        (Some(m), Some(f)) => (m, f),
        _ => return Ok(None),
    };

    let base = vat_exclusive_base(cash_for_period, tenant.vat.vat_type, tenant.vat.vat_rate);
    let commission = base * Rate::from_fee(fee).as_decimal();

    let month = BillingPeriod::month_containing(paid_at.date_naive());

    // read-modify-write inside the open transaction
    let row = match store.commission_for_period(manager_id, property.property_id, month.start) {
        Some(mut existing) => {
            existing.income_amount += base;
            existing.original_income_amount += cash_for_period;
            existing.commission_amount += commission;
            existing
        }
        None => ManagerCommission {
            commission_id: Uuid::new_v4(),
            manager_id,
            property_id: property.property_id,
            commission_fee: fee,
            income_amount: base,
            original_income_amount: cash_for_period,
            commission_amount: commission,
            period_start: month.start,
            period_end: month.end,
            status: CommissionStatus::Pending,
            vat_type: tenant.vat.vat_type,
            vat_rate: tenant.vat.vat_rate,
        },
    };

    let summary = CommissionSummary {
        commission_id: row.commission_id,
        manager_id,
        property_id: property.property_id,
        base_amount: base,
        commission_amount: commission,
        accumulated_commission: row.commission_amount,
    };

    events.emit(Event::CommissionAccrued {
        manager_id,
        property_id: property.property_id,
        base_amount: base,
        commission_amount: commission,
        period_start: month.start,
    });
    store.upsert_commission(row);

    Ok(Some(summary))
}
