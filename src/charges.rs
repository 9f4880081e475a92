use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::Result;
use crate::period::{months_between, BillingPeriod};
use crate::profile::TenantProfile;
use crate::types::{ServiceChargeBasis, VatType};

/// standard VAT rate used by the charge-preview path
pub const STANDARD_VAT_RATE: Decimal = dec!(16);

/// where the VAT rate comes from for a calculation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VatRateSource {
    /// fixed standard rate (charge preview)
    Standard,
    /// the tenant's configured rate (invoice generation)
    Tenant,
}

/// expected charges for one billing period
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChargeBreakdown {
    pub rent: Money,
    pub service_charge: Money,
    pub vat: Money,
    pub total_due: Money,
    pub period: BillingPeriod,
}

/// compute the expected rent, service charge, VAT and total due for a period
pub fn expected_charge(
    profile: &TenantProfile,
    period: BillingPeriod,
    rate_source: VatRateSource,
) -> Result<ChargeBreakdown> {
    let rent = escalated_rent(profile, period);
    let service_charge = service_charge_amount(profile, rent);

    let vat_rate = match rate_source {
        VatRateSource::Standard => STANDARD_VAT_RATE,
        VatRateSource::Tenant => profile.vat.vat_rate,
    };

    let base = rent + service_charge;
    let vat = extract_vat(base, profile.vat.vat_type, vat_rate);
    let total_due = match profile.vat.vat_type {
        // VAT added on top
        VatType::Exclusive => base + vat,
        // VAT already inside the base, or none at all
        VatType::Inclusive | VatType::NotApplicable => base,
    };

    Ok(ChargeBreakdown {
        rent: rent.round_dp(2),
        service_charge: service_charge.round_dp(2),
        vat: vat.round_dp(2),
        total_due: total_due.round_dp(2),
        period,
    })
}

/// base rent compounded by the escalation schedule up to the period start
pub fn escalated_rent(profile: &TenantProfile, period: BillingPeriod) -> Money {
    let escalation = match profile.escalation {
        Some(e) => e,
        None => return profile.rent,
    };

    if profile.rent_start > period.end {
        return profile.rent;
    }

    let months = months_between(profile.rent_start, period.start);
    let periods_elapsed = months / escalation.frequency.interval_months();
    if periods_elapsed == 0 {
        return profile.rent;
    }

    profile
        .rent
        .compound(escalation.rate.as_decimal(), periods_elapsed)
}

/// service charge for the period, derived from the configured basis
pub fn service_charge_amount(profile: &TenantProfile, escalated_rent: Money) -> Money {
    let sc = match profile.service_charge {
        Some(sc) => sc,
        None => return Money::ZERO,
    };

    match sc.basis {
        ServiceChargeBasis::Fixed => sc.fixed_amount.unwrap_or(Money::ZERO),
        ServiceChargeBasis::Percentage => {
            let percent = sc.percentage.unwrap_or(Decimal::ZERO);
            escalated_rent.percentage(percent)
        }
        ServiceChargeBasis::PerSqFt => {
            let rate = sc.per_sq_ft_rate.unwrap_or(Decimal::ZERO);
            let size = profile.unit_size_sq_ft.unwrap_or(Decimal::ZERO);
            Money::from_decimal(size * rate)
        }
    }
}

/// single VAT extraction rule shared by the preview and invoice paths
///
/// EXCLUSIVE adds VAT on top of the base; INCLUSIVE extracts the VAT
/// component already contained in the base.
pub fn extract_vat(base: Money, vat_type: VatType, rate_percent: Decimal) -> Money {
    match vat_type {
        VatType::Exclusive => base.percentage(rate_percent),
        VatType::Inclusive => {
            let denominator = Decimal::from(100) + rate_percent;
            if denominator.is_zero() {
                return Money::ZERO;
            }
            Money::from_decimal(base.as_decimal() * rate_percent / denominator)
        }
        VatType::NotApplicable => Money::ZERO,
    }
}

/// VAT-exclusive portion of an amount, the basis for commission calculation
pub fn vat_exclusive_base(amount: Money, vat_type: VatType, rate_percent: Decimal) -> Money {
    match vat_type {
        // commission must never be computed on the VAT component
        VatType::Inclusive | VatType::Exclusive => {
            let divisor = Decimal::ONE + rate_percent / Decimal::from(100);
            if divisor.is_zero() {
                return amount;
            }
            amount / divisor
        }
        VatType::NotApplicable => amount,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Rate;
    use crate::profile::{Escalation, ServiceCharge, VatConfig};
    use crate::types::{EscalationFrequency, PaymentPolicy};
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn profile(rent: i64, vat: VatConfig) -> TenantProfile {
        TenantProfile {
            tenant_id: Uuid::new_v4(),
            name: "Acme Stores".to_string(),
            property_id: Uuid::new_v4(),
            unit_size_sq_ft: None,
            rent: Money::from_major(rent),
            escalation: None,
            rent_start: date(2025, 1, 1),
            payment_policy: PaymentPolicy::Monthly,
            vat,
            service_charge: None,
        }
    }

    #[test]
    fn test_exclusive_vat_added_on_top() {
        let p = profile(
            10_000,
            VatConfig {
                vat_type: VatType::Exclusive,
                vat_rate: dec!(16),
            },
        );
        let period = BillingPeriod::month_containing(date(2026, 3, 10));

        let charge = expected_charge(&p, period, VatRateSource::Tenant).unwrap();
        assert_eq!(charge.rent, Money::from_major(10_000));
        assert_eq!(charge.vat, Money::from_major(1_600));
        assert_eq!(charge.total_due, Money::from_major(11_600));
    }

    #[test]
    fn test_inclusive_vat_extracted_not_added() {
        let p = profile(
            11_600,
            VatConfig {
                vat_type: VatType::Inclusive,
                vat_rate: dec!(16),
            },
        );
        let period = BillingPeriod::month_containing(date(2026, 3, 10));

        let charge = expected_charge(&p, period, VatRateSource::Tenant).unwrap();
        assert_eq!(charge.vat, Money::from_major(1_600));
        // total stays the quoted amount
        assert_eq!(charge.total_due, Money::from_major(11_600));
    }

    #[test]
    fn test_vat_round_trip_within_a_cent() {
        let total = Money::from_decimal(dec!(23457.89));
        let vat = extract_vat(total, VatType::Inclusive, dec!(16));
        let net = total - vat;
        let rebuilt = net + net.percentage(dec!(16));
        assert!((rebuilt - total).abs() <= Money::CENT);
    }

    #[test]
    fn test_not_applicable_vat() {
        let p = profile(8_000, VatConfig::not_applicable());
        let period = BillingPeriod::month_containing(date(2026, 3, 10));

        let charge = expected_charge(&p, period, VatRateSource::Tenant).unwrap();
        assert_eq!(charge.vat, Money::ZERO);
        assert_eq!(charge.total_due, Money::from_major(8_000));
    }

    #[test]
    fn test_annual_escalation_compounds() {
        let mut p = profile(10_000, VatConfig::not_applicable());
        p.escalation = Some(Escalation {
            rate: Rate::from_percentage(10),
            frequency: EscalationFrequency::Annually,
        });
        p.rent_start = date(2024, 1, 1);

        // 26 months elapsed, two annual escalations
        let period = BillingPeriod::month_containing(date(2026, 3, 10));
        let charge = expected_charge(&p, period, VatRateSource::Tenant).unwrap();
        assert_eq!(charge.rent, Money::from_major(12_100));
    }

    #[test]
    fn test_bi_annual_escalation_interval() {
        let mut p = profile(10_000, VatConfig::not_applicable());
        p.escalation = Some(Escalation {
            rate: Rate::from_percentage(5),
            frequency: EscalationFrequency::BiAnnually,
        });
        p.rent_start = date(2025, 1, 1);

        // 13 months elapsed, two 6-month escalations
        let period = BillingPeriod::month_containing(date(2026, 2, 1));
        let charge = expected_charge(&p, period, VatRateSource::Tenant).unwrap();
        assert_eq!(charge.rent, Money::from_decimal(dec!(11025.00)));
    }

    #[test]
    fn test_rent_start_after_period_no_escalation() {
        let mut p = profile(10_000, VatConfig::not_applicable());
        p.escalation = Some(Escalation {
            rate: Rate::from_percentage(10),
            frequency: EscalationFrequency::Annually,
        });
        p.rent_start = date(2027, 6, 1);

        let period = BillingPeriod::month_containing(date(2026, 3, 10));
        let charge = expected_charge(&p, period, VatRateSource::Tenant).unwrap();
        assert_eq!(charge.rent, Money::from_major(10_000));
    }

    #[test]
    fn test_service_charge_bases() {
        let period = BillingPeriod::month_containing(date(2026, 3, 10));

        let mut p = profile(10_000, VatConfig::not_applicable());
        p.service_charge = Some(ServiceCharge::fixed(Money::from_major(1_500)));
        let charge = expected_charge(&p, period, VatRateSource::Tenant).unwrap();
        assert_eq!(charge.service_charge, Money::from_major(1_500));

        p.service_charge = Some(ServiceCharge::percentage(dec!(5)));
        let charge = expected_charge(&p, period, VatRateSource::Tenant).unwrap();
        assert_eq!(charge.service_charge, Money::from_major(500));

        p.service_charge = Some(ServiceCharge::per_sq_ft(dec!(2.50)));
        p.unit_size_sq_ft = Some(dec!(800));
        let charge = expected_charge(&p, period, VatRateSource::Tenant).unwrap();
        assert_eq!(charge.service_charge, Money::from_major(2_000));
    }

    #[test]
    fn test_standard_rate_on_preview_path() {
        let p = profile(
            10_000,
            VatConfig {
                vat_type: VatType::Exclusive,
                vat_rate: dec!(8),
            },
        );
        let period = BillingPeriod::month_containing(date(2026, 3, 10));

        let preview = expected_charge(&p, period, VatRateSource::Standard).unwrap();
        assert_eq!(preview.vat, Money::from_major(1_600));

        let invoice = expected_charge(&p, period, VatRateSource::Tenant).unwrap();
        assert_eq!(invoice.vat, Money::from_major(800));
    }

    #[test]
    fn test_commission_base_strips_vat() {
        let amount = Money::from_major(11_600);
        let base = vat_exclusive_base(amount, VatType::Exclusive, dec!(16));
        assert_eq!(base, Money::from_major(10_000));

        let base = vat_exclusive_base(amount, VatType::Inclusive, dec!(16));
        assert_eq!(base, Money::from_major(10_000));

        let base = vat_exclusive_base(amount, VatType::NotApplicable, dec!(16));
        assert_eq!(base, Money::from_major(11_600));
    }
}
