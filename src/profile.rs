use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::types::{
    EscalationFrequency, ManagerId, PaymentPolicy, PropertyId, ServiceChargeBasis, TenantId,
    VatType,
};

/// tenant billing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantProfile {
    pub tenant_id: TenantId,
    pub name: String,
    pub property_id: PropertyId,
    /// floor area, used by per-square-foot service charges
    pub unit_size_sq_ft: Option<Decimal>,
    /// base monthly rent before escalation
    pub rent: Money,
    pub escalation: Option<Escalation>,
    pub rent_start: NaiveDate,
    pub payment_policy: PaymentPolicy,
    pub vat: VatConfig,
    pub service_charge: Option<ServiceCharge>,
}

impl TenantProfile {
    /// rent for one whole billing period under the tenant's policy
    pub fn periodic_rent(&self) -> Money {
        self.rent * Decimal::from(self.payment_policy.months_per_period())
    }
}

/// rent escalation terms
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Escalation {
    /// percent increase per interval, e.g. 10 for 10%
    pub rate: Rate,
    pub frequency: EscalationFrequency,
}

/// VAT configuration for a tenant
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VatConfig {
    pub vat_type: VatType,
    /// percent, e.g. 16 for 16%
    pub vat_rate: Decimal,
}

impl VatConfig {
    pub fn not_applicable() -> Self {
        Self {
            vat_type: VatType::NotApplicable,
            vat_rate: Decimal::ZERO,
        }
    }
}

/// service charge terms; the rate field matching `basis` applies
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ServiceCharge {
    pub basis: ServiceChargeBasis,
    /// flat amount for FIXED
    pub fixed_amount: Option<Money>,
    /// percent of escalated rent for PERCENTAGE
    pub percentage: Option<Decimal>,
    /// rate per square foot for PER_SQ_FT
    pub per_sq_ft_rate: Option<Decimal>,
}

impl ServiceCharge {
    pub fn fixed(amount: Money) -> Self {
        Self {
            basis: ServiceChargeBasis::Fixed,
            fixed_amount: Some(amount),
            percentage: None,
            per_sq_ft_rate: None,
        }
    }

    pub fn percentage(percent: Decimal) -> Self {
        Self {
            basis: ServiceChargeBasis::Percentage,
            fixed_amount: None,
            percentage: Some(percent),
            per_sq_ft_rate: None,
        }
    }

    pub fn per_sq_ft(rate: Decimal) -> Self {
        Self {
            basis: ServiceChargeBasis::PerSqFt,
            fixed_amount: None,
            percentage: None,
            per_sq_ft_rate: Some(rate),
        }
    }
}

/// property configuration relevant to commission accrual
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyProfile {
    pub property_id: PropertyId,
    pub name: String,
    pub manager_id: Option<ManagerId>,
    /// percent when > 1, already-decimal when <= 1
    pub commission_fee: Option<Decimal>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn profile(policy: PaymentPolicy) -> TenantProfile {
        TenantProfile {
            tenant_id: Uuid::new_v4(),
            name: "Acme Stores".to_string(),
            property_id: Uuid::new_v4(),
            unit_size_sq_ft: None,
            rent: Money::from_major(5_000),
            escalation: None,
            rent_start: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            payment_policy: policy,
            vat: VatConfig::not_applicable(),
            service_charge: None,
        }
    }

    #[test]
    fn test_periodic_rent() {
        assert_eq!(
            profile(PaymentPolicy::Monthly).periodic_rent(),
            Money::from_major(5_000)
        );
        assert_eq!(
            profile(PaymentPolicy::Quarterly).periodic_rent(),
            Money::from_major(15_000)
        );
        assert_eq!(
            profile(PaymentPolicy::Annual).periodic_rent(),
            Money::from_major(60_000)
        );
    }

    #[test]
    fn test_profile_json_round_trip() {
        let mut p = profile(PaymentPolicy::Monthly);
        p.service_charge = Some(ServiceCharge::percentage(dec!(5)));
        let json = serde_json::to_string(&p).unwrap();
        let back: TenantProfile = serde_json::from_str(&json).unwrap();
        assert_eq!(back.rent, p.rent);
        assert_eq!(back.payment_policy, p.payment_policy);
    }
}
