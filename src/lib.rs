pub mod charges;
pub mod decimal;
pub mod errors;
pub mod events;
pub mod ledger;
pub mod payments;
pub mod period;
pub mod profile;
pub mod receipt;
pub mod records;
pub mod store;
pub mod types;

// re-export key types
pub use decimal::{Money, Rate};
pub use errors::{LedgerError, Result};
pub use events::{Event, EventStore};
pub use charges::{
    expected_charge, extract_vat, vat_exclusive_base, ChargeBreakdown, VatRateSource,
    STANDARD_VAT_RATE,
};
pub use ledger::{ChargePreview, OutstandingSummary, PaymentLedger, TenantArrears};
pub use payments::{
    AllocationDelta, AllocationOutcome, CommissionSummary, OverpaymentBreakdown, PaymentOutcome,
    PaymentRequest, PrepaidPeriod,
};
pub use period::BillingPeriod;
pub use profile::{Escalation, PropertyProfile, ServiceCharge, TenantProfile, VatConfig};
pub use receipt::{ReceiptContext, ReceiptRenderer};
pub use records::{Income, Invoice, ManagerCommission, PaymentLedgerEntry};
pub use store::{InMemoryLedgerStore, LedgerStore};
pub use types::{
    CommissionStatus, EscalationFrequency, InvoiceKind, InvoiceStatus, LedgerEntryStatus,
    PaymentOptions, PaymentPolicy, ServiceChargeBasis, VatType,
};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
