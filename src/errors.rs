use thiserror::Error;

use crate::decimal::Money;
use crate::types::{InvoiceId, InvoiceStatus, PropertyId, TenantId};

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("validation error: {message}")]
    Validation {
        message: String,
    },

    #[error("invalid payment amount: {amount}")]
    InvalidPaymentAmount {
        amount: Money,
    },

    #[error("tenant not found: {id}")]
    TenantNotFound {
        id: TenantId,
    },

    #[error("property not found: {id}")]
    PropertyNotFound {
        id: PropertyId,
    },

    #[error("invoice not found: {id}")]
    InvoiceNotFound {
        id: InvoiceId,
    },

    #[error("invoice {id} does not belong to tenant {tenant_id}")]
    InvoiceTenantMismatch {
        id: InvoiceId,
        tenant_id: TenantId,
    },

    #[error("invoice {id} not allocatable: status is {status:?}")]
    InvoiceNotAllocatable {
        id: InvoiceId,
        status: InvoiceStatus,
    },

    #[error("no outstanding invoice to allocate for tenant {tenant_id}")]
    NoInvoiceToAllocate {
        tenant_id: TenantId,
    },

    #[error("overpayment rejected: outstanding {outstanding}, supplied {supplied}, existing credit {existing_credit}")]
    OverpaymentRejected {
        outstanding: Money,
        supplied: Money,
        existing_credit: Money,
    },

    #[error("transaction timed out after {waited_ms}ms")]
    TransactionTimeout {
        waited_ms: u64,
    },

    #[error("invalid date: {message}")]
    InvalidDate {
        message: String,
    },

    #[error("storage error: {message}")]
    Storage {
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, LedgerError>;
