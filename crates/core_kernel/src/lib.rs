//! Core Kernel - Foundational types and utilities for the mortuary system
//!
//! This crate provides the fundamental building blocks used across all domain modules:
//! - Money types with precise decimal arithmetic
//! - Storage-day arithmetic and branch-local time handling
//! - Strongly-typed identifiers for branches, cases, charges and payments
//! - Port infrastructure shared by every adapter

pub mod money;
pub mod temporal;
pub mod identifiers;
pub mod ports;
pub mod error;

pub use money::{Money, Currency, MoneyError};
pub use temporal::{StayPeriod, Timezone, TemporalError, storage_days_between};
pub use identifiers::{
    BranchId, CaseId, ChargeId, PaymentId, ServiceId, UserId,
};
pub use ports::{
    PortError, DomainPort, HealthCheckable, HealthCheckResult, AdapterHealth,
    OperationMetadata,
};
pub use error::CoreError;
