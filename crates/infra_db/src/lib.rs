//! Infrastructure Database Layer
//!
//! PostgreSQL adapters for the case domain's ports, built on SQLx.
//!
//! # Architecture
//!
//! - [`PgRecordStore`] implements `RecordStore`. Charge and payment
//!   mutations call the `update_case_financials` procedure inside the same
//!   transaction, which keeps each case's totals authoritative.
//! - [`PgReceiptNumbering`] implements `ReceiptNumbering` on top of the
//!   `receipt_sequences` table.
//! - [`DatabaseError`] classifies SQLSTATE codes and converts into the
//!   domain's `PortError` (unique violation ⇒ `Duplicate`, foreign key
//!   violation ⇒ `ReferenceViolation`).
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, DatabaseConfig, PgRecordStore};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/mortuary")).await?;
//! run_migrations(&pool).await?;
//! let store = PgRecordStore::new(pool, Currency::GHS);
//! ```

pub mod pool;
pub mod error;
pub mod rows;
pub mod store;
pub mod numbering;

pub use pool::{create_pool, run_migrations, DatabaseConfig, DatabasePool, MIGRATOR};
pub use error::DatabaseError;
pub use store::PgRecordStore;
pub use numbering::PgReceiptNumbering;
