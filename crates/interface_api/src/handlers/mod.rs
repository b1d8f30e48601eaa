//! Request handlers
//!
//! Every branch-scoped handler checks the caller's branch access before
//! touching the domain.

pub mod health;
pub mod branches;
pub mod cases;
pub mod charges;
pub mod payments;
pub mod discharge;
pub mod services;
pub mod receipts;
pub mod dashboard;
