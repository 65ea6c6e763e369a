//! Payroll Engine for monthly salaried payroll
//!
//! This crate provides the core of a monthly payroll system: a timeline of
//! salary structures per employee, a leave ledger that keeps paid leave
//! balances consistent, and a run engine that computes, stores, and locks
//! one payroll item per employee per month.
//!
//! Monetary amounts are [`rust_decimal::Decimal`] values rounded half away
//! from zero to two decimal places. Persistence, the employee roster, and
//! the clock are supplied by the caller through the traits in [`store`].

#![warn(missing_docs)]

pub mod calculation;
pub mod config;
pub mod error;
pub mod ledger;
pub mod models;
pub mod payroll;
pub mod store;
pub mod sync;
pub mod timeline;
