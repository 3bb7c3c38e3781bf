//! Statutory Paid-Leave Entitlement Engine
//!
//! This crate computes paid-leave grants from seniority, tracks granted days
//! as dated lots in a per-employee ledger, consumes them in a declared order,
//! expires and caps them at fiscal year ends, and checks the mandatory
//! minimum-usage rule.

#![warn(missing_docs)]

pub mod calculation;
pub mod config;
pub mod error;
pub mod ledger;
pub mod models;
