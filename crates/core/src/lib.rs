//! Comic Claim Core - Shared domain types.
//!
//! This crate provides the types and rules shared by the comic claim server
//! and its tests:
//! - `server` - HTTP API for balances and orders
//! - `integration-tests` - Black-box tests driving the HTTP API
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. This keeps the eligibility rule testable in
//! isolation from the store that feeds it.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for accounts, order IDs, orders, and balances
//! - [`eligibility`] - The claim limit derived from holder counts

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod eligibility;
pub mod types;

pub use eligibility::{Eligibility, INELIGIBLE_MESSAGE, Ineligible};
pub use types::*;
