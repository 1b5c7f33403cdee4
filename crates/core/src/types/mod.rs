//! Core types for the comic claim service.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod account;
pub mod id;
pub mod order;

pub use account::{Account, AccountError};
pub use id::*;
pub use order::{Balances, NewOrder, Order, OrderValidationError};
