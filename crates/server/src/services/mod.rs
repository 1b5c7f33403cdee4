//! Business services.
//!
//! - [`orders`] - Balance lookup, order listing, and the order placement claim
//! - [`notifier`] - Best-effort order notification emails

pub mod notifier;
pub mod orders;

pub use notifier::{DisabledNotifier, EmailNotifier, Notifier, NotifyError};
pub use orders::{OrderError, OrderService};
