//! # Store-Backed Services
//!
//! Operations that span several tables or enforce a rule the repositories
//! don't know about.
//!
//! - [`CartStore`] - Per-user cart with frozen prices and owner checks
//! - [`CheckoutService`] - Cart → order in one transaction
//! - [`Authorizer`] - Role-based permission evaluation

pub mod authorize;
pub mod cart;
pub mod checkout;

#[cfg(test)]
pub(crate) mod testing;

pub use authorize::Authorizer;
pub use cart::CartStore;
pub use checkout::CheckoutService;
