//! Umbra Core Types and Definitions
//!
//! This crate provides the host document model that the Umbra engine runs
//! against. It includes:
//!
//! - **Names**: Interned element and attribute names ([`name::Name`])
//! - **Document**: An arena-backed tree with stable node handles ([`dom`] module)
//! - **Observers**: MutationObserver-style change batches ([`observer`] module)
//! - **Selectors**: Selector trees and matching ([`selector`] module)

pub mod dom;
pub mod name;
pub mod observer;
pub mod selector;

mod error;

pub use error::DomError;
