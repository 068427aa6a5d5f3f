//! Tablecart
//!
//! Tablecart is an offline-first restaurant cart engine: it keeps the order a
//! guest is building on the device, compacts every edit into a minimal set of
//! pending operations keyed by a content fingerprint, and hands those
//! operations to a submission layer that reconciles them with the server cart.

pub mod cart;
pub mod catalog;
pub mod fingerprint;
pub mod menu;
pub mod prelude;
pub mod pricing;
pub mod storage;
