//! Common types shared by the card score ledger, its HTTP surface and clients.

pub mod api;
pub mod ledger;

pub use ledger::*;
