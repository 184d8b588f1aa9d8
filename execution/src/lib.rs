//! Rules that mutate a card score [Ledger](cardscore_types::Ledger).
//!
//! Every operation is total: input that names no player, or arrives in the
//! wrong phase, leaves the ledger untouched and is reported as
//! [Outcome::Ignored] so callers can log it.

pub mod ledger;
pub mod names;

pub use ledger::{apply_round, clear_scores, reset_to_setup, rotate, setup, Ignored, Outcome};
pub use names::themed_names;
