//! graft-foundation: shared error taxonomy and protocol types for graft
//!
//! Everything here is plain data. The engine crates (`graft-ast`,
//! `graft-synth`, `graft-recipes`) convert their own errors into
//! [`GraftError`] at crate boundaries and report patch attempts with
//! [`PatchResult`].

pub mod error;
pub mod protocol;

pub use error::{GraftError, GraftResult};
pub use protocol::{EditOutcome, FollowUp, FollowUpStep, PatchResult};
