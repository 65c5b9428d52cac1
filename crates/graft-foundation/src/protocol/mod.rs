//! Protocol types exchanged between the patch engine and its callers

mod follow_up;
mod patch;

pub use follow_up::{FollowUp, FollowUpStep};
pub use patch::{EditOutcome, PatchResult};
