//! Semantic edits.
//!
//! Each edit targets one tree fragment and reports
//! [`EditOutcome::NotApplicable`] when the fragment does not have the shape
//! it expects. Nothing here touches the file on disk; the workspace decides
//! whether a staged tree is committed.

mod array;
mod body;
mod doc;
mod method;

pub use array::{merge_into_array_literal, MergeEntries, MergeEntry, MergeKey, MergeValue};
pub use body::{append_statement_to_method, body_contains};
pub use doc::{append_doc_line, has_doc_line, Documented};
pub use method::{find_returned_array, first_return_value, is_named_method, MethodFinder};

pub use graft_foundation::EditOutcome;

/// Whitespace-insensitive form of a code snippet, for duplicate checks
pub(crate) fn normalized(code: &str) -> String {
    code.split_whitespace().collect()
}
