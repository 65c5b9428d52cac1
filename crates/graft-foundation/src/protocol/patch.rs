use serde::{Deserialize, Serialize};

/// Result of one patch attempt against a loaded source file
///
/// A patch is never partially applied: either the whole edit went through
/// and `Applied` carries the new file text, or the file is untouched and
/// `NotApplicable` explains which expected shape was missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PatchResult {
    /// The edit applied; carries the full re-serialized source text
    Applied(String),
    /// The target file did not have the shape the edit requires
    NotApplicable(String),
}

impl PatchResult {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }

    /// New source text, if the patch applied
    pub fn source(&self) -> Option<&str> {
        match self {
            Self::Applied(source) => Some(source),
            Self::NotApplicable(_) => None,
        }
    }

    /// Reason the patch was skipped, if it was
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Applied(_) => None,
            Self::NotApplicable(reason) => Some(reason),
        }
    }
}

/// What a single edit reports back before anything is committed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EditOutcome {
    Applied,
    NotApplicable(String),
}

impl EditOutcome {
    pub fn not_applicable(reason: impl Into<String>) -> Self {
        Self::NotApplicable(reason.into())
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }

    /// Chain a follow-up step that only runs when this one applied
    pub fn and_then(self, next: impl FnOnce() -> EditOutcome) -> EditOutcome {
        match self {
            Self::Applied => next(),
            skipped => skipped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_result_accessors() {
        let applied = PatchResult::Applied("<?php\n".to_string());
        assert!(applied.is_applied());
        assert_eq!(applied.source(), Some("<?php\n"));
        assert_eq!(applied.reason(), None);

        let skipped = PatchResult::NotApplicable("no config() method".to_string());
        assert!(!skipped.is_applied());
        assert_eq!(skipped.source(), None);
        assert_eq!(skipped.reason(), Some("no config() method"));
    }

    #[test]
    fn test_edit_outcome_and_then_short_circuits() {
        let mut ran = false;
        let outcome = EditOutcome::not_applicable("missing").and_then(|| {
            ran = true;
            EditOutcome::Applied
        });
        assert!(!ran);
        assert_eq!(outcome, EditOutcome::NotApplicable("missing".to_string()));
        assert!(EditOutcome::Applied.and_then(|| EditOutcome::Applied).is_applied());
    }
}
