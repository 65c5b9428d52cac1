use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Manual instructions handed to a human when an automated patch did not apply
///
/// Rendered as markdown by [`FollowUp::to_markdown`]; the emission layer
/// decides how to style it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowUp {
    /// One-line headline, e.g. "Service created!"
    pub summary: String,
    /// Ordered steps the human has to carry out
    pub steps: Vec<FollowUpStep>,
}

/// One manual step: what to do, optionally with the code to paste
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowUpStep {
    pub instruction: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl FollowUp {
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            steps: Vec::new(),
        }
    }

    /// Add a step with no code snippet
    pub fn step(mut self, instruction: impl Into<String>) -> Self {
        self.steps.push(FollowUpStep {
            instruction: instruction.into(),
            code: None,
        });
        self
    }

    /// Add a step followed by a code snippet
    pub fn code_step(mut self, instruction: impl Into<String>, code: impl Into<String>) -> Self {
        self.steps.push(FollowUpStep {
            instruction: instruction.into(),
            code: Some(code.into()),
        });
        self
    }

    pub fn to_markdown(&self) -> String {
        let mut out = format!("**{}**\n", self.summary);
        for step in &self.steps {
            let _ = writeln!(out, "{}", step.instruction);
            if let Some(code) = &step.code {
                let _ = write!(out, "\n```\n{}\n```\n", code.trim_end());
            }
        }
        out
    }
}
