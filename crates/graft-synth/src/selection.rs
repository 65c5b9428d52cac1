//! Which base members a synthesized type carries over.

use crate::error::{SynthError, SynthResult};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How one selected member is produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberSpec {
    /// Reflect the base member; methods get an empty body
    Copy,
    /// Source text for the constant value, property default, or method body
    Replace(String),
}

/// Ordered member selection, per member category
///
/// In TOML:
///
/// ```toml
/// [properties]
/// schemaVersion = "copy"
///
/// [methods]
/// init = { replace = "parent::init();" }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemberSelection {
    pub constants: IndexMap<String, MemberSpec>,
    pub properties: IndexMap<String, MemberSpec>,
    pub methods: IndexMap<String, MemberSpec>,
}

impl MemberSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn constant(mut self, name: impl Into<String>, spec: MemberSpec) -> Self {
        self.constants.insert(name.into(), spec);
        self
    }

    pub fn property(mut self, name: impl Into<String>, spec: MemberSpec) -> Self {
        self.properties.insert(name.into(), spec);
        self
    }

    pub fn method(mut self, name: impl Into<String>, spec: MemberSpec) -> Self {
        self.methods.insert(name.into(), spec);
        self
    }

    pub fn copy_method(self, name: impl Into<String>) -> Self {
        self.method(name, MemberSpec::Copy)
    }

    pub fn replace_method(self, name: impl Into<String>, body: impl Into<String>) -> Self {
        self.method(name, MemberSpec::Replace(body.into()))
    }

    pub fn is_empty(&self) -> bool {
        self.constants.is_empty() && self.properties.is_empty() && self.methods.is_empty()
    }

    pub fn from_toml(text: &str) -> SynthResult<Self> {
        toml::from_str(text).map_err(|e| SynthError::invalid_selection(e.to_string()))
    }

    pub fn load(path: &Path) -> SynthResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| SynthError::io(path, e))?;
        Self::from_toml(&text)
    }
}
