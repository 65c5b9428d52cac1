//! graft-synth: derive new PHP classes from base type descriptors
//!
//! A base type is described once ([`describe`] over parsed source, or a JSON
//! [`TypeDescriptor`]); [`synthesize`] then builds a subclass carrying the
//! selected members, with signatures copied and bodies either empty or
//! supplied by the caller.

pub mod descriptor;
pub mod error;
pub mod generated;
pub mod selection;
pub mod synthesize;

pub use descriptor::{describe, MemberVisibility, TypeDescriptor};
pub use error::{SynthError, SynthResult};
pub use generated::GeneratedType;
pub use selection::{MemberSelection, MemberSpec};
pub use synthesize::{synthesize, SynthOptions, Synthesizer, DEFAULT_BASE_ALIAS_PREFIX};
