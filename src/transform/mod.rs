//! EER <-> ARM transformation engines.
//!
//! Both directions are pure: they read the input model and build a fresh
//! output model, returning it together with any recovered diagnostics.

mod forward;
mod reverse;

pub use forward::{RelationshipKind, classify, eer_to_arm, eer_to_arm_with};
pub use reverse::arm_to_eer;

use crate::error::Diagnostic;

/// Output of a transformation.
#[derive(Debug, Clone, PartialEq)]
pub struct Transformed<M> {
    pub model: M,
    pub diagnostics: Vec<Diagnostic>,
}

impl<M> Transformed<M> {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForwardOptions {
    /// Make unrelated top-level relations mutually disjoint.
    pub implicit_disjointness: bool,
}

impl Default for ForwardOptions {
    fn default() -> Self {
        Self {
            implicit_disjointness: true,
        }
    }
}
