//! Normalizer configuration.

use serde::{Deserialize, Serialize};

/// Configuration knobs for [`Normalizer`](crate::normalizer::Normalizer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizerConfig {
    /// Run schema validation on every component before normalizing it.
    /// Disable only when the caller has already validated the components.
    pub validate_components: bool,
    /// Field path prepended to every field a component names, for components
    /// that filter a nested record rather than the row itself.
    pub field_prefix: Vec<String>,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            validate_components: true,
            field_prefix: Vec::new(),
        }
    }
}
