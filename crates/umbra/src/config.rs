//! Configuration types for the Umbra engine.
//!
//! All types implement [`serde::Deserialize`] with every field defaulted, so a
//! partial (or empty) configuration file is always valid.
//!
//! # Overview
//!
//! - [`EngineConfig`] - Top-level configuration combining marker and dispatch settings.
//! - [`MarkerConfig`] - Attribute names used to tag reference and clone nodes.
//! - [`DispatchConfig`] - Bounds on change-batch delivery.
//!
//! # Example
//!
//! ```
//! # use umbra::config::EngineConfig;
//! let config = EngineConfig::default();
//! assert_eq!(config.markers().clone_marker(), "cpy");
//! assert_eq!(config.dispatch().max_flush_rounds(), 64);
//! ```

use serde::Deserialize;

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineConfig {
    /// Marker attribute section.
    #[serde(default)]
    markers: MarkerConfig,

    /// Change dispatch section.
    #[serde(default)]
    dispatch: DispatchConfig,
}

impl EngineConfig {
    /// Creates a new [`EngineConfig`] from its sections.
    pub fn new(markers: MarkerConfig, dispatch: DispatchConfig) -> Self {
        Self { markers, dispatch }
    }

    /// Returns the marker configuration.
    pub fn markers(&self) -> &MarkerConfig {
        &self.markers
    }

    /// Returns the dispatch configuration.
    pub fn dispatch(&self) -> &DispatchConfig {
        &self.dispatch
    }
}

fn default_reference_marker() -> String {
    "ref".to_string()
}

fn default_clone_marker() -> String {
    "cpy".to_string()
}

/// Names of the boolean attributes written onto linked nodes.
///
/// The clone marker is what the query filter excludes, so it must not collide
/// with any attribute authored in the document.
#[derive(Debug, Clone, Deserialize)]
pub struct MarkerConfig {
    /// Set on every node that has at least one clone.
    #[serde(default = "default_reference_marker")]
    reference: String,

    /// Set on every clone node.
    #[serde(default = "default_clone_marker")]
    clone: String,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            reference: default_reference_marker(),
            clone: default_clone_marker(),
        }
    }
}

impl MarkerConfig {
    /// Creates a marker configuration with custom attribute names.
    pub fn new(reference: impl Into<String>, clone: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            clone: clone.into(),
        }
    }

    /// Attribute name marking reference nodes.
    pub fn reference_marker(&self) -> &str {
        &self.reference
    }

    /// Attribute name marking clone nodes.
    pub fn clone_marker(&self) -> &str {
        &self.clone
    }
}

fn default_max_flush_rounds() -> usize {
    64
}

/// Limits on how change batches are drained.
#[derive(Debug, Clone, Deserialize)]
pub struct DispatchConfig {
    /// Maximum delivery rounds per [`Engine::flush`](crate::Engine::flush).
    /// Records still pending after the last round stay queued.
    #[serde(default = "default_max_flush_rounds")]
    max_flush_rounds: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_flush_rounds: default_max_flush_rounds(),
        }
    }
}

impl DispatchConfig {
    /// Creates a dispatch configuration with the given round limit.
    pub fn new(max_flush_rounds: usize) -> Self {
        Self { max_flush_rounds }
    }

    /// Returns the round limit.
    pub fn max_flush_rounds(&self) -> usize {
        self.max_flush_rounds
    }
}
