//! Synthesis configuration
//!
//! The only knob that changes emitted source is whether shapes are bound as
//! uniforms (`outShape`, `outShapeStrides`, `<input>Shape`) instead of being
//! baked into the shader as constants. Baked shapes compile one program per
//! shape; uniform shapes let the harness reuse a compiled program across
//! shapes of the same rank.

use std::env;

/// Environment variable consulted by [`SynthesisConfig::from_env`].
pub const USE_SHAPE_UNIFORMS_ENV: &str = "PACKGL_USE_SHAPE_UNIFORMS";

/// Highest output rank the harness prelude can describe with shape uniforms.
pub const DEFAULT_MAX_SHAPE_UNIFORM_RANK: usize = 4;

/// Options shared by every kernel program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SynthesisConfig {
    /// Bind shapes as uniforms rather than compile-time constants
    pub use_shape_uniforms: bool,
    /// Shape uniforms are only used for outputs up to this rank
    pub max_shape_uniform_rank: usize,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            use_shape_uniforms: false,
            max_shape_uniform_rank: DEFAULT_MAX_SHAPE_UNIFORM_RANK,
        }
    }
}

impl SynthesisConfig {
    /// Default configuration with overrides from the process environment.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(raw) = env::var(USE_SHAPE_UNIFORMS_ENV) {
            match parse_bool(&raw) {
                Some(value) => config.use_shape_uniforms = value,
                None => log::warn!(
                    "ignoring {USE_SHAPE_UNIFORMS_ENV}={raw:?}: expected a boolean"
                ),
            }
        }
        config
    }

    /// Builder-style toggle for shape uniforms.
    pub fn with_shape_uniforms(mut self, enabled: bool) -> Self {
        self.use_shape_uniforms = enabled;
        self
    }

    /// Whether a program with an output of `rank` dims uses shape uniforms.
    pub fn enable_shape_uniforms(&self, rank: usize) -> bool {
        self.use_shape_uniforms && rank <= self.max_shape_uniform_rank
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
