//! Validated, immutable kernel parameters
//!
//! Every constructor here returns `Result`; a parameter value that exists
//! is safe to synthesize from.

mod conv;
mod elementwise;
mod matmul;

pub use conv::{
    Conv2dInfo, Padding, PaddingMode, Spatial, compute_output_size, compute_same_padding,
    effective_filter_size, resolve_padding,
};
pub use elementwise::{ReshapeParams, UnaryParams};
pub use matmul::MatMulParams;

use crate::activation::Activation;

/// Fused epilogue applied after accumulation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Fusion {
    /// Add `getBiasAtOutCoords()` to the result
    pub add_bias: bool,
    /// Activation applied after the bias
    pub activation: Activation,
}

impl Fusion {
    /// No bias, no activation.
    pub fn none() -> Self {
        Self::default()
    }

    /// Builder-style bias toggle.
    pub fn with_bias(mut self, add_bias: bool) -> Self {
        self.add_bias = add_bias;
        self
    }

    /// Builder-style activation.
    pub fn with_activation(mut self, activation: impl Into<Activation>) -> Self {
        self.activation = activation.into();
        self
    }
}
