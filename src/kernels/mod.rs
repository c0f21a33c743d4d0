//! Packed kernel programs
//!
//! Each program validates its parameters in `new`/`with_config` and
//! implements [`KernelProgram`](crate::program::KernelProgram); synthesis
//! after construction is infallible and deterministic.
//!
//! # Programs
//!
//! | Program | Inputs | Custom uniforms |
//! |---|---|---|
//! | [`Conv2dPackedProgram`] | `x`, `W`, epilogue | `pads`, `strides`, `dilations`, `inDims` |
//! | [`DepthwiseConv2dPackedProgram`] | `x`, `W`, epilogue | same as conv2d |
//! | [`MatMulPackedProgram`] | `matrixA`, `matrixB`, epilogue | none |
//! | [`ReshapePackedProgram`] | `A` | `inputShape` |
//! | [`UnaryOpPackedProgram`] | `A` | none |

mod conv2d;
mod conv_common;
mod depthwise;
mod matmul;
mod reshape;
mod unary;

pub use conv_common::DOT_PROD_EPSILON;
pub use conv2d::Conv2dPackedProgram;
pub use depthwise::DepthwiseConv2dPackedProgram;
pub use matmul::MatMulPackedProgram;
pub use reshape::ReshapePackedProgram;
pub use unary::{UnaryOp, UnaryOpPackedProgram};

use crate::glsl::{SnippetBuilder, TranslationUnit, call};
use crate::params::Fusion;

/// A unit that starts with the activation function, if the fusion has one.
fn unit_with_activation(fusion: &Fusion) -> TranslationUnit {
    let mut unit = TranslationUnit::new();
    if let Some(function) = fusion.activation.function() {
        unit.function(function);
    }
    unit
}

/// `result += getBiasAtOutCoords();` then `result = activation(result);`.
fn apply_epilogue(b: &mut SnippetBuilder, fusion: &Fusion) {
    if fusion.add_bias {
        b.add_assign("result", call("getBiasAtOutCoords", vec![]));
    }
    if let Some(apply) = fusion.activation.apply("result") {
        b.push(apply);
    }
}

/// Input names of a fused kernel with the given operands.
fn fused_inputs(operands: &[&str], fusion: &Fusion) -> Vec<String> {
    crate::program::InputNames::operands(operands)
        .bias(fusion.add_bias)
        .activation(&fusion.activation)
        .finish()
}
