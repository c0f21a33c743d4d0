//! # packgl
//!
//! **GLSL ES fragment shader synthesis for packed-texture tensor kernels.**
//!
//! WebGL tensor backends store four logical values per RGBA texel, a 2×2
//! block of the two innermost dimensions. packgl turns validated kernel
//! parameters into the GLSL source of the packed programs that run on such
//! textures, along with the input bindings and uniforms a harness needs.
//!
//! ## Programs
//!
//! - **Conv2D**: NHWC convolution with stride 1 or 2, any padding and dilation
//! - **Depthwise Conv2D**: per-channel convolution with a channel multiplier
//! - **MatMul**: batched `A x B` with optional transposes and batch broadcast
//! - **Reshape**: rank-3 to rank-3 with equal element counts
//! - **UnaryOp**: elementwise op over all four lanes of every texel
//!
//! Conv2D, depthwise and matmul accept a fused epilogue: bias add followed by
//! an activation (linear, relu, relu6, elu, sigmoid, prelu, leaky relu).
//!
//! ## Quick Start
//!
//! ```rust
//! use packgl::prelude::*;
//!
//! let info = Conv2dInfo::new(
//!     &[1, 9, 9, 4],
//!     &[3, 3, 4, 4],
//!     Spatial::square(1),
//!     Spatial::square(1),
//!     PaddingMode::Same,
//! )?;
//! let fusion = Fusion::none()
//!     .with_bias(true)
//!     .with_activation(FusedActivation::Relu);
//! let program = Conv2dPackedProgram::new(info, fusion)?;
//! let descriptor = program.descriptor();
//!
//! assert_eq!(descriptor.input_names, ["x", "W", "bias"]);
//! assert!(descriptor.source.contains("void main()"));
//! # Ok::<(), packgl::Error>(())
//! ```
//!
//! Compiling and running the result is up to a backend implementing
//! [`harness::KernelHarness`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod activation;
pub mod config;
pub mod error;
pub mod glsl;
pub mod harness;
pub mod kernels;
pub mod packing;
pub mod params;
pub mod program;
pub mod shape;

pub use error::{Error, Result};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::activation::{Activation, FusedActivation};
    pub use crate::config::SynthesisConfig;
    pub use crate::error::{Error, Result};
    pub use crate::harness::{
        GlslVersion, KernelHarness, ProgramCache, TensorDescriptor, TextureLayout, UniformValue,
    };
    pub use crate::kernels::{
        Conv2dPackedProgram, DepthwiseConv2dPackedProgram, MatMulPackedProgram,
        ReshapePackedProgram, UnaryOp, UnaryOpPackedProgram,
    };
    pub use crate::params::{
        Conv2dInfo, Fusion, MatMulParams, Padding, PaddingMode, ReshapeParams, Spatial,
        UnaryParams,
    };
    pub use crate::program::{KernelProgram, ProgramDescriptor};
}
