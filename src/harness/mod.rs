//! Boundary between synthesized programs and a WebGL execution backend
//!
//! packgl never talks to a GPU. A backend implements [`KernelHarness`] and
//! receives a [`ProgramDescriptor`] together with the texture layout of
//! every input and the output. The pieces in this module are what every
//! such backend needs regardless of how it drives the driver:
//!
//! ```text
//! ProgramDescriptor ──┬─► assemble_fragment_shader ──► full GLSL ES source
//!   + TensorDescriptor │        (prefix, uniforms, sampling, user code)
//!                      ├─► shader_key ──► ProgramCache<K> ──► Arc<K>
//!                      └─► uniforms_for(values) ──► bound UniformValues
//! ```

mod assemble;
mod cache;
mod glsl_version;
mod uniforms;

pub use assemble::{SHADER_PACKED_PREFIX, SamplingSnippets, assemble_fragment_shader};
pub use cache::{ProgramCache, shader_key};
pub use glsl_version::{GlslDifferences, GlslVersion};
pub use uniforms::{BoundUniform, UniformValue, uniforms_for};

use crate::error::Result;
use crate::program::ProgramDescriptor;
use crate::shape::{Shape, size_from_shape};

/// How a tensor is laid out in its backing texture
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TextureLayout {
    /// Texture `[rows, cols]` in texels
    pub tex_shape: [i32; 2],
    /// Four logical values per texel (2×2 packing)
    pub is_packed: bool,
    /// Values are uploaded as a `uniform float` array instead of a texture
    pub is_uniform: bool,
}

impl TextureLayout {
    /// Packed texture layout
    pub fn packed(tex_shape: [i32; 2]) -> Self {
        Self {
            tex_shape,
            is_packed: true,
            is_uniform: false,
        }
    }

    /// Layout for small tensors uploaded as uniforms
    pub fn uniform() -> Self {
        Self {
            tex_shape: [1, 1],
            is_packed: false,
            is_uniform: true,
        }
    }
}

/// Logical shape plus texture layout of one bound tensor
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TensorDescriptor {
    /// Logical shape
    pub shape: Shape,
    /// Texture layout
    pub texture_layout: TextureLayout,
}

impl TensorDescriptor {
    /// Packed tensor whose texture holds `ceil(rows / 2) x ceil(cols / 2)`
    /// texels per batch, laid out batch-major along the texture rows.
    pub fn packed(shape: &[i32]) -> Self {
        Self {
            shape: Shape::from_slice(shape),
            texture_layout: TextureLayout::packed(packed_tex_shape(shape)),
        }
    }

    /// Number of logical elements
    pub fn size(&self) -> i64 {
        size_from_shape(&self.shape)
    }

    /// Tensor rank
    pub fn rank(&self) -> usize {
        self.shape.len()
    }
}

/// Texel grid for a packed tensor of `shape`.
fn packed_tex_shape(shape: &[i32]) -> [i32; 2] {
    let dim = |i: usize| shape.get(i).copied().unwrap_or(1);
    match shape.len() {
        0 => [1, 1],
        1 => [1, (dim(0) + 1) / 2],
        n => {
            let rows = (dim(n - 2) + 1) / 2;
            let cols = (dim(n - 1) + 1) / 2;
            let batches: i32 = shape[..n - 2].iter().product();
            [batches * rows, cols]
        }
    }
}

/// A WebGL execution backend.
///
/// `compile` turns a descriptor into whatever the backend caches (a linked
/// GL program, a recorded command list, ...). `run` binds textures and
/// uniform values and dispatches. The uniform values are those the kernel
/// program reports (e.g. `Conv2dPackedProgram::uniform_values`), in the
/// order of [`ProgramDescriptor::custom_uniforms`].
pub trait KernelHarness {
    /// Backend-specific compiled program
    type Kernel;

    /// Compile `program` for the given input and output layouts.
    fn compile(
        &self,
        program: &ProgramDescriptor,
        inputs: &[TensorDescriptor],
        output: &TensorDescriptor,
    ) -> Result<Self::Kernel>;

    /// Execute a compiled kernel.
    fn run(
        &self,
        kernel: &Self::Kernel,
        inputs: &[TensorDescriptor],
        output: &TensorDescriptor,
        uniforms: &[UniformValue],
    ) -> Result<()>;
}
