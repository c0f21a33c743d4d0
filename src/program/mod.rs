//! Kernel program abstraction
//!
//! A kernel program turns validated parameters into a [`TranslationUnit`]
//! and, from it, a [`ProgramDescriptor`] the harness can compile.
//!
//! ```text
//! params ──new()──► program ──translation_unit()──► IR ──descriptor()──► ProgramDescriptor
//!          (Result)           (infallible)                 (render + verify)
//! ```

mod descriptor;
mod inputs;

pub use descriptor::{CustomUniform, ProgramDescriptor};
pub use inputs::{Complete, Epilogue, InputNames, Operands};

use crate::glsl::{TranslationUnit, render_unit};
use crate::shape::Shape;

/// A packed shader program synthesized from static parameters.
///
/// Implementors validate in their constructor; nothing after construction
/// can fail.
pub trait KernelProgram: Send + Sync {
    /// Program type name (`"Conv2DPacked"`, ..)
    fn name(&self) -> &'static str;

    /// Input textures in binding order.
    fn input_names(&self) -> Vec<String>;

    /// Logical output shape.
    fn output_shape(&self) -> Shape;

    /// Uniforms beyond the input samplers.
    fn custom_uniforms(&self) -> Vec<CustomUniform> {
        Vec::new()
    }

    /// Whether shapes are bound as uniforms.
    fn enable_shape_uniforms(&self) -> bool {
        false
    }

    /// The program's user code as a GLSL tree.
    fn translation_unit(&self) -> TranslationUnit;

    /// Render the program into a descriptor.
    fn descriptor(&self) -> ProgramDescriptor {
        let source = render_unit(&self.translation_unit());
        let descriptor = ProgramDescriptor {
            name: self.name(),
            input_names: self.input_names(),
            output_shape: self.output_shape(),
            packed_inputs: true,
            packed_output: true,
            custom_uniforms: self.custom_uniforms(),
            enable_shape_uniforms: self.enable_shape_uniforms(),
            source,
        };
        log::debug!(
            "synthesized {} program: {} inputs, {} bytes of source",
            descriptor.name,
            descriptor.input_names.len(),
            descriptor.source.len()
        );
        debug_assert!(
            descriptor.verify().is_ok(),
            "{:?}",
            descriptor.verify().err()
        );
        descriptor
    }
}
