//! Full fragment shader assembly
//!
//! A [`ProgramDescriptor`] only carries the program's user code. Before a
//! backend can compile it, the code is wrapped in a prefix that every packed
//! kernel relies on:
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ version, precision, resultUV, output decl    │  shader prefix
//! │ NAN / INFINITY / round helpers, imod, idiv   │
//! │ packedUVfrom1D/2D/3D, getChannel             │
//! ├──────────────────────────────────────────────┤
//! │ sampleTexture, setOutput(vec4)               │
//! ├──────────────────────────────────────────────┤
//! │ input samplers + offsets, shape uniforms,    │  declarations
//! │ custom uniforms                              │
//! ├──────────────────────────────────────────────┤
//! │ getOutputCoords, get<Input>(..)              │  SamplingSnippets
//! ├──────────────────────────────────────────────┤
//! │ user code (descriptor.source)                │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! Coordinate decoding depends on texture layouts that are the backend's
//! business, so it is delegated to a [`SamplingSnippets`] implementation.

use super::{GlslDifferences, GlslVersion, TensorDescriptor};
use crate::error::{Error, Result};
use crate::glsl::Ty;
use crate::program::ProgramDescriptor;

/// Channel selection helpers available to packed programs.
pub const SHADER_PACKED_PREFIX: &str = "
float getChannel(vec4 frag, vec2 innerDims) {
  vec2 modCoord = mod(innerDims, 2.);
  return modCoord.x == 0. ?
    (modCoord.y == 0. ? frag.r : frag.g) :
    (modCoord.y == 0. ? frag.b : frag.a);
}
float getChannel(vec4 frag, int dim) {
  float modCoord = mod(float(dim), 2.);
  return modCoord == 0. ? frag.r : frag.g;
}
";

const INTEGER_HELPERS: &str = "int imod(int x, int y) {
  return x - y * (x / y);
}

int idiv(int a, int b, float sign) {
  int res = a / b;
  int mod = imod(a, b);
  if (sign < 0. && mod != 0) {
    res -= 1;
  }
  return res;
}";

const PACKED_UV_HELPERS: &str = "vec2 uvFromFlat(int texNumR, int texNumC, int index) {
  int texR = index / texNumC;
  int texC = index - texR * texNumC;
  return (vec2(texC, texR) + halfCR) / vec2(texNumC, texNumR);
}
vec2 packedUVfrom1D(int texNumR, int texNumC, int index) {
  int texelIndex = index / 2;
  int texR = texelIndex / texNumC;
  int texC = texelIndex - texR * texNumC;
  return (vec2(texC, texR) + halfCR) / vec2(texNumC, texNumR);
}
vec2 packedUVfrom2D(int texelsInLogicalRow, int texNumR,
  int texNumC, int row, int col) {
  int texelIndex = (row / 2) * texelsInLogicalRow + (col / 2);
  int texR = texelIndex / texNumC;
  int texC = texelIndex - texR * texNumC;
  return (vec2(texC, texR) + halfCR) / vec2(texNumC, texNumR);
}
vec2 packedUVfrom3D(int texNumR, int texNumC,
    int texelsInBatch, int texelsInLogicalRow, int b,
    int row, int col) {
  int index = b * texelsInBatch + (row / 2) * texelsInLogicalRow + (col / 2);
  int texR = index / texNumC;
  int texC = index - texR * texNumC;
  return (vec2(texC, texR) + halfCR) / vec2(texNumC, texNumR);
}";

/// Coordinate decoding snippets supplied by a backend.
pub trait SamplingSnippets {
    /// Defines `getOutputCoords()` for the output layout.
    fn output_sampling(&self, output: &TensorDescriptor, enable_shape_uniforms: bool) -> String;

    /// Defines `get<Name>(..)` and `get<Name>AtOutCoords()` for one input.
    fn input_sampling(
        &self,
        name: &str,
        input: &TensorDescriptor,
        output: &TensorDescriptor,
        enable_shape_uniforms: bool,
    ) -> String;
}

fn shader_prefix(glsl: &GlslDifferences) -> String {
    let result_uv = format!("{} vec2 resultUV;", glsl.varying_fs);
    let mut lines: Vec<&str> = Vec::new();
    if !glsl.version.is_empty() {
        lines.push(glsl.version);
    }
    lines.extend([
        "precision highp float;",
        "precision highp int;",
        "precision highp sampler2D;",
    ]);
    lines.push(&result_uv);
    for snippet in [glsl.define_output, "const vec2 halfCR = vec2(0.5, 0.5);"] {
        if !snippet.is_empty() {
            lines.push(snippet);
        }
    }
    lines.push("");
    lines.push("uniform float NAN;");
    for snippet in [
        glsl.define_special_nan,
        glsl.define_special_inf,
        glsl.define_round,
    ] {
        if !snippet.is_empty() {
            lines.push(snippet);
        }
    }
    lines.push("");
    lines.push(INTEGER_HELPERS);
    lines.push("");
    lines.push(PACKED_UV_HELPERS);
    lines.join("\n")
}

fn sample_texture_snippet(glsl: &GlslDifferences) -> String {
    format!(
        "float sampleTexture(sampler2D textureSampler, vec2 uv) {{\n  return {}(textureSampler, uv).r;\n}}\n",
        glsl.texture2d
    )
}

fn set_output_snippet(glsl: &GlslDifferences, packed: bool) -> String {
    if packed {
        format!("void setOutput(vec4 val) {{\n  {} = val;\n}}\n", glsl.output)
    } else {
        format!(
            "void setOutput(float val) {{\n  {} = vec4(val, 0, 0, 0);\n}}\n",
            glsl.output
        )
    }
}

/// Uniform type for a shape of `rank` dims; ranks outside 1..=4 get none.
fn shape_uniform_ty(rank: usize) -> Option<Ty> {
    match rank {
        1..=4 => Some(Ty::int_coords(rank)),
        _ => None,
    }
}

fn declarations(
    program: &ProgramDescriptor,
    inputs: &[TensorDescriptor],
    output: &TensorDescriptor,
) -> Vec<String> {
    let mut decls = Vec::new();
    for (name, input) in program.input_names.iter().zip(inputs) {
        if input.texture_layout.is_uniform {
            let size = input.size();
            if size > 1 {
                decls.push(format!("uniform float {name}[{size}];"));
            } else {
                decls.push(format!("uniform float {name};"));
            }
        } else {
            decls.push(format!("uniform sampler2D {name};"));
            decls.push(format!("uniform int offset{name};"));
        }
        if program.enable_shape_uniforms {
            if let Some(ty) = shape_uniform_ty(input.rank()) {
                decls.push(format!("uniform {ty} {name}Shape;"));
            }
            decls.push(format!("uniform ivec2 {name}TexShape;"));
        }
    }

    if program.enable_shape_uniforms {
        let rank = output.rank();
        if let Some(ty) = shape_uniform_ty(rank) {
            decls.push(format!("uniform {ty} outShape;"));
        }
        if rank >= 2 {
            if let Some(ty) = shape_uniform_ty(rank - 1) {
                decls.push(format!("uniform {ty} outShapeStrides;"));
            }
        }
        decls.push("uniform ivec2 outTexShape;".to_owned());
    }

    decls.extend(program.custom_uniforms.iter().map(|u| u.declaration()));
    decls
}

/// Wrap a program's user code into a complete fragment shader.
///
/// `inputs` are matched to `program.input_names` by position; a count
/// mismatch is an [`Error::InvalidArgument`].
pub fn assemble_fragment_shader(
    program: &ProgramDescriptor,
    inputs: &[TensorDescriptor],
    output: &TensorDescriptor,
    version: GlslVersion,
    sampling: &dyn SamplingSnippets,
) -> Result<String> {
    if inputs.len() != program.input_names.len() {
        return Err(Error::invalid_argument(
            "inputs",
            format!(
                "{} expects {} inputs ({:?}), got {}",
                program.name,
                program.input_names.len(),
                program.input_names,
                inputs.len()
            ),
        ));
    }
    if output.shape != program.output_shape {
        return Err(Error::shape_mismatch(&program.output_shape, &output.shape));
    }

    let glsl = version.differences();
    let mut prefix = shader_prefix(&glsl);
    if program.packed_inputs {
        prefix.push_str(SHADER_PACKED_PREFIX);
    }

    let input_sampling: Vec<String> = program
        .input_names
        .iter()
        .zip(inputs)
        .map(|(name, input)| {
            sampling.input_sampling(name, input, output, program.enable_shape_uniforms)
        })
        .collect();

    let sections = [
        prefix,
        sample_texture_snippet(&glsl),
        set_output_snippet(&glsl, program.packed_output),
        declarations(program, inputs, output).join("\n"),
        sampling.output_sampling(output, program.enable_shape_uniforms),
        input_sampling.join("\n"),
        program.source.clone(),
    ];
    Ok(sections.join("\n"))
}
