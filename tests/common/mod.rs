//! Common test utilities
#![allow(dead_code)]

use packgl::error::{Error, Result};
use packgl::glsl::Ty;
use packgl::harness::{
    GlslVersion, KernelHarness, ProgramCache, SamplingSnippets, TensorDescriptor, UniformValue,
    assemble_fragment_shader, shader_key, uniforms_for,
};
use packgl::program::{KernelProgram, ProgramDescriptor};
use parking_lot::Mutex;
use std::fmt::Write;
use std::sync::Arc;

/// Sampling snippets that only declare the functions a program may call
pub struct StubSampling;

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

impl SamplingSnippets for StubSampling {
    fn output_sampling(&self, output: &TensorDescriptor, _: bool) -> String {
        let ty = Ty::int_coords(output.rank());
        format!("{ty} getOutputCoords() {{\n  return {ty}(0);\n}}\n")
    }

    fn input_sampling(
        &self,
        name: &str,
        input: &TensorDescriptor,
        _: &TensorDescriptor,
        _: bool,
    ) -> String {
        let params: Vec<String> = (0..input.rank()).map(|i| format!("int i{i}")).collect();
        let name = capitalize(name);
        format!(
            "vec4 get{name}({}) {{\n  return vec4(0.0);\n}}\nvec4 get{name}AtOutCoords() {{\n  return vec4(0.0);\n}}\n",
            params.join(", ")
        )
    }
}

/// One `run` call as seen by the harness
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub program: &'static str,
    pub uniforms: Vec<UniformValue>,
}

/// Compiled kernel: the assembled fragment shader
#[derive(Debug)]
pub struct CompiledShader {
    pub descriptor: ProgramDescriptor,
    pub source: String,
}

/// A harness that assembles shaders and records what it is asked to do
pub struct RecordingHarness {
    pub version: GlslVersion,
    pub compiles: Mutex<Vec<&'static str>>,
    pub runs: Mutex<Vec<RunRecord>>,
    pub cache: ProgramCache<CompiledShader>,
}

impl RecordingHarness {
    pub fn new(version: GlslVersion) -> Self {
        Self {
            version,
            compiles: Mutex::new(Vec::new()),
            runs: Mutex::new(Vec::new()),
            cache: ProgramCache::new(),
        }
    }

    /// Compile through the cache, then run.
    pub fn dispatch(
        &self,
        program: &dyn KernelProgram,
        inputs: &[TensorDescriptor],
        output: &TensorDescriptor,
        uniforms: &[UniformValue],
    ) -> Result<Arc<CompiledShader>> {
        let descriptor = program.descriptor();
        let key = shader_key(&descriptor, inputs, output);
        let kernel = self
            .cache
            .get_or_compile(&key, || self.compile(&descriptor, inputs, output))?;
        self.run(&kernel, inputs, output, uniforms)?;
        Ok(kernel)
    }
}

impl KernelHarness for RecordingHarness {
    type Kernel = CompiledShader;

    fn compile(
        &self,
        program: &ProgramDescriptor,
        inputs: &[TensorDescriptor],
        output: &TensorDescriptor,
    ) -> Result<Self::Kernel> {
        program.verify()?;
        let source = assemble_fragment_shader(program, inputs, output, self.version, &StubSampling)?;
        self.compiles.lock().push(program.name);
        Ok(CompiledShader {
            descriptor: program.clone(),
            source,
        })
    }

    fn run(
        &self,
        kernel: &Self::Kernel,
        inputs: &[TensorDescriptor],
        _output: &TensorDescriptor,
        uniforms: &[UniformValue],
    ) -> Result<()> {
        if inputs.len() != kernel.descriptor.input_names.len() {
            return Err(Error::Harness(format!(
                "{} bound {} inputs",
                kernel.descriptor.name,
                inputs.len()
            )));
        }
        uniforms_for(&kernel.descriptor, uniforms)?;
        self.runs.lock().push(RunRecord {
            program: kernel.descriptor.name,
            uniforms: uniforms.to_vec(),
        });
        Ok(())
    }
}

/// Packed layouts for each shape.
pub fn packed(shapes: &[&[i32]]) -> Vec<TensorDescriptor> {
    shapes.iter().map(|s| TensorDescriptor::packed(s)).collect()
}

/// Assert that braces balance and `main` is defined exactly once.
pub fn assert_structurally_valid(source: &str) {
    let mut depth = 0i64;
    for ch in source.chars() {
        match ch {
            '{' => depth += 1,
            '}' => depth -= 1,
            _ => {}
        }
        assert!(depth >= 0, "closing brace without opener in:\n{source}");
    }
    assert_eq!(depth, 0, "unbalanced braces in:\n{source}");
    assert_eq!(
        source.matches("void main()").count(),
        1,
        "expected one main in:\n{source}"
    );
}

// ============================================================================
// GLSL validation
// ============================================================================

/// Backend-side definitions a program's user code links against.
const VALIDATION_HELPERS: &str = "\
layout(location = 0) out vec4 outputColor;

int imod(int x, int y) {
  return x - y * (x / y);
}

float getChannel(vec4 frag, vec2 innerDims) {
  vec2 modCoord = mod(innerDims, 2.0);
  return modCoord.x == 0.0 ? (modCoord.y == 0.0 ? frag.r : frag.g) : (modCoord.y == 0.0 ? frag.b : frag.a);
}

void setOutput(vec4 val) {
  outputColor = val;
}
";

/// Wrap a program's user code into a complete GLSL 4.50 fragment shader.
///
/// Custom and shape uniforms go into one uniform block; samplers are replaced
/// by [`StubSampling`] functions. `operand_ranks[i]` is the rank of the i-th
/// input; inputs past the slice (bias, activation operands) get rank 1.
pub fn validation_shader(descriptor: &ProgramDescriptor, operand_ranks: &[usize]) -> String {
    let output_rank = descriptor.output_shape.len();
    let output = TensorDescriptor::packed(&vec![2; output_rank]);

    let mut members = String::new();
    for uniform in &descriptor.custom_uniforms {
        let _ = match uniform.array_len {
            Some(len) => writeln!(members, "  {} {}[{len}];", uniform.ty, uniform.name),
            None => writeln!(members, "  {} {};", uniform.ty, uniform.name),
        };
    }
    if descriptor.enable_shape_uniforms {
        let _ = writeln!(members, "  {} outShape;", Ty::int_coords(output_rank));
        if output_rank > 1 {
            let _ = writeln!(members, "  {} outShapeStrides;", Ty::int_coords(output_rank - 1));
        }
    }

    let mut source = String::from("#version 450\n");
    if !members.is_empty() {
        let _ = writeln!(
            source,
            "layout(set = 0, binding = 0) uniform Uniforms {{\n{members}}};"
        );
    }
    source.push_str(VALIDATION_HELPERS);
    source.push_str(&StubSampling.output_sampling(&output, false));
    for (i, name) in descriptor.input_names.iter().enumerate() {
        let rank = operand_ranks.get(i).copied().unwrap_or(1);
        let input = TensorDescriptor::packed(&vec![2; rank]);
        source.push_str(&StubSampling.input_sampling(name, &input, &output, false));
    }
    source.push_str(&descriptor.source);
    source
}

/// Parse and validate the program as a fragment shader with naga.
pub fn validate_glsl(descriptor: &ProgramDescriptor, operand_ranks: &[usize]) -> std::result::Result<(), String> {
    use naga::front::glsl::{Frontend, Options};
    use naga::valid::{Capabilities, ValidationFlags, Validator};

    let source = validation_shader(descriptor, operand_ranks);
    let module = Frontend::default()
        .parse(&Options::from(naga::ShaderStage::Fragment), &source)
        .map_err(|e| format!("GLSL parse error: {e:?}\n\nShader:\n{source}"))?;
    Validator::new(ValidationFlags::all(), Capabilities::all())
        .validate(&module)
        .map_err(|e| format!("GLSL validation error: {e:?}\n\nShader:\n{source}"))?;
    Ok(())
}

/// Structural checks plus a full naga parse and validation.
pub fn assert_valid_glsl(descriptor: &ProgramDescriptor, operand_ranks: &[usize]) {
    assert_structurally_valid(&descriptor.source);
    descriptor
        .verify()
        .unwrap_or_else(|e| panic!("{}: {e}", descriptor.name));
    if let Err(e) = validate_glsl(descriptor, operand_ranks) {
        panic!("{}: {e}", descriptor.name);
    }
}
