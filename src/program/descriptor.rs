//! Synthesized program artifact

use crate::error::{Error, Result};
use crate::glsl::Ty;
use crate::shape::Shape;

/// Texture reads that are provided by the harness prelude or defined in
/// program code, and so never correspond to an input.
const INTRINSIC_SAMPLERS: &[&str] = &["getOutputCoords", "getChannel", "getFlatIndex"];

const AT_OUT_COORDS: &str = "AtOutCoords";

/// A uniform declared by a program beyond its input samplers
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CustomUniform {
    /// GLSL name
    pub name: String,
    /// GLSL type
    pub ty: Ty,
    /// Array length for `uniform ty name[len];`
    pub array_len: Option<usize>,
}

impl CustomUniform {
    /// Scalar or vector uniform
    pub fn new(name: impl Into<String>, ty: Ty) -> Self {
        Self {
            name: name.into(),
            ty,
            array_len: None,
        }
    }

    /// Array uniform
    pub fn array(name: impl Into<String>, ty: Ty, len: usize) -> Self {
        Self {
            name: name.into(),
            ty,
            array_len: Some(len),
        }
    }

    /// `uniform <ty> <name>[<len>];`
    pub fn declaration(&self) -> String {
        match self.array_len {
            Some(len) => format!("uniform {} {}[{len}];", self.ty, self.name),
            None => format!("uniform {} {};", self.ty, self.name),
        }
    }
}

/// Everything a harness needs to compile and bind one kernel
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProgramDescriptor {
    /// Program type name, for logs and cache keys
    pub name: &'static str,
    /// Input textures in binding order
    pub input_names: Vec<String>,
    /// Logical output shape
    pub output_shape: Shape,
    /// Inputs are read as 2x2-packed texels
    pub packed_inputs: bool,
    /// Output is written as 2x2-packed texels
    pub packed_output: bool,
    /// Uniforms beyond input samplers, in declaration order
    pub custom_uniforms: Vec<CustomUniform>,
    /// Shapes are bound as uniforms rather than baked in
    pub enable_shape_uniforms: bool,
    /// GLSL user code (no prelude)
    pub source: String,
}

impl ProgramDescriptor {
    /// Checks the structural invariants of the synthesized source.
    ///
    /// - every `get<Name>` / `get<Name>AtOutCoords` read names a bound input
    /// - every bound input is read
    /// - exactly one `void main()`, and braces balance
    pub fn verify(&self) -> Result<()> {
        let referenced = referenced_inputs(&self.source);

        for sampled in &referenced {
            if !self
                .input_names
                .iter()
                .any(|name| &capitalize(name) == sampled)
            {
                return Err(Error::Internal(format!(
                    "{}: source reads get{sampled} but no input is bound for it (inputs: {:?})",
                    self.name, self.input_names
                )));
            }
        }
        for name in &self.input_names {
            let expected = capitalize(name);
            if !referenced.contains(&expected) {
                return Err(Error::Internal(format!(
                    "{}: input {name} is bound but never read",
                    self.name
                )));
            }
        }

        let mains = self.source.matches("void main(").count();
        if mains != 1 {
            return Err(Error::Internal(format!(
                "{}: expected exactly one main(), found {mains}",
                self.name
            )));
        }

        let mut depth = 0i64;
        for ch in self.source.chars() {
            match ch {
                '{' => depth += 1,
                '}' => depth -= 1,
                _ => {}
            }
            if depth < 0 {
                break;
            }
        }
        if depth != 0 {
            return Err(Error::Internal(format!("{}: unbalanced braces", self.name)));
        }
        Ok(())
    }

    /// Rank of the output tensor
    pub fn output_rank(&self) -> usize {
        self.output_shape.len()
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

/// Input suffixes of every `getXxx(` texture read in `source`, sorted and deduplicated.
fn referenced_inputs(source: &str) -> Vec<String> {
    let mut found = Vec::new();
    let bytes = source.as_bytes();
    let is_ident = |b: u8| b.is_ascii_alphanumeric() || b == b'_';

    let mut i = 0;
    while i < bytes.len() {
        if !is_ident(bytes[i]) {
            i += 1;
            continue;
        }
        let start = i;
        while i < bytes.len() && is_ident(bytes[i]) {
            i += 1;
        }
        let token = &source[start..i];
        let called = source[i..].trim_start().starts_with('(');
        if !called || INTRINSIC_SAMPLERS.contains(&token) {
            continue;
        }
        let Some(rest) = token.strip_prefix("get") else {
            continue;
        };
        if !rest.starts_with(|c: char| c.is_ascii_uppercase()) {
            continue;
        }
        let rest = rest.strip_suffix(AT_OUT_COORDS).unwrap_or(rest);
        found.push(rest.to_owned());
    }
    found.sort();
    found.dedup();
    found
}
