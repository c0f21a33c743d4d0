//! Host-side uniform values

use crate::error::{Error, Result};
use crate::glsl::Ty;
use crate::program::{CustomUniform, ProgramDescriptor};

/// A value for one custom uniform
#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    /// `int`
    Int(i32),
    /// `ivec2`
    IVec2([i32; 2]),
    /// `ivec3`
    IVec3([i32; 3]),
    /// `ivec4`
    IVec4([i32; 4]),
    /// `float`
    Float(f32),
    /// `float name[len]`
    FloatArray(Vec<f32>),
}

impl UniformValue {
    /// GLSL element type of the value
    pub fn ty(&self) -> Ty {
        match self {
            UniformValue::Int(_) => Ty::Int,
            UniformValue::IVec2(_) => Ty::IVec2,
            UniformValue::IVec3(_) => Ty::IVec3,
            UniformValue::IVec4(_) => Ty::IVec4,
            UniformValue::Float(_) | UniformValue::FloatArray(_) => Ty::Float,
        }
    }

    /// Native-endian bytes in the layout `glUniform*v` expects.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            UniformValue::Int(v) => bytemuck::bytes_of(v),
            UniformValue::IVec2(v) => bytemuck::cast_slice(v),
            UniformValue::IVec3(v) => bytemuck::cast_slice(v),
            UniformValue::IVec4(v) => bytemuck::cast_slice(v),
            UniformValue::Float(v) => bytemuck::bytes_of(v),
            UniformValue::FloatArray(v) => bytemuck::cast_slice(v),
        }
    }

    fn matches(&self, uniform: &CustomUniform) -> bool {
        if self.ty() != uniform.ty {
            return false;
        }
        match (self, uniform.array_len) {
            (UniformValue::FloatArray(values), Some(len)) => values.len() == len,
            (UniformValue::FloatArray(_), None) | (_, Some(_)) => false,
            (_, None) => true,
        }
    }
}

/// A value paired with the uniform it is bound to
#[derive(Debug, Clone, PartialEq)]
pub struct BoundUniform<'a> {
    /// Declared uniform
    pub uniform: &'a CustomUniform,
    /// Value to upload
    pub value: &'a UniformValue,
}

/// Pair `values` with the custom uniforms `program` declares.
///
/// Values are positional. A missing, surplus or mistyped value is a
/// [`Error::UniformMismatch`].
pub fn uniforms_for<'a>(
    program: &'a ProgramDescriptor,
    values: &'a [UniformValue],
) -> Result<Vec<BoundUniform<'a>>> {
    let declared = &program.custom_uniforms;
    if values.len() > declared.len() {
        return Err(Error::uniform_mismatch(
            program.name,
            format!(
                "{} values supplied but only {} uniforms declared",
                values.len(),
                declared.len()
            ),
        ));
    }

    let mut bound = Vec::with_capacity(declared.len());
    for (i, uniform) in declared.iter().enumerate() {
        let Some(value) = values.get(i) else {
            return Err(Error::uniform_mismatch(&uniform.name, "no value supplied"));
        };
        if !value.matches(uniform) {
            return Err(Error::uniform_mismatch(
                &uniform.name,
                format!("declared as `{}`, got {value:?}", uniform.declaration()),
            ));
        }
        bound.push(BoundUniform { uniform, value });
    }
    Ok(bound)
}
