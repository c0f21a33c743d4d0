//! Reshape and unary op parameters

use crate::error::{Error, Result};
use crate::shape::{Shape, size_from_shape};

fn validate_dims(shape: &[i32], arg: &'static str, op: &str) -> Result<()> {
    if shape.is_empty() {
        return Err(Error::invalid_argument(arg, format!("{op} requires rank >= 1")));
    }
    if let Some(d) = shape.iter().find(|&&d| d <= 0) {
        return Err(Error::invalid_argument(
            arg,
            format!("{op} requires positive dims, got {d} in {shape:?}"),
        ));
    }
    Ok(())
}

/// Rank-3 packed reshape
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReshapeParams {
    /// Source shape `(batch, rows, cols)`
    input_shape: [i32; 3],
    /// Target shape `(batch, rows, cols)`
    output_shape: [i32; 3],
}

impl ReshapeParams {
    /// Both shapes must be rank 3 with the same element count.
    pub fn new(input_shape: &[i32], output_shape: &[i32]) -> Result<Self> {
        validate_dims(input_shape, "input_shape", "reshape")?;
        validate_dims(output_shape, "output_shape", "reshape")?;
        let input: [i32; 3] = input_shape.try_into().map_err(|_| {
            Error::invalid_argument(
                "input_shape",
                format!("packed reshape expects 3D shape, got {}D", input_shape.len()),
            )
        })?;
        let output: [i32; 3] = output_shape.try_into().map_err(|_| {
            Error::invalid_argument(
                "output_shape",
                format!("packed reshape expects 3D shape, got {}D", output_shape.len()),
            )
        })?;
        if size_from_shape(&input) != size_from_shape(&output) {
            return Err(Error::shape_mismatch(&input, &output));
        }
        Ok(Self {
            input_shape: input,
            output_shape: output,
        })
    }

    /// Source shape
    pub fn input_shape(&self) -> [i32; 3] {
        self.input_shape
    }

    /// Target shape
    pub fn output_shape(&self) -> [i32; 3] {
        self.output_shape
    }
}

/// Elementwise op over one packed tensor
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnaryParams {
    /// Input and output shape
    shape: Shape,
}

impl UnaryParams {
    /// Any rank >= 1 with positive dims.
    pub fn new(shape: &[i32]) -> Result<Self> {
        validate_dims(shape, "shape", "unary")?;
        Ok(Self {
            shape: Shape::from_slice(shape),
        })
    }

    /// Input and output shape
    pub fn shape(&self) -> &Shape {
        &self.shape
    }
}
