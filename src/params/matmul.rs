//! Batched matrix multiplication parameters

use crate::error::{Error, Result};
use crate::shape::Shape;

/// Validated `(batch, rows, cols)` operands of a packed batched matmul
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MatMulParams {
    /// Shape of A as stored, before any transpose
    a_shape: [i32; 3],
    /// Shape of B as stored, before any transpose
    b_shape: [i32; 3],
    /// `(max(batch_a, batch_b), rows, cols)`
    output_shape: Shape,
    /// Read A transposed
    transpose_a: bool,
    /// Read B transposed
    transpose_b: bool,
}

fn rank3(shape: &[i32], arg: &'static str) -> Result<[i32; 3]> {
    let dims: [i32; 3] = shape.try_into().map_err(|_| {
        Error::invalid_argument(arg, format!("matmul expects 3D shape, got {}D", shape.len()))
    })?;
    if dims.iter().any(|&d| d <= 0) {
        return Err(Error::invalid_argument(
            arg,
            format!("matmul requires positive dims, got {dims:?}"),
        ));
    }
    Ok(dims)
}

impl MatMulParams {
    /// Validate operand shapes.
    ///
    /// Inner dimensions must agree after transposition, and batch sizes
    /// must be equal or one of them 1.
    pub fn new(
        a_shape: &[i32],
        b_shape: &[i32],
        transpose_a: bool,
        transpose_b: bool,
    ) -> Result<Self> {
        let a = rank3(a_shape, "a")?;
        let b = rank3(b_shape, "b")?;

        let (rows, inner_a) = if transpose_a { (a[2], a[1]) } else { (a[1], a[2]) };
        let (inner_b, cols) = if transpose_b { (b[2], b[1]) } else { (b[1], b[2]) };
        if inner_a != inner_b {
            return Err(Error::shape_mismatch(&[a[0], rows, inner_a], &[b[0], inner_b, cols]));
        }

        let (batch_a, batch_b) = (a[0], b[0]);
        if batch_a != batch_b && batch_a != 1 && batch_b != 1 {
            return Err(Error::BroadcastError {
                lhs: a.to_vec(),
                rhs: b.to_vec(),
            });
        }

        Ok(Self {
            a_shape: a,
            b_shape: b,
            output_shape: Shape::from_slice(&[batch_a.max(batch_b), rows, cols]),
            transpose_a,
            transpose_b,
        })
    }

    /// Shape of A as stored, before any transpose
    pub fn a_shape(&self) -> [i32; 3] {
        self.a_shape
    }

    /// Shape of B as stored, before any transpose
    pub fn b_shape(&self) -> [i32; 3] {
        self.b_shape
    }

    /// `(max(batch_a, batch_b), rows, cols)`
    pub fn output_shape(&self) -> &Shape {
        &self.output_shape
    }

    /// A is read transposed
    pub fn transpose_a(&self) -> bool {
        self.transpose_a
    }

    /// B is read transposed
    pub fn transpose_b(&self) -> bool {
        self.transpose_b
    }

    /// Length of the reduced dimension
    pub fn shared_dim(&self) -> i32 {
        if self.transpose_a {
            self.a_shape[1]
        } else {
            self.a_shape[2]
        }
    }

    /// Batch of A
    pub fn batch_a(&self) -> i32 {
        self.a_shape[0]
    }

    /// Batch of B
    pub fn batch_b(&self) -> i32 {
        self.b_shape[0]
    }
}
