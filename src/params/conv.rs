//! Validated convolution parameters
//!
//! Packed convolution kernels work on NHWC tensors:
//!
//! - **Input**: (N, H, W, C_in)
//! - **Filter (conv2d)**: (K_h, K_w, C_in, C_out)
//! - **Filter (depthwise)**: (K_h, K_w, C_in, multiplier)
//! - **Output**: (N, H_out, W_out, C_out)

use crate::error::{Error, Result};
use crate::shape::Shape;

/// Explicit per-side padding in elements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Padding {
    /// Rows added above the input
    pub top: i32,
    /// Rows added below the input
    pub bottom: i32,
    /// Columns added left of the input
    pub left: i32,
    /// Columns added right of the input
    pub right: i32,
}

impl Padding {
    /// Same amount on every side.
    pub fn uniform(padding: i32) -> Self {
        Self::new(padding, padding, padding, padding)
    }

    /// Asymmetric padding.
    pub fn new(top: i32, bottom: i32, left: i32, right: i32) -> Self {
        Self {
            top,
            bottom,
            left,
            right,
        }
    }
}

/// Padding mode for convolution operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PaddingMode {
    /// No padding - output is smaller than input.
    #[default]
    Valid,
    /// Padding so that `out = ceil(in / stride)`; extra padding goes after.
    Same,
    /// Custom padding specified as explicit values.
    Explicit(Padding),
}

impl PaddingMode {
    /// Returns the name of the padding mode for error messages.
    pub fn name(&self) -> &'static str {
        match self {
            PaddingMode::Valid => "valid",
            PaddingMode::Same => "same",
            PaddingMode::Explicit(..) => "explicit",
        }
    }
}

/// A (height, width) pair used for strides and dilations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Spatial {
    /// Vertical component
    pub height: i32,
    /// Horizontal component
    pub width: i32,
}

impl Spatial {
    /// Create a (height, width) pair
    pub fn new(height: i32, width: i32) -> Self {
        Self { height, width }
    }

    /// Same value along both axes.
    pub fn square(value: i32) -> Self {
        Self::new(value, value)
    }
}

impl Default for Spatial {
    fn default() -> Self {
        Self::square(1)
    }
}

/// Validated 2-D convolution geometry. Immutable once built.
///
/// Fields are read through accessors, so a value that passed validation
/// cannot be edited afterwards:
///
/// ```compile_fail
/// use packgl::params::{Conv2dInfo, PaddingMode, Spatial};
///
/// let mut info = Conv2dInfo::depthwise(
///     &[1, 8, 8, 2],
///     &[3, 3, 2, 1],
///     Spatial::square(1),
///     Spatial::square(1),
///     PaddingMode::Same,
/// )
/// .unwrap();
/// info.in_channels = 0;
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Conv2dInfo {
    /// N
    batch_size: i32,
    /// H
    in_height: i32,
    /// W
    in_width: i32,
    /// C_in
    in_channels: i32,
    /// H_out
    out_height: i32,
    /// W_out
    out_width: i32,
    /// C_out
    out_channels: i32,
    /// K_h
    filter_height: i32,
    /// K_w
    filter_width: i32,
    /// Resolved padding
    padding: Padding,
    /// Strides
    stride: Spatial,
    /// Dilations
    dilation: Spatial,
    /// Input shape (N, H, W, C_in)
    in_shape: Shape,
    /// Output shape (N, H_out, W_out, C_out)
    out_shape: Shape,
}

const OP: &str = "conv2d";

/// Validates that a shape is 4-dimensional.
#[inline]
fn validate_4d(shape: &[i32], arg: &'static str, op: &str) -> Result<()> {
    if shape.len() != 4 {
        return Err(Error::invalid_argument(
            arg,
            format!("{op} expects 4D shape, got {}D", shape.len()),
        ));
    }
    if let Some(d) = shape.iter().find(|&&d| d <= 0) {
        return Err(Error::invalid_argument(
            arg,
            format!("{op} requires positive dims, got {d} in {shape:?}"),
        ));
    }
    Ok(())
}

/// Validates that both components of a stride/dilation are positive.
#[inline]
fn validate_positive(value: Spatial, arg: &'static str, op: &str) -> Result<()> {
    if value.height <= 0 || value.width <= 0 {
        return Err(Error::invalid_argument(
            arg,
            format!(
                "{op} requires {arg} > 0, got ({}, {})",
                value.height, value.width
            ),
        ));
    }
    Ok(())
}

/// Dilated filter extent: `dilation * (kernel - 1) + 1`.
#[inline]
pub fn effective_filter_size(kernel: i32, dilation: i32) -> i32 {
    dilation * (kernel - 1) + 1
}

/// Computes output size for a single dimension.
///
/// output_size = floor((input_size + pad_before + pad_after - effective_kernel) / stride) + 1
#[inline]
pub fn compute_output_size(
    input_size: i32,
    kernel_size: i32,
    stride: i32,
    dilation: i32,
    pad_before: i32,
    pad_after: i32,
) -> i32 {
    let effective_kernel = effective_filter_size(kernel_size, dilation);
    let padded_size = input_size + pad_before + pad_after;
    if padded_size < effective_kernel {
        0
    } else {
        (padded_size - effective_kernel) / stride + 1
    }
}

/// Computes padding values for "same" padding mode.
///
/// Same padding ensures output_size == ceil(input_size / stride).
#[inline]
pub fn compute_same_padding(
    input_size: i32,
    kernel_size: i32,
    stride: i32,
    dilation: i32,
) -> (i32, i32) {
    let effective_kernel = effective_filter_size(kernel_size, dilation);
    let output_size = (input_size + stride - 1) / stride;
    let needed = (output_size - 1) * stride + effective_kernel;
    let total_pad = (needed - input_size).max(0);
    let pad_before = total_pad / 2;
    (pad_before, total_pad - pad_before)
}

/// Resolves a padding mode to explicit values.
pub fn resolve_padding(
    padding: PaddingMode,
    input: Spatial,
    kernel: Spatial,
    stride: Spatial,
    dilation: Spatial,
) -> Result<Padding> {
    match padding {
        PaddingMode::Valid => Ok(Padding::default()),
        PaddingMode::Same => {
            let (top, bottom) =
                compute_same_padding(input.height, kernel.height, stride.height, dilation.height);
            let (left, right) =
                compute_same_padding(input.width, kernel.width, stride.width, dilation.width);
            Ok(Padding::new(top, bottom, left, right))
        }
        PaddingMode::Explicit(p) => {
            if p.top < 0 || p.bottom < 0 || p.left < 0 || p.right < 0 {
                return Err(Error::invalid_argument(
                    "padding",
                    format!("padding must be non-negative, got {p:?}"),
                ));
            }
            Ok(p)
        }
    }
}

impl Conv2dInfo {
    /// Validates and resolves a regular convolution.
    ///
    /// `filter_shape` is (K_h, K_w, C_in, C_out) and its C_in must match the input.
    pub fn new(
        in_shape: &[i32],
        filter_shape: &[i32],
        stride: Spatial,
        dilation: Spatial,
        padding: PaddingMode,
    ) -> Result<Self> {
        validate_4d(in_shape, "input", OP)?;
        validate_4d(filter_shape, "filter", OP)?;
        if filter_shape[2] != in_shape[3] {
            return Err(Error::invalid_argument(
                "filter",
                format!(
                    "{OP} filter.shape[2] should be C_in = {}, got {}",
                    in_shape[3], filter_shape[2]
                ),
            ));
        }
        Self::build(in_shape, filter_shape, filter_shape[3], stride, dilation, padding)
    }

    /// Validates and resolves a depthwise convolution.
    ///
    /// `filter_shape` is (K_h, K_w, C_in, multiplier); C_out = C_in * multiplier.
    pub fn depthwise(
        in_shape: &[i32],
        filter_shape: &[i32],
        stride: Spatial,
        dilation: Spatial,
        padding: PaddingMode,
    ) -> Result<Self> {
        validate_4d(in_shape, "input", "depthwise_conv2d")?;
        validate_4d(filter_shape, "filter", "depthwise_conv2d")?;
        if filter_shape[2] != in_shape[3] {
            return Err(Error::invalid_argument(
                "filter",
                format!(
                    "depthwise_conv2d filter.shape[2] should be C_in = {}, got {}",
                    in_shape[3], filter_shape[2]
                ),
            ));
        }
        let out_channels = in_shape[3] * filter_shape[3];
        Self::build(in_shape, filter_shape, out_channels, stride, dilation, padding)
    }

    fn build(
        in_shape: &[i32],
        filter_shape: &[i32],
        out_channels: i32,
        stride: Spatial,
        dilation: Spatial,
        padding: PaddingMode,
    ) -> Result<Self> {
        validate_positive(stride, "stride", OP)?;
        validate_positive(dilation, "dilation", OP)?;

        let (batch_size, in_height, in_width, in_channels) =
            (in_shape[0], in_shape[1], in_shape[2], in_shape[3]);
        let (filter_height, filter_width) = (filter_shape[0], filter_shape[1]);

        let padding = resolve_padding(
            padding,
            Spatial::new(in_height, in_width),
            Spatial::new(filter_height, filter_width),
            stride,
            dilation,
        )?;

        let out_height = compute_output_size(
            in_height,
            filter_height,
            stride.height,
            dilation.height,
            padding.top,
            padding.bottom,
        );
        let out_width = compute_output_size(
            in_width,
            filter_width,
            stride.width,
            dilation.width,
            padding.left,
            padding.right,
        );
        if out_height <= 0 || out_width <= 0 {
            return Err(Error::invalid_argument(
                "filter",
                format!(
                    "{OP} output would be empty: input {in_height}x{in_width}, \
                     filter {filter_height}x{filter_width}, padding {padding:?}"
                ),
            ));
        }

        Ok(Self {
            batch_size,
            in_height,
            in_width,
            in_channels,
            out_height,
            out_width,
            out_channels,
            filter_height,
            filter_width,
            padding,
            stride,
            dilation,
            in_shape: Shape::from_slice(in_shape),
            out_shape: Shape::from_slice(&[batch_size, out_height, out_width, out_channels]),
        })
    }

    /// N
    pub fn batch_size(&self) -> i32 {
        self.batch_size
    }

    /// H
    pub fn in_height(&self) -> i32 {
        self.in_height
    }

    /// W
    pub fn in_width(&self) -> i32 {
        self.in_width
    }

    /// C_in
    pub fn in_channels(&self) -> i32 {
        self.in_channels
    }

    /// H_out
    pub fn out_height(&self) -> i32 {
        self.out_height
    }

    /// W_out
    pub fn out_width(&self) -> i32 {
        self.out_width
    }

    /// C_out
    pub fn out_channels(&self) -> i32 {
        self.out_channels
    }

    /// K_h
    pub fn filter_height(&self) -> i32 {
        self.filter_height
    }

    /// K_w
    pub fn filter_width(&self) -> i32 {
        self.filter_width
    }

    /// Resolved padding
    pub fn padding(&self) -> Padding {
        self.padding
    }

    /// Strides
    pub fn stride(&self) -> Spatial {
        self.stride
    }

    /// Dilations
    pub fn dilation(&self) -> Spatial {
        self.dilation
    }

    /// Input shape (N, H, W, C_in)
    pub fn in_shape(&self) -> &Shape {
        &self.in_shape
    }

    /// Output shape (N, H_out, W_out, C_out)
    pub fn out_shape(&self) -> &Shape {
        &self.out_shape
    }

    /// Left padding is odd: a logical column pair straddles two texels.
    pub fn padding_odd(&self) -> bool {
        self.padding.left % 2 == 1
    }

    /// Horizontal dilation is odd.
    pub fn dilation_odd(&self) -> bool {
        self.dilation.width % 2 == 1
    }

    /// C_out / C_in, the depthwise channel multiplier.
    pub fn channel_multiplier(&self) -> i32 {
        self.out_channels / self.in_channels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_padding_output() {
        let info = Conv2dInfo::new(
            &[1, 8, 8, 4],
            &[3, 3, 4, 6],
            Spatial::square(1),
            Spatial::square(1),
            PaddingMode::Valid,
        )
        .unwrap();
        assert_eq!(info.out_shape.as_slice(), &[1, 6, 6, 6]);
        assert_eq!(info.padding, Padding::default());
        assert!(!info.padding_odd());
        assert!(info.dilation_odd());
    }

    #[test]
    fn test_same_padding_output() {
        let info = Conv2dInfo::new(
            &[2, 7, 7, 3],
            &[3, 3, 3, 8],
            Spatial::square(2),
            Spatial::square(1),
            PaddingMode::Same,
        )
        .unwrap();
        assert_eq!(info.out_shape.as_slice(), &[2, 4, 4, 8]);
        // total pad = (4 - 1) * 2 + 3 - 7 = 2
        assert_eq!(info.padding, Padding::new(1, 1, 1, 1));
        assert!(info.padding_odd());
    }

    #[test]
    fn test_same_padding_stride_one_preserves_size() {
        let info = Conv2dInfo::new(
            &[1, 5, 6, 2],
            &[5, 5, 2, 2],
            Spatial::square(1),
            Spatial::square(1),
            PaddingMode::Same,
        )
        .unwrap();
        assert_eq!(info.out_height, 5);
        assert_eq!(info.out_width, 6);
        assert_eq!(info.padding.left, 2);
    }

    #[test]
    fn test_depthwise_channels() {
        let info = Conv2dInfo::depthwise(
            &[1, 5, 5, 3],
            &[3, 3, 3, 2],
            Spatial::square(1),
            Spatial::square(1),
            PaddingMode::Explicit(Padding::uniform(1)),
        )
        .unwrap();
        assert_eq!(info.out_channels, 6);
        assert_eq!(info.channel_multiplier(), 2);
        assert_eq!(info.out_shape.as_slice(), &[1, 5, 5, 6]);
    }

    #[test]
    fn test_rejects_bad_parameters() {
        let bad_rank = Conv2dInfo::new(
            &[8, 8, 4],
            &[3, 3, 4, 4],
            Spatial::square(1),
            Spatial::square(1),
            PaddingMode::Valid,
        );
        assert!(matches!(bad_rank, Err(Error::InvalidArgument { arg: "input", .. })));

        let zero_filter = Conv2dInfo::new(
            &[1, 8, 8, 4],
            &[0, 3, 4, 4],
            Spatial::square(1),
            Spatial::square(1),
            PaddingMode::Valid,
        );
        assert!(zero_filter.is_err());

        let zero_stride = Conv2dInfo::new(
            &[1, 8, 8, 4],
            &[3, 3, 4, 4],
            Spatial::new(1, 0),
            Spatial::square(1),
            PaddingMode::Valid,
        );
        assert!(matches!(zero_stride, Err(Error::InvalidArgument { arg: "stride", .. })));

        let channel_mismatch = Conv2dInfo::new(
            &[1, 8, 8, 4],
            &[3, 3, 2, 4],
            Spatial::square(1),
            Spatial::square(1),
            PaddingMode::Valid,
        );
        assert!(channel_mismatch.is_err());

        let negative_pad = Conv2dInfo::new(
            &[1, 8, 8, 4],
            &[3, 3, 4, 4],
            Spatial::square(1),
            Spatial::square(1),
            PaddingMode::Explicit(Padding::new(0, 0, -1, 0)),
        );
        assert!(matches!(negative_pad, Err(Error::InvalidArgument { arg: "padding", .. })));

        let too_big = Conv2dInfo::new(
            &[1, 2, 2, 4],
            &[3, 3, 4, 4],
            Spatial::square(1),
            Spatial::square(1),
            PaddingMode::Valid,
        );
        assert!(too_big.is_err());
    }
}
