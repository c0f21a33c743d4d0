//! Integer shape arithmetic shared by the packed kernels
//!
//! Everything here is a total function over the integers the kernel
//! parameters can hold: no allocation beyond the returned shape, no failure.

use smallvec::SmallVec;

/// Logical tensor shape. Packed kernels are rank 3 or 4, so four dims stay inline.
pub type Shape = SmallVec<[i32; 4]>;

/// Returns `n` if it is even, otherwise `n + 1`.
///
/// Used to normalize the second texel offset of a column pair when the
/// left padding is even.
#[inline]
pub fn nearest_larger_even(n: i32) -> i32 {
    if n % 2 == 0 { n } else { n + 1 }
}

/// Maps a depthwise output channel to `(input_channel, multiplier_index)`.
///
/// `out_channel == base * channel_multiplier + sub` for every
/// `out_channel >= 0` and `channel_multiplier > 0`.
///
/// The output channel is only known per fragment, so the depthwise kernel
/// evaluates this split in GLSL (`d1 = d2 / channelMul`,
/// `q = d2 - d1 * channelMul`). This is the host-side mirror of that code;
/// the two must stay in step.
#[inline]
pub fn channel_split(out_channel: i32, channel_multiplier: i32) -> (i32, i32) {
    let base = out_channel / channel_multiplier;
    (base, out_channel - base * channel_multiplier)
}

/// Horizontal input-space origin of the texel pair starting at `col_index`.
#[inline]
pub fn texel_column_offset(col_index: i32, dilation_width: i32) -> i32 {
    col_index * dilation_width
}

/// Number of elements in a shape (1 for a scalar).
#[inline]
pub fn size_from_shape(shape: &[i32]) -> i64 {
    shape.iter().map(|&d| d as i64).product()
}

/// Row-major strides of a shape, excluding the innermost (always 1) stride.
///
/// `[2, 3, 4]` yields `[12, 4]`, the layout the flat-index decoders expect.
pub fn compute_strides(shape: &[i32]) -> Shape {
    let rank = shape.len();
    if rank < 2 {
        return Shape::new();
    }
    let mut strides: Shape = smallvec::smallvec![0; rank - 1];
    strides[rank - 2] = shape[rank - 1];
    for i in (0..rank.saturating_sub(2)).rev() {
        strides[i] = strides[i + 1] * shape[i + 1];
    }
    strides
}

/// Ceiling division for non-negative operands.
#[inline]
pub fn ceil_div(a: i32, b: i32) -> i32 {
    (a + b - 1) / b
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_nearest_larger_even() {
        assert_eq!(nearest_larger_even(0), 0);
        assert_eq!(nearest_larger_even(1), 2);
        assert_eq!(nearest_larger_even(2), 2);
        assert_eq!(nearest_larger_even(3), 4);
    }

    #[test]
    fn test_compute_strides() {
        assert_eq!(compute_strides(&[2, 3, 4]).as_slice(), &[12, 4]);
        assert_eq!(compute_strides(&[5, 7]).as_slice(), &[7]);
        assert!(compute_strides(&[9]).is_empty());
        assert_eq!(compute_strides(&[2, 3, 4, 5]).as_slice(), &[60, 20, 5]);
    }

    #[test]
    fn test_texel_column_offset() {
        assert_eq!(texel_column_offset(0, 3), 0);
        assert_eq!(texel_column_offset(4, 2), 8);
    }

    #[test]
    fn test_ceil_div() {
        assert_eq!(ceil_div(3, 2), 2);
        assert_eq!(ceil_div(4, 2), 2);
        assert_eq!(ceil_div(1, 2), 1);
    }

    proptest! {
        #[test]
        fn prop_channel_split_reconstructs(
            out_channel in 0i32..4096,
            multiplier in 1i32..16,
        ) {
            let (base, sub) = channel_split(out_channel, multiplier);
            prop_assert_eq!(out_channel, base * multiplier + sub);
            prop_assert!(sub >= 0 && sub < multiplier);
        }

        #[test]
        fn prop_nearest_larger_even_is_even(n in 0i32..10_000) {
            let even = nearest_larger_even(n);
            prop_assert_eq!(even % 2, 0);
            prop_assert!(even == n || even == n + 1);
        }
    }
}
