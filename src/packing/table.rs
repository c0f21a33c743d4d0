//! Fetch decision table

use crate::error::{Error, Result};

/// Parity of a padding or dilation value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parity {
    /// Divisible by two
    Even,
    /// Not divisible by two
    Odd,
}

impl Parity {
    /// Parity of `n`.
    pub fn of(n: i32) -> Self {
        if n.rem_euclid(2) == 0 {
            Parity::Even
        } else {
            Parity::Odd
        }
    }

    /// `Odd` → true
    pub fn is_odd(self) -> bool {
        self == Parity::Odd
    }
}

/// Position within a filter column pair `(c, c + 1)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// Column `c`
    First,
    /// Column `c + 1`
    Second,
}

/// How one composed value `xC{n}` of a column pair is produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchStrategy {
    /// Stride 1, first slot, even padding: one aligned texel is the value.
    AlignedFirst,
    /// Stride 1, first slot, odd padding: texel at `xC + 1`, composed with
    /// the preceding texel (reused when dilation is 1).
    ShiftedFirst,
    /// Stride 1, second slot, parities differ: texel at
    /// `xC + imod(pads[1], 2) + next`, composed with the preceding half.
    ShiftedSecond,
    /// Stride 1, second slot, parities agree: reuse the first texel when
    /// the next offset is 1, otherwise one aligned fetch.
    AlignedSecond,
    /// Stride 2, first slot, odd padding: `.zw` halves of the texels at
    /// `xC + 1 - strides[1]` and `xC + 1`.
    StridedShiftedFirst,
    /// Stride 2, first slot, even padding: `.xy` halves of the texels at
    /// `xC` and `xC + strides[1]`.
    StridedAlignedFirst,
    /// Stride 2, second slot, odd padding: `.xy` of the second texel and a
    /// `final` texel at `xC + 1 + strides[1]`.
    StridedShiftedSecond,
    /// Stride 2, second slot, even padding: `.zw` halves of the two texels
    /// already fetched.
    StridedAlignedSecond,
}

/// One row of the decision table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecisionEntry {
    /// Horizontal stride
    pub stride: i32,
    /// Parity of the left padding
    pub padding: Parity,
    /// Parity of the horizontal dilation
    pub dilation: Parity,
    /// Slot in the column pair
    pub slot: Slot,
    /// Strategy for this case
    pub strategy: FetchStrategy,
}

const fn entry(
    stride: i32,
    padding: Parity,
    dilation: Parity,
    slot: Slot,
    strategy: FetchStrategy,
) -> DecisionEntry {
    DecisionEntry {
        stride,
        padding,
        dilation,
        slot,
        strategy,
    }
}

use FetchStrategy::*;
use Parity::{Even, Odd};
use Slot::{First, Second};

/// Every supported case: stride {1, 2} × padding parity × dilation parity × slot.
///
/// Strides not listed here have no strategy.
pub const DECISION_TABLE: [DecisionEntry; 16] = [
    entry(1, Odd, Odd, First, ShiftedFirst),
    entry(1, Odd, Even, First, ShiftedFirst),
    entry(1, Even, Odd, First, AlignedFirst),
    entry(1, Even, Even, First, AlignedFirst),
    entry(1, Odd, Odd, Second, AlignedSecond),
    entry(1, Odd, Even, Second, ShiftedSecond),
    entry(1, Even, Odd, Second, ShiftedSecond),
    entry(1, Even, Even, Second, AlignedSecond),
    entry(2, Odd, Odd, First, StridedShiftedFirst),
    entry(2, Odd, Even, First, StridedShiftedFirst),
    entry(2, Even, Odd, First, StridedAlignedFirst),
    entry(2, Even, Even, First, StridedAlignedFirst),
    entry(2, Odd, Odd, Second, StridedShiftedSecond),
    entry(2, Odd, Even, Second, StridedShiftedSecond),
    entry(2, Even, Odd, Second, StridedAlignedSecond),
    entry(2, Even, Even, Second, StridedAlignedSecond),
];

/// Look up the strategy for one case.
pub fn select_strategy(
    stride: i32,
    padding: Parity,
    dilation: Parity,
    slot: Slot,
) -> Result<FetchStrategy> {
    DECISION_TABLE
        .iter()
        .find(|e| {
            e.stride == stride && e.padding == padding && e.dilation == dilation && e.slot == slot
        })
        .map(|e| e.strategy)
        .ok_or(Error::UnsupportedStride { stride })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_complete_and_unique() {
        for stride in [1, 2] {
            for padding in [Even, Odd] {
                for dilation in [Even, Odd] {
                    for slot in [First, Second] {
                        let hits = DECISION_TABLE
                            .iter()
                            .filter(|e| {
                                e.stride == stride
                                    && e.padding == padding
                                    && e.dilation == dilation
                                    && e.slot == slot
                            })
                            .count();
                        assert_eq!(hits, 1, "{stride} {padding:?} {dilation:?} {slot:?}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_stride_two_ignores_dilation() {
        for padding in [Even, Odd] {
            for slot in [First, Second] {
                assert_eq!(
                    select_strategy(2, padding, Even, slot).unwrap(),
                    select_strategy(2, padding, Odd, slot).unwrap()
                );
            }
        }
    }

    #[test]
    fn test_unsupported_stride() {
        assert_eq!(
            select_strategy(3, Odd, Odd, First),
            Err(Error::UnsupportedStride { stride: 3 })
        );
    }

    #[test]
    fn test_parity_of_negative() {
        assert_eq!(Parity::of(-1), Odd);
        assert_eq!(Parity::of(-2), Even);
    }
}
