//! Per-row texel fetch emission for packed convolutions

use crate::error::{Error, Result};
use crate::glsl::{Expr, SnippetBuilder, Ty, call, construct, float, ident, int, vec4_splat};
use crate::params::Conv2dInfo;
use crate::shape::{ceil_div, nearest_larger_even, texel_column_offset};

use super::table::{FetchStrategy, Parity, Slot, select_strategy};

/// Channel index passed to `getX`.
const CHANNEL: &str = "d1";

/// Texel slot variable `xTexelC{n}`
pub fn texel_slot(n: i32) -> String {
    format!("xTexelC{n}")
}

/// Fetch flag of a texel slot
pub fn ready_flag(n: i32) -> String {
    format!("xTexelC{n}Ready")
}

/// Composed value for filter column `c`
pub fn composed(c: i32) -> String {
    format!("xC{c}")
}

fn in_dims_cols() -> Expr {
    ident("inDims").at(int(1))
}

fn in_cols(at: &Expr) -> Expr {
    at.clone()
        .ge(int(0))
        .and(at.clone().lt(in_dims_cols()))
}

fn get_x(at: Expr) -> Expr {
    call(
        "getX",
        vec![ident("batch"), ident("xR"), at, ident(CHANNEL)],
    )
}

fn zero_zw(target: &str) -> (Expr, Expr) {
    (
        ident(target).swizzle("zw"),
        construct(Ty::Vec2, vec![float(0.0)]),
    )
}

/// `vec4(lo.<a>, hi.<b>)`
fn compose(lo: &str, lo_half: &'static str, hi: &str, hi_half: &'static str) -> Expr {
    construct(
        Ty::Vec4,
        vec![ident(lo).swizzle(lo_half), ident(hi).swizzle(hi_half)],
    )
}

/// Fetch `xTexelC{n}` at column `at` once per row step, zero-filling the
/// half past the right edge.
fn fetch_slot(b: &mut SnippetBuilder, n: i32, at: Expr) {
    let slot = texel_slot(n);
    let flag = ready_flag(n);
    let cond = in_cols(&at).and(ident(flag.as_str()).equals(int(0)));
    b.if_then(cond, |b| {
        b.assign(slot.as_str(), get_x(at.clone()));
        let (lane, zero) = zero_zw(&slot);
        b.if_then(at.clone().add(int(1)).ge(in_dims_cols()), |b| {
            b.assign(lane, zero);
        });
        b.assign(flag.as_str(), int(1));
    });
}

/// Compose `target` from `previous.zw` (fetched at `xCOffset`) and the
/// `.xy` half of `slot`; zeros when `xCOffset` is out of range.
fn compose_with_previous(b: &mut SnippetBuilder, target: &str, slot: &str) {
    let at = ident("xCOffset");
    b.if_else(
        in_cols(&at),
        |b| {
            b.assign("previous", get_x(at.clone()));
            let (lane, zero) = zero_zw("previous");
            b.if_then(at.clone().add(int(1)).ge(in_dims_cols()), |b| {
                b.assign(lane, zero);
            });
            b.assign(target, compose("previous", "zw", slot, "xy"));
        },
        |b| {
            b.assign(
                target,
                construct(
                    Ty::Vec4,
                    vec![float(0.0), float(0.0), ident(slot).swizzle("xy")],
                ),
            );
        },
    );
}

/// Resolved fetch plan for one filter row of a packed convolution
///
/// Built once per program from validated parameters. Construction fails
/// only for strides without a strategy; emission never fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowFetch {
    /// Horizontal stride (1 or 2)
    pub stride_width: i32,
    /// Horizontal dilation
    pub dilation_width: i32,
    /// Parity of the left padding
    pub padding: Parity,
    /// Filter width
    pub filter_width: i32,
    /// Strategy for the first column of each pair
    pub first: FetchStrategy,
    /// Strategy for the second column of each pair
    pub second: FetchStrategy,
}

impl RowFetch {
    /// Plan the row fetches for a convolution.
    pub fn new(info: &Conv2dInfo) -> Result<Self> {
        Self::from_parts(
            info.stride().width,
            info.dilation().width,
            info.padding().left,
            info.filter_width(),
        )
    }

    /// Plan from raw horizontal parameters.
    pub fn from_parts(
        stride_width: i32,
        dilation_width: i32,
        pad_left: i32,
        filter_width: i32,
    ) -> Result<Self> {
        if filter_width <= 0 || dilation_width <= 0 {
            return Err(Error::invalid_argument(
                "filter",
                format!("filter width {filter_width} and dilation {dilation_width} must be positive"),
            ));
        }
        let padding = Parity::of(pad_left);
        let dilation = Parity::of(dilation_width);
        Ok(Self {
            stride_width,
            dilation_width,
            padding,
            filter_width,
            first: select_strategy(stride_width, padding, dilation, Slot::First)?,
            second: select_strategy(stride_width, padding, dilation, Slot::Second)?,
        })
    }

    /// Number of column pairs per row
    pub fn pairs(&self) -> i32 {
        ceil_div(self.filter_width, 2)
    }

    /// Offset of the second texel of a pair relative to `xC`.
    pub fn next_texel_offset(&self) -> i32 {
        match self.padding {
            Parity::Even => nearest_larger_even(self.dilation_width),
            Parity::Odd => self.dilation_width,
        }
    }

    /// Row-state declarations: cursors, scratch texels, slots and composed values.
    pub fn declare(&self, b: &mut SnippetBuilder) {
        b.declare(Ty::Int, "xR")
            .declare(Ty::Int, "xC")
            .declare(Ty::Int, "xCOffset")
            .declare(Ty::Vec4, "wTexel")
            .declare(Ty::Vec4, "previous")
            .declare(Ty::Vec4, "final");
        for n in 0..self.pairs() * 2 {
            b.declare(Ty::Vec4, texel_slot(n))
                .declare(Ty::Int, ready_flag(n));
        }
        for c in 0..self.filter_width {
            b.declare(Ty::Vec4, composed(c));
        }
    }

    /// Clear slots, flags and composed values at the start of a row step.
    pub fn reset(&self, b: &mut SnippetBuilder) {
        for n in 0..self.pairs() * 2 {
            b.assign(texel_slot(n), vec4_splat(0.0))
                .assign(ready_flag(n), int(0));
        }
        for c in 0..self.filter_width {
            b.assign(composed(c), vec4_splat(0.0));
        }
    }

    /// Emit fetch/compose for every column pair of the current row.
    ///
    /// `accumulate(b, column)` is called right after each column's composed
    /// value is ready, so accumulation stays local to the pair.
    pub fn emit_row(
        &self,
        b: &mut SnippetBuilder,
        mut accumulate: impl FnMut(&mut SnippetBuilder, i32),
    ) {
        for c in (0..self.filter_width).step_by(2) {
            log::trace!(
                "column pair {c}: stride {} padding {:?} dilation {} -> {:?} / {:?}",
                self.stride_width,
                self.padding,
                self.dilation_width,
                self.first,
                self.second
            );
            b.assign(
                "xC",
                ident("xCCorner").add(int(texel_column_offset(c, self.dilation_width))),
            );
            self.emit_strategy(b, self.first, c);
            let has_second = c + 1 < self.filter_width;
            if has_second {
                self.emit_strategy(b, self.second, c);
            }
            accumulate(b, c);
            if has_second {
                accumulate(b, c + 1);
            }
        }
    }

    fn emit_strategy(&self, b: &mut SnippetBuilder, strategy: FetchStrategy, c: i32) {
        let xc = || ident("xC");
        let offset = ident("xCOffset");
        match strategy {
            FetchStrategy::AlignedFirst => {
                fetch_slot(b, c, xc());
                b.assign(composed(c), ident(texel_slot(c)));
            }
            FetchStrategy::ShiftedFirst => {
                b.assign(offset.clone(), xc().add(int(1)));
                fetch_slot(b, c, offset.clone());
                if self.dilation_width == 1 && c > 0 {
                    b.assign(
                        composed(c),
                        compose(&texel_slot(c - 2), "zw", &texel_slot(c), "xy"),
                    );
                } else {
                    b.assign(offset, xc().add(int(1)).sub(int(2)));
                    compose_with_previous(b, &composed(c), &texel_slot(c));
                }
            }
            FetchStrategy::ShiftedSecond => {
                let pad_parity = call("imod", vec![ident("pads").at(int(1)), int(2)]);
                b.assign(
                    offset.clone(),
                    xc().add(pad_parity).add(int(self.next_texel_offset())),
                );
                fetch_slot(b, c + 1, offset.clone());
                if self.dilation_width > 1 {
                    b.sub_assign(offset, int(2));
                    compose_with_previous(b, &composed(c + 1), &texel_slot(c + 1));
                } else {
                    b.assign(
                        composed(c + 1),
                        compose(&texel_slot(c), "zw", &texel_slot(c + 1), "xy"),
                    );
                }
            }
            FetchStrategy::AlignedSecond => {
                let next = self.next_texel_offset();
                if next == 1 {
                    b.assign(composed(c + 1), ident(texel_slot(c)));
                } else {
                    b.assign(offset.clone(), xc().add(int(next)));
                    fetch_slot(b, c + 1, offset);
                    b.assign(composed(c + 1), ident(texel_slot(c + 1)));
                }
            }
            FetchStrategy::StridedShiftedFirst => {
                let stride = ident("strides").at(int(1));
                b.assign(offset.clone(), xc().add(int(1)).sub(stride));
                fetch_slot(b, c, offset);
                fetch_slot(b, c + 1, xc().add(int(1)));
                b.assign(
                    composed(c),
                    compose(&texel_slot(c), "zw", &texel_slot(c + 1), "zw"),
                );
            }
            FetchStrategy::StridedAlignedFirst => {
                fetch_slot(b, c, xc());
                b.assign(offset.clone(), xc().add(ident("strides").at(int(1))));
                fetch_slot(b, c + 1, offset);
                b.assign(
                    composed(c),
                    compose(&texel_slot(c), "xy", &texel_slot(c + 1), "xy"),
                );
            }
            FetchStrategy::StridedShiftedSecond => {
                b.assign("final", vec4_splat(0.0));
                b.assign(
                    offset.clone(),
                    xc().add(int(1)).add(ident("strides").at(int(1))),
                );
                b.if_then(in_cols(&offset), |b| {
                    b.assign("final", get_x(offset.clone()));
                });
                b.assign(
                    composed(c + 1),
                    compose(&texel_slot(c + 1), "xy", "final", "xy"),
                );
            }
            FetchStrategy::StridedAlignedSecond => {
                b.assign(
                    composed(c + 1),
                    compose(&texel_slot(c), "zw", &texel_slot(c + 1), "zw"),
                );
            }
        }
    }
}
