//! Shared body of the packed regular and depthwise convolutions

use crate::glsl::{Function, SnippetBuilder, Stmt, TranslationUnit, Ty, call, construct, ident, int, vec4_splat};
use crate::harness::UniformValue;
use crate::packing::{RowFetch, composed};
use crate::params::{Conv2dInfo, Fusion};
use crate::program::CustomUniform;

use super::{apply_epilogue, unit_with_activation};

/// Initial accumulator value, subtracted again before the epilogue.
pub const DOT_PROD_EPSILON: f64 = 0.000000000000001;

/// Which convolution the shared body emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum ConvVariant {
    /// Loops over input channel pairs; every output channel sees all inputs.
    Regular,
    /// One input channel per output channel; no channel loop.
    Depthwise,
}

/// `pads`, `strides`, `dilations`, `inDims`, all `ivec2`.
pub(crate) fn conv_uniforms() -> Vec<CustomUniform> {
    ["pads", "strides", "dilations", "inDims"]
        .into_iter()
        .map(|name| CustomUniform::new(name, Ty::IVec2))
        .collect()
}

/// Values for [`conv_uniforms`], in the same order.
pub(crate) fn conv_uniform_values(info: &Conv2dInfo) -> Vec<UniformValue> {
    vec![
        UniformValue::IVec2([info.padding().top, info.padding().left]),
        UniformValue::IVec2([info.stride().height, info.stride().width]),
        UniformValue::IVec2([info.dilation().height, info.dilation().width]),
        UniformValue::IVec2([info.in_height(), info.in_width()]),
    ]
}

fn accumulate(b: &mut SnippetBuilder, variant: ConvVariant, in_channels: i32, c: i32) {
    let w_half = |half: &'static str| {
        construct(
            Ty::Vec4,
            vec![ident("wTexel").swizzle(half), ident("wTexel").swizzle(half)],
        )
    };
    let x = || ident(composed(c));
    match variant {
        ConvVariant::Regular => {
            b.assign(
                "wTexel",
                call("getW", vec![ident("r"), int(c), ident("d1"), ident("d2")]),
            );
            b.add_assign("dotProd", x().swizzle("xxzz").mul(w_half("xy")));
            b.if_then(ident("d1").add(int(1)).lt(int(in_channels)), |b| {
                b.add_assign("dotProd", x().swizzle("yyww").mul(w_half("zw")));
            });
        }
        ConvVariant::Depthwise => {
            b.assign(
                "wTexel",
                call("getW", vec![ident("r"), int(c), ident("d1"), ident("q")]),
            );
            b.add_assign("dotProd", x().mul(w_half("xz")));
        }
    }
}

/// `int d1 = d2 / channelMul; int q = d2 - d1 * channelMul;`
///
/// GLSL form of [`channel_split`](crate::shape::channel_split): `d1` is the
/// input channel and `q` the filter's multiplier index.
fn declare_channel_split(b: &mut SnippetBuilder, channel_mul: i32) {
    b.declare_init(Ty::Int, "d1", ident("d2").div(int(channel_mul)))
        .declare_init(
            Ty::Int,
            "q",
            ident("d2").sub(ident("d1").mul(int(channel_mul))),
        );
}

/// The full user code of a packed convolution.
pub(crate) fn conv_unit(
    info: &Conv2dInfo,
    fetch: &RowFetch,
    fusion: &Fusion,
    variant: ConvVariant,
) -> TranslationUnit {
    let in_channels = info.in_channels();
    let mut b = SnippetBuilder::new();

    b.declare_init(Ty::IVec4, "coords", call("getOutputCoords", vec![]))
        .declare_init(Ty::Int, "batch", ident("coords").swizzle("x"))
        .declare_init(
            Ty::IVec2,
            "xRCCorner",
            ident("coords")
                .swizzle("yz")
                .mul(ident("strides"))
                .sub(ident("pads")),
        )
        .declare_init(Ty::Int, "d2", ident("coords").swizzle("w"));
    if variant == ConvVariant::Depthwise {
        declare_channel_split(&mut b, info.channel_multiplier());
    }
    b.declare_init(Ty::Int, "xRCorner", ident("xRCCorner").swizzle("x"))
        .declare_init(Ty::Int, "xCCorner", ident("xRCCorner").swizzle("y"))
        .declare_init(Ty::Vec4, "dotProd", vec4_splat(DOT_PROD_EPSILON));

    fetch.declare(&mut b);

    let row = |b: &mut SnippetBuilder| {
        fetch.reset(b);
        b.assign(
            "xR",
            ident("xRCorner").add(ident("r").mul(ident("dilations").at(int(0)))),
        );
        let in_rows = ident("xR")
            .ge(int(0))
            .and(ident("xR").lt(ident("inDims").at(int(0))));
        b.if_then(in_rows, |b| {
            fetch.emit_row(b, |b, c| accumulate(b, variant, in_channels, c));
        });
    };
    b.for_range("r", int(info.filter_height()), 1, |b| match variant {
        ConvVariant::Regular => {
            b.for_range("d1", int(in_channels), 2, row);
        }
        ConvVariant::Depthwise => row(b),
    });

    b.declare_init(
        Ty::Vec4,
        "result",
        ident("dotProd").sub(vec4_splat(DOT_PROD_EPSILON)),
    );
    apply_epilogue(&mut b, fusion);
    b.eval(call("setOutput", vec![ident("result")]));

    let mut unit = unit_with_activation(fusion);
    unit.function(Function::main(b.finish()));
    unit
}

/// Statements of `main` for inspection by fetch-site analysis.
pub(crate) fn main_body(unit: &TranslationUnit) -> &[Stmt] {
    unit.find_function("main")
        .map(|f| f.body.as_slice())
        .unwrap_or_default()
}
