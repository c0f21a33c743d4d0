//! Packed rank-3 reshape

use crate::config::SynthesisConfig;
use crate::error::Result;
use crate::glsl::{
    Expr, Function, Param, SnippetBuilder, TranslationUnit, Ty, call, construct, float, ident,
    int,
};
use crate::harness::UniformValue;
use crate::params::ReshapeParams;
use crate::program::{CustomUniform, InputNames, KernelProgram};
use crate::shape::{Shape, compute_strides};

const DECODE_FN: &str = "inputCoordsFromReshapedOutCoords";
const FLAT_INDEX_FN: &str = "getFlatIndex";

/// Re-lays a packed `(b, r, c)` tensor as another packed `(b', r', c')`
/// with the same element count.
///
/// Each of the four lanes of an output texel maps to an arbitrary input
/// texel, so every lane is gathered separately through its flat index.
#[derive(Debug, Clone)]
pub struct ReshapePackedProgram {
    params: ReshapeParams,
    enable_shape_uniforms: bool,
}

impl ReshapePackedProgram {
    /// Build with the default configuration.
    pub fn new(params: ReshapeParams) -> Result<Self> {
        Self::with_config(params, &SynthesisConfig::default())
    }

    /// Build with an explicit configuration.
    pub fn with_config(params: ReshapeParams, config: &SynthesisConfig) -> Result<Self> {
        Ok(Self {
            enable_shape_uniforms: config.enable_shape_uniforms(params.output_shape().len()),
            params,
        })
    }

    /// Shapes being converted
    pub fn params(&self) -> &ReshapeParams {
        &self.params
    }

    /// Value for the `inputShape` uniform.
    pub fn uniform_values(&self) -> Vec<UniformValue> {
        vec![UniformValue::IVec3(self.params.input_shape())]
    }

    /// `(r, c, d)` of the input element at a flat index.
    fn decode_function(&self) -> Function {
        let (s0, s1): (Expr, Expr) = if self.enable_shape_uniforms {
            let dim = |i: i32| ident("inputShape").at(int(i));
            (dim(2).mul(dim(1)), dim(2))
        } else {
            let strides = compute_strides(&self.params.input_shape());
            (int(strides[0]), int(strides[1]))
        };

        let mut body = SnippetBuilder::new();
        body.declare_init(Ty::Int, "r", ident("index").div(s0.clone()))
            .sub_assign("index", ident("r").mul(s0))
            .declare_init(Ty::Int, "c", ident("index").div(s1.clone()))
            .declare_init(Ty::Int, "d", ident("index").sub(ident("c").mul(s1)))
            .ret(construct(
                Ty::IVec3,
                vec![ident("r"), ident("c"), ident("d")],
            ));
        Function::new(
            Ty::IVec3,
            DECODE_FN,
            vec![Param::new(Ty::Int, "index")],
            body.finish(),
        )
    }

    /// Flat index of an output coordinate.
    fn flat_index_function(&self) -> Function {
        let (s0, s1) = if self.enable_shape_uniforms {
            let stride = |i: i32| ident("outShapeStrides").at(int(i));
            (stride(0), stride(1))
        } else {
            let strides = compute_strides(&self.params.output_shape());
            (int(strides[0]), int(strides[1]))
        };
        let coords = |c: &'static str| ident("coords").swizzle(c);
        let mut body = SnippetBuilder::new();
        body.ret(
            coords("x")
                .mul(s0)
                .add(coords("y").mul(s1))
                .add(coords("z")),
        );
        Function::new(
            Ty::Int,
            FLAT_INDEX_FN,
            vec![Param::new(Ty::IVec3, "coords")],
            body.finish(),
        )
    }

    fn emit_lane(b: &mut SnippetBuilder, lane: i32) {
        let this_rc = || ident("thisRC");
        b.assign("thisRC", ident("rc"));
        if lane % 2 == 1 {
            b.add_assign(this_rc().swizzle("z"), int(1));
        }
        if lane > 1 {
            b.add_assign(this_rc().swizzle("y"), int(1));
        }

        let gather = |b: &mut SnippetBuilder| {
            let input_rc = |c: &'static str| ident("inputRC").swizzle(c);
            b.assign("flatIndex", call(FLAT_INDEX_FN, vec![this_rc()]))
                .assign("inputRC", call(DECODE_FN, vec![ident("flatIndex")]))
                .assign(
                    "inputRCInnerDims",
                    construct(
                        Ty::Vec2,
                        vec![
                            call("float", vec![input_rc("y")]),
                            call("float", vec![input_rc("z")]),
                        ],
                    ),
                )
                .assign(
                    ident("result").at(int(lane)),
                    call(
                        "getChannel",
                        vec![
                            call("getA", vec![input_rc("x"), input_rc("y"), input_rc("z")]),
                            ident("inputRCInnerDims"),
                        ],
                    ),
                );
        };

        if lane == 0 {
            gather(b);
        } else {
            let in_bounds = this_rc()
                .swizzle("y")
                .lt(ident("rows"))
                .and(this_rc().swizzle("z").lt(ident("cols")));
            b.if_then(in_bounds, gather);
        }
    }
}

impl KernelProgram for ReshapePackedProgram {
    fn name(&self) -> &'static str {
        "ReshapePacked"
    }

    fn input_names(&self) -> Vec<String> {
        InputNames::operands(&["A"]).without_epilogue().finish()
    }

    fn output_shape(&self) -> Shape {
        Shape::from_slice(&self.params.output_shape())
    }

    fn custom_uniforms(&self) -> Vec<CustomUniform> {
        vec![CustomUniform::new("inputShape", Ty::IVec3)]
    }

    fn enable_shape_uniforms(&self) -> bool {
        self.enable_shape_uniforms
    }

    fn translation_unit(&self) -> TranslationUnit {
        let (rows, cols) = if self.enable_shape_uniforms {
            (ident("outShape").at(int(1)), ident("outShape").at(int(2)))
        } else {
            (
                int(self.params.output_shape()[1]),
                int(self.params.output_shape()[2]),
            )
        };

        let mut main = SnippetBuilder::new();
        main.declare_init(Ty::IVec3, "rc", call("getOutputCoords", vec![]))
            .declare_init(Ty::Vec4, "result", construct(Ty::Vec4, vec![float(0.0)]))
            .declare(Ty::IVec3, "thisRC")
            .declare_init(Ty::Int, "rows", rows)
            .declare_init(Ty::Int, "cols", cols)
            .declare(Ty::Int, "flatIndex")
            .declare(Ty::IVec3, "inputRC")
            .declare(Ty::Vec2, "inputRCInnerDims");
        for lane in 0..4 {
            Self::emit_lane(&mut main, lane);
        }
        main.eval(call("setOutput", vec![ident("result")]));

        let mut unit = TranslationUnit::new();
        unit.function(self.decode_function())
            .function(self.flat_index_function())
            .function(Function::main(main.finish()));
        unit
    }
}
