//! Packed elementwise unary op

use crate::activation::{ELU, LINEAR, RELU, RELU6, SIGMOID};
use crate::config::SynthesisConfig;
use crate::error::Result;
use crate::glsl::{Function, Param, SnippetBuilder, TranslationUnit, Ty, call, ident};
use crate::params::UnaryParams;
use crate::program::{InputNames, KernelProgram};
use crate::shape::Shape;

const OP_FN: &str = "unaryOperation";

/// Body of `vec4 unaryOperation(vec4 x)`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// Identity
    Linear,
    /// NaN-preserving ReLU
    Relu,
    /// NaN-preserving ReLU6
    Relu6,
    /// ELU with alpha 1
    Elu,
    /// Logistic sigmoid
    Sigmoid,
    /// Caller-supplied body over `vec4 x`, ending in a `return`
    Custom(String),
}

impl UnaryOp {
    /// GLSL body of the op
    pub fn snippet(&self) -> &str {
        match self {
            UnaryOp::Linear => LINEAR,
            UnaryOp::Relu => RELU,
            UnaryOp::Relu6 => RELU6,
            UnaryOp::Elu => ELU,
            UnaryOp::Sigmoid => SIGMOID,
            UnaryOp::Custom(body) => body,
        }
    }
}

/// Applies a [`UnaryOp`] to all four lanes of every texel of `A`.
#[derive(Debug, Clone)]
pub struct UnaryOpPackedProgram {
    params: UnaryParams,
    op: UnaryOp,
    enable_shape_uniforms: bool,
}

impl UnaryOpPackedProgram {
    /// Build with the default configuration.
    pub fn new(params: UnaryParams, op: UnaryOp) -> Result<Self> {
        Self::with_config(params, op, &SynthesisConfig::default())
    }

    /// Build with an explicit configuration.
    pub fn with_config(params: UnaryParams, op: UnaryOp, config: &SynthesisConfig) -> Result<Self> {
        Ok(Self {
            enable_shape_uniforms: config.enable_shape_uniforms(params.shape().len()),
            params,
            op,
        })
    }

    /// The op applied
    pub fn op(&self) -> &UnaryOp {
        &self.op
    }
}

impl KernelProgram for UnaryOpPackedProgram {
    fn name(&self) -> &'static str {
        "UnaryOpPacked"
    }

    fn input_names(&self) -> Vec<String> {
        InputNames::operands(&["A"]).without_epilogue().finish()
    }

    fn output_shape(&self) -> Shape {
        self.params.shape().clone()
    }

    fn enable_shape_uniforms(&self) -> bool {
        self.enable_shape_uniforms
    }

    fn translation_unit(&self) -> TranslationUnit {
        let mut op = SnippetBuilder::new();
        op.raw(self.op.snippet());

        let mut main = SnippetBuilder::new();
        main.declare_init(Ty::Vec4, "x", call("getAAtOutCoords", vec![]))
            .declare_init(Ty::Vec4, "y", call(OP_FN, vec![ident("x")]))
            .eval(call("setOutput", vec![ident("y")]));

        let mut unit = TranslationUnit::new();
        unit.function(Function::new(
            Ty::Vec4,
            OP_FN,
            vec![Param::new(Ty::Vec4, "x")],
            op.finish(),
        ))
        .function(Function::main(main.finish()));
        unit
    }
}
