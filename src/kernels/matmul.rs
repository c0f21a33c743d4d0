//! Packed batched matrix multiplication

use crate::config::SynthesisConfig;
use crate::error::Result;
use crate::glsl::{
    Expr, Function, Param, SnippetBuilder, TranslationUnit, Ty, call, construct, float, ident, int,
};
use crate::params::{Fusion, MatMulParams};
use crate::program::KernelProgram;
use crate::shape::{Shape, ceil_div};

use super::{apply_epilogue, fused_inputs, unit_with_activation};

const DOT_FN: &str = "dot2x2ARowBCol";

/// `(batch, M, K) x (batch, K, N)` over 2×2-packed operands
///
/// Each loop step reads one texel of A and one of B, covering two values
/// of the shared dimension, and accumulates a 2×2 output block.
#[derive(Debug, Clone)]
pub struct MatMulPackedProgram {
    params: MatMulParams,
    fusion: Fusion,
    enable_shape_uniforms: bool,
}

impl MatMulPackedProgram {
    /// Build with the default configuration.
    pub fn new(params: MatMulParams, fusion: Fusion) -> Result<Self> {
        Self::with_config(params, fusion, &SynthesisConfig::default())
    }

    /// Build with an explicit configuration.
    pub fn with_config(params: MatMulParams, fusion: Fusion, config: &SynthesisConfig) -> Result<Self> {
        let enable_shape_uniforms = config.enable_shape_uniforms(params.output_shape().len());
        Ok(Self {
            params,
            fusion,
            enable_shape_uniforms,
        })
    }

    /// Operand parameters
    pub fn params(&self) -> &MatMulParams {
        &self.params
    }

    /// Loop trip count: texels along the shared dimension.
    pub fn shared_dim_packed(&self) -> i32 {
        ceil_div(self.params.shared_dim(), 2)
    }

    /// Batch index for one operand; the smaller batch is clamped.
    fn batch_index(own: i32, other: i32) -> Expr {
        let batch = ident("rc").swizzle("x");
        if own < other {
            call(
                "int",
                vec![call(
                    "min",
                    vec![call("float", vec![batch]), float(f64::from(own - 1))],
                )],
            )
        } else {
            batch
        }
    }

    fn dot_function(&self) -> Function {
        let p = &self.params;
        let i2 = || ident("i").mul(int(2));
        let rc = |c: &'static str| ident("rc").swizzle(c);

        let a_coords = if p.transpose_a() {
            vec![ident("batchA"), i2(), rc("y")]
        } else {
            vec![ident("batchA"), rc("y"), i2()]
        };
        let b_coords = if p.transpose_b() {
            vec![ident("batchB"), rc("z"), i2()]
        } else {
            vec![ident("batchB"), i2(), rc("z")]
        };
        let (a0, a1) = if p.transpose_a() {
            ("xxyy", "zzww")
        } else {
            ("xxzz", "yyww")
        };
        let (b0, b1) = if p.transpose_b() {
            ("xzxz", "ywyw")
        } else {
            ("xyxy", "zwzw")
        };

        let mut body = SnippetBuilder::new();
        body.declare_init(Ty::Vec4, "result", construct(Ty::Vec4, vec![int(0)]));
        body.for_range("i", int(self.shared_dim_packed()), 1, |b| {
            b.declare_init(Ty::Int, "batchA", Self::batch_index(p.batch_a(), p.batch_b()))
                .declare_init(Ty::Int, "batchB", Self::batch_index(p.batch_b(), p.batch_a()))
                .declare_init(Ty::Vec4, "a", call("getMatrixA", a_coords))
                .declare_init(Ty::Vec4, "b", call("getMatrixB", b_coords))
                .add_assign("result", ident("a").swizzle(a0).mul(ident("b").swizzle(b0)))
                .add_assign("result", ident("a").swizzle(a1).mul(ident("b").swizzle(b1)));
        });
        body.ret(ident("result"));

        Function::new(
            Ty::Vec4,
            DOT_FN,
            vec![Param::new(Ty::IVec3, "rc")],
            body.finish(),
        )
    }
}

impl KernelProgram for MatMulPackedProgram {
    fn name(&self) -> &'static str {
        "MatMulPacked"
    }

    fn input_names(&self) -> Vec<String> {
        fused_inputs(&["matrixA", "matrixB"], &self.fusion)
    }

    fn output_shape(&self) -> Shape {
        self.params.output_shape().clone()
    }

    fn enable_shape_uniforms(&self) -> bool {
        self.enable_shape_uniforms
    }

    fn translation_unit(&self) -> TranslationUnit {
        let mut unit = unit_with_activation(&self.fusion);
        unit.constant(
            Ty::Float,
            "sharedDimension",
            float(f64::from(self.shared_dim_packed())),
        );
        unit.function(self.dot_function());

        let mut main = SnippetBuilder::new();
        main.declare_init(Ty::IVec3, "rc", call("getOutputCoords", vec![]))
            .declare_init(Ty::Vec4, "result", call(DOT_FN, vec![ident("rc")]));
        apply_epilogue(&mut main, &self.fusion);
        main.eval(call("setOutput", vec![ident("result")]));
        unit.function(Function::main(main.finish()));
        unit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(a: &[i32], b: &[i32], ta: bool, tb: bool) -> String {
        let params = MatMulParams::new(a, b, ta, tb).unwrap();
        MatMulPackedProgram::new(params, Fusion::none())
            .unwrap()
            .descriptor()
            .source
    }

    #[test]
    fn test_plain_layout() {
        let src = source(&[1, 4, 5], &[1, 5, 6], false, false);
        assert!(src.contains("const float sharedDimension = 3.0;"));
        assert!(src.contains("for (int i = 0; i < 3; i++) {"));
        assert!(src.contains("vec4 a = getMatrixA(batchA, rc.y, i * 2);"));
        assert!(src.contains("vec4 b = getMatrixB(batchB, i * 2, rc.z);"));
        assert!(src.contains("result += a.xxzz * b.xyxy;"));
        assert!(src.contains("result += a.yyww * b.zwzw;"));
        assert!(src.contains("int batchA = rc.x;"));
    }

    #[test]
    fn test_transposed_layout() {
        let src = source(&[1, 5, 4], &[1, 6, 5], true, true);
        assert!(src.contains("vec4 a = getMatrixA(batchA, i * 2, rc.y);"));
        assert!(src.contains("vec4 b = getMatrixB(batchB, rc.z, i * 2);"));
        assert!(src.contains("result += a.xxyy * b.xzxz;"));
        assert!(src.contains("result += a.zzww * b.ywyw;"));
    }

    #[test]
    fn test_batch_clamp() {
        let src = source(&[1, 2, 2], &[3, 2, 2], false, false);
        assert!(src.contains("int batchA = int(min(float(rc.x), 0.0));"));
        assert!(src.contains("int batchB = rc.x;"));

        let src = source(&[4, 2, 2], &[1, 2, 2], false, false);
        assert!(src.contains("int batchA = rc.x;"));
        assert!(src.contains("int batchB = int(min(float(rc.x), 0.0));"));
    }
}
