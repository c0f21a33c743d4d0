//! Every packed program, wrapped with stub samplers, must parse and validate
//! as a GLSL 4.50 fragment shader.

mod common;

use common::{assert_valid_glsl, validate_glsl};
use packgl::activation::{Activation, FusedActivation};
use packgl::config::SynthesisConfig;
use packgl::kernels::{
    Conv2dPackedProgram, DepthwiseConv2dPackedProgram, MatMulPackedProgram, ReshapePackedProgram,
    UnaryOp, UnaryOpPackedProgram,
};
use packgl::params::{
    Conv2dInfo, Fusion, MatMulParams, Padding, PaddingMode, ReshapeParams, Spatial, UnaryParams,
};
use packgl::program::KernelProgram;

/// No activation, then each fused activation in turn.
fn activations() -> Vec<Activation> {
    std::iter::once(Activation::None)
        .chain(FusedActivation::ALL.into_iter().map(Activation::from))
        .collect()
}

fn conv_info(depthwise: bool, filter: i32, stride: i32, pad: i32, dilation: i32) -> Conv2dInfo {
    let build = if depthwise {
        Conv2dInfo::depthwise
    } else {
        Conv2dInfo::new
    };
    build(
        &[1, 24, 24, 3],
        &[filter, filter, 3, 2],
        Spatial::square(stride),
        Spatial::square(dilation),
        PaddingMode::Explicit(Padding::uniform(pad)),
    )
    .unwrap()
}

// ============================================================================
// Convolutions
// ============================================================================

#[test]
fn test_conv_grid_with_epilogues() {
    let activations = activations();
    let mut case = 0;
    for depthwise in [false, true] {
        for filter in [1, 3, 5, 7] {
            for stride in [1, 2] {
                for pad in [0, 1] {
                    for dilation in [1, 2, 3] {
                        let info = conv_info(depthwise, filter, stride, pad, dilation);
                        let fusion = Fusion::none()
                            .with_bias(case % 2 == 0)
                            .with_activation(activations[case % activations.len()].clone());
                        case += 1;

                        let d = if depthwise {
                            DepthwiseConv2dPackedProgram::new(info, fusion)
                                .unwrap()
                                .descriptor()
                        } else {
                            Conv2dPackedProgram::new(info, fusion).unwrap().descriptor()
                        };
                        if let Err(e) = validate_glsl(&d, &[4, 4]) {
                            panic!(
                                "depthwise {depthwise} filter {filter} stride {stride} \
                                 pad {pad} dilation {dilation}: {e}"
                            );
                        }
                    }
                }
            }
        }
    }
}

#[test]
fn test_every_activation_on_conv() {
    for activation in activations() {
        for add_bias in [false, true] {
            let fusion = Fusion::none()
                .with_bias(add_bias)
                .with_activation(activation.clone());
            let d = Conv2dPackedProgram::new(conv_info(false, 3, 1, 1, 1), fusion)
                .unwrap()
                .descriptor();
            assert_valid_glsl(&d, &[4, 4]);
        }
    }
}

// ============================================================================
// MatMul, Reshape, UnaryOp
// ============================================================================

#[test]
fn test_matmul_layouts() {
    for ta in [false, true] {
        for tb in [false, true] {
            for (batch_a, batch_b) in [(2, 2), (1, 3), (3, 1)] {
                let a = if ta { [batch_a, 5, 4] } else { [batch_a, 4, 5] };
                let b = if tb { [batch_b, 6, 5] } else { [batch_b, 5, 6] };
                let params = MatMulParams::new(&a, &b, ta, tb).unwrap();
                for activation in activations() {
                    let fusion = Fusion::none().with_bias(true).with_activation(activation);
                    let d = MatMulPackedProgram::new(params.clone(), fusion)
                        .unwrap()
                        .descriptor();
                    assert_valid_glsl(&d, &[3, 3]);
                }
            }
        }
    }
}

#[test]
fn test_reshape_with_and_without_shape_uniforms() {
    for use_shape_uniforms in [false, true] {
        let config = SynthesisConfig::default().with_shape_uniforms(use_shape_uniforms);
        for (input, output) in [([1, 4, 6], [2, 3, 4]), ([2, 3, 5], [1, 5, 6]), ([1, 1, 7], [1, 7, 1])] {
            let params = ReshapeParams::new(&input, &output).unwrap();
            let d = ReshapePackedProgram::with_config(params, &config)
                .unwrap()
                .descriptor();
            assert_eq!(d.enable_shape_uniforms, use_shape_uniforms);
            assert_valid_glsl(&d, &[3]);
        }
    }
}

#[test]
fn test_unary_ops() {
    let ops = [
        UnaryOp::Linear,
        UnaryOp::Relu,
        UnaryOp::Relu6,
        UnaryOp::Elu,
        UnaryOp::Sigmoid,
        UnaryOp::Custom("return abs(x);".into()),
    ];
    for op in ops {
        for shape in [&[7][..], &[2, 3], &[2, 3, 4], &[1, 2, 3, 4]] {
            let d = UnaryOpPackedProgram::new(UnaryParams::new(shape).unwrap(), op.clone())
                .unwrap()
                .descriptor();
            assert_valid_glsl(&d, &[shape.len()]);
        }
    }
}

#[test]
fn test_type_errors_are_caught() {
    let mut d = UnaryOpPackedProgram::new(UnaryParams::new(&[2, 3]).unwrap(), UnaryOp::Linear)
        .unwrap()
        .descriptor();
    d.source = d.source.replace("vec4 y = unaryOperation(x);", "int y = unaryOperation(x);");
    assert!(validate_glsl(&d, &[2]).is_err());
}
