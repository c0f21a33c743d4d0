//! Integration tests for the packed Conv2D program.

mod common;

use std::collections::BTreeSet;

use common::{assert_structurally_valid, assert_valid_glsl};
use packgl::activation::FusedActivation;
use packgl::config::SynthesisConfig;
use packgl::error::Error;
use packgl::kernels::Conv2dPackedProgram;
use packgl::packing::{FetchStrategy, Parity};
use packgl::params::{Conv2dInfo, Fusion, Padding, PaddingMode, Spatial};
use packgl::program::KernelProgram;

fn conv(
    size: i32,
    filter: i32,
    stride: i32,
    dilation: i32,
    pad: i32,
    channels: (i32, i32),
) -> Conv2dInfo {
    Conv2dInfo::new(
        &[1, size, size, channels.0],
        &[filter, filter, channels.0, channels.1],
        Spatial::square(stride),
        Spatial::square(dilation),
        PaddingMode::Explicit(Padding::uniform(pad)),
    )
    .unwrap()
}

// ============================================================================
// Worked example
// ============================================================================

#[test]
fn test_three_by_three_stride_one_odd_padding() {
    let program = Conv2dPackedProgram::new(conv(8, 3, 1, 1, 1, (4, 4)), Fusion::none()).unwrap();

    let fetch = program.row_fetch();
    assert_eq!(fetch.padding, Parity::Odd);
    assert_eq!(fetch.first, FetchStrategy::ShiftedFirst);
    assert_eq!(fetch.second, FetchStrategy::AlignedSecond);
    assert_eq!(program.fetch_sites(), BTreeSet::from([0, 2]));

    let d = program.descriptor();
    assert_eq!(d.name, "Conv2DPacked");
    assert_eq!(d.input_names, ["x", "W"]);
    assert_eq!(d.output_shape.as_slice(), &[1, 8, 8, 4]);
    assert!(d.packed_inputs && d.packed_output);
    assert!(d.source.contains("xC1 = xTexelC0;"));
    assert!(d.source.contains("xC2 = vec4(xTexelC0.zw, xTexelC2.xy);"));
    assert!(d.source.contains("xR = xRCorner + r * dilations[0];"));
    assert!(d.source.contains("ivec2 xRCCorner = coords.yz * strides - pads;"));
    assert!(d.source.contains("setOutput(result);"));
    assert_structurally_valid(&d.source);
    d.verify().unwrap();
}

#[test]
fn test_accumulation_per_column() {
    let d = Conv2dPackedProgram::new(conv(8, 3, 1, 1, 1, (4, 4)), Fusion::none())
        .unwrap()
        .descriptor();
    for c in 0..3 {
        assert!(d.source.contains(&format!("wTexel = getW(r, {c}, d1, d2);")));
        assert!(d.source.contains(&format!(
            "dotProd += xC{c}.xxzz * vec4(wTexel.xy, wTexel.xy);"
        )));
        assert!(d.source.contains(&format!(
            "dotProd += xC{c}.yyww * vec4(wTexel.zw, wTexel.zw);"
        )));
    }
    assert_eq!(d.source.matches("if (d1 + 1 < 4) {").count(), 3);
}

// ============================================================================
// Fetch reuse
// ============================================================================

#[test]
fn test_fetch_sites_grow_with_filter_width() {
    for width in [1, 3, 5, 7] {
        let program =
            Conv2dPackedProgram::new(conv(16, width, 1, 1, 1, (2, 2)), Fusion::none()).unwrap();
        let sites = program.fetch_sites();
        assert_eq!(sites.len() as i32, (width + 1) / 2, "filter width {width}");
        assert!(sites.iter().all(|s| s % 2 == 0));

        let source = program.descriptor().source;
        for c in (2..width).step_by(2) {
            assert!(
                source.contains(&format!("xC{c} = vec4(xTexelC{}.zw, xTexelC{c}.xy);", c - 2)),
                "xC{c} should reuse xTexelC{}",
                c - 2
            );
        }
    }
}

#[test]
fn test_even_filter_width_fetches_once_per_pair() {
    for width in [2, 4, 6] {
        let program =
            Conv2dPackedProgram::new(conv(16, width, 1, 1, 1, (2, 2)), Fusion::none()).unwrap();
        let sites = program.fetch_sites();
        assert_eq!(sites.len() as i32, width / 2, "filter width {width}");
        assert_eq!(sites.len() as i32, program.row_fetch().pairs());
    }
}

#[test]
fn test_even_padding_fetches_every_pair() {
    let program = Conv2dPackedProgram::new(conv(9, 3, 1, 1, 0, (2, 2)), Fusion::none()).unwrap();
    assert_eq!(program.fetch_sites(), BTreeSet::from([0, 1, 2]));
    let source = program.descriptor().source;
    assert!(source.contains("xC0 = xTexelC0;"));
    assert!(source.contains("xCOffset = xC + imod(pads[1], 2) + 2;"));
}

#[test]
fn test_dilated_odd_padding_composes_from_previous() {
    let d = Conv2dPackedProgram::new(conv(16, 3, 1, 2, 1, (2, 2)), Fusion::none())
        .unwrap()
        .descriptor();
    assert!(d.source.contains("xC = xCCorner + 4;"));
    assert!(d.source.contains("previous = getX(batch, xR, xCOffset, d1);"));
    assert!(d.source.contains("xC2 = vec4(previous.zw, xTexelC2.xy);"));
    assert!(d.source.contains("xC0 = vec4(0.0, 0.0, xTexelC0.xy);"));
}

#[test]
fn test_stride_two() {
    let program = Conv2dPackedProgram::new(conv(9, 3, 2, 1, 0, (2, 2)), Fusion::none()).unwrap();
    let fetch = program.row_fetch();
    assert_eq!(fetch.first, FetchStrategy::StridedAlignedFirst);
    assert_eq!(fetch.second, FetchStrategy::StridedAlignedSecond);
    let source = program.descriptor().source;
    assert!(source.contains("xCOffset = xC + strides[1];"));
    assert!(source.contains("xC0 = vec4(xTexelC0.xy, xTexelC1.xy);"));
    assert!(source.contains("xC1 = vec4(xTexelC0.zw, xTexelC1.zw);"));
}

// ============================================================================
// Parity coverage
// ============================================================================

#[test]
fn test_parity_grid_is_valid_glsl() {
    for filter in [1, 3, 5, 7] {
        for stride in [1, 2] {
            for pad in [0, 1] {
                for dilation in [1, 2, 3] {
                    let info = conv(24, filter, stride, dilation, pad, (3, 4));
                    let program = Conv2dPackedProgram::new(info, Fusion::none()).unwrap();
                    let d = program.descriptor();
                    assert_valid_glsl(&d, &[4, 4]);
                    assert_eq!(
                        d.source.matches("wTexel = getW(").count() as i32,
                        filter,
                        "one weight read per filter column"
                    );
                }
            }
        }
    }
}

#[test]
fn test_unsupported_strides() {
    for stride in [3, 4] {
        let err = Conv2dPackedProgram::new(conv(16, 3, stride, 1, 1, (2, 2)), Fusion::none())
            .unwrap_err();
        assert_eq!(err, Error::UnsupportedStride { stride });
    }
}

// ============================================================================
// Fused epilogue
// ============================================================================

#[test]
fn test_activation_wiring() {
    let cases = [
        (FusedActivation::Prelu, false, vec!["x", "W", "preluActivationWeights"]),
        (FusedActivation::Prelu, true, vec!["x", "W", "bias", "preluActivationWeights"]),
        (FusedActivation::LeakyRelu, false, vec!["x", "W", "leakyreluAlpha"]),
        (FusedActivation::LeakyRelu, true, vec!["x", "W", "bias", "leakyreluAlpha"]),
        (FusedActivation::Relu, true, vec!["x", "W", "bias"]),
        (FusedActivation::Sigmoid, false, vec!["x", "W"]),
    ];
    for (activation, bias, expected) in cases {
        let fusion = Fusion::none().with_bias(bias).with_activation(activation);
        let d = Conv2dPackedProgram::new(conv(8, 3, 1, 1, 1, (4, 4)), fusion)
            .unwrap()
            .descriptor();
        assert_eq!(d.input_names, expected, "{activation:?} bias={bias}");
        assert!(d.source.contains("vec4 activation(vec4 "));
        assert!(d.source.contains("result = activation(result);"));
        d.verify().unwrap();
    }
}

#[test]
fn test_epilogue_order() {
    let fusion = Fusion::none()
        .with_bias(true)
        .with_activation(FusedActivation::Relu6);
    let source = Conv2dPackedProgram::new(conv(8, 3, 1, 1, 1, (4, 4)), fusion)
        .unwrap()
        .descriptor()
        .source;
    let eps = source.find("vec4 result = dotProd - vec4(0.000000000000001);").unwrap();
    let bias = source.find("result += getBiasAtOutCoords();").unwrap();
    let act = source.find("result = activation(result);").unwrap();
    let out = source.find("setOutput(result);").unwrap();
    assert!(eps < bias && bias < act && act < out);
}

#[test]
fn test_no_activation_leaves_no_trace() {
    let d = Conv2dPackedProgram::new(conv(8, 3, 1, 1, 1, (4, 4)), Fusion::none().with_bias(true))
        .unwrap()
        .descriptor();
    assert_eq!(d.input_names, ["x", "W", "bias"]);
    assert!(!d.source.contains("activation"));
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_shape_uniform_flag_is_recorded() {
    let config = SynthesisConfig::default().with_shape_uniforms(true);
    let with = Conv2dPackedProgram::with_config(conv(8, 3, 1, 1, 1, (4, 4)), Fusion::none(), &config)
        .unwrap()
        .descriptor();
    let without = Conv2dPackedProgram::new(conv(8, 3, 1, 1, 1, (4, 4)), Fusion::none())
        .unwrap()
        .descriptor();
    assert!(with.enable_shape_uniforms);
    assert!(!without.enable_shape_uniforms);
    assert_eq!(with.source, without.source);
}

#[test]
fn test_same_padding_resolves_to_odd_left() {
    let info = Conv2dInfo::new(
        &[1, 9, 9, 4],
        &[3, 3, 4, 4],
        Spatial::square(1),
        Spatial::square(1),
        PaddingMode::Same,
    )
    .unwrap();
    assert_eq!(info.padding(), Padding::uniform(1));
    assert!(info.padding_odd());
    let program = Conv2dPackedProgram::new(info, Fusion::none()).unwrap();
    assert_eq!(program.row_fetch().padding, Parity::Odd);
}
