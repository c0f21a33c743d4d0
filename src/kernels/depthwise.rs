//! Packed depthwise convolution

use crate::config::SynthesisConfig;
use crate::error::{Error, Result};
use crate::glsl::TranslationUnit;
use crate::harness::UniformValue;
use crate::packing::RowFetch;
use crate::params::{Conv2dInfo, Fusion};
use crate::program::{CustomUniform, KernelProgram};
use crate::shape::Shape;

use super::conv_common::{ConvVariant, conv_unit, conv_uniform_values, conv_uniforms};
use super::fused_inputs;

/// Depthwise NHWC convolution: output channel `d2` reads input channel
/// `d2 / multiplier` with filter index `d2 % multiplier`.
#[derive(Debug, Clone)]
pub struct DepthwiseConv2dPackedProgram {
    info: Conv2dInfo,
    fusion: Fusion,
    fetch: RowFetch,
    enable_shape_uniforms: bool,
}

impl DepthwiseConv2dPackedProgram {
    /// Build with the default configuration.
    pub fn new(info: Conv2dInfo, fusion: Fusion) -> Result<Self> {
        Self::with_config(info, fusion, &SynthesisConfig::default())
    }

    /// Build with an explicit configuration.
    ///
    /// `out_channels` must be a multiple of `in_channels`.
    pub fn with_config(info: Conv2dInfo, fusion: Fusion, config: &SynthesisConfig) -> Result<Self> {
        if info.out_channels() % info.in_channels() != 0 {
            return Err(Error::invalid_argument(
                "filter",
                format!(
                    "depthwise output channels {} are not a multiple of input channels {}",
                    info.out_channels(), info.in_channels()
                ),
            ));
        }
        let fetch = RowFetch::new(&info)?;
        let enable_shape_uniforms = config.enable_shape_uniforms(info.out_shape().len());
        Ok(Self {
            info,
            fusion,
            fetch,
            enable_shape_uniforms,
        })
    }

    /// Convolution geometry
    pub fn info(&self) -> &Conv2dInfo {
        &self.info
    }

    /// Values for the custom uniforms, in declaration order.
    pub fn uniform_values(&self) -> Vec<UniformValue> {
        conv_uniform_values(&self.info)
    }
}

impl KernelProgram for DepthwiseConv2dPackedProgram {
    fn name(&self) -> &'static str {
        "DepthwiseConvPacked2D"
    }

    fn input_names(&self) -> Vec<String> {
        fused_inputs(&["x", "W"], &self.fusion)
    }

    fn output_shape(&self) -> Shape {
        self.info.out_shape().clone()
    }

    fn custom_uniforms(&self) -> Vec<CustomUniform> {
        conv_uniforms()
    }

    fn enable_shape_uniforms(&self) -> bool {
        self.enable_shape_uniforms
    }

    fn translation_unit(&self) -> TranslationUnit {
        conv_unit(&self.info, &self.fetch, &self.fusion, ConvVariant::Depthwise)
    }
}
