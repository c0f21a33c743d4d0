//! Packed 2-D convolution

use std::collections::BTreeSet;

use crate::config::SynthesisConfig;
use crate::error::Result;
use crate::glsl::TranslationUnit;
use crate::harness::UniformValue;
use crate::packing::{RowFetch, texel_fetch_sites};
use crate::params::{Conv2dInfo, Fusion};
use crate::program::{CustomUniform, KernelProgram};
use crate::shape::Shape;

use super::conv_common::{ConvVariant, conv_unit, conv_uniform_values, conv_uniforms, main_body};
use super::fused_inputs;

/// NHWC convolution over packed `x` and `W` with an optional fused epilogue
///
/// Each output texel holds two adjacent output columns for two adjacent
/// output channels. Input channels are consumed two at a time (`d1 += 2`),
/// filter columns two at a time per [`RowFetch`].
#[derive(Debug, Clone)]
pub struct Conv2dPackedProgram {
    info: Conv2dInfo,
    fusion: Fusion,
    fetch: RowFetch,
    enable_shape_uniforms: bool,
}

impl Conv2dPackedProgram {
    /// Build with the default configuration.
    ///
    /// Fails with [`Error::UnsupportedStride`](crate::error::Error::UnsupportedStride)
    /// for horizontal strides other than 1 and 2.
    pub fn new(info: Conv2dInfo, fusion: Fusion) -> Result<Self> {
        Self::with_config(info, fusion, &SynthesisConfig::default())
    }

    /// Build with an explicit configuration.
    pub fn with_config(info: Conv2dInfo, fusion: Fusion, config: &SynthesisConfig) -> Result<Self> {
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

    /// Resolved per-row fetch plan
    pub fn row_fetch(&self) -> &RowFetch {
        &self.fetch
    }

    /// Values for the custom uniforms, in declaration order.
    pub fn uniform_values(&self) -> Vec<UniformValue> {
        conv_uniform_values(&self.info)
    }

    /// Distinct texel slots fetched per filter row.
    pub fn fetch_sites(&self) -> BTreeSet<i32> {
        texel_fetch_sites(main_body(&self.translation_unit()))
    }
}

impl KernelProgram for Conv2dPackedProgram {
    fn name(&self) -> &'static str {
        "Conv2DPacked"
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
        conv_unit(&self.info, &self.fetch, &self.fusion, ConvVariant::Regular)
    }
}
