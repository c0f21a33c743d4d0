//! GLSL ES 1.00 / 3.00 spelling differences

/// Target shading language version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GlslVersion {
    /// GLSL ES 1.00
    WebGl1,
    /// GLSL ES 3.00
    #[default]
    WebGl2,
}

/// Version-dependent fragments spliced into the shader prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlslDifferences {
    /// `#version` directive, empty for WebGL1
    pub version: &'static str,
    /// Vertex attribute qualifier
    pub attribute: &'static str,
    /// Varying qualifier in the vertex stage
    pub varying_vs: &'static str,
    /// Varying qualifier in the fragment stage
    pub varying_fs: &'static str,
    /// 2-D texture lookup function
    pub texture2d: &'static str,
    /// Fragment output variable
    pub output: &'static str,
    /// Declaration of [`output`](Self::output), if it is not built in
    pub define_output: &'static str,
    /// NaN test
    pub define_special_nan: &'static str,
    /// Infinity test
    pub define_special_inf: &'static str,
    /// Round-half-away-from-zero helpers
    pub define_round: &'static str,
}

const WEBGL1_NAN: &str = "#define isnan(value) isnan_custom(value)
bool isnan_custom(float val) {
  return (val > 0. || val < 1. || val == 0.) ? false : true;
}
bvec4 isnan_custom(vec4 val) {
  return bvec4(isnan(val.x), isnan(val.y), isnan(val.z), isnan(val.w));
}";

const WEBGL1_INF: &str = "uniform float INFINITY;

bool isinf(float val) {
  return abs(val) == INFINITY;
}
bvec4 isinf(vec4 val) {
  return equal(abs(val), vec4(INFINITY));
}";

const WEBGL1_ROUND: &str = "int round(float value) {
  return int(floor(value + 0.5));
}

ivec4 round(vec4 value) {
  return ivec4(floor(value + vec4(0.5)));
}";

const WEBGL2_ROUND: &str = "#define round(value) newRound(value)
int newRound(float value) {
  return int(floor(value + 0.5));
}

ivec4 newRound(vec4 value) {
  return ivec4(floor(value + vec4(0.5)));
}";

impl GlslVersion {
    /// The spelling table for this version.
    pub fn differences(self) -> GlslDifferences {
        match self {
            GlslVersion::WebGl2 => GlslDifferences {
                version: "#version 300 es",
                attribute: "in",
                varying_vs: "out",
                varying_fs: "in",
                texture2d: "texture",
                output: "outputColor",
                define_output: "out vec4 outputColor;",
                define_special_nan: "",
                define_special_inf: "",
                define_round: WEBGL2_ROUND,
            },
            GlslVersion::WebGl1 => GlslDifferences {
                version: "",
                attribute: "attribute",
                varying_vs: "varying",
                varying_fs: "varying",
                texture2d: "texture2D",
                output: "gl_FragColor",
                define_output: "",
                define_special_nan: WEBGL1_NAN,
                define_special_inf: WEBGL1_INF,
                define_round: WEBGL1_ROUND,
            },
        }
    }
}
