//! Fused activation epilogues
//!
//! A fused kernel applies its activation to the accumulated `result` right
//! before `setOutput`. The activation body is a caller-supplied GLSL snippet;
//! [`FusedActivation`] maps the common activations to the packed snippets
//! below.
//!
//! PReLU and LeakyReLU read a second operand (`b`) from an auxiliary input
//! texture, which the program must bind after its operands and bias.

use crate::error::{Error, Result};
use crate::glsl::{AssignOp, Function, Param, SnippetBuilder, Stmt, Ty, call, ident};

/// `f(x) = x`
pub const LINEAR: &str = "return x;";

/// Logistic sigmoid, lane-wise.
pub const SIGMOID: &str = "return 1.0 / (1.0 + exp(-1.0 * x));";

/// ELU with alpha 1.
pub const ELU: &str = "
  vec4 result;

  result.r = (x.r >= 0.0) ? x.r : (exp(x.r) - 1.0);
  result.g = (x.g >= 0.0) ? x.g : (exp(x.g) - 1.0);
  result.b = (x.b >= 0.0) ? x.b : (exp(x.b) - 1.0);
  result.a = (x.a >= 0.0) ? x.a : (exp(x.a) - 1.0);

  return result;
";

/// ReLU that lets NaN lanes through unchanged.
pub const RELU: &str = "
  vec4 result = x * vec4(greaterThanEqual(x, vec4(0.0)));
  bvec4 isNaN = isnan(x);

  result.r = isNaN.r ? x.r : result.r;
  result.g = isNaN.g ? x.g : result.g;
  result.b = isNaN.b ? x.b : result.b;
  result.a = isNaN.a ? x.a : result.a;

  return result;
";

/// ReLU clamped at 6, NaN-preserving.
pub const RELU6: &str = "
  vec4 result = min(x, vec4(6.)) * vec4(greaterThanEqual(x, vec4(0.0)));
  bvec4 isNaN = isnan(x);

  result.r = isNaN.r ? x.r : result.r;
  result.g = isNaN.g ? x.g : result.g;
  result.b = isNaN.b ? x.b : result.b;
  result.a = isNaN.a ? x.a : result.a;

  return result;
";

/// PReLU over `a` with per-element slope `b`.
pub const PRELU_PACKED: &str = "
  vec4 aLessThanZero = vec4(lessThan(a, vec4(0.)));
  return (aLessThanZero * (b * a)) + ((vec4(1.0) - aLessThanZero) * a);
";

/// LeakyReLU; same body as PReLU with `b` read from the alpha texture.
pub const LEAKYRELU_PACKED: &str = PRELU_PACKED;

/// Name of the function every activation snippet is wrapped in.
pub const ACTIVATION_FN: &str = "activation";

/// Auxiliary input texture read by a parameterized activation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuxInput {
    /// Per-element PReLU slopes
    PreluWeights,
    /// LeakyReLU alpha
    LeakyReluAlpha,
}

impl AuxInput {
    /// Binding name of the auxiliary texture
    pub fn name(self) -> &'static str {
        match self {
            AuxInput::PreluWeights => "preluActivationWeights",
            AuxInput::LeakyReluAlpha => "leakyreluAlpha",
        }
    }

    /// Sampler reading the auxiliary texture at the output coordinates
    pub fn sampler(self) -> &'static str {
        match self {
            AuxInput::PreluWeights => "getPreluActivationWeightsAtOutCoords",
            AuxInput::LeakyReluAlpha => "getLeakyreluAlphaAtOutCoords",
        }
    }
}

/// Activation applied by a fused kernel epilogue
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Activation {
    /// No activation: no function, no call
    #[default]
    None,
    /// Body over `x`
    Generic(String),
    /// Body over `a` and the PReLU weights `b`
    Prelu(String),
    /// Body over `a` and the LeakyReLU alpha `b`
    LeakyRelu(String),
}

impl Activation {
    /// Auxiliary input this activation reads, if any.
    pub fn aux_input(&self) -> Option<AuxInput> {
        match self {
            Activation::Prelu(_) => Some(AuxInput::PreluWeights),
            Activation::LeakyRelu(_) => Some(AuxInput::LeakyReluAlpha),
            Activation::None | Activation::Generic(_) => None,
        }
    }

    /// Whether the epilogue applies anything.
    pub fn is_some(&self) -> bool {
        !matches!(self, Activation::None)
    }

    /// `vec4 activation(..)` wrapping the snippet, or `None`.
    pub fn function(&self) -> Option<Function> {
        self.function_typed(Ty::Vec4)
    }

    /// The activation function over values of type `ty` (`vec4` for packed
    /// kernels, `float` for scalar ones).
    pub fn function_typed(&self, ty: Ty) -> Option<Function> {
        let (param, template) = match self {
            Activation::None => return None,
            Activation::Generic(t) => ("x", t),
            Activation::Prelu(t) | Activation::LeakyRelu(t) => ("a", t),
        };

        let mut body = SnippetBuilder::new();
        if let Some(aux) = self.aux_input() {
            body.declare_init(ty, "b", call(aux.sampler(), vec![]));
        }
        body.raw(template.clone());

        Some(Function::new(
            ty,
            ACTIVATION_FN,
            vec![Param::new(ty, param)],
            body.finish(),
        ))
    }

    /// `target = activation(target);`, or `None`.
    pub fn apply(&self, target: &str) -> Option<Stmt> {
        if !self.is_some() {
            return None;
        }
        Some(Stmt::Assign {
            target: ident(target),
            op: AssignOp::Set,
            value: call(ACTIVATION_FN, vec![ident(target)]),
        })
    }
}

/// Activations with built-in packed snippets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FusedActivation {
    /// Identity
    Linear,
    /// max(x, 0)
    Relu,
    /// min(max(x, 0), 6)
    Relu6,
    /// Exponential linear unit
    Elu,
    /// Logistic sigmoid
    Sigmoid,
    /// Parametric ReLU with a weights texture
    Prelu,
    /// Leaky ReLU with an alpha texture
    LeakyRelu,
}

impl FusedActivation {
    /// Every fused activation, in declaration order.
    pub const ALL: [FusedActivation; 7] = [
        FusedActivation::Linear,
        FusedActivation::Relu,
        FusedActivation::Relu6,
        FusedActivation::Elu,
        FusedActivation::Sigmoid,
        FusedActivation::Prelu,
        FusedActivation::LeakyRelu,
    ];

    /// Lower-case name used by op attributes
    pub fn name(self) -> &'static str {
        match self {
            FusedActivation::Linear => "linear",
            FusedActivation::Relu => "relu",
            FusedActivation::Relu6 => "relu6",
            FusedActivation::Elu => "elu",
            FusedActivation::Sigmoid => "sigmoid",
            FusedActivation::Prelu => "prelu",
            FusedActivation::LeakyRelu => "leakyrelu",
        }
    }

    /// Parse an attribute name.
    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|a| a.name() == name)
            .ok_or_else(|| {
                Error::invalid_argument(
                    "activation",
                    format!("unknown fused activation {name:?}"),
                )
            })
    }

    /// The packed epilogue for this activation.
    pub fn packed(self) -> Activation {
        match self {
            FusedActivation::Linear => Activation::Generic(LINEAR.to_owned()),
            FusedActivation::Relu => Activation::Generic(RELU.to_owned()),
            FusedActivation::Relu6 => Activation::Generic(RELU6.to_owned()),
            FusedActivation::Elu => Activation::Generic(ELU.to_owned()),
            FusedActivation::Sigmoid => Activation::Generic(SIGMOID.to_owned()),
            FusedActivation::Prelu => Activation::Prelu(PRELU_PACKED.to_owned()),
            FusedActivation::LeakyRelu => Activation::LeakyRelu(LEAKYRELU_PACKED.to_owned()),
        }
    }
}

impl From<FusedActivation> for Activation {
    fn from(activation: FusedActivation) -> Self {
        activation.packed()
    }
}
