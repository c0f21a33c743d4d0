//! Typed-phase input binding order
//!
//! Texture inputs bind in a fixed order: operands, then the optional bias,
//! then the optional activation input. The phase markers make any other
//! order a type error:
//!
//! ```text
//! InputNames<Operands> ──bias()──► InputNames<Epilogue> ──activation()──► InputNames<Complete>
//! ```

use std::marker::PhantomData;

use crate::activation::Activation;

/// Phase: operand names only
#[derive(Debug)]
pub struct Operands;

/// Phase: bias decided, activation input pending
#[derive(Debug)]
pub struct Epilogue;

/// Phase: every input is known
#[derive(Debug)]
pub struct Complete;

/// Input names under construction, in binding order
#[derive(Debug)]
pub struct InputNames<Phase> {
    names: Vec<String>,
    _phase: PhantomData<Phase>,
}

impl<P> InputNames<P> {
    fn advance<Q>(self) -> InputNames<Q> {
        InputNames {
            names: self.names,
            _phase: PhantomData,
        }
    }

    fn push(&mut self, name: &str) {
        debug_assert!(
            !self.names.iter().any(|n| n == name),
            "duplicate input name {name}"
        );
        self.names.push(name.to_owned());
    }
}

impl InputNames<Operands> {
    /// Start with the kernel's operand textures.
    pub fn operands(operands: &[&str]) -> Self {
        let mut names = InputNames {
            names: Vec::with_capacity(operands.len() + 2),
            _phase: PhantomData,
        };
        for name in operands {
            names.push(name);
        }
        names
    }

    /// Append `bias` when the kernel adds one.
    pub fn bias(mut self, add_bias: bool) -> InputNames<Epilogue> {
        if add_bias {
            self.push("bias");
        }
        self.advance()
    }

    /// No epilogue inputs at all.
    pub fn without_epilogue(self) -> InputNames<Complete> {
        self.advance()
    }
}

impl InputNames<Epilogue> {
    /// Append the activation's auxiliary input, if it reads one.
    pub fn activation(mut self, activation: &Activation) -> InputNames<Complete> {
        if let Some(aux) = activation.aux_input() {
            self.push(aux.name());
        }
        self.advance()
    }
}

impl InputNames<Complete> {
    /// Names in binding order.
    pub fn finish(self) -> Vec<String> {
        self.names
    }
}
