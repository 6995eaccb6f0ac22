//! Unit activation functions.

use super::{FunctionClass, FunctionKind, ParamSpec};

fn identity(x: f64, _: &[f64]) -> f64 {
    x
}

fn linear(x: f64, p: &[f64]) -> f64 {
    p[0] * x + p[1]
}

fn sigmoid(x: f64, p: &[f64]) -> f64 {
    1.0 / (1.0 + (-p[0] * x).exp())
}

fn tanh(x: f64, p: &[f64]) -> f64 {
    (p[0] * x).tanh()
}

fn step(x: f64, p: &[f64]) -> f64 {
    if x >= p[0] {
        1.0
    } else {
        0.0
    }
}

fn gaussian(x: f64, p: &[f64]) -> f64 {
    let d = x - p[0];
    (-d * d / (2.0 * p[1] * p[1])).exp()
}

/// Built-in activation classes. The first entry is the identity.
pub static CLASSES: &[FunctionClass] = &[
    FunctionClass::new(FunctionKind::Activation, "identity", identity, &[]),
    FunctionClass::new(
        FunctionKind::Activation,
        "linear",
        linear,
        &[ParamSpec::new("slope", 1.0), ParamSpec::new("offset", 0.0)],
    ),
    FunctionClass::new(
        FunctionKind::Activation,
        "sigmoid",
        sigmoid,
        &[ParamSpec::new("gain", 1.0)],
    ),
    FunctionClass::new(FunctionKind::Activation, "tanh", tanh, &[ParamSpec::new("gain", 1.0)]),
    FunctionClass::new(
        FunctionKind::Activation,
        "step",
        step,
        &[ParamSpec::new("threshold", 0.0)],
    ),
    FunctionClass::new(
        FunctionKind::Activation,
        "gaussian",
        gaussian,
        &[ParamSpec::new("center", 0.0), ParamSpec::new("width", 1.0)],
    ),
];

/// The identity class, default activation of every layer class.
pub fn identity_class() -> &'static FunctionClass {
    &CLASSES[0]
}
