//! Learning-rate schedules, evaluated at the current training time.

use super::{FunctionClass, FunctionKind, ParamSpec};

fn constant(_: f64, p: &[f64]) -> f64 {
    p[0]
}

fn exponential(t: f64, p: &[f64]) -> f64 {
    p[0] * (-t / p[1]).exp()
}

fn linear(t: f64, p: &[f64]) -> f64 {
    if p[2] <= 0.0 || t >= p[2] {
        return p[1];
    }
    p[0] + (p[1] - p[0]) * t / p[2]
}

fn inverse(t: f64, p: &[f64]) -> f64 {
    p[0] / (1.0 + t / p[1])
}

/// Built-in learning-rate classes.
pub static CLASSES: &[FunctionClass] = &[
    FunctionClass::new(
        FunctionKind::LearningRate,
        "constant",
        constant,
        &[ParamSpec::new("rate", 0.05)],
    ),
    FunctionClass::new(
        FunctionKind::LearningRate,
        "exponential",
        exponential,
        &[ParamSpec::new("initial", 0.1), ParamSpec::positive("time_constant", 1000.0)],
    ),
    FunctionClass::new(
        FunctionKind::LearningRate,
        "linear",
        linear,
        &[
            ParamSpec::new("initial", 0.1),
            ParamSpec::new("final", 0.01),
            ParamSpec::new("epochs", 100.0),
        ],
    ),
    FunctionClass::new(
        FunctionKind::LearningRate,
        "inverse",
        inverse,
        &[ParamSpec::new("initial", 0.1), ParamSpec::positive("time_constant", 100.0)],
    ),
];

#[cfg(test)]
mod tests {
    use crate::function::{FunctionInstance, FunctionKind};

    fn rate(name: &str, params: &[f64]) -> FunctionInstance {
        FunctionInstance::with_params(FunctionKind::LearningRate, name, params).unwrap()
    }

    #[test]
    fn test_constant() {
        let f = rate("constant", &[0.05]);
        assert_eq!(f.evaluate(0.0), 0.05);
        assert_eq!(f.evaluate(500.0), 0.05);
    }

    #[test]
    fn test_exponential_decay() {
        let f = rate("exponential", &[0.1, 10.0]);
        assert!((f.evaluate(0.0) - 0.1).abs() < 1e-12);
        assert!((f.evaluate(10.0) - 0.1 / std::f64::consts::E).abs() < 1e-12);
    }

    #[test]
    fn test_linear_clamps() {
        let f = rate("linear", &[0.1, 0.0, 10.0]);
        assert!((f.evaluate(5.0) - 0.05).abs() < 1e-12);
        assert_eq!(f.evaluate(20.0), 0.0);
    }

    #[test]
    fn test_inverse() {
        let f = rate("inverse", &[1.0, 1.0]);
        assert_eq!(f.evaluate(1.0), 0.5);
    }
}
