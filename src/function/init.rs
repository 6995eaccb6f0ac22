//! Connection weight initializers.
//!
//! Each class is sampled once per connection at creation time. The class's
//! draw declares what random input the routine receives.

use super::{Draw, FunctionClass, FunctionKind, ParamSpec};

fn constant(_: f64, p: &[f64]) -> f64 {
    p[0]
}

fn uniform(u: f64, p: &[f64]) -> f64 {
    p[0] + u * (p[1] - p[0])
}

fn gaussian(z: f64, p: &[f64]) -> f64 {
    p[0] + z * p[1]
}

/// Built-in weight-initializer classes.
pub static CLASSES: &[FunctionClass] = &[
    FunctionClass::new(
        FunctionKind::WeightInit,
        "constant",
        constant,
        &[ParamSpec::new("value", 0.0)],
    ),
    FunctionClass::new(
        FunctionKind::WeightInit,
        "uniform",
        uniform,
        &[ParamSpec::new("min", 0.0), ParamSpec::new("max", 1.0)],
    )
    .with_draw(Draw::Uniform),
    FunctionClass::new(
        FunctionKind::WeightInit,
        "gaussian",
        gaussian,
        &[ParamSpec::new("mean", 0.0), ParamSpec::new("std_dev", 0.1)],
    )
    .with_draw(Draw::Normal),
];

#[cfg(test)]
mod tests {
    use crate::function::{FunctionInstance, FunctionKind};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_constant() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let f = FunctionInstance::with_params(FunctionKind::WeightInit, "constant", &[0.25]).unwrap();
        assert_eq!(f.sample(&mut rng), 0.25);
    }

    #[test]
    fn test_gaussian_spread() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let f = FunctionInstance::with_params(FunctionKind::WeightInit, "gaussian", &[5.0, 0.1]).unwrap();
        let samples: Vec<f64> = (0..1000).map(|_| f.sample(&mut rng)).collect();
        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        assert!((mean - 5.0).abs() < 0.05);
        assert!(samples.iter().any(|&x| x != samples[0]));
    }
}
