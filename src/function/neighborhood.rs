//! SOM neighborhood functions.
//!
//! The input is the coordinate distance between a unit and the winner.
//! Parameter 0 is the current training time; the width (or radius) shrinks
//! as `w0 * exp(-t / T)`.

use super::{FunctionClass, FunctionKind, ParamSpec};
use crate::vector::Metric;

/// Index of the time parameter shared by all neighborhood classes.
pub const TIME_PARAM: usize = 0;

const PARAMS_RECT: &[ParamSpec] = &[
    ParamSpec::new("time", 0.0),
    ParamSpec::new("width", 1.0),
    ParamSpec::positive("time_constant", 1000.0),
];

const PARAMS_GAUSS: &[ParamSpec] = &[
    ParamSpec::new("time", 0.0),
    ParamSpec::new("radius", 1.0),
    ParamSpec::positive("time_constant", 1000.0),
];

/// Width at time `p[0]` for the initial width `p[1]` and time constant `p[2]`.
#[inline]
pub fn decayed_width(p: &[f64]) -> f64 {
    p[1] * (-p[0] / p[2]).exp()
}

fn rectangular(d: f64, p: &[f64]) -> f64 {
    if d <= decayed_width(p) {
        1.0
    } else {
        0.0
    }
}

fn gaussian(d: f64, p: &[f64]) -> f64 {
    let r = decayed_width(p);
    if r <= 0.0 {
        return if d == 0.0 { 1.0 } else { 0.0 };
    }
    (-d * d / (2.0 * r * r)).exp()
}

/// Built-in neighborhood classes.
pub static CLASSES: &[FunctionClass] = &[
    FunctionClass::new(FunctionKind::Neighborhood, "rectangular", rectangular, PARAMS_RECT)
        .with_metric(Metric::Euclidean),
    FunctionClass::new(FunctionKind::Neighborhood, "gaussian", gaussian, PARAMS_GAUSS)
        .with_metric(Metric::Euclidean),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::FunctionInstance;

    #[test]
    fn test_rectangular_cutoff() {
        let f = FunctionInstance::with_params(FunctionKind::Neighborhood, "rectangular", &[0.0, 2.0, 10.0]).unwrap();
        assert_eq!(f.evaluate(0.0), 1.0);
        assert_eq!(f.evaluate(2.0), 1.0);
        assert_eq!(f.evaluate(2.01), 0.0);
    }

    #[test]
    fn test_rectangular_shrinks_with_time() {
        let mut f = FunctionInstance::with_params(FunctionKind::Neighborhood, "rectangular", &[0.0, 2.0, 1.0]).unwrap();
        assert_eq!(f.evaluate(1.5), 1.0);
        f.set_param(TIME_PARAM, 1.0).unwrap();
        // width is now 2/e
        assert_eq!(f.evaluate(1.5), 0.0);
    }

    #[test]
    fn test_gaussian_falloff() {
        let f = FunctionInstance::with_params(FunctionKind::Neighborhood, "gaussian", &[0.0, 1.0, 100.0]).unwrap();
        assert_eq!(f.evaluate(0.0), 1.0);
        let near = f.evaluate(0.5);
        let far = f.evaluate(2.0);
        assert!(near > far && far > 0.0);
    }

    #[test]
    fn test_zero_time_constant_is_rejected() {
        let f = FunctionInstance::with_params(FunctionKind::Neighborhood, "gaussian", &[0.0, 2.0, 0.0]).unwrap();
        assert!(f.evaluate(1.0).is_nan());
        assert!(f.validate().is_err());
    }

    #[test]
    fn test_declared_metric() {
        for class in CLASSES {
            assert_eq!(class.metric, Some(Metric::Euclidean));
        }
    }
}
