//! Parameterized functions.
//!
//! A [`FunctionClass`] binds a name to a pure evaluation routine
//! `f(input, params)` and an ordered list of named parameters with
//! defaults. A [`FunctionInstance`] pairs one class with its own mutable
//! parameter vector. The same machinery drives unit activations, weight
//! initializers, learning-rate schedules and SOM neighborhoods.
//!
//! The set of classes is closed: each kind lists its classes in a static
//! table and lookups scan that table.

pub mod activation;
pub mod init;
pub mod neighborhood;
pub mod rate;

use crate::error::{Result, SomkitError};
use crate::vector::Metric;
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use std::fmt;

/// What a function class is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionKind {
    /// Unit activation: input is the unit's net input.
    Activation,
    /// Connection weight initializer: input is a random draw.
    WeightInit,
    /// Learning-rate schedule: input is the training time.
    LearningRate,
    /// SOM neighborhood: input is the coordinate distance to the winner.
    Neighborhood,
}

impl FunctionKind {
    /// The built-in classes of this kind, in lookup order.
    pub fn classes(&self) -> &'static [FunctionClass] {
        match self {
            FunctionKind::Activation => activation::CLASSES,
            FunctionKind::WeightInit => init::CLASSES,
            FunctionKind::LearningRate => rate::CLASSES,
            FunctionKind::Neighborhood => neighborhood::CLASSES,
        }
    }
}

/// Random input fed to a class when it is sampled rather than evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Draw {
    /// No randomness; the routine is evaluated at 0.
    None,
    /// Uniform draw in `[0, 1)`.
    Uniform,
    /// Standard normal draw.
    Normal,
}

/// A named parameter with its default value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    /// Parameter name.
    pub name: &'static str,
    /// Value given to new instances.
    pub default: f64,
    /// The value must be strictly positive (time constants, divisors).
    pub positive: bool,
}

impl ParamSpec {
    /// Declares a parameter.
    pub const fn new(name: &'static str, default: f64) -> Self {
        Self {
            name,
            default,
            positive: false,
        }
    }

    /// Declares a parameter that must be strictly positive.
    pub const fn positive(name: &'static str, default: f64) -> Self {
        Self {
            name,
            default,
            positive: true,
        }
    }
}

/// Evaluation routine shared by all instances of a class.
pub type EvalFn = fn(f64, &[f64]) -> f64;

/// A function class: identity, routine and parameter declarations.
#[derive(Debug, Clone, Copy)]
pub struct FunctionClass {
    /// Kind tag.
    pub kind: FunctionKind,
    /// Class name, unique within its kind.
    pub name: &'static str,
    /// Pure evaluation routine.
    pub eval: EvalFn,
    /// Ordered parameter list.
    pub params: &'static [ParamSpec],
    /// Input source used by [`FunctionInstance::sample`].
    pub draw: Draw,
    /// Vector metric the class expects competition to use (neighborhoods).
    pub metric: Option<Metric>,
}

impl FunctionClass {
    /// Defines a class. Use the `with_*` methods to add a draw or metric.
    pub const fn new(
        kind: FunctionKind,
        name: &'static str,
        eval: EvalFn,
        params: &'static [ParamSpec],
    ) -> Self {
        Self {
            kind,
            name,
            eval,
            params,
            draw: Draw::None,
            metric: None,
        }
    }

    /// Sets the random input source.
    pub const fn with_draw(mut self, draw: Draw) -> Self {
        self.draw = draw;
        self
    }

    /// Sets the declared competition metric.
    pub const fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = Some(metric);
        self
    }

    /// Number of declared parameters.
    #[inline]
    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    /// Default parameter vector.
    pub fn defaults(&self) -> Vec<f64> {
        self.params.iter().map(|p| p.default).collect()
    }

    /// Finds a built-in class of `kind` by name.
    ///
    /// An exact, case-sensitive match wins; otherwise `name` must be a prefix
    /// of exactly one class name.
    pub fn lookup(kind: FunctionKind, name: &str) -> Result<&'static FunctionClass> {
        let classes = kind.classes();
        if let Some(class) = classes.iter().find(|c| c.name == name) {
            return Ok(class);
        }

        let mut prefixed = classes.iter().filter(|c| !name.is_empty() && c.name.starts_with(name));
        match (prefixed.next(), prefixed.next()) {
            (Some(class), None) => Ok(class),
            (Some(_), Some(_)) => Err(SomkitError::UnknownFunction(format!(
                "{:?} class name '{}' is ambiguous",
                kind, name
            ))),
            _ => Err(SomkitError::UnknownFunction(format!("{:?} '{}'", kind, name))),
        }
    }

    /// Creates an instance with default parameters.
    pub fn instance(&'static self) -> FunctionInstance {
        FunctionInstance {
            class: self,
            params: self.defaults(),
        }
    }
}

impl PartialEq for FunctionClass {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.name == other.name
    }
}

/// A class bound to a concrete parameter vector.
///
/// The parameter vector always has the class's declared length.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionInstance {
    class: &'static FunctionClass,
    params: Vec<f64>,
}

impl FunctionInstance {
    /// Creates an instance of the named built-in class with default parameters.
    pub fn by_name(kind: FunctionKind, name: &str) -> Result<Self> {
        Ok(FunctionClass::lookup(kind, name)?.instance())
    }

    /// Creates an instance of the named class and sets all of its parameters.
    pub fn with_params(kind: FunctionKind, name: &str, params: &[f64]) -> Result<Self> {
        let mut instance = Self::by_name(kind, name)?;
        instance.set_params(params)?;
        Ok(instance)
    }

    /// The class of this instance.
    #[inline]
    pub fn class(&self) -> &'static FunctionClass {
        self.class
    }

    /// Shorthand for the class name.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.class.name
    }

    /// Current parameters.
    #[inline]
    pub fn params(&self) -> &[f64] {
        &self.params
    }

    /// Reads one parameter.
    pub fn param(&self, index: usize) -> Result<f64> {
        self.params.get(index).copied().ok_or_else(|| self.bad_index(index))
    }

    /// Sets one parameter, bounds-checked.
    pub fn set_param(&mut self, index: usize, value: f64) -> Result<()> {
        let err = self.bad_index(index);
        let slot = self.params.get_mut(index).ok_or(err)?;
        *slot = value;
        Ok(())
    }

    /// Replaces the whole parameter vector. Nothing changes unless the
    /// length matches the class declaration.
    pub fn set_params(&mut self, params: &[f64]) -> Result<()> {
        if params.len() != self.class.param_count() {
            return Err(SomkitError::DimensionMismatch {
                expected: self.class.param_count(),
                found: params.len(),
            });
        }
        self.params.copy_from_slice(params);
        Ok(())
    }

    /// Checks that every parameter is finite and that declared-positive
    /// parameters are strictly positive.
    pub fn validate(&self) -> Result<()> {
        for (spec, &value) in self.class.params.iter().zip(&self.params) {
            if !value.is_finite() || (spec.positive && value <= 0.0) {
                return Err(SomkitError::InvalidArgument(format!(
                    "{} parameter '{}' = {} is out of range",
                    self.class.name, spec.name, value
                )));
            }
        }
        Ok(())
    }

    /// Evaluates the function at `input`.
    #[inline]
    pub fn evaluate(&self, input: f64) -> f64 {
        (self.class.eval)(input, &self.params)
    }

    /// Evaluates the function at a random input drawn per the class.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let input = match self.class.draw {
            Draw::None => 0.0,
            Draw::Uniform => rng.gen::<f64>(),
            Draw::Normal => StandardNormal.sample(rng),
        };
        self.evaluate(input)
    }

    fn bad_index(&self, index: usize) -> SomkitError {
        SomkitError::IndexOutOfRange {
            index,
            min: 0,
            max: self.class.param_count().saturating_sub(1),
        }
    }
}

impl fmt::Display for FunctionInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.class.name)?;
        for (i, (spec, value)) in self.class.params.iter().zip(self.params.iter()).enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", spec.name, value)?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn double(x: f64, p: &[f64]) -> f64 {
        x * 2.0 + p[0]
    }

    static DOUBLE: FunctionClass = FunctionClass::new(
        FunctionKind::Activation,
        "double",
        double,
        &[ParamSpec::new("offset", 1.0)],
    );

    #[test]
    fn test_custom_class() {
        let mut f = DOUBLE.instance();
        assert_eq!(f.params(), &[1.0]);
        assert_eq!(f.evaluate(2.0), 5.0);
        f.set_param(0, 0.0).unwrap();
        assert_eq!(f.evaluate(2.0), 4.0);
    }

    #[test]
    fn test_set_param_bounds() {
        let mut f = DOUBLE.instance();
        assert!(matches!(
            f.set_param(1, 3.0),
            Err(SomkitError::IndexOutOfRange { index: 1, .. })
        ));
        assert!(f.param(1).is_err());
    }

    #[test]
    fn test_set_params_atomic() {
        let mut f = FunctionInstance::by_name(FunctionKind::Neighborhood, "rectangular").unwrap();
        let before = f.params().to_vec();
        assert!(f.set_params(&[1.0, 2.0]).is_err());
        assert_eq!(f.params(), before.as_slice());
        f.set_params(&[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(f.params(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_lookup_exact_and_prefix() {
        let c = FunctionClass::lookup(FunctionKind::LearningRate, "exponential").unwrap();
        assert_eq!(c.name, "exponential");
        let c = FunctionClass::lookup(FunctionKind::LearningRate, "expo").unwrap();
        assert_eq!(c.name, "exponential");
        assert!(FunctionClass::lookup(FunctionKind::LearningRate, "Exponential").is_err());
        assert!(FunctionClass::lookup(FunctionKind::LearningRate, "nope").is_err());
        assert!(FunctionClass::lookup(FunctionKind::LearningRate, "").is_err());
    }

    #[test]
    fn test_lookup_ambiguous_prefix() {
        // sigmoid and step
        let err = FunctionClass::lookup(FunctionKind::Activation, "s").unwrap_err();
        assert!(matches!(err, SomkitError::UnknownFunction(_)));
    }

    #[test]
    fn test_sample_is_deterministic_with_seed() {
        let f = FunctionInstance::with_params(FunctionKind::WeightInit, "uniform", &[-1.0, 1.0]).unwrap();
        let mut a = ChaCha8Rng::seed_from_u64(7);
        let mut b = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..10 {
            let x = f.sample(&mut a);
            assert!((-1.0..1.0).contains(&x));
            assert_eq!(x, f.sample(&mut b));
        }
    }

    #[test]
    fn test_validate_params() {
        let f = FunctionInstance::with_params(FunctionKind::LearningRate, "exponential", &[0.1, 0.0]).unwrap();
        assert!(matches!(f.validate(), Err(SomkitError::InvalidArgument(_))));
        let f = FunctionInstance::with_params(FunctionKind::Neighborhood, "gaussian", &[0.0, f64::NAN, 10.0]).unwrap();
        assert!(f.validate().is_err());
        let f = FunctionInstance::with_params(FunctionKind::Neighborhood, "gaussian", &[0.0, 2.0, 10.0]).unwrap();
        f.validate().unwrap();
        // negative values are fine where positivity is not declared
        let mut d = DOUBLE.instance();
        d.set_param(0, -3.0).unwrap();
        d.validate().unwrap();
    }

    #[test]
    fn test_display() {
        let f = DOUBLE.instance();
        assert_eq!(f.to_string(), "double(offset=1)");
    }
}
