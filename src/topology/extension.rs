//! Network specializations.

use crate::error::{Result, SomkitError};
use crate::function::{FunctionInstance, FunctionKind};
use crate::vector::Metric;

/// Extra state attached to a network for a particular training scheme.
#[derive(Debug, Clone, PartialEq)]
pub enum Extension {
    /// Self-Organizing Map.
    Som(SomExtension),
    /// Learning Vector Quantization. Only carried through configuration files.
    Lvq(LvqExtension),
    /// Multi-layer perceptron. Training is not implemented.
    Mlp(MlpExtension),
}

impl Extension {
    /// Section tag used in configuration files.
    pub fn tag(&self) -> &'static str {
        match self {
            Extension::Som(_) => "SOM extension",
            Extension::Lvq(_) => "LVQ extension",
            Extension::Mlp(_) => "MLP extension",
        }
    }
}

/// Time-driven functions of a SOM.
#[derive(Debug, Clone, PartialEq)]
pub struct SomExtension {
    neighborhood: FunctionInstance,
    learning_rate: FunctionInstance,
}

impl SomExtension {
    /// Creates the extension, checking each function's kind.
    pub fn new(neighborhood: FunctionInstance, learning_rate: FunctionInstance) -> Result<Self> {
        expect_kind(&neighborhood, FunctionKind::Neighborhood)?;
        expect_kind(&learning_rate, FunctionKind::LearningRate)?;
        Ok(Self {
            neighborhood,
            learning_rate,
        })
    }

    /// Neighborhood function.
    #[inline]
    pub fn neighborhood(&self) -> &FunctionInstance {
        &self.neighborhood
    }

    /// Mutable neighborhood function.
    #[inline]
    pub fn neighborhood_mut(&mut self) -> &mut FunctionInstance {
        &mut self.neighborhood
    }

    /// Learning-rate schedule.
    #[inline]
    pub fn learning_rate(&self) -> &FunctionInstance {
        &self.learning_rate
    }

    /// Mutable learning-rate schedule.
    #[inline]
    pub fn learning_rate_mut(&mut self) -> &mut FunctionInstance {
        &mut self.learning_rate
    }

    /// Metric declared by the neighborhood class; Euclidean if it declares none.
    pub fn metric(&self) -> Metric {
        self.neighborhood.class().metric.unwrap_or(Metric::Euclidean)
    }
}

/// LVQ parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct LvqExtension {
    /// Learning-rate schedule.
    pub learning_rate: FunctionInstance,
    /// Relative window width for runner-up updates.
    pub window: f64,
}

impl LvqExtension {
    /// Creates the extension, checking the schedule's kind.
    pub fn new(learning_rate: FunctionInstance, window: f64) -> Result<Self> {
        expect_kind(&learning_rate, FunctionKind::LearningRate)?;
        Ok(Self { learning_rate, window })
    }
}

/// MLP parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct MlpExtension {
    /// Step size.
    pub learning_rate: f64,
    /// Momentum term.
    pub momentum: f64,
}

impl MlpExtension {
    /// Back-propagation is not provided.
    pub fn train_epoch(&mut self) -> Result<f64> {
        Err(SomkitError::Unsupported("MLP back-propagation training".to_string()))
    }
}

fn expect_kind(f: &FunctionInstance, kind: FunctionKind) -> Result<()> {
    if f.class().kind != kind {
        return Err(SomkitError::InvalidArgument(format!(
            "'{}' is a {:?} function, expected {:?}",
            f.name(),
            f.class().kind,
            kind
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_som_extension_kinds() {
        let ngb = FunctionInstance::by_name(FunctionKind::Neighborhood, "gaussian").unwrap();
        let rate = FunctionInstance::by_name(FunctionKind::LearningRate, "constant").unwrap();
        assert!(SomExtension::new(rate.clone(), ngb.clone()).is_err());
        let som = SomExtension::new(ngb, rate).unwrap();
        assert_eq!(som.metric(), Metric::Euclidean);
    }

    #[test]
    fn test_mlp_stub() {
        let mut mlp = MlpExtension {
            learning_rate: 0.1,
            momentum: 0.9,
        };
        assert!(matches!(mlp.train_epoch(), Err(SomkitError::Unsupported(_))));
    }
}
