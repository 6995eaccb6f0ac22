//! Layers and layer classes.

use super::UnitId;
use crate::error::{Result, SomkitError};
use crate::function::{activation, FunctionClass, FunctionKind};
use std::fmt;
use std::str::FromStr;

/// Role of a layer in the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerClass {
    /// Receives the input vector.
    Input,
    /// Intermediate layer.
    Hidden,
    /// Produces the network output; for a SOM, the competitive grid.
    Output,
}

impl LayerClass {
    /// Activation class given to units created without an explicit one.
    pub fn default_activation(&self) -> &'static FunctionClass {
        match self {
            LayerClass::Hidden => FunctionClass::lookup(FunctionKind::Activation, "sigmoid")
                .unwrap_or_else(|_| activation::identity_class()),
            LayerClass::Input | LayerClass::Output => activation::identity_class(),
        }
    }

    /// Name used in configuration files.
    pub fn name(&self) -> &'static str {
        match self {
            LayerClass::Input => "input",
            LayerClass::Hidden => "hidden",
            LayerClass::Output => "output",
        }
    }
}

impl FromStr for LayerClass {
    type Err = SomkitError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "input" => Ok(LayerClass::Input),
            "hidden" => Ok(LayerClass::Hidden),
            "output" => Ok(LayerClass::Output),
            other => Err(SomkitError::InvalidArgument(format!("unknown layer class '{}'", other))),
        }
    }
}

impl fmt::Display for LayerClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An ordered list of units.
#[derive(Debug, Clone)]
pub struct Layer {
    pub(super) attached: bool,
    pub(super) index: usize,
    pub(super) class: LayerClass,
    pub(super) name: String,
    pub(super) units: Vec<UnitId>,
}

impl Layer {
    pub(super) fn new(class: LayerClass, name: String) -> Self {
        Self {
            attached: false,
            index: 0,
            class,
            name,
            units: Vec::new(),
        }
    }

    /// True while the layer belongs to the network's layer sequence.
    #[inline]
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// 1-based position in the network, or 0 when detached.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Layer class.
    #[inline]
    pub fn class(&self) -> LayerClass {
        self.class
    }

    /// Layer name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Units in order.
    #[inline]
    pub fn units(&self) -> &[UnitId] {
        &self.units
    }

    /// Number of units.
    #[inline]
    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    /// True if the layer holds no units.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_parsing() {
        assert_eq!("Input".parse::<LayerClass>().unwrap(), LayerClass::Input);
        assert_eq!(" output ".parse::<LayerClass>().unwrap(), LayerClass::Output);
        assert!("visible".parse::<LayerClass>().is_err());
    }

    #[test]
    fn test_default_activation() {
        assert_eq!(LayerClass::Input.default_activation().name, "identity");
        assert_eq!(LayerClass::Hidden.default_activation().name, "sigmoid");
        assert_eq!(LayerClass::Output.default_activation().name, "identity");
    }
}
