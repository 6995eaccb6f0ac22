//! Dense real vectors and the metrics used by competition.
//!
//! This is deliberately small: the network and set code only needs
//! element access, a handful of component-wise operations, the two
//! competition metrics and the textual `dimension v1 ... vN` encoding
//! used by configuration files.

use crate::error::{Result, SomkitError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};

/// Vector metric used to score a unit against an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Metric {
    /// Euclidean distance; smaller is better.
    Euclidean,
    /// Inner product; larger is better.
    InnerProduct,
}

impl Metric {
    /// Returns true if score `a` strictly beats score `b` under this metric.
    #[inline]
    pub fn is_better(&self, a: f64, b: f64) -> bool {
        match self {
            Metric::Euclidean => a < b,
            Metric::InnerProduct => a > b,
        }
    }

    /// Evaluates the metric between two equally sized slices.
    pub fn eval(&self, a: &[f64], b: &[f64]) -> Result<f64> {
        check_dims(a.len(), b.len())?;
        Ok(match self {
            Metric::Euclidean => a
                .iter()
                .zip(b.iter())
                .map(|(x, y)| (x - y).powi(2))
                .sum::<f64>()
                .sqrt(),
            Metric::InnerProduct => a.iter().zip(b.iter()).map(|(x, y)| x * y).sum(),
        })
    }

    /// Name used in configuration files.
    pub fn name(&self) -> &'static str {
        match self {
            Metric::Euclidean => "euclidean",
            Metric::InnerProduct => "inner_product",
        }
    }
}

#[inline]
fn check_dims(expected: usize, found: usize) -> Result<()> {
    if expected != found {
        return Err(SomkitError::DimensionMismatch { expected, found });
    }
    Ok(())
}

/// A fixed-dimension real vector.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector(Vec<f64>);

impl Vector {
    /// Creates a zero vector of the given dimension.
    pub fn zeros(dimension: usize) -> Self {
        Self(vec![0.0; dimension])
    }

    /// Creates a vector filled with `value`.
    pub fn filled(dimension: usize, value: f64) -> Self {
        Self(vec![value; dimension])
    }

    /// Number of components.
    #[inline]
    pub fn dim(&self) -> usize {
        self.0.len()
    }

    /// Returns component `i` (0-based), checked.
    pub fn get(&self, i: usize) -> Result<f64> {
        self.0.get(i).copied().ok_or(SomkitError::IndexOutOfRange {
            index: i,
            min: 0,
            max: self.0.len().saturating_sub(1),
        })
    }

    /// Sets component `i` (0-based), checked.
    pub fn set(&mut self, i: usize, value: f64) -> Result<()> {
        let max = self.0.len().saturating_sub(1);
        match self.0.get_mut(i) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(SomkitError::IndexOutOfRange { index: i, min: 0, max }),
        }
    }

    /// Borrow the components.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Mutably borrow the components.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.0
    }

    /// Consumes the vector, returning its components.
    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }

    /// Iterator over the components.
    pub fn iter(&self) -> std::slice::Iter<'_, f64> {
        self.0.iter()
    }

    /// Component-wise sum.
    pub fn sum(&self, other: &Vector) -> Result<Vector> {
        self.zip_with(other, |a, b| a + b)
    }

    /// Component-wise difference `self - other`.
    pub fn subtract(&self, other: &Vector) -> Result<Vector> {
        self.zip_with(other, |a, b| a - b)
    }

    /// Component-wise product.
    pub fn multiply(&self, other: &Vector) -> Result<Vector> {
        self.zip_with(other, |a, b| a * b)
    }

    /// Multiplies every component by `k`.
    pub fn scalar_multiply(&self, k: f64) -> Vector {
        Vector(self.0.iter().map(|x| x * k).collect())
    }

    /// Component-wise square root.
    pub fn sqrt(&self) -> Vector {
        Vector(self.0.iter().map(|x| x.sqrt()).collect())
    }

    /// Euclidean length.
    pub fn modulus(&self) -> f64 {
        self.0.iter().map(|x| x * x).sum::<f64>().sqrt()
    }

    /// Metric between `self` and `other`.
    pub fn metric(&self, other: &Vector, metric: Metric) -> Result<f64> {
        metric.eval(&self.0, &other.0)
    }

    /// Scales both vectors to unit modulus. Zero vectors are left unchanged.
    pub fn normalize(v1: &mut Vector, v2: &mut Vector) {
        for v in [v1, v2] {
            let norm = v.modulus();
            if norm > 1e-12 {
                for x in &mut v.0 {
                    *x /= norm;
                }
            }
        }
    }

    fn zip_with(&self, other: &Vector, f: impl Fn(f64, f64) -> f64) -> Result<Vector> {
        check_dims(self.dim(), other.dim())?;
        Ok(Vector(
            self.0.iter().zip(other.0.iter()).map(|(&a, &b)| f(a, b)).collect(),
        ))
    }

    /// Parses the `dimension v1 ... vN` encoding.
    pub fn parse_encoded(text: &str) -> Result<Vector> {
        let mut tokens = text.split_whitespace();
        let dim: usize = tokens
            .next()
            .ok_or_else(|| SomkitError::InvalidArgument("empty vector".to_string()))?
            .parse()
            .map_err(|_| SomkitError::InvalidArgument(format!("bad vector dimension in '{}'", text)))?;

        let values = tokens
            .map(|t| {
                t.parse::<f64>()
                    .map_err(|_| SomkitError::InvalidArgument(format!("bad vector component '{}'", t)))
            })
            .collect::<Result<Vec<f64>>>()?;

        check_dims(dim, values.len())?;
        Ok(Vector(values))
    }

    /// Renders the `dimension v1 ... vN` encoding.
    pub fn encode(&self) -> String {
        let mut out = self.dim().to_string();
        for v in &self.0 {
            out.push(' ');
            out.push_str(&v.to_string());
        }
        out
    }
}

impl From<Vec<f64>> for Vector {
    fn from(values: Vec<f64>) -> Self {
        Self(values)
    }
}

impl From<&[f64]> for Vector {
    fn from(values: &[f64]) -> Self {
        Self(values.to_vec())
    }
}

impl Index<usize> for Vector {
    type Output = f64;

    fn index(&self, i: usize) -> &f64 {
        &self.0[i]
    }
}

impl IndexMut<usize> for Vector {
    fn index_mut(&mut self, i: usize) -> &mut f64 {
        &mut self.0[i]
    }
}

impl fmt::Display for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}
