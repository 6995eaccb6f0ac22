//! Per-dimension statistics over a set's vectors.

use crate::error::{Result, SomkitError};
use crate::vector::Vector;
use log::warn;

/// Standard deviations below this are treated as zero.
const MIN_STD_DEV: f64 = 1e-12;

/// Per-dimension running statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorStats {
    /// Component maxima.
    pub max: Vector,
    /// Component minima.
    pub min: Vector,
    /// Component sums.
    pub sum: Vector,
    /// Component sums of squares.
    pub sum_sq: Vector,
    /// Component means.
    pub average: Vector,
    /// Population variances.
    pub variance: Vector,
    /// Standard deviations.
    pub std_dev: Vector,
    /// Reciprocal standard deviations; 1 where the deviation is zero.
    pub inv_std_dev: Vector,
    /// Number of vectors summarized.
    pub count: usize,
}

impl VectorStats {
    /// Summarizes `vectors`, all of dimension `dim`.
    pub fn compute<'a, I>(dim: usize, vectors: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a Vector>,
    {
        let mut max = vec![f64::NEG_INFINITY; dim];
        let mut min = vec![f64::INFINITY; dim];
        let mut sum = vec![0.0; dim];
        let mut sum_sq = vec![0.0; dim];
        let mut count = 0usize;

        for v in vectors {
            if v.dim() != dim {
                return Err(SomkitError::DimensionMismatch {
                    expected: dim,
                    found: v.dim(),
                });
            }
            for (i, &x) in v.iter().enumerate() {
                max[i] = max[i].max(x);
                min[i] = min[i].min(x);
                sum[i] += x;
                sum_sq[i] += x * x;
            }
            count += 1;
        }

        if count == 0 {
            return Err(SomkitError::Stats("cannot compute statistics of an empty set".to_string()));
        }

        let n = count as f64;
        let average: Vec<f64> = sum.iter().map(|s| s / n).collect();
        let variance: Vec<f64> = sum_sq
            .iter()
            .zip(average.iter())
            .map(|(sq, avg)| (sq / n - avg * avg).max(0.0))
            .collect();
        let std_dev: Vec<f64> = variance.iter().map(|v| v.sqrt()).collect();

        let inv_std_dev = inverse_std_dev(&std_dev);

        Ok(Self {
            max: max.into(),
            min: min.into(),
            sum: sum.into(),
            sum_sq: sum_sq.into(),
            average: average.into(),
            variance: variance.into(),
            std_dev: std_dev.into(),
            inv_std_dev: inv_std_dev.into(),
            count,
        })
    }

    /// Statistics known only by their means and deviations, such as those
    /// stored in a network's input units. Extrema, sums and count are zero.
    pub fn from_moments(average: Vector, std_dev: Vector) -> Result<Self> {
        let dim = average.dim();
        if std_dev.dim() != dim {
            return Err(SomkitError::DimensionMismatch {
                expected: dim,
                found: std_dev.dim(),
            });
        }
        if let Some(bad) = std_dev.iter().chain(average.iter()).find(|x| !x.is_finite()) {
            return Err(SomkitError::Stats(format!("non-finite moment {}", bad)));
        }
        let variance: Vec<f64> = std_dev.iter().map(|s| s * s).collect();
        let inv_std_dev = inverse_std_dev(std_dev.as_slice());
        Ok(Self {
            max: Vector::zeros(dim),
            min: Vector::zeros(dim),
            sum: Vector::zeros(dim),
            sum_sq: Vector::zeros(dim),
            average,
            variance: variance.into(),
            std_dev,
            inv_std_dev: inv_std_dev.into(),
            count: 0,
        })
    }

    /// Applies `(v - average) * inv_std_dev` in place.
    pub fn regularize(&self, v: &mut Vector) -> Result<()> {
        let z = v.subtract(&self.average)?.multiply(&self.inv_std_dev)?;
        *v = z;
        Ok(())
    }
}

fn inverse_std_dev(std_dev: &[f64]) -> Vec<f64> {
    let mut flat = 0;
    let inv: Vec<f64> = std_dev
        .iter()
        .map(|&s| {
            if s > MIN_STD_DEV {
                1.0 / s
            } else {
                flat += 1;
                1.0
            }
        })
        .collect();
    if flat > 0 {
        warn!("{} of {} dimensions have zero standard deviation", flat, std_dev.len());
    }
    inv
}
