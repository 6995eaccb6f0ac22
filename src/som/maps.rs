//! Artifacts derived from winner sequences: classification and transition
//! matrices over the output units of a trained map.

use crate::error::{check_position, Result, SomkitError};
use std::io::Write;

/// Hit counts of class labels per output unit.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationMatrix {
    labels: Vec<String>,
    /// `counts[unit][label]`, units 0-based.
    counts: Vec<Vec<usize>>,
}

impl ClassificationMatrix {
    /// Creates an empty matrix for `units` output units and the given labels.
    pub fn new(units: usize, labels: Vec<String>) -> Self {
        let width = labels.len();
        Self {
            labels,
            counts: vec![vec![0; width]; units],
        }
    }

    /// Builds a matrix from 1-based winners and per-element label indexes.
    pub fn from_winners(units: usize, labels: Vec<String>, winners: &[usize], classes: &[usize]) -> Result<Self> {
        if winners.len() != classes.len() {
            return Err(SomkitError::DimensionMismatch {
                expected: winners.len(),
                found: classes.len(),
            });
        }
        let mut matrix = Self::new(units, labels);
        for (&w, &c) in winners.iter().zip(classes) {
            matrix.record(w, c)?;
        }
        Ok(matrix)
    }

    /// Counts one hit of label index `class` on 1-based `unit`.
    pub fn record(&mut self, unit: usize, class: usize) -> Result<()> {
        check_position(unit, self.counts.len())?;
        if class >= self.labels.len() {
            return Err(SomkitError::IndexOutOfRange {
                index: class,
                min: 0,
                max: self.labels.len().saturating_sub(1),
            });
        }
        self.counts[unit - 1][class] += 1;
        Ok(())
    }

    /// Label names.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Hits of label index `class` on 1-based `unit`.
    pub fn count(&self, unit: usize, class: usize) -> Result<usize> {
        check_position(unit, self.counts.len())?;
        self.counts[unit - 1]
            .get(class)
            .copied()
            .ok_or_else(|| SomkitError::NotFound(format!("label index {}", class)))
    }

    /// Majority label index per unit; `None` for units never hit. Ties go to
    /// the lower label index.
    pub fn unit_labels(&self) -> Vec<Option<usize>> {
        self.counts
            .iter()
            .map(|row| {
                let mut best: Option<(usize, usize)> = None;
                for (class, &n) in row.iter().enumerate() {
                    if n > 0 && best.map_or(true, |(_, b)| n > b) {
                        best = Some((class, n));
                    }
                }
                best.map(|(class, _)| class)
            })
            .collect()
    }

    /// Fraction of elements whose winner's majority label differs from
    /// their own label. Elements on unlabelled units count as errors.
    pub fn error_rate(&self, winners: &[usize], classes: &[usize]) -> Result<f64> {
        if winners.is_empty() || winners.len() != classes.len() {
            return Err(SomkitError::DimensionMismatch {
                expected: winners.len(),
                found: classes.len(),
            });
        }
        let unit_labels = self.unit_labels();
        let mut wrong = 0usize;
        for (&w, &c) in winners.iter().zip(classes) {
            check_position(w, unit_labels.len())?;
            if unit_labels[w - 1] != Some(c) {
                wrong += 1;
            }
        }
        Ok(wrong as f64 / winners.len() as f64)
    }

    /// Writes a header of labels followed by one row of counts per unit.
    pub fn write_to<W: Write>(&self, mut out: W) -> Result<()> {
        writeln!(out, "# unit {}", self.labels.join(" "))?;
        for (u, row) in self.counts.iter().enumerate() {
            let cells: Vec<String> = row.iter().map(|n| n.to_string()).collect();
            writeln!(out, "{} {}", u + 1, cells.join(" "))?;
        }
        Ok(())
    }
}

/// Counts of consecutive winner pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionMatrix {
    /// `counts[from][to]`, units 0-based.
    counts: Vec<Vec<usize>>,
}

impl TransitionMatrix {
    /// Creates an empty `units x units` matrix.
    pub fn new(units: usize) -> Self {
        Self {
            counts: vec![vec![0; units]; units],
        }
    }

    /// Adds every consecutive pair of a sequence of 1-based winners.
    pub fn add_sequence(&mut self, winners: &[usize]) -> Result<()> {
        for &w in winners {
            check_position(w, self.counts.len())?;
        }
        for pair in winners.windows(2) {
            self.counts[pair[0] - 1][pair[1] - 1] += 1;
        }
        Ok(())
    }

    /// Transitions from `from` to `to`, both 1-based.
    pub fn count(&self, from: usize, to: usize) -> Result<usize> {
        check_position(from, self.counts.len())?;
        check_position(to, self.counts.len())?;
        Ok(self.counts[from - 1][to - 1])
    }

    /// Row-normalized transition probabilities. Rows with no transitions
    /// are all zero.
    pub fn probabilities(&self) -> Vec<Vec<f64>> {
        self.counts
            .iter()
            .map(|row| {
                let total: usize = row.iter().sum();
                row.iter()
                    .map(|&n| if total == 0 { 0.0 } else { n as f64 / total as f64 })
                    .collect()
            })
            .collect()
    }

    /// Writes one row of probabilities per unit.
    pub fn write_to<W: Write>(&self, mut out: W) -> Result<()> {
        writeln!(out, "# {} units, row = from, column = to", self.counts.len())?;
        for row in self.probabilities() {
            let cells: Vec<String> = row.iter().map(|p| format!("{:.6}", p)).collect();
            writeln!(out, "{}", cells.join(" "))?;
        }
        Ok(())
    }
}
