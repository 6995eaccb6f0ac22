//! The training set container.

use super::{AttachRejected, TElement, VectorStats};
use crate::error::{check_position, Result, SomkitError};
use crate::vector::Vector;
use log::debug;
use rand::Rng;
use std::str::FromStr;

/// How [`TrainingSet::divide`] picks the elements it moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DivideCriterion {
    /// The first `count` elements, in order.
    PickFirst,
    /// The last `count` elements, in order.
    PickLast,
    /// `count` uniform draws without replacement.
    PickAtRandom,
}

impl FromStr for DivideCriterion {
    type Err = SomkitError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "first" => Ok(DivideCriterion::PickFirst),
            "last" => Ok(DivideCriterion::PickLast),
            "random" => Ok(DivideCriterion::PickAtRandom),
            other => Err(SomkitError::InvalidArgument(format!("unknown divide criterion '{}'", other))),
        }
    }
}

#[derive(Debug, Clone)]
struct StatsBlock {
    stats: VectorStats,
    revision: u64,
}

/// An ordered collection of elements with fixed input/output dimensions.
#[derive(Debug, Clone)]
pub struct TrainingSet {
    name: String,
    elements: Vec<TElement>,
    input_dim: usize,
    output_dim: usize,
    input_stats: Option<StatsBlock>,
    output_stats: Option<StatsBlock>,
    revision: u64,
}

impl TrainingSet {
    /// Creates an empty set. `output_dim` is 0 for unsupervised data.
    pub fn new(name: impl Into<String>, input_dim: usize, output_dim: usize) -> Result<Self> {
        if input_dim == 0 {
            return Err(SomkitError::InvalidArgument("input dimension must be positive".to_string()));
        }
        Ok(Self {
            name: name.into(),
            elements: Vec::new(),
            input_dim,
            output_dim,
            input_stats: None,
            output_stats: None,
            revision: 0,
        })
    }

    /// Loads a set from a triple file; see [`crate::io::load_triples`].
    pub fn from_triples(
        path: impl AsRef<std::path::Path>,
        name: &str,
        input_dim: usize,
        output_dim: usize,
    ) -> Result<Self> {
        crate::io::load_triples(path, name, input_dim, output_dim)
    }

    /// Set name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Input dimension.
    #[inline]
    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    /// Output dimension, 0 when unsupervised.
    #[inline]
    pub fn output_dim(&self) -> usize {
        self.output_dim
    }

    /// Number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// True if the set holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Elements in order.
    #[inline]
    pub fn elements(&self) -> &[TElement] {
        &self.elements
    }

    /// Iterator over the elements.
    pub fn iter(&self) -> std::slice::Iter<'_, TElement> {
        self.elements.iter()
    }

    /// The element at 1-based `position`.
    pub fn element(&self, position: usize) -> Result<&TElement> {
        check_position(position, self.elements.len())?;
        Ok(&self.elements[position - 1])
    }

    /// Mutable element at 1-based `position`. Marks statistics stale.
    pub fn element_mut(&mut self, position: usize) -> Result<&mut TElement> {
        check_position(position, self.elements.len())?;
        self.touch();
        Ok(&mut self.elements[position - 1])
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    fn renumber(&mut self, from: usize) {
        for (i, e) in self.elements.iter_mut().enumerate().skip(from.saturating_sub(1)) {
            e.index = i + 1;
        }
    }

    fn check_element(&self, element: &TElement) -> Result<()> {
        if element.input.dim() != self.input_dim {
            return Err(SomkitError::DimensionMismatch {
                expected: self.input_dim,
                found: element.input.dim(),
            });
        }
        if element.output_dim() != self.output_dim {
            return Err(SomkitError::DimensionMismatch {
                expected: self.output_dim,
                found: element.output_dim(),
            });
        }
        Ok(())
    }

    /// Creates an element from vectors and appends it.
    pub fn push(&mut self, input: Vector, output: Option<Vector>) -> Result<()> {
        self.attach_element(TElement::new(input, output), None)
    }

    /// Inserts `element` at `position` (append when `None`). Valid positions
    /// are `1..=len + 1`. On failure the element is handed back.
    pub fn try_attach(
        &mut self,
        element: TElement,
        position: Option<usize>,
    ) -> std::result::Result<(), AttachRejected> {
        let position = position.unwrap_or(self.elements.len() + 1);
        if let Err(error) = check_position(position, self.elements.len() + 1)
            .and_then(|_| self.check_element(&element))
        {
            return Err(AttachRejected { element, error });
        }

        self.elements.insert(position - 1, element);
        self.renumber(position);
        self.touch();
        Ok(())
    }

    /// Inserts `element` at `position` (append when `None`).
    pub fn attach_element(&mut self, element: TElement, position: Option<usize>) -> Result<()> {
        self.try_attach(element, position).map_err(|r| r.error)
    }

    /// Removes and returns the element at 1-based `position`.
    pub fn remove_element(&mut self, position: usize) -> Result<TElement> {
        check_position(position, self.elements.len())?;
        let mut element = self.elements.remove(position - 1);
        element.index = 0;
        self.renumber(position);
        self.touch();
        Ok(element)
    }

    /// Moves the element at `position` into `dest` at `dest_position`.
    /// If `dest` refuses it, the element goes back where it was.
    pub fn transfer_element(
        &mut self,
        position: usize,
        dest: &mut TrainingSet,
        dest_position: Option<usize>,
    ) -> Result<()> {
        let element = self.remove_element(position)?;
        match dest.try_attach(element, dest_position) {
            Ok(()) => Ok(()),
            Err(rejected) => {
                self.try_attach(rejected.element, Some(position))
                    .map_err(|r| r.error)?;
                Err(rejected.error)
            }
        }
    }

    /// Tears the set down. A non-empty set is only emptied when
    /// `cascade_elements` is set. Afterwards the set may simply be dropped.
    pub fn destroy(&mut self, cascade_elements: bool) -> Result<()> {
        if !self.elements.is_empty() && !cascade_elements {
            return Err(SomkitError::Structure(format!(
                "set '{}' still has {} elements",
                self.name,
                self.elements.len()
            )));
        }
        self.elements.clear();
        self.input_stats = None;
        self.output_stats = None;
        self.touch();
        Ok(())
    }

    /// Moves every element of `orig` to the end of `dest`, preserving order.
    pub fn merge(orig: &mut TrainingSet, dest: &mut TrainingSet) -> Result<()> {
        if orig.input_dim != dest.input_dim || orig.output_dim != dest.output_dim {
            return Err(SomkitError::DimensionMismatch {
                expected: dest.input_dim,
                found: orig.input_dim,
            });
        }
        let start = dest.elements.len() + 1;
        dest.elements.append(&mut orig.elements);
        dest.renumber(start);
        orig.touch();
        dest.touch();
        debug!("Merged '{}' into '{}' ({} elements)", orig.name, dest.name, dest.len());
        Ok(())
    }

    /// Moves `count` elements into a new set named `name`.
    pub fn divide<R: Rng + ?Sized>(
        &mut self,
        name: impl Into<String>,
        count: usize,
        criterion: DivideCriterion,
        rng: &mut R,
    ) -> Result<TrainingSet> {
        if count > self.elements.len() {
            return Err(SomkitError::IndexOutOfRange {
                index: count,
                min: 0,
                max: self.elements.len(),
            });
        }

        let mut part = TrainingSet::new(name, self.input_dim, self.output_dim)?;
        part.elements = match criterion {
            DivideCriterion::PickFirst => self.elements.drain(..count).collect(),
            DivideCriterion::PickLast => {
                let at = self.elements.len() - count;
                self.elements.split_off(at)
            }
            DivideCriterion::PickAtRandom => {
                let mut picked = Vec::with_capacity(count);
                for _ in 0..count {
                    let k = rng.gen_range(0..self.elements.len());
                    picked.push(self.elements.remove(k));
                }
                picked
            }
        };

        self.renumber(1);
        part.renumber(1);
        self.touch();
        Ok(part)
    }

    /// Shuffles the set by dividing it entirely at random and merging back.
    pub fn randomize<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<()> {
        let count = self.elements.len();
        let mut scratch = self.divide(format!("{}.shuffle", self.name), count, DivideCriterion::PickAtRandom, rng)?;
        TrainingSet::merge(&mut scratch, self)
    }

    /// Recomputes input and/or output statistics over the current elements.
    pub fn update_vector_stats(&mut self, inputs: bool, outputs: bool) -> Result<()> {
        if self.elements.is_empty() {
            return Err(SomkitError::Stats(format!("set '{}' is empty", self.name)));
        }
        if outputs && self.output_dim == 0 {
            return Err(SomkitError::Stats(format!("set '{}' has no outputs", self.name)));
        }

        if inputs {
            let stats = VectorStats::compute(self.input_dim, self.elements.iter().map(|e| &e.input))?;
            self.input_stats = Some(StatsBlock {
                stats,
                revision: self.revision,
            });
        }
        if outputs {
            let stats = VectorStats::compute(
                self.output_dim,
                self.elements.iter().filter_map(|e| e.output.as_ref()),
            )?;
            self.output_stats = Some(StatsBlock {
                stats,
                revision: self.revision,
            });
        }
        Ok(())
    }

    /// Input statistics from the last update, current or not.
    pub fn input_stats(&self) -> Option<&VectorStats> {
        self.input_stats.as_ref().map(|b| &b.stats)
    }

    /// Output statistics from the last update, current or not.
    pub fn output_stats(&self) -> Option<&VectorStats> {
        self.output_stats.as_ref().map(|b| &b.stats)
    }

    /// True if input statistics exist and no element changed since.
    pub fn input_stats_current(&self) -> bool {
        self.input_stats.as_ref().is_some_and(|b| b.revision == self.revision)
    }

    /// True if output statistics exist and no element changed since.
    pub fn output_stats_current(&self) -> bool {
        self.output_stats.as_ref().is_some_and(|b| b.revision == self.revision)
    }

    /// Z-score normalizes inputs and/or outputs with the current statistics.
    pub fn regularize(&mut self, inputs: bool, outputs: bool) -> Result<()> {
        if inputs && !self.input_stats_current() {
            return Err(SomkitError::Stats(format!("input statistics of '{}' are stale or absent", self.name)));
        }
        if outputs && !self.output_stats_current() {
            return Err(SomkitError::Stats(format!("output statistics of '{}' are stale or absent", self.name)));
        }

        let input_stats = self.input_stats.take();
        let output_stats = self.output_stats.take();
        let result = self.apply_regularization(
            input_stats.as_ref().filter(|_| inputs).map(|b| &b.stats),
            output_stats.as_ref().filter(|_| outputs).map(|b| &b.stats),
        );
        self.input_stats = input_stats;
        self.output_stats = output_stats;
        self.touch();
        result
    }

    /// Z-score normalizes inputs with statistics gathered elsewhere, such as
    /// those of the set a network was trained on.
    pub fn regularize_inputs_with(&mut self, stats: &VectorStats) -> Result<()> {
        if stats.average.dim() != self.input_dim {
            return Err(SomkitError::DimensionMismatch {
                expected: self.input_dim,
                found: stats.average.dim(),
            });
        }
        self.touch();
        self.apply_regularization(Some(stats), None)
    }

    fn apply_regularization(&mut self, input: Option<&VectorStats>, output: Option<&VectorStats>) -> Result<()> {
        for element in &mut self.elements {
            if let Some(stats) = input {
                stats.regularize(&mut element.input)?;
            }
            if let (Some(stats), Some(out)) = (output, element.output.as_mut()) {
                stats.regularize(out)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn numbered(n: usize) -> TrainingSet {
        let mut set = TrainingSet::new("numbers", 1, 0).unwrap();
        for i in 0..n {
            set.push(Vector::from(vec![i as f64]), None).unwrap();
        }
        set
    }

    fn values(set: &TrainingSet) -> Vec<f64> {
        set.iter().map(|e| e.input()[0]).collect()
    }

    fn assert_indexed(set: &TrainingSet) {
        for (i, e) in set.iter().enumerate() {
            assert_eq!(e.index(), i + 1);
        }
    }

    #[test]
    fn test_attach_positions() {
        let mut set = numbered(3);
        set.attach_element(TElement::new(Vector::from(vec![9.0]), None), Some(1))
            .unwrap();
        assert_eq!(values(&set), vec![9.0, 0.0, 1.0, 2.0]);
        assert_indexed(&set);
        assert!(set
            .attach_element(TElement::new(Vector::from(vec![9.0]), None), Some(6))
            .is_err());
        assert!(set
            .attach_element(TElement::new(Vector::from(vec![9.0]), None), Some(0))
            .is_err());
    }

    #[test]
    fn test_dimension_checked() {
        let mut set = numbered(1);
        let err = set.push(Vector::zeros(2), None).unwrap_err();
        assert!(matches!(err, SomkitError::DimensionMismatch { expected: 1, found: 2 }));
        assert!(set.push(Vector::zeros(1), Some(Vector::zeros(1))).is_err());
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_remove_renumbers() {
        let mut set = numbered(4);
        let e = set.remove_element(2).unwrap();
        assert_eq!(e.index(), 0);
        assert_eq!(e.input()[0], 1.0);
        assert_eq!(values(&set), vec![0.0, 2.0, 3.0]);
        assert_indexed(&set);
        assert!(set.remove_element(4).is_err());
    }

    #[test]
    fn test_transfer_and_rollback() {
        let mut a = numbered(3);
        let mut b = TrainingSet::new("b", 1, 0).unwrap();
        a.transfer_element(2, &mut b, None).unwrap();
        assert_eq!(values(&a), vec![0.0, 2.0]);
        assert_eq!(values(&b), vec![1.0]);

        // bad destination position: element returns to its old slot
        assert!(a.transfer_element(2, &mut b, Some(5)).is_err());
        assert_eq!(values(&a), vec![0.0, 2.0]);
        assert_indexed(&a);

        let mut wide = TrainingSet::new("wide", 2, 0).unwrap();
        assert!(a.transfer_element(1, &mut wide, None).is_err());
        assert_eq!(values(&a), vec![0.0, 2.0]);
        assert!(wide.is_empty());
    }

    #[test]
    fn test_destroy_cascade() {
        let mut set = numbered(2);
        assert!(matches!(set.destroy(false), Err(SomkitError::Structure(_))));
        assert_eq!(set.len(), 2);
        set.destroy(true).unwrap();
        assert!(set.is_empty());
        let mut empty = TrainingSet::new("e", 1, 0).unwrap();
        empty.destroy(false).unwrap();
    }

    #[test]
    fn test_merge_preserves_order() {
        let mut a = numbered(2);
        let mut b = numbered(3);
        TrainingSet::merge(&mut a, &mut b).unwrap();
        assert!(a.is_empty());
        assert_eq!(values(&b), vec![0.0, 1.0, 2.0, 0.0, 1.0]);
        assert_indexed(&b);
    }

    #[test]
    fn test_divide_criteria() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut set = numbered(5);
        let front = set.divide("front", 2, DivideCriterion::PickFirst, &mut rng).unwrap();
        assert_eq!(values(&front), vec![0.0, 1.0]);
        assert_eq!(values(&set), vec![2.0, 3.0, 4.0]);
        assert_indexed(&set);
        assert_indexed(&front);

        let back = set.divide("back", 2, DivideCriterion::PickLast, &mut rng).unwrap();
        assert_eq!(values(&back), vec![3.0, 4.0]);
        assert_eq!(values(&set), vec![2.0]);

        assert!(set.divide("too many", 2, DivideCriterion::PickFirst, &mut rng).is_err());
    }

    #[test]
    fn test_divide_merge_conserves() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for criterion in [DivideCriterion::PickFirst, DivideCriterion::PickLast, DivideCriterion::PickAtRandom] {
            let mut set = numbered(10);
            let mut part = set.divide("part", 4, criterion, &mut rng).unwrap();
            assert_eq!(part.len(), 4);
            assert_eq!(set.len(), 6);
            TrainingSet::merge(&mut part, &mut set).unwrap();
            assert_eq!(set.len(), 10);
            let mut sorted = values(&set);
            sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
            assert_eq!(sorted, values(&numbered(10)));
        }
    }

    #[test]
    fn test_randomize_is_permutation() {
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        let mut set = numbered(20);
        set.randomize(&mut rng).unwrap();
        assert_eq!(set.len(), 20);
        assert_eq!(set.name(), "numbers");
        assert_indexed(&set);
        let shuffled = values(&set);
        assert_ne!(shuffled, values(&numbered(20)));
        let mut sorted = shuffled;
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(sorted, values(&numbered(20)));
    }

    #[test]
    fn test_stats_require_elements() {
        let mut set = TrainingSet::new("e", 2, 0).unwrap();
        assert!(set.update_vector_stats(true, false).is_err());
        set.push(Vector::zeros(2), None).unwrap();
        assert!(set.update_vector_stats(false, true).is_err());
        set.update_vector_stats(true, false).unwrap();
        assert!(set.input_stats_current());
    }

    #[test]
    fn test_regularize_requires_current_stats() {
        let mut set = numbered(4);
        assert!(matches!(set.regularize(true, false), Err(SomkitError::Stats(_))));
        set.update_vector_stats(true, false).unwrap();
        set.push(Vector::from(vec![10.0]), None).unwrap();
        assert!(!set.input_stats_current());
        assert!(set.regularize(true, false).is_err());
    }

    #[test]
    fn test_regularize_inputs_with_foreign_stats() {
        let mut train = numbered(4);
        train.update_vector_stats(true, false).unwrap();
        let stats = train.input_stats().unwrap().clone();

        let mut other = numbered(2);
        other.update_vector_stats(true, false).unwrap();
        other.regularize_inputs_with(&stats).unwrap();
        assert!(!other.input_stats_current());
        // mean 1.5, std dev sqrt(1.25)
        let scale = 1.25f64.sqrt();
        assert!((values(&other)[0] + 1.5 / scale).abs() < 1e-12);
        assert!((values(&other)[1] + 0.5 / scale).abs() < 1e-12);

        let wide = VectorStats::from_moments(Vector::zeros(2), Vector::zeros(2)).unwrap();
        assert!(other.regularize_inputs_with(&wide).is_err());
    }

    #[test]
    fn test_regularize_zero_mean_unit_scale() {
        let mut set = TrainingSet::new("r", 2, 0).unwrap();
        for (a, b) in [(1.0, 10.0), (2.0, 20.0), (3.0, 60.0), (6.0, 30.0)] {
            set.push(Vector::from(vec![a, b]), None).unwrap();
        }
        set.update_vector_stats(true, false).unwrap();
        set.regularize(true, false).unwrap();
        set.update_vector_stats(true, false).unwrap();
        let stats = set.input_stats().unwrap().clone();
        for i in 0..2 {
            assert!(stats.average[i].abs() < 1e-9);
            assert!((stats.std_dev[i] - 1.0).abs() < 1e-9);
        }

        let before: Vec<Vector> = set.iter().map(|e| e.input().clone()).collect();
        set.regularize(true, false).unwrap();
        for (e, b) in set.iter().zip(before.iter()) {
            for i in 0..2 {
                assert!((e.input()[i] - b[i]).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_regularize_outputs() {
        let mut set = TrainingSet::new("o", 1, 1).unwrap();
        set.push(Vector::from(vec![0.0]), Some(Vector::from(vec![2.0]))).unwrap();
        set.push(Vector::from(vec![1.0]), Some(Vector::from(vec![4.0]))).unwrap();
        set.update_vector_stats(false, true).unwrap();
        set.regularize(false, true).unwrap();
        assert_eq!(set.element(1).unwrap().output().unwrap()[0], -1.0);
        assert_eq!(set.element(2).unwrap().output().unwrap()[0], 1.0);
        // inputs untouched
        assert_eq!(set.element(2).unwrap().input()[0], 1.0);
    }
}
