//! Training and test sets.
//!
//! A [`TrainingSet`] owns an ordered list of [`TElement`]s, each an input
//! vector with an optional desired output. Elements move between sets by
//! value, so an element is never a member of two sets at once.

mod element;
mod stats;
mod training_set;

pub use element::{AttachRejected, TElement};
pub use stats::VectorStats;
pub use training_set::{DivideCriterion, TrainingSet};
