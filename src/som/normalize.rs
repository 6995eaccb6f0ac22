//! Input normalization carried by a map's input units.
//!
//! A map trained on regularized inputs only makes sense for data scaled the
//! same way. The statistics live in the input units' average and standard
//! deviation, which network files keep, so a reloaded map can scale raw data
//! before classification.

use crate::error::{Result, SomkitError};
use crate::set::{TrainingSet, VectorStats};
use crate::topology::Network;
use crate::vector::Vector;
use log::info;

/// Records `stats` in the input units, one dimension per unit.
pub fn store_input_stats(network: &mut Network, stats: &VectorStats) -> Result<()> {
    let input = network.input_layer()?;
    let units = network.layer(input)?.units().to_vec();
    if units.len() != stats.average.dim() {
        return Err(SomkitError::DimensionMismatch {
            expected: units.len(),
            found: stats.average.dim(),
        });
    }
    for (i, unit) in units.into_iter().enumerate() {
        network.set_unit_stats(unit, stats.average[i], stats.std_dev[i])?;
    }
    Ok(())
}

/// Statistics recorded in the input units, or `None` when no unit carries any.
pub fn input_stats(network: &Network) -> Result<Option<VectorStats>> {
    let input = network.input_layer()?;
    let mut average = Vec::new();
    let mut std_dev = Vec::new();
    for &id in network.layer(input)?.units() {
        let unit = network.unit(id)?;
        average.push(unit.average());
        std_dev.push(unit.std_dev());
    }
    if average.iter().chain(&std_dev).all(|&x| x == 0.0) {
        return Ok(None);
    }
    VectorStats::from_moments(Vector::from(average), Vector::from(std_dev)).map(Some)
}

/// Regularizes the inputs of `set` with the statistics stored in `network`.
/// Returns whether any were stored.
pub fn apply_input_stats(network: &Network, set: &mut TrainingSet) -> Result<bool> {
    match input_stats(network)? {
        Some(stats) => {
            set.regularize_inputs_with(&stats)?;
            info!("Regularized '{}' with the input statistics of '{}'", set.name(), network.name());
            Ok(true)
        }
        None => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FunctionSpec, SomConfig};
    use crate::som::build_som;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn map() -> Network {
        let config = SomConfig {
            rows: 1,
            cols: 2,
            input_dimension: 2,
            weight_init: FunctionSpec::new("constant", vec![0.0]),
            ..Default::default()
        };
        build_som(&config, &mut ChaCha8Rng::seed_from_u64(0)).unwrap()
    }

    fn offset_set() -> TrainingSet {
        let mut set = TrainingSet::new("raw", 2, 0).unwrap();
        for (a, b) in [(100.0, -4.0), (102.0, -2.0), (104.0, -6.0)] {
            set.push(Vector::from(vec![a, b]), None).unwrap();
        }
        set
    }

    #[test]
    fn test_unregularized_map_has_no_stats() {
        let net = map();
        assert!(input_stats(&net).unwrap().is_none());
        let mut set = offset_set();
        assert!(!apply_input_stats(&net, &mut set).unwrap());
        assert_eq!(set.element(1).unwrap().input().as_slice(), &[100.0, -4.0]);
    }

    #[test]
    fn test_stored_stats_reproduce_regularization() {
        let mut trained = offset_set();
        trained.update_vector_stats(true, false).unwrap();
        let stats = trained.input_stats().unwrap().clone();
        trained.regularize(true, false).unwrap();

        let mut net = map();
        store_input_stats(&mut net, &stats).unwrap();
        let stored = input_stats(&net).unwrap().unwrap();
        assert_eq!(stored.average, stats.average);
        assert_eq!(stored.std_dev, stats.std_dev);

        let mut raw = offset_set();
        assert!(apply_input_stats(&net, &mut raw).unwrap());
        for (a, b) in raw.iter().zip(trained.iter()) {
            assert_eq!(a.input(), b.input());
        }
    }

    #[test]
    fn test_store_checks_dimension() {
        let mut net = map();
        let stats = VectorStats::from_moments(Vector::zeros(3), Vector::zeros(3)).unwrap();
        assert!(matches!(
            store_input_stats(&mut net, &stats),
            Err(SomkitError::DimensionMismatch { expected: 2, found: 3 })
        ));
    }
}
