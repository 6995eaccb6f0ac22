//! Construction of SOM networks.

use crate::config::SomConfig;
use crate::error::Result;
use crate::function::FunctionKind;
use crate::topology::{Extension, LayerClass, Network, Placement, SomExtension};
use log::info;
use rand::Rng;

/// Builds a two-layer SOM: an input layer of `input_dimension` units fully
/// connected to a `rows x cols` output grid, with weights drawn from the
/// configured initializer and grid coordinates on the output units.
pub fn build_som<R: Rng + ?Sized>(config: &SomConfig, rng: &mut R) -> Result<Network> {
    let neighborhood = config.neighborhood.instance(FunctionKind::Neighborhood)?;
    let learning_rate = config.learning_rate.instance(FunctionKind::LearningRate)?;
    let init = config.weight_init.instance(FunctionKind::WeightInit)?;
    for f in [&neighborhood, &learning_rate, &init] {
        f.validate()?;
    }

    let mut network = Network::new(config.name.clone());
    let input = network.create_layer(LayerClass::Input, "input", Placement::Append)?;
    let output = network.create_layer(LayerClass::Output, "map", Placement::Append)?;
    network.add_units(input, config.input_dimension)?;
    network.add_units(output, config.total_units())?;
    network.connect_layers(input, output, 0.0, Some(&init), rng)?;
    network.assign_grid_coordinates(output, config.rows, config.cols)?;
    network.set_extension(Some(Extension::Som(SomExtension::new(
        neighborhood,
        learning_rate,
    )?)));

    info!(
        "Built SOM '{}': {} inputs, {}x{} map, {} connections",
        config.name,
        config.input_dimension,
        config.rows,
        config.cols,
        network.connection_count()
    );
    Ok(network)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FunctionSpec;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn test_config() -> SomConfig {
        SomConfig {
            rows: 3,
            cols: 4,
            input_dimension: 5,
            weight_init: FunctionSpec::new("uniform", vec![-1.0, 1.0]),
            ..Default::default()
        }
    }

    #[test]
    fn test_build_shape() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let net = build_som(&test_config(), &mut rng).unwrap();
        assert_eq!(net.layer_count(), 2);
        assert_eq!(net.unit_count(), 17);
        assert_eq!(net.connection_count(), 60);
        assert!(net.som().is_ok());
        net.check_invariants().unwrap();
    }

    #[test]
    fn test_weights_from_initializer() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let net = build_som(&test_config(), &mut rng).unwrap();
        let out = net.output_layer().unwrap();
        let weights = net.unit_weights(net.layer(out).unwrap().units()[0]).unwrap();
        assert_eq!(weights.dim(), 5);
        assert!(weights.iter().all(|w| (-1.0..1.0).contains(w)));
        assert!(weights.iter().any(|&w| w != weights[0]));
    }

    #[test]
    fn test_grid_positions() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let net = build_som(&test_config(), &mut rng).unwrap();
        let out = net.output_layer().unwrap();
        let units = net.layer(out).unwrap().units();
        for (k, u) in units.iter().enumerate() {
            let c = net.unit(*u).unwrap().coordinate().unwrap();
            assert_eq!(c.as_slice(), &[(k / 4) as f64, (k % 4) as f64]);
        }
    }
}
