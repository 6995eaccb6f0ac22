//! Forward activation and winner-take-all competition.

use super::{LayerId, Network, UnitId};
use crate::error::{Result, SomkitError};
use crate::vector::{Metric, Vector};

impl Network {
    /// Loads `input` into the first layer: each unit's activation and
    /// output become the matching component.
    pub fn load_input(&mut self, input: &Vector) -> Result<()> {
        let layer = self.input_layer()?;
        let units = self.layer(layer)?.units.clone();
        if units.len() != input.dim() {
            return Err(SomkitError::DimensionMismatch {
                expected: units.len(),
                found: input.dim(),
            });
        }
        for (unit, &x) in units.into_iter().zip(input.iter()) {
            let u = self.unit_mut(unit)?;
            u.activation = x;
            u.output = x;
        }
        Ok(())
    }

    /// Activates every unit of `layer`.
    ///
    /// A unit's net input is `metric(incoming weights, origin outputs)`;
    /// its output is its activation function applied to that. Units with no
    /// incoming connections keep their current activation.
    pub fn activate_layer(&mut self, layer: LayerId, metric: Metric) -> Result<()> {
        let units = self.layer(layer)?.units.clone();
        for unit in units {
            let net = self.net_input(unit, metric)?;
            let u = self.unit_mut(unit)?;
            if let Some(net) = net {
                u.activation = net;
            }
            u.output = u.function.evaluate(u.activation);
        }
        Ok(())
    }

    /// Activates every attached layer after the first, in order.
    pub fn activate_network(&mut self, metric: Metric) -> Result<()> {
        let layers: Vec<LayerId> = self.order.iter().skip(1).copied().collect();
        for layer in layers {
            self.activate_layer(layer, metric)?;
        }
        Ok(())
    }

    fn net_input(&self, unit: UnitId, metric: Metric) -> Result<Option<f64>> {
        let u = self.unit(unit)?;
        if u.destination.is_empty() {
            return Ok(None);
        }
        let mut weights = Vec::with_capacity(u.destination.len());
        let mut inputs = Vec::with_capacity(u.destination.len());
        for c in &u.destination {
            let conn = self.connection(*c)?;
            weights.push(conn.weight);
            inputs.push(self.unit(conn.origin)?.output);
        }
        metric.eval(&weights, &inputs).map(Some)
    }

    /// Outputs of the origins of `unit`'s incoming connections, in
    /// incoming-list order: the input its weight vector is compared with.
    pub fn unit_inputs(&self, unit: UnitId) -> Result<Vector> {
        self.unit(unit)?
            .destination
            .iter()
            .map(|c| {
                let origin = self.connection(*c)?.origin;
                self.unit(origin).map(|u| u.output)
            })
            .collect::<Result<Vec<f64>>>()
            .map(Vector::from)
    }

    /// Outputs of the units of `layer`, in order.
    pub fn layer_outputs(&self, layer: LayerId) -> Result<Vector> {
        self.layer(layer)?
            .units
            .iter()
            .map(|u| self.unit(*u).map(|u| u.output))
            .collect::<Result<Vec<f64>>>()
            .map(Vector::from)
    }

    /// The unit of `layer` with the best output: strictly smallest for
    /// Euclidean, strictly largest for inner product. Ties keep the first.
    pub fn layer_winner(&self, layer: LayerId, metric: Metric) -> Result<UnitId> {
        let mut best: Option<(UnitId, f64)> = None;
        for &unit in &self.layer(layer)?.units {
            let score = self.unit(unit)?.output;
            match best {
                Some((_, b)) if !metric.is_better(score, b) => {}
                _ => best = Some((unit, score)),
            }
        }
        best.map(|(u, _)| u)
            .ok_or_else(|| SomkitError::Structure(format!("{} has no units", layer)))
    }

    /// Best unit and runner-up of `layer` in one pass. The runner-up is
    /// `None` for a single-unit layer.
    pub fn layer_two_winners(&self, layer: LayerId, metric: Metric) -> Result<(UnitId, Option<UnitId>)> {
        let mut best: Option<(UnitId, f64)> = None;
        let mut second: Option<(UnitId, f64)> = None;
        for &unit in &self.layer(layer)?.units {
            let score = self.unit(unit)?.output;
            match best {
                Some((_, b)) if !metric.is_better(score, b) => match second {
                    Some((_, s)) if !metric.is_better(score, s) => {}
                    _ => second = Some((unit, score)),
                },
                _ => {
                    second = best;
                    best = Some((unit, score));
                }
            }
        }
        let (winner, _) = best.ok_or_else(|| SomkitError::Structure(format!("{} has no units", layer)))?;
        Ok((winner, second.map(|(u, _)| u)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::{LayerClass, Placement};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn with_outputs(outputs: &[f64]) -> (Network, LayerId, Vec<UnitId>) {
        let mut net = Network::new("w");
        let l = net.create_layer(LayerClass::Output, "out", Placement::Append).unwrap();
        let units = net.add_units(l, outputs.len()).unwrap();
        for (u, &o) in units.iter().zip(outputs) {
            net.unit_mut(*u).unwrap().output = o;
        }
        (net, l, units)
    }

    #[test]
    fn test_winner_by_metric() {
        let (net, l, units) = with_outputs(&[0.7, 0.9]);
        assert_eq!(net.layer_winner(l, Metric::InnerProduct).unwrap(), units[1]);
        assert_eq!(net.layer_winner(l, Metric::Euclidean).unwrap(), units[0]);
    }

    #[test]
    fn test_winner_tie_keeps_first() {
        let (net, l, units) = with_outputs(&[0.5, 0.2, 0.2]);
        assert_eq!(net.layer_winner(l, Metric::Euclidean).unwrap(), units[1]);
    }

    #[test]
    fn test_empty_layer_has_no_winner() {
        let (net, l, _) = with_outputs(&[]);
        assert!(net.layer_winner(l, Metric::Euclidean).is_err());
    }

    #[test]
    fn test_two_winners() {
        let (net, l, units) = with_outputs(&[0.4, 0.1, 0.3, 0.2]);
        let (w, s) = net.layer_two_winners(l, Metric::Euclidean).unwrap();
        assert_eq!(w, units[1]);
        assert_eq!(s, Some(units[3]));

        let (w, s) = net.layer_two_winners(l, Metric::InnerProduct).unwrap();
        assert_eq!(w, units[0]);
        assert_eq!(s, Some(units[2]));

        let (single, _, units) = with_outputs(&[1.0]);
        let l = single.layer_ids()[0];
        assert_eq!(single.layer_two_winners(l, Metric::Euclidean).unwrap(), (units[0], None));
    }

    #[test]
    fn test_activation_euclidean() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut net = Network::new("a");
        let input = net.create_layer(LayerClass::Input, "in", Placement::Append).unwrap();
        let output = net.create_layer(LayerClass::Output, "out", Placement::Append).unwrap();
        net.add_units(input, 2).unwrap();
        let outs = net.add_units(output, 2).unwrap();
        net.connect_layers(input, output, 0.0, None, &mut rng).unwrap();
        net.set_unit_weights(outs[0], &Vector::from(vec![1.0, 0.0])).unwrap();
        net.set_unit_weights(outs[1], &Vector::from(vec![0.0, 1.0])).unwrap();

        net.load_input(&Vector::from(vec![0.9, 0.1])).unwrap();
        net.activate_network(Metric::Euclidean).unwrap();
        assert_eq!(net.layer_winner(output, Metric::Euclidean).unwrap(), outs[0]);
        let outputs = net.layer_outputs(output).unwrap();
        assert!((outputs[0] - (0.02f64).sqrt()).abs() < 1e-12);

        assert!(net.load_input(&Vector::zeros(3)).is_err());
    }
}
