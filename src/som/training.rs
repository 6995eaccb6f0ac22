//! SOM training engine.
//!
//! One training step runs three phases on a network carrying a
//! [`SomExtension`](crate::topology::SomExtension):
//!
//! 1. **Competition**: load the input, activate the network under the
//!    neighborhood's metric, pick the output layer's winner.
//! 2. **Cooperation**: weight every output unit by the neighborhood
//!    function of its coordinate distance to the winner.
//! 3. **Adaptation**: pull each weighted unit's weights toward its input by
//!    `rate * h * (x - w)`.
//!
//! Elements are visited in set order and output units in layer order, so a
//! given seed reproduces a training trace exactly. Training time lives in an
//! explicit [`SomSession`].

use crate::config::TrainingConfig;
use crate::error::{Result, SomkitError};
use crate::function::neighborhood::TIME_PARAM;
use crate::set::{TElement, TrainingSet};
use crate::topology::{Network, UnitId};
use crate::vector::{Metric, Vector};
use indicatif::ProgressBar;
use log::{debug, info};
use rand::Rng;

/// Updates smaller than this (rate times neighborhood weight) are skipped.
pub const NOISE_THRESHOLD: f64 = 1e-10;

/// Training-time counter for one training run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SomSession {
    time: usize,
}

impl SomSession {
    /// Creates a session at time 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resumes a session at `time`, e.g. after loading a checkpoint.
    pub fn at(time: usize) -> Self {
        Self { time }
    }

    /// Current time: the number of completed [`train_set`] calls since the
    /// last reset.
    #[inline]
    pub fn time(&self) -> usize {
        self.time
    }

    /// Resets time to 0.
    pub fn reset(&mut self) {
        self.time = 0;
    }

    fn advance(&mut self) {
        self.time += 1;
    }
}

/// Session that continues after the last epoch a network was trained for,
/// whose time the neighborhood's time parameter records.
pub fn resume_session(network: &Network) -> Result<SomSession> {
    let time = network.som()?.neighborhood().param(TIME_PARAM)?;
    if !time.is_finite() || time < 0.0 || time.fract() != 0.0 {
        return Err(SomkitError::Training(format!("stored training time {} is not an epoch", time)));
    }
    Ok(SomSession::at(time as usize + 1))
}

/// Outcome of one [`train_set`] call.
#[derive(Debug, Clone, PartialEq)]
pub struct EpochReport {
    /// Time at which the epoch ran.
    pub time: usize,
    /// Learning rate used for the epoch.
    pub learning_rate: f64,
    /// Mean quantization error measured during competition.
    pub mse: f64,
}

/// Outcome of [`propagate_set`].
#[derive(Debug, Clone, PartialEq)]
pub struct PropagationReport {
    /// 1-based winner index in the output layer, one per element.
    pub winners: Vec<usize>,
    /// Mean quantization error, when requested.
    pub mse: Option<f64>,
}

/// Squared distance between `input` and `weights`, per component.
fn discrepancy(input: &Vector, weights: &Vector) -> Result<f64> {
    let d = Metric::Euclidean.eval(input.as_slice(), weights.as_slice())?;
    Ok(d * d / input.dim().max(1) as f64)
}

fn check_set(network: &Network, set: &TrainingSet) -> Result<()> {
    if set.is_empty() {
        return Err(SomkitError::Training(format!("training set '{}' is empty", set.name())));
    }
    let inputs = network.layer(network.input_layer()?)?.unit_count();
    if set.input_dim() != inputs {
        return Err(SomkitError::DimensionMismatch {
            expected: inputs,
            found: set.input_dim(),
        });
    }
    Ok(())
}

/// Competition: propagates `element` and returns the output layer's winner.
pub fn propagate_element(network: &mut Network, element: &TElement) -> Result<UnitId> {
    let metric = network.som()?.metric();
    network.load_input(element.input())?;
    network.activate_network(metric)?;
    let output = network.output_layer()?;
    network.layer_winner(output, metric)
}

/// Cooperation: the neighborhood weight of every output unit around `winner`.
pub fn ngb_vector(network: &Network, winner: UnitId) -> Result<Vec<f64>> {
    let neighborhood = network.som()?.neighborhood();
    let center = network
        .unit(winner)?
        .coordinate()
        .ok_or_else(|| SomkitError::InvalidArgument(format!("winner {} has no coordinate", winner)))?;

    let output = network.output_layer()?;
    network
        .layer(output)?
        .units()
        .iter()
        .map(|u| {
            let coordinate = network
                .unit(*u)?
                .coordinate()
                .ok_or_else(|| SomkitError::InvalidArgument(format!("{} has no coordinate", u)))?;
            let distance = coordinate.metric(center, Metric::Euclidean)?;
            Ok(neighborhood.evaluate(distance))
        })
        .collect()
}

/// Runs competition, cooperation and adaptation for one element at the
/// given learning rate. Returns the winner and its quantization error
/// before adaptation. Every update is computed before any is committed, and
/// a non-finite neighborhood weight or weight leaves the map untouched.
pub fn train_element(network: &mut Network, element: &TElement, rate: f64) -> Result<(UnitId, f64)> {
    let winner = propagate_element(network, element)?;
    let error = discrepancy(&network.unit_inputs(winner)?, &network.unit_weights(winner)?)?;
    let ngb = ngb_vector(network, winner)?;

    let output = network.output_layer()?;
    let units = network.layer(output)?.units().to_vec();
    let mut updates = Vec::with_capacity(units.len());
    for (unit, h) in units.into_iter().zip(ngb) {
        if !h.is_finite() {
            return Err(SomkitError::Training(format!("neighborhood weight {} for {}", h, unit)));
        }
        let step = rate * h;
        if step <= NOISE_THRESHOLD {
            continue;
        }
        let weights = network.unit_weights(unit)?;
        let input = network.unit_inputs(unit)?;
        let updated = weights.sum(&input.subtract(&weights)?.scalar_multiply(step))?;
        if updated.iter().any(|w| !w.is_finite()) {
            return Err(SomkitError::Training(format!("non-finite weight update for {}", unit)));
        }
        updates.push((unit, updated));
    }

    for (unit, updated) in &updates {
        network.set_unit_weights(*unit, updated)?;
    }
    Ok((winner, error))
}

/// One epoch over `set` in set order.
///
/// When `reset` is set the session starts over at time 0. The learning rate
/// is the schedule evaluated at the current time, and the time is written
/// into the neighborhood's first parameter before any element is trained.
/// The session advances by one afterwards.
pub fn train_set(
    network: &mut Network,
    set: &TrainingSet,
    session: &mut SomSession,
    reset: bool,
    progress: Option<&ProgressBar>,
) -> Result<EpochReport> {
    check_set(network, set)?;
    if reset {
        session.reset();
    }

    let time = session.time();
    let rate = {
        let som = network.som_mut()?;
        som.neighborhood_mut().set_param(TIME_PARAM, time as f64)?;
        som.learning_rate().evaluate(time as f64)
    };
    if !rate.is_finite() {
        return Err(SomkitError::Training(format!("learning rate {} at time {}", rate, time)));
    }

    if let Some(pb) = progress {
        pb.set_length(set.len() as u64);
        pb.set_position(0);
        pb.set_message(format!("epoch {} (rate {:.4})", time, rate));
    }

    let mut total = 0.0;
    for element in set.iter() {
        let (_, error) = train_element(network, element, rate)?;
        total += error;
        if let Some(pb) = progress {
            pb.inc(1);
        }
    }

    session.advance();
    let mse = total / set.len() as f64;
    debug!("Epoch {}: rate={:.5}, mse={:.6}", time, rate, mse);
    Ok(EpochReport {
        time,
        learning_rate: rate,
        mse,
    })
}

/// Inference only: the winner of every element and, if `with_error` is set,
/// the mean quantization error.
pub fn propagate_set(network: &mut Network, set: &TrainingSet, with_error: bool) -> Result<PropagationReport> {
    check_set(network, set)?;

    let mut winners = Vec::with_capacity(set.len());
    let mut total = 0.0;
    for element in set.iter() {
        let winner = propagate_element(network, element)?;
        if with_error {
            total += discrepancy(element.input(), &network.unit_weights(winner)?)?;
        }
        winners.push(network.unit(winner)?.index());
    }

    Ok(PropagationReport {
        winners,
        mse: with_error.then(|| total / set.len() as f64),
    })
}

/// Mean quantization error of `set` on the current map.
pub fn quantization_error(network: &mut Network, set: &TrainingSet) -> Result<f64> {
    let report = propagate_set(network, set, true)?;
    Ok(report.mse.unwrap_or_default())
}

/// Runs `config.epochs` epochs continuing from the session's current time,
/// shuffling before each epoch when configured. Pass a fresh [`SomSession`]
/// to start the schedules over, or [`resume_session`] to continue a saved
/// map. `on_epoch` sees every report and the network after the epoch; its
/// error aborts training. Stops early once an epoch's error drops below
/// `config.tolerance`.
pub fn train_epochs<R, F>(
    network: &mut Network,
    set: &mut TrainingSet,
    session: &mut SomSession,
    config: &TrainingConfig,
    rng: &mut R,
    progress: Option<&ProgressBar>,
    mut on_epoch: F,
) -> Result<Vec<EpochReport>>
where
    R: Rng + ?Sized,
    F: FnMut(&EpochReport, &Network) -> Result<()>,
{
    info!(
        "Starting SOM training: {} epochs on {} elements from time {}",
        config.epochs,
        set.len(),
        session.time()
    );

    let mut reports = Vec::with_capacity(config.epochs);
    for epoch in 0..config.epochs {
        if config.shuffle {
            set.randomize(rng)?;
        }
        let report = train_set(network, set, session, false, progress)?;
        on_epoch(&report, network)?;

        if epoch % 10 == 0 || epoch + 1 == config.epochs {
            info!(
                "Epoch {}/{}: rate={:.4}, mse={:.6}",
                epoch + 1,
                config.epochs,
                report.learning_rate,
                report.mse
            );
        }

        let converged = config.tolerance.is_some_and(|tol| report.mse < tol);
        reports.push(report);
        if converged {
            info!("Converged after {} epochs", epoch + 1);
            break;
        }
    }

    info!("SOM training completed");
    Ok(reports)
}
