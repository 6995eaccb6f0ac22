//! # somkit - Neural Network Toolkit with Self-Organizing Maps
//!
//! somkit builds layered networks of units joined by weighted connections,
//! manages sets of training elements, and trains Kohonen Self-Organizing
//! Maps on them.
//!
//! ## Overview
//!
//! A [`Network`] owns its layers, units and connections and addresses them
//! through typed handles. Every unit evaluates a parameterized activation
//! [`FunctionInstance`]; the same function machinery supplies weight
//! initializers, learning-rate schedules and SOM neighborhoods. A
//! [`TrainingSet`] holds ordered input/output vector pairs together with
//! cached statistics. The [`som`] engine trains a map by competition,
//! cooperation and adaptation, with training time carried in a
//! [`SomSession`].
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//! use somkit::{build_som, io, train_epochs, Config, SomSession};
//!
//! let config = Config::from_json_file("som.json")?;
//! let mut rng = ChaCha8Rng::seed_from_u64(config.training.seed.unwrap_or(0));
//!
//! let mut map = build_som(&config.som, &mut rng)?;
//! let mut set = io::load_triples("frames.trp", "frames", config.som.input_dimension, 0)?;
//!
//! let mut session = SomSession::new();
//! train_epochs(&mut map, &mut set, &mut session, &config.training, &mut rng, None, |_, _| Ok(()))?;
//! io::write_network(&map, "trained.net")?;
//! ```
//!
//! ## Architecture
//!
//! - [`vector`] - Real vectors and metrics
//! - [`function`] - Parameterized function classes and instances
//! - [`topology`] - Networks, layers, units and connections
//! - [`set`] - Training elements, sets and statistics
//! - [`som`] - SOM construction, training and analysis
//! - [`io`] - Network files, triple files and control tables
//! - [`config`] - JSON configuration

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod function;
pub mod io;
pub mod set;
pub mod som;
pub mod topology;
pub mod vector;

// Re-export commonly used types
pub use config::{Config, FunctionSpec, SomConfig, TrainingConfig};
pub use error::{Result, SomkitError};
pub use function::{FunctionClass, FunctionInstance, FunctionKind};
pub use set::{DivideCriterion, TElement, TrainingSet, VectorStats};
pub use som::{
    apply_input_stats, build_som, propagate_set, resume_session, store_input_stats, train_epochs, train_set,
    ClassificationMatrix, EpochReport, SomSession, TransitionMatrix,
};
pub use topology::{ConnectionId, Extension, LayerClass, LayerId, Network, Placement, SomExtension, UnitId};
pub use vector::{Metric, Vector};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
