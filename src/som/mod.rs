//! Self-Organizing Map (SOM) construction, training and analysis.
//!
//! - **Builder**: two-layer map with grid coordinates (builder.rs)
//! - **Training**: competition, cooperation and adaptation (training.rs)
//! - **Maps**: classification and transition matrices from winners (maps.rs)
//! - **Normalize**: input statistics stored in the input units (normalize.rs)

mod builder;
mod maps;
mod normalize;
pub mod training;

pub use builder::build_som;
pub use maps::{ClassificationMatrix, TransitionMatrix};
pub use normalize::{apply_input_stats, input_stats, store_input_stats};
pub use training::{
    ngb_vector, propagate_element, propagate_set, quantization_error, resume_session, train_element,
    train_epochs, train_set, EpochReport, PropagationReport, SomSession, NOISE_THRESHOLD,
};
