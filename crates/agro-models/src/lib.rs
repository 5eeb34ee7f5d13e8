//! agro-models: crop recommendation and yield prediction.
//!
//! Two small feed-forward networks are built and trained in-process on
//! synthetic agronomic data, then served for inference:
//!
//! - [`CropRecommender`] classifies soil and climate measurements into one of
//!   22 crops and returns the three most likely, each with a rule-based
//!   suitability score.
//! - [`YieldPredictor`] regresses a harvest estimate from farm parameters,
//!   scales it by a regional productivity factor and adds a factor breakdown
//!   and recommendation text.
//!
//! Training draws every random number from a caller-supplied `Rng`, so a
//! seeded source reproduces a trained model exactly. [`ModelSession`] runs
//! training on a background thread and gates predictions on readiness.
pub mod config;
pub mod data_handling;
pub mod error;
pub mod models;
pub mod preprocessing;
pub mod scoring;
pub mod session;
pub mod synthetic;

pub use config::{ModelConfig, TaskType, TrainingConfig};
pub use data_handling::{
    CropInput, CropPrediction, FactorScores, Season, YieldInput, YieldPrediction, CROP_LABELS,
};
pub use error::{ModelError, Result};
pub use models::{CropRecommender, PredictiveModel, TrainingReport, YieldPredictor};
pub use session::ModelSession;
