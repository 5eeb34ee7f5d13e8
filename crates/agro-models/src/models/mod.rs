pub mod crop;
pub mod network;
pub mod optimizer;
pub mod predictive_model;
pub mod trainer;
pub mod yield_model;

pub use crop::CropRecommender;
pub use predictive_model::PredictiveModel;
pub use trainer::{EpochMetrics, TrainingReport};
pub use yield_model::YieldPredictor;
