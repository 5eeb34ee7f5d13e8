use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ModelError, Result};

/// The two prediction tasks served by the crate.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Crop,
    Yield,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Crop => "crop",
            TaskType::Yield => "yield",
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "crop" | "classification" => Ok(TaskType::Crop),
            "yield" | "regression" => Ok(TaskType::Yield),
            _ => Err(format!(
                "Unknown task type: {}. Expected one of `crop` or `yield`",
                s
            )),
        }
    }
}

/// Hyper-parameters for one training run.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct TrainingConfig {
    pub learning_rate: f32,
    /// Number of epochs; each epoch draws a fresh synthetic batch.
    pub epochs: usize,
    /// Samples generated per epoch.
    pub batch_size: usize,
    /// When set, every epoch is split into shuffled mini-batches of this size
    /// with one optimizer update each. `None` means one full-batch update.
    #[serde(default)]
    pub mini_batch_size: Option<usize>,
    /// Seed for the training random source. `None` draws from entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl TrainingConfig {
    pub fn for_task(task: TaskType) -> Self {
        match task {
            TaskType::Crop => Self {
                learning_rate: 0.001,
                epochs: 5,
                batch_size: 100,
                mini_batch_size: None,
                seed: None,
            },
            TaskType::Yield => Self {
                learning_rate: 0.001,
                epochs: 10,
                batch_size: 200,
                mini_batch_size: None,
                seed: None,
            },
        }
    }

    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    /// Reject settings that cannot produce a trained network.
    pub fn validate(&self) -> Result<()> {
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(ModelError::init(format!(
                "learning_rate must be a positive finite number, got {}",
                self.learning_rate
            )));
        }
        if self.epochs == 0 {
            return Err(ModelError::init("epochs must be greater than zero"));
        }
        if self.batch_size == 0 {
            return Err(ModelError::init("batch_size must be greater than zero"));
        }
        if self.mini_batch_size == Some(0) {
            return Err(ModelError::init(
                "mini_batch_size must be greater than zero when set",
            ));
        }
        Ok(())
    }
}

/// Configuration for both predictors of a session.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ModelConfig {
    pub crop: TrainingConfig,
    #[serde(rename = "yield")]
    pub yield_model: TrainingConfig,
}

impl ModelConfig {
    pub fn for_task(&self, task: TaskType) -> &TrainingConfig {
        match task {
            TaskType::Crop => &self.crop,
            TaskType::Yield => &self.yield_model,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            crop: TrainingConfig::for_task(TaskType::Crop),
            yield_model: TrainingConfig::for_task(TaskType::Yield),
        }
    }
}
