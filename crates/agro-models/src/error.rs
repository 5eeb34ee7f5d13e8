use std::error::Error;
use std::fmt;

/// Errors raised by the crop and yield predictors.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    /// Network construction or fitting failed; the instance is unusable.
    InitializationFailure(String),
    /// `predict` was called before training completed.
    ModelNotReady,
    /// `train` was called on a model that already finished training.
    AlreadyTrained,
}

impl ModelError {
    pub fn init<S: Into<String>>(msg: S) -> Self {
        ModelError::InitializationFailure(msg.into())
    }
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ModelError::InitializationFailure(msg) => {
                write!(f, "Model initialization failed: {}", msg)
            }
            ModelError::ModelNotReady => write!(f, "Model not loaded yet"),
            ModelError::AlreadyTrained => write!(f, "Model has already been trained"),
        }
    }
}

impl Error for ModelError {}

pub type Result<T> = std::result::Result<T, ModelError>;
