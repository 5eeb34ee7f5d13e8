use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::TrainingConfig;
use crate::error::{ModelError, Result};
use crate::models::network::FeedForwardNetwork;
use crate::models::trainer::TrainingReport;

/// Contract shared by the crop and yield predictors.
///
/// A model starts untrained. `train` builds and fits its network exactly once;
/// until that succeeds every prediction fails with `ModelNotReady`, and after
/// a failed run predictions keep returning the training error.
pub trait PredictiveModel: Send + Sync {
    type Input: Sync;
    type Output: Send;

    /// Build and train the network, drawing all randomness from `rng`.
    fn train<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<TrainingReport>;

    /// Train with a source seeded from the configuration, or from entropy
    /// when no seed is configured.
    fn train_from_config(&mut self) -> Result<TrainingReport> {
        let mut rng = match self.training_config().seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.train(&mut rng)
    }

    fn is_ready(&self) -> bool;

    fn training_config(&self) -> &TrainingConfig;

    /// Predict with an injected random source (used by the crop suitability
    /// bonus; deterministic models ignore it).
    fn predict_with_rng<R: Rng + ?Sized>(&self, input: &Self::Input, rng: &mut R)
        -> Result<Self::Output>;

    fn predict(&self, input: &Self::Input) -> Result<Self::Output> {
        self.predict_with_rng(input, &mut rand::thread_rng())
    }

    fn name(&self) -> &str;
}

/// Readiness of a single predictor.
#[derive(Debug, Clone, Default)]
pub(crate) enum ModelState {
    #[default]
    Untrained,
    Ready(FeedForwardNetwork),
    Failed(String),
}

impl ModelState {
    pub(crate) fn is_ready(&self) -> bool {
        matches!(self, ModelState::Ready(_))
    }

    pub(crate) fn network(&self) -> Result<&FeedForwardNetwork> {
        match self {
            ModelState::Ready(network) => Ok(network),
            ModelState::Untrained => Err(ModelError::ModelNotReady),
            ModelState::Failed(reason) => Err(ModelError::InitializationFailure(reason.clone())),
        }
    }

    /// Error if training was already attempted.
    pub(crate) fn ensure_untrained(&self) -> Result<()> {
        match self {
            ModelState::Untrained => Ok(()),
            ModelState::Ready(_) => Err(ModelError::AlreadyTrained),
            ModelState::Failed(reason) => Err(ModelError::InitializationFailure(reason.clone())),
        }
    }

    /// Record the outcome of a training run.
    pub(crate) fn settle(
        &mut self,
        name: &str,
        outcome: Result<(FeedForwardNetwork, TrainingReport)>,
    ) -> Result<TrainingReport> {
        match outcome {
            Ok((network, report)) => {
                *self = ModelState::Ready(network);
                Ok(report)
            }
            Err(e) => {
                log::error!("{} failed to initialize: {}", name, e);
                let reason = match &e {
                    ModelError::InitializationFailure(reason) => reason.clone(),
                    other => other.to_string(),
                };
                *self = ModelState::Failed(reason);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untrained_state_is_not_ready() {
        let state = ModelState::default();
        assert!(!state.is_ready());
        assert_eq!(state.network().unwrap_err(), ModelError::ModelNotReady);
        assert!(state.ensure_untrained().is_ok());
    }

    #[test]
    fn failed_state_is_sticky() {
        let mut state = ModelState::default();
        let err = state
            .settle("test", Err(ModelError::init("boom")))
            .unwrap_err();
        assert_eq!(err, ModelError::InitializationFailure("boom".into()));
        assert_eq!(
            state.network().unwrap_err(),
            ModelError::InitializationFailure("boom".into())
        );
        assert!(state.ensure_untrained().is_err());
    }
}
