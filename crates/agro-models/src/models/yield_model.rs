use rand::Rng;
use rayon::prelude::*;

use crate::config::{TaskType, TrainingConfig};
use crate::data_handling::{YieldInput, YieldPrediction, NUM_FEATURES};
use crate::error::Result;
use crate::models::network::{Activation, FeedForwardNetwork, LayerSpec, Loss};
use crate::models::predictive_model::{ModelState, PredictiveModel};
use crate::models::trainer::{self, TrainingReport};
use crate::preprocessing::normalize_yield;
use crate::scoring::{
    factor_breakdown, finalize_yield, recommendations, state_factor, yield_confidence,
};
use crate::synthetic::generate_yield_batch;

const NAME: &str = "yield-prediction";

pub fn yield_architecture() -> Vec<LayerSpec> {
    vec![
        LayerSpec::dense(64, Activation::Relu).with_dropout(0.2),
        LayerSpec::dense(32, Activation::Relu).with_dropout(0.1),
        LayerSpec::dense(16, Activation::Relu),
        LayerSpec::dense(1, Activation::Linear),
    ]
}

/// Estimates harvest in quintals from farm parameters, adjusted by a
/// regional productivity factor.
#[derive(Debug, Clone)]
pub struct YieldPredictor {
    config: TrainingConfig,
    state: ModelState,
    report: Option<TrainingReport>,
}

impl Default for YieldPredictor {
    fn default() -> Self {
        Self {
            config: TrainingConfig::for_task(TaskType::Yield),
            state: ModelState::Untrained,
            report: None,
        }
    }
}

impl YieldPredictor {
    pub fn new(config: TrainingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::default()
        })
    }

    pub fn training_report(&self) -> Option<&TrainingReport> {
        self.report.as_ref()
    }

    fn fit<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<(FeedForwardNetwork, TrainingReport)> {
        let mut network = FeedForwardNetwork::build(NUM_FEATURES, &yield_architecture(), rng)?;
        let batch_size = self.config.batch_size;

        // Start the output at the scale of the targets; the first batch is
        // then reused as epoch 1.
        let first = generate_yield_batch(batch_size, rng);
        let target_mean = first.targets.mean().unwrap_or(0.0);
        network.set_output_bias(target_mean);
        log::debug!("[{}] output bias initialized to {:.2}", NAME, target_mean);

        let mut pending = Some(first);
        let report = trainer::fit(
            &mut network,
            &self.config,
            TaskType::Yield,
            Loss::MeanSquaredError,
            |rng| {
                let batch = pending
                    .take()
                    .unwrap_or_else(|| generate_yield_batch(batch_size, rng));
                let targets = batch.target_column();
                (batch.features, targets)
            },
            trainer::mean_absolute_error,
            rng,
        )?;
        Ok((network, report))
    }

    /// Network output before the regional factor and rounding.
    pub fn predict_raw(&self, input: &YieldInput) -> Result<f32> {
        let network = self.state.network()?;
        let output = network.predict_row(&normalize_yield(input))?;
        Ok(output.first().copied().unwrap_or(0.0))
    }

    pub fn predict_batch(&self, inputs: &[YieldInput]) -> Result<Vec<YieldPrediction>> {
        self.state.network()?;
        inputs.par_iter().map(|input| self.predict(input)).collect()
    }
}

impl PredictiveModel for YieldPredictor {
    type Input = YieldInput;
    type Output = YieldPrediction;

    fn train<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<TrainingReport> {
        self.state.ensure_untrained()?;
        log::info!(
            "Training {} on {} epochs x {} synthetic samples",
            NAME,
            self.config.epochs,
            self.config.batch_size
        );
        let outcome = self.fit(rng);
        let report = self.state.settle(NAME, outcome)?;
        self.report = Some(report.clone());
        Ok(report)
    }

    fn is_ready(&self) -> bool {
        self.state.is_ready()
    }

    fn training_config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Deterministic; `rng` is unused.
    fn predict_with_rng<R: Rng + ?Sized>(
        &self,
        input: &YieldInput,
        _rng: &mut R,
    ) -> Result<YieldPrediction> {
        let raw = self.predict_raw(input)?;
        let adjusted = raw * state_factor(&input.state);
        Ok(YieldPrediction {
            predicted_yield: finalize_yield(adjusted),
            confidence: yield_confidence(input),
            factors: factor_breakdown(input),
            recommendations: recommendations(input, adjusted),
        })
    }

    fn name(&self) -> &str {
        NAME
    }
}
