use rand::Rng;
use rayon::prelude::*;

use crate::config::{TaskType, TrainingConfig};
use crate::data_handling::{CropInput, CropPrediction, CROP_LABELS, NUM_FEATURES};
use crate::error::{ModelError, Result};
use crate::models::network::{Activation, FeedForwardNetwork, LayerSpec, Loss};
use crate::models::predictive_model::{ModelState, PredictiveModel};
use crate::models::trainer::{self, TrainingReport};
use crate::preprocessing::normalize_crop;
use crate::scoring::{rank_top_k, suitability_score, TOP_K};
use crate::synthetic::generate_crop_batch;

const NAME: &str = "crop-recommendation";

/// Hidden and output layers of the classification network.
pub fn crop_architecture() -> Vec<LayerSpec> {
    vec![
        LayerSpec::dense(128, Activation::Relu).with_dropout(0.3),
        LayerSpec::dense(64, Activation::Relu).with_dropout(0.2),
        LayerSpec::dense(32, Activation::Relu),
        LayerSpec::dense(CROP_LABELS.len(), Activation::Softmax),
    ]
}

/// Recommends the three most likely crops for a set of soil and climate
/// measurements.
#[derive(Debug, Clone)]
pub struct CropRecommender {
    config: TrainingConfig,
    state: ModelState,
    report: Option<TrainingReport>,
}

impl Default for CropRecommender {
    fn default() -> Self {
        Self {
            config: TrainingConfig::for_task(TaskType::Crop),
            state: ModelState::Untrained,
            report: None,
        }
    }
}

impl CropRecommender {
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
        let mut network = FeedForwardNetwork::build(NUM_FEATURES, &crop_architecture(), rng)?;
        let batch_size = self.config.batch_size;
        let report = trainer::fit(
            &mut network,
            &self.config,
            TaskType::Crop,
            Loss::CategoricalCrossEntropy,
            |rng| {
                let batch = generate_crop_batch(batch_size, rng);
                let targets = batch.one_hot();
                (batch.features, targets)
            },
            trainer::accuracy,
            rng,
        )?;
        Ok((network, report))
    }

    /// Full probability distribution over `CROP_LABELS`.
    pub fn probabilities(&self, input: &CropInput) -> Result<Vec<f32>> {
        let network = self.state.network()?;
        let probs = network.predict_row(&normalize_crop(input))?;
        if probs.len() != CROP_LABELS.len() {
            return Err(ModelError::init(format!(
                "network produced {} outputs for {} labels",
                probs.len(),
                CROP_LABELS.len()
            )));
        }
        Ok(probs)
    }

    /// Independent predictions in parallel; each worker draws suitability
    /// bonuses from its own thread-local source.
    pub fn predict_batch(&self, inputs: &[CropInput]) -> Result<Vec<Vec<CropPrediction>>> {
        self.state.network()?;
        inputs.par_iter().map(|input| self.predict(input)).collect()
    }
}

impl PredictiveModel for CropRecommender {
    type Input = CropInput;
    type Output = Vec<CropPrediction>;

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

    fn predict_with_rng<R: Rng + ?Sized>(
        &self,
        input: &CropInput,
        rng: &mut R,
    ) -> Result<Vec<CropPrediction>> {
        let probs = self.probabilities(input)?;
        Ok(rank_top_k(&probs, TOP_K)
            .into_iter()
            .map(|(idx, p)| {
                let crop = CROP_LABELS[idx];
                CropPrediction {
                    crop: crop.to_string(),
                    confidence: p * 100.0,
                    suitability_score: suitability_score(input, crop, rng),
                }
            })
            .collect())
    }

    fn name(&self) -> &str {
        NAME
    }
}
