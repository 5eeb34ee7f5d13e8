use anyhow::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;

use agro_models::config::{ModelConfig, TaskType};
use agro_models::data_handling::{CropInput, CropPrediction, YieldInput, YieldPrediction};
use agro_models::models::{CropRecommender, PredictiveModel, YieldPredictor};
use agro_models::session::ModelSession;

use crate::output::{write_json, PredictionOutput, PredictionRecord, TrainingSummary};

/// Options shared by the `crop` and `yield` subcommands.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub config: ModelConfig,
    /// Overrides the seed of the task's training configuration and makes
    /// the crop suitability bonus reproducible.
    pub seed: Option<u64>,
    pub output: Option<PathBuf>,
}

impl RunOptions {
    fn seed_for(&self, task: TaskType) -> Option<u64> {
        self.seed.or(self.config.for_task(task).seed)
    }
}

/// Train a model in the background, wait for it, and return it inside its
/// session.
fn trained_session<M>(model: M, seed: Option<u64>) -> Result<ModelSession<M>>
where
    M: PredictiveModel + 'static,
{
    let session = ModelSession::spawn(model, seed);
    log::info!("Waiting for {} to finish training", session.name());
    session.wait()?;
    Ok(session)
}

pub fn predict_crops(
    inputs: &[CropInput],
    opts: &RunOptions,
) -> Result<(Vec<Vec<CropPrediction>>, Option<TrainingSummary>)> {
    let seed = opts.seed_for(TaskType::Crop);
    let model = CropRecommender::new(opts.config.crop.clone())?;
    let session = trained_session(model, seed)?;
    let model = session.model()?;

    let predictions = match seed {
        Some(seed) => {
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(1));
            inputs
                .iter()
                .map(|input| model.predict_with_rng(input, &mut rng))
                .collect::<Result<Vec<_>, _>>()?
        }
        None => model.predict_batch(inputs)?,
    };
    Ok((predictions, model.training_report().map(TrainingSummary::from)))
}

pub fn predict_yields(
    inputs: &[YieldInput],
    opts: &RunOptions,
) -> Result<(Vec<YieldPrediction>, Option<TrainingSummary>)> {
    let seed = opts.seed_for(TaskType::Yield);
    let model = YieldPredictor::new(opts.config.yield_model.clone())?;
    let session = trained_session(model, seed)?;
    let model = session.model()?;

    let predictions = model.predict_batch(inputs)?;
    Ok((predictions, model.training_report().map(TrainingSummary::from)))
}

pub fn run_crop(inputs: &[CropInput], opts: &RunOptions) -> Result<()> {
    let (predictions, training) = predict_crops(inputs, opts)?;
    let output = PredictionOutput {
        task: TaskType::Crop,
        model: CropRecommender::default().name().to_string(),
        training,
        results: inputs
            .iter()
            .zip(predictions)
            .map(|(input, prediction)| PredictionRecord { input, prediction })
            .collect(),
    };
    write_json(&output, opts.output.as_deref())
}

pub fn run_yield(inputs: &[YieldInput], opts: &RunOptions) -> Result<()> {
    let (predictions, training) = predict_yields(inputs, opts)?;
    let output = PredictionOutput {
        task: TaskType::Yield,
        model: YieldPredictor::default().name().to_string(),
        training,
        results: inputs
            .iter()
            .zip(predictions)
            .map(|(input, prediction)| PredictionRecord { input, prediction })
            .collect(),
    };
    write_json(&output, opts.output.as_deref())
}
