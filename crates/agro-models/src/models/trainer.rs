//! Epoch loop shared by both predictors.

use std::time::{Duration, Instant};

use ndarray::{Array2, Axis};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

use crate::config::{TaskType, TrainingConfig};
use crate::error::{ModelError, Result};
use crate::models::network::{FeedForwardNetwork, Loss};
use crate::models::optimizer::Adam;

/// Loss and task metric after one epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EpochMetrics {
    /// 1-based epoch number.
    pub epoch: usize,
    pub loss: f32,
    /// Accuracy for classification, mean absolute error for regression.
    pub metric: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingReport {
    pub task: TaskType,
    pub epochs: Vec<EpochMetrics>,
    pub updates: usize,
    pub elapsed: Duration,
}

impl TrainingReport {
    pub fn metric_name(&self) -> &'static str {
        match self.task {
            TaskType::Crop => "accuracy",
            TaskType::Yield => "mae",
        }
    }

    pub fn final_epoch(&self) -> Option<&EpochMetrics> {
        self.epochs.last()
    }
}

/// Fraction of rows whose arg-max prediction matches the one-hot target.
pub fn accuracy(predictions: &Array2<f32>, targets: &Array2<f32>) -> f32 {
    if predictions.nrows() == 0 {
        return 0.0;
    }
    let correct = predictions
        .rows()
        .into_iter()
        .zip(targets.rows())
        .filter(|(p, t)| argmax(p.iter()) == argmax(t.iter()))
        .count();
    correct as f32 / predictions.nrows() as f32
}

pub fn mean_absolute_error(predictions: &Array2<f32>, targets: &Array2<f32>) -> f32 {
    if predictions.is_empty() {
        return 0.0;
    }
    (predictions - targets).mapv(f32::abs).mean().unwrap_or(0.0)
}

fn argmax<'a, I: Iterator<Item = &'a f32>>(values: I) -> Option<usize> {
    values
        .enumerate()
        .fold(None, |best: Option<(usize, f32)>, (i, &v)| match best {
            Some((_, b)) if b >= v => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}

/// Run `config.epochs` epochs. Each epoch pulls a fresh `(features, targets)`
/// batch from `next_batch`, then applies either one full-batch update or one
/// update per shuffled mini-batch.
///
/// A non-finite epoch loss aborts training with `InitializationFailure`.
pub fn fit<R, F, M>(
    network: &mut FeedForwardNetwork,
    config: &TrainingConfig,
    task: TaskType,
    loss: Loss,
    mut next_batch: F,
    metric: M,
    rng: &mut R,
) -> Result<TrainingReport>
where
    R: Rng + ?Sized,
    F: FnMut(&mut R) -> (Array2<f32>, Array2<f32>),
    M: Fn(&Array2<f32>, &Array2<f32>) -> f32,
{
    let start = Instant::now();
    let mut optimizer = Adam::new(config.learning_rate);
    let mut epochs = Vec::with_capacity(config.epochs);

    for epoch in 1..=config.epochs {
        let (x, y) = next_batch(rng);

        let epoch_loss = match config.mini_batch_size {
            Some(size) if size < x.nrows() => {
                let mut indices: Vec<usize> = (0..x.nrows()).collect();
                indices.shuffle(rng);
                let mut weighted = 0.0f32;
                for chunk in indices.chunks(size) {
                    let xb = x.select(Axis(0), chunk);
                    let yb = y.select(Axis(0), chunk);
                    let batch_loss =
                        network.train_step(xb.view(), yb.view(), loss, &mut optimizer, rng)?;
                    weighted += batch_loss * chunk.len() as f32;
                }
                weighted / x.nrows() as f32
            }
            _ => network.train_step(x.view(), y.view(), loss, &mut optimizer, rng)?,
        };

        if !epoch_loss.is_finite() {
            return Err(ModelError::init(format!(
                "{} training diverged at epoch {}/{}: loss = {}",
                task, epoch, config.epochs, epoch_loss
            )));
        }

        let predictions = network.forward(x.view());
        let metric_value = metric(&predictions, &y);
        log::debug!(
            "[{}] epoch {}/{}: loss = {:.4}, metric = {:.4}",
            task,
            epoch,
            config.epochs,
            epoch_loss,
            metric_value
        );
        epochs.push(EpochMetrics {
            epoch,
            loss: epoch_loss,
            metric: metric_value,
        });
    }

    let report = TrainingReport {
        task,
        epochs,
        updates: optimizer.steps().max(0) as usize,
        elapsed: start.elapsed(),
    };

    match report.final_epoch() {
        Some(last) => log::info!(
            "[{}] trained {} epochs ({} updates) in {:.2?}: loss = {:.4}, {} = {:.4}",
            task,
            report.epochs.len(),
            report.updates,
            report.elapsed,
            last.loss,
            report.metric_name(),
            last.metric
        ),
        None => log::warn!("[{}] training ran zero epochs; network keeps its initial weights", task),
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::network::{Activation, LayerSpec};
    use ndarray::array;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn accuracy_counts_argmax_matches() {
        let preds = array![[0.9, 0.1], [0.2, 0.8], [0.6, 0.4]];
        let targets = array![[1.0, 0.0], [0.0, 1.0], [0.0, 1.0]];
        assert!((accuracy(&preds, &targets) - 2.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn mae_is_mean_of_absolute_residuals() {
        let preds = array![[1.0], [4.0]];
        let targets = array![[2.0], [2.0]];
        assert!((mean_absolute_error(&preds, &targets) - 1.5).abs() < 1e-6);
    }

    #[test]
    fn mini_batches_apply_one_update_each() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut net = FeedForwardNetwork::build(
            2,
            &[
                LayerSpec::dense(4, Activation::Relu),
                LayerSpec::dense(1, Activation::Linear),
            ],
            &mut rng,
        )
        .unwrap();
        let config = TrainingConfig {
            learning_rate: 0.01,
            epochs: 3,
            batch_size: 10,
            mini_batch_size: Some(4),
            seed: None,
        };
        let report = fit(
            &mut net,
            &config,
            TaskType::Yield,
            Loss::MeanSquaredError,
            |_| (Array2::from_elem((10, 2), 0.5), Array2::from_elem((10, 1), 1.0)),
            mean_absolute_error,
            &mut rng,
        )
        .unwrap();
        // ceil(10 / 4) = 3 updates per epoch
        assert_eq!(report.updates, 9);
        assert_eq!(report.epochs.len(), 3);
        assert_eq!(report.epochs[2].epoch, 3);
    }

    #[test]
    fn non_finite_loss_is_an_initialization_failure() {
        let mut rng = StdRng::seed_from_u64(10);
        let mut net = FeedForwardNetwork::build(
            1,
            &[LayerSpec::dense(1, Activation::Linear)],
            &mut rng,
        )
        .unwrap();
        let config = TrainingConfig::for_task(TaskType::Yield).with_epochs(1);
        let err = fit(
            &mut net,
            &config,
            TaskType::Yield,
            Loss::MeanSquaredError,
            |_| (array![[f32::NAN]], array![[1.0]]),
            mean_absolute_error,
            &mut rng,
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::InitializationFailure(_)));
    }
}
