use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

use agro_models::config::TaskType;
use agro_models::models::TrainingReport;

/// One input with its prediction.
#[derive(Debug, Serialize)]
pub struct PredictionRecord<'a, I, O> {
    pub input: &'a I,
    pub prediction: O,
}

#[derive(Debug, Serialize)]
pub struct PredictionOutput<'a, I, O> {
    pub task: TaskType,
    pub model: String,
    /// Final epoch loss and metric of the training run.
    pub training: Option<TrainingSummary>,
    pub results: Vec<PredictionRecord<'a, I, O>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrainingSummary {
    pub epochs: usize,
    pub final_loss: Option<f32>,
    pub metric: &'static str,
    pub final_metric: Option<f32>,
}

impl From<&TrainingReport> for TrainingSummary {
    fn from(report: &TrainingReport) -> Self {
        let last = report.final_epoch();
        Self {
            epochs: report.epochs.len(),
            final_loss: last.map(|e| e.loss),
            metric: report.metric_name(),
            final_metric: last.map(|e| e.metric),
        }
    }
}

/// Pretty JSON to `path`, or to stdout when no path is given.
pub fn write_json<T: Serialize>(value: &T, path: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize predictions")?;
    match path {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write output: {}", path.display()))?;
            log::info!("Wrote predictions to {}", path.display());
        }
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            writeln!(handle, "{}", json)?;
        }
    }
    Ok(())
}
