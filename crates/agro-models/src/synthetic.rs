//! Synthetic training batches for both tasks.
//!
//! No real agricultural data is involved. Crop samples are labelled by a fixed
//! rule cascade with a random fallback; yield samples get a formula-based
//! target with uniform noise. Every draw goes through the caller's `Rng` so a
//! seeded source reproduces a batch exactly.
use ndarray::{Array1, Array2};
use rand::Rng;

use crate::data_handling::{
    CropInput, Season, CHICKPEA, COFFEE, COTTON, CROP_LABELS, MAIZE, RICE,
};
use crate::preprocessing::{crop_domains, normalize_crop, normalize_yield_parts, stack_rows};

/// Base yield in quintals per hectare.
pub const BASE_YIELD: f32 = 25.0;
/// Half-width of the uniform target noise.
pub const YIELD_NOISE: f32 = 5.0;

/// Normalized crop features with their class indices.
#[derive(Debug, Clone)]
pub struct CropBatch {
    pub features: Array2<f32>,
    pub labels: Vec<usize>,
}

impl CropBatch {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// `(rows, CROP_LABELS.len())` one-hot target matrix.
    pub fn one_hot(&self) -> Array2<f32> {
        let mut targets = Array2::<f32>::zeros((self.labels.len(), CROP_LABELS.len()));
        for (row, &label) in self.labels.iter().enumerate() {
            targets[(row, label)] = 1.0;
        }
        targets
    }
}

/// Normalized yield features with scalar targets.
#[derive(Debug, Clone)]
pub struct YieldBatch {
    pub features: Array2<f32>,
    pub targets: Array1<f32>,
}

impl YieldBatch {
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Targets as a `(rows, 1)` column for the regression loss.
    pub fn target_column(&self) -> Array2<f32> {
        self.targets.clone().insert_axis(ndarray::Axis(1))
    }
}

/// Uniform draw inside every classification domain.
pub fn sample_crop_input<R: Rng + ?Sized>(rng: &mut R) -> CropInput {
    CropInput {
        nitrogen: crop_domains::NITROGEN.sample(rng),
        phosphorus: crop_domains::PHOSPHORUS.sample(rng),
        potassium: crop_domains::POTASSIUM.sample(rng),
        temperature: crop_domains::TEMPERATURE.sample(rng),
        humidity: crop_domains::HUMIDITY.sample(rng),
        ph: crop_domains::PH.sample(rng),
        rainfall: crop_domains::RAINFALL.sample(rng),
    }
}

/// Deterministic part of the labelling cascade. First match wins; `None`
/// means the sample falls through to the random fallback.
pub fn rule_based_crop(input: &CropInput) -> Option<usize> {
    let CropInput {
        temperature: t,
        humidity: h,
        ph,
        rainfall: r,
        ..
    } = *input;

    if r > 200.0 && t > 25.0 && h > 70.0 {
        Some(RICE)
    } else if t > 20.0 && t < 30.0 && ph > 6.0 && ph < 7.5 {
        Some(MAIZE)
    } else if ph > 6.0 && r < 100.0 {
        Some(CHICKPEA)
    } else if t > 25.0 && h > 60.0 {
        Some(COTTON)
    } else if t > 15.0 && r > 150.0 {
        Some(COFFEE)
    } else {
        None
    }
}

pub fn generate_crop_batch<R: Rng + ?Sized>(batch_size: usize, rng: &mut R) -> CropBatch {
    let mut rows = Vec::with_capacity(batch_size);
    let mut labels = Vec::with_capacity(batch_size);
    let mut fallback = 0usize;

    for _ in 0..batch_size {
        let sample = sample_crop_input(rng);
        let label = match rule_based_crop(&sample) {
            Some(label) => label,
            None => {
                fallback += 1;
                rng.gen_range(0..CROP_LABELS.len())
            }
        };
        rows.push(normalize_crop(&sample));
        labels.push(label);
    }

    log::trace!(
        "Generated crop batch of {} samples ({} labelled by fallback)",
        batch_size,
        fallback
    );

    CropBatch {
        features: stack_rows(&rows),
        labels,
    }
}

/// Raw yield sample before normalization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YieldSample {
    pub area: f32,
    pub rainfall: f32,
    pub fertilizer: f32,
    pub pesticides: f32,
    pub season: Season,
}

pub fn sample_yield_inputs<R: Rng + ?Sized>(rng: &mut R) -> YieldSample {
    YieldSample {
        area: rng.gen::<f32>() * 100.0 + 1.0,
        rainfall: rng.gen::<f32>() * 1500.0 + 500.0,
        fertilizer: rng.gen::<f32>() * 200.0 + 20.0,
        pesticides: rng.gen::<f32>() * 20.0 + 2.0,
        season: Season::ALL[rng.gen_range(0..Season::ALL.len())],
    }
}

/// Additive yield multiplier; each factor contributes from disjoint bands.
pub fn yield_multiplier(
    rainfall: f32,
    fertilizer: f32,
    pesticides: f32,
    season: Option<Season>,
) -> f32 {
    let mut multiplier = 1.0;

    if (600.0..=1200.0).contains(&rainfall) {
        multiplier += 0.3;
    } else if rainfall < 400.0 || rainfall > 2000.0 {
        multiplier -= 0.2;
    }

    if (50.0..=150.0).contains(&fertilizer) {
        multiplier += 0.25;
    } else if fertilizer < 20.0 {
        multiplier -= 0.15;
    }

    if (5.0..=15.0).contains(&pesticides) {
        multiplier += 0.15;
    } else if pesticides > 25.0 {
        multiplier -= 0.1;
    }

    match season {
        Some(Season::Kharif) => multiplier += 0.1,
        Some(Season::Rabi) => multiplier += 0.15,
        _ => {}
    }

    multiplier
}

/// `max(0, BASE_YIELD * multiplier * area + noise)`.
pub fn synthetic_yield(area: f32, multiplier: f32, noise: f32) -> f32 {
    (BASE_YIELD * multiplier * area + noise).max(0.0)
}

pub fn yield_target<R: Rng + ?Sized>(sample: &YieldSample, rng: &mut R) -> f32 {
    let multiplier = yield_multiplier(
        sample.rainfall,
        sample.fertilizer,
        sample.pesticides,
        Some(sample.season),
    );
    let noise = (rng.gen::<f32>() - 0.5) * 2.0 * YIELD_NOISE;
    synthetic_yield(sample.area, multiplier, noise)
}

pub fn generate_yield_batch<R: Rng + ?Sized>(batch_size: usize, rng: &mut R) -> YieldBatch {
    let mut rows = Vec::with_capacity(batch_size);
    let mut targets = Vec::with_capacity(batch_size);

    for _ in 0..batch_size {
        let sample = sample_yield_inputs(rng);
        targets.push(yield_target(&sample, rng));
        rows.push(normalize_yield_parts(
            sample.area,
            sample.rainfall,
            sample.fertilizer,
            sample.pesticides,
            sample.season.one_hot(),
        ));
    }

    log::trace!("Generated yield batch of {} samples", batch_size);

    YieldBatch {
        features: stack_rows(&rows),
        targets: Array1::from_vec(targets),
    }
}
