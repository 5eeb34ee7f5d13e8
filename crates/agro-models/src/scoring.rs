//! Post-processing of raw network output into caller-facing scores.
//!
//! All thresholds here operate on raw (unnormalized) input values.

use rand::Rng;

use crate::data_handling::{CropInput, FactorScores, YieldInput};

/// Number of crop recommendations returned per prediction.
pub const TOP_K: usize = 3;

pub const BASE_SUITABILITY: f32 = 50.0;
/// Exclusive upper bound of the random suitability bonus for crops without
/// rules.
pub const RANDOM_BONUS_MAX: f32 = 30.0;

pub const BASE_YIELD_CONFIDENCE: f32 = 70.0;
pub const MAX_YIELD_CONFIDENCE: f32 = 95.0;

/// Regional productivity multipliers, keyed by lowercase state name.
pub static STATE_FACTORS: [(&str, f32); 14] = [
    ("punjab", 1.2),
    ("haryana", 1.15),
    ("uttar pradesh", 1.0),
    ("bihar", 0.9),
    ("west bengal", 1.1),
    ("maharashtra", 1.05),
    ("karnataka", 1.0),
    ("tamil nadu", 1.1),
    ("andhra pradesh", 1.05),
    ("telangana", 1.0),
    ("gujarat", 1.1),
    ("rajasthan", 0.85),
    ("madhya pradesh", 0.95),
    ("odisha", 0.9),
];

/// Indices of the `k` largest probabilities, descending. Ties keep the lower
/// index first.
pub fn rank_top_k(probabilities: &[f32], k: usize) -> Vec<(usize, f32)> {
    let mut ranked: Vec<(usize, f32)> = probabilities.iter().copied().enumerate().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.truncate(k);
    ranked
}

/// Rule bonus for crops with known requirements, `None` for the rest.
pub fn rule_bonus(input: &CropInput, crop: &str) -> Option<f32> {
    let pts = |hit: bool, points: f32| if hit { points } else { 0.0 };
    let t = input.temperature;

    match crop.to_lowercase().as_str() {
        "rice" => Some(
            pts(input.rainfall > 150.0, 20.0)
                + pts(t > 20.0 && t < 35.0, 15.0)
                + pts(input.humidity > 70.0, 15.0),
        ),
        "wheat" => Some(
            pts(t > 15.0 && t < 25.0, 20.0)
                + pts(input.ph > 6.0 && input.ph < 7.5, 15.0)
                + pts(input.rainfall > 50.0 && input.rainfall < 150.0, 15.0),
        ),
        "cotton" => Some(
            pts(t > 25.0, 20.0)
                + pts(input.humidity > 60.0, 15.0)
                + pts(input.potassium > 100.0, 15.0),
        ),
        _ => None,
    }
}

/// Suitability of `crop` for the raw conditions, in [0, 100].
pub fn suitability_score<R: Rng + ?Sized>(input: &CropInput, crop: &str, rng: &mut R) -> f32 {
    let bonus = rule_bonus(input, crop).unwrap_or_else(|| rng.gen::<f32>() * RANDOM_BONUS_MAX);
    (BASE_SUITABILITY + bonus).clamp(0.0, 100.0)
}

/// Case-insensitive state lookup; unknown states are neutral.
pub fn state_factor(state: &str) -> f32 {
    let key = state.to_lowercase();
    STATE_FACTORS
        .iter()
        .find(|(name, _)| *name == key)
        .map(|&(_, factor)| factor)
        .unwrap_or(1.0)
}

/// Floor at zero and round to whole quintals.
pub fn finalize_yield(adjusted: f32) -> u64 {
    adjusted.max(0.0).round() as u64
}

pub fn yield_confidence(input: &YieldInput) -> f32 {
    let mut confidence = BASE_YIELD_CONFIDENCE;
    if input.area > 0.5 && input.area < 100.0 {
        confidence += 10.0;
    }
    if (600.0..=1500.0).contains(&input.annual_rainfall) {
        confidence += 10.0;
    }
    if (30.0..=200.0).contains(&input.fertilizer) {
        confidence += 5.0;
    }
    if (2.0..=20.0).contains(&input.pesticides) {
        confidence += 5.0;
    }
    confidence.min(MAX_YIELD_CONFIDENCE)
}

/// Score from the first band containing `value`, or `fallback`.
fn banded(value: f32, bands: &[(f32, f32, f32)], fallback: f32) -> f32 {
    bands
        .iter()
        .find(|(lo, hi, _)| (*lo..=*hi).contains(&value))
        .map(|&(_, _, score)| score)
        .unwrap_or(fallback)
}

pub fn rainfall_score(rainfall: f32) -> f32 {
    banded(
        rainfall,
        &[(600.0, 1200.0, 90.0), (400.0, 1500.0, 75.0), (300.0, 1800.0, 60.0)],
        40.0,
    )
}

pub fn fertilizer_score(fertilizer: f32) -> f32 {
    banded(
        fertilizer,
        &[(50.0, 120.0, 85.0), (30.0, 150.0, 70.0), (20.0, 200.0, 55.0)],
        35.0,
    )
}

pub fn pesticides_score(pesticides: f32) -> f32 {
    banded(
        pesticides,
        &[(5.0, 12.0, 80.0), (3.0, 18.0, 65.0), (1.0, 25.0, 50.0)],
        30.0,
    )
}

/// 20 points per 10 hectares, capped at 100.
pub fn area_score(area: f32) -> f32 {
    (area / 10.0 * 20.0).clamp(0.0, 100.0)
}

pub fn factor_breakdown(input: &YieldInput) -> FactorScores {
    FactorScores {
        rainfall: rainfall_score(input.annual_rainfall),
        fertilizer: fertilizer_score(input.fertilizer),
        pesticides: pesticides_score(input.pesticides),
        area: area_score(input.area),
    }
}

/// Advice lines in fixed order: rainfall, fertilizer, pesticides, overall
/// yield. `adjusted_yield` is the state-adjusted value before rounding.
pub fn recommendations(input: &YieldInput, adjusted_yield: f32) -> Vec<String> {
    let mut out = Vec::new();

    if input.annual_rainfall < 500.0 {
        out.push("Consider irrigation systems due to low rainfall");
    } else if input.annual_rainfall > 2000.0 {
        out.push("Ensure proper drainage to prevent waterlogging");
    }

    if input.fertilizer < 40.0 {
        out.push("Increase fertilizer application for better yield");
    } else if input.fertilizer > 200.0 {
        out.push("Reduce fertilizer to prevent soil degradation");
    }

    if input.pesticides < 3.0 {
        out.push("Monitor for pests and apply pesticides as needed");
    } else if input.pesticides > 20.0 {
        out.push("Consider integrated pest management to reduce chemical usage");
    }

    if adjusted_yield < 50.0 {
        out.push("Consider soil testing and crop rotation for better yield");
    } else if adjusted_yield > 200.0 {
        out.push("Excellent conditions! Maintain current practices");
    }

    out.into_iter().map(String::from).collect()
}
