//! Input and output records exchanged with callers.
//!
//! Inputs carry raw, unnormalized field measurements exactly as the caller
//! supplied them. Nothing here validates ranges: negative, out-of-domain and
//! non-finite numbers flow through to normalization unchanged.
use serde::{Deserialize, Serialize};

/// Crop labels in network output order.
pub const CROP_LABELS: [&str; 22] = [
    "Rice",
    "Maize",
    "Chickpea",
    "Kidneybeans",
    "Pigeonpeas",
    "Mothbeans",
    "Mungbean",
    "Blackgram",
    "Lentil",
    "Pomegranate",
    "Banana",
    "Mango",
    "Grapes",
    "Watermelon",
    "Muskmelon",
    "Apple",
    "Orange",
    "Papaya",
    "Coconut",
    "Cotton",
    "Jute",
    "Coffee",
];

pub const RICE: usize = 0;
pub const MAIZE: usize = 1;
pub const CHICKPEA: usize = 2;
pub const COTTON: usize = 19;
pub const COFFEE: usize = 21;

/// Number of features fed to either network.
pub const NUM_FEATURES: usize = 7;

/// Soil and climate measurements for crop recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropInput {
    pub nitrogen: f32,
    #[serde(alias = "phosphate")]
    pub phosphorus: f32,
    pub potassium: f32,
    #[serde(alias = "temp")]
    pub temperature: f32,
    pub humidity: f32,
    pub ph: f32,
    pub rainfall: f32,
}

/// Farm parameters for yield prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YieldInput {
    /// Carried for the caller's records; not used numerically.
    #[serde(default)]
    pub crop_year: String,
    #[serde(default)]
    pub season: String,
    #[serde(default)]
    pub state: String,
    pub area: f32,
    #[serde(alias = "rainfall")]
    pub annual_rainfall: f32,
    pub fertilizer: f32,
    pub pesticides: f32,
}

/// Growing seasons recognised by the yield model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    Kharif,
    Rabi,
    Summer,
}

impl Season {
    pub const ALL: [Season; 3] = [Season::Kharif, Season::Rabi, Season::Summer];

    /// Case-insensitive lookup. Anything else, including the empty string,
    /// is unrecognised.
    pub fn parse(name: &str) -> Option<Season> {
        match name.to_lowercase().as_str() {
            "kharif" => Some(Season::Kharif),
            "rabi" => Some(Season::Rabi),
            "summer" => Some(Season::Summer),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Kharif => "kharif",
            Season::Rabi => "rabi",
            Season::Summer => "summer",
        }
    }

    pub fn one_hot(&self) -> [f32; 3] {
        match self {
            Season::Kharif => [1.0, 0.0, 0.0],
            Season::Rabi => [0.0, 1.0, 0.0],
            Season::Summer => [0.0, 0.0, 1.0],
        }
    }
}

/// One ranked crop recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropPrediction {
    pub crop: String,
    /// Network probability scaled to [0, 100].
    pub confidence: f32,
    /// Rule-based fit of the crop to the raw conditions, in [0, 100].
    pub suitability_score: f32,
}

/// Banded 0-100 scores for the main yield contributors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactorScores {
    pub rainfall: f32,
    pub fertilizer: f32,
    pub pesticides: f32,
    pub area: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YieldPrediction {
    /// Quintals, floored at zero and rounded.
    pub predicted_yield: u64,
    pub confidence: f32,
    pub factors: FactorScores,
    pub recommendations: Vec<String>,
}
