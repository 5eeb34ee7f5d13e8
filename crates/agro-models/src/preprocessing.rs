//! Linear min/max feature scaling into network input space.
//!
//! Each feature has a fixed `NormalizationDomain` shared with the synthetic
//! generators. Scaling is deliberately unclamped: a raw value outside its
//! domain maps outside [0, 1] and is passed to the network as-is.

use ndarray::Array2;
use rand::Rng;
use serde::Serialize;

use crate::data_handling::{CropInput, Season, YieldInput, NUM_FEATURES};

/// Fixed `(min, max)` range of one raw feature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NormalizationDomain {
    pub min: f32,
    pub max: f32,
}

impl NormalizationDomain {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn width(&self) -> f32 {
        self.max - self.min
    }

    pub fn normalize(&self, value: f32) -> f32 {
        normalize(value, self)
    }

    /// Draw uniformly from `[min, max)`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        self.min + rng.gen::<f32>() * self.width()
    }
}

/// `(value - min) / (max - min)`, without clamping.
pub fn normalize(value: f32, domain: &NormalizationDomain) -> f32 {
    (value - domain.min) / (domain.max - domain.min)
}

pub mod crop_domains {
    use super::NormalizationDomain;

    pub const NITROGEN: NormalizationDomain = NormalizationDomain::new(0.0, 140.0);
    pub const PHOSPHORUS: NormalizationDomain = NormalizationDomain::new(5.0, 145.0);
    pub const POTASSIUM: NormalizationDomain = NormalizationDomain::new(5.0, 205.0);
    pub const TEMPERATURE: NormalizationDomain = NormalizationDomain::new(8.0, 44.0);
    pub const HUMIDITY: NormalizationDomain = NormalizationDomain::new(14.0, 100.0);
    pub const PH: NormalizationDomain = NormalizationDomain::new(3.5, 10.0);
    pub const RAINFALL: NormalizationDomain = NormalizationDomain::new(20.0, 300.0);
}

pub mod yield_domains {
    use super::NormalizationDomain;

    pub const AREA: NormalizationDomain = NormalizationDomain::new(0.1, 1000.0);
    pub const RAINFALL: NormalizationDomain = NormalizationDomain::new(200.0, 3000.0);
    pub const FERTILIZER: NormalizationDomain = NormalizationDomain::new(0.0, 500.0);
    pub const PESTICIDES: NormalizationDomain = NormalizationDomain::new(0.0, 50.0);
}

/// One-hot season slots; unrecognised names encode to all zeros.
pub fn encode_season(season: &str) -> [f32; 3] {
    match Season::parse(season) {
        Some(s) => s.one_hot(),
        None => {
            log::debug!(
                "Unrecognised season {:?}; using all-zero season encoding",
                season
            );
            [0.0; 3]
        }
    }
}

pub fn normalize_crop(input: &CropInput) -> [f32; NUM_FEATURES] {
    use crop_domains::*;
    [
        NITROGEN.normalize(input.nitrogen),
        PHOSPHORUS.normalize(input.phosphorus),
        POTASSIUM.normalize(input.potassium),
        TEMPERATURE.normalize(input.temperature),
        HUMIDITY.normalize(input.humidity),
        PH.normalize(input.ph),
        RAINFALL.normalize(input.rainfall),
    ]
}

pub fn normalize_yield(input: &YieldInput) -> [f32; NUM_FEATURES] {
    normalize_yield_parts(
        input.area,
        input.annual_rainfall,
        input.fertilizer,
        input.pesticides,
        encode_season(&input.season),
    )
}

/// Yield feature row from already-parsed parts, used by the generator to
/// avoid a string round trip for the season.
pub fn normalize_yield_parts(
    area: f32,
    rainfall: f32,
    fertilizer: f32,
    pesticides: f32,
    season: [f32; 3],
) -> [f32; NUM_FEATURES] {
    use yield_domains::*;
    [
        AREA.normalize(area),
        RAINFALL.normalize(rainfall),
        FERTILIZER.normalize(fertilizer),
        PESTICIDES.normalize(pesticides),
        season[0],
        season[1],
        season[2],
    ]
}

/// Stack normalized rows into a `(rows, NUM_FEATURES)` matrix.
pub fn stack_rows(rows: &[[f32; NUM_FEATURES]]) -> Array2<f32> {
    let mut x = Array2::<f32>::zeros((rows.len(), NUM_FEATURES));
    for (mut dst, src) in x.rows_mut().into_iter().zip(rows) {
        for (d, s) in dst.iter_mut().zip(src.iter()) {
            *d = *s;
        }
    }
    x
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_endpoints_map_to_unit_interval() {
        for domain in [
            crop_domains::NITROGEN,
            crop_domains::PH,
            crop_domains::RAINFALL,
            yield_domains::AREA,
            yield_domains::PESTICIDES,
        ] {
            assert!(domain.normalize(domain.min).abs() < 1e-6);
            assert!((domain.normalize(domain.max) - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn normalization_is_linear_and_strictly_increasing() {
        let domains = [
            crop_domains::NITROGEN,
            crop_domains::PHOSPHORUS,
            crop_domains::POTASSIUM,
            crop_domains::TEMPERATURE,
            crop_domains::HUMIDITY,
            crop_domains::PH,
            crop_domains::RAINFALL,
            yield_domains::AREA,
            yield_domains::RAINFALL,
            yield_domains::FERTILIZER,
            yield_domains::PESTICIDES,
        ];
        for domain in domains {
            // Sweep from half a width below min to half a width above max.
            let step = domain.width() / 8.0;
            let raw: Vec<f32> = (-4..=12).map(|i| domain.min + i as f32 * step).collect();
            let scaled: Vec<f32> = raw.iter().map(|&v| domain.normalize(v)).collect();

            for pair in scaled.windows(2) {
                assert!(pair[1] > pair[0], "{:?}: {:?}", domain, scaled);
                assert!(
                    ((pair[1] - pair[0]) - 0.125).abs() < 1e-4,
                    "{:?}: uneven spacing {:?}",
                    domain,
                    pair
                );
            }
            assert!(scaled[0] < 0.0 && *scaled.last().unwrap() > 1.0);
        }
    }

    #[test]
    fn normalization_is_unclamped() {
        let d = crop_domains::NITROGEN;
        assert!(d.normalize(-14.0) < 0.0);
        assert!(d.normalize(280.0) > 1.9);
    }

    #[test]
    fn unknown_seasons_share_zero_encoding() {
        assert_eq!(encode_season(""), [0.0; 3]);
        assert_eq!(encode_season("zzz"), [0.0; 3]);
        assert_eq!(encode_season("Rabi"), [0.0, 1.0, 0.0]);
    }

    #[test]
    fn stack_rows_preserves_order() {
        let rows = [[1.0; NUM_FEATURES], [2.0; NUM_FEATURES]];
        let x = stack_rows(&rows);
        assert_eq!(x.dim(), (2, NUM_FEATURES));
        assert_eq!(x[(0, 6)], 1.0);
        assert_eq!(x[(1, 0)], 2.0);
    }
}
