//! Integration tests for the crop and yield predictors.

use rand::rngs::StdRng;
use rand::SeedableRng;

use agro_models::config::{TaskType, TrainingConfig};
use agro_models::data_handling::{CropInput, YieldInput, CROP_LABELS};
use agro_models::error::ModelError;
use agro_models::models::{CropRecommender, PredictiveModel, YieldPredictor};

fn scenario_a() -> CropInput {
    CropInput {
        nitrogen: 90.0,
        phosphorus: 42.0,
        potassium: 43.0,
        temperature: 20.9,
        humidity: 82.0,
        ph: 6.5,
        rainfall: 202.9,
    }
}

fn scenario_b() -> YieldInput {
    YieldInput {
        crop_year: "2020".into(),
        season: "Kharif".into(),
        state: "Punjab".into(),
        area: 10.0,
        annual_rainfall: 1000.0,
        fertilizer: 80.0,
        pesticides: 8.0,
    }
}

fn trained_crop(seed: u64) -> CropRecommender {
    let mut model = CropRecommender::default();
    model.train(&mut StdRng::seed_from_u64(seed)).unwrap();
    model
}

fn trained_yield(seed: u64) -> YieldPredictor {
    let mut model = YieldPredictor::default();
    model.train(&mut StdRng::seed_from_u64(seed)).unwrap();
    model
}

// ---------------------------------------------------------------------------
// Readiness
// ---------------------------------------------------------------------------

#[test]
fn untrained_models_refuse_every_prediction() {
    let crop = CropRecommender::default();
    let yield_model = YieldPredictor::default();
    assert!(!crop.is_ready());
    assert!(!yield_model.is_ready());

    for _ in 0..50 {
        assert_eq!(crop.predict(&scenario_a()).unwrap_err(), ModelError::ModelNotReady);
        assert_eq!(
            yield_model.predict(&scenario_b()).unwrap_err(),
            ModelError::ModelNotReady
        );
    }
    assert_eq!(
        crop.predict_batch(&[scenario_a()]).unwrap_err(),
        ModelError::ModelNotReady
    );
}

#[test]
fn second_training_run_is_rejected() {
    let mut model = trained_crop(1);
    let err = model.train(&mut StdRng::seed_from_u64(2)).unwrap_err();
    assert_eq!(err, ModelError::AlreadyTrained);
    assert!(model.is_ready());
}

#[test]
fn zero_epoch_config_is_rejected_before_training() {
    let config = TrainingConfig::for_task(TaskType::Crop).with_epochs(0);
    assert!(matches!(
        CropRecommender::new(config),
        Err(ModelError::InitializationFailure(_))
    ));
}

#[test]
fn invalid_config_fails_construction() {
    let mut config = TrainingConfig::for_task(TaskType::Yield);
    config.batch_size = 0;
    assert!(matches!(
        YieldPredictor::new(config),
        Err(ModelError::InitializationFailure(_))
    ));
}

// ---------------------------------------------------------------------------
// Crop recommendation
// ---------------------------------------------------------------------------

#[test]
fn crop_scenario_returns_three_ranked_entries() {
    let model = trained_crop(7);
    let report = model.training_report().unwrap();
    assert_eq!(report.epochs.len(), 5);
    assert_eq!(report.metric_name(), "accuracy");

    let recs = model.predict(&scenario_a()).unwrap();
    assert_eq!(recs.len(), 3);
    for pair in recs.windows(2) {
        assert!(pair[0].confidence >= pair[1].confidence);
    }
    for rec in &recs {
        assert!(CROP_LABELS.contains(&rec.crop.as_str()));
        assert!((0.0..=100.0).contains(&rec.confidence), "{:?}", rec);
        assert!((0.0..=100.0).contains(&rec.suitability_score), "{:?}", rec);
    }
}

#[test]
fn crop_probabilities_form_a_distribution() {
    let model = trained_crop(8);
    let probs = model.probabilities(&scenario_a()).unwrap();
    assert_eq!(probs.len(), CROP_LABELS.len());
    let total: f32 = probs.iter().sum();
    assert!((total - 1.0).abs() < 1e-4, "sum = {}", total);
}

#[test]
fn crop_handles_out_of_domain_inputs() {
    let model = trained_crop(9);
    let extreme = CropInput {
        nitrogen: -50.0,
        phosphorus: 1e4,
        potassium: 0.0,
        temperature: 60.0,
        humidity: 0.0,
        ph: 14.0,
        rainfall: 5000.0,
    };
    let recs = model.predict(&extreme).unwrap();
    assert_eq!(recs.len(), 3);
    assert!(recs.iter().all(|r| (0.0..=100.0).contains(&r.suitability_score)));
}

#[test]
fn seeded_training_is_reproducible() {
    let a = trained_crop(42);
    let b = trained_crop(42);
    assert_eq!(
        a.probabilities(&scenario_a()).unwrap(),
        b.probabilities(&scenario_a()).unwrap()
    );

    let pa = a
        .predict_with_rng(&scenario_a(), &mut StdRng::seed_from_u64(5))
        .unwrap();
    let pb = b
        .predict_with_rng(&scenario_a(), &mut StdRng::seed_from_u64(5))
        .unwrap();
    assert_eq!(pa, pb);
}

#[test]
fn crop_batch_matches_single_predictions_in_order() {
    let model = trained_crop(10);
    let mut inputs = vec![scenario_a(); 4];
    inputs[2].rainfall = 30.0;
    let batch = model.predict_batch(&inputs).unwrap();
    assert_eq!(batch.len(), 4);
    for (input, recs) in inputs.iter().zip(&batch) {
        let single = model.predict(input).unwrap();
        let crops: Vec<_> = single.iter().map(|r| &r.crop).collect();
        let batch_crops: Vec<_> = recs.iter().map(|r| &r.crop).collect();
        assert_eq!(crops, batch_crops);
    }
}

// ---------------------------------------------------------------------------
// Yield prediction
// ---------------------------------------------------------------------------

#[test]
fn yield_scenario_is_positive_and_confident() {
    let model = trained_yield(7);
    let report = model.training_report().unwrap();
    assert_eq!(report.epochs.len(), 10);
    assert_eq!(report.metric_name(), "mae");

    let prediction = model.predict(&scenario_b()).unwrap();
    assert!(prediction.predicted_yield > 0);
    assert!((70.0..=95.0).contains(&prediction.confidence));
    assert_eq!(prediction.confidence, 95.0);
    assert_eq!(prediction.factors.rainfall, 90.0);
    assert_eq!(prediction.factors.fertilizer, 85.0);
    assert_eq!(prediction.factors.pesticides, 80.0);
    assert_eq!(prediction.factors.area, 20.0);
}

#[test]
fn state_factor_scales_raw_output() {
    let model = trained_yield(11);
    let punjab = scenario_b();
    let mut elsewhere = scenario_b();
    elsewhere.state = "Atlantis".into();

    let raw = model.predict_raw(&punjab).unwrap();
    assert_eq!(raw, model.predict_raw(&elsewhere).unwrap());

    let p = model.predict(&punjab).unwrap().predicted_yield as f32;
    let u = model.predict(&elsewhere).unwrap().predicted_yield as f32;
    assert!((p - 1.2 * u).abs() <= 1.2, "punjab {} vs unlisted {}", p, u);
}

#[test]
fn unknown_and_empty_seasons_predict_identically() {
    let model = trained_yield(12);
    let mut empty = scenario_b();
    empty.season = String::new();
    let mut garbage = scenario_b();
    garbage.season = "zzz".into();

    assert_eq!(model.predict(&empty).unwrap(), model.predict(&garbage).unwrap());
}

#[test]
fn yield_predictions_are_deterministic_and_non_negative() {
    let model = trained_yield(13);
    let mut harsh = scenario_b();
    harsh.area = -500.0;
    harsh.annual_rainfall = 0.0;

    let first = model.predict(&harsh).unwrap();
    let second = model.predict(&harsh).unwrap();
    assert_eq!(first, second);
    assert!(first.factors.area >= 0.0);
    assert_eq!(
        first.recommendations[0],
        "Consider irrigation systems due to low rainfall"
    );
}

#[test]
fn yield_batch_preserves_input_order() {
    let model = trained_yield(14);
    let mut inputs = vec![scenario_b(); 3];
    inputs[1].state = "Rajasthan".into();
    inputs[2].fertilizer = 300.0;
    let batch = model.predict_batch(&inputs).unwrap();
    for (input, prediction) in inputs.iter().zip(&batch) {
        assert_eq!(&model.predict(input).unwrap(), prediction);
    }
}
