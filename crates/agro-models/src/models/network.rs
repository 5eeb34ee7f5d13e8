//! Dense feed-forward network on explicit `ndarray` matrices.
//!
//! Architecture: Input → [Dense → activation → (dropout)]* → Dense → output
//! activation. Every forward pass allocates its own activation matrices and
//! drops them on return; there is no retained computation graph. Dropout is
//! applied only by `forward_train`.

use ndarray::{Array1, Array2, ArrayView2, Axis, Zip};
use ndarray_rand::rand_distr::{Normal, Uniform};
use ndarray_rand::RandomExt;
use rand::Rng;
use serde::Serialize;

use crate::error::{ModelError, Result};
use crate::models::optimizer::Adam;

/// Standard deviation of the normal initializer used for hidden kernels.
pub const HIDDEN_INIT_STD: f32 = 0.05;
/// Floor applied to probabilities before taking the log in cross-entropy.
const PROB_EPS: f32 = 1e-7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Activation {
    Relu,
    Linear,
    /// Row-wise softmax; only valid on the output layer.
    Softmax,
}

impl Activation {
    fn apply(&self, z: &mut Array2<f32>) {
        match self {
            Activation::Relu => z.mapv_inplace(|v| v.max(0.0)),
            Activation::Linear => {}
            Activation::Softmax => {
                for mut row in z.rows_mut() {
                    let max = row.fold(f32::NEG_INFINITY, |acc, &v| acc.max(v));
                    row.mapv_inplace(|v| (v - max).exp());
                    let sum = row.sum();
                    row.mapv_inplace(|v| v / sum);
                }
            }
        }
    }
}

/// Shape of one dense layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LayerSpec {
    pub units: usize,
    pub activation: Activation,
    /// Fraction of outputs zeroed during training, in `[0, 1)`.
    pub dropout: f32,
}

impl LayerSpec {
    pub const fn dense(units: usize, activation: Activation) -> Self {
        Self {
            units,
            activation,
            dropout: 0.0,
        }
    }

    pub const fn with_dropout(mut self, rate: f32) -> Self {
        self.dropout = rate;
        self
    }
}

#[derive(Debug, Clone)]
pub struct DenseLayer {
    /// `(inputs, units)`
    pub(crate) weights: Array2<f32>,
    pub(crate) bias: Array1<f32>,
    pub(crate) activation: Activation,
    pub(crate) dropout: f32,
}

impl DenseLayer {
    fn init<R: Rng + ?Sized>(inputs: usize, spec: &LayerSpec, rng: &mut R) -> Result<Self> {
        let shape = (inputs, spec.units);
        let weights = match spec.activation {
            Activation::Relu => {
                let normal = Normal::new(0.0f32, HIDDEN_INIT_STD).map_err(|e| {
                    ModelError::init(format!("invalid kernel initializer: {}", e))
                })?;
                Array2::random_using(shape, normal, rng)
            }
            // Glorot-uniform for output layers
            Activation::Linear | Activation::Softmax => {
                let limit = (6.0 / (inputs + spec.units) as f32).sqrt();
                Array2::random_using(shape, Uniform::new(-limit, limit), rng)
            }
        };

        Ok(Self {
            weights,
            bias: Array1::zeros(spec.units),
            activation: spec.activation,
            dropout: spec.dropout,
        })
    }

    fn pre_activation(&self, x: ArrayView2<'_, f32>) -> Array2<f32> {
        x.dot(&self.weights) + &self.bias
    }

    fn forward(&self, x: ArrayView2<'_, f32>) -> Array2<f32> {
        let mut z = self.pre_activation(x);
        self.activation.apply(&mut z);
        z
    }

    pub fn units(&self) -> usize {
        self.bias.len()
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }
}

/// Parameter gradients of one layer.
#[derive(Debug, Clone)]
pub struct LayerGradient {
    pub weights: Array2<f32>,
    pub bias: Array1<f32>,
}

/// Intermediate values from a training-mode forward pass.
pub(crate) struct ForwardCache {
    /// Input fed to each layer (post-dropout activation of the previous one).
    inputs: Vec<Array2<f32>>,
    pre_activations: Vec<Array2<f32>>,
    /// Inverted-dropout masks, already scaled by `1 / keep`.
    masks: Vec<Option<Array2<f32>>>,
    pub(crate) output: Array2<f32>,
}

/// Training objective paired with the output activation it differentiates
/// through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Loss {
    /// Softmax output against one-hot targets.
    CategoricalCrossEntropy,
    /// Linear output against real-valued targets.
    MeanSquaredError,
}

impl Loss {
    fn output_activation(&self) -> Activation {
        match self {
            Loss::CategoricalCrossEntropy => Activation::Softmax,
            Loss::MeanSquaredError => Activation::Linear,
        }
    }

    /// Mean loss over the batch and its gradient with respect to the output
    /// layer's pre-activation.
    pub fn evaluate(&self, output: &Array2<f32>, targets: &ArrayView2<'_, f32>) -> (f32, Array2<f32>) {
        let n = output.nrows().max(1) as f32;
        match self {
            Loss::CategoricalCrossEntropy => {
                let log_probs = output.mapv(|p| p.max(PROB_EPS).ln());
                let loss = -(targets * &log_probs).sum() / n;
                let grad = (output - targets) / n;
                (loss, grad)
            }
            Loss::MeanSquaredError => {
                let count = (output.len().max(1)) as f32;
                let diff = output - targets;
                let loss = diff.mapv(|d| d * d).sum() / count;
                let grad = diff * (2.0 / count);
                (loss, grad)
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct FeedForwardNetwork {
    layers: Vec<DenseLayer>,
    input_size: usize,
}

impl FeedForwardNetwork {
    /// Build and initialize a network. Only the last layer may use softmax.
    pub fn build<R: Rng + ?Sized>(
        input_size: usize,
        specs: &[LayerSpec],
        rng: &mut R,
    ) -> Result<Self> {
        if input_size == 0 {
            return Err(ModelError::init("network input size must be non-zero"));
        }
        if specs.is_empty() {
            return Err(ModelError::init("network needs at least one layer"));
        }

        let mut layers = Vec::with_capacity(specs.len());
        let mut inputs = input_size;
        for (idx, spec) in specs.iter().enumerate() {
            if spec.units == 0 {
                return Err(ModelError::init(format!("layer {} has zero units", idx)));
            }
            if !(0.0..1.0).contains(&spec.dropout) {
                return Err(ModelError::init(format!(
                    "layer {} dropout rate {} is outside [0, 1)",
                    idx, spec.dropout
                )));
            }
            if spec.activation == Activation::Softmax && idx + 1 != specs.len() {
                return Err(ModelError::init(format!(
                    "softmax is only supported on the output layer (found at layer {})",
                    idx
                )));
            }
            layers.push(DenseLayer::init(inputs, spec, rng)?);
            inputs = spec.units;
        }

        let network = Self { layers, input_size };
        log::trace!(
            "Built network {:?} with {} parameters",
            network.layer_sizes(),
            network.parameter_count()
        );
        Ok(network)
    }

    pub fn output_size(&self) -> usize {
        self.layers.last().map(DenseLayer::units).unwrap_or(0)
    }

    pub(crate) fn layers_mut(&mut self) -> &mut [DenseLayer] {
        &mut self.layers
    }

    pub fn layer_sizes(&self) -> Vec<usize> {
        self.layers.iter().map(DenseLayer::units).collect()
    }

    pub fn parameter_count(&self) -> usize {
        self.layers
            .iter()
            .map(|l| l.weights.len() + l.bias.len())
            .sum()
    }

    /// Overwrite every output bias, e.g. to start a regression head at the
    /// scale of its targets.
    pub fn set_output_bias(&mut self, value: f32) {
        if let Some(last) = self.layers.last_mut() {
            last.bias.fill(value);
        }
    }

    /// Inference pass over a `(rows, input_size)` batch.
    pub fn forward(&self, x: ArrayView2<'_, f32>) -> Array2<f32> {
        let mut layers = self.layers.iter();
        let mut activation = match layers.next() {
            Some(first) => first.forward(x),
            None => return x.to_owned(),
        };
        for layer in layers {
            activation = layer.forward(activation.view());
        }
        activation
    }

    /// Inference on a single feature row of width `input_size`.
    pub fn predict_row(&self, features: &[f32]) -> Result<Vec<f32>> {
        if features.len() != self.input_size {
            return Err(ModelError::init(format!(
                "feature row has {} values, network expects {}",
                features.len(),
                self.input_size
            )));
        }
        let x = ArrayView2::from_shape((1, features.len()), features)
            .map_err(|e| ModelError::init(format!("invalid feature row: {}", e)))?;
        Ok(self.forward(x).row(0).to_vec())
    }

    pub(crate) fn forward_train<R: Rng + ?Sized>(
        &self,
        x: ArrayView2<'_, f32>,
        rng: &mut R,
    ) -> ForwardCache {
        let n = self.layers.len();
        let mut inputs = Vec::with_capacity(n);
        let mut pre_activations = Vec::with_capacity(n);
        let mut masks = Vec::with_capacity(n);

        let mut current = x.to_owned();
        for layer in &self.layers {
            let z = layer.pre_activation(current.view());
            let mut a = z.clone();
            layer.activation.apply(&mut a);

            let mask = if layer.dropout > 0.0 {
                let keep = 1.0 - layer.dropout;
                let mask = Array2::from_shape_fn(a.raw_dim(), |_| {
                    if rng.gen::<f32>() < keep {
                        1.0 / keep
                    } else {
                        0.0
                    }
                });
                a *= &mask;
                Some(mask)
            } else {
                None
            };

            inputs.push(current);
            pre_activations.push(z);
            masks.push(mask);
            current = a;
        }

        ForwardCache {
            inputs,
            pre_activations,
            masks,
            output: current,
        }
    }

    /// Backpropagate `d_output` (gradient w.r.t. the output pre-activation)
    /// through the cached pass.
    pub(crate) fn backward(&self, cache: &ForwardCache, d_output: Array2<f32>) -> Vec<LayerGradient> {
        let mut grads = Vec::with_capacity(self.layers.len());
        let mut delta = d_output;

        for idx in (0..self.layers.len()).rev() {
            let layer = &self.layers[idx];
            let weights = cache.inputs[idx].t().dot(&delta);
            let bias = delta.sum_axis(Axis(0));

            if idx > 0 {
                let prev = idx - 1;
                let mut d_prev = delta.dot(&layer.weights.t());
                if let Some(mask) = &cache.masks[prev] {
                    d_prev *= mask;
                }
                if self.layers[prev].activation == Activation::Relu {
                    Zip::from(&mut d_prev)
                        .and(&cache.pre_activations[prev])
                        .for_each(|d, &z| {
                            if z <= 0.0 {
                                *d = 0.0;
                            }
                        });
                }
                delta = d_prev;
            }

            grads.push(LayerGradient { weights, bias });
        }

        grads.reverse();
        grads
    }

    /// One optimizer update on a batch; returns the batch loss before the
    /// update.
    pub fn train_step<R: Rng + ?Sized>(
        &mut self,
        x: ArrayView2<'_, f32>,
        targets: ArrayView2<'_, f32>,
        loss: Loss,
        optimizer: &mut Adam,
        rng: &mut R,
    ) -> Result<f32> {
        let output_activation = self.layers.last().map(DenseLayer::activation);
        if output_activation != Some(loss.output_activation()) {
            return Err(ModelError::init(format!(
                "{:?} loss requires a {:?} output layer, found {:?}",
                loss,
                loss.output_activation(),
                output_activation
            )));
        }
        if targets.dim() != (x.nrows(), self.output_size()) {
            return Err(ModelError::init(format!(
                "target shape {:?} does not match ({}, {})",
                targets.dim(),
                x.nrows(),
                self.output_size()
            )));
        }

        let cache = self.forward_train(x, rng);
        let (loss_value, d_output) = loss.evaluate(&cache.output, &targets);
        let grads = self.backward(&cache, d_output);
        optimizer.step(self, &grads);
        Ok(loss_value)
    }
}
