use ndarray::{Array, Array1, Array2, Dimension, Zip};

use crate::models::network::{FeedForwardNetwork, LayerGradient};

/// Adam optimizer (Kingma & Ba, 2014) with bias-corrected moment estimates.
///
/// Moment buffers are allocated lazily on the first step, shaped after the
/// gradients they track.
#[derive(Debug, Clone)]
pub struct Adam {
    learning_rate: f32,
    beta1: f32,
    beta2: f32,
    epsilon: f32,
    t: i32,
    moments: Vec<LayerMoments>,
}

#[derive(Debug, Clone)]
struct LayerMoments {
    m_w: Array2<f32>,
    v_w: Array2<f32>,
    m_b: Array1<f32>,
    v_b: Array1<f32>,
}

impl LayerMoments {
    fn zeros_like(grad: &LayerGradient) -> Self {
        Self {
            m_w: Array2::zeros(grad.weights.raw_dim()),
            v_w: Array2::zeros(grad.weights.raw_dim()),
            m_b: Array1::zeros(grad.bias.raw_dim()),
            v_b: Array1::zeros(grad.bias.raw_dim()),
        }
    }
}

impl Adam {
    pub fn new(learning_rate: f32) -> Self {
        Self {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
            t: 0,
            moments: Vec::new(),
        }
    }

    /// Number of updates applied so far.
    pub fn steps(&self) -> i32 {
        self.t
    }

    pub fn step(&mut self, network: &mut FeedForwardNetwork, grads: &[LayerGradient]) {
        if self.moments.len() != grads.len() {
            self.moments = grads.iter().map(LayerMoments::zeros_like).collect();
        }

        self.t += 1;
        let hyper = Hyper {
            lr: self.learning_rate,
            beta1: self.beta1,
            beta2: self.beta2,
            epsilon: self.epsilon,
            bias_correction1: 1.0 - self.beta1.powi(self.t),
            bias_correction2: 1.0 - self.beta2.powi(self.t),
        };

        for ((layer, grad), moments) in network
            .layers_mut()
            .iter_mut()
            .zip(grads)
            .zip(self.moments.iter_mut())
        {
            adam_update(
                &mut layer.weights,
                &grad.weights,
                &mut moments.m_w,
                &mut moments.v_w,
                &hyper,
            );
            adam_update(
                &mut layer.bias,
                &grad.bias,
                &mut moments.m_b,
                &mut moments.v_b,
                &hyper,
            );
        }
    }
}

struct Hyper {
    lr: f32,
    beta1: f32,
    beta2: f32,
    epsilon: f32,
    bias_correction1: f32,
    bias_correction2: f32,
}

fn adam_update<D: Dimension>(
    param: &mut Array<f32, D>,
    grad: &Array<f32, D>,
    m: &mut Array<f32, D>,
    v: &mut Array<f32, D>,
    h: &Hyper,
) {
    Zip::from(param)
        .and(grad)
        .and(m)
        .and(v)
        .for_each(|p, &g, m, v| {
            *m = h.beta1 * *m + (1.0 - h.beta1) * g;
            *v = h.beta2 * *v + (1.0 - h.beta2) * g * g;
            let m_hat = *m / h.bias_correction1;
            let v_hat = *v / h.bias_correction2;
            *p -= h.lr * m_hat / (v_hat.sqrt() + h.epsilon);
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn first_step_moves_by_learning_rate() {
        // With bias correction the first update is lr * sign(g).
        let mut p = array![1.0f32, -1.0];
        let g = array![0.5f32, -2.0];
        let mut m = Array1::zeros(2);
        let mut v = Array1::zeros(2);
        let h = Hyper {
            lr: 0.01,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
            bias_correction1: 1.0 - 0.9,
            bias_correction2: 1.0 - 0.999,
        };
        adam_update(&mut p, &g, &mut m, &mut v, &h);
        assert!((p[0] - 0.99).abs() < 1e-5);
        assert!((p[1] + 0.99).abs() < 1e-5);
    }
}
