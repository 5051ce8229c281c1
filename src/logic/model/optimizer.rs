//! Adam optimizer with per-tensor gradient norm clipping

use ndarray::{Array, Array1, Array2, Dimension, Zip};

use super::network::{ConditionalAutoencoder, LayerGrad};

const BETA1: f64 = 0.9;
const BETA2: f64 = 0.999;
const EPSILON: f64 = 1e-7;

/// Max L2 norm of each gradient tensor
pub const CLIP_NORM: f64 = 1.0;

#[derive(Debug, Clone)]
pub struct Adam {
    pub learning_rate: f64,
    step: i32,
    first: Vec<LayerGrad>,
    second: Vec<LayerGrad>,
}

impl Adam {
    pub fn new(learning_rate: f64) -> Self {
        Self {
            learning_rate,
            step: 0,
            first: Vec::new(),
            second: Vec::new(),
        }
    }

    /// Apply one update. `grads` must be in `layers_mut` order.
    pub fn step(&mut self, network: &mut ConditionalAutoencoder, mut grads: Vec<LayerGrad>) {
        if self.first.is_empty() {
            self.first = grads.iter().map(zeros_like).collect();
            self.second = grads.iter().map(zeros_like).collect();
        }

        self.step += 1;
        let lr_t = self.learning_rate * (1.0 - BETA2.powi(self.step)).sqrt()
            / (1.0 - BETA1.powi(self.step));

        for (((layer, g), m), v) in network
            .layers_mut()
            .zip(grads.iter_mut())
            .zip(self.first.iter_mut())
            .zip(self.second.iter_mut())
        {
            clip(&mut g.weights);
            clip(&mut g.bias);

            Zip::from(&mut layer.weights)
                .and(&mut m.weights)
                .and(&mut v.weights)
                .and(&g.weights)
                .for_each(|w, m, v, &g| update(w, m, v, g, lr_t));

            Zip::from(&mut layer.bias)
                .and(&mut m.bias)
                .and(&mut v.bias)
                .and(&g.bias)
                .for_each(|w, m, v, &g| update(w, m, v, g, lr_t));
        }
    }
}

fn zeros_like(g: &LayerGrad) -> LayerGrad {
    LayerGrad {
        weights: Array2::zeros(g.weights.raw_dim()),
        bias: Array1::zeros(g.bias.raw_dim()),
    }
}

fn update(w: &mut f64, m: &mut f64, v: &mut f64, g: f64, lr_t: f64) {
    *m = BETA1 * *m + (1.0 - BETA1) * g;
    *v = BETA2 * *v + (1.0 - BETA2) * g * g;
    *w -= lr_t * *m / (v.sqrt() + EPSILON);
}

fn clip<D: Dimension>(values: &mut Array<f64, D>) {
    let norm = values.iter().map(|v| v * v).sum::<f64>().sqrt();
    if norm > CLIP_NORM {
        let scale = CLIP_NORM / norm;
        values.mapv_inplace(|v| v * scale);
    }
}
