//! Conditional Autoencoder Network
//!
//! ```text
//! main ─► Dense(h) ─► Dense(h/2) ─► Dense(latent) ─┐
//!                                                  ├─► [latent | cond] ─► Dense(latent) ─► Dense(h/2) ─► Dense(h) ─► Dense(main, sigmoid)
//! cond ────────────────────────────────────────────┘
//! ```
//!
//! Hidden layers use tanh (inputs are min-max scaled), the output layer uses
//! sigmoid so reconstructions stay in [0,1].

use ndarray::{s, Array1, Array2, ArrayView2, Axis};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::types::HyperParams;

/// Rows per forward pass when scoring a whole population
const SCORING_CHUNK: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Activation {
    Tanh,
    Sigmoid,
}

impl Activation {
    fn apply(&self, z: &mut Array2<f64>) {
        match self {
            Activation::Tanh => z.mapv_inplace(f64::tanh),
            Activation::Sigmoid => z.mapv_inplace(|v| 1.0 / (1.0 + (-v).exp())),
        }
    }

    /// Derivative in terms of the activation output
    fn derivative(&self, a: &Array2<f64>) -> Array2<f64> {
        match self {
            Activation::Tanh => a.mapv(|v| 1.0 - v * v),
            Activation::Sigmoid => a.mapv(|v| v * (1.0 - v)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dense {
    pub weights: Array2<f64>,
    pub bias: Array1<f64>,
    pub activation: Activation,
}

impl Dense {
    /// Glorot-uniform weights, zero bias
    pub fn glorot<R: Rng>(fan_in: usize, fan_out: usize, activation: Activation, rng: &mut R) -> Self {
        let limit = (6.0 / (fan_in + fan_out) as f64).sqrt();
        let weights = Array2::from_shape_fn((fan_in, fan_out), |_| rng.gen_range(-limit..limit));
        Self {
            weights,
            bias: Array1::zeros(fan_out),
            activation,
        }
    }

    pub fn forward(&self, input: ArrayView2<f64>) -> Array2<f64> {
        let mut z = input.dot(&self.weights) + &self.bias;
        self.activation.apply(&mut z);
        z
    }
}

/// Gradient of one dense layer
#[derive(Debug, Clone)]
pub struct LayerGrad {
    pub weights: Array2<f64>,
    pub bias: Array1<f64>,
}

/// Cached activations of one forward pass
pub struct ForwardPass {
    encoder: Vec<Array2<f64>>,
    latent: Array2<f64>,
    decoder: Vec<Array2<f64>>,
}

impl ForwardPass {
    pub fn output(&self) -> &Array2<f64> {
        // decoder always has four layers
        &self.decoder[self.decoder.len() - 1]
    }

    pub fn latent(&self) -> &Array2<f64> {
        &self.latent
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionalAutoencoder {
    encoder: Vec<Dense>,
    decoder: Vec<Dense>,
    main_dim: usize,
    conditional_dim: usize,
    latent_dim: usize,
}

impl ConditionalAutoencoder {
    pub fn new<R: Rng>(main_dim: usize, conditional_dim: usize, params: &HyperParams, rng: &mut R) -> Self {
        let hidden = params.hidden_dim;
        let half = (hidden / 2).max(1);
        let latent = params.latent_dim;

        let encoder = vec![
            Dense::glorot(main_dim, hidden, Activation::Tanh, rng),
            Dense::glorot(hidden, half, Activation::Tanh, rng),
            Dense::glorot(half, latent, Activation::Tanh, rng),
        ];

        let decoder = vec![
            Dense::glorot(latent + conditional_dim, latent, Activation::Tanh, rng),
            Dense::glorot(latent, half, Activation::Tanh, rng),
            Dense::glorot(half, hidden, Activation::Tanh, rng),
            Dense::glorot(hidden, main_dim, Activation::Sigmoid, rng),
        ];

        Self {
            encoder,
            decoder,
            main_dim,
            conditional_dim,
            latent_dim: latent,
        }
    }

    pub fn main_dim(&self) -> usize {
        self.main_dim
    }

    pub fn conditional_dim(&self) -> usize {
        self.conditional_dim
    }

    /// Width of the embedding handed to the partitioner
    pub fn latent_width(&self) -> usize {
        self.latent_dim + self.conditional_dim
    }

    pub fn forward(&self, main: ArrayView2<f64>, conditional: ArrayView2<f64>) -> ForwardPass {
        let mut encoder = Vec::with_capacity(self.encoder.len());
        let mut h = main.to_owned();
        for layer in &self.encoder {
            h = layer.forward(h.view());
            encoder.push(h.clone());
        }

        let mut latent = Array2::zeros((main.nrows(), self.latent_width()));
        latent.slice_mut(s![.., ..self.latent_dim]).assign(&h);
        latent.slice_mut(s![.., self.latent_dim..]).assign(&conditional);

        let mut decoder = Vec::with_capacity(self.decoder.len());
        let mut d = latent.clone();
        for layer in &self.decoder {
            d = layer.forward(d.view());
            decoder.push(d.clone());
        }

        ForwardPass {
            encoder,
            latent,
            decoder,
        }
    }

    /// Mean squared reconstruction error over every cell
    pub fn loss(&self, main: ArrayView2<f64>, conditional: ArrayView2<f64>) -> f64 {
        let pass = self.forward(main, conditional);
        let diff = pass.output() - &main;
        diff.mapv(|d| d * d).mean().unwrap_or(f64::NAN)
    }

    /// Backpropagate the MSE loss of a forward pass.
    ///
    /// Gradients come back in `layers_mut` order (encoder first).
    pub fn backward(&self, main: ArrayView2<f64>, pass: &ForwardPass) -> (f64, Vec<LayerGrad>) {
        let cells = (main.nrows() * main.ncols()) as f64;
        let diff = pass.output() - &main;
        let loss = diff.mapv(|d| d * d).sum() / cells;

        let mut delta = diff * (2.0 / cells);
        let mut decoder_grads = Vec::with_capacity(self.decoder.len());
        for (i, layer) in self.decoder.iter().enumerate().rev() {
            let dz = &delta * &layer.activation.derivative(&pass.decoder[i]);
            let input = if i == 0 { pass.latent.view() } else { pass.decoder[i - 1].view() };
            decoder_grads.push(LayerGrad {
                weights: input.t().dot(&dz),
                bias: dz.sum_axis(Axis(0)),
            });
            delta = dz.dot(&layer.weights.t());
        }
        decoder_grads.reverse();

        // the conditional block of the latent is an input, not a parameter
        let mut delta = delta.slice(s![.., ..self.latent_dim]).to_owned();
        let mut encoder_grads = Vec::with_capacity(self.encoder.len());
        for (i, layer) in self.encoder.iter().enumerate().rev() {
            let dz = &delta * &layer.activation.derivative(&pass.encoder[i]);
            let input = if i == 0 { main.view() } else { pass.encoder[i - 1].view() };
            encoder_grads.push(LayerGrad {
                weights: input.t().dot(&dz),
                bias: dz.sum_axis(Axis(0)),
            });
            delta = dz.dot(&layer.weights.t());
        }
        encoder_grads.reverse();

        encoder_grads.extend(decoder_grads);
        (loss, encoder_grads)
    }

    pub fn layers_mut(&mut self) -> impl Iterator<Item = &mut Dense> {
        self.encoder.iter_mut().chain(self.decoder.iter_mut())
    }

    /// Per-row mean squared reconstruction error
    pub fn reconstruction_errors(&self, main: ArrayView2<f64>, conditional: ArrayView2<f64>) -> Vec<f64> {
        let mut errors = Vec::with_capacity(main.nrows());
        for (m, c) in main
            .axis_chunks_iter(Axis(0), SCORING_CHUNK)
            .zip(conditional.axis_chunks_iter(Axis(0), SCORING_CHUNK))
        {
            let pass = self.forward(m, c);
            let diff = pass.output() - &m;
            errors.extend(
                diff.rows()
                    .into_iter()
                    .map(|row| row.iter().map(|d| d * d).sum::<f64>() / row.len() as f64),
            );
        }
        errors
    }

    /// Latent embedding (encoder output | conditional) for every row
    pub fn embed(&self, main: ArrayView2<f64>, conditional: ArrayView2<f64>) -> Array2<f64> {
        let mut latent = Array2::zeros((main.nrows(), self.latent_width()));
        let mut offset = 0;
        for (m, c) in main
            .axis_chunks_iter(Axis(0), SCORING_CHUNK)
            .zip(conditional.axis_chunks_iter(Axis(0), SCORING_CHUNK))
        {
            let pass = self.forward(m, c);
            let rows = m.nrows();
            latent
                .slice_mut(s![offset..offset + rows, ..])
                .assign(pass.latent());
            offset += rows;
        }
        latent
    }
}
