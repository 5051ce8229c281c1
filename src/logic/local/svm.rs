//! One-Class SVM (RBF kernel)
//!
//! Dual problem solved with SMO:
//!
//! ```text
//! min  0.5 * a'Qa    s.t.  0 <= a_i <= 1,  sum(a) = nu * l
//! ```
//!
//! Working pairs use second-order selection. Kernel rows are computed on
//! demand, so memory stays O(n) per group. The decision value of a training
//! row is `(Qa)_i - rho`.

use ndarray::{Array2, ArrayView1};
use rayon::prelude::*;

use super::normalize::inverted_min_max;
use super::types::{BaseDetector, DetectorError};

const TOLERANCE: f64 = 1e-3;
const TAU: f64 = 1e-12;

#[derive(Debug, Clone)]
pub struct OneClassSvm {
    nu: f64,
    gamma: Option<f64>,
    max_iter: usize,
}

impl Default for OneClassSvm {
    fn default() -> Self {
        Self {
            nu: 0.01,
            gamma: None,
            max_iter: 1000,
        }
    }
}

impl OneClassSvm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nu(mut self, nu: f64) -> Self {
        self.nu = nu.clamp(f64::EPSILON, 1.0);
        self
    }

    /// Fixed kernel width; by default `1 / (d * var(X))`
    pub fn gamma(mut self, gamma: f64) -> Self {
        self.gamma = Some(gamma);
        self
    }

    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter.max(1);
        self
    }

    /// `nu = min(contamination, max(0.01, n / 10000))`
    pub fn nu_for(contamination: f64, n: usize) -> f64 {
        contamination.min((n as f64 / 10_000.0).max(0.01))
    }

    fn scale_gamma(x: &Array2<f64>) -> f64 {
        let var = x.var(0.0);
        if var > 0.0 && var.is_finite() {
            1.0 / (x.ncols() as f64 * var)
        } else {
            1.0
        }
    }

    /// Signed distance to the separating hyperplane for every training row
    pub fn decision_function(&self, x: &Array2<f64>) -> Vec<f64> {
        let n = x.nrows();
        let gamma = self.gamma.unwrap_or_else(|| Self::scale_gamma(x));
        let kernel = |a: ArrayView1<f64>, b: ArrayView1<f64>| {
            let sq: f64 = a.iter().zip(b.iter()).map(|(p, q)| (p - q) * (p - q)).sum();
            (-gamma * sq).exp()
        };
        let kernel_row = |i: usize| -> Vec<f64> {
            let xi = x.row(i);
            (0..n).into_par_iter().map(|t| kernel(xi, x.row(t))).collect()
        };

        // Feasible start: the first floor(nu*l) alphas at the bound
        let total = self.nu * n as f64;
        let mut alpha = vec![0.0f64; n];
        let full = (total.floor() as usize).min(n);
        for a in alpha.iter_mut().take(full) {
            *a = 1.0;
        }
        if full < n {
            alpha[full] = total - full as f64;
        }

        let mut grad = vec![0.0f64; n];
        for (i, &a) in alpha.iter().enumerate() {
            if a > 0.0 {
                let row = kernel_row(i);
                for (g, k) in grad.iter_mut().zip(row.iter()) {
                    *g += a * k;
                }
            }
        }

        let mut iterations = 0;
        while iterations < self.max_iter {
            // i: steepest ascent among rows that can still grow
            let mut i = usize::MAX;
            let mut g_max = f64::NEG_INFINITY;
            let mut g_min = f64::INFINITY;
            for t in 0..n {
                if alpha[t] < 1.0 && -grad[t] >= g_max {
                    g_max = -grad[t];
                    i = t;
                }
                if alpha[t] > 0.0 && -grad[t] < g_min {
                    g_min = -grad[t];
                }
            }
            if i == usize::MAX || g_max - g_min < TOLERANCE {
                break;
            }

            let q_i = kernel_row(i);
            // j: second-order choice among rows that can shrink
            let mut j = usize::MAX;
            let mut best_obj = f64::INFINITY;
            for t in 0..n {
                if alpha[t] > 0.0 {
                    let b = g_max + grad[t];
                    if b > 0.0 {
                        let a = (2.0 - 2.0 * q_i[t]).max(TAU);
                        let obj = -(b * b) / a;
                        if obj <= best_obj {
                            best_obj = obj;
                            j = t;
                        }
                    }
                }
            }
            if j == usize::MAX {
                break;
            }

            let q_j = kernel_row(j);
            let quad = (2.0 - 2.0 * q_i[j]).max(TAU);
            let (old_i, old_j) = (alpha[i], alpha[j]);
            let sum = old_i + old_j;
            let delta = (grad[i] - grad[j]) / quad;
            let mut new_i = old_i - delta;
            let mut new_j = old_j + delta;

            if sum > 1.0 {
                if new_i > 1.0 {
                    new_i = 1.0;
                    new_j = sum - 1.0;
                }
                if new_j > 1.0 {
                    new_j = 1.0;
                    new_i = sum - 1.0;
                }
            } else {
                if new_j < 0.0 {
                    new_j = 0.0;
                    new_i = sum;
                }
                if new_i < 0.0 {
                    new_i = 0.0;
                    new_j = sum;
                }
            }

            alpha[i] = new_i;
            alpha[j] = new_j;
            let (d_i, d_j) = (new_i - old_i, new_j - old_j);
            for t in 0..n {
                grad[t] += q_i[t] * d_i + q_j[t] * d_j;
            }

            iterations += 1;
        }

        if iterations >= self.max_iter {
            log::debug!("one_class_svm: stopped at max_iter={} before convergence", self.max_iter);
        }

        let rho = Self::rho(&alpha, &grad);
        grad.iter().map(|g| g - rho).collect()
    }

    /// Offset from free support vectors, or the midpoint of the bounds
    fn rho(alpha: &[f64], grad: &[f64]) -> f64 {
        let mut upper = f64::INFINITY;
        let mut lower = f64::NEG_INFINITY;
        let mut free_sum = 0.0;
        let mut free_count = 0usize;
        for (&a, &g) in alpha.iter().zip(grad.iter()) {
            if a >= 1.0 {
                lower = lower.max(g);
            } else if a <= 0.0 {
                upper = upper.min(g);
            } else {
                free_sum += g;
                free_count += 1;
            }
        }
        if free_count > 0 {
            free_sum / free_count as f64
        } else if upper.is_finite() && lower.is_finite() {
            (upper + lower) / 2.0
        } else if upper.is_finite() {
            upper
        } else {
            lower
        }
    }
}

impl BaseDetector for OneClassSvm {
    fn name(&self) -> &'static str {
        "one_class_svm"
    }

    fn fit_score(&self, x: &Array2<f64>) -> Result<Vec<f64>, DetectorError> {
        if x.nrows() < 2 {
            return Err(DetectorError::TooFewRows {
                detector: self.name(),
                needed: 2,
                rows: x.nrows(),
            });
        }
        inverted_min_max(&self.decision_function(x), self.name())
    }
}
