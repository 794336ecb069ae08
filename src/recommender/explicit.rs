//! Twin-learner stochastic gradient descent for explicit feedback.
//!
//! The latent dimensions are split into a slow block and a fast block
//! with independent per-row adaptive step sizes; the fast block stays
//! frozen during the first pass while the slow block warms up. See
//! Chin, Zhuang, Juan and Lin, "A Learning-Rate Schedule for Stochastic
//! Gradient Methods to Matrix Factorization" (PAKDD), Algorithm 2.

use super::{Callback, FitInfo, Model};
use crate::data::Dataset;
use crate::primitives::{kernels, Vector};
use rand::seq::SliceRandom;
use std::hash::Hash;

/// Training ratings in sparse coordinate form.
pub(super) struct CooRatings {
    pub row_inds: Vec<usize>,
    pub col_inds: Vec<usize>,
    pub values: Vector<f32>,
}

pub(super) struct SgdOptions {
    pub iterations: usize,
    pub learning_rate: f32,
    pub regularization: f32,
}

/// Length of the slow block: `max(round(0.08 * k), 1)`.
///
/// With `k = 1` the slow block covers everything and the fast block is
/// empty.
pub(super) fn slow_block_len(k: usize) -> usize {
    ((k as f64 * 0.08).round() as usize).max(1)
}

pub(super) fn train<U, I>(
    model: &mut Model<U, I>,
    coo: &CooRatings,
    valid_set: Option<&Dataset<U, I>>,
    options: &SgdOptions,
    callback: &mut Option<Callback>,
) where
    U: Clone + Eq + Hash,
    I: Clone + Eq + Hash,
{
    let n = coo.row_inds.len();
    let k = model.user_factors.n_cols();
    let ks = slow_block_len(k);
    let learning_rate = options.learning_rate;
    let lambda = options.regularization;

    let users = model.user_factors.n_rows();
    let items = model.item_factors.n_rows();

    // adaptive squared-gradient accumulators, one pair per row
    let mut g_slow = vec![1.0_f32; users];
    let mut g_fast = vec![1.0_f32; users];
    let mut h_slow = vec![1.0_f32; items];
    let mut h_fast = vec![1.0_f32; items];

    // traversal order comes from the process-wide RNG, not the
    // factor-init seed
    let mut order: Vec<usize> = (0..n).collect();
    let mut rng = rand::thread_rng();

    for iteration in 0..options.iterations {
        let mut train_loss = 0.0_f32;

        order.shuffle(&mut rng);

        for &j in &order {
            let u = coo.row_inds[j];
            let v = coo.col_inds[j];

            // residual over the full factor vectors, before any write
            let e = coo.values[j]
                - kernels::dot(model.user_factors.row(u), model.item_factors.row(v));

            let pu = model.user_factors.row_mut(u);
            let qv = model.item_factors.row_mut(v);

            // slow learner
            let mut g_hat = 0.0_f32;
            let mut h_hat = 0.0_f32;

            let nu = learning_rate / g_slow[u].sqrt();
            let nv = learning_rate / h_slow[v].sqrt();

            for d in 0..ks {
                let gud = -e * qv[d] + lambda * pu[d];
                let hvd = -e * pu[d] + lambda * qv[d];

                g_hat += gud * gud;
                h_hat += hvd * hvd;

                pu[d] -= nu * gud;
                qv[d] -= nv * hvd;
            }

            g_slow[u] += g_hat / ks as f32;
            h_slow[v] += h_hat / ks as f32;

            // fast learner; frozen on the first pass, and a no-op when
            // the slow block already covers every dimension
            if iteration > 0 && ks < k {
                let mut g_hat = 0.0_f32;
                let mut h_hat = 0.0_f32;

                let nu = learning_rate / g_fast[u].sqrt();
                let nv = learning_rate / h_fast[v].sqrt();

                for d in ks..k {
                    let gud = -e * qv[d] + lambda * pu[d];
                    let hvd = -e * pu[d] + lambda * qv[d];

                    g_hat += gud * gud;
                    h_hat += hvd * hvd;

                    pu[d] -= nu * gud;
                    qv[d] -= nv * hvd;
                }

                g_fast[u] += g_hat / (k - ks) as f32;
                h_fast[v] += h_hat / (k - ks) as f32;
            }

            train_loss += e * e;
        }

        if let Some(cb) = callback.as_mut() {
            let train_loss = (train_loss / n as f32).sqrt();
            let valid_loss = match valid_set {
                Some(valid) => model.rmse(valid),
                None => 0.0,
            };
            cb(FitInfo {
                iteration: iteration + 1,
                train_loss,
                valid_loss,
            });
        }
    }
}
