//! Alternating least squares with a conjugate-gradient inner solver for
//! implicit feedback.
//!
//! Confidence weights follow Hu, Koren and Volinsky ("Collaborative
//! Filtering for Implicit Feedback Datasets"); the per-row normal
//! equations are solved with the conjugate-gradient acceleration
//! described by Frederickson ("Fast Implicit Matrix Factorization"),
//! which never materializes `Yt*Cu*Y`.

use super::{Callback, FitInfo, Model};
use crate::primitives::{kernels, Matrix};
use rayon::prelude::*;

const CG_STEPS: usize = 3;

pub(super) fn train<U, I>(
    model: &mut Model<U, I>,
    cui: &[Vec<(usize, f32)>],
    ciu: &[Vec<(usize, f32)>],
    iterations: usize,
    regularization: f32,
    callback: &mut Option<Callback>,
) {
    for iteration in 0..iterations {
        // user factors first, then item factors against the fresh users
        least_squares_cg(
            cui,
            &mut model.user_factors,
            &model.item_factors,
            regularization,
        );
        least_squares_cg(
            ciu,
            &mut model.item_factors,
            &model.user_factors,
            regularization,
        );

        if let Some(cb) = callback.as_mut() {
            cb(FitInfo {
                iteration: iteration + 1,
                train_loss: f32::NAN,
                valid_loss: f32::NAN,
            });
        }
    }
}

/// One ALS half-step: holding `y` fixed, solve every row of `x` against
/// its confidence-weighted interactions.
///
/// `rows[u]` lists `(index into y, confidence)` pairs. Rows are
/// independent and solved in parallel; each solve warm-starts from the
/// row's current value and runs a fixed number of CG steps.
pub(super) fn least_squares_cg(
    rows: &[Vec<(usize, f32)>],
    x: &mut Matrix<f32>,
    y: &Matrix<f32>,
    regularization: f32,
) {
    let k = y.n_cols();

    // Gramian YtY + lambda*I, shared by every row of the half-step
    let mut yty = Matrix::zeros(k, k);
    for a in 0..k {
        for b in 0..k {
            let mut sum = 0.0;
            for r in 0..y.n_rows() {
                sum += y.get(r, a) * y.get(r, b);
            }
            yty.set(a, b, sum);
        }
    }
    for d in 0..k {
        yty.set(d, d, yty.get(d, d) + regularization);
    }

    x.as_mut_slice()
        .par_chunks_mut(k)
        .zip(rows.par_iter())
        .for_each(|(xu, row)| {
            // residual r = Yt*Cu*pu - (Yt*Cu*Y)*xu, built from the
            // identity Cu = I + (c - 1) * ei * ei^T on the observed rows
            let mut r = yty.dot(xu);
            kernels::neg(r.as_mut_slice());
            for &(i, confidence) in row {
                let yi = y.row(i);
                let scale = confidence - (confidence - 1.0) * kernels::dot(yi, xu);
                kernels::scaled_add(r.as_mut_slice(), scale, yi);
            }

            let mut p = r.clone();
            let mut rs_old = kernels::dot(r.as_slice(), r.as_slice());

            for _ in 0..CG_STEPS {
                let mut ap = yty.dot(p.as_slice());
                for &(i, confidence) in row {
                    let yi = y.row(i);
                    kernels::scaled_add(
                        ap.as_mut_slice(),
                        (confidence - 1.0) * kernels::dot(yi, p.as_slice()),
                        yi,
                    );
                }

                let alpha = rs_old / kernels::dot(p.as_slice(), ap.as_slice());
                kernels::scaled_add(xu, alpha, p.as_slice());
                kernels::scaled_add(r.as_mut_slice(), -alpha, ap.as_slice());
                let rs_new = kernels::dot(r.as_slice(), r.as_slice());

                if rs_new < 1e-20 {
                    break;
                }

                let ratio = rs_new / rs_old;
                for d in 0..k {
                    p[d] = r[d] + ratio * p[d];
                }
                rs_old = rs_new;
            }
        });
}
