//! Matrix-factorization recommender.
//!
//! Training learns two dense factor matrices, one row per user and one
//! row per item, whose dot products approximate the observed
//! interactions. Explicit ratings are fit with twin-learner SGD;
//! implicit feedback with conjugate-gradient ALS. Queries read the
//! factors and never mutate the model, apart from a write-once cache of
//! row norms used by the similarity queries.

mod explicit;
mod implicit;

use crate::data::{Dataset, IdIndex};
use crate::error::{RecomendarError, Result};
use crate::primitives::{kernels, Matrix, Vector};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;
use std::sync::OnceLock;

/// Information about a training iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitInfo {
    /// The iteration (1-based).
    pub iteration: usize,
    /// The training loss. RMSE over the training set for explicit
    /// feedback; NaN for implicit feedback.
    pub train_loss: f32,
    /// The validation loss. RMSE over the validation set when one was
    /// supplied, 0.0 otherwise; NaN for implicit feedback.
    pub valid_loss: f32,
}

/// A scored recommendation.
#[derive(Debug, Clone, PartialEq)]
pub struct Rec<K> {
    /// External id of the recommended entity.
    pub id: K,
    /// Predicted rating or cosine similarity.
    pub score: f32,
}

type Callback = Box<dyn FnMut(FitInfo)>;

/// State produced by a fit: id maps, factor matrices, and bookkeeping.
struct Model<U, I> {
    user_index: IdIndex<U>,
    item_index: IdIndex<I>,
    rated: Vec<HashSet<usize>>,
    global_mean: f32,
    user_factors: Matrix<f32>,
    item_factors: Matrix<f32>,
    user_norms: OnceLock<Vector<f32>>,
    item_norms: OnceLock<Vector<f32>>,
}

impl<U: Clone + Eq + Hash, I: Clone + Eq + Hash> Model<U, I> {
    fn predict(&self, user_id: &U, item_id: &I) -> f32 {
        let u = match self.user_index.get(user_id) {
            Some(u) => u,
            None => return self.global_mean,
        };
        let i = match self.item_index.get(item_id) {
            Some(i) => i,
            None => return self.global_mean,
        };
        kernels::dot(self.user_factors.row(u), self.item_factors.row(i))
    }

    fn rmse(&self, data: &Dataset<U, I>) -> f32 {
        let mut sum = 0.0_f32;
        for rating in data.iter() {
            let diff = self.predict(&rating.user_id, &rating.item_id) - rating.value;
            sum += diff * diff;
        }
        (sum / data.len() as f32).sqrt()
    }
}

/// A collaborative-filtering recommender.
///
/// Hyperparameters are set through consuming `with_*` builders; the
/// model is then trained in place with [`fit_explicit`], [`fit_implicit`]
/// or [`fit_eval_explicit`] and queried through the read-only accessors.
///
/// [`fit_explicit`]: Recommender::fit_explicit
/// [`fit_implicit`]: Recommender::fit_implicit
/// [`fit_eval_explicit`]: Recommender::fit_eval_explicit
///
/// # Examples
///
/// ```
/// use recomendar::prelude::*;
///
/// let mut data = Dataset::new();
/// data.push(1, "A", 5.0);
/// data.push(1, "B", 3.0);
/// data.push(2, "A", 4.0);
///
/// let mut recommender = Recommender::new().with_factors(4).with_seed(42);
/// recommender.fit_explicit(&data).expect("non-empty training set");
///
/// let recs = recommender.user_recs(&2, 5);
/// assert!(recs.len() <= 5);
/// ```
pub struct Recommender<U, I> {
    factors: usize,
    iterations: usize,
    regularization: Option<f32>,
    learning_rate: f32,
    alpha: f32,
    seed: Option<u64>,
    callback: Option<Callback>,
    model: Option<Model<U, I>>,
}

impl<U, I> Recommender<U, I> {
    /// Creates a recommender with default hyperparameters.
    #[must_use]
    pub fn new() -> Self {
        Self {
            factors: 8,
            iterations: 20,
            // regularization defaults differ between explicit (0.1)
            // and implicit (0.01) feedback, resolved at fit time
            regularization: None,
            learning_rate: 0.1,
            alpha: 40.0,
            seed: None,
            callback: None,
            model: None,
        }
    }

    /// Sets the number of latent factors.
    #[must_use]
    pub fn with_factors(mut self, factors: usize) -> Self {
        self.factors = factors;
        self
    }

    /// Sets the number of training iterations.
    #[must_use]
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Sets the L2 regularization.
    #[must_use]
    pub fn with_regularization(mut self, regularization: f32) -> Self {
        self.regularization = Some(regularization);
        self
    }

    /// Sets the learning rate for explicit-feedback SGD.
    #[must_use]
    pub fn with_learning_rate(mut self, learning_rate: f32) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    /// Sets the confidence scale for implicit feedback
    /// (`confidence = 1 + alpha * value`).
    #[must_use]
    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }

    /// Sets the random seed for factor initialization.
    ///
    /// The seed governs only the initial factor matrices. The SGD
    /// traversal order and [`Dataset::split_random`] draw from the
    /// process-wide RNG, so trained factors are not reproducible from
    /// the seed alone.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets a callback invoked after every training iteration.
    ///
    /// The callback is informational; it cannot abort training.
    #[must_use]
    pub fn with_callback<F: FnMut(FitInfo) + 'static>(mut self, callback: F) -> Self {
        self.callback = Some(Box::new(callback));
        self
    }

    /// Returns true if the model has been fitted.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        self.model.is_some()
    }

    /// Returns the number of latent factors.
    #[must_use]
    pub fn factors(&self) -> usize {
        self.factors
    }

    /// Returns the number of training iterations.
    #[must_use]
    pub fn iterations(&self) -> usize {
        self.iterations
    }
}

impl<U: Clone + Eq + Hash, I: Clone + Eq + Hash> Recommender<U, I> {
    /// Fits the model on explicit feedback (numeric ratings).
    ///
    /// # Errors
    ///
    /// Returns an error if the training set is empty.
    pub fn fit_explicit(&mut self, train_set: &Dataset<U, I>) -> Result<()> {
        self.fit(train_set, None, false)
    }

    /// Fits the model on explicit feedback, reporting validation loss
    /// to the callback after each iteration.
    ///
    /// # Errors
    ///
    /// Returns an error if the training set is empty.
    pub fn fit_eval_explicit(
        &mut self,
        train_set: &Dataset<U, I>,
        valid_set: &Dataset<U, I>,
    ) -> Result<()> {
        self.fit(train_set, Some(valid_set), false)
    }

    /// Fits the model on implicit feedback (interaction weights).
    ///
    /// # Errors
    ///
    /// Returns an error if the training set is empty.
    pub fn fit_implicit(&mut self, train_set: &Dataset<U, I>) -> Result<()> {
        self.fit(train_set, None, true)
    }

    fn fit(
        &mut self,
        train_set: &Dataset<U, I>,
        valid_set: Option<&Dataset<U, I>>,
        implicit: bool,
    ) -> Result<()> {
        if train_set.is_empty() {
            return Err(RecomendarError::NoTrainingData);
        }

        let mut user_index = IdIndex::new();
        let mut item_index = IdIndex::new();
        let mut rated: Vec<HashSet<usize>> = Vec::new();

        // explicit feedback trains over sparse COO triples
        let mut row_inds = Vec::new();
        let mut col_inds = Vec::new();
        let mut values = Vec::new();

        // implicit feedback trains over both transposed adjacency lists,
        // built in lockstep
        let mut cui: Vec<Vec<(usize, f32)>> = Vec::new();
        let mut ciu: Vec<Vec<(usize, f32)>> = Vec::new();

        for rating in train_set.iter() {
            let u = user_index.intern(&rating.user_id);
            if u == rated.len() {
                rated.push(HashSet::new());
            }
            let i = item_index.intern(&rating.item_id);

            if implicit {
                if u == cui.len() {
                    cui.push(Vec::new());
                }
                if i == ciu.len() {
                    ciu.push(Vec::new());
                }
                let confidence = 1.0 + self.alpha * rating.value;
                cui[u].push((i, confidence));
                ciu[i].push((u, confidence));
            } else {
                row_inds.push(u);
                col_inds.push(i);
                values.push(rating.value);
            }

            rated[u].insert(i);
        }

        let values = Vector::from_vec(values);
        let global_mean = if implicit { 0.0 } else { values.mean() };
        let end_range = if implicit { 0.01 } else { 0.1 };

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let user_factors = init_factors(user_index.len(), self.factors, &mut rng, end_range);
        let item_factors = init_factors(item_index.len(), self.factors, &mut rng, end_range);

        let mut model = Model {
            user_index,
            item_index,
            rated,
            global_mean,
            user_factors,
            item_factors,
            user_norms: OnceLock::new(),
            item_norms: OnceLock::new(),
        };

        let mut callback = self.callback.take();

        if implicit {
            let regularization = self.regularization.unwrap_or(0.01);
            implicit::train(
                &mut model,
                &cui,
                &ciu,
                self.iterations,
                regularization,
                &mut callback,
            );
        } else {
            let coo = explicit::CooRatings {
                row_inds,
                col_inds,
                values,
            };
            let options = explicit::SgdOptions {
                iterations: self.iterations,
                learning_rate: self.learning_rate,
                regularization: self.regularization.unwrap_or(0.1),
            };
            explicit::train(&mut model, &coo, valid_set, &options, &mut callback);
        }

        self.callback = callback;
        self.model = Some(model);
        Ok(())
    }

    /// Returns the predicted rating for a user and item.
    ///
    /// Unknown ids fall back to the global mean.
    ///
    /// # Panics
    ///
    /// Panics if the model is not fitted.
    #[must_use]
    pub fn predict(&self, user_id: &U, item_id: &I) -> f32 {
        self.model().predict(user_id, item_id)
    }

    /// Returns up to `count` recommendations for a user, skipping items
    /// the user already interacted with in training.
    ///
    /// Returns an empty list for an unknown user. The result can hold
    /// fewer than `count` entries when the user's rated items crowd out
    /// the candidate pool.
    ///
    /// # Panics
    ///
    /// Panics if the model is not fitted.
    #[must_use]
    pub fn user_recs(&self, user_id: &U, count: usize) -> Vec<Rec<I>> {
        let model = self.model();
        let u = match model.user_index.get(user_id) {
            Some(u) => u,
            None => return Vec::new(),
        };

        let rated = &model.rated[u];
        let factors = model.user_factors.row(u);
        let mut predictions: Vec<(usize, f32)> = (0..model.item_factors.n_rows())
            .map(|j| (j, kernels::dot(factors, model.item_factors.row(j))))
            .collect();
        predictions.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        predictions.truncate(count + rated.len());

        let mut recs = Vec::with_capacity(count);
        for (j, score) in predictions {
            if !rated.contains(&j) {
                recs.push(Rec {
                    id: model.item_index.id(j).clone(),
                    score,
                });
            }
        }
        recs.truncate(count);
        recs
    }

    /// Returns up to `count` items most similar to an item by cosine
    /// similarity of the item factors. The query item is excluded.
    ///
    /// Returns an empty list for an unknown item.
    ///
    /// # Panics
    ///
    /// Panics if the model is not fitted.
    #[must_use]
    pub fn item_recs(&self, item_id: &I, count: usize) -> Vec<Rec<I>> {
        let model = self.model();
        let norms = model.item_norms.get_or_init(|| model.item_factors.norms());
        similar(&model.item_index, &model.item_factors, norms, item_id, count)
    }

    /// Returns up to `count` users most similar to a user by cosine
    /// similarity of the user factors. The query user is excluded.
    ///
    /// Returns an empty list for an unknown user.
    ///
    /// # Panics
    ///
    /// Panics if the model is not fitted.
    #[must_use]
    pub fn similar_users(&self, user_id: &U, count: usize) -> Vec<Rec<U>> {
        let model = self.model();
        let norms = model.user_norms.get_or_init(|| model.user_factors.norms());
        similar(&model.user_index, &model.user_factors, norms, user_id, count)
    }

    /// Calculates the root mean square error of predictions over a
    /// dataset.
    ///
    /// # Panics
    ///
    /// Panics if the model is not fitted.
    #[must_use]
    pub fn rmse(&self, data: &Dataset<U, I>) -> f32 {
        self.model().rmse(data)
    }

    /// Returns user ids in first-seen training order.
    ///
    /// # Panics
    ///
    /// Panics if the model is not fitted.
    #[must_use]
    pub fn user_ids(&self) -> &[U] {
        self.model().user_index.ids()
    }

    /// Returns item ids in first-seen training order.
    ///
    /// # Panics
    ///
    /// Panics if the model is not fitted.
    #[must_use]
    pub fn item_ids(&self) -> &[I] {
        self.model().item_index.ids()
    }

    /// Returns the factor vector for a user, or `None` for an unknown
    /// user.
    ///
    /// # Panics
    ///
    /// Panics if the model is not fitted.
    #[must_use]
    pub fn user_factors(&self, user_id: &U) -> Option<&[f32]> {
        let model = self.model();
        model
            .user_index
            .get(user_id)
            .map(|u| model.user_factors.row(u))
    }

    /// Returns the factor vector for an item, or `None` for an unknown
    /// item.
    ///
    /// # Panics
    ///
    /// Panics if the model is not fitted.
    #[must_use]
    pub fn item_factors(&self, item_id: &I) -> Option<&[f32]> {
        let model = self.model();
        model
            .item_index
            .get(item_id)
            .map(|i| model.item_factors.row(i))
    }

    /// Returns the global mean: the mean training rating for explicit
    /// feedback, 0.0 for implicit feedback.
    ///
    /// # Panics
    ///
    /// Panics if the model is not fitted.
    #[must_use]
    pub fn global_mean(&self) -> f32 {
        self.model().global_mean
    }

    fn model(&self) -> &Model<U, I> {
        self.model
            .as_ref()
            .expect("Model not fitted. Call fit_explicit() or fit_implicit() first.")
    }
}

impl<U, I> Default for Recommender<U, I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<U, I> fmt::Debug for Recommender<U, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Recommender")
            .field("factors", &self.factors)
            .field("iterations", &self.iterations)
            .field("regularization", &self.regularization)
            .field("learning_rate", &self.learning_rate)
            .field("alpha", &self.alpha)
            .field("seed", &self.seed)
            .field("fitted", &self.model.is_some())
            .finish()
    }
}

fn init_factors(rows: usize, cols: usize, rng: &mut StdRng, end_range: f32) -> Matrix<f32> {
    let data = (0..rows * cols)
        .map(|_| rng.gen::<f32>() * end_range)
        .collect();
    Matrix::from_vec(rows, cols, data).expect("factor buffer length matches rows * cols")
}

fn similar<K: Clone + Eq + Hash>(
    index: &IdIndex<K>,
    factors: &Matrix<f32>,
    norms: &Vector<f32>,
    id: &K,
    count: usize,
) -> Vec<Rec<K>> {
    let i = match index.get(id) {
        Some(i) => i,
        None => return Vec::new(),
    };

    let row_factors = factors.row(i);
    let row_norm = norms[i];

    let mut predictions: Vec<(usize, f32)> = Vec::with_capacity(factors.n_rows());
    for j in 0..factors.n_rows() {
        let mut denom = row_norm * norms[j];
        if denom == 0.0 {
            denom = 1e-5;
        }
        predictions.push((j, kernels::dot(row_factors, factors.row(j)) / denom));
    }
    predictions.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    predictions.truncate(count + 1);

    let mut recs = Vec::with_capacity(count);
    for (j, score) in predictions {
        if j != i {
            recs.push(Rec {
                id: index.id(j).clone(),
                score,
            });
        }
    }
    recs.truncate(count);
    recs
}
