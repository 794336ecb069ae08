//! Interaction data containers.
//!
//! A [`Dataset`] is an ordered list of user–item–value triples consumed
//! by the trainers; [`IdIndex`] maps external ids to the contiguous
//! internal indices the factor matrices are addressed by.

mod index;

pub use index::IdIndex;

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// A single user–item interaction.
///
/// `value` is an explicit rating or an implicit interaction weight
/// (typically 1.0).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating<U, I> {
    /// External user id.
    pub user_id: U,
    /// External item id.
    pub item_id: I,
    /// Rating or interaction weight.
    pub value: f32,
}

/// An ordered collection of ratings.
///
/// Id types can be any `Clone + Eq + Hash` scalar (strings or integers
/// of any width).
///
/// # Examples
///
/// ```
/// use recomendar::data::Dataset;
///
/// let mut data = Dataset::new();
/// data.push(1, "A", 5.0);
/// data.push(2, "B", 3.0);
/// assert_eq!(data.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset<U, I> {
    data: Vec<Rating<U, I>>,
}

impl<U, I> Dataset<U, I> {
    /// Creates an empty dataset.
    #[must_use]
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    /// Creates an empty dataset with preallocated capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
        }
    }

    /// Reserves capacity for at least `additional` more ratings.
    pub fn grow(&mut self, additional: usize) {
        self.data.reserve(additional);
    }

    /// Adds a rating.
    pub fn push(&mut self, user_id: U, item_id: I, value: f32) {
        self.data.push(Rating {
            user_id,
            item_id,
            value,
        });
    }

    /// Returns the number of ratings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the dataset holds no ratings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Iterates over the ratings in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Rating<U, I>> {
        self.data.iter()
    }
}

impl<U: Clone, I: Clone> Dataset<U, I> {
    /// Splits the dataset into training and validation sets.
    ///
    /// A uniformly random permutation of the ratings is drawn from the
    /// process-wide RNG; the first `⌊p·n⌋` entries become the training
    /// set and the remainder the validation set. The original dataset is
    /// left untouched.
    ///
    /// # Examples
    ///
    /// ```
    /// use recomendar::data::Dataset;
    ///
    /// let mut data = Dataset::new();
    /// for u in 0..10 {
    ///     data.push(u, 1, 1.0);
    /// }
    /// let (train, valid) = data.split_random(0.8);
    /// assert_eq!(train.len(), 8);
    /// assert_eq!(valid.len(), 2);
    /// ```
    #[must_use]
    pub fn split_random(&self, p: f32) -> (Self, Self) {
        let split = (p * self.data.len() as f32) as usize;
        let mut shuffled = self.data.clone();
        shuffled.shuffle(&mut rand::thread_rng());
        let valid = shuffled.split_off(split);
        (Self { data: shuffled }, Self { data: valid })
    }
}

impl<U, I> Default for Dataset<U, I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, U, I> IntoIterator for &'a Dataset<U, I> {
    type Item = &'a Rating<U, I>;
    type IntoIter = std::slice::Iter<'a, Rating<U, I>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
