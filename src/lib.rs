//! Recomendar: collaborative-filtering recommendations in pure Rust.
//!
//! Learns a low-rank factorization of the user-item interaction matrix
//! and serves top-k recommendation and similarity queries from the
//! learned factors. Explicit ratings are trained with twin-learner
//! stochastic gradient descent; implicit feedback with alternating least
//! squares accelerated by a conjugate-gradient inner solver.
//!
//! # Quick Start
//!
//! ```
//! use recomendar::prelude::*;
//!
//! // Collect interactions (user id, item id, rating)
//! let mut data = Dataset::new();
//! data.push(1, "city", 5.0);
//! data.push(1, "sea", 3.0);
//! data.push(2, "city", 4.0);
//!
//! // Train
//! let mut recommender = Recommender::new().with_factors(4).with_seed(42);
//! recommender.fit_explicit(&data).unwrap();
//!
//! // Query
//! let recs = recommender.user_recs(&2, 5);
//! assert!(recs.len() <= 5);
//! let score = recommender.predict(&1, &"sea");
//! assert!(score.is_finite());
//! ```
//!
//! # Modules
//!
//! - [`primitives`]: Core Vector and Matrix types
//! - [`data`]: Dataset, ratings and id interning
//! - [`recommender`]: Training and queries
//! - [`loading`]: MovieLens 100K example data
//! - [`error`]: Crate error type

pub mod data;
pub mod error;
pub mod loading;
pub mod prelude;
pub mod primitives;
pub mod recommender;

pub use data::{Dataset, Rating};
pub use error::{RecomendarError, Result};
pub use recommender::{FitInfo, Rec, Recommender};
