//! Convenience re-exports for common usage.
//!
//! # Usage
//!
//! ```
//! use recomendar::prelude::*;
//! ```

pub use crate::data::{Dataset, Rating};
pub use crate::error::{RecomendarError, Result};
pub use crate::loading::load_movielens;
pub use crate::primitives::{Matrix, Vector};
pub use crate::recommender::{FitInfo, Rec, Recommender};
