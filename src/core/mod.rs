//! Fundamental types and error handling shared by every pairboost module.

pub mod error;
pub mod types;

pub use error::{PairBoostError, Result};
pub use types::*;
