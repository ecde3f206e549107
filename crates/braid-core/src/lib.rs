pub mod constants;
pub mod error;
pub mod types;
pub mod weight;

pub use constants::*;
pub use error::BraidError;
pub use types::*;
pub use weight::{sub_weights, sum_weights, weight_to_work};
