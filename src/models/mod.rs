//! Data models
//!
//! Rust structs for the `species` and `animal` tables.

mod animal;
mod sample;
mod species;

pub use crate::config::TIMESTAMP_FORMAT;
pub use animal::Animal;
pub use sample::{sample_animals, sample_insert_statements, sample_species};
pub use species::Species;
