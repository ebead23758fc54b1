//! Macro implementations

pub mod life_model;
pub mod relation;

pub use life_model::derive_life_model;
