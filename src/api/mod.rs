//! Remote clinic API: async reqwest client, error taxonomy, and the
//! single-point wire-shape normalization for every endpoint consumed.

pub mod client;
pub mod error;
pub mod normalize;
pub mod types;

pub use client::ApiClient;
pub use error::ApiError;
