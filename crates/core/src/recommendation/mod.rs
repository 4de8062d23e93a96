//! Next-set recommendation strategy

pub mod engine;

pub use engine::{RecommendationEngine, RpeRecommendationEngine};
