//! Signal aggregation and scoring engine for Flipscout.
//!
//! Collects noisy signals for one product query from heterogeneous external
//! sources — shopping-price search, social post search, marketplace order
//! counts — and reduces them to normalized business metrics: estimated
//! sourcing cost and retail price, profit margin, a confidence score, and
//! time-bucketed engagement series.

pub mod confidence;
pub mod distill;
pub mod engagement;
pub mod error;
pub mod normalize;
pub mod pipeline;
pub mod pricing;
pub mod sources;
pub mod types;
pub mod volume;

pub use error::SourceError;
pub use pipeline::{AnalysisEngine, EngineOptions};
pub use types::{ProductInsight, ProductMetrics};
