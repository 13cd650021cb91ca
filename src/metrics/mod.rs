pub mod tracker;

pub use tracker::{LearnStats, MetricsTracker, TrainingMetrics};
