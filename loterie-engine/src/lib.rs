pub mod combination;
pub mod config;
pub mod error;
pub mod gap;
pub mod generator;
pub mod labels;
pub mod math;
pub mod sampler;
pub mod scoring;
pub mod stats;

pub use combination::{CombinationAnalysis, CombinationMiner, CombinationRecord};
pub use config::{CombinationConfig, EngineConfig, GapConfig, GapUnit, GeneratorConfig, ScoringWeights};
pub use error::{EngineError, Result};
pub use gap::{GapAnalysis, GapAnalyzer, GapRecord, GapStatistics};
pub use generator::{Prediction, PredictionGenerator, Strategy};
pub use labels::{Confidence, GridRating};
pub use sampler::NumberSource;
pub use scoring::{GridComparison, GridScorer, ScoreBreakdown, ScoringContext};
