//! ML stage: feature extraction and pluggable predictors

pub mod features;
pub mod heuristic;
pub mod predictor;
pub mod subprocess;

pub use features::{MlFeatureExtractor, MlFeatures};
pub use heuristic::HeuristicPredictor;
pub use predictor::{
    DisabledPredictor, MlPrediction, Prediction, RiskPredictor, StaticPredictor,
    UnavailableReason,
};
pub use subprocess::{SubprocessPredictor, DEFAULT_PREDICTOR_TIMEOUT};
