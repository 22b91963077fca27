pub mod config;
pub mod error;
pub mod preprocess;
pub mod model;
pub mod lesion;
pub mod saliency;
pub mod service;
pub mod types;
pub mod server;

pub use crate::config::{Config, Normalization, TensorLayout};
pub use crate::error::ApiError;
pub use crate::preprocess::{Processor, PreprocessConfig};
pub use crate::model::{Classifier, Classification, OnnxClassifier, OnnxModel, Probabilities};
pub use crate::lesion::{LesionAnalyzer, LesionReport};
pub use crate::saliency::SaliencyRenderer;
pub use crate::service::AnalysisService;
pub use crate::server::build_router;
