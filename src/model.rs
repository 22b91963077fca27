use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use ndarray::{Array3, Array4, ArrayD, Axis, CowArray, Ix4};
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::{GraphOptimizationLevel, SessionBuilder};
use ort::session::Session;
use serde::Serialize;

use crate::config::{Config, TensorLayout};
use crate::saliency;
use crate::types::round2;

/// Builds an ONNX Runtime session for the classifier.
pub struct OnnxModel;

impl OnnxModel {
    pub fn load_session(model_path: &Path) -> Result<Session> {
        if !model_path.exists() {
            bail!("model file not found at {}", model_path.display());
        }
        let session = SessionBuilder::new()?
            .with_execution_providers([CPUExecutionProvider::default().build()])?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .commit_from_file(model_path)?;
        Ok(session)
    }
}

/// Normalized two-class output, regardless of whether the model ends in a
/// single sigmoid unit or a two-way softmax.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Probabilities {
    pub benign: f64,
    pub malignant: f64,
}

impl Probabilities {
    /// `scores` is the flattened classifier output: one value (sigmoid
    /// malignancy probability) or two values ([benign, malignant] softmax).
    pub fn from_scores(scores: &[f32]) -> Result<Self> {
        match scores {
            [malignant] => {
                let malignant = *malignant as f64;
                Ok(Self {
                    benign: 1.0 - malignant,
                    malignant,
                })
            }
            [benign, malignant] => Ok(Self {
                benign: *benign as f64,
                malignant: *malignant as f64,
            }),
            other => bail!("unexpected classifier output length {}", other.len()),
        }
    }

    pub fn is_malignant(&self) -> bool {
        // Exactly 0.5 stays benign.
        self.malignant > 0.5
    }

    /// Winning class probability, still in [0, 1].
    pub fn confidence(&self) -> f64 {
        self.benign.max(self.malignant)
    }
}

/// Final classification record, immutable once produced.
#[derive(Debug, Clone, Serialize)]
pub struct Classification {
    pub prediction: &'static str,
    /// Percentage, rounded to two decimals.
    pub confidence: f64,
    pub confidence_level: &'static str,
    #[serde(skip)]
    pub probabilities: Probabilities,
}

impl Classification {
    pub fn from_probabilities(probabilities: Probabilities, high: f64, medium: f64) -> Self {
        let raw_confidence = probabilities.confidence();
        let confidence_level = if raw_confidence >= high {
            "High"
        } else if raw_confidence >= medium {
            "Medium"
        } else {
            "Low"
        };
        Self {
            prediction: if probabilities.is_malignant() {
                "Maligno"
            } else {
                "Benigno"
            },
            confidence: round2(raw_confidence * 100.0),
            confidence_level,
            probabilities,
        }
    }

    pub fn is_malignant(&self) -> bool {
        self.prediction == "Maligno"
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub input_shape: Vec<i64>,
    pub output_shape: Vec<i64>,
    pub total_params: Option<i64>,
    pub model_path: String,
}

/// Inference seam. The production implementation wraps an ONNX session; tests
/// inject stubs.
pub trait Classifier: Send + Sync {
    /// Forward pass over a preprocessed batch-of-one tensor. Errors here are
    /// fatal to the request, never retried.
    fn predict(&self, input: &Array4<f32>) -> Result<Probabilities>;

    /// Activations of the declared feature layer as (C, H, W), or `None` when
    /// the model exposes no such output. Used by the saliency renderer.
    fn activation_map(&self, input: &Array4<f32>) -> Result<Option<Array3<f32>>>;

    fn info(&self) -> ModelInfo;
}

pub struct OnnxClassifier {
    session: Session,
    model_path: PathBuf,
    feature_output: Option<String>,
    feature_layout: TensorLayout,
}

impl OnnxClassifier {
    /// Loads the classifier once at startup. A missing or undeserializable
    /// model file is fatal: the process must not start without it.
    pub fn load(config: &Config) -> Result<Self> {
        let session = OnnxModel::load_session(&config.model_path)
            .with_context(|| format!("loading classifier from {}", config.model_path.display()))?;

        let declared = saliency::declared_feature_output(
            config.model_arch.as_deref(),
            config.feature_output.as_deref(),
        );
        // Fallback policy: a declared name that the graph does not actually
        // export disables saliency instead of erroring.
        let feature_output = declared.filter(|name| {
            let present = session.outputs.iter().any(|o| &o.name == name);
            if !present {
                tracing::warn!(layer = %name, "feature output not exported by model; saliency disabled");
            }
            present
        });

        Ok(Self {
            session,
            model_path: config.model_path.clone(),
            feature_output,
            feature_layout: config.feature_layout,
        })
    }

    pub fn saliency_available(&self) -> bool {
        self.feature_output.is_some()
    }

    fn run_outputs(&self, input: &Array4<f32>) -> Result<Vec<(String, ArrayD<f32>)>> {
        let input = CowArray::from(input.view().into_dyn());
        let outputs = self.session.run(ort::inputs![input.view()]?)?;
        let mut extracted = Vec::new();
        for (name, value) in outputs.iter() {
            let tensor = value.try_extract_tensor::<f32>()?.into_owned();
            extracted.push((name.to_string(), tensor));
        }
        Ok(extracted)
    }

    /// The classification head is the output with one or two elements; models
    /// exporting an auxiliary feature map carry it as a separate output.
    fn classification_scores(outputs: &[(String, ArrayD<f32>)]) -> Result<Vec<f32>> {
        outputs
            .iter()
            .map(|(_, t)| t)
            .find(|t| (1..=2).contains(&t.len()))
            .or_else(|| outputs.first().map(|(_, t)| t))
            .map(|t| t.iter().copied().collect())
            .ok_or_else(|| anyhow!("model produced no outputs"))
    }

    fn tensor_dims(value_type: &ort::value::ValueType) -> Vec<i64> {
        match value_type {
            ort::value::ValueType::Tensor { dimensions, .. } => dimensions.clone(),
            _ => Vec::new(),
        }
    }
}

impl Classifier for OnnxClassifier {
    fn predict(&self, input: &Array4<f32>) -> Result<Probabilities> {
        let outputs = self.run_outputs(input)?;
        let scores = Self::classification_scores(&outputs)?;
        Probabilities::from_scores(&scores)
    }

    fn activation_map(&self, input: &Array4<f32>) -> Result<Option<Array3<f32>>> {
        let Some(name) = &self.feature_output else {
            return Ok(None);
        };
        let outputs = self.run_outputs(input)?;
        let Some((_, tensor)) = outputs.into_iter().find(|(n, _)| n == name) else {
            return Ok(None);
        };

        let tensor = tensor
            .into_dimensionality::<Ix4>()
            .context("feature output is not a rank-4 tensor")?;
        let spatial = tensor.index_axis_move(Axis(0), 0);
        let chw = match self.feature_layout {
            TensorLayout::Nchw => spatial,
            TensorLayout::Nhwc => spatial
                .permuted_axes([2, 0, 1])
                .as_standard_layout()
                .to_owned(),
        };
        Ok(Some(chw))
    }

    fn info(&self) -> ModelInfo {
        let input_shape = self
            .session
            .inputs
            .first()
            .map(|i| Self::tensor_dims(&i.input_type))
            .unwrap_or_default();
        let output_shape = self
            .session
            .outputs
            .first()
            .map(|o| Self::tensor_dims(&o.output_type))
            .unwrap_or_default();
        // Parameter count is not recoverable from a committed session; honor
        // it when the exporter stamped it into the model metadata.
        let total_params = self
            .session
            .metadata()
            .ok()
            .and_then(|m| m.custom("total_params").ok().flatten())
            .and_then(|v| v.parse().ok());

        ModelInfo {
            input_shape,
            output_shape,
            total_params,
            model_path: self.model_path.display().to_string(),
        }
    }
}
