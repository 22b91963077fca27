use std::io::Cursor;
use std::sync::Arc;

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::{DynamicImage, RgbImage};

use crate::config::Config;
use crate::error::ApiError;
use crate::lesion::{LesionAnalyzer, LesionConfig};
use crate::model::{Classification, Classifier};
use crate::preprocess::{PreprocessConfig, Processor};
use crate::saliency::SaliencyRenderer;
use crate::types::{round2, AnalyzeResponse, Details, ProbabilitiesDto};

/// Risk thresholds on the confidence percentage, applied to malignant
/// predictions only.
const RISK_HIGH_PCT: f64 = 85.0;
const RISK_MEDIUM_PCT: f64 = 70.0;

/// Per-request orchestration: decode -> preprocess -> classify -> lesion
/// characterization -> saliency -> response assembly. Stateless across
/// requests; the only shared state is the read-only classifier.
pub struct AnalysisService {
    classifier: Arc<dyn Classifier>,
    processor: Processor,
    analyzer: LesionAnalyzer,
    saliency: SaliencyRenderer,
    max_image_bytes: usize,
    high_confidence_threshold: f64,
    medium_confidence_threshold: f64,
}

impl AnalysisService {
    pub fn new(config: &Config, classifier: Arc<dyn Classifier>) -> Self {
        let font_data = config.overlay_font.as_ref().and_then(|path| {
            match std::fs::read(path) {
                Ok(data) => Some(data),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "overlay font unreadable");
                    None
                }
            }
        });

        Self {
            classifier,
            processor: Processor::new(PreprocessConfig {
                size: config.input_size,
                normalization: config.normalization,
                layout: config.input_layout,
            }),
            analyzer: LesionAnalyzer::new(LesionConfig::from(config), font_data),
            saliency: SaliencyRenderer::new(config.gradcam_alpha),
            max_image_bytes: config.max_image_bytes,
            high_confidence_threshold: config.high_confidence_threshold,
            medium_confidence_threshold: config.medium_confidence_threshold,
        }
    }

    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }

    /// Strips an optional data-URL prefix, decodes base64 and rejects
    /// oversized payloads before any pixel decoding happens.
    pub fn decode_image(&self, payload: &str) -> Result<DynamicImage, ApiError> {
        let encoded = match payload.split_once(',') {
            Some((_, rest)) => rest,
            None => payload,
        };
        let bytes = BASE64
            .decode(encoded.trim())
            .map_err(|e| ApiError::InvalidImage(format!("Invalid image data: {e}")))?;
        if bytes.len() > self.max_image_bytes {
            return Err(ApiError::PayloadTooLarge {
                max_bytes: self.max_image_bytes,
            });
        }
        image::load_from_memory(&bytes)
            .map_err(|e| ApiError::InvalidImage(format!("Invalid image data: {e}")))
    }

    pub fn analyze(&self, payload: &str) -> Result<AnalyzeResponse, ApiError> {
        let image = self.decode_image(payload)?;
        let rgb = image.to_rgb8();
        tracing::info!(width = rgb.width(), height = rgb.height(), "processing image");

        let tensor = self
            .processor
            .preprocess(&image)
            .context("preprocessing failed")
            .map_err(ApiError::Analysis)?;
        let probabilities = self
            .classifier
            .predict(&tensor)
            .context("inference failed")
            .map_err(ApiError::Analysis)?;
        let classification = Classification::from_probabilities(
            probabilities,
            self.high_confidence_threshold,
            self.medium_confidence_threshold,
        );
        tracing::info!(
            prediction = classification.prediction,
            confidence = classification.confidence,
            "classification complete"
        );

        let risk = risk_level(classification.is_malignant(), classification.confidence);
        let lesion = self.analyzer.analyze(&rgb);

        // Saliency degrades to an absent overlay; it never fails the request.
        let gradcam_image = match self.classifier.activation_map(&tensor) {
            Ok(Some(activations)) => self
                .saliency
                .render(&rgb, &activations)
                .and_then(|overlay| match encode_data_url(&overlay) {
                    Ok(url) => Some(url),
                    Err(e) => {
                        tracing::warn!(error = %format!("{e:#}"), "saliency overlay encoding failed");
                        None
                    }
                }),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %format!("{e:#}"), "saliency rendering failed");
                None
            }
        };

        let processed_image = Some(
            encode_data_url(&lesion.overlay)
                .context("overlay encoding failed")
                .map_err(ApiError::Analysis)?,
        );

        Ok(AnalyzeResponse {
            success: true,
            prediction: classification.prediction,
            confidence: classification.confidence,
            confidence_level: classification.confidence_level,
            probabilities: ProbabilitiesDto {
                benign: round2(probabilities.benign * 100.0),
                malignant: round2(probabilities.malignant * 100.0),
            },
            details: Details {
                lesion_type: if classification.is_malignant() {
                    "Melanoma"
                } else {
                    "Nevus Melanocítico"
                },
                risk,
                recommendation: recommendation(classification.is_malignant(), risk),
            },
            lesion_detected: lesion.detected,
            processed_image,
            gradcam_image,
            lesion_location: lesion.location,
            lesion_metrics: lesion.metrics,
            abcde_analysis: lesion.abcde,
        })
    }
}

/// Malignant + confidence >= 85 is high risk, [70, 85) medium, below low.
/// Benign predictions are always low risk.
pub fn risk_level(is_malignant: bool, confidence_pct: f64) -> &'static str {
    if !is_malignant {
        return "Bajo";
    }
    if confidence_pct >= RISK_HIGH_PCT {
        "Alto"
    } else if confidence_pct >= RISK_MEDIUM_PCT {
        "Medio"
    } else {
        "Bajo"
    }
}

fn recommendation(is_malignant: bool, risk: &'static str) -> &'static str {
    if is_malignant && risk == "Alto" {
        "Consulta URGENTE con un dermatólogo certificado. Se recomienda evaluación inmediata."
    } else if is_malignant {
        "Consulta con un dermatólogo certificado lo antes posible para evaluación profesional."
    } else {
        "Consulta con un dermatólogo para evaluación profesional y monitoreo rutinario."
    }
}

/// PNG data URL, the shape the frontend stores and re-uploads.
pub fn encode_data_url(image: &RgbImage) -> Result<String> {
    let mut buffer = Vec::new();
    image.write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Png)?;
    Ok(format!("data:image/png;base64,{}", BASE64.encode(buffer)))
}
