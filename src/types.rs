use serde::{Deserialize, Serialize};

pub(crate) fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

pub(crate) fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    /// Data-URL or bare base64 image payload.
    pub image: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub model_loaded: bool,
}

#[derive(Debug, Serialize)]
pub struct ProbabilitiesDto {
    /// Percentages, rounded to two decimals.
    pub benign: f64,
    pub malignant: f64,
}

#[derive(Debug, Serialize)]
pub struct Details {
    #[serde(rename = "type")]
    pub lesion_type: &'static str,
    pub risk: &'static str,
    pub recommendation: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct LesionLocation {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub center_x: i32,
    pub center_y: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct LesionMetrics {
    pub area_pixels: i64,
    pub perimeter_pixels: f64,
    pub diameter_mm: f64,
    pub circularity: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AsymmetryReport {
    pub detected: bool,
    pub score: f64,
    pub description: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct BorderReport {
    pub irregular: bool,
    pub score: f64,
    pub description: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ColorReport {
    pub varied: bool,
    pub variance: f64,
    pub dominant_colors: Vec<String>,
    pub description: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiameterReport {
    pub value_mm: f64,
    pub warning: bool,
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AbcdeAnalysis {
    pub asymmetry: AsymmetryReport,
    pub border: BorderReport,
    pub color: ColorReport,
    pub diameter: DiameterReport,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub success: bool,
    pub prediction: &'static str,
    pub confidence: f64,
    pub confidence_level: &'static str,
    pub probabilities: ProbabilitiesDto,
    pub details: Details,
    pub lesion_detected: bool,
    pub processed_image: Option<String>,
    pub gradcam_image: Option<String>,
    pub lesion_location: Option<LesionLocation>,
    pub lesion_metrics: Option<LesionMetrics>,
    pub abcde_analysis: Option<AbcdeAnalysis>,
}
