use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Pixel normalization applied before inference. Must match whatever the
/// classifier was trained with; a mismatch degrades predictions silently
/// instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Normalization {
    /// Raw 0-255 values.
    None,
    /// Scale into [0, 1].
    ZeroOne,
    /// Scale into [-1, 1].
    Signed,
    /// ImageNet mean/std normalization.
    Imagenet,
}

/// Axis order of a rank-4 image tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TensorLayout {
    Nhwc,
    Nchw,
}

/// Server configuration, environment-driven. Defaults mirror the reference
/// deployment of the melanoma classifier.
#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Path to the serialized ONNX classifier.
    #[arg(long, env = "MODEL_PATH", default_value = "models/melanoma.onnx")]
    pub model_path: PathBuf,

    /// Square model input edge in pixels.
    #[arg(long, env = "MODEL_INPUT_SIZE", default_value_t = 224)]
    pub input_size: u32,

    #[arg(long, env = "MODEL_NORMALIZATION", value_enum, default_value_t = Normalization::None)]
    pub normalization: Normalization,

    #[arg(long, env = "MODEL_INPUT_LAYOUT", value_enum, default_value_t = TensorLayout::Nhwc)]
    pub input_layout: TensorLayout,

    /// Architecture identifier used to look up the saliency feature layer
    /// (e.g. "efficientnet", "resnet", "mobilenet").
    #[arg(long, env = "MODEL_ARCH")]
    pub model_arch: Option<String>,

    /// Explicit feature-map output name; overrides the architecture mapping.
    #[arg(long, env = "MODEL_FEATURE_OUTPUT")]
    pub feature_output: Option<String>,

    #[arg(long, env = "MODEL_FEATURE_LAYOUT", value_enum, default_value_t = TensorLayout::Nhwc)]
    pub feature_layout: TensorLayout,

    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    /// Comma-separated CORS allow-list; "*" allows any origin.
    #[arg(
        long,
        env = "CORS_ORIGINS",
        default_value = "http://localhost:5173,http://localhost:3000,http://127.0.0.1:5173,http://127.0.0.1:3000"
    )]
    pub cors_origins: String,

    /// Maximum decoded image payload in bytes.
    #[arg(long, env = "MAX_IMAGE_SIZE", default_value_t = 10 * 1024 * 1024)]
    pub max_image_bytes: usize,

    /// Approximate pixel-to-millimeter conversion. Uncalibrated: no physical
    /// scale is recoverable from a single image, so the diameter estimate is
    /// a proxy, not a measurement.
    #[arg(long, env = "PIXEL_TO_MM_RATIO", default_value_t = 0.1)]
    pub pixel_to_mm_ratio: f64,

    /// Minimum contour area (px^2) to report a lesion.
    #[arg(long, env = "MIN_LESION_AREA", default_value_t = 100.0)]
    pub min_lesion_area: f64,

    /// Contour stroke thickness on the overlay, in pixels.
    #[arg(long, env = "BORDER_THICKNESS", default_value_t = 3)]
    pub border_thickness: u32,

    #[arg(long, env = "HIGH_CONFIDENCE_THRESHOLD", default_value_t = 0.85)]
    pub high_confidence_threshold: f64,

    #[arg(long, env = "MEDIUM_CONFIDENCE_THRESHOLD", default_value_t = 0.60)]
    pub medium_confidence_threshold: f64,

    #[arg(long, env = "ASYMMETRY_THRESHOLD", default_value_t = 0.15)]
    pub asymmetry_threshold: f64,

    #[arg(long, env = "BORDER_IRREGULARITY_THRESHOLD", default_value_t = 0.25)]
    pub border_irregularity_threshold: f64,

    #[arg(long, env = "COLOR_VARIANCE_THRESHOLD", default_value_t = 30.0)]
    pub color_variance_threshold: f64,

    #[arg(long, env = "DIAMETER_WARNING_MM", default_value_t = 6.0)]
    pub diameter_warning_mm: f64,

    /// Blend weight of the saliency heatmap over the source image.
    #[arg(long, env = "GRADCAM_ALPHA", default_value_t = 0.4)]
    pub gradcam_alpha: f32,

    /// TTF font for the overlay label. When unset the label is omitted.
    #[arg(long, env = "OVERLAY_FONT")]
    pub overlay_font: Option<PathBuf>,
}

impl Config {
    pub fn cors_origin_list(&self) -> Vec<String> {
        self.cors_origins
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    pub fn allow_any_origin(&self) -> bool {
        self.cors_origin_list().iter().any(|o| o == "*")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cors_list_parsing() {
        let mut config = Config::parse_from(["melanox"]);
        config.cors_origins = "http://a.example, http://b.example ,".into();
        assert_eq!(
            config.cors_origin_list(),
            vec!["http://a.example".to_string(), "http://b.example".to_string()]
        );
        assert!(!config.allow_any_origin());

        config.cors_origins = "*".into();
        assert!(config.allow_any_origin());
    }
}
