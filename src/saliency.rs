use image::{imageops, GrayImage, Luma, RgbImage};
use ndarray::{Array2, Array3, Axis};

/// Declared mapping from supported architecture identifiers to the feature
/// layer their ONNX exports are expected to expose. An explicit output name
/// always wins; an unknown architecture disables saliency rather than
/// guessing by introspection.
pub fn declared_feature_output(arch: Option<&str>, explicit: Option<&str>) -> Option<String> {
    if let Some(name) = explicit {
        return Some(name.to_string());
    }
    match arch?.to_ascii_lowercase().as_str() {
        "efficientnet" => Some("top_activation".to_string()),
        "resnet" => Some("conv5_block3_out".to_string()),
        "mobilenet" => Some("out_relu".to_string()),
        other => {
            tracing::warn!(arch = other, "no feature layer declared for architecture");
            None
        }
    }
}

/// Builds a class-activation heatmap from convolutional feature maps and
/// composites it over the source image. Every failure mode is an absent
/// result; saliency never fails a request.
pub struct SaliencyRenderer {
    alpha: f32,
}

impl SaliencyRenderer {
    pub fn new(alpha: f32) -> Self {
        Self {
            alpha: alpha.clamp(0.0, 1.0),
        }
    }

    pub fn render(&self, image: &RgbImage, activations: &Array3<f32>) -> Option<RgbImage> {
        let heat = self.heatmap(activations)?;
        Some(self.composite(image, &heat))
    }

    /// Channel weights are the spatially pooled activations; the weighted sum
    /// is clipped to non-negative values and normalized to [0, 1]. A map with
    /// no positive response yields `None`.
    pub fn heatmap(&self, activations: &Array3<f32>) -> Option<Array2<f32>> {
        let (channels, height, width) = activations.dim();
        if channels == 0 || height == 0 || width == 0 {
            return None;
        }

        let mut heat = Array2::<f32>::zeros((height, width));
        for c in 0..channels {
            let map = activations.index_axis(Axis(0), c);
            let weight = map.mean().unwrap_or(0.0);
            heat.zip_mut_with(&map, |acc, &v| *acc += weight * v);
        }

        heat.mapv_inplace(|v| v.max(0.0));
        let max = heat.iter().copied().fold(0.0f32, f32::max);
        if max <= f32::EPSILON {
            return None;
        }
        heat.mapv_inplace(|v| v / max);
        Some(heat)
    }

    /// Upsample to the source resolution, colorize, alpha-blend.
    fn composite(&self, image: &RgbImage, heat: &Array2<f32>) -> RgbImage {
        let (height, width) = heat.dim();
        let mut small = GrayImage::new(width as u32, height as u32);
        for ((y, x), v) in heat.indexed_iter() {
            small.put_pixel(x as u32, y as u32, Luma([(v * 255.0) as u8]));
        }
        let upsampled = imageops::resize(
            &small,
            image.width(),
            image.height(),
            imageops::FilterType::Triangle,
        );

        let mut out = image.clone();
        for (x, y, pixel) in out.enumerate_pixels_mut() {
            let jet = jet_color(upsampled.get_pixel(x, y)[0] as f32 / 255.0);
            for c in 0..3 {
                pixel[c] = (jet[c] as f32 * self.alpha + pixel[c] as f32 * (1.0 - self.alpha))
                    .round() as u8;
            }
        }
        out
    }
}

/// Jet colormap over [0, 1]: blue -> cyan -> yellow -> red.
fn jet_color(v: f32) -> [u8; 3] {
    let v = v.clamp(0.0, 1.0);
    let r = (1.5 - (4.0 * v - 3.0).abs()).clamp(0.0, 1.0);
    let g = (1.5 - (4.0 * v - 2.0).abs()).clamp(0.0, 1.0);
    let b = (1.5 - (4.0 * v - 1.0).abs()).clamp(0.0, 1.0);
    [(r * 255.0) as u8, (g * 255.0) as u8, (b * 255.0) as u8]
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn explicit_output_overrides_architecture_mapping() {
        assert_eq!(
            declared_feature_output(Some("efficientnet"), Some("my_layer")),
            Some("my_layer".to_string())
        );
        assert_eq!(
            declared_feature_output(Some("EfficientNet"), None),
            Some("top_activation".to_string())
        );
        assert_eq!(declared_feature_output(Some("vgg"), None), None);
        assert_eq!(declared_feature_output(None, None), None);
    }

    #[test]
    fn heatmap_is_normalized_to_unit_range() {
        let mut activations = Array3::<f32>::zeros((2, 4, 4));
        activations[[0, 1, 1]] = 2.0;
        activations[[1, 2, 2]] = 4.0;

        let heat = SaliencyRenderer::new(0.4).heatmap(&activations).unwrap();
        let max = heat.iter().copied().fold(f32::MIN, f32::max);
        let min = heat.iter().copied().fold(f32::MAX, f32::min);
        assert!((max - 1.0).abs() < 1e-6);
        assert!(min >= 0.0);
    }

    #[test]
    fn non_positive_activations_yield_no_heatmap() {
        let activations = Array3::<f32>::from_elem((3, 4, 4), -1.0);
        assert!(SaliencyRenderer::new(0.4).heatmap(&activations).is_none());

        let empty = Array3::<f32>::zeros((0, 4, 4));
        assert!(SaliencyRenderer::new(0.4).heatmap(&empty).is_none());
    }

    #[test]
    fn overlay_matches_source_dimensions() {
        let image = RgbImage::from_pixel(96, 64, Rgb([80, 90, 100]));
        let mut activations = Array3::<f32>::zeros((1, 7, 7));
        activations[[0, 3, 3]] = 1.0;

        let rendered = SaliencyRenderer::new(0.4).render(&image, &activations).unwrap();
        assert_eq!(rendered.dimensions(), image.dimensions());
    }

    #[test]
    fn zero_alpha_leaves_image_untouched() {
        let image = RgbImage::from_pixel(32, 32, Rgb([10, 200, 60]));
        let mut activations = Array3::<f32>::zeros((1, 4, 4));
        activations[[0, 0, 0]] = 1.0;

        let rendered = SaliencyRenderer::new(0.0).render(&image, &activations).unwrap();
        assert_eq!(rendered, image);
    }
}
