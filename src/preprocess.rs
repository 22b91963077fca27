use anyhow::{anyhow, Result};
use fast_image_resize::images::Image;
use fast_image_resize::{FilterType, IntoImageView, ResizeAlg, ResizeOptions, Resizer};
use image::DynamicImage;
use ndarray::Array4;

use crate::config::{Normalization, TensorLayout};

/// ImageNet statistics, used by the `imagenet` normalization mode.
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

#[derive(Debug, Clone)]
pub struct PreprocessConfig {
    pub size: u32,
    pub normalization: Normalization,
    pub layout: TensorLayout,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            size: 224,
            normalization: Normalization::None,
            layout: TensorLayout::Nhwc,
        }
    }
}

/// Turns an arbitrary decoded image into the fixed-size tensor the classifier
/// expects. The output shape and numeric range must match what the model was
/// trained on; a mismatch produces silently degraded predictions rather than
/// an error.
#[derive(Debug)]
pub struct Processor {
    config: PreprocessConfig,
}

impl Processor {
    pub fn new(config: PreprocessConfig) -> Self {
        Self { config }
    }

    /// Resize to the square input size with Lanczos3, force three channels and
    /// emit a rank-4 tensor with batch dimension 1 in the configured layout.
    pub fn preprocess(&self, image: &DynamicImage) -> Result<Array4<f32>> {
        let resized = self.resize_square(image)?;
        let size = self.config.size as usize;

        let mut tensor = match self.config.layout {
            TensorLayout::Nhwc => Array4::<f32>::zeros((1, size, size, 3)),
            TensorLayout::Nchw => Array4::<f32>::zeros((1, 3, size, size)),
        };

        for (x, y, pixel) in resized.enumerate_pixels() {
            let (x, y) = (x as usize, y as usize);
            for c in 0..3 {
                let value = self.normalize(pixel[c], c);
                match self.config.layout {
                    TensorLayout::Nhwc => tensor[[0, y, x, c]] = value,
                    TensorLayout::Nchw => tensor[[0, c, y, x]] = value,
                }
            }
        }

        Ok(tensor)
    }

    fn normalize(&self, value: u8, channel: usize) -> f32 {
        let v = value as f32;
        match self.config.normalization {
            Normalization::None => v,
            Normalization::ZeroOne => v / 255.0,
            Normalization::Signed => v / 127.5 - 1.0,
            Normalization::Imagenet => (v / 255.0 - IMAGENET_MEAN[channel]) / IMAGENET_STD[channel],
        }
    }

    fn resize_square(&self, image: &DynamicImage) -> Result<image::RgbImage> {
        let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
        let mut dst = Image::new(
            self.config.size,
            self.config.size,
            rgb.pixel_type()
                .ok_or_else(|| anyhow!("unsupported pixel type"))?,
        );

        let mut resizer = Resizer::new();
        let options =
            ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Lanczos3));
        resizer
            .resize(&rgb, &mut dst, Some(&options))
            .map_err(|e| anyhow!("resize failed: {e}"))?;

        image::RgbImage::from_raw(self.config.size, self.config.size, dst.buffer().to_vec())
            .ok_or_else(|| anyhow!("resized buffer has unexpected length"))
    }
}
