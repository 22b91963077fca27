use std::cmp::Ordering;

use ab_glyph::{FontVec, PxScale};
use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::contours::{find_contours, BorderType};
use imageproc::distance_transform::Norm;
use imageproc::drawing::{
    draw_filled_circle_mut, draw_hollow_rect_mut, draw_polygon_mut, draw_text_mut,
};
use imageproc::filter::gaussian_blur_f32;
use imageproc::geometry::{approximate_polygon_dp, arc_length, convex_hull};
use imageproc::morphology::{close, open};
use imageproc::point::Point;
use imageproc::rect::Rect;
use rand::seq::SliceRandom;

use crate::config::Config;
use crate::types::{
    round2, round3, AbcdeAnalysis, AsymmetryReport, BorderReport, ColorReport, DiameterReport,
    LesionLocation, LesionMetrics,
};

const CONTOUR_COLOR: Rgb<u8> = Rgb([0, 255, 255]);
const BOX_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const CENTER_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// Adaptive threshold neighborhood radius (11x11 block) and mean offset.
const BLOCK_RADIUS: u32 = 5;
const THRESHOLD_OFFSET: f64 = 2.0;
/// Gaussian smoothing before thresholding, matching a 5x5 kernel.
const BLUR_SIGMA: f32 = 1.1;
/// Morphological structuring radius (5x5 kernel).
const MORPH_RADIUS: u8 = 2;
/// Dominant-color sampling cap.
const COLOR_SAMPLE_CAP: usize = 1000;

#[derive(Debug, Clone)]
pub struct LesionConfig {
    pub min_area: f64,
    pub pixel_to_mm_ratio: f64,
    pub border_thickness: u32,
    pub asymmetry_threshold: f64,
    pub border_irregularity_threshold: f64,
    pub color_variance_threshold: f64,
    pub diameter_warning_mm: f64,
}

impl From<&Config> for LesionConfig {
    fn from(config: &Config) -> Self {
        Self {
            min_area: config.min_lesion_area,
            pixel_to_mm_ratio: config.pixel_to_mm_ratio,
            border_thickness: config.border_thickness,
            asymmetry_threshold: config.asymmetry_threshold,
            border_irregularity_threshold: config.border_irregularity_threshold,
            color_variance_threshold: config.color_variance_threshold,
            diameter_warning_mm: config.diameter_warning_mm,
        }
    }
}

/// Outcome of the per-request characterization pipeline. A lesion that is
/// absent or too small is a valid terminal state, not an error; descriptors
/// are null and the overlay is an unannotated copy.
#[derive(Debug)]
pub struct LesionReport {
    pub detected: bool,
    pub location: Option<LesionLocation>,
    pub metrics: Option<LesionMetrics>,
    pub abcde: Option<AbcdeAnalysis>,
    pub overlay: RgbImage,
}

/// Contour-based lesion detection and ABCDE scoring over a decoded image.
pub struct LesionAnalyzer {
    config: LesionConfig,
    font: Option<FontVec>,
}

impl LesionAnalyzer {
    pub fn new(config: LesionConfig, font_data: Option<Vec<u8>>) -> Self {
        let font = font_data.and_then(|data| match FontVec::try_from_vec(data) {
            Ok(font) => Some(font),
            Err(e) => {
                tracing::warn!(error = %e, "overlay font unusable; labels will be omitted");
                None
            }
        });
        Self { config, font }
    }

    pub fn analyze(&self, image: &RgbImage) -> LesionReport {
        let mask = self.segment(image);
        let Some(points) = self.select_contour(&mask) else {
            return LesionReport {
                detected: false,
                location: None,
                metrics: None,
                abcde: None,
                overlay: image.clone(),
            };
        };

        let (min_x, min_y, max_x, max_y) = bounding_box(&points);
        let (width, height) = (max_x - min_x + 1, max_y - min_y + 1);

        let area = contour_area(&points);
        let perimeter = arc_length(&points, true);
        let circ = circularity(area, perimeter);
        let diameter_mm =
            ((width * width + height * height) as f64).sqrt() * self.config.pixel_to_mm_ratio;

        let moments = polygon_moments(&points);
        let (center_x, center_y) = if moments.m00 != 0.0 {
            (
                (moments.m10 / moments.m00) as i32,
                (moments.m01 / moments.m00) as i32,
            )
        } else {
            (min_x + width / 2, min_y + height / 2)
        };

        let location = LesionLocation {
            x: min_x,
            y: min_y,
            width,
            height,
            center_x,
            center_y,
        };
        let metrics = LesionMetrics {
            area_pixels: area as i64,
            perimeter_pixels: round2(perimeter),
            diameter_mm: round2(diameter_mm),
            circularity: round3(circ),
        };

        let abcde = self.analyze_abcde(image, &points, perimeter, metrics.diameter_mm);
        let overlay = self.render_overlay(image, &points, &location, metrics.diameter_mm);

        LesionReport {
            detected: true,
            location: Some(location),
            metrics: Some(metrics),
            abcde: Some(abcde),
            overlay,
        }
    }

    /// Grayscale -> blur -> inverted adaptive threshold -> close -> open.
    fn segment(&self, image: &RgbImage) -> GrayImage {
        let gray = image::imageops::grayscale(image);
        let blurred = gaussian_blur_f32(&gray, BLUR_SIGMA);
        let thresholded = adaptive_threshold_inv(&blurred, BLOCK_RADIUS, THRESHOLD_OFFSET);
        let closed = close(&thresholded, Norm::LInf, MORPH_RADIUS);
        open(&closed, Norm::LInf, MORPH_RADIUS)
    }

    /// Largest outer contour above the minimum-area cutoff.
    fn select_contour(&self, mask: &GrayImage) -> Option<Vec<Point<i32>>> {
        find_contours::<i32>(mask)
            .into_iter()
            .filter(|c| c.border_type == BorderType::Outer)
            .filter(|c| c.points.len() >= 3)
            .map(|c| (contour_area(&c.points), c.points))
            .filter(|(area, _)| *area >= self.config.min_area)
            .max_by(|(a, _), (b, _)| a.partial_cmp(b).unwrap_or(Ordering::Equal))
            .map(|(_, points)| points)
    }

    fn analyze_abcde(
        &self,
        image: &RgbImage,
        points: &[Point<i32>],
        perimeter: f64,
        diameter_mm: f64,
    ) -> AbcdeAnalysis {
        let asymmetry_score = asymmetry(points);
        let asymmetry_detected = asymmetry_score > self.config.asymmetry_threshold;

        let border_score = border_irregularity(points, perimeter);
        let border_irregular = border_score > self.config.border_irregularity_threshold;

        let (variance, dominant_colors) = self.color_analysis(image, points);
        let color_varied = variance > self.config.color_variance_threshold;

        let diameter_warning = diameter_mm > self.config.diameter_warning_mm;

        AbcdeAnalysis {
            asymmetry: AsymmetryReport {
                detected: asymmetry_detected,
                score: round3(asymmetry_score),
                description: if asymmetry_detected {
                    "Detectada"
                } else {
                    "No detectada"
                },
            },
            border: BorderReport {
                irregular: border_irregular,
                score: round3(border_score),
                description: if border_irregular { "Irregular" } else { "Regular" },
            },
            color: ColorReport {
                varied: color_varied,
                variance: round2(variance),
                dominant_colors,
                description: if color_varied { "Variado" } else { "Uniforme" },
            },
            diameter: DiameterReport {
                value_mm: diameter_mm,
                warning: diameter_warning,
                description: format!("{diameter_mm}mm"),
            },
        }
    }

    /// HSV variance and mean color over the pixels inside the lesion mask.
    fn color_analysis(&self, image: &RgbImage, points: &[Point<i32>]) -> (f64, Vec<String>) {
        let mask = filled_contour_mask(image.dimensions(), points);

        let mut hsv = Vec::new();
        let mut rgb = Vec::new();
        for (x, y, pixel) in image.enumerate_pixels() {
            if mask.get_pixel(x, y)[0] > 0 {
                hsv.push(rgb_to_hsv(pixel.0));
                rgb.push(pixel.0);
            }
        }
        if hsv.is_empty() {
            return (0.0, Vec::new());
        }

        let variance = (0..3)
            .map(|c| variance(hsv.iter().map(|p| p[c])))
            .sum::<f64>()
            / 3.0;

        let mut rng = rand::thread_rng();
        let sample: Vec<&[u8; 3]> = rgb.choose_multiple(&mut rng, COLOR_SAMPLE_CAP).collect();
        let n = sample.len() as f64;
        let mean: Vec<i64> = (0..3)
            .map(|c| (sample.iter().map(|p| p[c] as f64).sum::<f64>() / n) as i64)
            .collect();
        let dominant = format!("rgb({}, {}, {})", mean[0], mean[1], mean[2]);

        (variance, vec![dominant])
    }

    /// Draws annotations onto a copy; the source image is never mutated.
    fn render_overlay(
        &self,
        image: &RgbImage,
        points: &[Point<i32>],
        location: &LesionLocation,
        diameter_mm: f64,
    ) -> RgbImage {
        let mut overlay = image.clone();

        let stroke = (self.config.border_thickness as i32 / 2).max(1);
        for p in points {
            draw_filled_circle_mut(&mut overlay, (p.x, p.y), stroke, CONTOUR_COLOR);
        }

        let rect = Rect::at(location.x, location.y)
            .of_size(location.width as u32, location.height as u32);
        draw_hollow_rect_mut(&mut overlay, rect, BOX_COLOR);

        draw_filled_circle_mut(
            &mut overlay,
            (location.center_x, location.center_y),
            5,
            CENTER_COLOR,
        );

        if let Some(font) = &self.font {
            let label = format!("Lesion: {diameter_mm}mm");
            let y = (location.y - 24).max(0);
            draw_text_mut(
                &mut overlay,
                BOX_COLOR,
                location.x.max(0),
                y,
                PxScale::from(20.0),
                font,
                &label,
            );
        }

        overlay
    }
}

/// 4π·area / perimeter²; 1.0 for a perfect circle, 0 for a degenerate one.
pub fn circularity(area: f64, perimeter: f64) -> f64 {
    if perimeter > 0.0 {
        4.0 * std::f64::consts::PI * area / (perimeter * perimeter)
    } else {
        0.0
    }
}

/// Enclosed polygon area via the shoelace formula.
pub fn contour_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..points.len() {
        let p = points[i];
        let q = points[(i + 1) % points.len()];
        sum += p.x as f64 * q.y as f64 - q.x as f64 * p.y as f64;
    }
    (sum / 2.0).abs()
}

/// Normalized difference of the second-order central moments along the
/// coordinate axes; 0 for symmetric shapes.
pub fn asymmetry(points: &[Point<i32>]) -> f64 {
    let m = polygon_moments(points);
    if m.m00 == 0.0 {
        return 0.0;
    }
    let cx = m.m10 / m.m00;
    let cy = m.m01 / m.m00;
    let mu20 = (m.m20 - cx * m.m10) / m.m00;
    let mu02 = (m.m02 - cy * m.m01) / m.m00;
    (mu20 - mu02).abs() / (mu20 + mu02 + 1e-7)
}

/// Simplified-polygon vertex count plus mean convexity-defect depth, clipped
/// to [0, 1].
pub fn border_irregularity(points: &[Point<i32>], perimeter: f64) -> f64 {
    let epsilon = 0.02 * perimeter;
    let simplified = approximate_polygon_dp(points, epsilon, true);
    let vertex_term = simplified.len() as f64 / 50.0;
    (vertex_term + mean_convexity_defect(points)).min(1.0)
}

#[derive(Debug, Default, Clone, Copy)]
struct PolygonMoments {
    m00: f64,
    m10: f64,
    m01: f64,
    m20: f64,
    m02: f64,
}

/// Raw polygon moments up to second order via Green's theorem. The sign is
/// flipped when the contour winds clockwise so m00 is always the area.
fn polygon_moments(points: &[Point<i32>]) -> PolygonMoments {
    let mut m = PolygonMoments::default();
    if points.len() < 3 {
        return m;
    }
    for i in 0..points.len() {
        let p = points[i];
        let q = points[(i + 1) % points.len()];
        let (x0, y0) = (p.x as f64, p.y as f64);
        let (x1, y1) = (q.x as f64, q.y as f64);
        let cross = x0 * y1 - x1 * y0;
        m.m00 += cross;
        m.m10 += (x0 + x1) * cross;
        m.m01 += (y0 + y1) * cross;
        m.m20 += (x0 * x0 + x0 * x1 + x1 * x1) * cross;
        m.m02 += (y0 * y0 + y0 * y1 + y1 * y1) * cross;
    }
    m.m00 /= 2.0;
    m.m10 /= 6.0;
    m.m01 /= 6.0;
    m.m20 /= 12.0;
    m.m02 /= 12.0;
    if m.m00 < 0.0 {
        m.m00 = -m.m00;
        m.m10 = -m.m10;
        m.m01 = -m.m01;
        m.m20 = -m.m20;
        m.m02 = -m.m02;
    }
    m
}

fn bounding_box(points: &[Point<i32>]) -> (i32, i32, i32, i32) {
    let mut min_x = i32::MAX;
    let mut min_y = i32::MAX;
    let mut max_x = i32::MIN;
    let mut max_y = i32::MIN;
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    (min_x, min_y, max_x, max_y)
}

/// Mean of the per-hull-edge maximum depths of the contour below its convex
/// hull, in pixels.
fn mean_convexity_defect(points: &[Point<i32>]) -> f64 {
    let hull = convex_hull(points);
    if hull.len() < 3 {
        return 0.0;
    }
    let mut max_depth = vec![0.0f64; hull.len()];
    for p in points {
        let mut nearest_edge = 0;
        let mut nearest = f64::MAX;
        for i in 0..hull.len() {
            let a = hull[i];
            let b = hull[(i + 1) % hull.len()];
            let d = point_segment_distance(*p, a, b);
            if d < nearest {
                nearest = d;
                nearest_edge = i;
            }
        }
        if nearest > max_depth[nearest_edge] {
            max_depth[nearest_edge] = nearest;
        }
    }
    max_depth.iter().sum::<f64>() / max_depth.len() as f64
}

fn point_segment_distance(p: Point<i32>, a: Point<i32>, b: Point<i32>) -> f64 {
    let (px, py) = (p.x as f64, p.y as f64);
    let (ax, ay) = (a.x as f64, a.y as f64);
    let (bx, by) = (b.x as f64, b.y as f64);
    let (dx, dy) = (bx - ax, by - ay);
    let len_sq = dx * dx + dy * dy;
    let t = if len_sq == 0.0 {
        0.0
    } else {
        (((px - ax) * dx + (py - ay) * dy) / len_sq).clamp(0.0, 1.0)
    };
    let (cx, cy) = (ax + t * dx, ay + t * dy);
    ((px - cx).powi(2) + (py - cy).powi(2)).sqrt()
}

/// Inverted adaptive mean threshold: white where a pixel is darker than its
/// (2r+1)x(2r+1) neighborhood mean by more than `offset`. A uniform image
/// therefore produces an empty mask.
fn adaptive_threshold_inv(image: &GrayImage, block_radius: u32, offset: f64) -> GrayImage {
    let (w, h) = image.dimensions();
    let stride = (w + 1) as usize;

    let mut integral = vec![0u64; stride * (h + 1) as usize];
    for y in 0..h {
        let mut row = 0u64;
        for x in 0..w {
            row += image.get_pixel(x, y)[0] as u64;
            integral[(y as usize + 1) * stride + x as usize + 1] =
                integral[y as usize * stride + x as usize + 1] + row;
        }
    }
    let sum_rect = |x0: u32, y0: u32, x1: u32, y1: u32| -> u64 {
        let (x0, y0) = (x0 as usize, y0 as usize);
        let (x1, y1) = (x1 as usize + 1, y1 as usize + 1);
        integral[y1 * stride + x1] + integral[y0 * stride + x0]
            - integral[y0 * stride + x1]
            - integral[y1 * stride + x0]
    };

    let mut out = GrayImage::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let x0 = x.saturating_sub(block_radius);
            let y0 = y.saturating_sub(block_radius);
            let x1 = (x + block_radius).min(w - 1);
            let y1 = (y + block_radius).min(h - 1);
            let count = ((x1 - x0 + 1) * (y1 - y0 + 1)) as f64;
            let mean = sum_rect(x0, y0, x1, y1) as f64 / count;
            if (image.get_pixel(x, y)[0] as f64) < mean - offset {
                out.put_pixel(x, y, Luma([255]));
            }
        }
    }
    out
}

fn filled_contour_mask((w, h): (u32, u32), points: &[Point<i32>]) -> GrayImage {
    let mut mask = GrayImage::new(w, h);
    let mut polygon = points.to_vec();
    if polygon.len() > 1 && polygon.first() == polygon.last() {
        polygon.pop();
    }
    if polygon.len() >= 3 {
        draw_polygon_mut(&mut mask, &polygon, Luma([255]));
    }
    mask
}

/// OpenCV-scaled HSV: H in [0, 179], S and V in [0, 255].
fn rgb_to_hsv(rgb: [u8; 3]) -> [f64; 3] {
    let r = rgb[0] as f64 / 255.0;
    let g = rgb[1] as f64 / 255.0;
    let b = rgb[2] as f64 / 255.0;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let h = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (((g - b) / delta).rem_euclid(6.0))
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };
    let s = if max > 0.0 { delta / max } else { 0.0 };

    [h / 2.0, s * 255.0, max * 255.0]
}

fn variance(values: impl Iterator<Item = f64>) -> f64 {
    let values: Vec<f64> = values.collect();
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n
}

#[cfg(test)]
mod tests {
    use super::*;

    fn circle_points(radius: f64, steps: usize) -> Vec<Point<i32>> {
        (0..steps)
            .map(|i| {
                let theta = 2.0 * std::f64::consts::PI * i as f64 / steps as f64;
                Point::new(
                    (200.0 + radius * theta.cos()).round() as i32,
                    (200.0 + radius * theta.sin()).round() as i32,
                )
            })
            .collect()
    }

    fn rectangle_points(w: i32, h: i32) -> Vec<Point<i32>> {
        vec![
            Point::new(0, 0),
            Point::new(w, 0),
            Point::new(w, h),
            Point::new(0, h),
        ]
    }

    fn analyzer() -> LesionAnalyzer {
        LesionAnalyzer::new(
            LesionConfig {
                min_area: 100.0,
                pixel_to_mm_ratio: 0.1,
                border_thickness: 3,
                asymmetry_threshold: 0.15,
                border_irregularity_threshold: 0.25,
                color_variance_threshold: 30.0,
                diameter_warning_mm: 6.0,
            },
            None,
        )
    }

    /// Dark textured disc on light skin-toned background.
    fn lesion_image() -> RgbImage {
        let mut img = RgbImage::from_pixel(200, 200, Rgb([220, 205, 195]));
        for y in 0..200i32 {
            for x in 0..200i32 {
                let (dx, dy) = (x - 100, y - 100);
                if dx * dx + dy * dy <= 60 * 60 {
                    let n = ((x * 7 + y * 13) % 30) as u8;
                    img.put_pixel(x as u32, y as u32, Rgb([40 + n, 30 + n, 28 + n]));
                }
            }
        }
        img
    }

    #[test]
    fn circularity_of_circle_is_near_one() {
        // Coarse sampling keeps chord lengths large relative to the integer
        // rounding of the vertices.
        let points = circle_points(100.0, 72);
        let c = circularity(contour_area(&points), arc_length(&points, true));
        assert!((c - 1.0).abs() < 0.02, "circularity {c}");
    }

    #[test]
    fn circularity_decreases_with_perimeter_at_fixed_area() {
        let area = 5000.0;
        let c1 = circularity(area, 260.0);
        let c2 = circularity(area, 300.0);
        let c3 = circularity(area, 400.0);
        assert!(c1 > c2 && c2 > c3);
    }

    #[test]
    fn circularity_of_degenerate_perimeter_is_zero() {
        assert_eq!(circularity(100.0, 0.0), 0.0);
    }

    #[test]
    fn asymmetry_low_for_circle_high_for_elongated_shape() {
        let circle = asymmetry(&circle_points(80.0, 720));
        assert!(circle < 0.05, "circle asymmetry {circle}");

        // For an a x b rectangle the score approaches (a^2-b^2)/(a^2+b^2).
        let rect = asymmetry(&rectangle_points(100, 20));
        assert!((rect - 9600.0 / 10400.0).abs() < 0.01, "rect asymmetry {rect}");
        assert!(rect > 0.15);
    }

    #[test]
    fn blank_image_reports_no_lesion() {
        let image = RgbImage::from_pixel(160, 120, Rgb([210, 200, 190]));
        let report = analyzer().analyze(&image);
        assert!(!report.detected);
        assert!(report.location.is_none());
        assert!(report.metrics.is_none());
        assert!(report.abcde.is_none());
        assert_eq!(report.overlay.dimensions(), (160, 120));
    }

    #[test]
    fn synthetic_lesion_is_detected_and_measured() {
        let image = lesion_image();
        let report = analyzer().analyze(&image);
        assert!(report.detected);

        let location = report.location.unwrap();
        assert!((location.center_x - 100).abs() <= 6, "center_x {}", location.center_x);
        assert!((location.center_y - 100).abs() <= 6, "center_y {}", location.center_y);

        let metrics = report.metrics.unwrap();
        assert!(metrics.area_pixels > 8000, "area {}", metrics.area_pixels);
        assert!(
            metrics.circularity > 0.5 && metrics.circularity < 1.3,
            "circularity {}",
            metrics.circularity
        );
        // Bounding box around a r=60 disc has a ~17mm diagonal at 0.1 mm/px.
        assert!(
            metrics.diameter_mm > 13.0 && metrics.diameter_mm < 21.0,
            "diameter {}",
            metrics.diameter_mm
        );

        let abcde = report.abcde.unwrap();
        assert!(abcde.diameter.warning);
        assert_eq!(abcde.color.dominant_colors.len(), 1);
        assert!(abcde.color.dominant_colors[0].starts_with("rgb("));
        assert!(abcde.asymmetry.score < 0.15, "asymmetry {}", abcde.asymmetry.score);
    }

    #[test]
    fn overlay_preserves_input_dimensions() {
        let image = lesion_image();
        let report = analyzer().analyze(&image);
        assert_eq!(report.overlay.dimensions(), image.dimensions());
    }

    #[test]
    fn adaptive_threshold_empty_on_uniform_input() {
        let gray = GrayImage::from_pixel(64, 64, Luma([140]));
        let mask = adaptive_threshold_inv(&gray, BLOCK_RADIUS, THRESHOLD_OFFSET);
        assert!(mask.pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn hsv_conversion_matches_opencv_scale() {
        let red = rgb_to_hsv([255, 0, 0]);
        assert!((red[0] - 0.0).abs() < 1e-9);
        assert!((red[1] - 255.0).abs() < 1e-9);
        assert!((red[2] - 255.0).abs() < 1e-9);

        let green = rgb_to_hsv([0, 255, 0]);
        assert!((green[0] - 60.0).abs() < 1e-9);

        let gray = rgb_to_hsv([128, 128, 128]);
        assert_eq!(gray[0], 0.0);
        assert_eq!(gray[1], 0.0);
    }

    #[test]
    fn border_irregularity_is_clipped() {
        let jagged: Vec<Point<i32>> = (0..200)
            .map(|i| {
                let r = if i % 2 == 0 { 100.0 } else { 60.0 };
                let theta = 2.0 * std::f64::consts::PI * i as f64 / 200.0;
                Point::new(
                    (300.0 + r * theta.cos()).round() as i32,
                    (300.0 + r * theta.sin()).round() as i32,
                )
            })
            .collect();
        let perimeter = arc_length(&jagged, true);
        let score = border_irregularity(&jagged, perimeter);
        assert!(score <= 1.0);
        assert!(score > 0.25, "jagged score {score}");

        let smooth = circle_points(100.0, 720);
        let smooth_score = border_irregularity(&smooth, arc_length(&smooth, true));
        assert!(smooth_score < score);
    }
}
