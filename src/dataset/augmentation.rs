//! Data Augmentation Module for Brain Scan Classification
//!
//! Random geometric augmentations applied to rescaled training images:
//! horizontal and vertical flips, rotation, and per-axis zoom. Pixels that
//! would be sampled from outside the image are filled by reflecting the image
//! across its edge.
//!
//! # Augmentation Strategy
//!
//! - **Training**: Random flip, rotation and zoom
//! - **Validation/Test**: No augmentations (clean evaluation)
//! - **Inference**: No augmentations

use std::f32::consts::PI;

use image::{ImageBuffer, Rgb, Rgb32FImage};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Configuration for data augmentation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AugmentationConfig {
    /// Flip left-right with probability 0.5
    pub flip_horizontal: bool,
    /// Flip top-bottom with probability 0.5
    pub flip_vertical: bool,
    /// Rotation range as a fraction of a full turn (angle in ±factor * 2π)
    pub rotation_factor: f32,
    /// Vertical zoom range (scale in 1 ± factor)
    pub zoom_height_factor: f32,
    /// Horizontal zoom range (scale in 1 ± factor)
    pub zoom_width_factor: f32,
}

impl Default for AugmentationConfig {
    fn default() -> Self {
        Self {
            flip_horizontal: true,
            flip_vertical: true,
            rotation_factor: 0.2,
            zoom_height_factor: 0.5,
            zoom_width_factor: 0.2,
        }
    }
}

impl AugmentationConfig {
    /// Disable all augmentations
    pub fn none() -> Self {
        Self {
            flip_horizontal: false,
            flip_vertical: false,
            rotation_factor: 0.0,
            zoom_height_factor: 0.0,
            zoom_width_factor: 0.0,
        }
    }
}

/// Image augmenter that applies random transformations
#[derive(Clone, Debug)]
pub struct Augmenter {
    config: AugmentationConfig,
}

impl Augmenter {
    pub fn new(config: AugmentationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AugmentationConfig {
        &self.config
    }

    /// Apply the configured augmentations to an image in [0, 1].
    ///
    /// The output has the same dimensions as the input.
    pub fn augment(&self, img: &Rgb32FImage, rng: &mut ChaCha8Rng) -> Rgb32FImage {
        let mut result = img.clone();

        if self.config.flip_horizontal && rng.gen::<f32>() < 0.5 {
            image::imageops::flip_horizontal_in_place(&mut result);
        }
        if self.config.flip_vertical && rng.gen::<f32>() < 0.5 {
            image::imageops::flip_vertical_in_place(&mut result);
        }

        let angle = sample_symmetric(rng, self.config.rotation_factor) * 2.0 * PI;
        let zoom_y = 1.0 + sample_symmetric(rng, self.config.zoom_height_factor);
        let zoom_x = 1.0 + sample_symmetric(rng, self.config.zoom_width_factor);

        if angle != 0.0 {
            result = rotate(&result, angle);
        }
        if zoom_x != 1.0 || zoom_y != 1.0 {
            result = zoom(&result, zoom_x, zoom_y);
        }

        result
    }
}

/// Uniform in [-factor, factor], zero without drawing when the factor is zero
fn sample_symmetric(rng: &mut ChaCha8Rng, factor: f32) -> f32 {
    if factor > 0.0 {
        rng.gen_range(-factor..=factor)
    } else {
        0.0
    }
}

/// Rotate around the image center by `angle` radians
fn rotate(img: &Rgb32FImage, angle: f32) -> Rgb32FImage {
    let (cos_a, sin_a) = (angle.cos(), angle.sin());
    transform(img, |dx, dy| (dx * cos_a + dy * sin_a, -dx * sin_a + dy * cos_a))
}

/// Scale sampling coordinates around the center; factors above 1 zoom out
fn zoom(img: &Rgb32FImage, zoom_x: f32, zoom_y: f32) -> Rgb32FImage {
    transform(img, |dx, dy| (dx * zoom_x, dy * zoom_y))
}

/// Inverse-map every output pixel through `map` (offsets from the center)
fn transform<F>(img: &Rgb32FImage, map: F) -> Rgb32FImage
where
    F: Fn(f32, f32) -> (f32, f32),
{
    let (width, height) = img.dimensions();
    let cx = width as f32 / 2.0;
    let cy = height as f32 / 2.0;

    ImageBuffer::from_fn(width, height, |x, y| {
        let (sx, sy) = map(x as f32 + 0.5 - cx, y as f32 + 0.5 - cy);
        bilinear_sample(img, sx + cx - 0.5, sy + cy - 0.5)
    })
}

/// Reflect an integer coordinate into `[0, size)`: `d c b a | a b c d | d c b a`
fn reflect(i: i64, size: u32) -> u32 {
    let size = size as i64;
    let period = 2 * size;
    let m = i.rem_euclid(period);
    (if m >= size { period - 1 - m } else { m }) as u32
}

/// Sample a pixel using bilinear interpolation with reflect padding
fn bilinear_sample(img: &Rgb32FImage, x: f32, y: f32) -> Rgb<f32> {
    let (width, height) = img.dimensions();

    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;

    let (x0, y0) = (x0 as i64, y0 as i64);
    let xs = [reflect(x0, width), reflect(x0 + 1, width)];
    let ys = [reflect(y0, height), reflect(y0 + 1, height)];

    let p00 = img.get_pixel(xs[0], ys[0]);
    let p10 = img.get_pixel(xs[1], ys[0]);
    let p01 = img.get_pixel(xs[0], ys[1]);
    let p11 = img.get_pixel(xs[1], ys[1]);

    let mut result = [0.0f32; 3];
    for c in 0..3 {
        result[c] = p00[c] * (1.0 - fx) * (1.0 - fy)
            + p10[c] * fx * (1.0 - fy)
            + p01[c] * (1.0 - fx) * fy
            + p11[c] * fx * fy;
    }

    Rgb(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn create_test_image(width: u32, height: u32) -> Rgb32FImage {
        ImageBuffer::from_fn(width, height, |x, y| {
            Rgb([x as f32 / width as f32, y as f32 / height as f32, 0.5])
        })
    }

    #[test]
    fn test_default_config() {
        let config = AugmentationConfig::default();
        assert!(config.flip_horizontal && config.flip_vertical);
        assert_eq!(config.rotation_factor, 0.2);
        assert_eq!(config.zoom_height_factor, 0.5);
        assert_eq!(config.zoom_width_factor, 0.2);
    }

    #[test]
    fn test_augment_keeps_dimensions() {
        let aug = Augmenter::new(AugmentationConfig::default());
        let img = create_test_image(48, 32);
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        for _ in 0..5 {
            let result = aug.augment(&img, &mut rng);
            assert_eq!(result.dimensions(), (48, 32));
        }
    }

    #[test]
    fn test_values_stay_in_unit_range() {
        let aug = Augmenter::new(AugmentationConfig::default());
        let img = create_test_image(32, 32);
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        let result = aug.augment(&img, &mut rng);
        assert!(result.pixels().flat_map(|p| p.0).all(|v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn test_no_augmentation_is_identity() {
        let aug = Augmenter::new(AugmentationConfig::none());
        let img = create_test_image(16, 16);
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        assert_eq!(aug.augment(&img, &mut rng), img);
    }

    #[test]
    fn test_same_seed_same_result() {
        let aug = Augmenter::new(AugmentationConfig::default());
        let img = create_test_image(24, 24);

        let a = aug.augment(&img, &mut ChaCha8Rng::seed_from_u64(3));
        let b = aug.augment(&img, &mut ChaCha8Rng::seed_from_u64(3));
        assert_eq!(a, b);
    }

    #[test]
    fn test_reflect() {
        assert_eq!(reflect(-1, 4), 0);
        assert_eq!(reflect(-2, 4), 1);
        assert_eq!(reflect(4, 4), 3);
        assert_eq!(reflect(5, 4), 2);
        assert_eq!(reflect(2, 4), 2);
    }

    #[test]
    fn test_unit_zoom_is_identity() {
        let img = create_test_image(8, 8);
        let result = zoom(&img, 1.0, 1.0);
        for (a, b) in img.pixels().zip(result.pixels()) {
            for c in 0..3 {
                assert!((a[c] - b[c]).abs() < 1e-5);
            }
        }
    }
}
