//! Split preview: the first processed image of each split, side by side.

use std::path::Path;

use image::{imageops::FilterType, ImageBuffer, Rgb, RgbImage};
use tracing::info;

use super::pipeline::{ProcessedBatch, ProcessedDataset};
use crate::utils::error::{BrainError, Result};

/// Gap between tiles, in pixels
const TILE_GAP: u32 = 4;

/// Convert the `index`-th image of a batch back to 8-bit RGB
pub fn batch_image_to_rgb(batch: &ProcessedBatch, index: usize) -> Option<RgbImage> {
    let [_, h, w, _] = batch.shape;
    let data = batch.image(index)?;

    Some(ImageBuffer::from_fn(w as u32, h as u32, |x, y| {
        let offset = (y as usize * w + x as usize) * 3;
        let to_u8 = |v: f32| (v * 255.0).round().clamp(0.0, 255.0) as u8;
        Rgb([to_u8(data[offset]), to_u8(data[offset + 1]), to_u8(data[offset + 2])])
    }))
}

/// Place one `tile x tile` image per split in the given order.
///
/// A split with no images gets a plain grey tile.
pub fn render_preview(splits: &[(&str, &ProcessedDataset)], tile: u32) -> Result<RgbImage> {
    if splits.is_empty() || tile == 0 {
        return Err(BrainError::InvalidInput("Nothing to preview".to_string()));
    }

    let width = splits.len() as u32 * tile + (splits.len() as u32 - 1) * TILE_GAP;
    let mut canvas = RgbImage::from_pixel(width, tile, Rgb([255, 255, 255]));

    for (i, (name, dataset)) in splits.iter().enumerate() {
        let first = match dataset.batches().next() {
            Some(batch) => batch_image_to_rgb(&batch?, 0),
            None => None,
        };

        let tile_img = match first {
            Some(img) => image::imageops::resize(&img, tile, tile, FilterType::Triangle),
            None => {
                info!("{}: no images to preview", name);
                RgbImage::from_pixel(tile, tile, Rgb([128, 128, 128]))
            }
        };

        image::imageops::replace(&mut canvas, &tile_img, (i as u32 * (tile + TILE_GAP)) as i64, 0);
    }

    Ok(canvas)
}

/// Render the preview and write it as an image file
pub fn save_preview(path: impl AsRef<Path>, splits: &[(&str, &ProcessedDataset)], tile: u32) -> Result<()> {
    let path = path.as_ref();
    let canvas = render_preview(splits, tile)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    canvas
        .save(path)
        .map_err(|e| BrainError::ImageLoad(path.to_path_buf(), e.to_string()))?;

    info!("Saved preview of {} splits to {:?}", splits.len(), path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::loader::{DirectoryDataset, LoaderConfig};
    use crate::dataset::pipeline::{Pipeline, PipelineMode};
    use std::fs;
    use tempfile::TempDir;

    fn plain_dataset(root: &Path, value: u8, count: usize) -> ProcessedDataset {
        let dir = root.join("yes");
        fs::create_dir_all(&dir).unwrap();
        for i in 0..count {
            RgbImage::from_pixel(12, 12, Rgb([value; 3]))
                .save(dir.join(format!("{}.png", i)))
                .unwrap();
        }

        let config = LoaderConfig {
            image_size: (8, 8),
            ..LoaderConfig::default()
        };
        Pipeline::new(PipelineMode::Plain, &config).process(DirectoryDataset::open(root, &config).unwrap())
    }

    #[test]
    fn test_preview_places_tiles_in_order() {
        let temp_dir = TempDir::new().unwrap();
        let train = plain_dataset(&temp_dir.path().join("train"), 255, 2);
        let test = plain_dataset(&temp_dir.path().join("test"), 0, 1);

        let canvas = render_preview(&[("TRAIN", &train), ("TEST", &test)], 16).unwrap();

        assert_eq!(canvas.dimensions(), (16 * 2 + TILE_GAP, 16));
        assert_eq!(canvas.get_pixel(8, 8).0, [255, 255, 255]);
        assert_eq!(canvas.get_pixel(16 + TILE_GAP + 8, 8).0, [0, 0, 0]);
    }

    #[test]
    fn test_empty_split_gets_grey_tile() {
        let temp_dir = TempDir::new().unwrap();
        let empty = plain_dataset(&temp_dir.path().join("valid"), 0, 0);

        let canvas = render_preview(&[("VALID", &empty)], 8).unwrap();
        assert_eq!(canvas.get_pixel(4, 4).0, [128, 128, 128]);
    }

    #[test]
    fn test_save_preview_writes_png() {
        let temp_dir = TempDir::new().unwrap();
        let train = plain_dataset(&temp_dir.path().join("train"), 90, 1);
        let out = temp_dir.path().join("out/preview.png");

        save_preview(&out, &[("TRAIN", &train)], 8).unwrap();
        assert!(out.exists());
    }

    #[test]
    fn test_render_requires_splits() {
        assert!(render_preview(&[], 8).is_err());
    }
}
