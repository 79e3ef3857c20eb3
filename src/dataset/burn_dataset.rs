//! Burn Dataset Integration
//!
//! Implements Burn's `Dataset` trait and `Batcher` over a `DirectoryDataset`
//! so organized splits can feed a Burn `DataLoader` for evaluation. Images
//! are kept in the same NHWC layout the models consume.

use burn::data::dataloader::batcher::Batcher;
use burn::data::dataset::Dataset;
use burn::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::loader::DirectoryDataset;
use super::pipeline::rescale;

/// A single scan ready for Burn
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScanItem {
    /// Image data, flattened HWC `[H * W * 3]`
    pub image: Vec<f32>,
    /// Class label
    pub label: usize,
    /// Image path (for debugging/logging)
    pub path: String,
}

/// Lazily decoded dataset implementing Burn's `Dataset` trait
#[derive(Debug, Clone)]
pub struct ScanDataset {
    source: DirectoryDataset,
    /// Pixel values in [0, 1] instead of [0, 255]
    rescale: bool,
}

impl ScanDataset {
    pub fn new(source: DirectoryDataset) -> Self {
        Self { source, rescale: true }
    }

    pub fn with_rescale(mut self, rescale: bool) -> Self {
        self.rescale = rescale;
        self
    }

    pub fn num_classes(&self) -> usize {
        self.source.num_classes()
    }

    /// (height, width) of every item
    pub fn image_size(&self) -> (usize, usize) {
        self.source.config.image_size
    }
}

impl Dataset<ScanItem> for ScanDataset {
    fn get(&self, index: usize) -> Option<ScanItem> {
        let sample = self.source.samples.get(index)?;
        match self.source.load_image(sample) {
            Ok(img) => Some(ScanItem {
                image: if self.rescale {
                    rescale(&img).into_raw()
                } else {
                    img.into_raw().into_iter().map(f32::from).collect()
                },
                label: sample.label,
                path: sample.path.to_string_lossy().to_string(),
            }),
            Err(e) => {
                warn!("Skipping unreadable sample: {}", e);
                None
            }
        }
    }

    fn len(&self) -> usize {
        self.source.len()
    }
}

/// A batch of scans
#[derive(Clone, Debug)]
pub struct ScanBatch<B: Backend> {
    /// Images with shape [batch_size, height, width, 3]
    pub images: Tensor<B, 4>,
    /// Labels with shape [batch_size]
    pub targets: Tensor<B, 1, Int>,
}

/// Batcher for stacking `ScanItem`s into tensors
#[derive(Clone, Debug)]
pub struct ScanBatcher {
    height: usize,
    width: usize,
}

impl ScanBatcher {
    pub fn new(image_size: (usize, usize)) -> Self {
        Self {
            height: image_size.0,
            width: image_size.1,
        }
    }
}

impl<B: Backend> Batcher<B, ScanItem, ScanBatch<B>> for ScanBatcher {
    fn batch(&self, items: Vec<ScanItem>, device: &B::Device) -> ScanBatch<B> {
        let batch_size = items.len();
        let images_data: Vec<f32> = items.iter().flat_map(|item| item.image.iter().copied()).collect();

        let images = Tensor::<B, 4>::from_floats(
            TensorData::new(images_data, [batch_size, self.height, self.width, 3]),
            device,
        );

        let targets_data: Vec<i64> = items.iter().map(|item| item.label as i64).collect();
        let targets = Tensor::<B, 1, Int>::from_data(TensorData::new(targets_data, [batch_size]), device);

        ScanBatch { images, targets }
    }
}
