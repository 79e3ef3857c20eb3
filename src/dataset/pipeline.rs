//! Preprocessing Pipeline
//!
//! Turns a `DirectoryDataset` into batches of rescaled NHWC float data.
//!
//! - **Plain**: resize, rescale to [0, 1]
//! - **Augment**: resize, rescale, then random flip/rotation/zoom
//!
//! The first pass over a `ProcessedDataset` runs on a producer thread that
//! stays `prefetch` batches ahead of the consumer, decoding each batch in
//! parallel on the rayon pool. Once a pass completes without error the
//! batches are kept in memory and every later pass replays them,
//! augmentations included.

use std::sync::mpsc::{self, Receiver, SyncSender};
use std::sync::{Arc, OnceLock};
use std::thread::{self, JoinHandle};

use image::{imageops::FilterType, ImageBuffer, Rgb, Rgb32FImage, RgbImage};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::augmentation::{AugmentationConfig, Augmenter};
use super::loader::{DirectoryDataset, LoaderConfig};
use crate::utils::error::Result;

/// Which transformations a pipeline applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineMode {
    /// Resize and rescale only
    Plain,
    /// Resize, rescale and random augmentation
    Augment,
}

/// Preprocessing settings for one split
#[derive(Debug, Clone)]
pub struct Pipeline {
    pub height: u32,
    pub width: u32,
    pub mode: PipelineMode,
    pub batch_size: usize,
    pub prefetch: usize,
    /// Seed for the augmentation RNG
    pub seed: u64,
    pub augmentation: AugmentationConfig,
}

impl Pipeline {
    pub fn new(mode: PipelineMode, config: &LoaderConfig) -> Self {
        let (height, width) = config.image_size;
        Self {
            height: height as u32,
            width: width as u32,
            mode,
            batch_size: config.batch_size.max(1),
            prefetch: config.prefetch.max(1),
            seed: config.seed,
            augmentation: AugmentationConfig::default(),
        }
    }

    pub fn with_augmentation(mut self, augmentation: AugmentationConfig) -> Self {
        self.augmentation = augmentation;
        self
    }

    /// Resize and rescale; independent per image
    pub fn prepare_image(&self, img: &RgbImage) -> Rgb32FImage {
        rescale(&resize(img, self.height, self.width))
    }

    /// Random augmentation in `Augment` mode; draws from `rng` in sample order
    pub fn finish_image(&self, scaled: Rgb32FImage, augmenter: &Augmenter, rng: &mut ChaCha8Rng) -> Rgb32FImage {
        match self.mode {
            PipelineMode::Plain => scaled,
            PipelineMode::Augment => augmenter.augment(&scaled, rng),
        }
    }

    /// Wrap a dataset; nothing is decoded until the first pass
    pub fn process(self, dataset: DirectoryDataset) -> ProcessedDataset {
        ProcessedDataset {
            source: Arc::new(dataset),
            pipeline: self,
            cache: Arc::new(OnceLock::new()),
        }
    }
}

/// Resize exactly to `height x width`; an image already that size is returned unchanged
pub fn resize(img: &RgbImage, height: u32, width: u32) -> RgbImage {
    if img.dimensions() == (width, height) {
        return img.clone();
    }
    image::imageops::resize(img, width, height, FilterType::Triangle)
}

/// Map each channel from [0, 255] to [0, 1]
pub fn rescale(img: &RgbImage) -> Rgb32FImage {
    let (width, height) = img.dimensions();
    ImageBuffer::from_fn(width, height, |x, y| {
        let p = img.get_pixel(x, y);
        Rgb([p[0] as f32 / 255.0, p[1] as f32 / 255.0, p[2] as f32 / 255.0])
    })
}

/// A batch of processed images
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedBatch {
    /// Pixel data in NHWC order
    pub images: Vec<f32>,
    /// [batch, height, width, channels]
    pub shape: [usize; 4],
    pub labels: Vec<usize>,
}

impl ProcessedBatch {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// HWC data of the `index`-th image
    pub fn image(&self, index: usize) -> Option<&[f32]> {
        let [_, h, w, c] = self.shape;
        let size = h * w * c;
        self.images.get(index * size..(index + 1) * size)
    }
}

/// A dataset bound to its preprocessing pipeline, cached after the first full pass
#[derive(Clone)]
pub struct ProcessedDataset {
    source: Arc<DirectoryDataset>,
    pipeline: Pipeline,
    cache: Arc<OnceLock<Vec<ProcessedBatch>>>,
}

impl ProcessedDataset {
    pub fn len(&self) -> usize {
        self.source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    pub fn num_batches(&self) -> usize {
        self.len().div_ceil(self.pipeline.batch_size)
    }

    pub fn class_names(&self) -> &[String] {
        &self.source.class_names
    }

    pub fn source(&self) -> &DirectoryDataset {
        &self.source
    }

    pub fn mode(&self) -> PipelineMode {
        self.pipeline.mode
    }

    pub fn is_cached(&self) -> bool {
        self.cache.get().is_some()
    }

    /// Iterate over the batches of one pass
    pub fn batches(&self) -> BatchIter {
        if let Some(cached) = self.cache.get() {
            debug!("Replaying {} cached batches", cached.len());
            return BatchIter {
                state: IterState::Cached {
                    cache: Arc::clone(&self.cache),
                    index: 0,
                },
            };
        }

        let (tx, rx) = mpsc::sync_channel(self.pipeline.prefetch);
        let source = Arc::clone(&self.source);
        let pipeline = self.pipeline.clone();
        let handle = thread::spawn(move || produce(&source, &pipeline, tx));

        BatchIter {
            state: IterState::Streaming {
                rx,
                handle: Some(handle),
                collected: Vec::new(),
                failed: false,
                cache: Arc::clone(&self.cache),
            },
        }
    }
}

/// Decode and process every batch in order, stopping at the first error
fn produce(source: &DirectoryDataset, pipeline: &Pipeline, tx: SyncSender<Result<ProcessedBatch>>) {
    let augmenter = Augmenter::new(pipeline.augmentation.clone());
    let mut rng = ChaCha8Rng::seed_from_u64(pipeline.seed);
    let (h, w) = (pipeline.height as usize, pipeline.width as usize);

    for chunk in source.samples.chunks(pipeline.batch_size) {
        // Parallel decoding with rayon; augmentation stays sequential so the
        // RNG stream does not depend on thread scheduling
        let decoded: Result<Vec<Rgb32FImage>> = chunk
            .par_iter()
            .map(|sample| source.load_image(sample).map(|img| pipeline.prepare_image(&img)))
            .collect();
        let decoded = match decoded {
            Ok(decoded) => decoded,
            Err(e) => {
                let _ = tx.send(Err(e));
                return;
            }
        };

        let mut images = Vec::with_capacity(chunk.len() * h * w * 3);
        let mut labels = Vec::with_capacity(chunk.len());
        for (sample, scaled) in chunk.iter().zip(decoded) {
            images.extend(pipeline.finish_image(scaled, &augmenter, &mut rng).into_raw());
            labels.push(sample.label);
        }

        let batch = ProcessedBatch {
            images,
            shape: [labels.len(), h, w, 3],
            labels,
        };
        if tx.send(Ok(batch)).is_err() {
            // Consumer dropped the iterator
            return;
        }
    }
}

enum IterState {
    Cached {
        cache: Arc<OnceLock<Vec<ProcessedBatch>>>,
        index: usize,
    },
    Streaming {
        rx: Receiver<Result<ProcessedBatch>>,
        handle: Option<JoinHandle<()>>,
        collected: Vec<ProcessedBatch>,
        failed: bool,
        cache: Arc<OnceLock<Vec<ProcessedBatch>>>,
    },
}

/// Iterator over one pass of a `ProcessedDataset`
pub struct BatchIter {
    state: IterState,
}

impl Iterator for BatchIter {
    type Item = Result<ProcessedBatch>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.state {
            IterState::Cached { cache, index } => {
                let batch = cache.get()?.get(*index)?.clone();
                *index += 1;
                Some(Ok(batch))
            }
            IterState::Streaming {
                rx,
                handle,
                collected,
                failed,
                cache,
            } => match rx.recv() {
                Ok(Ok(batch)) => {
                    collected.push(batch.clone());
                    Some(Ok(batch))
                }
                Ok(Err(e)) => {
                    *failed = true;
                    Some(Err(e))
                }
                Err(_) => {
                    // Producer finished
                    if let Some(handle) = handle.take() {
                        if handle.join().is_err() {
                            warn!("Preprocessing thread panicked");
                            *failed = true;
                        }
                    }
                    if !*failed && cache.get().is_none() {
                        let batches = std::mem::take(collected);
                        info!("Cached {} preprocessed batches", batches.len());
                        let _ = cache.set(batches);
                    }
                    None
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::BrainError;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_image(path: &Path, size: u32, value: u8) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        RgbImage::from_pixel(size, size, Rgb([value, value, value])).save(path).unwrap();
    }

    fn small_config(batch_size: usize) -> LoaderConfig {
        LoaderConfig {
            image_size: (8, 8),
            batch_size,
            ..LoaderConfig::default()
        }
    }

    #[test]
    fn test_rescale_endpoints() {
        let mut img = RgbImage::new(2, 1);
        img.put_pixel(0, 0, Rgb([0, 0, 0]));
        img.put_pixel(1, 0, Rgb([255, 255, 255]));

        let scaled = rescale(&img);
        assert_eq!(scaled.get_pixel(0, 0).0, [0.0, 0.0, 0.0]);
        assert_eq!(scaled.get_pixel(1, 0).0, [1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_resize_is_idempotent_on_dimensions() {
        let img = RgbImage::from_pixel(30, 20, Rgb([10, 20, 30]));
        let once = resize(&img, 16, 12);
        let twice = resize(&once, 16, 12);

        assert_eq!(once.dimensions(), (12, 16));
        assert_eq!(twice, once);
    }

    #[test]
    fn test_plain_pass_shapes_and_values() {
        let temp_dir = TempDir::new().unwrap();
        for i in 0..5 {
            write_image(&temp_dir.path().join(format!("no/{}.png", i)), 12, 255);
        }

        let config = small_config(2);
        let dataset = DirectoryDataset::open(temp_dir.path(), &config).unwrap();
        let processed = Pipeline::new(PipelineMode::Plain, &config).process(dataset);

        let batches: Vec<_> = processed.batches().collect::<Result<_>>().unwrap();
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0].shape, [2, 8, 8, 3]);
        assert_eq!(batches[2].shape, [1, 8, 8, 3]);
        assert!(batches[0].images.iter().all(|&v| (v - 1.0).abs() < 1e-6));
        assert_eq!(processed.num_batches(), 3);
    }

    #[test]
    fn test_second_pass_replays_cache() {
        let temp_dir = TempDir::new().unwrap();
        for i in 0..4 {
            write_image(&temp_dir.path().join(format!("yes/{}.png", i)), 10, 100);
        }

        let config = small_config(3);
        let dataset = DirectoryDataset::open(temp_dir.path(), &config).unwrap();
        let processed = Pipeline::new(PipelineMode::Augment, &config).process(dataset);

        assert!(!processed.is_cached());
        let first: Vec<_> = processed.batches().collect::<Result<_>>().unwrap();
        assert!(processed.is_cached());

        // Remove the files: a replay must not touch the disk
        fs::remove_dir_all(temp_dir.path().join("yes")).unwrap();
        let second: Vec<_> = processed.batches().collect::<Result<_>>().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_parallel_decode_keeps_sample_order() {
        let temp_dir = TempDir::new().unwrap();
        for i in 0..6u8 {
            write_image(&temp_dir.path().join(format!("scans/{}.png", i)), 9, i * 40);
        }

        let config = LoaderConfig {
            shuffle: false,
            ..small_config(6)
        };
        let dataset = DirectoryDataset::open(temp_dir.path(), &config).unwrap();
        let expected: Vec<f32> = dataset
            .samples
            .iter()
            .map(|s| dataset.load_image(s).unwrap().get_pixel(0, 0)[0] as f32 / 255.0)
            .collect();

        let processed = Pipeline::new(PipelineMode::Plain, &config).process(dataset);
        let batch = processed.batches().next().unwrap().unwrap();
        let firsts: Vec<f32> = (0..batch.len()).map(|i| batch.image(i).unwrap()[0]).collect();
        assert_eq!(firsts, expected);
    }

    #[test]
    fn test_augmented_pass_is_reproducible() {
        let temp_dir = TempDir::new().unwrap();
        for i in 0..5u8 {
            write_image(&temp_dir.path().join(format!("yes/{}.png", i)), 12, 30 + i * 20);
        }

        let config = small_config(2);
        let run = || {
            let dataset = DirectoryDataset::open(temp_dir.path(), &config).unwrap();
            Pipeline::new(PipelineMode::Augment, &config)
                .process(dataset)
                .batches()
                .collect::<Result<Vec<_>>>()
                .unwrap()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_decode_error_is_reported_and_not_cached() {
        let temp_dir = TempDir::new().unwrap();
        write_image(&temp_dir.path().join("yes/good.png"), 10, 50);
        fs::write(temp_dir.path().join("yes/bad.png"), b"not a png").unwrap();

        let config = LoaderConfig {
            shuffle: false,
            ..small_config(1)
        };
        let dataset = DirectoryDataset::open(temp_dir.path(), &config).unwrap();
        let processed = Pipeline::new(PipelineMode::Plain, &config).process(dataset);

        let results: Vec<_> = processed.batches().collect();
        assert!(results.iter().any(|r| matches!(r, Err(BrainError::ImageLoad(_, _)))));
        assert!(!processed.is_cached());
    }

    #[test]
    fn test_batch_image_slice() {
        let batch = ProcessedBatch {
            images: (0..24).map(|v| v as f32).collect(),
            shape: [2, 2, 2, 3],
            labels: vec![0, 1],
        };
        assert_eq!(batch.image(1).unwrap()[0], 12.0);
        assert!(batch.image(2).is_none());
    }
}
