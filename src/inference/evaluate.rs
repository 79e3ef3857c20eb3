//! Split Evaluation
//!
//! Scores a whole organized split with a Burn `DataLoader` and reports how
//! many predictions match the folder labels.

use std::fmt;

use burn::data::dataloader::DataLoaderBuilder;
use burn::data::dataset::Dataset;
use burn::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::predictor::Decision;
use crate::dataset::burn_dataset::{ScanBatcher, ScanDataset};
use crate::dataset::loader::DirectoryDataset;
use crate::model::{ModelKind, ModelSpec, ScanNet};
use crate::utils::error::{BrainError, Result};

/// Loader settings for an evaluation run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalConfig {
    pub batch_size: usize,
    /// Background decoding threads; 0 decodes on the caller
    pub num_workers: usize,
    /// Divide pixel values by 255, as configured for inference
    pub rescale: bool,
}

/// Correct and total predictions for one class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassAccuracy {
    pub class_name: String,
    pub correct: usize,
    pub total: usize,
}

/// Outcome of scoring one split
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalReport {
    pub evaluated: usize,
    pub correct: usize,
    /// Samples the loader never delivered
    pub skipped: usize,
    pub per_class: Vec<ClassAccuracy>,
}

impl EvalReport {
    pub fn accuracy(&self) -> f64 {
        if self.evaluated == 0 {
            0.0
        } else {
            self.correct as f64 / self.evaluated as f64
        }
    }
}

impl fmt::Display for EvalReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Accuracy: {:.2}% ({}/{})",
            self.accuracy() * 100.0,
            self.correct,
            self.evaluated
        )?;
        for class in &self.per_class {
            writeln!(f, "  {:<20} {:>6}/{}", class.class_name, class.correct, class.total)?;
        }
        if self.skipped > 0 {
            writeln!(f, "  {} samples skipped", self.skipped)?;
        }
        Ok(())
    }
}

/// Run `net` over every sample of `split`
///
/// `spec` is the configuration entry `net` was loaded from.
pub fn evaluate_split<B: Backend>(
    net: &ScanNet<B>,
    spec: &ModelSpec,
    split: DirectoryDataset,
    config: &EvalConfig,
    device: &B::Device,
) -> Result<EvalReport> {
    if config.batch_size == 0 {
        return Err(BrainError::Config("batch_size must be greater than 0".into()));
    }

    let (height, width) = split.config.image_size;
    if spec.kind == ModelKind::Lstm && width != spec.input_size {
        return Err(BrainError::Inference(format!(
            "LSTM model expects {}-pixel rows, split images are {}x{}",
            spec.input_size, height, width
        )));
    }

    let mut per_class: Vec<ClassAccuracy> = split
        .class_names
        .iter()
        .map(|name| ClassAccuracy {
            class_name: name.clone(),
            correct: 0,
            total: 0,
        })
        .collect();

    let dataset = ScanDataset::new(split).with_rescale(config.rescale);
    let expected = dataset.len();
    let batcher = ScanBatcher::new(dataset.image_size());
    let loader = DataLoaderBuilder::<B, _, _>::new(batcher)
        .batch_size(config.batch_size)
        .num_workers(config.num_workers)
        .set_device(device.clone())
        .build(dataset);

    let decision = Decision::for_outputs(net.num_outputs());
    let mut evaluated = 0;
    let mut correct = 0;

    for batch in loader.iter() {
        let output = net.forward(batch.images);
        let [_, num_outputs] = output.dims();
        let scores: Vec<f32> = output
            .into_data()
            .convert::<f32>()
            .to_vec()
            .map_err(|e| BrainError::Inference(format!("Failed to read model output: {:?}", e)))?;
        let targets: Vec<i64> = batch
            .targets
            .into_data()
            .convert::<i64>()
            .to_vec()
            .map_err(|e| BrainError::Inference(format!("Failed to read targets: {:?}", e)))?;

        for (row, &target) in scores.chunks(num_outputs).zip(&targets) {
            let predicted = decision.class_index(row)?;
            let target = target as usize;
            let hit = predicted == target;

            if let Some(class) = per_class.get_mut(target) {
                class.total += 1;
                class.correct += usize::from(hit);
            }
            evaluated += 1;
            correct += usize::from(hit);
        }
    }

    let skipped = expected.saturating_sub(evaluated);
    if skipped > 0 {
        warn!("{} of {} samples were not evaluated", skipped, expected);
    }

    let report = EvalReport {
        evaluated,
        correct,
        skipped,
        per_class,
    };
    info!(
        "Evaluated {} samples, accuracy {:.2}%",
        report.evaluated,
        report.accuracy() * 100.0
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::loader::LoaderConfig;
    use burn::backend::NdArray;
    use image::{Rgb, RgbImage};
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    type TestBackend = NdArray;

    fn write_class(root: &Path, class: &str, count: usize) {
        let dir = root.join(class);
        fs::create_dir_all(&dir).unwrap();
        for i in 0..count {
            RgbImage::from_pixel(12, 12, Rgb([i as u8 * 30; 3]))
                .save(dir.join(format!("{}.png", i)))
                .unwrap();
        }
    }

    fn open(root: &Path, size: usize) -> DirectoryDataset {
        let config = LoaderConfig {
            image_size: (size, size),
            shuffle: false,
            ..LoaderConfig::default()
        };
        DirectoryDataset::open(root, &config).unwrap()
    }

    fn eval_config(num_workers: usize) -> EvalConfig {
        EvalConfig {
            batch_size: 2,
            num_workers,
            rescale: true,
        }
    }

    #[test]
    fn test_every_sample_is_counted_once() {
        let temp_dir = TempDir::new().unwrap();
        write_class(temp_dir.path(), "no", 3);
        write_class(temp_dir.path(), "yes", 2);

        let device = Default::default();
        let spec = ModelSpec::cnn(temp_dir.path().join("unused"));
        let net = ScanNet::<TestBackend>::init(&spec, &device);

        let report = evaluate_split(&net, &spec, open(temp_dir.path(), 16), &eval_config(0), &device).unwrap();

        assert_eq!(report.evaluated, 5);
        assert_eq!(report.skipped, 0);
        assert!(report.correct <= 5);
        let totals: Vec<(String, usize)> = report
            .per_class
            .iter()
            .map(|c| (c.class_name.clone(), c.total))
            .collect();
        assert_eq!(totals, vec![("no".to_string(), 3), ("yes".to_string(), 2)]);
        assert_eq!(report.per_class.iter().map(|c| c.correct).sum::<usize>(), report.correct);
    }

    #[test]
    fn test_background_workers_see_the_whole_split() {
        let temp_dir = TempDir::new().unwrap();
        write_class(temp_dir.path(), "no", 4);
        write_class(temp_dir.path(), "yes", 3);

        let device = Default::default();
        let spec = ModelSpec::cnn(temp_dir.path().join("unused"));
        let net = ScanNet::<TestBackend>::init(&spec, &device);

        let report = evaluate_split(&net, &spec, open(temp_dir.path(), 16), &eval_config(2), &device).unwrap();
        assert_eq!(report.evaluated, 7);
    }

    #[test]
    fn test_lstm_row_width_must_match() {
        let temp_dir = TempDir::new().unwrap();
        write_class(temp_dir.path(), "no", 1);

        let device = Default::default();
        let mut spec = ModelSpec::lstm(temp_dir.path().join("unused"));
        spec.input_size = 8;
        let net = ScanNet::<TestBackend>::init(&spec, &device);

        let result = evaluate_split(&net, &spec, open(temp_dir.path(), 16), &eval_config(0), &device);
        assert!(matches!(result, Err(BrainError::Inference(_))));
    }

    #[test]
    fn test_accuracy_of_empty_report() {
        let report = EvalReport {
            evaluated: 0,
            correct: 0,
            skipped: 0,
            per_class: Vec::new(),
        };
        assert_eq!(report.accuracy(), 0.0);
        assert!(report.to_string().starts_with("Accuracy: 0.00% (0/0)"));
    }
}
