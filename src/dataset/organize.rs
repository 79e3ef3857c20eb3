//! Dataset Organizing Module
//!
//! Rearranges `<base>/<dataset>/<class>/*` into
//! `<base>/<dataset>/{train,test,valid}/<class>/*` using `three_way_split`.
//! Files are copied into the split folders and the original class folder is
//! removed only after every copy for that class succeeded.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::split::{three_way_split, SplitRatios};
use crate::utils::error::{BrainError, Result, ResultExt};
use crate::utils::logging::ProgressLogger;

/// Names of the split folders created inside each dataset
pub const SPLIT_DIRS: [&str; 3] = ["train", "test", "valid"];

/// Per-class outcome of the organizer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassSplitCounts {
    pub class_name: String,
    pub train: usize,
    pub test: usize,
    pub valid: usize,
}

impl ClassSplitCounts {
    pub fn total(&self) -> usize {
        self.train + self.test + self.valid
    }
}

/// Outcome for one dataset folder
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetReport {
    pub name: String,
    /// Already had train/ and test/, left untouched
    pub skipped: bool,
    pub classes: Vec<ClassSplitCounts>,
    /// Class folders with no files, left in place
    pub empty_classes: Vec<String>,
}

/// Summary of an `organize_base_dir` run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizeReport {
    pub base_dir: PathBuf,
    pub datasets: Vec<DatasetReport>,
}

impl OrganizeReport {
    pub fn total_files(&self) -> usize {
        self.datasets
            .iter()
            .flat_map(|d| d.classes.iter())
            .map(ClassSplitCounts::total)
            .sum()
    }

    pub fn dataset(&self, name: &str) -> Option<&DatasetReport> {
        self.datasets.iter().find(|d| d.name == name)
    }
}

impl fmt::Display for OrganizeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Organized {}", self.base_dir.display())?;

        for dataset in &self.datasets {
            if dataset.skipped {
                writeln!(f, "  {}: splits already present, skipped", dataset.name)?;
                continue;
            }

            writeln!(f, "  {}:", dataset.name)?;
            for class in &dataset.classes {
                writeln!(
                    f,
                    "    {:<24} train {:>5}  test {:>5}  valid {:>5}",
                    class.class_name, class.train, class.test, class.valid
                )?;
            }
            for empty in &dataset.empty_classes {
                writeln!(f, "    {:<24} empty, left in place", empty)?;
            }
        }

        write!(f, "  Total files copied: {}", self.total_files())
    }
}

/// Organize every dataset folder directly under `base`
pub fn organize_base_dir(base: impl AsRef<Path>, ratios: &SplitRatios) -> Result<OrganizeReport> {
    let base = base.as_ref();
    ratios.validate()?;

    if !base.is_dir() {
        return Err(BrainError::Dataset(format!("Base directory not found: {:?}", base)));
    }

    info!("Organizing datasets in {:?} (seed {})", base, ratios.seed);

    let mut report = OrganizeReport {
        base_dir: base.to_path_buf(),
        datasets: Vec::new(),
    };

    for dataset_dir in sorted_subdirs(base)? {
        report.datasets.push(organize_dataset(&dataset_dir, ratios)?);
    }

    info!("Organized {} datasets, {} files", report.datasets.len(), report.total_files());
    Ok(report)
}

/// Split the class folders of a single dataset
pub fn organize_dataset(dataset_dir: &Path, ratios: &SplitRatios) -> Result<DatasetReport> {
    let name = dir_name(dataset_dir)?;
    let mut report = DatasetReport {
        name: name.clone(),
        ..DatasetReport::default()
    };

    if dataset_dir.join("train").exists() && dataset_dir.join("test").exists() {
        info!("{}: train/ and test/ already present, skipping", name);
        report.skipped = true;
        return Ok(report);
    }

    let class_dirs: Vec<PathBuf> = sorted_subdirs(dataset_dir)?
        .into_iter()
        .filter(|p| !SPLIT_DIRS.iter().any(|s| p.file_name().is_some_and(|n| n == *s)))
        .collect();

    for split in SPLIT_DIRS {
        fs::create_dir_all(dataset_dir.join(split))?;
    }

    let mut progress = ProgressLogger::new(format!("Organizing {}", name), class_dirs.len());

    for class_dir in class_dirs {
        let class_name = dir_name(&class_dir)?;
        let files = sorted_files(&class_dir)?;

        if files.is_empty() {
            warn!("{}: class '{}' has no files, leaving it in place", name, class_name);
            report.empty_classes.push(class_name);
            progress.tick();
            continue;
        }

        let split = three_way_split(files, ratios);
        let counts = ClassSplitCounts {
            class_name: class_name.clone(),
            train: split.train.len(),
            test: split.test.len(),
            valid: split.valid.len(),
        };

        // Every split gets the class folder, even when it receives no files,
        // so folder-derived labels line up across splits
        for split_name in SPLIT_DIRS {
            fs::create_dir_all(dataset_dir.join(split_name).join(&class_name))?;
        }
        for (split_name, files) in [("train", &split.train), ("test", &split.test), ("valid", &split.valid)] {
            copy_into(files, &dataset_dir.join(split_name).join(&class_name))?;
        }

        fs::remove_dir_all(&class_dir)?;
        debug!(
            "{}/{}: {} train, {} test, {} valid",
            name, class_name, counts.train, counts.test, counts.valid
        );

        report.classes.push(counts);
        progress.tick();
    }

    progress.finish();
    Ok(report)
}

fn copy_into(files: &[PathBuf], dest_dir: &Path) -> Result<()> {
    for src in files {
        let file_name = src
            .file_name()
            .with_context(|| format!("File without a name: {:?}", src))?;
        fs::copy(src, dest_dir.join(file_name))
            .with_context(|| format!("Failed to copy {:?} to {:?}", src, dest_dir))?;
    }
    Ok(())
}

fn dir_name(path: &Path) -> Result<String> {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .with_context(|| format!("Directory without a name: {:?}", path))
}

fn sorted_subdirs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

fn sorted_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::loader::{DirectoryDataset, LoaderConfig};
    use std::collections::HashSet;
    use tempfile::TempDir;

    fn write_class(base: &Path, dataset: &str, class: &str, n: usize) {
        let dir = base.join(dataset).join(class);
        fs::create_dir_all(&dir).unwrap();
        for i in 0..n {
            fs::write(dir.join(format!("img_{:03}.jpg", i)), format!("{}-{}", class, i)).unwrap();
        }
    }

    fn names_in(dir: &Path) -> HashSet<String> {
        if !dir.exists() {
            return HashSet::new();
        }
        fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_organize_splits_each_class() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path();
        write_class(base, "tumor", "yes", 10);
        write_class(base, "tumor", "no", 5);

        let report = organize_base_dir(base, &SplitRatios::default()).unwrap();
        let dataset = report.dataset("tumor").unwrap();
        assert!(!dataset.skipped);

        let yes = dataset.classes.iter().find(|c| c.class_name == "yes").unwrap();
        assert_eq!((yes.train, yes.test, yes.valid), (6, 2, 2));

        let root = base.join("tumor");
        assert!(!root.join("yes").exists());
        assert!(!root.join("no").exists());

        let train = names_in(&root.join("train/yes"));
        let test = names_in(&root.join("test/yes"));
        let valid = names_in(&root.join("valid/yes"));
        assert!(train.is_disjoint(&test));
        assert!(train.is_disjoint(&valid));
        assert!(test.is_disjoint(&valid));

        let union: HashSet<String> = train.union(&test).chain(valid.iter()).cloned().collect();
        let expected: HashSet<String> = (0..10).map(|i| format!("img_{:03}.jpg", i)).collect();
        assert_eq!(union, expected);

        assert_eq!(report.total_files(), 15);
    }

    #[test]
    fn test_empty_class_left_in_place() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path();
        write_class(base, "stroke", "hemorrhagic", 4);
        write_class(base, "stroke", "ischemic", 0);

        let report = organize_base_dir(base, &SplitRatios::default()).unwrap();
        let dataset = report.dataset("stroke").unwrap();

        assert_eq!(dataset.empty_classes, vec!["ischemic".to_string()]);
        assert!(base.join("stroke/ischemic").exists());
        for split in SPLIT_DIRS {
            assert!(!base.join("stroke").join(split).join("ischemic").exists());
        }
    }

    #[test]
    fn test_already_split_dataset_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path();
        write_class(base, "alzheimer", "train/mild", 3);
        write_class(base, "alzheimer", "test/mild", 2);
        write_class(base, "alzheimer", "stray", 2);

        let report = organize_base_dir(base, &SplitRatios::default()).unwrap();
        assert!(report.dataset("alzheimer").unwrap().skipped);
        assert!(base.join("alzheimer/stray").exists());
        assert!(!base.join("alzheimer/valid").exists());
    }

    #[test]
    fn test_rerun_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path();
        write_class(base, "tumor", "yes", 10);

        // Simulate an interrupted run: split folders exist, class folder still present
        fs::create_dir_all(base.join("tumor/valid")).unwrap();
        let first = organize_dataset(&base.join("tumor"), &SplitRatios::default()).unwrap();

        // train/ and test/ now exist, so a second pass leaves everything alone
        let second = organize_base_dir(base, &SplitRatios::default()).unwrap();
        assert!(second.dataset("tumor").unwrap().skipped);
        assert_eq!(first.classes[0].total(), 10);
        assert_eq!(names_in(&base.join("tumor/train/yes")).len(), 6);
    }

    #[test]
    fn test_same_seed_same_assignment() {
        let a = TempDir::new().unwrap();
        let b = TempDir::new().unwrap();
        write_class(a.path(), "tumor", "yes", 20);
        write_class(b.path(), "tumor", "yes", 20);

        organize_base_dir(a.path(), &SplitRatios::default()).unwrap();
        organize_base_dir(b.path(), &SplitRatios::default()).unwrap();

        for split in SPLIT_DIRS {
            let rel = format!("tumor/{}/yes", split);
            assert_eq!(names_in(&a.path().join(&rel)), names_in(&b.path().join(&rel)));
        }
    }

    #[test]
    fn test_class_labels_line_up_across_splits() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path();
        write_class(base, "tumor", "a", 10);
        write_class(base, "tumor", "b", 2);
        write_class(base, "tumor", "c", 10);

        let report = organize_base_dir(base, &SplitRatios::default()).unwrap();
        let b = report.dataset("tumor").unwrap().classes.iter().find(|c| c.class_name == "b").unwrap().clone();
        assert_eq!((b.train, b.test, b.valid), (1, 1, 0));

        let config = LoaderConfig {
            shuffle: false,
            ..LoaderConfig::default()
        };
        let expected = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        for split in SPLIT_DIRS {
            let opened = DirectoryDataset::open(base.join("tumor").join(split), &config).unwrap();
            assert_eq!(opened.class_names, expected, "class folders of {}", split);
            for sample in &opened.samples {
                assert_eq!(opened.class_names[sample.label], sample.class_name);
            }
        }
        assert!(names_in(&base.join("tumor/valid/b")).is_empty());
    }

    #[test]
    fn test_missing_base_dir() {
        let result = organize_base_dir("/nonexistent/brain/data", &SplitRatios::default());
        assert!(matches!(result, Err(BrainError::Dataset(_))));
    }

    #[test]
    fn test_report_display() {
        let temp_dir = TempDir::new().unwrap();
        write_class(temp_dir.path(), "tumor", "yes", 10);
        let report = organize_base_dir(temp_dir.path(), &SplitRatios::default()).unwrap();

        let text = report.to_string();
        assert!(text.contains("tumor"));
        assert!(text.contains("Total files copied: 10"));
    }
}
