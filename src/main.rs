//! Brain Disease Classifier CLI
//!
//! Dataset organizing, preprocessing checks and offline classification from
//! the command line. The web front-end lives in the `server` crate.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use brain_classifier::app::{classify, ClassifyForm, ClassifyOutcome, Upload};
use brain_classifier::backend::{backend_name, default_device, DefaultBackend};
use brain_classifier::dataset::{
    load_splits, organize_base_dir, save_preview, DirectoryDataset, ProcessedDataset, SPLIT_DIRS,
};
use brain_classifier::inference::{evaluate_split, EvalConfig, ModelRegistry, REPORT_FILE_NAME};
use brain_classifier::model::{load_model, record_path, ScanNet};
use brain_classifier::utils::logging::{init_logging, LogConfig};
use brain_classifier::utils::{format_count, format_duration};
use brain_classifier::{AppConfig, TestType};

/// Brain Disease Classifier
///
/// Organizes MRI datasets into train/test/valid splits, checks the
/// preprocessing pipeline, and classifies scans with pre-trained models.
#[derive(Parser, Debug)]
#[command(name = "brain_classifier")]
#[command(version)]
#[command(about = "Brain MRI disease classification with Burn", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, default_value = "false")]
    verbose: bool,

    /// TOML configuration file
    #[arg(short, long, env = "BRAIN_CONFIG")]
    config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Split every <dataset>/<class> folder into train/test/valid
    Organize {
        /// Directory holding one folder per dataset
        #[arg(short, long)]
        base_dir: Option<PathBuf>,

        /// Random seed for both splits
        #[arg(long)]
        seed: Option<u64>,

        /// Print the report as JSON
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Show class and batch counts of an organized dataset
    Stats {
        #[arg(short, long)]
        base_dir: Option<PathBuf>,

        /// Dataset folder name (e.g. "tumor")
        #[arg(short, long)]
        dataset: String,

        /// Run one full pass through the pipeline to check every image decodes
        #[arg(long, default_value = "false")]
        scan: bool,
    },

    /// Save the first processed image of each split side by side
    Preview {
        #[arg(short, long)]
        base_dir: Option<PathBuf>,

        #[arg(short, long)]
        dataset: String,

        /// Output image path
        #[arg(short, long, default_value = "preview.png")]
        output: PathBuf,

        /// Tile size in pixels
        #[arg(long, default_value = "224")]
        tile: u32,
    },

    /// Classify a single scan and print the report
    Classify {
        /// Patient name
        #[arg(long)]
        name: String,

        /// Patient age
        #[arg(long)]
        age: String,

        /// Test type: "Alzheimer's", "Brain Stroke" or "Tumor"
        #[arg(short, long)]
        test_type: TestType,

        /// Path to the MRI scan (jpg, jpeg or png)
        #[arg(short, long)]
        image: PathBuf,

        /// Also write the report to this file
        #[arg(long)]
        report_out: Option<PathBuf>,
    },

    /// Measure a model's accuracy on an organized split
    Evaluate {
        #[arg(short, long)]
        base_dir: Option<PathBuf>,

        #[arg(short, long)]
        dataset: String,

        /// Model to evaluate: "Alzheimer's", "Brain Stroke" or "Tumor"
        #[arg(short, long)]
        test_type: TestType,

        /// Split folder to score (train, test or valid)
        #[arg(short, long, default_value = "test")]
        split: String,

        /// Print the report as JSON
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Show which configured models load
    Models,

    /// Write freshly initialised weights for every configured model
    InitModels {
        /// Overwrite existing records
        #[arg(long, default_value = "false")]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Keep stdout clean when the report is printed as JSON
    let json_output = matches!(
        cli.command,
        Commands::Organize { json: true, .. } | Commands::Evaluate { json: true, .. }
    );
    let log_config = if cli.verbose {
        LogConfig::verbose()
    } else if json_output {
        LogConfig::quiet()
    } else {
        LogConfig::default()
    };

    if let Err(e) = init_logging(&log_config) {
        eprintln!("{}", e);
    }

    let config = AppConfig::load_or_default(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Organize { base_dir, seed, json } => {
            let base_dir = base_dir.unwrap_or_else(|| config.data.base_dir.clone());
            let mut ratios = config.data.split_ratios();
            if let Some(seed) = seed {
                ratios.seed = seed;
            }
            cmd_organize(&base_dir, &ratios, json)?;
        }

        Commands::Stats { base_dir, dataset, scan } => {
            let base_dir = base_dir.unwrap_or_else(|| config.data.base_dir.clone());
            cmd_stats(&config, &base_dir, &dataset, scan)?;
        }

        Commands::Preview {
            base_dir,
            dataset,
            output,
            tile,
        } => {
            let base_dir = base_dir.unwrap_or_else(|| config.data.base_dir.clone());
            cmd_preview(&config, &base_dir, &dataset, &output, tile)?;
        }

        Commands::Classify {
            name,
            age,
            test_type,
            image,
            report_out,
        } => {
            cmd_classify(&config, name, age, test_type, &image, report_out.as_deref())?;
        }

        Commands::Evaluate {
            base_dir,
            dataset,
            test_type,
            split,
            json,
        } => {
            let base_dir = base_dir.unwrap_or_else(|| config.data.base_dir.clone());
            cmd_evaluate(&config, &base_dir, &dataset, test_type, &split, json)?;
        }

        Commands::Models => {
            cmd_models(&config);
        }

        Commands::InitModels { force } => {
            cmd_init_models(&config, force)?;
        }
    }

    Ok(())
}

fn cmd_organize(base_dir: &Path, ratios: &brain_classifier::SplitRatios, json: bool) -> Result<()> {
    info!("Organizing datasets under {:?}", base_dir);

    let report = organize_base_dir(base_dir, ratios)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report);
        println!("{}", "Done.".green().bold());
    }

    Ok(())
}

fn cmd_stats(config: &AppConfig, base_dir: &Path, dataset: &str, scan: bool) -> Result<()> {
    let splits = load_splits(base_dir, dataset, &config.data.loader_config())?;

    println!("{} {}", "Dataset:".cyan().bold(), splits.name);
    for (name, split) in splits.named() {
        println!();
        println!(
            "{} {}, {} batches of up to {}",
            format!("{}:", name).yellow().bold(),
            format_count(split.len(), "image"),
            split.num_batches(),
            config.data.batch_size
        );
        print!("{}", split.source().stats());

        if scan {
            scan_split(name, split)?;
        }
    }

    Ok(())
}

/// Drive one pass through the pipeline with a progress bar
fn scan_split(name: &str, split: &ProcessedDataset) -> Result<()> {
    let pb = ProgressBar::new(split.num_batches() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  {spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} batches")?
            .progress_chars("#>-"),
    );

    let start = std::time::Instant::now();
    for batch in split.batches() {
        batch.with_context(|| format!("{} split failed to preprocess", name))?;
        pb.inc(1);
    }
    pb.finish_and_clear();

    println!(
        "  {} {} pass in {}",
        "✓".green(),
        name,
        format_duration(start.elapsed())
    );
    Ok(())
}

fn cmd_preview(config: &AppConfig, base_dir: &Path, dataset: &str, output: &Path, tile: u32) -> Result<()> {
    let splits = load_splits(base_dir, dataset, &config.data.loader_config())?;
    save_preview(output, &splits.named(), tile)?;

    println!("{} {}", "Preview saved to".green(), output.display());
    Ok(())
}

fn load_registry(config: &AppConfig) -> ModelRegistry {
    info!("Loading models on {}", backend_name());
    config.warn_on_size_mismatch();
    let device = default_device();
    ModelRegistry::load::<DefaultBackend>(&config.models, &device)
}

fn cmd_classify(
    config: &AppConfig,
    name: String,
    age: String,
    test_type: TestType,
    image: &Path,
    report_out: Option<&Path>,
) -> Result<()> {
    let bytes = std::fs::read(image).with_context(|| format!("Failed to read {:?}", image))?;
    let file_name = image
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let form = ClassifyForm {
        patient_name: name,
        patient_age: age,
        test_type: Some(test_type),
        upload: Some(Upload::new(file_name, bytes)),
    };

    let registry = load_registry(config);

    match classify(&form, &registry, &config.inference)? {
        ClassifyOutcome::Incomplete => {
            bail!("Name and age must be non-empty and the scan must be a jpg, jpeg or png file");
        }
        ClassifyOutcome::Completed { prediction, report } => {
            println!(
                "{} {} ({:.2} ms)",
                "Prediction:".cyan().bold(),
                prediction.label,
                prediction.inference_time_ms
            );
            println!();
            print!("{}", report.render());

            if let Some(path) = report_out {
                let path = if path.is_dir() {
                    path.join(REPORT_FILE_NAME)
                } else {
                    path.to_path_buf()
                };
                std::fs::write(&path, report.render())
                    .with_context(|| format!("Failed to write report to {:?}", path))?;
                println!();
                println!("{} {}", "Report written to".green(), path.display());
            }
        }
    }

    Ok(())
}

fn cmd_evaluate(
    config: &AppConfig,
    base_dir: &Path,
    dataset: &str,
    test_type: TestType,
    split: &str,
    json: bool,
) -> Result<()> {
    if !SPLIT_DIRS.contains(&split) {
        bail!("Unknown split '{}', expected train, test or valid", split);
    }

    let split_dir = base_dir.join(dataset).join(split);
    if !split_dir.is_dir() {
        bail!("{:?} does not exist; run `organize` first", split_dir);
    }

    // Score at the same size and scale as the classify path
    let size = config.inference.image_size;
    let mut loader_config = config.data.loader_config();
    loader_config.image_size = (size, size);
    loader_config.shuffle = false;
    let source = DirectoryDataset::open(&split_dir, &loader_config)?;

    let spec = config.models.get(test_type);
    let device = default_device();
    let net = load_model::<DefaultBackend>(spec, &device)?;

    let eval_config = EvalConfig {
        batch_size: config.data.batch_size,
        num_workers: config.data.num_workers,
        rescale: config.inference.rescale,
    };

    let start = std::time::Instant::now();
    let report = evaluate_split(&net, spec, source, &eval_config, &device)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "{} {} on {}/{} in {}",
            "Evaluated".cyan().bold(),
            test_type.label(),
            dataset,
            split,
            format_duration(start.elapsed())
        );
        print!("{}", report);
    }

    Ok(())
}

fn cmd_models(config: &AppConfig) {
    let registry = load_registry(config);

    println!("{}", "Model registry".cyan().bold());
    for (test_type, status) in registry.status() {
        let marker = if status.is_loaded() { "✓".green() } else { "✗".red() };
        println!("  {} {:<14} {}", marker, test_type.label(), status);
    }
}

fn cmd_init_models(config: &AppConfig, force: bool) -> Result<()> {
    let device = default_device();

    for test_type in TestType::ALL {
        let spec = config.models.get(test_type);
        if record_path(&spec.path)?.is_some() && !force {
            warn!("{} record already exists at {:?}, skipping", test_type, spec.path);
            continue;
        }

        ScanNet::<DefaultBackend>::init(spec, &device).save(&spec.path)?;
        println!(
            "  {} {:<14} {} -> {}",
            "✓".green(),
            test_type.label(),
            spec.kind,
            spec.path.with_extension("mpk").display()
        );
    }

    println!("{}", "Weights are untrained; predictions are not meaningful.".yellow());
    Ok(())
}
