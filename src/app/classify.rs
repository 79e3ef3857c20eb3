//! The classify flow: validate the form, run the selected model, build the report.
//!
//! An incomplete form is not an error. It yields `ClassifyOutcome::Incomplete`
//! and nothing runs. Lookup and decoding failures are real errors and are
//! returned to the caller to display.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::inference::predictor::{load_scan, Prediction, Predictor};
use crate::inference::registry::ModelRegistry;
use crate::inference::report::Report;
use crate::types::TestType;
use crate::utils::config::InferenceConfig;
use crate::utils::error::Result;

/// Upload types accepted by the classify page
pub const ACCEPTED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// An uploaded scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    pub fn has_accepted_extension(&self) -> bool {
        Path::new(&self.file_name)
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .is_some_and(|ext| ACCEPTED_EXTENSIONS.contains(&ext.as_str()))
    }
}

/// Raw classify page input; every field may be missing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifyForm {
    pub patient_name: String,
    pub patient_age: String,
    pub test_type: Option<TestType>,
    pub upload: Option<Upload>,
}

/// A form with every required field present
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifyRequest {
    pub patient_name: String,
    pub patient_age: String,
    pub test_type: TestType,
    pub upload: Upload,
}

impl ClassifyForm {
    /// `None` unless name, age, test type and an accepted upload are all present
    pub fn validate(&self) -> Option<ClassifyRequest> {
        let patient_name = self.patient_name.trim();
        let patient_age = self.patient_age.trim();
        if patient_name.is_empty() || patient_age.is_empty() {
            return None;
        }

        let upload = self.upload.as_ref().filter(|u| !u.bytes.is_empty() && u.has_accepted_extension())?;

        Some(ClassifyRequest {
            patient_name: patient_name.to_string(),
            patient_age: patient_age.to_string(),
            test_type: self.test_type?,
            upload: upload.clone(),
        })
    }
}

/// What the classify page shows after a submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ClassifyOutcome {
    /// Input missing; no inference ran
    Incomplete,
    Completed { prediction: Prediction, report: Report },
}

/// Validate the form and, when complete, classify the upload with the registered model
pub fn classify(form: &ClassifyForm, registry: &ModelRegistry, config: &InferenceConfig) -> Result<ClassifyOutcome> {
    let Some(request) = form.validate() else {
        debug!("Classify form incomplete, skipping inference");
        return Ok(ClassifyOutcome::Incomplete);
    };

    let model = registry.lookup(request.test_type)?;
    let size = config.image_size as u32;
    let input = load_scan(&request.upload.bytes, (size, size), config.rescale)?;
    let prediction = Predictor::new().predict(model.as_ref(), &input)?;

    info!(
        "Classified {} for {} test: {}",
        request.upload.file_name, request.test_type, prediction.label
    );

    let report = Report::new(
        request.patient_name,
        request.patient_age,
        request.test_type,
        prediction.label,
    );

    Ok(ClassifyOutcome::Completed { prediction, report })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::predictor::{ImageTensor, ScanModel};
    use crate::types::ConditionLabel;
    use crate::utils::error::BrainError;
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Always predicts class 1 and counts calls
    struct AlwaysPositive {
        calls: AtomicUsize,
        seen_shape: std::sync::Mutex<Option<[usize; 4]>>,
    }

    impl AlwaysPositive {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                seen_shape: std::sync::Mutex::new(None),
            }
        }
    }

    impl ScanModel for AlwaysPositive {
        fn infer(&self, input: &ImageTensor) -> Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.seen_shape.lock().unwrap() = Some(input.shape);
            Ok(vec![0.1, 0.9])
        }

        fn num_outputs(&self) -> usize {
            2
        }
    }

    fn png_upload(name: &str) -> Upload {
        let img = RgbImage::from_pixel(300, 240, Rgb([40, 40, 40]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png).unwrap();
        Upload::new(name, bytes)
    }

    fn full_form() -> ClassifyForm {
        ClassifyForm {
            patient_name: "Jane".to_string(),
            patient_age: "40".to_string(),
            test_type: Some(TestType::Tumor),
            upload: Some(png_upload("scan.png")),
        }
    }

    fn registry_with(model: Arc<AlwaysPositive>) -> ModelRegistry {
        ModelRegistry::from_slots([(TestType::Tumor, Ok(model as Arc<dyn ScanModel>))])
    }

    #[test]
    fn test_complete_form_produces_report() {
        let model = Arc::new(AlwaysPositive::new());
        let registry = registry_with(Arc::clone(&model));

        let outcome = classify(&full_form(), &registry, &InferenceConfig::default()).unwrap();

        match outcome {
            ClassifyOutcome::Completed { prediction, report } => {
                assert_eq!(prediction.label, ConditionLabel::Positive);
                assert!(report.render().contains("Patient Name: Jane"));
                assert!(report.render().contains("Test Type: Tumor"));
                assert!(report.render().contains("Prediction: Condition Positive"));
            }
            ClassifyOutcome::Incomplete => panic!("expected a completed classification"),
        }

        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
        assert_eq!(*model.seen_shape.lock().unwrap(), Some([1, 124, 124, 3]));
    }

    #[test]
    fn test_empty_name_runs_nothing() {
        let model = Arc::new(AlwaysPositive::new());
        let registry = registry_with(Arc::clone(&model));
        let form = ClassifyForm {
            patient_name: "  ".to_string(),
            ..full_form()
        };

        let outcome = classify(&form, &registry, &InferenceConfig::default()).unwrap();
        assert_eq!(outcome, ClassifyOutcome::Incomplete);
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_validate_requires_every_field() {
        assert!(full_form().validate().is_some());

        let no_age = ClassifyForm {
            patient_age: String::new(),
            ..full_form()
        };
        assert!(no_age.validate().is_none());

        let no_type = ClassifyForm {
            test_type: None,
            ..full_form()
        };
        assert!(no_type.validate().is_none());

        let no_upload = ClassifyForm {
            upload: None,
            ..full_form()
        };
        assert!(no_upload.validate().is_none());

        let gif = ClassifyForm {
            upload: Some(png_upload("scan.gif")),
            ..full_form()
        };
        assert!(gif.validate().is_none());

        let upper_case = ClassifyForm {
            upload: Some(png_upload("SCAN.JPEG")),
            ..full_form()
        };
        assert!(upper_case.validate().is_some());
    }

    #[test]
    fn test_unavailable_model_is_an_error() {
        let registry = registry_with(Arc::new(AlwaysPositive::new()));
        let form = ClassifyForm {
            test_type: Some(TestType::BrainStroke),
            ..full_form()
        };

        let result = classify(&form, &registry, &InferenceConfig::default());
        assert!(matches!(result, Err(BrainError::ModelUnavailable { .. })));
    }

    #[test]
    fn test_undecodable_upload_is_an_error() {
        let registry = registry_with(Arc::new(AlwaysPositive::new()));
        let form = ClassifyForm {
            upload: Some(Upload::new("scan.jpg", b"garbage".to_vec())),
            ..full_form()
        };

        let result = classify(&form, &registry, &InferenceConfig::default());
        assert!(matches!(result, Err(BrainError::ImageLoad(_, _))));
    }
}
