//! Model registry: one pre-trained model per test type, loaded once at start-up.
//!
//! A slot whose model failed to load keeps the failure reason so callers can
//! show it. The registry is never reloaded or mutated after construction.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use burn::tensor::backend::Backend;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::predictor::{BurnScanModel, ScanModel};
use crate::model::load_model;
use crate::types::TestType;
use crate::utils::config::ModelsConfig;
use crate::utils::error::{BrainError, Result};

/// Load state of one registry slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "lowercase")]
pub enum SlotStatus {
    /// Model loaded; holds a short description
    Loaded(String),
    /// Model failed to load; holds the reason
    Failed(String),
}

impl SlotStatus {
    pub fn is_loaded(&self) -> bool {
        matches!(self, SlotStatus::Loaded(_))
    }
}

impl fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotStatus::Loaded(desc) => write!(f, "loaded: {}", desc),
            SlotStatus::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// Read-only mapping from test type to its model
pub struct ModelRegistry {
    slots: BTreeMap<TestType, std::result::Result<Arc<dyn ScanModel>, String>>,
}

impl ModelRegistry {
    /// Load every configured model; failures are kept per slot
    pub fn load<B: Backend>(config: &ModelsConfig, device: &B::Device) -> Self {
        let mut slots = BTreeMap::new();

        for test_type in TestType::ALL {
            let spec = config.get(test_type);
            let slot = match load_model::<B>(spec, device) {
                Ok(net) => {
                    let model: Arc<dyn ScanModel> = Arc::new(BurnScanModel::new(net, device.clone(), spec.input_size));
                    info!("{} model ready ({})", test_type, model.describe());
                    Ok(model)
                }
                Err(e) => {
                    error!("Failed to load {} model from {:?}: {}", test_type, spec.path, e);
                    Err(e.to_string())
                }
            };
            slots.insert(test_type, slot);
        }

        Self { slots }
    }

    /// Build a registry from already constructed models
    pub fn from_slots<I>(slots: I) -> Self
    where
        I: IntoIterator<Item = (TestType, std::result::Result<Arc<dyn ScanModel>, String>)>,
    {
        let mut map: BTreeMap<_, _> = slots.into_iter().collect();
        for test_type in TestType::ALL {
            map.entry(test_type)
                .or_insert_with(|| Err("no model registered".to_string()));
        }
        Self { slots: map }
    }

    /// The model registered for `test_type`
    pub fn lookup(&self, test_type: TestType) -> Result<Arc<dyn ScanModel>> {
        match self.slots.get(&test_type) {
            Some(Ok(model)) => Ok(Arc::clone(model)),
            Some(Err(reason)) => Err(BrainError::ModelUnavailable {
                test_type,
                reason: reason.clone(),
            }),
            None => Err(BrainError::ModelUnavailable {
                test_type,
                reason: "no model registered".to_string(),
            }),
        }
    }

    /// Load state of every slot, in selector order
    pub fn status(&self) -> Vec<(TestType, SlotStatus)> {
        TestType::ALL
            .into_iter()
            .map(|test_type| {
                let status = match self.slots.get(&test_type) {
                    Some(Ok(model)) => SlotStatus::Loaded(model.describe()),
                    Some(Err(reason)) => SlotStatus::Failed(reason.clone()),
                    None => SlotStatus::Failed("no model registered".to_string()),
                };
                (test_type, status)
            })
            .collect()
    }

    pub fn loaded_count(&self) -> usize {
        self.slots.values().filter(|slot| slot.is_ok()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::predictor::ImageTensor;
    use crate::model::{ModelSpec, ScanNet};
    use burn::backend::NdArray;
    use tempfile::TempDir;

    type TestBackend = NdArray;

    struct Constant;

    impl ScanModel for Constant {
        fn infer(&self, _input: &ImageTensor) -> Result<Vec<f32>> {
            Ok(vec![0.0, 1.0])
        }

        fn num_outputs(&self) -> usize {
            2
        }
    }

    #[test]
    fn test_load_keeps_failures_per_slot() {
        let temp_dir = TempDir::new().unwrap();
        let device = Default::default();

        let tumor_path = temp_dir.path().join("tumor");
        let spec = ModelSpec::cnn(&tumor_path);
        ScanNet::<TestBackend>::init(&spec, &device).save(&tumor_path).unwrap();

        let config = ModelsConfig {
            alzheimer: ModelSpec::cnn(temp_dir.path().join("missing_alzheimer")),
            brain_stroke: ModelSpec::cnn(temp_dir.path().join("missing_stroke")),
            tumor: spec,
        };

        let registry = ModelRegistry::load::<TestBackend>(&config, &device);

        assert!(registry.lookup(TestType::Tumor).is_ok());
        assert_eq!(registry.loaded_count(), 1);

        match registry.lookup(TestType::BrainStroke) {
            Err(BrainError::ModelUnavailable { test_type, .. }) => assert_eq!(test_type, TestType::BrainStroke),
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("stroke model should be unavailable"),
        }

        let status = registry.status();
        assert_eq!(status.len(), 3);
        assert_eq!(status[0].0, TestType::Alzheimers);
        assert!(!status[0].1.is_loaded());
        assert!(status[2].1.is_loaded());
    }

    #[test]
    fn test_from_slots_fills_missing_types() {
        let registry = ModelRegistry::from_slots([(TestType::Tumor, Ok(Arc::new(Constant) as Arc<dyn ScanModel>))]);

        assert!(registry.lookup(TestType::Tumor).is_ok());
        assert!(registry.lookup(TestType::Alzheimers).is_err());
        assert_eq!(registry.status().len(), 3);
    }

    #[test]
    fn test_status_display() {
        assert_eq!(SlotStatus::Failed("missing".into()).to_string(), "failed: missing");
        let json = serde_json::to_string(&SlotStatus::Loaded("CNN".into())).unwrap();
        assert_eq!(json, r#"{"status":"loaded","detail":"CNN"}"#);
    }
}
