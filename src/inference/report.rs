//! Plain-text medical report for a single classification.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{ConditionLabel, TestType};

/// File name offered when the report is downloaded
pub const REPORT_FILE_NAME: &str = "medical_report.txt";

/// MIME type of the downloaded report
pub const REPORT_MIME_TYPE: &str = "text/plain";

const DISCLAIMER: &str = "Note: This is a preliminary assessment and not a definitive diagnosis.";

/// Patient details plus the predicted label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub patient_name: String,
    pub patient_age: String,
    pub test_type: TestType,
    pub prediction: ConditionLabel,
}

impl Report {
    pub fn new(
        patient_name: impl Into<String>,
        patient_age: impl Into<String>,
        test_type: TestType,
        prediction: ConditionLabel,
    ) -> Self {
        Self {
            patient_name: patient_name.into(),
            patient_age: patient_age.into(),
            test_type,
            prediction,
        }
    }

    pub fn render(&self) -> String {
        format!(
            "Medical Report\n\
             --------------\n\
             Patient Name: {}\n\
             Patient Age: {}\n\
             Test Type: {}\n\
             Prediction: {}\n\
             \n\
             {}\n",
            self.patient_name, self.patient_age, self.test_type, self.prediction, DISCLAIMER
        )
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_template() {
        let report = Report::new("Jane", "40", TestType::Tumor, ConditionLabel::Positive);
        let expected = "Medical Report\n\
                        --------------\n\
                        Patient Name: Jane\n\
                        Patient Age: 40\n\
                        Test Type: Tumor\n\
                        Prediction: Condition Positive\n\
                        \n\
                        Note: This is a preliminary assessment and not a definitive diagnosis.\n";
        assert_eq!(report.render(), expected);
    }

    #[test]
    fn test_render_uses_display_labels() {
        let report = Report::new("Sam", "71", TestType::Alzheimers, ConditionLabel::Negative);
        let text = report.to_string();
        assert!(text.contains("Test Type: Alzheimer's\n"));
        assert!(text.contains("Prediction: Condition Negative\n"));
    }
}
