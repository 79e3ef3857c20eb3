//! HTML views
//!
//! Pages are plain `format!` templates. Anything that came from the user goes
//! through `escape` before it is written into markup.

use brain_classifier::app::{ClassifyForm, Page};
use brain_classifier::{Prediction, Report, TestType, REPORT_FILE_NAME};

const STYLE: &str = r#"
body { font-family: sans-serif; margin: 0 auto; max-width: 1100px; padding: 1rem 2rem; color: #222; }
header { display: flex; justify-content: space-between; align-items: center; }
nav form { display: flex; gap: 0.5rem; }
nav button { padding: 0.4rem 0.9rem; }
nav button.active { font-weight: bold; }
.justify { text-align: justify; }
.notice { background: #fff4d6; padding: 0.6rem 1rem; border-left: 4px solid #e0a800; }
.error { background: #fde2e1; padding: 0.6rem 1rem; border-left: 4px solid #c62828; }
.result { background: #e6f4ea; padding: 0.6rem 1rem; border-left: 4px solid #2e7d32; }
label { display: block; margin-top: 0.8rem; }
pre { background: #f5f5f5; padding: 1rem; }
details { margin: 0.8rem 0; }
summary { font-size: 1.1rem; font-weight: bold; cursor: pointer; }
"#;

/// Escape text for use in element content and quoted attributes
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Wrap a page body with the title bar and navigation buttons
pub fn layout(current: Page, body: &str) -> String {
    let buttons: String = Page::ALL
        .iter()
        .map(|page| {
            let class = if *page == current { " class=\"active\"" } else { "" };
            format!(
                r#"<button type="submit" name="nav" value="{}"{}>{}</button>"#,
                page.slug(),
                class,
                page.title()
            )
        })
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Brain Disease Classifier</title>
<style>{style}</style>
</head>
<body>
<header>
<h1>Brain Disease Classifier</h1>
<nav><form method="get" action="/"><input type="hidden" name="page" value="{current}">{buttons}</form></nav>
</header>
<main>
{body}
</main>
</body>
</html>
"#,
        style = STYLE,
        current = current.slug(),
        buttons = buttons,
        body = body
    )
}

/// Render a navigable page; Classify renders an empty form
pub fn page(page: Page) -> String {
    match page {
        Page::Home => home(),
        Page::Classify => classify_form(&ClassifyForm::default(), None),
        Page::About => about(),
    }
}

pub fn home() -> String {
    let body = r#"<h2>Welcome to the Brain Disease Classifier</h2>
<div class="justify">
This web application utilizes advanced deep learning techniques to classify brain diseases
based on medical imaging. Specifically, it can identify conditions such as Alzheimer's, brain tumors,
and strokes. Our goal is to provide a preliminary analysis tool that can assist healthcare professionals
and individuals in understanding brain scans more effectively.
</div>
<h3>Features of the App:</h3>
<ul>
<li><strong>Classify Your Brain Scan:</strong> Upload a brain scan image, and the app will analyze it to detect
possible brain diseases.</li>
<li><strong>Learn About Brain Diseases:</strong> Get detailed information about various brain diseases,
including symptoms, treatment options, and more.</li>
</ul>
<h3>How to Use:</h3>
<ol>
<li>Navigate to the <strong>Classify</strong> page to upload a brain scan image.</li>
<li>Read about different brain diseases in the <strong>About Brain Diseases</strong> section.</li>
<li>After uploading an image, view the classification results along with a detailed report.</li>
</ol>
<div class="justify">
We hope this tool aids in the early detection and awareness of brain diseases. Please note that
this app is not a substitute for professional medical advice, diagnosis, or treatment.
</div>"#;
    layout(Page::Home, body)
}

struct Condition {
    title: &'static str,
    overview: &'static str,
    symptoms: &'static str,
    causes: &'static str,
    diagnosis: &'static str,
    treatment: &'static str,
}

const CONDITIONS: [Condition; 3] = [
    Condition {
        title: "Alzheimer's Disease",
        overview: "Alzheimer's disease is a progressive neurologic disorder that causes the brain to shrink (atrophy) and brain cells to die. Alzheimer's disease is the most common cause of dementia, a continuous decline in thinking, behavioral and social skills that affects a person's ability to function independently.",
        symptoms: "Memory loss, difficulty in planning or solving problems, difficulty completing familiar tasks, confusion with time or place, challenges in understanding visual images and spatial relationships, new problems with words in speaking or writing, misplacing things and losing the ability to retrace steps, decreased or poor judgment, withdrawal from work or social activities, changes in mood and personality.",
        causes: "The exact causes of Alzheimer's disease are not fully understood, but a combination of genetic, lifestyle, and environmental factors that affect the brain over time are implicated.",
        diagnosis: "Doctors conduct a series of tests to rule out other conditions, perform cognitive assessments, and neurological exams.",
        treatment: "Treatments can temporarily slow the worsening of symptoms and improve quality of life for those with Alzheimer's disease and their caregivers.",
    },
    Condition {
        title: "Brain Tumor",
        overview: "A brain tumor is a mass or growth of abnormal cells in your brain. Many different types of brain tumors exist. Some brain tumors are noncancerous (benign), and some brain tumors are cancerous (malignant). Brain tumors can begin in your brain (primary brain tumors), or cancer can begin in other parts of your body and spread to your brain (secondary, or metastatic, brain tumors).",
        symptoms: "Headaches, seizures, nausea, vomiting, weakness or loss of movement in a part of the body, loss of balance, speech difficulties, confusion in everyday matters, personality or behavior changes, hearing problems.",
        causes: "The causes of most brain tumors are unknown. Genetic factors, environmental exposures, or a combination thereof may play a role.",
        diagnosis: "Brain tumors are diagnosed using MRI scans, CT scans, and, if necessary, biopsy.",
        treatment: "Treatment options include surgery, radiation therapy, chemotherapy, targeted drug therapy, and immunotherapy, depending on the type, size, and location of the tumor.",
    },
    Condition {
        title: "Stroke",
        overview: "A stroke occurs when the blood supply to part of your brain is interrupted or reduced, preventing brain tissue from getting oxygen and nutrients. Brain cells begin to die in minutes. A stroke is a medical emergency, and prompt treatment is crucial. Early action can reduce brain damage and other complications.",
        symptoms: "Trouble speaking and understanding what others are saying, paralysis or numbness of the face, arm, or leg, problems seeing in one or both eyes, headache, trouble walking, dizziness, loss of balance or coordination.",
        causes: "Blocked artery (ischemic stroke) or leaking or bursting of a blood vessel (hemorrhagic stroke) are the main causes of stroke.",
        diagnosis: "Diagnosis involves medical history, physical exam, blood tests, CT scans, MRI, carotid ultrasound, cerebral angiogram, and echocardiogram.",
        treatment: "Immediate treatment aims at restoring blood flow for an ischemic stroke or controlling bleeding for a hemorrhagic stroke. Long-term treatments focus on preventing future strokes and may include medication, surgery, and lifestyle changes.",
    },
];

pub fn about() -> String {
    let mut body = String::from(
        "<h2>About Brain Diseases</h2>\n<p>Brain diseases affect millions of people each year. This section provides information on some of the most common conditions, including Alzheimer's disease, brain tumors, and strokes. Click on each section below to learn more.</p>\n",
    );

    for condition in &CONDITIONS {
        body.push_str(&format!(
            "<details>\n<summary>{}</summary>\n<p>{}</p>\n<p><strong>Symptoms:</strong> {}</p>\n<p><strong>Causes:</strong> {}</p>\n<p><strong>Diagnosis:</strong> {}</p>\n<p><strong>Treatment:</strong> {}</p>\n</details>\n",
            condition.title,
            condition.overview,
            condition.symptoms,
            condition.causes,
            condition.diagnosis,
            condition.treatment
        ));
    }

    layout(Page::About, &body)
}

/// The classify form, pre-filled from `form`, with an optional notice above it
pub fn classify_form(form: &ClassifyForm, notice: Option<&str>) -> String {
    let options: String = TestType::ALL
        .iter()
        .map(|test_type| {
            let selected = if form.test_type == Some(*test_type) { " selected" } else { "" };
            format!(
                r#"<option value="{}"{}>{}</option>"#,
                test_type.slug(),
                selected,
                escape(test_type.label())
            )
        })
        .collect();

    let notice = notice
        .map(|text| format!(r#"<p class="notice">{}</p>"#, escape(text)))
        .unwrap_or_default();

    let body = format!(
        r#"<h2>Classify Your Brain Scan</h2>
{notice}
<form method="post" action="/classify" enctype="multipart/form-data">
<label>Patient Name: <input type="text" name="patient_name" value="{name}"></label>
<label>Patient Age: <input type="text" name="patient_age" value="{age}"></label>
<label>Select the type of test you want to take:
<select name="test_type">{options}</select></label>
<label>Upload your MRI scan image
<input type="file" name="scan" accept=".jpg,.jpeg,.png"></label>
<p><button type="submit">Classify</button></p>
</form>"#,
        notice = notice,
        name = escape(&form.patient_name),
        age = escape(&form.patient_age),
        options = options
    );

    layout(Page::Classify, &body)
}

/// Prediction, rendered report and a download button for it
pub fn classify_result(file_name: &str, prediction: &Prediction, report: &Report) -> String {
    let body = format!(
        r#"<h2>Classify Your Brain Scan</h2>
<p>Uploaded MRI scan: {file_name}</p>
<p class="result">Prediction: {label}</p>
<pre>{report}</pre>
<form method="post" action="/report">
<input type="hidden" name="patient_name" value="{name}">
<input type="hidden" name="patient_age" value="{age}">
<input type="hidden" name="test_type" value="{test_type}">
<input type="hidden" name="prediction" value="{label}">
<button type="submit">Download Report</button> <small>{report_file}</small>
</form>
<p><a href="/classify">Classify another scan</a></p>"#,
        file_name = escape(file_name),
        label = prediction.label,
        report = escape(&report.render()),
        name = escape(&report.patient_name),
        age = escape(&report.patient_age),
        test_type = report.test_type.slug(),
        report_file = REPORT_FILE_NAME
    );

    layout(Page::Classify, &body)
}

/// A visible error shown inside the normal layout
pub fn error(current: Page, title: &str, message: &str) -> String {
    let body = format!(
        r#"<h2>{}</h2>
<p class="error">{}</p>
<p><a href="/?page={}">Back</a></p>"#,
        escape(title),
        escape(message),
        current.slug()
    );
    layout(current, &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use brain_classifier::{ConditionLabel, Decision};
    use std::time::Duration;

    #[test]
    fn test_escape() {
        assert_eq!(escape(r#"<b>"Tom" & 'Jerry'</b>"#), "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;");
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn test_layout_marks_current_page() {
        let html = layout(Page::About, "<p>body</p>");
        assert!(html.contains(r#"value="about" class="active""#));
        assert!(html.contains(r#"<input type="hidden" name="page" value="about">"#));
        assert!(html.contains("<p>body</p>"));
    }

    #[test]
    fn test_about_lists_every_condition() {
        let html = about();
        assert!(html.contains("<summary>Alzheimer's Disease</summary>"));
        assert!(html.contains("<summary>Brain Tumor</summary>"));
        assert!(html.contains("<summary>Stroke</summary>"));
    }

    #[test]
    fn test_classify_form_escapes_prefill() {
        let form = ClassifyForm {
            patient_name: "<script>".to_string(),
            patient_age: "40".to_string(),
            test_type: Some(TestType::BrainStroke),
            upload: None,
        };
        let html = classify_form(&form, Some("Missing scan"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
        assert!(html.contains(r#"<option value="brain_stroke" selected>"#));
        assert!(html.contains("Missing scan"));
    }

    #[test]
    fn test_result_carries_download_fields() {
        let prediction = Prediction::new(vec![0.2, 0.8], Decision::ArgMax, Duration::from_millis(3)).unwrap();
        let report = Report::new("Jane", "40", TestType::Tumor, ConditionLabel::Positive);
        let html = classify_result("scan.png", &prediction, &report);

        assert!(html.contains("Prediction: Condition Positive"));
        assert!(html.contains(r#"name="test_type" value="tumor""#));
        assert!(html.contains(r#"name="prediction" value="Condition Positive""#));
        assert!(html.contains("Patient Name: Jane"));
    }
}
