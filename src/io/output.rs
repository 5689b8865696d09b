use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::{AnalyzedDocument, BiomarkerField, Classification, ConsolidatedRecord};
use crate::stages::ResourceTable;

/// Machine-readable result of one submission
#[derive(Debug, Clone, Serialize)]
pub struct ClassificationReport {
    pub submission_id: Uuid,
    pub generated_at: DateTime<Utc>,
    /// Per-document detections, in input order
    pub documents: Vec<AnalyzedDocument>,
    /// Consolidated record; unresolved fields read "Not tested"
    pub record: ConsolidatedRecord,
    pub classification: Classification,
    /// Link for `classification.resource_key`, if the table has one
    pub resource_url: Option<String>,
}

impl ClassificationReport {
    pub fn new(
        documents: Vec<AnalyzedDocument>,
        record: ConsolidatedRecord,
        classification: Classification,
        resources: &ResourceTable,
    ) -> Self {
        let resource_url = resources
            .get(&classification.resource_key)
            .map(str::to_string);
        Self {
            submission_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            documents,
            record,
            classification,
            resource_url,
        }
    }

    /// Write to a JSON file
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create file: {:?}", path))?;
        serde_json::to_writer_pretty(file, self).context("Failed to write JSON")?;
        Ok(())
    }
}

/// Plain-text summary for patients and care navigators
pub struct HumanSummary<'a> {
    report: &'a ClassificationReport,
}

impl<'a> HumanSummary<'a> {
    pub fn new(report: &'a ClassificationReport) -> Self {
        Self { report }
    }

    pub fn format(&self) -> String {
        let report = self.report;
        let classification = &report.classification;
        let mut output = String::new();

        output.push_str(&section("Biomarker Classification"));
        output.push_str(&format!("Submission: {}\n", report.submission_id));
        output.push_str(&format!("Generated:  {}\n\n", report.generated_at.to_rfc3339()));

        output.push_str(&section("Stage"));
        output.push_str(&format!(
            "Calculated stage: {}\n",
            classification.calculated_stage
        ));
        output.push_str(&format!("Confirmed stage:  {}\n\n", classification.user_stage));

        let (patient, markers): (Vec<_>, Vec<_>) = BiomarkerField::ALL
            .into_iter()
            .partition(|f| f.is_demographic());
        for (title, fields) in [("Patient", patient), ("Biomarkers", markers)] {
            output.push_str(&section(title));
            for field in fields {
                output.push_str(&format!(
                    "{:<20}{}\n",
                    field.label(),
                    report.record.display(field)
                ));
            }
            output.push('\n');
        }

        output.push_str(&section("Packages"));
        if classification.packages.is_empty() {
            output.push_str("None\n");
        }
        for package in &classification.packages {
            output.push_str(&format!("- {}\n", package));
        }
        output.push('\n');

        output.push_str(&section("Resource"));
        let resource = match (&report.resource_url, classification.resource_key.is_empty()) {
            (Some(url), _) => format!("{}: {}", classification.resource_key, url),
            (None, true) => "No matching resource".to_string(),
            (None, false) => classification.resource_key.clone(),
        };
        output.push_str(&resource);
        output.push_str("\n\n");

        output.push_str(&section("Documents"));
        for doc in &report.documents {
            let date = doc
                .meta
                .report_date
                .map(|d| d.to_string())
                .unwrap_or_else(|| "undated".to_string());
            output.push_str(&format!(
                "{} ({}, {}): {} fields detected\n",
                doc.source,
                doc.meta.report_type.as_str(),
                date,
                doc.detected.detected_count()
            ));
        }

        output
    }

    /// Write to a text file
    pub fn write_file(&self, path: &Path) -> Result<()> {
        let mut file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create file: {:?}", path))?;
        write!(file, "{}", self.format())?;
        Ok(())
    }
}

/// Title underlined with dashes
fn section(title: &str) -> String {
    format!("{}\n{}\n", title, "-".repeat(title.chars().count()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExtractionResult, ReportMetadata, ReportType};
    use chrono::NaiveDate;

    fn sample_report() -> ClassificationReport {
        let documents = vec![AnalyzedDocument {
            source: "path.txt".to_string(),
            meta: ReportMetadata {
                report_type: ReportType::Pathology,
                report_date: NaiveDate::from_ymd_opt(2024, 2, 10),
            },
            detected: [(BiomarkerField::Erpr, "ER– & PR–".to_string())]
                .into_iter()
                .collect::<ExtractionResult>(),
        }];
        let record: ConsolidatedRecord = [(BiomarkerField::Erpr, "ER– & PR–")].into_iter().collect();
        let classification = Classification {
            calculated_stage: "Stage II TNBC".to_string(),
            user_stage: "Stage II TNBC".to_string(),
            packages: vec!["Core package for Stage II (TNBC)".to_string()],
            resource_key: "Stage II TNBC".to_string(),
        };
        ClassificationReport::new(documents, record, classification, &ResourceTable::default())
    }

    #[test]
    fn test_report_json_shape() {
        let report = sample_report();
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["classification"]["calculated_stage"], "Stage II TNBC");
        assert_eq!(json["record"]["ERPR"], "ER– & PR–");
        assert_eq!(json["record"]["HER2"], "Not tested");
        assert_eq!(json["documents"][0]["report_type"], "pathology");
        assert_eq!(json["documents"][0]["report_date"], "2024-02-10");
        assert_eq!(json["documents"][0]["detected"]["HER2"], "Not available");
        assert!(json["resource_url"].as_str().unwrap().starts_with("https://"));
    }

    #[test]
    fn test_write_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        sample_report().write_json(&path).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["classification"]["resource_key"], "Stage II TNBC");
    }

    #[test]
    fn test_human_summary() {
        let report = sample_report();
        let text = HumanSummary::new(&report).format();

        assert!(text.contains("Calculated stage: Stage II TNBC"));
        assert!(text.contains("Patient\n-------\nProvince/State      Not tested"));
        assert!(text.contains("ER/PR status        ER– & PR–"));
        assert!(text.contains("- Core package for Stage II (TNBC)"));
        assert!(text.contains("path.txt (pathology, 2024-02-10): 1 fields detected"));
        assert!(text.contains("Stage II TNBC: https://"));
        assert!(text.starts_with("Biomarker Classification\n------------------------\n"));
    }
}
