use chrono::NaiveDate;

use oncoclass::{
    BiomarkerField, ExtractionConfig, ReportType, ResourceTable, SourceDocument, analyze_document,
    classify, derive_stage, merge, process_submission, resolve,
};

const TNBC_PATHOLOGY: &str = r#"
SURGICAL PATHOLOGY REPORT
Specimen: Left breast, core biopsy
Report Date: 2024-03-18

Invasive ductal carcinoma, grade 3.

Estrogen receptor (ER): NEGATIVE, 0% nuclear staining
PR: Negative
HER2 (IHC): 1+
"#;

const HORMONE_POSITIVE_PATHOLOGY: &str = r#"
PATHOLOGY CONSULTATION
Date Received: 01/05/2023

Estrogen receptor: Positive (95%)
Progesterone receptor: Positive (60%)
HER2 (IHC): 3+
"#;

const GERMLINE_REPORT: &str = r#"
Invitae Multi-Cancer Panel - Germline Genetic Test Result
Report Date: April 2, 2024

BRCA2: Pathogenic variant detected (c.5946delT)
HER2: Positive
"#;

fn config() -> ExtractionConfig {
    ExtractionConfig {
        reference_year: 2025,
        ..Default::default()
    }
}

fn analyzed(source: &str, text: &str) -> oncoclass::AnalyzedDocument {
    analyze_document(&SourceDocument::new(source, text), &config())
}

#[test]
fn tnbc_text_end_to_end() {
    let doc = analyzed("pathology.txt", TNBC_PATHOLOGY);
    assert_eq!(doc.meta.report_type, ReportType::Pathology);
    assert_eq!(doc.meta.report_date, NaiveDate::from_ymd_opt(2024, 3, 18));
    assert_eq!(doc.detected.get(BiomarkerField::Erpr), Some("ER– & PR–"));

    let record = merge(&[doc]);
    assert_eq!(record.get(BiomarkerField::Stage), None);
    assert_eq!(derive_stage(&record), "Stage II TNBC");

    let resolution = resolve("Stage II TNBC", &record, &ResourceTable::default());
    assert!(
        resolution
            .packages
            .contains(&"Core package for Stage II (TNBC)".to_string())
    );
    assert_eq!(resolution.resource_key, "Stage II TNBC");
}

#[test]
fn merge_is_idempotent_for_real_documents() {
    let doc = analyzed("pathology.txt", HORMONE_POSITIVE_PATHOLOGY);
    assert_eq!(merge(&[doc.clone()]), merge(&[doc.clone(), doc]));
}

#[test]
fn newer_report_wins_regardless_of_upload_order() {
    let older = analyzed("2023.txt", HORMONE_POSITIVE_PATHOLOGY);
    let newer = analyzed("2024.txt", TNBC_PATHOLOGY);

    let forward = merge(&[older.clone(), newer.clone()]);
    let backward = merge(&[newer, older]);

    assert_eq!(forward.get(BiomarkerField::Erpr), Some("ER– & PR–"));
    assert_eq!(backward.get(BiomarkerField::Erpr), Some("ER– & PR–"));
    assert_eq!(forward, backward);
}

#[test]
fn genetic_report_only_contributes_brca() {
    let pathology = analyzed("pathology.txt", TNBC_PATHOLOGY);
    let genetics = analyzed("genetics.txt", GERMLINE_REPORT);
    assert_eq!(genetics.meta.report_type, ReportType::Genetic);
    assert_eq!(genetics.detected.get(BiomarkerField::Her2), Some("HER-2 High (3+)"));

    let record = merge(&[pathology, genetics]);
    assert_eq!(record.get(BiomarkerField::Her2), Some("HER-2 Low (1+ or 2+)"));
    assert_eq!(record.get(BiomarkerField::Brca), Some("BRCA2+"));

    let classification = classify(&record, None, &ResourceTable::default());
    assert_eq!(classification.calculated_stage, "Stage II BRCA+");
    assert_eq!(
        classification.packages,
        vec!["Stage II BRCA+ package", "PARP inhibitors"]
    );
}

#[test]
fn hormone_and_her2_high_derivation() {
    let record = merge(&[analyzed("pathology.txt", HORMONE_POSITIVE_PATHOLOGY)]);
    assert_eq!(derive_stage(&record), "Stage II ER+/PR+/HER2+");
}

#[test]
fn resource_falls_back_to_bare_stage() {
    let record = merge(&[analyzed("pathology.txt", HORMONE_POSITIVE_PATHOLOGY)]);
    let table: ResourceTable = [
        ("Stage II".to_string(), "https://example.org/ii".to_string()),
        ("Stage III".to_string(), "https://example.org/iii".to_string()),
    ]
    .into_iter()
    .collect();

    let resolution = resolve("Stage III ER+/PR+/HER2+", &record, &table);
    assert_eq!(resolution.resource_key, "Stage III");
}

#[test]
fn extracted_stage_stays_on_record_and_user_override_drives_packages() {
    let text = format!("{TNBC_PATHOLOGY}\nPathologic Stage: IIIB\n");
    let documents = [SourceDocument::new("staged.txt", text)];

    let submission = process_submission(&documents, None, &config(), &ResourceTable::default());
    assert_eq!(submission.record.get(BiomarkerField::Stage), Some("Stage III"));
    assert_eq!(submission.classification.calculated_stage, "Stage II TNBC");
    assert_eq!(submission.classification.user_stage, "Stage II TNBC");
    assert_eq!(
        submission.classification.packages,
        vec!["Core package for Stage II (TNBC)"]
    );

    let submission =
        process_submission(&documents, Some("4"), &config(), &ResourceTable::default());
    assert_eq!(submission.classification.calculated_stage, "Stage II TNBC");
    assert_eq!(submission.classification.user_stage, "Stage IV");
    assert_eq!(submission.classification.packages, vec!["Core package for Stage IV"]);
    assert_eq!(submission.classification.resource_key, "Stage IV");
}

#[test]
fn empty_submission_degrades_to_plain_anchor() {
    let submission = process_submission(&[], None, &config(), &ResourceTable::default());

    assert!(submission.documents.is_empty());
    assert_eq!(submission.record.display(BiomarkerField::Erpr), "Not tested");
    assert_eq!(submission.record.get(BiomarkerField::Stage), Some("Stage II"));
    assert_eq!(submission.classification.calculated_stage, "Stage II");
    assert_eq!(
        submission.classification.packages,
        vec!["Core package for Stage II (TNBC)"]
    );
    assert_eq!(submission.classification.resource_key, "Stage II");
}
