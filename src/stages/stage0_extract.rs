use chrono::NaiveDate;
use tracing::debug;

use crate::models::{
    AnalyzedDocument, BiomarkerField, ExtractionResult, ReportMetadata, ReportType, SourceDocument,
};
use crate::rules::report::{REPORT_DATE_RULES, classify_report_text};
use crate::rules::{ExtractionConfig, RuleContext, extract_field, first_match};

/// Field extractor: run every field's rule list over the text
///
/// Each field is resolved independently; unmatched fields are left out of
/// the result rather than failing.
pub fn extract(text: &str, config: &ExtractionConfig) -> ExtractionResult {
    BiomarkerField::ALL
        .into_iter()
        .filter_map(|field| extract_field(field, text, config).map(|value| (field, value)))
        .collect()
}

/// Report classifier
pub fn classify_report(text: &str) -> ReportType {
    classify_report_text(text)
}

/// Best-effort report date from labelled fields
pub fn extract_report_date(text: &str, config: &ExtractionConfig) -> Option<NaiveDate> {
    first_match(&REPORT_DATE_RULES, &RuleContext { text, config })
}

/// Metadata for a document; a caller-supplied date beats extraction
pub fn report_metadata(document: &SourceDocument, config: &ExtractionConfig) -> ReportMetadata {
    ReportMetadata {
        report_type: classify_report(&document.text),
        report_date: document
            .report_date_hint
            .or_else(|| extract_report_date(&document.text, config)),
    }
}

/// Perform Stage 0 on one document: extraction plus classification
pub fn analyze_document(document: &SourceDocument, config: &ExtractionConfig) -> AnalyzedDocument {
    let detected = extract(&document.text, config);
    let meta = report_metadata(document, config);

    debug!(
        source = %document.source,
        report_type = meta.report_type.as_str(),
        report_date = ?meta.report_date,
        "Detected {} of {} fields",
        detected.detected_count(),
        BiomarkerField::ALL.len()
    );

    AnalyzedDocument {
        source: document.source.clone(),
        meta,
        detected,
    }
}
