use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use super::field::{BiomarkerField, NOT_AVAILABLE};

/// Per-document extraction output
///
/// Fields no rule resolved are simply absent; they surface as
/// `NOT_AVAILABLE` only when serialized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionResult {
    values: BTreeMap<BiomarkerField, String>,
}

impl ExtractionResult {
    /// Value detected for a field, if any
    pub fn get(&self, field: BiomarkerField) -> Option<&str> {
        self.values.get(&field).map(String::as_str)
    }

    /// Value for display, with the sentinel standing in for absence
    pub fn display(&self, field: BiomarkerField) -> &str {
        self.get(field).unwrap_or(NOT_AVAILABLE)
    }

    /// Detected fields in panel order
    pub fn detected(&self) -> impl Iterator<Item = (BiomarkerField, &str)> {
        self.values.iter().map(|(f, v)| (*f, v.as_str()))
    }

    /// Number of fields that resolved to a value
    pub fn detected_count(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(BiomarkerField, String)> for ExtractionResult {
    fn from_iter<I: IntoIterator<Item = (BiomarkerField, String)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl Serialize for ExtractionResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(BiomarkerField::ALL.len()))?;
        for field in BiomarkerField::ALL {
            map.serialize_entry(field.key(), self.display(field))?;
        }
        map.end()
    }
}

/// Kind of source report, used to gate which fields it may contribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    /// Histology / immunohistochemistry report
    Pathology,
    /// Germline genetic-testing report
    Genetic,
}

impl ReportType {
    /// Whether a report of this type may assert the given field
    pub fn allows(self, field: BiomarkerField) -> bool {
        match self {
            ReportType::Genetic => field == BiomarkerField::Brca,
            ReportType::Pathology => field != BiomarkerField::Brca,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReportType::Pathology => "pathology",
            ReportType::Genetic => "genetic",
        }
    }
}

/// Metadata derived from a document independently of its fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReportMetadata {
    pub report_type: ReportType,
    /// Best-effort report date; `None` sorts before every real date
    pub report_date: Option<NaiveDate>,
}

/// OCR'd text of one uploaded document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    /// Where the document came from (file name, object key, ...)
    pub source: String,
    /// Plain text produced by the upstream OCR step
    pub text: String,
    /// MIME type declared by the uploader, if known
    pub mime_type: Option<String>,
    /// Report date supplied by the caller; overrides date extraction
    pub report_date_hint: Option<NaiveDate>,
}

impl SourceDocument {
    pub fn new(source: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            text: text.into(),
            mime_type: None,
            report_date_hint: None,
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    pub fn with_report_date(mut self, date: NaiveDate) -> Self {
        self.report_date_hint = Some(date);
        self
    }
}

/// A document after extraction and classification, ready to be merged
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalyzedDocument {
    pub source: String,
    #[serde(flatten)]
    pub meta: ReportMetadata,
    pub detected: ExtractionResult,
}
