use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::models::{AnalyzedDocument, BiomarkerField, ConsolidatedRecord, is_meaningful};

/// Accumulator for the multi-document merge
///
/// Each field remembers the report date of the document that last wrote a
/// meaningful value into it. `None` is an undated document and orders before
/// every real date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeState {
    record: ConsolidatedRecord,
    watermarks: BTreeMap<BiomarkerField, Option<NaiveDate>>,
    documents_merged: usize,
}

impl MergeState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one document into the state
    pub fn absorb(mut self, document: &AnalyzedDocument) -> Self {
        let report_type = document.meta.report_type;
        let date = document.meta.report_date;

        for (field, value) in document.detected.detected() {
            if !report_type.allows(field) {
                debug!(
                    source = %document.source,
                    field = field.key(),
                    "Ignoring field outside {} report scope",
                    report_type.as_str()
                );
                continue;
            }

            let current_meaningful = self.record.meaningful(field).is_some();
            if is_meaningful(value) {
                let newer = self
                    .watermarks
                    .get(&field)
                    .is_none_or(|watermark| date >= *watermark);
                if !current_meaningful || newer {
                    self.record.set(field, value);
                    self.watermarks.insert(field, date);
                }
            } else if !current_meaningful {
                // An explicit "not tested" still beats silence
                self.record.set(field, value);
            }
        }

        self.documents_merged += 1;
        self
    }

    /// Date of the last meaningful write to a field
    pub fn watermark(&self, field: BiomarkerField) -> Option<NaiveDate> {
        self.watermarks.get(&field).copied().flatten()
    }

    pub fn documents_merged(&self) -> usize {
        self.documents_merged
    }

    pub fn record(&self) -> &ConsolidatedRecord {
        &self.record
    }

    /// Drop the watermarks and hand back the record
    pub fn finish(self) -> ConsolidatedRecord {
        self.record
    }
}

/// Multi-document merger: sequential fold in input order
pub fn merge(documents: &[AnalyzedDocument]) -> ConsolidatedRecord {
    let state = documents.iter().fold(MergeState::new(), MergeState::absorb);

    let resolved = BiomarkerField::ALL
        .iter()
        .filter(|f| state.record().meaningful(**f).is_some())
        .count();
    info!(
        "Merged {} documents; {} of {} fields carry a result",
        state.documents_merged(),
        resolved,
        BiomarkerField::ALL.len()
    );

    state.finish()
}
