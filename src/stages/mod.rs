pub mod stage0_extract;
pub mod stage1_merge;
pub mod stage2_derive;
pub mod stage3_resolve;

pub use stage0_extract::*;
pub use stage1_merge::*;
pub use stage2_derive::*;
pub use stage3_resolve::*;

use crate::models::{AnalyzedDocument, Classification, ConsolidatedRecord, SourceDocument};
use crate::rules::ExtractionConfig;

/// Everything one submission produces
#[derive(Debug, Clone)]
pub struct Submission {
    pub documents: Vec<AnalyzedDocument>,
    pub record: ConsolidatedRecord,
    pub classification: Classification,
}

/// Run all four stages over loaded documents on the current thread
pub fn process_submission(
    documents: &[SourceDocument],
    user_stage: Option<&str>,
    config: &ExtractionConfig,
    resources: &ResourceTable,
) -> Submission {
    let analyzed: Vec<AnalyzedDocument> = documents
        .iter()
        .map(|doc| analyze_document(doc, config))
        .collect();
    finish_submission(analyzed, user_stage, resources)
}

/// Merge already-analyzed documents and classify the result
pub fn finish_submission(
    documents: Vec<AnalyzedDocument>,
    user_stage: Option<&str>,
    resources: &ResourceTable,
) -> Submission {
    let record = fill_missing_stage(merge(&documents));
    let classification = classify(&record, user_stage, resources);
    Submission {
        documents,
        record,
        classification,
    }
}
