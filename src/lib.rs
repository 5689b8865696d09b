pub mod io;
pub mod models;
pub mod rules;
pub mod stages;

pub use io::{ClassificationReport, HumanSummary, InputError, load_documents, load_resource_table};
pub use models::{
    AnalyzedDocument, BiomarkerField, Classification, ConsolidatedRecord, ExtractionResult,
    ReportMetadata, ReportType, SourceDocument, StageBucket, Subtype,
};
pub use rules::ExtractionConfig;
pub use stages::{
    ResourceTable, Submission, analyze_document, classify, derive_stage, extract,
    finish_submission, merge, process_submission, resolve,
};
