use tracing::debug;

use crate::models::{BiomarkerField, ConsolidatedRecord, StageBucket, Subtype, normalize_stage};

/// Stage every biomarker-only derivation is anchored to
pub const DERIVED_STAGE_ANCHOR: StageBucket = StageBucket::StageII;

/// Stage deriver: a stage computed from biomarkers alone
///
/// The result is always anchored at Stage II; it selects a package family
/// and makes no claim about anatomic stage.
pub fn derive_stage(record: &ConsolidatedRecord) -> String {
    match Subtype::from_record(record) {
        Some(subtype) => format!("{} {}", DERIVED_STAGE_ANCHOR.label(), subtype.suffix()),
        None => DERIVED_STAGE_ANCHOR.label().to_string(),
    }
}

/// Record as exposed to callers: a missing stage is replaced by the derived one
pub fn fill_missing_stage(mut record: ConsolidatedRecord) -> ConsolidatedRecord {
    if record.meaningful(BiomarkerField::Stage).is_none() {
        let derived = derive_stage(&record);
        debug!(stage = %derived, "No stage in reports; using derived stage");
        record.set(BiomarkerField::Stage, &derived);
    }
    record
}

/// Stage the resolver works from: a caller override, or the calculated one
///
/// Bare tokens ("3", "iv", "DCIS") are normalized; labels that already carry
/// a subtype are kept as given.
pub fn confirm_user_stage(calculated: &str, user_stage: Option<&str>) -> String {
    match user_stage.map(str::trim).filter(|s| !s.is_empty()) {
        Some(stage) => normalize_stage(stage)
            .map(str::to_string)
            .unwrap_or_else(|| stage.to_string()),
        None => calculated.to_string(),
    }
}
