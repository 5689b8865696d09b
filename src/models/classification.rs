use serde::Serialize;

/// Terminal output of one submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    /// Stage derived from biomarkers alone
    pub calculated_stage: String,
    /// Stage confirmed by the patient; defaults to `calculated_stage`
    pub user_stage: String,
    /// Base package first, then biomarker-targeted add-ons
    pub packages: Vec<String>,
    /// Resource-table key, empty when nothing matched
    pub resource_key: String,
}
