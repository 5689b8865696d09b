use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::record::ConsolidatedRecord;

static STAGE_IN_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bstage\s*(IV|III|II|I|0|[1-4])(?:[ABC])?\b").expect("valid regex")
});

/// Anatomic stage without biomarker qualifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StageBucket {
    /// Ductal carcinoma in situ
    Stage0,
    StageI,
    StageII,
    StageIII,
    StageIV,
}

impl StageBucket {
    /// Canonical display label
    pub fn label(self) -> &'static str {
        match self {
            StageBucket::Stage0 => "DCIS / Stage 0",
            StageBucket::StageI => "Stage I",
            StageBucket::StageII => "Stage II",
            StageBucket::StageIII => "Stage III",
            StageBucket::StageIV => "Stage IV",
        }
    }

    /// Map a raw stage token ("0", "II", "DCIS", "3", ...) to a bucket
    pub fn from_token(token: &str) -> Option<Self> {
        let compact: String = token.chars().filter(|c| !c.is_whitespace()).collect();
        let upper = compact.to_uppercase();
        let upper = upper.strip_prefix("STAGE").unwrap_or(upper.as_str());
        match upper {
            "0" | "DCIS" | "TIS" => Some(StageBucket::Stage0),
            "I" | "1" => Some(StageBucket::StageI),
            "II" | "2" => Some(StageBucket::StageII),
            "III" | "3" => Some(StageBucket::StageIII),
            "IV" | "4" => Some(StageBucket::StageIV),
            _ => None,
        }
    }

    /// Find the leading bucket in a free-form label such as "Stage III ER+/PR+"
    pub fn from_label(label: &str) -> Option<Self> {
        if let Some(caps) = STAGE_IN_LABEL.captures(label) {
            return Self::from_token(&caps[1]);
        }
        if let Some(bucket) = Self::from_token(label) {
            return Some(bucket);
        }
        if label.to_uppercase().contains("DCIS") {
            return Some(StageBucket::Stage0);
        }
        None
    }

    /// Buckets that branch on biomarker subtype
    pub fn has_subtypes(self) -> bool {
        matches!(
            self,
            StageBucket::StageII | StageBucket::StageIII | StageBucket::StageIV
        )
    }
}

/// Stage normalizer: raw token to canonical stage label
pub fn normalize_stage(token: &str) -> Option<&'static str> {
    StageBucket::from_token(token).map(StageBucket::label)
}

/// Biomarker-driven qualifier attached to a stage label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Subtype {
    HormoneHer2High,
    HormoneHer2Low,
    Hormone,
    Her2,
    Brca,
    TripleNegative,
}

impl Subtype {
    /// Suffix as it appears in stage labels and resource keys
    pub fn suffix(self) -> &'static str {
        match self {
            Subtype::HormoneHer2High => "ER+/PR+/HER2+",
            Subtype::HormoneHer2Low => "ER+/PR+/HER2 Low",
            Subtype::Hormone => "ER+/PR+",
            Subtype::Her2 => "HER-2+",
            Subtype::Brca => "BRCA+",
            Subtype::TripleNegative => "TNBC",
        }
    }

    /// Every subtype the record supports, in decision order
    pub fn candidates(record: &ConsolidatedRecord) -> Vec<Subtype> {
        let hormone = record.hormone_positive();
        let high = record.her2_high();
        let low = record.her2_low();

        let mut out = Vec::new();
        if hormone && high {
            out.push(Subtype::HormoneHer2High);
        }
        if hormone && low {
            out.push(Subtype::HormoneHer2Low);
        }
        if hormone && !high && !low {
            out.push(Subtype::Hormone);
        }
        if high && !hormone {
            out.push(Subtype::Her2);
        }
        if record.brca_positive() {
            out.push(Subtype::Brca);
        }
        if record.hormone_negative() && !high {
            out.push(Subtype::TripleNegative);
        }
        out
    }

    /// First applicable subtype for a record
    pub fn from_record(record: &ConsolidatedRecord) -> Option<Subtype> {
        Self::candidates(record).into_iter().next()
    }

    /// Read the subtype a stage label carries, if any
    pub fn from_label(label: &str) -> Option<Subtype> {
        let upper = label.to_uppercase().replace("ER/PR+", "ER+/PR+");
        if upper.contains("BRCA+") {
            Some(Subtype::Brca)
        } else if upper.contains("ER+/PR+/HER2+") {
            Some(Subtype::HormoneHer2High)
        } else if upper.contains("ER+/PR+/HER2 LOW") {
            Some(Subtype::HormoneHer2Low)
        } else if upper.contains("HER-2+") || upper.contains("HER2+") {
            Some(Subtype::Her2)
        } else if upper.contains("ER+/PR+") {
            Some(Subtype::Hormone)
        } else if upper.contains("TNBC") {
            Some(Subtype::TripleNegative)
        } else {
            None
        }
    }
}

/// Resource-table key combining a stage and a subtype, e.g. "Stage II BRCA+"
pub fn compound_key(bucket: StageBucket, subtype: Subtype) -> String {
    format!("{} {}", bucket.label(), subtype.suffix())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BiomarkerField;

    #[test]
    fn test_normalize_stage_tokens() {
        assert_eq!(normalize_stage("0"), Some("DCIS / Stage 0"));
        assert_eq!(normalize_stage("DCIS"), Some("DCIS / Stage 0"));
        assert_eq!(normalize_stage("ii"), Some("Stage II"));
        assert_eq!(normalize_stage("III"), Some("Stage III"));
        assert_eq!(normalize_stage("Stage IV"), Some("Stage IV"));
        assert_eq!(normalize_stage("2"), Some("Stage II"));
        assert_eq!(normalize_stage("V"), None);
        assert_eq!(normalize_stage(""), None);
    }

    #[test]
    fn test_bucket_from_label() {
        assert_eq!(StageBucket::from_label("Stage III ER+/PR+"), Some(StageBucket::StageIII));
        assert_eq!(StageBucket::from_label("Stage IIIA"), Some(StageBucket::StageIII));
        assert_eq!(StageBucket::from_label("Stage II TNBC"), Some(StageBucket::StageII));
        assert_eq!(StageBucket::from_label("Stage I"), Some(StageBucket::StageI));
        assert_eq!(StageBucket::from_label("DCIS / Stage 0"), Some(StageBucket::Stage0));
        assert_eq!(StageBucket::from_label("iv"), Some(StageBucket::StageIV));
        assert_eq!(StageBucket::from_label("Not sure"), None);
    }

    #[test]
    fn test_subtype_from_label_prefers_longest_qualifier() {
        assert_eq!(Subtype::from_label("Stage II ER+/PR+/HER2+"), Some(Subtype::HormoneHer2High));
        assert_eq!(Subtype::from_label("Stage II ER+/PR+/HER2 Low"), Some(Subtype::HormoneHer2Low));
        assert_eq!(Subtype::from_label("Stage IV ER/PR+"), Some(Subtype::Hormone));
        assert_eq!(Subtype::from_label("Stage III HER-2+"), Some(Subtype::Her2));
        assert_eq!(Subtype::from_label("Stage II BRCA+"), Some(Subtype::Brca));
        assert_eq!(Subtype::from_label("Stage II TNBC"), Some(Subtype::TripleNegative));
        assert_eq!(Subtype::from_label("Stage III"), None);
    }

    #[test]
    fn test_candidates_follow_decision_order() {
        let record: ConsolidatedRecord = [
            (BiomarkerField::Erpr, "ER+ & PR–"),
            (BiomarkerField::Her2, "HER-2 High (3+)"),
            (BiomarkerField::Brca, "BRCA1+"),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            Subtype::candidates(&record),
            vec![Subtype::HormoneHer2High, Subtype::Brca]
        );
        assert_eq!(Subtype::from_record(&ConsolidatedRecord::default()), None);
    }

    #[test]
    fn test_compound_key() {
        assert_eq!(compound_key(StageBucket::StageII, Subtype::Brca), "Stage II BRCA+");
        assert_eq!(
            compound_key(StageBucket::StageIV, Subtype::HormoneHer2High),
            "Stage IV ER+/PR+/HER2+"
        );
    }
}
