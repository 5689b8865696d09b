use std::collections::BTreeMap;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use super::field::{BiomarkerField, NOT_TESTED, is_meaningful};

/// Consolidated patient record produced by merging every document
///
/// Absent fields are exposed as `NOT_TESTED` at the serialization
/// boundary; internally they stay absent so nothing string-matches on
/// the placeholder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsolidatedRecord {
    values: BTreeMap<BiomarkerField, String>,
}

impl ConsolidatedRecord {
    /// Reported value for a field, including low-information answers
    pub fn get(&self, field: BiomarkerField) -> Option<&str> {
        self.values.get(&field).map(String::as_str)
    }

    /// Reported value only if it carries clinical information
    pub fn meaningful(&self, field: BiomarkerField) -> Option<&str> {
        self.get(field).filter(|v| is_meaningful(v))
    }

    /// Value for display; unresolved fields read as "Not tested"
    pub fn display(&self, field: BiomarkerField) -> &str {
        self.get(field).unwrap_or(NOT_TESTED)
    }

    pub(crate) fn set(&mut self, field: BiomarkerField, value: &str) {
        self.values.insert(field, value.to_string());
    }

    /// ER or PR reported positive
    pub fn hormone_positive(&self) -> bool {
        self.get(BiomarkerField::Erpr)
            .is_some_and(|v| v.contains("ER+") || v.contains("PR+"))
    }

    /// Both ER and PR reported negative
    pub fn hormone_negative(&self) -> bool {
        self.meaningful(BiomarkerField::Erpr).is_some_and(|v| {
            let v = v.replace('–', "-");
            v.contains("ER-") && v.contains("PR-")
        })
    }

    pub fn her2_high(&self) -> bool {
        self.meaningful(BiomarkerField::Her2).is_some_and(|v| {
            let lower = v.to_lowercase();
            v.contains("3+") || lower.contains("high") || lower == "positive"
        })
    }

    pub fn her2_low(&self) -> bool {
        !self.her2_high()
            && self.meaningful(BiomarkerField::Her2).is_some_and(|v| {
                v.contains("1+") || v.contains("2+") || v.to_lowercase().contains("low")
            })
    }

    /// Any pathogenic BRCA1/BRCA2 finding
    pub fn brca_positive(&self) -> bool {
        self.meaningful(BiomarkerField::Brca).is_some_and(|v| {
            v.contains('+') || v.eq_ignore_ascii_case("both") || v.eq_ignore_ascii_case("positive")
        })
    }

    pub fn pik3ca_positive(&self) -> bool {
        self.reported_positive(BiomarkerField::Pik3ca)
    }

    pub fn esr1_positive(&self) -> bool {
        self.reported_positive(BiomarkerField::Esr1)
    }

    pub fn pdl1_high(&self) -> bool {
        self.reported_contains(BiomarkerField::Pdl1, "high")
    }

    pub fn msi_high(&self) -> bool {
        self.reported_contains(BiomarkerField::Msi, "high")
    }

    pub fn akt1_mutated(&self) -> bool {
        self.reported_contains(BiomarkerField::Akt1, "mutation")
    }

    fn reported_positive(&self, field: BiomarkerField) -> bool {
        self.meaningful(field)
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("positive"))
    }

    fn reported_contains(&self, field: BiomarkerField, needle: &str) -> bool {
        self.meaningful(field)
            .is_some_and(|v| v.to_lowercase().contains(needle))
    }
}

impl<S: Into<String>> FromIterator<(BiomarkerField, S)> for ConsolidatedRecord {
    fn from_iter<I: IntoIterator<Item = (BiomarkerField, S)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(f, v)| (f, v.into())).collect(),
        }
    }
}

impl Serialize for ConsolidatedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(BiomarkerField::ALL.len()))?;
        for field in BiomarkerField::ALL {
            map.serialize_entry(field.key(), self.display(field))?;
        }
        map.end()
    }
}
