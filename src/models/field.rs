use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Placeholder for a field no rule could resolve in a single document
pub const NOT_AVAILABLE: &str = "Not available";
/// Display value for a field that stays unresolved after merging
pub const NOT_TESTED: &str = "Not tested";

pub const HER2_NEGATIVE: &str = "HER-2 Negative (0)";
pub const HER2_LOW: &str = "HER-2 Low (1+ or 2+)";
pub const HER2_HIGH: &str = "HER-2 High (3+)";

pub const BRCA1_POSITIVE: &str = "BRCA1+";
pub const BRCA2_POSITIVE: &str = "BRCA2+";
pub const BRCA_POSITIVE: &str = "BRCA+";

pub const POSITIVE: &str = "Positive";
pub const NEGATIVE: &str = "Negative";
pub const MUTATION_DETECTED: &str = "Mutation detected";

pub const PDL1_HIGH: &str = "High expression";
pub const PDL1_LOW: &str = "Low expression";

pub const MSI_HIGH: &str = "MSI-High";
pub const MSI_LOW: &str = "MSI-Low";

pub const LUMINAL_A: &str = "Luminal A";
pub const LUMINAL_B: &str = "Luminal B";

pub const CANADA: &str = "Canada";
pub const UNITED_STATES: &str = "United States";

/// Answers that carry no clinical information even though they were reported
const LOW_INFORMATION: [&str; 4] = ["not tested", "not sure", "not specified", "unknown"];

/// One key of the fixed extraction panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BiomarkerField {
    #[serde(rename = "province")]
    Province,
    #[serde(rename = "country")]
    Country,
    #[serde(rename = "age")]
    Age,
    #[serde(rename = "stage")]
    Stage,
    #[serde(rename = "ERPR")]
    Erpr,
    #[serde(rename = "HER2")]
    Her2,
    #[serde(rename = "luminal")]
    Luminal,
    #[serde(rename = "BRCA")]
    Brca,
    #[serde(rename = "PIK3CA")]
    Pik3ca,
    #[serde(rename = "ESR1")]
    Esr1,
    #[serde(rename = "PDL1")]
    Pdl1,
    #[serde(rename = "MSI")]
    Msi,
    #[serde(rename = "Ki67")]
    Ki67,
    #[serde(rename = "PTEN")]
    Pten,
    #[serde(rename = "AKT1")]
    Akt1,
}

impl BiomarkerField {
    /// Every field, in panel order
    pub const ALL: [BiomarkerField; 15] = [
        BiomarkerField::Province,
        BiomarkerField::Country,
        BiomarkerField::Age,
        BiomarkerField::Stage,
        BiomarkerField::Erpr,
        BiomarkerField::Her2,
        BiomarkerField::Luminal,
        BiomarkerField::Brca,
        BiomarkerField::Pik3ca,
        BiomarkerField::Esr1,
        BiomarkerField::Pdl1,
        BiomarkerField::Msi,
        BiomarkerField::Ki67,
        BiomarkerField::Pten,
        BiomarkerField::Akt1,
    ];

    /// Key used in serialized records and on the command line
    pub fn key(self) -> &'static str {
        match self {
            BiomarkerField::Province => "province",
            BiomarkerField::Country => "country",
            BiomarkerField::Age => "age",
            BiomarkerField::Stage => "stage",
            BiomarkerField::Erpr => "ERPR",
            BiomarkerField::Her2 => "HER2",
            BiomarkerField::Luminal => "luminal",
            BiomarkerField::Brca => "BRCA",
            BiomarkerField::Pik3ca => "PIK3CA",
            BiomarkerField::Esr1 => "ESR1",
            BiomarkerField::Pdl1 => "PDL1",
            BiomarkerField::Msi => "MSI",
            BiomarkerField::Ki67 => "Ki67",
            BiomarkerField::Pten => "PTEN",
            BiomarkerField::Akt1 => "AKT1",
        }
    }

    /// Human-facing label
    pub fn label(self) -> &'static str {
        match self {
            BiomarkerField::Province => "Province/State",
            BiomarkerField::Country => "Country",
            BiomarkerField::Age => "Age",
            BiomarkerField::Stage => "Stage",
            BiomarkerField::Erpr => "ER/PR status",
            BiomarkerField::Her2 => "HER-2 status",
            BiomarkerField::Luminal => "Luminal subtype",
            BiomarkerField::Brca => "BRCA status",
            BiomarkerField::Pik3ca => "PIK3CA status",
            BiomarkerField::Esr1 => "ESR1 status",
            BiomarkerField::Pdl1 => "PD-L1 status",
            BiomarkerField::Msi => "MSI status",
            BiomarkerField::Ki67 => "Ki-67 status",
            BiomarkerField::Pten => "PTEN status",
            BiomarkerField::Akt1 => "AKT1 status",
        }
    }

    /// Whether the field is a demographic rather than a tumour marker
    pub fn is_demographic(self) -> bool {
        matches!(
            self,
            BiomarkerField::Province | BiomarkerField::Country | BiomarkerField::Age
        )
    }
}

impl fmt::Display for BiomarkerField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for BiomarkerField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BiomarkerField::ALL
            .into_iter()
            .find(|f| f.key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown biomarker field: {}", s))
    }
}

/// Whether a reported value conveys clinical information
pub fn is_meaningful(value: &str) -> bool {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(NOT_AVAILABLE) {
        return false;
    }
    !LOW_INFORMATION
        .iter()
        .any(|low| trimmed.eq_ignore_ascii_case(low))
}

/// Combined hormone-receptor label, e.g. "ER+ & PR–"
pub fn erpr_label(er_positive: bool, pr_positive: bool) -> String {
    format!(
        "{} & {}",
        if er_positive { "ER+" } else { "ER–" },
        if pr_positive { "PR+" } else { "PR–" }
    )
}
