use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::models::{
    Classification, ConsolidatedRecord, StageBucket, Subtype, compound_key,
};

use super::stage2_derive::{confirm_user_stage, derive_stage};

const DCIS_URL: &str = "https://drive.google.com/file/d/1SNem7t-VJf-q31D-NuJJHNY08Jdf1k_z/view?usp=drive_link";
const STAGE_I_URL: &str = "https://drive.google.com/file/d/1v45G7eO1PfleAo10eY5GfZ8NVqJmVor_/view?usp=drive_link";
const STAGE_II_URL: &str = "https://drive.google.com/file/d/1sv8_QGiwmLTVpU8u1HyXmHFPV0HBVqsV/view?usp=drive_link";
const STAGE_III_URL: &str = "https://drive.google.com/file/d/10JZ1MVfukIphQovbhEEZ1eGCNNBTEWb7/view?usp=drive_link";
const STAGE_IV_URL: &str = "https://drive.google.com/file/d/1i6I7SRjobdZScTj2-tAFLQwBOsAImSez/view?usp=drive_link";

/// Stage label (bare or compound) to patient resource link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceTable {
    entries: BTreeMap<String, String>,
}

impl ResourceTable {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ResourceTable {
    fn default() -> Self {
        let mut entries = BTreeMap::new();
        let bases = [
            (StageBucket::Stage0, DCIS_URL),
            (StageBucket::StageI, STAGE_I_URL),
            (StageBucket::StageII, STAGE_II_URL),
            (StageBucket::StageIII, STAGE_III_URL),
            (StageBucket::StageIV, STAGE_IV_URL),
        ];
        for (bucket, url) in bases {
            entries.insert(bucket.label().to_string(), url.to_string());
        }

        let early = [
            Subtype::HormoneHer2High,
            Subtype::HormoneHer2Low,
            Subtype::Hormone,
            Subtype::Brca,
            Subtype::Her2,
            Subtype::TripleNegative,
        ];
        for (bucket, url) in [
            (StageBucket::StageII, STAGE_II_URL),
            (StageBucket::StageIII, STAGE_III_URL),
        ] {
            for subtype in early {
                entries.insert(compound_key(bucket, subtype), url.to_string());
            }
        }

        // No metastatic TNBC or HER2-low resources exist
        for subtype in [
            Subtype::HormoneHer2High,
            Subtype::Hormone,
            Subtype::Her2,
            Subtype::Brca,
        ] {
            entries.insert(compound_key(StageBucket::StageIV, subtype), STAGE_IV_URL.to_string());
        }

        Self { entries }
    }
}

impl FromIterator<(String, String)> for ResourceTable {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Packages and resource key for one stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub packages: Vec<String>,
    pub resource_key: String,
}

/// Base package for a stage label; `None` when the label has no stage
pub fn base_package(user_stage: &str, record: &ConsolidatedRecord) -> Option<String> {
    let bucket = StageBucket::from_label(user_stage)?;
    let subtype = Subtype::from_label(user_stage);
    let label = bucket.label();

    let package = match bucket {
        StageBucket::Stage0 | StageBucket::StageI => format!("Core package for {label}"),
        StageBucket::StageII | StageBucket::StageIII => match subtype {
            Some(Subtype::HormoneHer2High) => format!("{label} ER/PR+/HER2+ package"),
            Some(Subtype::HormoneHer2Low) => format!("{label} ER/PR+/HER2 Low package"),
            Some(Subtype::Hormone) => format!("{label} ER/PR+ package"),
            Some(Subtype::Her2) => format!("{label} HER-2+ package"),
            Some(Subtype::Brca) => format!("{label} BRCA+ package"),
            Some(Subtype::TripleNegative) | None => format!("Core package for {label} (TNBC)"),
        },
        StageBucket::StageIV => match subtype {
            Some(Subtype::HormoneHer2High) => format!("{label} ER/PR+/HER2+ package"),
            Some(Subtype::HormoneHer2Low | Subtype::Hormone) => format!("{label} ER/PR+ package"),
            Some(Subtype::Her2) => format!("{label} HER-2+ package"),
            Some(Subtype::Brca) => format!("{label} BRCA+ package"),
            _ if record.brca_positive() => format!("{label} BRCA+ package"),
            _ => format!("Core package for {label}"),
        },
    };
    Some(package)
}

/// Biomarker add-ons, independent of stage, in fixed panel order
pub fn targeted_packages(record: &ConsolidatedRecord) -> Vec<String> {
    [
        (record.brca_positive(), "PARP inhibitors"),
        (record.her2_high(), "HER2-targeted therapy"),
        (record.pik3ca_positive(), "PIK3CA-Targeted Therapy"),
        (record.esr1_positive(), "ESR1-Targeted Therapy"),
        (record.pdl1_high(), "PD-L1 Immunotherapy"),
        (record.msi_high(), "MSI-High Targeted Therapy"),
        (record.akt1_mutated(), "AKT1 Inhibitors"),
    ]
    .into_iter()
    .filter(|(applies, _)| *applies)
    .map(|(_, package)| package.to_string())
    .collect()
}

/// Resource key: exact label, then compound keys, then the bare stage
pub fn resource_key(user_stage: &str, record: &ConsolidatedRecord, table: &ResourceTable) -> String {
    let user_stage = user_stage.trim();
    if table.contains(user_stage) {
        return user_stage.to_string();
    }

    let Some(bucket) = StageBucket::from_label(user_stage) else {
        return String::new();
    };

    if bucket.has_subtypes() {
        let compound = Subtype::candidates(record)
            .into_iter()
            .map(|subtype| compound_key(bucket, subtype))
            .find(|key| table.contains(key));
        if let Some(key) = compound {
            return key;
        }
    }

    if table.contains(bucket.label()) {
        bucket.label().to_string()
    } else {
        String::new()
    }
}

/// Package & resource resolver
pub fn resolve(user_stage: &str, record: &ConsolidatedRecord, table: &ResourceTable) -> Resolution {
    let packages = base_package(user_stage, record)
        .into_iter()
        .chain(targeted_packages(record))
        .collect();

    Resolution {
        packages,
        resource_key: resource_key(user_stage, record, table),
    }
}

/// Build the terminal classification for a merged record
pub fn classify(
    record: &ConsolidatedRecord,
    user_stage: Option<&str>,
    table: &ResourceTable,
) -> Classification {
    let calculated_stage = derive_stage(record);
    let user_stage = confirm_user_stage(&calculated_stage, user_stage);
    let Resolution {
        packages,
        resource_key,
    } = resolve(&user_stage, record, table);

    info!(
        calculated_stage = %calculated_stage,
        user_stage = %user_stage,
        resource_key = %resource_key,
        "Resolved {} packages",
        packages.len()
    );

    Classification {
        calculated_stage,
        user_stage,
        packages,
        resource_key,
    }
}
