pub mod demographics;
pub mod genomics;
pub mod pathology;
pub mod report;

use chrono::Datelike;
use regex::{Captures, Regex};

use crate::models::BiomarkerField;

/// Configuration for field extraction
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    /// PD-L1 percentage (or CPS) at or above which expression counts as high
    pub pdl1_positivity_threshold: u32,
    /// Ki-67 percentage at or above which proliferation counts as high
    pub ki67_high_threshold: u32,
    /// Year used to turn a birth year into an age
    pub reference_year: i32,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            pdl1_positivity_threshold: 10,
            ki67_high_threshold: 20,
            reference_year: chrono::Local::now().year(),
        }
    }
}

/// Inputs every rule mapper can see besides its own captures
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    /// Full document text
    pub text: &'a str,
    pub config: &'a ExtractionConfig,
}

type Mapper<T> = fn(&Captures<'_>, &RuleContext<'_>) -> Option<T>;

/// A pattern paired with the mapper that turns its captures into a value
///
/// A rule only fires when the pattern matches *and* the mapper accepts the
/// captured token; otherwise the next rule in the list gets its turn.
pub struct Rule<T> {
    pub name: &'static str,
    regex: Regex,
    map: Mapper<T>,
}

impl<T> Rule<T> {
    pub fn new(name: &'static str, pattern: &str, map: Mapper<T>) -> Self {
        Self {
            name,
            regex: Regex::new(pattern).expect("valid regex"),
            map,
        }
    }

    /// Evaluate this rule alone
    pub fn apply(&self, ctx: &RuleContext<'_>) -> Option<T> {
        let caps = self.regex.captures(ctx.text)?;
        (self.map)(&caps, ctx)
    }
}

impl<T> std::fmt::Debug for Rule<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("pattern", &self.regex.as_str())
            .finish()
    }
}

/// Evaluate rules top to bottom; the first one that yields a value wins
pub fn first_match<T>(rules: &[Rule<T>], ctx: &RuleContext<'_>) -> Option<T> {
    rules.iter().find_map(|rule| {
        let value = rule.apply(ctx);
        if value.is_some() {
            tracing::trace!(rule = rule.name, "rule matched");
        }
        value
    })
}

/// Extract one field from the text, independently of every other field
pub fn extract_field(
    field: BiomarkerField,
    text: &str,
    config: &ExtractionConfig,
) -> Option<String> {
    let ctx = RuleContext { text, config };
    match field {
        BiomarkerField::Province => first_match(&demographics::PROVINCE_RULES, &ctx),
        BiomarkerField::Country => first_match(&demographics::COUNTRY_RULES, &ctx),
        BiomarkerField::Age => first_match(&demographics::AGE_RULES, &ctx),
        BiomarkerField::Stage => first_match(&pathology::STAGE_RULES, &ctx),
        BiomarkerField::Erpr => pathology::extract_erpr(&ctx),
        BiomarkerField::Her2 => first_match(&pathology::HER2_RULES, &ctx),
        BiomarkerField::Luminal => first_match(&pathology::LUMINAL_RULES, &ctx),
        BiomarkerField::Ki67 => first_match(&pathology::KI67_RULES, &ctx),
        BiomarkerField::Brca => first_match(&genomics::BRCA_RULES, &ctx),
        BiomarkerField::Pik3ca => first_match(&genomics::PIK3CA_RULES, &ctx),
        BiomarkerField::Esr1 => first_match(&genomics::ESR1_RULES, &ctx),
        BiomarkerField::Pdl1 => first_match(&genomics::PDL1_RULES, &ctx),
        BiomarkerField::Msi => first_match(&genomics::MSI_RULES, &ctx),
        BiomarkerField::Pten => first_match(&genomics::PTEN_RULES, &ctx),
        BiomarkerField::Akt1 => first_match(&genomics::AKT1_RULES, &ctx),
    }
}

/// Polarity of a qualitative result token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Positive,
    Negative,
    NotTested,
}

/// Classify a result token; negative phrasings are checked first because
/// several of them ("non-reactive", "not detected") contain a positive word.
pub fn polarity(token: &str) -> Option<Polarity> {
    let lower = token.trim().to_lowercase();
    if lower.is_empty() {
        return None;
    }
    if lower.contains("not tested") || lower.contains("not performed") {
        return Some(Polarity::NotTested);
    }
    const NEGATIVE: [&str; 9] = [
        "neg",
        "non-reactive",
        "non reactive",
        "nonreactive",
        "not detected",
        "no mutation",
        "wild",
        "absent",
        "loss",
    ];
    if NEGATIVE.iter().any(|n| lower.contains(n)) || lower == "-" || lower == "–" {
        return Some(Polarity::Negative);
    }
    const POSITIVE: [&str; 9] = [
        "pos",
        "reactive",
        "mutation",
        "mutated",
        "pathogenic",
        "detected",
        "present",
        "retained",
        "intact",
    ];
    if POSITIVE.iter().any(|p| lower.contains(p)) || lower == "+" {
        return Some(Polarity::Positive);
    }
    None
}

#[cfg(test)]
pub(crate) fn test_config() -> ExtractionConfig {
    ExtractionConfig {
        reference_year: 2025,
        ..Default::default()
    }
}
