use std::sync::LazyLock;

use regex::Captures;

use super::{Polarity, Rule, RuleContext, polarity};
use crate::models::{
    BRCA_POSITIVE, BRCA1_POSITIVE, BRCA2_POSITIVE, MSI_HIGH, MSI_LOW, MUTATION_DETECTED, NEGATIVE,
    NOT_TESTED, PDL1_HIGH, PDL1_LOW, POSITIVE,
};

const MUTATION_RESULT: &str = r"(Mutation not detected|No mutation|Not detected|Not tested|Mutation detected|Positive|Negative|Pathogenic|Likely pathogenic|Mutated|Mutation|Wild[-\s]?type|Detected|\+|-)";

pub static BRCA_RULES: LazyLock<Vec<Rule<String>>> = LazyLock::new(|| {
    vec![
        Rule::new(
            "brca_gene_result",
            &format!(r"(?i)\bBRCA[12]\b[\s:\-]*{MUTATION_RESULT}"),
            map_brca,
        ),
        Rule::new(
            "brca_split_gene_result",
            &format!(r"(?i)\bBRCA[ \t]*[:\-]?[ \t]*[12]\b[\s:\-]*{MUTATION_RESULT}"),
            map_brca,
        ),
        Rule::new(
            "genetic_brca_finding",
            r"(?i)\bGenetic\b[^\n]*?\bBRCA[12]?\b[\s:\-]*(Positive|Negative|Mutation|Present|Absent)",
            map_brca,
        ),
    ]
});

/// Positive findings name the gene from whichever BRCA literal the text carries
fn map_brca(caps: &Captures<'_>, ctx: &RuleContext<'_>) -> Option<String> {
    let label = match polarity(&caps[1])? {
        Polarity::Positive => {
            if ctx.text.contains("BRCA1") {
                BRCA1_POSITIVE
            } else if ctx.text.contains("BRCA2") {
                BRCA2_POSITIVE
            } else {
                BRCA_POSITIVE
            }
        }
        Polarity::Negative => NEGATIVE,
        Polarity::NotTested => NOT_TESTED,
    };
    Some(label.to_string())
}

/// Rules shared by single-gene somatic tests (PIK3CA, ESR1, AKT1)
fn gene_rules(gene: &str, map: fn(&Captures<'_>, &RuleContext<'_>) -> Option<String>) -> Vec<Rule<String>> {
    vec![
        Rule::new(
            "gene_result",
            &format!(r"(?i)\b{gene}\b[\s:\-]*{MUTATION_RESULT}"),
            map,
        ),
        Rule::new(
            "gene_detection_phrase",
            &format!(r"(?i)\b{gene}\b[^\n]*?\b(not detected|detected|present|absent)\b"),
            map,
        ),
    ]
}

fn positive_negative(caps: &Captures<'_>, _: &RuleContext<'_>) -> Option<String> {
    let label = match polarity(&caps[1])? {
        Polarity::Positive => POSITIVE,
        Polarity::Negative => NEGATIVE,
        Polarity::NotTested => NOT_TESTED,
    };
    Some(label.to_string())
}

fn mutation_detected(caps: &Captures<'_>, _: &RuleContext<'_>) -> Option<String> {
    let label = match polarity(&caps[1])? {
        Polarity::Positive => MUTATION_DETECTED,
        Polarity::Negative => NEGATIVE,
        Polarity::NotTested => NOT_TESTED,
    };
    Some(label.to_string())
}

pub static PIK3CA_RULES: LazyLock<Vec<Rule<String>>> =
    LazyLock::new(|| gene_rules("PIK3CA", positive_negative));

pub static ESR1_RULES: LazyLock<Vec<Rule<String>>> =
    LazyLock::new(|| gene_rules("ESR1", positive_negative));

pub static AKT1_RULES: LazyLock<Vec<Rule<String>>> =
    LazyLock::new(|| gene_rules("AKT1", mutation_detected));

/// PTEN is reported as protein expression: retained is positive, loss negative
pub static PTEN_RULES: LazyLock<Vec<Rule<String>>> = LazyLock::new(|| {
    vec![
        Rule::new(
            "pten_result",
            r"(?i)\bPTEN\b[\s:\-]*(Not tested|Positive|Negative|Loss|Retained|Intact|\+|-)",
            positive_negative,
        ),
        Rule::new(
            "pten_phrase",
            r"(?i)\bPTEN\b[^\n]*?\b(not detected|detected|present|absent|loss|retained)\b",
            positive_negative,
        ),
    ]
});

pub static MSI_RULES: LazyLock<Vec<Rule<String>>> = LazyLock::new(|| {
    vec![
        Rule::new(
            "msi_result",
            r"(?i)\bMSI\b[\s:\-]*(MSI-H|MSI-L|MSS|High|Low|Stable|Instability)\b",
            map_msi,
        ),
        Rule::new(
            "microsatellite_result",
            r"(?i)\bMicrosatellite(?:[ \t]+instability)?\b[\s:\-]*(High|Low|Stable)\b",
            map_msi,
        ),
        Rule::new(
            "mismatch_repair",
            r"(?i)\b(?:MMR|mismatch repair)\b[^\n]{0,30}?\b(Deficient|Proficient|dMMR|pMMR|Intact)\b",
            map_msi,
        ),
        Rule::new("msi_shorthand", r"\b(MSI-H|MSS|dMMR|pMMR)\b", map_msi),
    ]
});

fn map_msi(caps: &Captures<'_>, _: &RuleContext<'_>) -> Option<String> {
    let token = caps[1].to_lowercase();
    let label = match token.as_str() {
        "msi-h" | "high" | "instability" | "deficient" | "dmmr" => MSI_HIGH,
        "msi-l" | "mss" | "low" | "stable" | "proficient" | "pmmr" | "intact" => MSI_LOW,
        _ => return None,
    };
    Some(label.to_string())
}

/// PD-L1: wording first, then percentage or CPS against the configured threshold
pub static PDL1_RULES: LazyLock<Vec<Rule<String>>> = LazyLock::new(|| {
    vec![
        Rule::new(
            "pdl1_wording",
            r"(?i)\b(?:PD-?L1|Programmed Death Ligand 1)\b[\s:\-]*(?:expression)?[\s:\-]*(High|Low|Positive|Negative)\b",
            pdl1_wording,
        ),
        Rule::new(
            "pdl1_percentage",
            r"(?i)\bPD-?L1\b[^\n%]{0,60}?\b(\d{1,3}(?:\.\d+)?)[ \t]*%",
            pdl1_score,
        ),
        Rule::new(
            "combined_positive_score",
            r"(?i)\b(?:CPS|combined positive score)\b[ \t]*(?:[:=][ \t]*)?(?P<cmp>[≥><])?[ \t]*(?P<score>\d{1,3})\b",
            combined_positive_score,
        ),
    ]
});

fn pdl1_wording(caps: &Captures<'_>, _: &RuleContext<'_>) -> Option<String> {
    let token = caps[1].to_lowercase();
    let label = if token == "high" || token == "positive" {
        PDL1_HIGH
    } else {
        PDL1_LOW
    };
    Some(label.to_string())
}

fn pdl1_score(caps: &Captures<'_>, ctx: &RuleContext<'_>) -> Option<String> {
    let score: f64 = caps[1].parse().ok()?;
    let label = if score >= ctx.config.pdl1_positivity_threshold as f64 {
        PDL1_HIGH
    } else {
        PDL1_LOW
    };
    Some(label.to_string())
}

/// "CPS < n" is low whenever n does not exceed the threshold; a wider bound says nothing
fn combined_positive_score(caps: &Captures<'_>, ctx: &RuleContext<'_>) -> Option<String> {
    let score: u32 = caps["score"].parse().ok()?;
    let threshold = ctx.config.pdl1_positivity_threshold;
    let high = match caps.name("cmp").map(|m| m.as_str()) {
        Some("<") if score <= threshold => false,
        Some("<") => return None,
        _ => score >= threshold,
    };
    Some(if high { PDL1_HIGH } else { PDL1_LOW }.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{ExtractionConfig, first_match, test_config};

    fn run(rules: &[Rule<String>], text: &str) -> Option<String> {
        let config = test_config();
        first_match(rules, &RuleContext { text, config: &config })
    }

    #[test]
    fn test_brca_positive_disambiguates_gene() {
        assert_eq!(
            run(&BRCA_RULES, "BRCA2: Pathogenic variant c.5946delT"),
            Some(BRCA2_POSITIVE.to_string())
        );
        assert_eq!(
            run(&BRCA_RULES, "BRCA1 - positive"),
            Some(BRCA1_POSITIVE.to_string())
        );
    }

    #[test]
    fn test_brca_positive_without_gene_literal_is_generic() {
        // "BRCA 1" is not the literal "BRCA1"
        assert_eq!(
            run(&BRCA_RULES, "BRCA 1 - positive"),
            Some(BRCA_POSITIVE.to_string())
        );
        assert_eq!(
            run(&BRCA_RULES, "Genetic testing: brca mutation present"),
            Some(BRCA_POSITIVE.to_string())
        );
    }

    #[test]
    fn test_brca_negative_and_not_tested() {
        assert_eq!(run(&BRCA_RULES, "BRCA1: No mutation detected"), Some(NEGATIVE.to_string()));
        assert_eq!(run(&BRCA_RULES, "BRCA2 Wild-type"), Some(NEGATIVE.to_string()));
        assert_eq!(run(&BRCA_RULES, "BRCA1: Not tested"), Some(NOT_TESTED.to_string()));
    }

    #[test]
    fn test_gene_results() {
        assert_eq!(run(&PIK3CA_RULES, "PIK3CA: Mutation detected (H1047R)"), Some(POSITIVE.to_string()));
        assert_eq!(run(&PIK3CA_RULES, "PIK3CA mutation not detected"), Some(NEGATIVE.to_string()));
        assert_eq!(run(&ESR1_RULES, "ESR1 - Wild type"), Some(NEGATIVE.to_string()));
        assert_eq!(
            run(&ESR1_RULES, "Somatic alterations: ESR1 Y537S was detected"),
            Some(POSITIVE.to_string())
        );
        assert_eq!(run(&AKT1_RULES, "AKT1: E17K mutation present"), Some(MUTATION_DETECTED.to_string()));
        assert_eq!(run(&AKT1_RULES, "AKT1: Negative"), Some(NEGATIVE.to_string()));
    }

    #[test]
    fn test_pten() {
        assert_eq!(run(&PTEN_RULES, "PTEN: Loss of expression"), Some(NEGATIVE.to_string()));
        assert_eq!(run(&PTEN_RULES, "PTEN IHC shows retained expression"), Some(POSITIVE.to_string()));
    }

    #[test]
    fn test_msi() {
        assert_eq!(run(&MSI_RULES, "MSI: MSI-H"), Some(MSI_HIGH.to_string()));
        assert_eq!(run(&MSI_RULES, "MSI-Stable"), Some(MSI_LOW.to_string()));
        assert_eq!(run(&MSI_RULES, "Microsatellite instability: High"), Some(MSI_HIGH.to_string()));
        assert_eq!(run(&MSI_RULES, "Mismatch repair proteins: intact"), Some(MSI_LOW.to_string()));
        assert_eq!(run(&MSI_RULES, "Result consistent with dMMR"), Some(MSI_HIGH.to_string()));
    }

    #[test]
    fn test_pdl1_wording_and_threshold() {
        assert_eq!(run(&PDL1_RULES, "PD-L1: Positive"), Some(PDL1_HIGH.to_string()));
        assert_eq!(run(&PDL1_RULES, "PD-L1 (22C3) TPS 10%"), Some(PDL1_HIGH.to_string()));
        assert_eq!(run(&PDL1_RULES, "PD-L1 (SP142) 5%"), Some(PDL1_LOW.to_string()));
        assert_eq!(run(&PDL1_RULES, "CPS: 12"), Some(PDL1_HIGH.to_string()));
    }

    #[test]
    fn test_combined_positive_score_bounds() {
        assert_eq!(run(&PDL1_RULES, "CPS < 1"), Some(PDL1_LOW.to_string()));
        assert_eq!(run(&PDL1_RULES, "CPS: <10"), Some(PDL1_LOW.to_string()));
        assert_eq!(run(&PDL1_RULES, "Combined positive score ≥ 10"), Some(PDL1_HIGH.to_string()));
        assert_eq!(run(&PDL1_RULES, "CPS > 20"), Some(PDL1_HIGH.to_string()));
        assert_eq!(run(&PDL1_RULES, "CPS = 5"), Some(PDL1_LOW.to_string()));
        // An upper bound above the threshold could be either bucket
        assert_eq!(run(&PDL1_RULES, "CPS < 50"), None);
    }

    #[test]
    fn test_pdl1_threshold_is_configurable() {
        let config = ExtractionConfig {
            pdl1_positivity_threshold: 1,
            ..test_config()
        };
        let ctx = RuleContext {
            text: "PD-L1 (SP142) 5%",
            config: &config,
        };
        assert_eq!(first_match(&PDL1_RULES, &ctx), Some(PDL1_HIGH.to_string()));
    }
}
