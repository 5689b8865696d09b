use std::sync::LazyLock;

use regex::Captures;

use super::{Polarity, Rule, RuleContext, first_match, polarity};
use crate::models::{
    HER2_HIGH, HER2_LOW, HER2_NEGATIVE, LUMINAL_A, LUMINAL_B, erpr_label, normalize_stage,
};

/// Stage: explicit "Stage X" first, then in-situ wording, then TNM shortcuts
pub static STAGE_RULES: LazyLock<Vec<Rule<String>>> = LazyLock::new(|| {
    vec![
        Rule::new(
            "stage_label",
            r"(?i)\bStage[ \t]*[:\-]?[ \t]*(IV|III|II|I|0|[1-4])[ABC]?\b",
            normalized_stage,
        ),
        Rule::new(
            "in_situ",
            r"(?i)\b(DCIS|ductal carcinoma in situ)\b",
            |_, _| normalize_stage("DCIS").map(str::to_string),
        ),
        Rule::new(
            "tnm_metastatic",
            r"\b[cp]?T(?:is|[0-4])[a-d]?[ \t]*[cp]?N[0-3X][a-c]?[ \t]*[cp]?M1\b",
            |_, _| normalize_stage("IV").map(str::to_string),
        ),
        Rule::new(
            "tnm_in_situ",
            r"\b[cp]?Tis[ \t]*[cp]?N0\b",
            |_, _| normalize_stage("0").map(str::to_string),
        ),
    ]
});

fn normalized_stage(caps: &Captures<'_>, _: &RuleContext<'_>) -> Option<String> {
    normalize_stage(&caps[1]).map(str::to_string)
}

pub static ER_RULES: LazyLock<Vec<Rule<bool>>> = LazyLock::new(|| receptor_rules("Estrogen", "ER"));

pub static PR_RULES: LazyLock<Vec<Rule<bool>>> =
    LazyLock::new(|| receptor_rules("Progesterone", "PR"));

fn receptor_rules(name: &str, abbrev: &str) -> Vec<Rule<bool>> {
    vec![
        Rule::new(
            "receptor_result",
            &format!(
                r"(?i)\b(?:{name}|{abbrev})\b[-\s]*(?:receptors?)?[\s:\-]*(?:\({abbrev}\))?[\s:\-]*(?:status)?[\s:\-]*(Positive|Negative|Pos|Neg|Non[- ]?reactive|Reactive)\b"
            ),
            receptor_polarity,
        ),
        Rule::new(
            "receptor_sign",
            &format!(r"(?i)\b{abbrev}[ \t]*[:\-]?[ \t]*(\+|-|–)"),
            receptor_polarity,
        ),
        Rule::new(
            "receptor_percentage",
            &format!(r"(?i)\b(?:{name}|{abbrev})\b[^\n%]{{0,40}}?\b(\d{{1,3}})[ \t]*%"),
            receptor_percentage,
        ),
    ]
}

fn receptor_polarity(caps: &Captures<'_>, _: &RuleContext<'_>) -> Option<bool> {
    match polarity(&caps[1])? {
        Polarity::Positive => Some(true),
        Polarity::Negative => Some(false),
        Polarity::NotTested => None,
    }
}

/// Any stained nuclei count as positive; 0% is negative
fn receptor_percentage(caps: &Captures<'_>, _: &RuleContext<'_>) -> Option<bool> {
    let pct: u32 = caps[1].parse().ok()?;
    (pct <= 100).then_some(pct >= 1)
}

/// ER and PR must both resolve before a combined status is reported
pub fn extract_erpr(ctx: &RuleContext<'_>) -> Option<String> {
    let er = first_match(&ER_RULES, ctx)?;
    let pr = first_match(&PR_RULES, ctx)?;
    Some(erpr_label(er, pr))
}

/// HER-2: IHC score first, then qualitative wording
pub static HER2_RULES: LazyLock<Vec<Rule<String>>> = LazyLock::new(|| {
    vec![
        Rule::new(
            "her2_ihc_score",
            r"(?i)\bHER-?2(?:/neu)?[^\d\n]{0,40}?(0|[123]\+)(?:[^\w+]|$)",
            map_her2,
        ),
        Rule::new(
            "her2_result",
            r"(?i)\bHER-?2(?:/neu)?\b[^:\n]{0,30}?[:\-]?[ \t]*(Not amplified|Non-amplified|Positive|Negative|Equivocal|Over-?expression|Over-?expressed|Amplified|Low|High)\b",
            map_her2,
        ),
        Rule::new(
            "her2_score_label",
            r"(?i)\bHER-?2\b[^\n]*?\bScore[ \t]*[:\-]?[ \t]*([0-3]\+?)",
            map_her2,
        ),
    ]
});

fn map_her2(caps: &Captures<'_>, _: &RuleContext<'_>) -> Option<String> {
    let token = caps[1].trim().to_lowercase();
    let label = match token.as_str() {
        "0" | "0+" => HER2_NEGATIVE,
        "1" | "1+" | "2" | "2+" => HER2_LOW,
        "3" | "3+" => HER2_HIGH,
        t if t.contains("not") || t.contains("non") || t.contains("negative") => HER2_NEGATIVE,
        t if t.contains("equivocal") || t.contains("low") => HER2_LOW,
        t if t.contains("positive")
            || t.contains("over")
            || t.contains("amplified")
            || t.contains("high") =>
        {
            HER2_HIGH
        }
        _ => return None,
    };
    Some(label.to_string())
}

pub static LUMINAL_RULES: LazyLock<Vec<Rule<String>>> = LazyLock::new(|| {
    vec![
        Rule::new(
            "luminal_label",
            r"(?i)\bLuminal[ \t]*(?:subtype|type)?[ \t]*[:\-]?[ \t]*(A|B)\b",
            map_luminal,
        ),
        Rule::new(
            "molecular_subtype",
            r"(?i)\bMolecular[ \t]+subtype[ \t]*[:\-]?[ \t]*Luminal[ \t\-]*(A|B)\b",
            map_luminal,
        ),
    ]
});

fn map_luminal(caps: &Captures<'_>, _: &RuleContext<'_>) -> Option<String> {
    let label = if caps[1].eq_ignore_ascii_case("a") {
        LUMINAL_A
    } else {
        LUMINAL_B
    };
    Some(label.to_string())
}

/// Ki-67: percentage bucketed on the configured threshold, then wording
pub static KI67_RULES: LazyLock<Vec<Rule<String>>> = LazyLock::new(|| {
    vec![
        Rule::new(
            "ki67_percentage",
            r"(?i)\bKi-?67\b[^\d\n]{0,30}?(\d{1,3}(?:\.\d+)?)[ \t]*%",
            ki67_percentage,
        ),
        Rule::new(
            "ki67_value",
            r"(?i)\bKi-?67\b[ \t]*[:\-]?[ \t]*(\d{1,3}(?:\.\d+)?)\b",
            ki67_percentage,
        ),
        Rule::new(
            "ki67_wording",
            r"(?i)\bKi-?67\b[^\n]*?\b(High|Low)\b",
            ki67_wording,
        ),
    ]
});

fn ki67_high_label(threshold: u32) -> String {
    format!("High (≥{threshold}%)")
}

fn ki67_low_label(threshold: u32) -> String {
    format!("Low (<{threshold}%)")
}

fn ki67_percentage(caps: &Captures<'_>, ctx: &RuleContext<'_>) -> Option<String> {
    let pct: f64 = caps[1].parse().ok()?;
    if pct > 100.0 {
        return None;
    }
    let threshold = ctx.config.ki67_high_threshold;
    if pct >= threshold as f64 {
        Some(ki67_high_label(threshold))
    } else {
        Some(ki67_low_label(threshold))
    }
}

fn ki67_wording(caps: &Captures<'_>, ctx: &RuleContext<'_>) -> Option<String> {
    let threshold = ctx.config.ki67_high_threshold;
    if caps[1].eq_ignore_ascii_case("high") {
        Some(ki67_high_label(threshold))
    } else {
        Some(ki67_low_label(threshold))
    }
}
