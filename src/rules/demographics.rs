use std::sync::LazyLock;

use regex::Captures;

use super::{Rule, RuleContext};
use crate::models::{CANADA, UNITED_STATES};

const CANADIAN_CODES: &str = "AB|BC|MB|NB|NL|NS|NT|NU|ON|PE|QC|SK|YT";
const US_CODES: &str = "AL|AK|AZ|AR|CA|CO|CT|DE|FL|GA|HI|ID|IL|IN|IA|KS|KY|LA|ME|MD|MA|MI|MN|MS|MO|MT|NE|NV|NH|NJ|NM|NY|NC|ND|OH|OK|OR|PA|RI|SC|SD|TN|TX|UT|VT|VA|WA|WV|WI|WY";

/// Province / state, labelled first, then bare postal codes in address form
pub static PROVINCE_RULES: LazyLock<Vec<Rule<String>>> = LazyLock::new(|| {
    vec![
        Rule::new(
            "province_code_label",
            r"(?i)\bProvince[ \t]*[:\-]?[ \t]*([A-Z]{2})\b",
            upper_capture,
        ),
        Rule::new(
            "province_state_label",
            r"(?i)\bProvince/State[ \t]*[:\-]?[ \t]*(\w+)",
            trimmed_capture,
        ),
        Rule::new(
            "location_label",
            r"(?i)\bLocation[ \t]*[:\-]?[ \t]*(\w+(?:[ \t]\w+)?)",
            trimmed_capture,
        ),
        Rule::new(
            "canadian_address_code",
            &format!(r",[ \t]*({CANADIAN_CODES})\b"),
            trimmed_capture,
        ),
        Rule::new(
            "us_address_code",
            &format!(r",[ \t]*({US_CODES})\b"),
            trimmed_capture,
        ),
    ]
});

pub static COUNTRY_RULES: LazyLock<Vec<Rule<String>>> = LazyLock::new(|| {
    vec![
        Rule::new(
            "country_label",
            r"(?i)\bCountry[ \t]*[:\-]?[ \t]*(Canada|United States|USA|US)\b",
            map_country,
        ),
        Rule::new(
            "residency_phrase",
            r"\b((?i:Canada|United States)|USA|US)\b[^\n]*?\b(?i:resident|patient|citizen)",
            map_country,
        ),
    ]
});

/// Age: explicit label, then "NN years old", then birth year
pub static AGE_RULES: LazyLock<Vec<Rule<String>>> = LazyLock::new(|| {
    vec![
        Rule::new(
            "age_label",
            r"(?i)\bAge[ \t]*[:\-]?[ \t]*(\d{1,3})\b",
            plausible_age,
        ),
        Rule::new(
            "years_old",
            r"(?i)\b(\d{1,3})[ \t-]*(?:(?:years?|yrs?)[ \t-]*old|y/o)\b",
            plausible_age,
        ),
        Rule::new(
            "birth_year",
            r"(?i)\b(?:DOB|Date[ \t]*of[ \t]*Birth)\b[^\n]*?\b(\d{4})\b",
            age_from_birth_year,
        ),
    ]
});

fn upper_capture(caps: &Captures<'_>, _: &RuleContext<'_>) -> Option<String> {
    Some(caps[1].trim().to_uppercase())
}

fn trimmed_capture(caps: &Captures<'_>, _: &RuleContext<'_>) -> Option<String> {
    let value = caps[1].trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn map_country(caps: &Captures<'_>, _: &RuleContext<'_>) -> Option<String> {
    if caps[1].eq_ignore_ascii_case("canada") {
        Some(CANADA.to_string())
    } else {
        Some(UNITED_STATES.to_string())
    }
}

fn plausible_age(caps: &Captures<'_>, _: &RuleContext<'_>) -> Option<String> {
    let age: u32 = caps[1].parse().ok()?;
    (1..120).contains(&age).then(|| age.to_string())
}

fn age_from_birth_year(caps: &Captures<'_>, ctx: &RuleContext<'_>) -> Option<String> {
    let year: i32 = caps[1].parse().ok()?;
    let current = ctx.config.reference_year;
    (year > 1900 && year <= current).then(|| (current - year).to_string())
}
