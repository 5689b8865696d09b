use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Captures;

use super::{Rule, RuleContext};
use crate::models::ReportType;

/// Vocabulary that only shows up on germline / genetic-testing reports
const GENETIC_KEYWORDS: [&str; 14] = [
    "germline",
    "genetic testing",
    "genetic test result",
    "hereditary cancer",
    "hereditary breast",
    "genetic counsel",
    "multigene panel",
    "multi-gene panel",
    "variant of uncertain significance",
    "bracanalysis",
    "myriad",
    "myrisk",
    "invitae",
    "ambry genetics",
];

/// Label a document as genetic or pathology from keyword heuristics
pub fn classify_report_text(text: &str) -> ReportType {
    let lower = text.to_lowercase();
    if GENETIC_KEYWORDS.iter().any(|k| lower.contains(k)) {
        ReportType::Genetic
    } else {
        ReportType::Pathology
    }
}

const DATE_VALUE: &str = r"(\d{4}-\d{1,2}-\d{1,2}|\d{1,2}/\d{1,2}/\d{2,4}|\d{1,2}-\d{1,2}-\d{4}|[A-Za-z]{3,9}\.?[ \t]+\d{1,2},?[ \t]+\d{4}|\d{1,2}[ \t\-][A-Za-z]{3,9}[ \t\-]\d{4})";

/// Labelled report dates, most authoritative label first
pub static REPORT_DATE_RULES: LazyLock<Vec<Rule<NaiveDate>>> = LazyLock::new(|| {
    [
        ("report_date", r"Report(?:ed)?[ \t]+Date"),
        ("date_received", r"Date[ \t]+Received|Received[ \t]+Date"),
        ("date_of_collection", r"Date[ \t]+of[ \t]+Collection|Collection[ \t]+Date"),
        ("addendum_sign_out", r"Addendum[ \t]+Sign[- ]?Out(?:[ \t]+Date)?"),
    ]
    .into_iter()
    .map(|(name, label)| {
        Rule::new(
            name,
            &format!(r"(?i)\b(?:{label})\b[^\n\d]{{0,20}}?{DATE_VALUE}"),
            parsed_date,
        )
    })
    .collect()
});

fn parsed_date(caps: &Captures<'_>, _: &RuleContext<'_>) -> Option<NaiveDate> {
    parse_report_date(&caps[1])
}

/// Parse a date in any of the layouts seen on North American lab reports
pub fn parse_report_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim().trim_end_matches('.');
    if trimmed.is_empty() {
        return None;
    }
    let normalized = trimmed.replace(',', "").replace('.', "");
    let normalized = normalized.split_whitespace().collect::<Vec<_>>().join(" ");

    const FORMATS: [&str; 9] = [
        "%Y-%m-%d",
        "%m/%d/%y",
        "%m/%d/%Y",
        "%m-%d-%Y",
        "%B %d %Y",
        "%b %d %Y",
        "%d %B %Y",
        "%d %b %Y",
        "%d-%b-%Y",
    ];
    FORMATS
        .iter()
        .filter_map(|fmt| NaiveDate::parse_from_str(&normalized, fmt).ok())
        .find(|date| date.year() >= 1900)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{first_match, test_config};

    fn report_date(text: &str) -> Option<NaiveDate> {
        let config = test_config();
        first_match(&REPORT_DATE_RULES, &RuleContext { text, config: &config })
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_classify_genetic_reports() {
        assert_eq!(
            classify_report_text("Invitae Multi-Cancer Panel\nGermline results: BRCA2 pathogenic"),
            ReportType::Genetic
        );
        assert_eq!(
            classify_report_text("Hereditary Cancer Genetic Testing Report"),
            ReportType::Genetic
        );
    }

    #[test]
    fn test_classify_pathology_by_default() {
        assert_eq!(
            classify_report_text("SURGICAL PATHOLOGY REPORT\nER: Positive\nHER2: 1+"),
            ReportType::Pathology
        );
        assert_eq!(classify_report_text(""), ReportType::Pathology);
    }

    #[test]
    fn test_parse_report_date_formats() {
        assert_eq!(parse_report_date("2024-03-05"), Some(ymd(2024, 3, 5)));
        assert_eq!(parse_report_date("03/05/2024"), Some(ymd(2024, 3, 5)));
        assert_eq!(parse_report_date("March 5, 2024"), Some(ymd(2024, 3, 5)));
        assert_eq!(parse_report_date("Mar. 5, 2024"), Some(ymd(2024, 3, 5)));
        assert_eq!(parse_report_date("05-Mar-2024"), Some(ymd(2024, 3, 5)));
        assert_eq!(parse_report_date("03/05/24"), Some(ymd(2024, 3, 5)));
        assert_eq!(parse_report_date("11/30/98"), Some(ymd(1998, 11, 30)));
        assert_eq!(parse_report_date("03/05/0024"), None);
        assert_eq!(parse_report_date("13/45/2024"), None);
        assert_eq!(parse_report_date(""), None);
    }

    #[test]
    fn test_report_date_label_priority() {
        let text = "Date of Collection: 01/02/2024\nReport Date: 01/09/2024";
        assert_eq!(report_date(text), Some(ymd(2024, 1, 9)));
    }

    #[test]
    fn test_report_date_other_labels() {
        assert_eq!(
            report_date("Date Received: 2023-11-30"),
            Some(ymd(2023, 11, 30))
        );
        assert_eq!(
            report_date("ADDENDUM SIGN-OUT DATE: Feb 14, 2024"),
            Some(ymd(2024, 2, 14))
        );
        assert_eq!(report_date("Date of Collection: 3/5/24"), Some(ymd(2024, 3, 5)));
        assert_eq!(report_date("Printed 2024-01-01"), None);
    }

    #[test]
    fn test_unparseable_report_date_falls_through() {
        let text = "Report Date: 99/99/2024\nDate Received: 2024-04-01";
        assert_eq!(report_date(text), Some(ymd(2024, 4, 1)));
    }
}
