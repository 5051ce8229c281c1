//! Root-cause narrative

use super::names::title_case;
use super::types::FieldDetails;

const NO_DRIVER: &str = "multiple areas";

/// Field attributed to the most flagged records; first seen wins ties
pub fn top_driver(details: &[FieldDetails]) -> String {
    let mut best: Option<&FieldDetails> = None;
    for d in details {
        if best.map_or(true, |b| d.records.len() > b.records.len()) {
            best = Some(d);
        }
    }
    match best {
        Some(d) => title_case(&d.field.replace('_', " ")),
        None => NO_DRIVER.to_string(),
    }
}

/// Three-point business summary. Empty when nothing was flagged.
pub fn root_cause(details: &[FieldDetails], total_flagged: usize) -> String {
    if total_flagged == 0 {
        return String::new();
    }
    let driver = top_driver(details);
    format!(
        "1. AI analysis has identified {total} suspicious claims requiring review, \
         highlighting a significant opportunity for cost savings and risk mitigation.\n\n\
         2. The primary driver of these anomalies appears to be '{driver}'. \
         This suggests a pattern of either systemic billing issues or targeted fraudulent activity in this area.\n\n\
         3. Recommendation: Immediately assign the high-priority cases for investigation, \
         focusing on the '{driver}' pattern to quickly address the largest area of financial and compliance risk.",
        total = total_flagged,
        driver = driver
    )
}
