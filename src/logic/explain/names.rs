//! Reverse mapping: derived column -> original field display name
//!
//! Lookup order:
//! 1. Known derived features (fixed display names)
//! 2. FeatureMapping entries from the provider
//! 3. Aggregate patterns (`*_mean`, `*_std`, `*_count` over Paid_amount, `*_nunique` over Member_ID)
//! 4. Cleanup of the column name

use std::collections::HashMap;

use crate::logic::features::FeatureMapping;

static DERIVED_NAMES: &[(&str, &str)] = &[
    ("Duration", "Treatment Duration"),
    ("Claim_Delay", "Claim Processing Delay"),
    ("Invoice_DayOfWeek", "Invoice Day of Week"),
    ("Invoice_Month", "Invoice Month"),
    ("Invoice_Quarter", "Invoice Quarter"),
    ("Invoice_IsWeekend", "Weekend Invoice Flag"),
    ("Paid_to_Claimed_Ratio", "Payment Ratio"),
    ("Full_Payment_Flag", "Full Payment Flag"),
    ("Provider_Payment_Deviation", "Provider Payment Deviation"),
    ("Member_Total_Paid", "Member Total Payments"),
    ("Member_Provider_Count", "Member Provider Count"),
];

/// Capitalize the first letter of every alphabetic run, lowercase the rest
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_word = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

fn pattern_name(column: &str) -> Option<&'static str> {
    if column.contains("Paid_amount") {
        if column.ends_with("_mean") {
            return Some("Provider Average Payment");
        }
        if column.ends_with("_std") {
            return Some("Provider Payment Variability");
        }
        if column.ends_with("_count") {
            return Some("Provider Transaction Count");
        }
    }
    if column.ends_with("_nunique") && column.contains("Member_ID") {
        return Some("Provider Unique Members");
    }
    None
}

fn cleaned_name(column: &str) -> String {
    let cleaned = column
        .replace("_freqenc", "")
        .replace("_log_freq", "")
        .replace("_emb", " Component")
        .replace('_', " ");
    title_case(&cleaned)
}

/// Display field for one derived column
pub fn field_for(column: &str, by_column: &HashMap<&str, &str>) -> String {
    if let Some((_, display)) = DERIVED_NAMES.iter().find(|(name, _)| *name == column) {
        return (*display).to_string();
    }
    if let Some(field) = by_column.get(column) {
        return (*field).to_string();
    }
    if let Some(display) = pattern_name(column) {
        return display.to_string();
    }
    cleaned_name(column)
}

/// Field name for every main column, in column order
pub fn reverse_map(columns: &[String], mapping: &FeatureMapping) -> Vec<String> {
    let mut by_column: HashMap<&str, &str> = HashMap::new();
    for (field, derived) in mapping.iter() {
        for column in derived {
            by_column.insert(column.as_str(), field.as_str());
        }
    }
    columns.iter().map(|c| field_for(c, &by_column)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_mapping_wins() {
        let mapping = FeatureMapping::new().with("Provider_ID", &["Provider_ID_freqenc", "Provider_ID_emb0"]);
        let fields = reverse_map(&cols(&["Provider_ID_freqenc", "Provider_ID_emb0"]), &mapping);
        assert_eq!(fields, vec!["Provider_ID", "Provider_ID"]);
    }

    #[test]
    fn test_derived_name_beats_mapping() {
        let mapping = FeatureMapping::new()
            .with("Claim_Delay", &["Claim_Delay"])
            .with("Paid_amount", &["Paid_amount"]);
        let fields = reverse_map(&cols(&["Claim_Delay", "Paid_amount"]), &mapping);
        assert_eq!(fields, vec!["Claim Processing Delay", "Paid_amount"]);
    }

    #[test]
    fn test_derived_and_pattern_names() {
        let fields = reverse_map(
            &cols(&["Claim_Delay", "Provider_ID_Paid_amount_mean", "Provider_ID_Member_ID_nunique"]),
            &FeatureMapping::new(),
        );
        assert_eq!(
            fields,
            vec!["Claim Processing Delay", "Provider Average Payment", "Provider Unique Members"]
        );
    }

    #[test]
    fn test_cleanup_fallback() {
        let fields = reverse_map(
            &cols(&["diagnosis_code_freqenc", "Service_Type_emb1", "Visit_log_freq"]),
            &FeatureMapping::new(),
        );
        assert_eq!(fields, vec!["Diagnosis Code", "Service Type Component1", "Visit"]);
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("claim AMOUNT 2nd"), "Claim Amount 2Nd");
        assert_eq!(title_case("x component0"), "X Component0");
    }
}
