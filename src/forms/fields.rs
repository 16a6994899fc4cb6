// Field validation rules
//
// Pure and synchronous: (rule, raw value) -> optional error message. Empty
// input and malformed input produce distinct messages so the form can tell
// "you skipped this" apart from "fix the format". Length checks run on
// trimmed input; PAN/GSTIN/CIN are matched case-insensitively by uppercasing
// first.

use log::error;
use regex::Regex;

/// A field in a service definition: wire key, display label, and rule.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub rule: FieldRule,
}

pub const fn field(key: &'static str, label: &'static str, rule: FieldRule) -> FieldSpec {
    FieldSpec { key, label, rule }
}

/// Validation rule attached to a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRule {
    /// Person/company name: non-empty, minimum trimmed length
    Name { min_len: usize },
    /// local@domain.tld shape
    Email,
    /// Exactly 10 digits after stripping separators
    Phone,
    /// Permanent Account Number: 5 letters, 4 digits, 1 letter
    Pan,
    /// Exactly 6 digits
    Pincode,
    /// 15-character GSTIN
    Gstin,
    /// 21-character corporate identity number
    Cin,
    /// Integer within [min, max] inclusive
    Amount { min: i64, max: i64 },
    /// Assessment year like "2025-26"
    AssessmentYear,
    /// Free text with a minimum trimmed length
    Text { min_len: usize },
    /// Non-empty after trimming (choice fields, short answers)
    Required,
}

const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";
const PAN_PATTERN: &str = r"^[A-Z]{5}[0-9]{4}[A-Z]{1}$";
const PINCODE_PATTERN: &str = r"^[0-9]{6}$";
const PHONE_PATTERN: &str = r"^[0-9]{10}$";
const GSTIN_PATTERN: &str = r"^[0-9]{2}[A-Z]{5}[0-9]{4}[A-Z]{1}[1-9A-Z]{1}Z[0-9A-Z]{1}$";
const CIN_PATTERN: &str = r"^[LU][0-9]{5}[A-Z]{2}[0-9]{4}[A-Z]{3}[0-9]{6}$";
const ASSESSMENT_YEAR_PATTERN: &str = r"^[0-9]{4}-[0-9]{2}$";

/// Validate one field. Returns None when the value passes.
pub fn validate_field(spec: &FieldSpec, value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Some(format!("{} is required", spec.label));
    }

    match spec.rule {
        FieldRule::Name { min_len } | FieldRule::Text { min_len } => {
            if trimmed.len() < min_len {
                Some(format!(
                    "{} must be at least {} characters",
                    spec.label, min_len
                ))
            } else {
                None
            }
        }
        FieldRule::Email => match_format(spec, EMAIL_PATTERN, trimmed),
        FieldRule::Phone => {
            let digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();
            match_format(spec, PHONE_PATTERN, &digits)
        }
        FieldRule::Pan => match_format(spec, PAN_PATTERN, &trimmed.to_uppercase()),
        FieldRule::Pincode => match_format(spec, PINCODE_PATTERN, trimmed),
        FieldRule::Gstin => match_format(spec, GSTIN_PATTERN, &trimmed.to_uppercase()),
        FieldRule::Cin => match_format(spec, CIN_PATTERN, &trimmed.to_uppercase()),
        FieldRule::AssessmentYear => match_format(spec, ASSESSMENT_YEAR_PATTERN, trimmed),
        FieldRule::Amount { min, max } => match trimmed.parse::<i64>() {
            Ok(n) if n >= min && n <= max => None,
            Ok(_) => Some(format!("{} must be between {} and {}", spec.label, min, max)),
            Err(_) => Some(format!("Invalid {} format", spec.label)),
        },
        FieldRule::Required => None,
    }
}

/// Normalization applied when a field value is committed to the form state.
/// PAN/GSTIN/CIN are stored uppercase; everything else is stored as typed.
pub fn normalize_for_storage(rule: FieldRule, value: &str) -> String {
    match rule {
        FieldRule::Pan | FieldRule::Gstin | FieldRule::Cin => value.to_uppercase(),
        _ => value.to_string(),
    }
}

fn match_format(spec: &FieldSpec, pattern: &str, candidate: &str) -> Option<String> {
    let re = match Regex::new(pattern) {
        Ok(re) => re,
        Err(e) => {
            error!(
                "[PHASE: wizard] [STEP: validate] Internal error compiling rule for '{}': {}",
                spec.key, e
            );
            return Some(format!("Unable to validate {}. Please retry.", spec.label));
        }
    };
    if re.is_match(candidate) {
        None
    } else {
        Some(format!("Invalid {} format", spec.label))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_NAME: FieldSpec = field("fullName", "Full name", FieldRule::Name { min_len: 3 });
    const EMAIL: FieldSpec = field("email", "Email", FieldRule::Email);
    const PHONE: FieldSpec = field("phone", "Phone number", FieldRule::Phone);
    const PAN: FieldSpec = field("panNumber", "PAN number", FieldRule::Pan);
    const PINCODE: FieldSpec = field("pincode", "Pincode", FieldRule::Pincode);
    const GSTIN: FieldSpec = field("gstNumber", "GST number", FieldRule::Gstin);
    const CIN: FieldSpec = field("cinNumber", "CIN", FieldRule::Cin);
    const LOAN_AMOUNT: FieldSpec = field(
        "loanAmount",
        "Loan amount",
        FieldRule::Amount {
            min: 10_000,
            max: 500_000,
        },
    );
    const YEAR: FieldSpec = field("assessmentYear", "Assessment year", FieldRule::AssessmentYear);

    #[test]
    fn empty_and_invalid_get_distinct_messages() {
        let empty = validate_field(&PAN, "").unwrap();
        let invalid = validate_field(&PAN, "ABC123").unwrap();
        assert_eq!(empty, "PAN number is required");
        assert_eq!(invalid, "Invalid PAN number format");
        assert_ne!(empty, invalid);
    }

    #[test]
    fn pan_matches_rule_exactly() {
        // Valid: 5 letters + 4 digits + 1 letter
        assert!(validate_field(&PAN, "ABCDE1234F").is_none());
        // Lowercase input normalizes to uppercase before matching
        assert!(validate_field(&PAN, "abcde1234f").is_none());
        assert!(validate_field(&PAN, "  ABCDE1234F  ").is_none());

        for bad in ["ABCDE12345", "ABCD51234F", "ABCDE1234", "ABCDE1234FX", "1BCDE1234F"] {
            assert!(
                validate_field(&PAN, bad).is_some(),
                "'{}' should be rejected",
                bad
            );
        }
    }

    #[test]
    fn pincode_requires_exactly_six_digits() {
        assert!(validate_field(&PINCODE, "560038").is_none());
        for bad in ["56003", "5600380", "56003A", "560 38"] {
            assert!(
                validate_field(&PINCODE, bad).is_some(),
                "'{}' should be rejected",
                bad
            );
        }
    }

    #[test]
    fn phone_strips_separators_then_requires_ten_digits() {
        assert!(validate_field(&PHONE, "9876543210").is_none());
        assert!(validate_field(&PHONE, "98765-43210").is_none());
        assert!(validate_field(&PHONE, "98765 43210").is_none());

        // 11 digits after stripping is rejected (country code not accepted here)
        assert!(validate_field(&PHONE, "+91 9876543210").is_some());
        assert!(validate_field(&PHONE, "987654321").is_some());
    }

    #[test]
    fn email_requires_local_at_domain_tld() {
        assert!(validate_field(&EMAIL, "a@b.com").is_none());
        assert!(validate_field(&EMAIL, "asha.rao@finbridge.in").is_none());

        for bad in ["plainaddress", "a@b", "a b@c.com", "@b.com", "a@.com "] {
            assert!(
                validate_field(&EMAIL, bad).is_some(),
                "'{}' should be rejected",
                bad
            );
        }
    }

    #[test]
    fn name_enforces_minimum_trimmed_length() {
        assert!(validate_field(&FULL_NAME, "Asha Rao").is_none());
        assert_eq!(
            validate_field(&FULL_NAME, "Al").as_deref(),
            Some("Full name must be at least 3 characters")
        );
        // Whitespace padding can't satisfy the minimum
        assert!(validate_field(&FULL_NAME, " A ").is_some());
    }

    #[test]
    fn loan_amount_below_minimum_gets_range_message() {
        let err = validate_field(&LOAN_AMOUNT, "5000").unwrap();
        assert_eq!(err, "Loan amount must be between 10000 and 500000");
        assert!(validate_field(&LOAN_AMOUNT, "50000").is_none());
        assert!(validate_field(&LOAN_AMOUNT, "10000").is_none(), "min is inclusive");
        assert!(validate_field(&LOAN_AMOUNT, "500000").is_none(), "max is inclusive");
        assert!(validate_field(&LOAN_AMOUNT, "500001").is_some());
    }

    #[test]
    fn loan_amount_non_numeric_is_a_format_error() {
        assert_eq!(
            validate_field(&LOAN_AMOUNT, "fifty thousand").as_deref(),
            Some("Invalid Loan amount format")
        );
    }

    #[test]
    fn gstin_accepts_standard_shape() {
        assert!(validate_field(&GSTIN, "29ABCDE1234F1Z5").is_none());
        assert!(validate_field(&GSTIN, "29abcde1234f1z5").is_none());
        for bad in ["29ABCDE1234F1X5", "9ABCDE1234F1Z5", "29ABCDE1234F1Z"] {
            assert!(
                validate_field(&GSTIN, bad).is_some(),
                "'{}' should be rejected",
                bad
            );
        }
    }

    #[test]
    fn cin_accepts_standard_shape() {
        assert!(validate_field(&CIN, "U72200KA2015PTC081234").is_none());
        assert!(validate_field(&CIN, "L17110MH1973PLC019786").is_none());
        for bad in ["X72200KA2015PTC081234", "U72200KA2015PT081234", "U72200KA2015PTC08123"] {
            assert!(
                validate_field(&CIN, bad).is_some(),
                "'{}' should be rejected",
                bad
            );
        }
    }

    #[test]
    fn assessment_year_requires_yyyy_dash_yy() {
        assert!(validate_field(&YEAR, "2025-26").is_none());
        for bad in ["2025", "25-26", "2025/26", "2025-2026"] {
            assert!(
                validate_field(&YEAR, bad).is_some(),
                "'{}' should be rejected",
                bad
            );
        }
    }

    #[test]
    fn required_rule_only_checks_presence() {
        let spec = field("employmentType", "Employment type", FieldRule::Required);
        assert!(validate_field(&spec, "Salaried").is_none());
        assert_eq!(
            validate_field(&spec, "   ").as_deref(),
            Some("Employment type is required")
        );
    }

    #[test]
    fn storage_normalization_uppercases_identity_fields_only() {
        assert_eq!(normalize_for_storage(FieldRule::Pan, "abcde1234f"), "ABCDE1234F");
        assert_eq!(
            normalize_for_storage(FieldRule::Gstin, "29abcde1234f1z5"),
            "29ABCDE1234F1Z5"
        );
        assert_eq!(
            normalize_for_storage(FieldRule::Name { min_len: 3 }, "Asha Rao"),
            "Asha Rao"
        );
    }
}
