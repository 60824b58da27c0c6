//! Field schemas for every entity kind.
//!
//! A schema is the ordered list of fields an import inspects. The import
//! template is generated from the same list, so adding a field here adds it
//! to both.
//!
//! Soft-format rules encode Zimbabwean conventions (phone prefix, national
//! ID layout, scheme membership numbers). They only ever produce warnings.

use chrono::{DateTime, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::EntityKind;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

static NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)$").expect("valid number regex"));

static ZW_PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+263\d{9}$").expect("valid phone regex"));

static ZW_NATIONAL_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{2}-\d{6,7}-[A-Z]-\d{2}$").expect("valid id regex"));

static MEMBERSHIP_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^PP-\d{4}-\d{6}$").expect("valid membership regex"));

static CURRENCY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{3}$").expect("valid currency regex"));

/// Claim categories accepted by the claims service.
pub const CLAIM_TYPES: &[&str] = &[
    "MEDICAL_CONSULTATION",
    "PRESCRIPTION",
    "HOSPITALIZATION",
    "DENTAL",
    "OPTICAL",
    "MATERNITY",
    "CHRONIC",
    "OTHER",
];

/// Ledger entry types.
pub const TRANSACTION_TYPES: &[&str] = &["PAYMENT", "REFUND", "ADJUSTMENT"];

/// Payment channels.
pub const PAYMENT_METHODS: &[&str] = &[
    "ECOCASH",
    "ONEMONEY",
    "INNBUCKS",
    "VISA",
    "MASTERCARD",
    "BANK_TRANSFER",
    "CASH",
];

// =============================================================================
// Rule Types
// =============================================================================

/// A single check applied to a non-empty field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    /// Blocking: `local@domain.tld`.
    Email,
    /// Blocking: decimal number.
    Number,
    /// Blocking: numeric value greater than zero. Skipped when not a number.
    Positive,
    /// Blocking: calendar date that is not after the reference date.
    PastDate,
    /// Blocking: one of a closed set of codes, case-insensitive.
    OneOf(&'static [&'static str]),
    /// Warning only.
    Soft(SoftRule),
}

/// Recommended shapes that never block a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoftRule {
    Phone,
    NationalId,
    MembershipNumber,
    Currency,
}

/// How an accepted value is rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normalize {
    Trim,
    Lowercase,
    Uppercase,
    StripWhitespace,
}

/// One field of an entity schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub required: bool,
    pub checks: &'static [Check],
    pub normalize: Normalize,
}

impl FieldSpec {
    const fn required(name: &'static str, checks: &'static [Check], normalize: Normalize) -> Self {
        Self { name, required: true, checks, normalize }
    }

    const fn optional(name: &'static str, checks: &'static [Check], normalize: Normalize) -> Self {
        Self { name, required: false, checks, normalize }
    }

    /// Apply this field's normalization to a trimmed value.
    pub fn normalize(&self, value: &str) -> String {
        let value = value.trim();
        match self.normalize {
            Normalize::Trim => value.to_string(),
            Normalize::Lowercase => value.to_lowercase(),
            Normalize::Uppercase => value.to_uppercase(),
            Normalize::StripWhitespace => value.chars().filter(|c| !c.is_whitespace()).collect(),
        }
    }
}

// =============================================================================
// Schemas
// =============================================================================

const MEMBER_FIELDS: &[FieldSpec] = &[
    FieldSpec::required("firstName", &[], Normalize::Trim),
    FieldSpec::required("surname", &[], Normalize::Trim),
    FieldSpec::required("email", &[Check::Email], Normalize::Lowercase),
    FieldSpec::required("phone", &[Check::Soft(SoftRule::Phone)], Normalize::StripWhitespace),
    FieldSpec::required("idNumber", &[Check::Soft(SoftRule::NationalId)], Normalize::Uppercase),
    FieldSpec::required("dateOfBirth", &[Check::PastDate], Normalize::Trim),
    FieldSpec::optional("address", &[], Normalize::Trim),
    FieldSpec::optional("packageId", &[], Normalize::Trim),
    FieldSpec::optional("notes", &[], Normalize::Trim),
];

const APPLICATION_FIELDS: &[FieldSpec] = &[
    FieldSpec::required("firstName", &[], Normalize::Trim),
    FieldSpec::required("surname", &[], Normalize::Trim),
    FieldSpec::required("email", &[Check::Email], Normalize::Lowercase),
    FieldSpec::required("phone", &[Check::Soft(SoftRule::Phone)], Normalize::StripWhitespace),
    FieldSpec::required("idNumber", &[Check::Soft(SoftRule::NationalId)], Normalize::Uppercase),
    FieldSpec::required("dateOfBirth", &[Check::PastDate], Normalize::Trim),
    FieldSpec::optional("address", &[], Normalize::Trim),
    FieldSpec::optional("employerName", &[], Normalize::Trim),
    FieldSpec::optional("packageId", &[], Normalize::Trim),
];

const CLAIM_FIELDS: &[FieldSpec] = &[
    FieldSpec::required(
        "membershipNumber",
        &[Check::Soft(SoftRule::MembershipNumber)],
        Normalize::Uppercase,
    ),
    FieldSpec::required("type", &[Check::OneOf(CLAIM_TYPES)], Normalize::Uppercase),
    FieldSpec::required("provider", &[], Normalize::Trim),
    FieldSpec::required("serviceDate", &[Check::PastDate], Normalize::Trim),
    FieldSpec::required("amount", &[Check::Number, Check::Positive], Normalize::Trim),
    FieldSpec::optional("description", &[], Normalize::Trim),
    FieldSpec::optional("receiptNumber", &[], Normalize::Trim),
];

const TRANSACTION_FIELDS: &[FieldSpec] = &[
    FieldSpec::required(
        "membershipNumber",
        &[Check::Soft(SoftRule::MembershipNumber)],
        Normalize::Uppercase,
    ),
    FieldSpec::required("type", &[Check::OneOf(TRANSACTION_TYPES)], Normalize::Uppercase),
    FieldSpec::required("method", &[Check::OneOf(PAYMENT_METHODS)], Normalize::Uppercase),
    FieldSpec::required("amount", &[Check::Number, Check::Positive], Normalize::Trim),
    FieldSpec::optional("currency", &[Check::Soft(SoftRule::Currency)], Normalize::Uppercase),
    FieldSpec::optional("reference", &[], Normalize::Trim),
    FieldSpec::required("date", &[Check::PastDate], Normalize::Trim),
];

/// Field schema of an entity kind, in template order.
pub fn schema(kind: EntityKind) -> &'static [FieldSpec] {
    match kind {
        EntityKind::Members => MEMBER_FIELDS,
        EntityKind::Applications => APPLICATION_FIELDS,
        EntityKind::Claims => CLAIM_FIELDS,
        EntityKind::Transactions => TRANSACTION_FIELDS,
    }
}

// =============================================================================
// Check Evaluation
// =============================================================================

/// Outcome of a failed check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finding {
    Error(String),
    Warning(String),
}

/// Parse `YYYY-MM-DD`, or the date part of an RFC 3339 timestamp.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive()))
}

impl Check {
    /// Evaluate against a trimmed, non-empty value.
    pub fn evaluate(&self, field: &str, value: &str, today: NaiveDate) -> Option<Finding> {
        match self {
            Check::Email => (!EMAIL_RE.is_match(value))
                .then(|| Finding::Error("Invalid email format".to_string())),
            Check::Number => (!NUMBER_RE.is_match(value))
                .then(|| Finding::Error(format!("{} must be a valid number", field))),
            Check::Positive => match value.parse::<f64>() {
                Ok(n) if NUMBER_RE.is_match(value) && n <= 0.0 => {
                    Some(Finding::Error(format!("{} must be greater than zero", field)))
                }
                _ => None,
            },
            Check::PastDate => match parse_date(value) {
                None => Some(Finding::Error(
                    "Invalid date format. Use YYYY-MM-DD".to_string(),
                )),
                Some(date) if date > today => Some(Finding::Error(format!(
                    "{} cannot be in the future",
                    field
                ))),
                Some(_) => None,
            },
            Check::OneOf(allowed) => {
                let upper = value.to_uppercase();
                (!allowed.contains(&upper.as_str())).then(|| {
                    Finding::Error(format!(
                        "Invalid {}. Valid values: {}",
                        field,
                        allowed.join(", ")
                    ))
                })
            }
            Check::Soft(rule) => rule.evaluate(value).map(Finding::Warning),
        }
    }
}

impl SoftRule {
    fn evaluate(&self, value: &str) -> Option<String> {
        match self {
            SoftRule::Phone => {
                let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect();
                (!ZW_PHONE_RE.is_match(&compact)).then(|| {
                    "Phone number may not be in correct Zimbabwe format (+263XXXXXXXXX)"
                        .to_string()
                })
            }
            SoftRule::NationalId => (!ZW_NATIONAL_ID_RE.is_match(value)).then(|| {
                "ID number may not be in correct format (XX-XXXXXX-X-XX)".to_string()
            }),
            SoftRule::MembershipNumber => (!MEMBERSHIP_NUMBER_RE.is_match(&value.to_uppercase()))
                .then(|| {
                    "Membership number may not be in correct format (PP-YYYY-NNNNNN)".to_string()
                }),
            SoftRule::Currency => (!CURRENCY_RE.is_match(&value.to_uppercase()))
                .then(|| "Currency should be a 3-letter ISO code (e.g. USD)".to_string()),
        }
    }
}
