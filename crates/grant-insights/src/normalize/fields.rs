//! Declarative cleaning rules for the categorical columns of a grant export.

use super::CategoryNormalizer;
use crate::columns::{
    APPLICATION_SIGNED, ASSISTANCE_TYPE, GENDER, INSURANCE_TYPE, MARITAL_STATUS, RACE,
    REQUEST_STATUS,
};

/// How one categorical column is normalized.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub column: &'static str,
    pub options: &'static [&'static str],
    /// `None` defers to the configured default threshold.
    pub threshold: Option<u8>,
    /// Emitted for missing or unmatched input. `None` leaves the cell missing.
    pub default: Option<&'static str>,
    pub case_fold: bool,
}

impl FieldRule {
    pub fn normalizer(&self, default_threshold: u8) -> CategoryNormalizer {
        let normalizer = CategoryNormalizer::new(self.options.iter().copied())
            .with_case_fold(self.case_fold)
            .with_threshold(self.threshold.unwrap_or(default_threshold));

        match self.default {
            Some(default) => normalizer.with_default(default),
            None => normalizer,
        }
    }
}

pub const FIELD_RULES: &[FieldRule] = &[
    FieldRule {
        column: REQUEST_STATUS,
        options: &["pending", "approved", "denied", "completed"],
        threshold: None,
        default: None,
        case_fold: true,
    },
    FieldRule {
        column: APPLICATION_SIGNED,
        options: &["yes", "no", "N/A"],
        threshold: None,
        default: Some("N/A"),
        case_fold: true,
    },
    FieldRule {
        column: GENDER,
        options: &[
            "male",
            "female",
            "transgender",
            "nonbinary",
            "decline to answer",
            "other",
        ],
        threshold: None,
        default: None,
        case_fold: true,
    },
    FieldRule {
        column: RACE,
        options: &[
            "American Indian or Alaska Native",
            "Asian",
            "Black or African American",
            "Middle Eastern or North African",
            "Native Hawaiian or Pacific Islander",
            "White",
            "decline to answer",
            "other",
            "two or more",
        ],
        threshold: None,
        default: None,
        case_fold: false,
    },
    FieldRule {
        column: INSURANCE_TYPE,
        options: &[
            "medicare",
            "medicaid",
            "medicare & medicaid",
            "uninsured",
            "private",
            "military",
            "unknown",
        ],
        threshold: None,
        default: None,
        case_fold: true,
    },
    FieldRule {
        column: MARITAL_STATUS,
        options: &[
            "single",
            "married",
            "widowed",
            "divorced",
            "domestic partnership",
            "separated",
        ],
        threshold: None,
        default: None,
        case_fold: true,
    },
    FieldRule {
        column: ASSISTANCE_TYPE,
        options: &[
            "Medical Supplies/Prescription Co-pay(s)",
            "Food/Groceries",
            "Gas",
            "Other",
            "Hotel",
            "Housing",
            "Utilities",
            "Car Payment",
            "Phone/Internet",
            "Multiple",
        ],
        threshold: None,
        default: None,
        case_fold: false,
    },
];

pub fn rule_for(column: &str) -> Option<&'static FieldRule> {
    FIELD_RULES.iter().find(|rule| rule.column == column)
}
