pub mod derive;
pub mod fields;
mod geo;
pub mod score;

pub use fields::{FieldRule, FIELD_RULES};
pub use geo::{GeographicNormalizer, STATE_CODES};
pub use score::weighted_ratio;

/// Score a candidate must reach to be accepted when a rule does not pin its own.
pub const DEFAULT_THRESHOLD: u8 = 60;

const MISSING_LITERALS: [&str; 3] = ["missing", "nan", "null"];

/// True for values that carry no information: blank text or a placeholder
/// literal such as `Missing`.
pub fn is_missing(raw: Option<&str>) -> bool {
    match raw {
        None => true,
        Some(value) => {
            let trimmed = value.trim();
            trimmed.is_empty()
                || MISSING_LITERALS
                    .iter()
                    .any(|literal| trimmed.eq_ignore_ascii_case(literal))
        }
    }
}

/// Outcome of normalizing one raw value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchResult {
    /// A member of the canonical option set, in its stored casing.
    Canonical(String),
    /// The configured default for values that were missing or scored too low.
    Default(String),
    Missing,
}

impl MatchResult {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Canonical(value) | Self::Default(value) => Some(value),
            Self::Missing => None,
        }
    }

    pub fn into_option(self) -> Option<String> {
        match self {
            Self::Canonical(value) | Self::Default(value) => Some(value),
            Self::Missing => None,
        }
    }
}

/// Maps free text onto the closest member of a fixed vocabulary.
#[derive(Debug, Clone)]
pub struct CategoryNormalizer {
    options: Vec<String>,
    folded: Vec<String>,
    threshold: u8,
    default: Option<String>,
    case_fold: bool,
}

impl CategoryNormalizer {
    /// Builds a normalizer with the default threshold, no default value and
    /// case folding enabled.
    pub fn new<I, S>(options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let options: Vec<String> = options.into_iter().map(Into::into).collect();
        let mut normalizer = Self {
            folded: Vec::new(),
            options,
            threshold: DEFAULT_THRESHOLD,
            default: None,
            case_fold: true,
        };
        normalizer.refold();
        normalizer
    }

    pub fn with_threshold(mut self, threshold: u8) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_case_fold(mut self, case_fold: bool) -> Self {
        self.case_fold = case_fold;
        self.refold();
        self
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    fn refold(&mut self) {
        self.folded = self
            .options
            .iter()
            .map(|option| self.fold(option))
            .collect();
    }

    fn fold(&self, value: &str) -> String {
        if self.case_fold {
            value.to_lowercase()
        } else {
            value.to_string()
        }
    }

    /// Highest scoring option regardless of threshold. Ties keep the option
    /// listed first.
    pub fn best_match(&self, raw: &str) -> Option<(&str, u8)> {
        let query = self.fold(raw.trim());
        let mut best: Option<(usize, u8)> = None;

        for (index, option) in self.folded.iter().enumerate() {
            let score = weighted_ratio(&query, option);
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((index, score)),
            }
        }

        best.map(|(index, score)| (self.options[index].as_str(), score))
    }

    pub fn normalize(&self, raw: Option<&str>) -> MatchResult {
        let raw = match raw {
            Some(value) if !is_missing(Some(value)) => value,
            _ => return self.fallback(),
        };

        match self.best_match(raw) {
            Some((option, score)) if score >= self.threshold => {
                MatchResult::Canonical(option.to_string())
            }
            _ => self.fallback(),
        }
    }

    /// Normalizes a whole column, preserving length and order.
    pub fn normalize_all<'a, I>(&self, values: I) -> Vec<MatchResult>
    where
        I: IntoIterator<Item = Option<&'a str>>,
    {
        values.into_iter().map(|raw| self.normalize(raw)).collect()
    }

    fn fallback(&self) -> MatchResult {
        match &self.default {
            Some(value) => MatchResult::Default(value.clone()),
            None => MatchResult::Missing,
        }
    }
}
