use super::{is_missing, CategoryNormalizer, MatchResult, DEFAULT_THRESHOLD};

/// States served by the program, mapped to postal codes.
pub const STATE_CODES: &[(&str, &str)] = &[
    ("Nebraska", "NE"),
    ("Iowa", "IA"),
    ("Kansas", "KS"),
    ("Missouri", "MO"),
    ("South Dakota", "SD"),
    ("Wyoming", "WY"),
    ("Colorado", "CO"),
    ("Minnesota", "MN"),
];

/// Resolves state names to postal codes.
///
/// Unlike [`CategoryNormalizer`], an unmatched value is kept as written
/// instead of being replaced by a default: out-of-area states stay visible
/// in breakdowns.
#[derive(Debug, Clone)]
pub struct GeographicNormalizer {
    names: CategoryNormalizer,
    table: &'static [(&'static str, &'static str)],
}

impl Default for GeographicNormalizer {
    fn default() -> Self {
        Self::new(STATE_CODES, DEFAULT_THRESHOLD)
    }
}

impl GeographicNormalizer {
    pub fn new(table: &'static [(&'static str, &'static str)], threshold: u8) -> Self {
        let names = CategoryNormalizer::new(table.iter().map(|(name, _)| *name))
            .with_threshold(threshold);
        Self { names, table }
    }

    /// Postal code for `raw`, or `raw` itself unchanged when nothing scores
    /// acceptably. Missing input stays missing.
    pub fn resolve(&self, raw: Option<&str>) -> Option<String> {
        let raw = match raw {
            Some(value) if !is_missing(Some(value)) => value,
            _ => return None,
        };

        Some(
            self.lookup(raw)
                .map_or_else(|| raw.to_string(), str::to_string),
        )
    }

    /// Postal code for a state name, misspelling or code; `None` when no table
    /// entry scores acceptably.
    pub fn lookup(&self, raw: &str) -> Option<&'static str> {
        let raw = raw.trim();
        if let Some((_, code)) = self
            .table
            .iter()
            .find(|(_, code)| code.eq_ignore_ascii_case(raw))
        {
            return Some(*code);
        }

        match self.names.normalize(Some(raw)) {
            MatchResult::Canonical(name) => self.code_for(&name),
            MatchResult::Default(_) | MatchResult::Missing => None,
        }
    }

    fn code_for(&self, name: &str) -> Option<&'static str> {
        self.table
            .iter()
            .find(|(candidate, _)| *candidate == name)
            .map(|(_, code)| *code)
    }
}
