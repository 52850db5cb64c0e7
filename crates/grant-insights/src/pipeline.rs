//! The single cleaning pass over a grant export.

use crate::columns::{
    AMOUNT, ANNUALIZED_INCOME, GRANT_REQUEST_DATE, HISPANIC_LATINO, INCOME_LEVEL, MONTHLY_INCOME,
    PAYMENT_SUBMITTED, REMAINING_BALANCE, RENAMES, STATE, TIME_TO_SUPPORT, YEAR,
};
use crate::dataset::{Column, DatasetSource, Table, Value};
use crate::error::GrantDataError;
use crate::normalize::derive::{
    annualize_monthly, elapsed_days, hispanic_flag, parse_date, parse_number, year_of,
    IncomeBracket,
};
use crate::normalize::{
    is_missing, CategoryNormalizer, FieldRule, GeographicNormalizer, MatchResult,
    DEFAULT_THRESHOLD, FIELD_RULES, STATE_CODES,
};
use serde::Serialize;
use tracing::{debug, info};

/// Per-column outcome counts for one cleaning run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldSummary {
    pub column: String,
    pub matched: usize,
    pub defaulted: usize,
    /// Values left as written because nothing matched (state names only).
    pub kept: usize,
    pub missing: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleaningSummary {
    pub rows: usize,
    pub renamed: Vec<String>,
    pub fields: Vec<FieldSummary>,
    pub derived_columns: Vec<String>,
}

impl CleaningSummary {
    pub fn field(&self, column: &str) -> Option<&FieldSummary> {
        self.fields.iter().find(|field| field.column == column)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CleanedDataset {
    pub table: Table,
    pub summary: CleaningSummary,
}

/// Applies the field rule table, the state lookup and the derived columns.
#[derive(Debug, Clone)]
pub struct GrantCleaner {
    rules: Vec<(&'static str, CategoryNormalizer)>,
    states: GeographicNormalizer,
}

impl Default for GrantCleaner {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

impl GrantCleaner {
    pub fn new(default_threshold: u8) -> Self {
        Self::with_rules(FIELD_RULES, default_threshold)
    }

    pub fn with_rules(rules: &[FieldRule], default_threshold: u8) -> Self {
        let rules = rules
            .iter()
            .map(|rule| (rule.column, rule.normalizer(default_threshold)))
            .collect();
        Self {
            rules,
            states: GeographicNormalizer::new(STATE_CODES, default_threshold),
        }
    }

    /// Fetches from `source` and cleans. A fetch failure stops the run before
    /// any matching happens.
    pub fn load(&self, source: &dyn DatasetSource) -> Result<CleanedDataset, GrantDataError> {
        let bytes = source.fetch()?;
        info!(source = %source.describe(), bytes = bytes.len(), "loaded grant export");
        self.clean_bytes(&bytes)
    }

    pub fn clean_bytes(&self, bytes: &[u8]) -> Result<CleanedDataset, GrantDataError> {
        let table = Table::from_csv_bytes(bytes)?;
        Ok(self.clean(table))
    }

    pub fn clean(&self, mut table: Table) -> CleanedDataset {
        let mut summary = CleaningSummary {
            rows: table.row_count(),
            ..CleaningSummary::default()
        };

        for (from, to) in RENAMES {
            if table.rename_column(from, to) {
                summary.renamed.push((*to).to_string());
            }
        }

        for (column, normalizer) in &self.rules {
            if let Some(field) = normalize_column(&mut table, column, normalizer) {
                debug!(
                    column = %field.column,
                    matched = field.matched,
                    defaulted = field.defaulted,
                    missing = field.missing,
                    "normalized categorical column"
                );
                summary.fields.push(field);
            }
        }

        if let Some(field) = self.resolve_states(&mut table) {
            debug!(
                matched = field.matched,
                kept = field.kept,
                missing = field.missing,
                "resolved state postal codes"
            );
            summary.fields.push(field);
        }

        derive_columns(&mut table, &mut summary);

        info!(
            rows = summary.rows,
            fields = summary.fields.len(),
            derived = summary.derived_columns.len(),
            "cleaned grant export"
        );

        CleanedDataset { table, summary }
    }

    fn resolve_states(&self, table: &mut Table) -> Option<FieldSummary> {
        let column = table.column_mut(STATE)?;
        let mut field = FieldSummary {
            column: STATE.to_string(),
            ..FieldSummary::default()
        };

        for value in column.values.iter_mut() {
            let resolved = match value.as_text().filter(|raw| !is_missing(Some(*raw))) {
                None => {
                    field.missing += 1;
                    Value::Missing
                }
                Some(raw) => match self.states.lookup(raw) {
                    Some(code) => {
                        field.matched += 1;
                        Value::text(code)
                    }
                    None => {
                        field.kept += 1;
                        Value::text(raw)
                    }
                },
            };
            *value = resolved;
        }

        Some(field)
    }
}

fn normalize_column(
    table: &mut Table,
    name: &str,
    normalizer: &CategoryNormalizer,
) -> Option<FieldSummary> {
    let column = table.column_mut(name)?;
    let mut field = FieldSummary {
        column: name.to_string(),
        ..FieldSummary::default()
    };

    let results = normalizer.normalize_all(column.texts());
    for (value, result) in column.values.iter_mut().zip(results) {
        match &result {
            MatchResult::Canonical(_) => field.matched += 1,
            MatchResult::Default(_) => field.defaulted += 1,
            MatchResult::Missing => field.missing += 1,
        }
        *value = Value::from_option(result.into_option());
    }

    Some(field)
}

fn to_date(value: &Value) -> Value {
    match value {
        Value::Date(date) => Value::Date(*date),
        Value::Text(raw) => Value::from_option(parse_date(raw)),
        _ => Value::Missing,
    }
}

fn to_number(value: &Value) -> Value {
    match value {
        Value::Number(number) => Value::Number(*number),
        Value::Integer(number) => Value::Number(*number as f64),
        Value::Text(raw) => Value::from_option(parse_number(raw)),
        _ => Value::Missing,
    }
}

fn convert_column(table: &mut Table, name: &str, convert: fn(&Value) -> Value) -> bool {
    match table.column_mut(name) {
        Some(column) => {
            for value in column.values.iter_mut() {
                *value = convert(value);
            }
            true
        }
        None => false,
    }
}

fn append_column(table: &mut Table, summary: &mut CleaningSummary, name: &str, values: Vec<Value>) {
    // Derived columns are built from existing columns, so lengths always agree.
    if table.upsert_column(Column::new(name, values)).is_ok() {
        summary.derived_columns.push(name.to_string());
    }
}

fn derive_columns(table: &mut Table, summary: &mut CleaningSummary) {
    convert_column(table, PAYMENT_SUBMITTED, to_date);

    if convert_column(table, GRANT_REQUEST_DATE, to_date) {
        let years = date_values(table, GRANT_REQUEST_DATE)
            .into_iter()
            .map(|date| Value::from_option(date.map(year_of)))
            .collect();
        append_column(table, summary, YEAR, years);
    }

    if convert_column(table, MONTHLY_INCOME, to_number) {
        let annual: Vec<Option<f64>> = table
            .column(MONTHLY_INCOME)
            .map(|column| {
                column
                    .values
                    .iter()
                    .map(|value| value.as_number().map(annualize_monthly))
                    .collect()
            })
            .unwrap_or_default();

        let levels = annual
            .iter()
            .map(|income| {
                Value::from_option(
                    income
                        .and_then(IncomeBracket::for_annual_income)
                        .map(IncomeBracket::label),
                )
            })
            .collect();
        let annual = annual.into_iter().map(Value::from_option).collect();

        append_column(table, summary, ANNUALIZED_INCOME, annual);
        append_column(table, summary, INCOME_LEVEL, levels);
    }

    convert_column(table, AMOUNT, to_number);
    convert_column(table, REMAINING_BALANCE, to_number);

    if let Some(column) = table.column_mut(HISPANIC_LATINO) {
        for value in column.values.iter_mut() {
            *value = Value::from_option(hispanic_flag(value.as_text()));
        }
    }

    if table.has_column(PAYMENT_SUBMITTED) && table.has_column(GRANT_REQUEST_DATE) {
        let requested = date_values(table, GRANT_REQUEST_DATE);
        let paid = date_values(table, PAYMENT_SUBMITTED);
        let days = requested
            .into_iter()
            .zip(paid)
            .map(|(requested, paid)| match (requested, paid) {
                (Some(requested), Some(paid)) => Value::Integer(elapsed_days(paid, requested)),
                _ => Value::Missing,
            })
            .collect();
        append_column(table, summary, TIME_TO_SUPPORT, days);
    }
}

fn date_values(table: &Table, name: &str) -> Vec<Option<chrono::NaiveDate>> {
    table
        .column(name)
        .map(|column| column.values.iter().map(Value::as_date).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::{APPLICATION_SIGNED, GENDER, REQUEST_STATUS};
    use chrono::NaiveDate;

    fn clean(csv: &str) -> CleanedDataset {
        GrantCleaner::default()
            .clean_bytes(csv.as_bytes())
            .expect("csv parses")
    }

    #[test]
    fn renames_legacy_headers() {
        let cleaned = clean("State,Payment Submitted,Application Signed\nNebraska,2024-01-05,Yes\n");
        assert_eq!(
            cleaned.table.column_names(),
            vec!["Pt State", "Payment Submitted?", "Application Signed?"]
        );
        assert_eq!(cleaned.summary.renamed.len(), 3);
        assert_eq!(
            cleaned.table.value(STATE, 0),
            Some(&Value::text("NE"))
        );
        assert_eq!(
            cleaned.table.value(APPLICATION_SIGNED, 0),
            Some(&Value::text("yes"))
        );
    }

    #[test]
    fn only_present_columns_are_touched() {
        let cleaned = clean("Gender\nF e m a l e\n");
        assert_eq!(cleaned.table.column_names(), vec!["Gender"]);
        assert_eq!(cleaned.summary.fields.len(), 1);
        assert!(cleaned.summary.derived_columns.is_empty());
    }

    #[test]
    fn categorical_outputs_stay_inside_the_vocabulary() {
        let cleaned = clean("Request Status\nAPPROVED\npendng\nzzz\nMissing\n");
        let status = cleaned.table.column(REQUEST_STATUS).expect("status column");
        assert_eq!(
            status.values,
            vec![
                Value::text("approved"),
                Value::text("pending"),
                Value::Missing,
                Value::Missing,
            ]
        );
        let field = cleaned.summary.field(REQUEST_STATUS).expect("status summary");
        assert_eq!((field.matched, field.defaulted, field.missing), (2, 0, 2));
    }

    #[test]
    fn missing_signature_becomes_not_applicable() {
        let cleaned = clean("Application Signed?,Gender\n,female\n");
        assert_eq!(
            cleaned.table.value(APPLICATION_SIGNED, 0),
            Some(&Value::text("N/A"))
        );
        let field = cleaned.summary.field(APPLICATION_SIGNED).expect("summary");
        assert_eq!(field.defaulted, 1);
        assert_eq!(cleaned.table.value(GENDER, 0), Some(&Value::text("female")));
    }

    #[test]
    fn derives_dates_year_and_time_to_support() {
        let cleaned = clean(
            "Grant Req Date,Payment Submitted?\n2024-01-01,2024-01-10\n2023-12-30,not paid\n",
        );
        let table = &cleaned.table;
        assert_eq!(
            table.value(GRANT_REQUEST_DATE, 0),
            Some(&Value::Date(NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid")))
        );
        assert_eq!(table.value(YEAR, 0), Some(&Value::Integer(2024)));
        assert_eq!(table.value(YEAR, 1), Some(&Value::Integer(2023)));
        assert_eq!(table.value(TIME_TO_SUPPORT, 0), Some(&Value::Integer(9)));
        assert_eq!(table.value(PAYMENT_SUBMITTED, 1), Some(&Value::Missing));
        assert_eq!(table.value(TIME_TO_SUPPORT, 1), Some(&Value::Missing));
        assert_eq!(
            cleaned.summary.derived_columns,
            vec![YEAR.to_string(), TIME_TO_SUPPORT.to_string()]
        );
    }

    #[test]
    fn derives_income_brackets_from_monthly_income() {
        let cleaned = clean(
            "Total Household Gross Monthly Income\n1000\n\"$3,000\"\nunknown\n9000\n",
        );
        let table = &cleaned.table;
        assert_eq!(table.value(ANNUALIZED_INCOME, 0), Some(&Value::Number(12_000.0)));
        assert_eq!(table.value(INCOME_LEVEL, 0), Some(&Value::text("$0–$12,000")));
        assert_eq!(
            table.value(INCOME_LEVEL, 1),
            Some(&Value::text("$12,001–$47,000"))
        );
        assert_eq!(table.value(MONTHLY_INCOME, 2), Some(&Value::Missing));
        assert_eq!(table.value(INCOME_LEVEL, 2), Some(&Value::Missing));
        assert_eq!(table.value(INCOME_LEVEL, 3), Some(&Value::text("$100,000+")));
    }

    #[test]
    fn numeric_and_flag_columns_are_coerced() {
        let cleaned = clean(
            "Amount,Remaining Balance,Hispanic/Latino\n250,-10,Non-Hispanic\nabc,,Hispanic\n",
        );
        let table = &cleaned.table;
        assert_eq!(table.value(AMOUNT, 0), Some(&Value::Number(250.0)));
        assert_eq!(table.value(AMOUNT, 1), Some(&Value::Missing));
        assert_eq!(table.value(REMAINING_BALANCE, 0), Some(&Value::Number(-10.0)));
        assert_eq!(table.value(HISPANIC_LATINO, 0), Some(&Value::text("No")));
        assert_eq!(table.value(HISPANIC_LATINO, 1), Some(&Value::text("Yes")));
    }

    #[test]
    fn unmatched_states_are_kept() {
        let cleaned = clean("Pt State\nIowa\nTexas\nmissing\n");
        let field = cleaned.summary.field(STATE).expect("state summary");
        assert_eq!((field.matched, field.kept, field.missing), (1, 1, 1));
        assert_eq!(cleaned.table.value(STATE, 1), Some(&Value::text("Texas")));
    }

    #[test]
    fn stricter_threshold_rejects_loose_matches() {
        let csv = "Request Status\npendng\n";
        let loose = GrantCleaner::new(60).clean_bytes(csv.as_bytes()).expect("parse");
        let strict = GrantCleaner::new(100).clean_bytes(csv.as_bytes()).expect("parse");
        assert_eq!(loose.table.value(REQUEST_STATUS, 0), Some(&Value::text("pending")));
        assert_eq!(strict.table.value(REQUEST_STATUS, 0), Some(&Value::Missing));
    }

    #[test]
    fn configured_threshold_applies_to_states() {
        let csv = "Pt State\nNebrasak\nNE\n";
        let loose = GrantCleaner::new(60).clean_bytes(csv.as_bytes()).expect("parse");
        let strict = GrantCleaner::new(100).clean_bytes(csv.as_bytes()).expect("parse");

        assert_eq!(loose.table.value(STATE, 0), Some(&Value::text("NE")));
        assert_eq!(strict.table.value(STATE, 0), Some(&Value::text("Nebrasak")));
        assert_eq!(strict.table.value(STATE, 1), Some(&Value::text("NE")));
        let field = strict.summary.field(STATE).expect("state summary");
        assert_eq!((field.matched, field.kept), (1, 1));
    }

    #[test]
    fn undecodable_cells_clean_with_the_rest_of_the_batch() {
        let cleaned = GrantCleaner::default()
            .clean_bytes(b"Gender,Request Status\nfemale,approved\nmale,pend\xe9ng\nfemale,denied\n")
            .expect("batch cleans");

        let status = cleaned.table.column(REQUEST_STATUS).expect("status column");
        assert_eq!(
            status.values,
            vec![
                Value::text("approved"),
                Value::text("pending"),
                Value::text("denied"),
            ]
        );
    }
}
