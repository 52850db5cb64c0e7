use super::views::{
    AssistanceAmount, BalanceGroup, CategoryAmount, DemographicBreakout, GrantYearSummary,
    PatientBalance, PendingSignatureRow, RemainingBalanceView, TimeToSupportView,
};
use crate::columns::{
    AMOUNT, APPLICATION_SIGNED, ASSISTANCE_TYPE, GENDER, HISPANIC_LATINO, INCOME_LEVEL,
    INSURANCE_TYPE, MARITAL_STATUS, PATIENT_ID, REMAINING_BALANCE, REQUEST_STATUS, STATE,
    TIME_TO_SUPPORT, YEAR,
};
use crate::dataset::{Table, Value};
use crate::normalize::derive::IncomeBracket;
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Columns broken out by summed grant amount, in display order.
pub const DEMOGRAPHIC_COLUMNS: &[&str] = &[
    STATE,
    GENDER,
    INCOME_LEVEL,
    INSURANCE_TYPE,
    MARITAL_STATUS,
    HISPANIC_LATINO,
];

const PENDING: &str = "pending";

/// Year-scoped views over a cleaned grant table.
///
/// Missing cells never contribute to a total or a count, and a view whose
/// source columns are absent is `None` rather than empty.
#[derive(Debug, Clone, Copy)]
pub struct GrantReport<'a> {
    table: &'a Table,
}

impl<'a> GrantReport<'a> {
    pub fn new(table: &'a Table) -> Self {
        Self { table }
    }

    pub fn available_years(&self) -> Vec<i64> {
        self.table
            .column(YEAR)
            .map(|column| {
                column
                    .values
                    .iter()
                    .filter_map(Value::as_integer)
                    .collect::<BTreeSet<_>>()
                    .into_iter()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn for_year(&self, year: i64) -> GrantYearSummary {
        GrantYearSummary {
            year,
            grants: self.rows_in(year).len(),
            demographics: self.demographic_breakouts(year),
            time_to_support: self.time_to_support(year),
            remaining_balance: self.remaining_balance(year),
            pending_signatures: self.pending_signatures(year),
        }
    }

    /// One breakout per demographic column present. Every category seen in
    /// any year is listed so years line up.
    pub fn demographic_breakouts(&self, year: i64) -> Vec<DemographicBreakout> {
        let rows = self.rows_in(year);
        DEMOGRAPHIC_COLUMNS
            .iter()
            .filter(|column| self.table.has_column(column))
            .map(|column| DemographicBreakout {
                column: *column,
                rows: self.category_amounts(column, &rows),
            })
            .collect()
    }

    pub fn time_to_support(&self, year: i64) -> Option<TimeToSupportView> {
        let column = self.table.column(TIME_TO_SUPPORT)?;
        let days: Vec<i64> = self
            .rows_in(year)
            .into_iter()
            .filter_map(|row| column.values[row].as_integer())
            .collect();

        let average_days = if days.is_empty() {
            None
        } else {
            let mean = days.iter().sum::<i64>() as f64 / days.len() as f64;
            Some((mean * 10.0).round() / 10.0)
        };

        Some(TimeToSupportView {
            count: days.len(),
            average_days,
            min_days: days.iter().copied().min(),
            max_days: days.iter().copied().max(),
        })
    }

    /// Splits patients into exhausted (balance at or below zero) and
    /// remaining balances. Each patient counts once, by their first grant in
    /// the year.
    pub fn remaining_balance(&self, year: i64) -> Option<RemainingBalanceView> {
        let balances = self.table.column(REMAINING_BALANCE)?;
        let rows = self.rows_in(year);

        let mut seen: HashSet<Option<String>> = HashSet::new();
        let mut used_all = BalanceGroup::default();
        let mut remaining = BalanceGroup::default();
        let mut used_ids = HashSet::new();
        let mut remaining_ids = HashSet::new();

        for &row in &rows {
            let patient_id = self.text_at(PATIENT_ID, row);
            if !seen.insert(patient_id.clone()) {
                continue;
            }
            let Some(balance) = balances.values[row].as_number() else {
                continue;
            };

            let (group, ids) = if balance <= 0.0 {
                (&mut used_all, &mut used_ids)
            } else {
                (&mut remaining, &mut remaining_ids)
            };
            if let Some(id) = &patient_id {
                ids.insert(id.clone());
            }
            group.balances.push(PatientBalance {
                patient_id,
                remaining_balance: balance,
            });
        }
        used_all.patients = used_ids.len();
        remaining.patients = remaining_ids.len();

        let by_assistance = self.table.has_column(ASSISTANCE_TYPE).then(|| {
            let mut totals: BTreeMap<String, Option<f64>> = BTreeMap::new();
            for &row in &rows {
                if let Some(assistance) = self.text_at(ASSISTANCE_TYPE, row) {
                    let total = totals.entry(assistance).or_insert(None);
                    add_amount(total, self.amount_at(row));
                }
            }
            totals
                .into_iter()
                .map(|(assistance_type, total_amount)| AssistanceAmount {
                    assistance_type,
                    total_amount,
                })
                .collect()
        });

        Some(RemainingBalanceView {
            used_all,
            remaining,
            by_assistance,
        })
    }

    pub fn pending_signatures(&self, year: i64) -> Option<Vec<PendingSignatureRow>> {
        let status = self.table.column(REQUEST_STATUS)?;
        if !self.table.has_column(APPLICATION_SIGNED) {
            return None;
        }

        Some(
            self.rows_in(year)
                .into_iter()
                .filter(|&row| status.values[row].as_text() == Some(PENDING))
                .map(|row| PendingSignatureRow {
                    patient_id: self.text_at(PATIENT_ID, row),
                    application_signed: self.text_at(APPLICATION_SIGNED, row),
                    request_status: PENDING.to_string(),
                    year,
                })
                .collect(),
        )
    }

    fn rows_in(&self, year: i64) -> Vec<usize> {
        self.table
            .column(YEAR)
            .map(|column| {
                column
                    .values
                    .iter()
                    .enumerate()
                    .filter(|(_, value)| value.as_integer() == Some(year))
                    .map(|(row, _)| row)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn category_amounts(&self, column: &str, rows: &[usize]) -> Vec<CategoryAmount> {
        let mut categories: Vec<String> = self
            .table
            .column(column)
            .map(|column| {
                column
                    .values
                    .iter()
                    .filter(|value| !value.is_missing())
                    .map(Value::to_string)
                    .collect::<BTreeSet<_>>()
                    .into_iter()
                    .collect()
            })
            .unwrap_or_default();
        if column == INCOME_LEVEL {
            categories.sort_by_key(|category| income_rank(category));
        }

        categories
            .into_iter()
            .map(|category| {
                let mut grants = 0;
                let mut total_amount = None;
                for &row in rows {
                    if self.text_at(column, row).as_deref() == Some(category.as_str()) {
                        grants += 1;
                        add_amount(&mut total_amount, self.amount_at(row));
                    }
                }
                CategoryAmount {
                    category,
                    grants,
                    total_amount,
                }
            })
            .collect()
    }

    fn text_at(&self, column: &str, row: usize) -> Option<String> {
        self.table
            .value(column, row)
            .filter(|value| !value.is_missing())
            .map(Value::to_string)
    }

    fn amount_at(&self, row: usize) -> Option<f64> {
        self.table.value(AMOUNT, row).and_then(Value::as_number)
    }
}

fn add_amount(total: &mut Option<f64>, amount: Option<f64>) {
    if let Some(amount) = amount {
        *total = Some(total.unwrap_or(0.0) + amount);
    }
}

/// Bracket order for income labels; unknown labels sort last.
fn income_rank(label: &str) -> usize {
    IncomeBracket::ordered()
        .iter()
        .position(|bracket| bracket.label() == label)
        .unwrap_or(usize::MAX)
}
