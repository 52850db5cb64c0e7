use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryAmount {
    pub category: String,
    pub grants: usize,
    /// `None` when no grant in the category carries an amount.
    pub total_amount: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DemographicBreakout {
    pub column: &'static str,
    pub rows: Vec<CategoryAmount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeToSupportView {
    pub count: usize,
    pub average_days: Option<f64>,
    pub min_days: Option<i64>,
    pub max_days: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatientBalance {
    pub patient_id: Option<String>,
    pub remaining_balance: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BalanceGroup {
    pub patients: usize,
    pub balances: Vec<PatientBalance>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssistanceAmount {
    pub assistance_type: String,
    pub total_amount: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemainingBalanceView {
    pub used_all: BalanceGroup,
    pub remaining: BalanceGroup,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub by_assistance: Option<Vec<AssistanceAmount>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingSignatureRow {
    pub patient_id: Option<String>,
    pub application_signed: Option<String>,
    pub request_status: String,
    pub year: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrantYearSummary {
    pub year: i64,
    pub grants: usize,
    pub demographics: Vec<DemographicBreakout>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_to_support: Option<TimeToSupportView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_balance: Option<RemainingBalanceView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_signatures: Option<Vec<PendingSignatureRow>>,
}
