mod summary;
pub mod views;

pub use summary::{GrantReport, DEMOGRAPHIC_COLUMNS};
pub use views::{
    AssistanceAmount, BalanceGroup, CategoryAmount, DemographicBreakout, GrantYearSummary,
    PatientBalance, PendingSignatureRow, RemainingBalanceView, TimeToSupportView,
};
