//! Column names of the grant export, after the cleaning pass renames.

pub const PATIENT_ID: &str = "Patient ID#";
pub const REQUEST_STATUS: &str = "Request Status";
pub const APPLICATION_SIGNED: &str = "Application Signed?";
pub const PAYMENT_SUBMITTED: &str = "Payment Submitted?";
pub const GRANT_REQUEST_DATE: &str = "Grant Req Date";
pub const STATE: &str = "Pt State";
pub const GENDER: &str = "Gender";
pub const RACE: &str = "Race";
pub const HISPANIC_LATINO: &str = "Hispanic/Latino";
pub const INSURANCE_TYPE: &str = "Insurance Type";
pub const MARITAL_STATUS: &str = "Marital Status";
pub const ASSISTANCE_TYPE: &str = "Type of Assistance (CLASS)";
pub const MONTHLY_INCOME: &str = "Total Household Gross Monthly Income";
pub const AMOUNT: &str = "Amount";
pub const REMAINING_BALANCE: &str = "Remaining Balance";

pub const ANNUALIZED_INCOME: &str = "Annualized Income";
pub const INCOME_LEVEL: &str = "Income Level";
pub const YEAR: &str = "Year";
pub const TIME_TO_SUPPORT: &str = "Time to Support";

/// Source headers that differ from the names used downstream.
pub const RENAMES: &[(&str, &str)] = &[
    ("State", STATE),
    ("Payment Submitted", PAYMENT_SUBMITTED),
    ("Application Signed", APPLICATION_SIGNED),
];
