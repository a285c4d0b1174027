use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One user's assigned share of a single expense. Splits are created
/// atomically with their expense and replaced wholesale on update, never
/// patched one row at a time.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct Split {
    pub expense_id: String,
    pub user_id: String,
    pub share_amount: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct Expense {
    pub id: String,
    pub group_id: String,
    pub payer_id: String,
    pub added_by: String,
    pub amount: f64,
    pub currency: String,
    pub category: String,
    pub description: String,
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub updated_at: DateTime<Utc>,
}

/// An expense joined with its splits, as read back from storage.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ExpenseWithSplits {
    #[serde(flatten)]
    pub expense: Expense,
    pub splits: Vec<Split>,
}
