use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Raw per-(user, group) totals from the balance calculator, before any
/// global adjustment is applied.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct UserGroupBalance {
    pub total_paid: f64,
    pub total_owed: f64,
    pub received_settlements: f64,
    pub paid_settlements: f64,
    pub net: f64,
}

/// Net balance input to the settlement optimizer.
#[derive(Clone, Debug, PartialEq)]
pub struct NetBalance {
    pub user_id: String,
    pub balance: f64,
}

/// One suggested transfer out of the optimizer.
#[derive(Clone, Debug, PartialEq)]
pub struct Transfer {
    pub from_user_id: String,
    pub to_user_id: String,
    pub amount: f64,
}

/// Balance view for one group member, as returned to callers.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct MemberBalance {
    pub user_id: String,
    pub username: String,
    pub total_paid: f64,
    pub total_owed: f64,
    pub received_settlements: f64,
    pub paid_settlements: f64,
    pub net: f64,
    pub original_net: f64,
    pub global_adjustment: f64,
    pub is_owed: bool,
    pub owes: bool,
    pub is_settled: bool,
}

/// A suggested settlement with usernames joined in for display.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct SuggestedSettlement {
    pub from_user_id: String,
    pub from_username: String,
    pub to_user_id: String,
    pub to_username: String,
    pub amount: f64,
}
