use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Controls how accepted global settlements affect the balance view a user
/// sees for any single group.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SettlementMode {
    /// Cross-group settlements never touch a group balance.
    #[default]
    Separate,
    /// Accepted global settlements are folded into the returned net.
    AutoAdjust,
    /// The adjustment is computed and exposed for display, but the net used
    /// for owes/is-owed classification stays the group-local one.
    Hybrid,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub settlement_mode: SettlementMode,
}
