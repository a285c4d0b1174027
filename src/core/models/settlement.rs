use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SettlementStatus {
    Pending,
    Accepted,
    Rejected,
}

impl std::fmt::Display for SettlementStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SettlementStatus::Pending => "pending",
            SettlementStatus::Accepted => "accepted",
            SettlementStatus::Rejected => "rejected",
        };
        write!(f, "{}", s)
    }
}

/// A proposed transfer from `from_user_id` to `to_user_id`. Created pending;
/// only the recipient can move it to a terminal state. A settlement with no
/// `group_id` is a global settlement, used by the cross-group adjustment
/// layer and bound to no single group's books.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct Settlement {
    pub id: String,
    pub group_id: Option<String>,
    pub from_user_id: String,
    pub to_user_id: String,
    pub amount: f64,
    pub message: Option<String>,
    pub status: SettlementStatus,
    pub rejected_reason: Option<String>,
    /// Id of the rejected settlement this one was resent from, if any.
    pub resend_of: Option<String>,
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub updated_at: DateTime<Utc>,
}

impl Settlement {
    pub fn is_global(&self) -> bool {
        self.group_id.is_none()
    }

    pub fn involves(&self, user_id: &str) -> bool {
        self.from_user_id == user_id || self.to_user_id == user_id
    }
}
