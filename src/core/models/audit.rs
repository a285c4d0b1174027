use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One recorded service action. Collected by the activity-log collaborator;
/// the core only appends, it never reads these back for computation.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ActivityLog {
    pub id: String,
    pub action: String,
    pub user_id: Option<String>,
    #[schema(value_type = Object)]
    pub details: serde_json::Value,
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub timestamp: DateTime<Utc>,
}
