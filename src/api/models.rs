use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;

use crate::core::errors::DivvyError;
use crate::core::models::settlement::SettlementStatus;
use crate::core::models::user::SettlementMode;

// Request structs for JSON payloads. Clients historically sent both
// camelCase and snake_case spellings; the serde aliases here are the single
// normalization boundary, so nothing past deserialization ever sees an
// alias.

#[derive(Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
}

#[derive(Deserialize, ToSchema)]
pub struct SetSettlementModeRequest {
    #[serde(alias = "settlementMode")]
    pub settlement_mode: SettlementMode,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateGroupRequest {
    pub name: String,
    #[serde(alias = "memberIds", default)]
    pub member_ids: Vec<String>,
    #[serde(alias = "createdById")]
    pub created_by_id: String,
}

#[derive(Deserialize, ToSchema)]
pub struct AddMemberRequest {
    #[serde(alias = "userId")]
    pub user_id: String,
    #[serde(alias = "addedById")]
    pub added_by_id: String,
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_category() -> String {
    "general".to_string()
}

#[derive(Deserialize, ToSchema)]
pub struct AddExpenseRequest {
    #[serde(alias = "groupId")]
    pub group_id: String,
    #[serde(alias = "payerId", alias = "paidById")]
    pub payer_id: String,
    pub amount: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub description: String,
    /// user id -> share amount; shares must sum to `amount`.
    pub shares: HashMap<String, f64>,
    #[serde(alias = "createdById")]
    pub created_by_id: String,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateExpenseRequest {
    pub amount: f64,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub description: String,
    pub shares: HashMap<String, f64>,
    #[serde(alias = "updatedById")]
    pub updated_by_id: String,
}

#[derive(Deserialize, ToSchema)]
pub struct DeleteExpenseRequest {
    #[serde(alias = "deletedById")]
    pub deleted_by_id: String,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateSettlementRequest {
    #[serde(alias = "groupId")]
    pub group_id: String,
    #[serde(alias = "fromUserId")]
    pub from_user_id: String,
    #[serde(alias = "toUserId")]
    pub to_user_id: String,
    pub amount: f64,
    pub message: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateGlobalSettlementRequest {
    #[serde(alias = "fromUserId")]
    pub from_user_id: String,
    #[serde(alias = "toUserId")]
    pub to_user_id: String,
    pub amount: f64,
    pub message: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct AcceptSettlementRequest {
    #[serde(alias = "settlementId")]
    pub settlement_id: String,
    #[serde(alias = "acceptedById")]
    pub accepted_by_id: String,
}

#[derive(Deserialize, ToSchema)]
pub struct RejectSettlementRequest {
    #[serde(alias = "settlementId")]
    pub settlement_id: String,
    #[serde(alias = "rejectedById")]
    pub rejected_by_id: String,
    pub reason: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct ResendSettlementRequest {
    #[serde(alias = "settlementId")]
    pub settlement_id: String,
    #[serde(alias = "resentById")]
    pub resent_by_id: String,
    pub amount: Option<f64>,
    pub message: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct SettlementHistoryRequest {
    #[serde(alias = "groupId")]
    pub group_id: String,
    #[serde(alias = "userId")]
    pub user_id: String,
    pub status: Option<SettlementStatus>,
}

// Error response struct
#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

// Newtype wrapper for DivvyError to implement IntoResponse
pub struct ApiError(pub DivvyError);

impl From<DivvyError> for ApiError {
    fn from(err: DivvyError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.0 {
            DivvyError::UserNotFound(_)
            | DivvyError::GroupNotFound(_)
            | DivvyError::ExpenseNotFound(_)
            | DivvyError::SettlementNotFound(_) => StatusCode::NOT_FOUND,

            DivvyError::NotGroupMember(_) | DivvyError::NotAuthorized { .. } => StatusCode::FORBIDDEN,

            DivvyError::InvalidSettlementState(_)
            | DivvyError::NotRejected(_)
            | DivvyError::SettlementConflict(_)
            | DivvyError::AlreadyGroupMember(_)
            | DivvyError::EmailAlreadyRegistered(_) => StatusCode::CONFLICT,

            DivvyError::InvalidAmount
            | DivvyError::SelfSettlement
            | DivvyError::InvalidSplit
            | DivvyError::InvalidSplitUser(_) => StatusCode::BAD_REQUEST,

            DivvyError::StorageError(_) | DivvyError::LoggingError(_) | DivvyError::NotifyError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = Json(ErrorResponse {
            error: self.0.to_string(),
        });
        (status, body).into_response()
    }
}
