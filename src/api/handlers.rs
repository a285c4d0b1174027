use crate::{
    api::models::*,
    core::{
        errors::DivvyError,
        models::{
            audit::ActivityLog,
            balance::{MemberBalance, SuggestedSettlement},
            expense::ExpenseWithSplits,
            group::Group,
            settlement::Settlement,
            user::User,
        },
        services::DivvyService,
    },
    infrastructure::{
        logging::in_memory::InMemoryLogging, notify::in_memory::InMemoryNotifier,
        storage::in_memory::InMemoryStorage,
    },
};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
};
use std::sync::Arc;

type Service = DivvyService<InMemoryLogging, InMemoryStorage, InMemoryNotifier>;

// Define API routes
pub fn api_routes(service: Arc<Service>) -> Router {
    Router::new()
        .route("/users", axum::routing::post(create_user))
        .route("/users/{user_id}", axum::routing::get(get_user))
        .route(
            "/users/{user_id}/settlement_mode",
            axum::routing::post(set_settlement_mode),
        )
        .route("/groups", axum::routing::post(create_group))
        .route("/groups/{group_id}", axum::routing::get(get_group))
        .route("/groups/{group_id}/members", axum::routing::post(add_member_to_group))
        .route("/groups/{group_id}/balances", axum::routing::get(get_group_balances))
        .route(
            "/groups/{group_id}/settlements/suggested",
            axum::routing::get(get_suggested_settlements),
        )
        .route("/expenses", axum::routing::post(add_expense))
        .route(
            "/expenses/{expense_id}",
            axum::routing::put(update_expense).delete(delete_expense),
        )
        .route("/settlements", axum::routing::post(create_settlement))
        .route("/settlements/global", axum::routing::post(create_global_settlement))
        .route("/settlements/accept", axum::routing::post(accept_settlement))
        .route("/settlements/reject", axum::routing::post(reject_settlement))
        .route("/settlements/resend", axum::routing::post(resend_settlement))
        .route("/settlements/history", axum::routing::post(get_settlement_history))
        .route("/logs", axum::routing::get(get_app_logs))
        .with_state(service)
}

#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created successfully", body = User),
        (status = 409, description = "Email already registered", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn create_user(
    State(service): State<Arc<Service>>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let user = service.create_user(req.name, req.email).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[utoipa::path(
    get,
    path = "/api/users/{user_id}",
    params(("user_id" = String, Path, description = "ID of the user to retrieve")),
    responses(
        (status = 200, description = "User retrieved successfully", body = User),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
pub async fn get_user(
    State(service): State<Arc<Service>>,
    Path(user_id): Path<String>,
) -> Result<Json<User>, ApiError> {
    let user = service
        .get_user(&user_id)
        .await?
        .ok_or_else(|| DivvyError::UserNotFound(user_id))?;
    Ok(Json(user))
}

#[utoipa::path(
    post,
    path = "/api/users/{user_id}/settlement_mode",
    params(("user_id" = String, Path, description = "User whose preference to change")),
    request_body = SetSettlementModeRequest,
    responses(
        (status = 200, description = "Settlement mode updated", body = User),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
pub async fn set_settlement_mode(
    State(service): State<Arc<Service>>,
    Path(user_id): Path<String>,
    Json(req): Json<SetSettlementModeRequest>,
) -> Result<Json<User>, ApiError> {
    let user = service.set_settlement_mode(&user_id, req.settlement_mode).await?;
    Ok(Json(user))
}

#[utoipa::path(
    post,
    path = "/api/groups",
    request_body = CreateGroupRequest,
    responses(
        (status = 200, description = "Group created successfully", body = Group),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
pub async fn create_group(
    State(service): State<Arc<Service>>,
    Json(req): Json<CreateGroupRequest>,
) -> Result<Json<Group>, ApiError> {
    let group = service.create_group(req.name, req.member_ids, &req.created_by_id).await?;
    Ok(Json(group))
}

#[utoipa::path(
    get,
    path = "/api/groups/{group_id}",
    params(("group_id" = String, Path, description = "ID of the group to retrieve")),
    responses(
        (status = 200, description = "Group retrieved successfully", body = Group),
        (status = 404, description = "Group not found", body = ErrorResponse)
    )
)]
pub async fn get_group(
    State(service): State<Arc<Service>>,
    Path(group_id): Path<String>,
) -> Result<Json<Group>, ApiError> {
    let group = service
        .get_group(&group_id)
        .await?
        .ok_or_else(|| DivvyError::GroupNotFound(group_id))?;
    Ok(Json(group))
}

#[utoipa::path(
    post,
    path = "/api/groups/{group_id}/members",
    params(("group_id" = String, Path, description = "Group to add the member to")),
    request_body = AddMemberRequest,
    responses(
        (status = 200, description = "Member added"),
        (status = 403, description = "Not a group admin", body = ErrorResponse),
        (status = 404, description = "Group or user not found", body = ErrorResponse),
        (status = 409, description = "Already a member", body = ErrorResponse)
    )
)]
pub async fn add_member_to_group(
    State(service): State<Arc<Service>>,
    Path(group_id): Path<String>,
    Json(req): Json<AddMemberRequest>,
) -> Result<StatusCode, ApiError> {
    service
        .add_member_to_group(&group_id, &req.user_id, &req.added_by_id)
        .await?;
    Ok(StatusCode::OK)
}

#[utoipa::path(
    get,
    path = "/api/groups/{group_id}/balances",
    params(("group_id" = String, Path, description = "Group to compute balances for")),
    responses(
        (status = 200, description = "Per-member balances", body = [MemberBalance]),
        (status = 404, description = "Group not found", body = ErrorResponse)
    )
)]
pub async fn get_group_balances(
    State(service): State<Arc<Service>>,
    Path(group_id): Path<String>,
) -> Result<Json<Vec<MemberBalance>>, ApiError> {
    let balances = service.get_group_balances(&group_id).await?;
    Ok(Json(balances))
}

#[utoipa::path(
    get,
    path = "/api/groups/{group_id}/settlements/suggested",
    params(("group_id" = String, Path, description = "Group to suggest settlements for")),
    responses(
        (status = 200, description = "Suggested transfers to settle the group", body = [SuggestedSettlement]),
        (status = 404, description = "Group not found", body = ErrorResponse)
    )
)]
pub async fn get_suggested_settlements(
    State(service): State<Arc<Service>>,
    Path(group_id): Path<String>,
) -> Result<Json<Vec<SuggestedSettlement>>, ApiError> {
    let suggestions = service.get_suggested_settlements(&group_id).await?;
    Ok(Json(suggestions))
}

#[utoipa::path(
    post,
    path = "/api/expenses",
    request_body = AddExpenseRequest,
    responses(
        (status = 200, description = "Expense created with its splits", body = ExpenseWithSplits),
        (status = 400, description = "Invalid amount or splits", body = ErrorResponse),
        (status = 403, description = "Not a group member", body = ErrorResponse),
        (status = 404, description = "Group not found", body = ErrorResponse)
    )
)]
pub async fn add_expense(
    State(service): State<Arc<Service>>,
    Json(req): Json<AddExpenseRequest>,
) -> Result<Json<ExpenseWithSplits>, ApiError> {
    let expense = service
        .add_expense(
            &req.group_id,
            &req.payer_id,
            req.amount,
            req.currency,
            req.category,
            req.description,
            req.shares,
            &req.created_by_id,
        )
        .await?;
    Ok(Json(expense))
}

#[utoipa::path(
    put,
    path = "/api/expenses/{expense_id}",
    params(("expense_id" = String, Path, description = "Expense to update")),
    request_body = UpdateExpenseRequest,
    responses(
        (status = 200, description = "Expense updated, splits replaced", body = ExpenseWithSplits),
        (status = 400, description = "Invalid amount or splits", body = ErrorResponse),
        (status = 403, description = "Only the payer or an admin may edit", body = ErrorResponse),
        (status = 404, description = "Expense not found", body = ErrorResponse)
    )
)]
pub async fn update_expense(
    State(service): State<Arc<Service>>,
    Path(expense_id): Path<String>,
    Json(req): Json<UpdateExpenseRequest>,
) -> Result<Json<ExpenseWithSplits>, ApiError> {
    let expense = service
        .update_expense(
            &expense_id,
            &req.updated_by_id,
            req.amount,
            req.category,
            req.description,
            req.shares,
        )
        .await?;
    Ok(Json(expense))
}

#[utoipa::path(
    delete,
    path = "/api/expenses/{expense_id}",
    params(("expense_id" = String, Path, description = "Expense to delete")),
    request_body = DeleteExpenseRequest,
    responses(
        (status = 200, description = "Expense and its splits deleted"),
        (status = 403, description = "Only the payer or an admin may delete", body = ErrorResponse),
        (status = 404, description = "Expense not found", body = ErrorResponse)
    )
)]
pub async fn delete_expense(
    State(service): State<Arc<Service>>,
    Path(expense_id): Path<String>,
    Json(req): Json<DeleteExpenseRequest>,
) -> Result<StatusCode, ApiError> {
    service.delete_expense(&expense_id, &req.deleted_by_id).await?;
    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/api/settlements",
    request_body = CreateSettlementRequest,
    responses(
        (status = 200, description = "Pending settlement recorded", body = Settlement),
        (status = 400, description = "Invalid amount or self-settlement", body = ErrorResponse),
        (status = 403, description = "Not a group member", body = ErrorResponse)
    )
)]
pub async fn create_settlement(
    State(service): State<Arc<Service>>,
    Json(req): Json<CreateSettlementRequest>,
) -> Result<Json<Settlement>, ApiError> {
    let settlement = service
        .record_settlement(&req.group_id, &req.from_user_id, &req.to_user_id, req.amount, req.message)
        .await?;
    Ok(Json(settlement))
}

#[utoipa::path(
    post,
    path = "/api/settlements/global",
    request_body = CreateGlobalSettlementRequest,
    responses(
        (status = 200, description = "Pending global settlement recorded", body = Settlement),
        (status = 400, description = "Invalid amount or self-settlement", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
pub async fn create_global_settlement(
    State(service): State<Arc<Service>>,
    Json(req): Json<CreateGlobalSettlementRequest>,
) -> Result<Json<Settlement>, ApiError> {
    let settlement = service
        .record_global_settlement(&req.from_user_id, &req.to_user_id, req.amount, req.message)
        .await?;
    Ok(Json(settlement))
}

#[utoipa::path(
    post,
    path = "/api/settlements/accept",
    request_body = AcceptSettlementRequest,
    responses(
        (status = 200, description = "Settlement accepted", body = Settlement),
        (status = 403, description = "Only the recipient may accept", body = ErrorResponse),
        (status = 404, description = "Settlement not found", body = ErrorResponse),
        (status = 409, description = "Settlement already resolved", body = ErrorResponse)
    )
)]
pub async fn accept_settlement(
    State(service): State<Arc<Service>>,
    Json(req): Json<AcceptSettlementRequest>,
) -> Result<Json<Settlement>, ApiError> {
    let settlement = service.accept_settlement(&req.settlement_id, &req.accepted_by_id).await?;
    Ok(Json(settlement))
}

#[utoipa::path(
    post,
    path = "/api/settlements/reject",
    request_body = RejectSettlementRequest,
    responses(
        (status = 200, description = "Settlement rejected", body = Settlement),
        (status = 403, description = "Only the recipient may reject", body = ErrorResponse),
        (status = 404, description = "Settlement not found", body = ErrorResponse),
        (status = 409, description = "Settlement already resolved", body = ErrorResponse)
    )
)]
pub async fn reject_settlement(
    State(service): State<Arc<Service>>,
    Json(req): Json<RejectSettlementRequest>,
) -> Result<Json<Settlement>, ApiError> {
    let settlement = service
        .reject_settlement(&req.settlement_id, &req.rejected_by_id, req.reason)
        .await?;
    Ok(Json(settlement))
}

#[utoipa::path(
    post,
    path = "/api/settlements/resend",
    request_body = ResendSettlementRequest,
    responses(
        (status = 200, description = "New pending settlement created from the rejected one", body = Settlement),
        (status = 403, description = "Only the original sender may resend", body = ErrorResponse),
        (status = 404, description = "Settlement not found", body = ErrorResponse),
        (status = 409, description = "Source settlement is not rejected", body = ErrorResponse)
    )
)]
pub async fn resend_settlement(
    State(service): State<Arc<Service>>,
    Json(req): Json<ResendSettlementRequest>,
) -> Result<Json<Settlement>, ApiError> {
    let settlement = service
        .resend_settlement(&req.settlement_id, &req.resent_by_id, req.amount, req.message)
        .await?;
    Ok(Json(settlement))
}

#[utoipa::path(
    post,
    path = "/api/settlements/history",
    request_body = SettlementHistoryRequest,
    responses(
        (status = 200, description = "Settlements involving the requesting user", body = [Settlement]),
        (status = 403, description = "Not a group member", body = ErrorResponse),
        (status = 404, description = "Group not found", body = ErrorResponse)
    )
)]
pub async fn get_settlement_history(
    State(service): State<Arc<Service>>,
    Json(req): Json<SettlementHistoryRequest>,
) -> Result<Json<Vec<Settlement>>, ApiError> {
    let settlements = service
        .get_settlement_history(&req.group_id, &req.user_id, req.status)
        .await?;
    Ok(Json(settlements))
}

#[utoipa::path(
    get,
    path = "/api/logs",
    responses((status = 200, description = "Activity log entries", body = [ActivityLog]))
)]
pub async fn get_app_logs(State(service): State<Arc<Service>>) -> Result<Json<Vec<ActivityLog>>, ApiError> {
    let logs = service.get_app_logs().await?;
    Ok(Json(logs))
}
