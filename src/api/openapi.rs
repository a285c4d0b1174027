use utoipa::OpenApi;

use crate::{
    api::models::{
        AcceptSettlementRequest, AddExpenseRequest, AddMemberRequest, CreateGlobalSettlementRequest,
        CreateGroupRequest, CreateSettlementRequest, CreateUserRequest, DeleteExpenseRequest, ErrorResponse,
        RejectSettlementRequest, ResendSettlementRequest, SetSettlementModeRequest, SettlementHistoryRequest,
        UpdateExpenseRequest,
    },
    core::models::{
        audit::ActivityLog,
        balance::{MemberBalance, SuggestedSettlement},
        expense::{Expense, ExpenseWithSplits, Split},
        group::Group,
        settlement::Settlement,
        user::User,
    },
};

#[derive(OpenApi)]
#[openapi(
    paths(
        super::handlers::create_user,
        super::handlers::get_user,
        super::handlers::set_settlement_mode,
        super::handlers::create_group,
        super::handlers::get_group,
        super::handlers::add_member_to_group,
        super::handlers::get_group_balances,
        super::handlers::get_suggested_settlements,
        super::handlers::add_expense,
        super::handlers::update_expense,
        super::handlers::delete_expense,
        super::handlers::create_settlement,
        super::handlers::create_global_settlement,
        super::handlers::accept_settlement,
        super::handlers::reject_settlement,
        super::handlers::resend_settlement,
        super::handlers::get_settlement_history,
        super::handlers::get_app_logs
    ),
    components(schemas(
        CreateUserRequest,
        SetSettlementModeRequest,
        CreateGroupRequest,
        AddMemberRequest,
        AddExpenseRequest,
        UpdateExpenseRequest,
        DeleteExpenseRequest,
        CreateSettlementRequest,
        CreateGlobalSettlementRequest,
        AcceptSettlementRequest,
        RejectSettlementRequest,
        ResendSettlementRequest,
        SettlementHistoryRequest,
        ErrorResponse,
        User,
        Group,
        Expense,
        Split,
        ExpenseWithSplits,
        Settlement,
        MemberBalance,
        SuggestedSettlement,
        ActivityLog
    )),
    info(
        title = "Divvy API",
        description = "API for group expense balances and settlement suggestions",
        version = "0.1.0"
    )
)]
pub struct ApiDoc;
