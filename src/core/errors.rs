use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Serialize)]
pub enum DivvyError {
    // Not found
    #[error("User {0} not found")]
    UserNotFound(String),
    #[error("Group {0} not found")]
    GroupNotFound(String),
    #[error("Expense {0} not found")]
    ExpenseNotFound(String),
    #[error("Settlement {0} not found")]
    SettlementNotFound(String),

    // Forbidden
    #[error("User {0} is not a group member")]
    NotGroupMember(String),
    #[error("User {user_id} is not authorized to {action}")]
    NotAuthorized { user_id: String, action: String },

    // Invalid state
    #[error("Settlement is already {0}")]
    InvalidSettlementState(String),
    #[error("Settlement {0} is not rejected and cannot be resent")]
    NotRejected(String),

    // Validation
    #[error("Amount must be greater than 0")]
    InvalidAmount,
    #[error("Cannot create settlement to self")]
    SelfSettlement,
    #[error("Split amounts do not sum to the expense amount")]
    InvalidSplit,
    #[error("User {0} in splits is not a group member")]
    InvalidSplitUser(String),
    #[error("User {0} is already a group member")]
    AlreadyGroupMember(String),
    #[error("Email {0} already registered")]
    EmailAlreadyRegistered(String),

    // Conflict: a concurrent transition won the compare-and-swap race.
    #[error("settlement already {0}")]
    SettlementConflict(String),

    // Infrastructure
    #[error("Storage error: {0}")]
    StorageError(String),
    #[error("Logging error: {0}")]
    LoggingError(String),
    #[error("Notification error: {0}")]
    NotifyError(String),
}
