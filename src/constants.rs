/// The one tolerance used everywhere a balance, split sum, or settled check
/// compares against zero. Split validation, the optimizer, and balance
/// classification must all agree on it.
pub const BALANCE_TOLERANCE: f64 = 0.01;

// Activity log action names.
pub const USER_CREATED: &str = "USER_CREATED";
pub const SETTLEMENT_MODE_CHANGED: &str = "SETTLEMENT_MODE_CHANGED";
pub const GROUP_CREATED: &str = "GROUP_CREATED";
pub const MEMBER_ADDED: &str = "MEMBER_ADDED";
pub const EXPENSE_ADDED: &str = "EXPENSE_ADDED";
pub const EXPENSE_UPDATED: &str = "EXPENSE_UPDATED";
pub const EXPENSE_DELETED: &str = "EXPENSE_DELETED";
pub const SETTLEMENT_CREATED: &str = "SETTLEMENT_CREATED";
pub const SETTLEMENT_ACCEPTED: &str = "SETTLEMENT_ACCEPTED";
pub const SETTLEMENT_REJECTED: &str = "SETTLEMENT_REJECTED";
pub const SETTLEMENT_RESENT: &str = "SETTLEMENT_RESENT";
pub const BALANCES_QUERIED: &str = "BALANCES_QUERIED";
pub const SETTLEMENT_HISTORY_QUERIED: &str = "SETTLEMENT_HISTORY_QUERIED";
