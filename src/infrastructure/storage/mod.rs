use crate::core::errors::DivvyError;
use crate::core::models::{
    expense::{Expense, ExpenseWithSplits, Split},
    group::{Group, GroupMember},
    settlement::{Settlement, SettlementStatus},
    user::User,
};
use async_trait::async_trait;

/// Filter for settlement listings. `group_id` narrows to one group's
/// settlements, `global_only` to settlements bound to no group; setting both
/// matches nothing.
#[derive(Clone, Debug, Default)]
pub struct SettlementFilter {
    pub group_id: Option<String>,
    pub user_id: Option<String>,
    pub status: Option<SettlementStatus>,
    pub global_only: bool,
}

impl SettlementFilter {
    pub fn matches(&self, settlement: &Settlement) -> bool {
        if self.global_only && !settlement.is_global() {
            return false;
        }
        if let Some(ref group_id) = self.group_id {
            if settlement.group_id.as_deref() != Some(group_id.as_str()) {
                return false;
            }
        }
        if let Some(ref user_id) = self.user_id {
            if !settlement.involves(user_id) {
                return false;
            }
        }
        if let Some(status) = self.status {
            if settlement.status != status {
                return false;
            }
        }
        true
    }
}

/// Outcome of a conditional settlement status write.
#[derive(Clone, Debug)]
pub enum CasOutcome {
    Applied(Settlement),
    /// The persisted status no longer matched the expectation; carries the
    /// record as it currently stands so callers can report its real state.
    Conflict(Settlement),
}

#[async_trait]
pub trait Storage: Send + Sync {
    async fn create_user_if_not_exists(&self, user: User) -> Result<User, DivvyError>;
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, DivvyError>;
    async fn update_user(&self, user: User) -> Result<User, DivvyError>;

    async fn save_group(&self, group: Group) -> Result<(), DivvyError>;
    async fn get_group(&self, group_id: &str) -> Result<Option<Group>, DivvyError>;
    async fn list_memberships(&self, group_id: &str) -> Result<Vec<GroupMember>, DivvyError>;

    async fn create_expense(&self, expense: Expense) -> Result<Expense, DivvyError>;
    async fn get_expense(&self, expense_id: &str) -> Result<Option<Expense>, DivvyError>;
    async fn update_expense(&self, expense: Expense) -> Result<Expense, DivvyError>;
    /// Replaces the expense's splits wholesale.
    async fn save_splits(&self, expense_id: &str, splits: Vec<Split>) -> Result<(), DivvyError>;
    /// Removes the expense and its splits. Doubles as the compensating
    /// action when split validation fails after the expense row exists.
    async fn delete_expense(&self, expense_id: &str) -> Result<(), DivvyError>;
    async fn list_expenses_with_splits(&self, group_id: &str) -> Result<Vec<ExpenseWithSplits>, DivvyError>;

    async fn create_settlement(&self, settlement: Settlement) -> Result<Settlement, DivvyError>;
    async fn get_settlement(&self, settlement_id: &str) -> Result<Option<Settlement>, DivvyError>;
    async fn list_settlements(&self, filter: SettlementFilter) -> Result<Vec<Settlement>, DivvyError>;
    /// Single conditional write: succeeds only while the persisted status
    /// still equals `expected`. A losing racer gets `CasOutcome::Conflict`
    /// instead of silently overwriting a terminal state.
    async fn cas_update_settlement_status(
        &self,
        settlement_id: &str,
        expected: SettlementStatus,
        new: SettlementStatus,
        rejected_reason: Option<String>,
    ) -> Result<CasOutcome, DivvyError>;
}

pub mod in_memory;
