use crate::core::errors::DivvyError;
use crate::core::models::{
    expense::{Expense, ExpenseWithSplits, Split},
    group::{Group, GroupMember},
    settlement::{Settlement, SettlementStatus},
    user::User,
};
use crate::infrastructure::storage::{CasOutcome, SettlementFilter, Storage};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone, Default)]
pub struct InMemoryStorage {
    users: Arc<RwLock<HashMap<String, User>>>,
    users_by_email: Arc<RwLock<HashMap<String, String>>>,
    groups: Arc<RwLock<HashMap<String, Group>>>,
    expenses: Arc<RwLock<HashMap<String, Expense>>>,
    splits: Arc<RwLock<HashMap<String, Vec<Split>>>>,
    settlements: Arc<RwLock<HashMap<String, Settlement>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn create_user_if_not_exists(&self, user: User) -> Result<User, DivvyError> {
        let mut users_by_email = self.users_by_email.write().await;
        if users_by_email.contains_key(&user.email) {
            return Err(DivvyError::EmailAlreadyRegistered(user.email));
        }
        users_by_email.insert(user.email.clone(), user.id.clone());
        let mut users = self.users.write().await;
        users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, DivvyError> {
        let users = self.users.read().await;
        Ok(users.get(user_id).cloned())
    }

    async fn update_user(&self, user: User) -> Result<User, DivvyError> {
        let mut users = self.users.write().await;
        if !users.contains_key(&user.id) {
            return Err(DivvyError::UserNotFound(user.id));
        }
        users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn save_group(&self, group: Group) -> Result<(), DivvyError> {
        let mut groups = self.groups.write().await;
        groups.insert(group.id.clone(), group);
        Ok(())
    }

    async fn get_group(&self, group_id: &str) -> Result<Option<Group>, DivvyError> {
        let groups = self.groups.read().await;
        Ok(groups.get(group_id).cloned())
    }

    async fn list_memberships(&self, group_id: &str) -> Result<Vec<GroupMember>, DivvyError> {
        let groups = self.groups.read().await;
        groups
            .get(group_id)
            .map(|g| g.members.clone())
            .ok_or_else(|| DivvyError::GroupNotFound(group_id.to_string()))
    }

    async fn create_expense(&self, expense: Expense) -> Result<Expense, DivvyError> {
        let mut expenses = self.expenses.write().await;
        expenses.insert(expense.id.clone(), expense.clone());
        Ok(expense)
    }

    async fn get_expense(&self, expense_id: &str) -> Result<Option<Expense>, DivvyError> {
        let expenses = self.expenses.read().await;
        Ok(expenses.get(expense_id).cloned())
    }

    async fn update_expense(&self, expense: Expense) -> Result<Expense, DivvyError> {
        let mut expenses = self.expenses.write().await;
        if !expenses.contains_key(&expense.id) {
            return Err(DivvyError::ExpenseNotFound(expense.id));
        }
        expenses.insert(expense.id.clone(), expense.clone());
        Ok(expense)
    }

    async fn save_splits(&self, expense_id: &str, new_splits: Vec<Split>) -> Result<(), DivvyError> {
        let mut splits = self.splits.write().await;
        splits.insert(expense_id.to_string(), new_splits);
        Ok(())
    }

    async fn delete_expense(&self, expense_id: &str) -> Result<(), DivvyError> {
        let mut expenses = self.expenses.write().await;
        let mut splits = self.splits.write().await;
        expenses.remove(expense_id);
        splits.remove(expense_id);
        Ok(())
    }

    async fn list_expenses_with_splits(&self, group_id: &str) -> Result<Vec<ExpenseWithSplits>, DivvyError> {
        let expenses = self.expenses.read().await;
        let splits = self.splits.read().await;
        Ok(expenses
            .values()
            .filter(|e| e.group_id == group_id)
            .map(|e| ExpenseWithSplits {
                expense: e.clone(),
                splits: splits.get(&e.id).cloned().unwrap_or_default(),
            })
            .collect())
    }

    async fn create_settlement(&self, settlement: Settlement) -> Result<Settlement, DivvyError> {
        let mut settlements = self.settlements.write().await;
        settlements.insert(settlement.id.clone(), settlement.clone());
        Ok(settlement)
    }

    async fn get_settlement(&self, settlement_id: &str) -> Result<Option<Settlement>, DivvyError> {
        let settlements = self.settlements.read().await;
        Ok(settlements.get(settlement_id).cloned())
    }

    async fn list_settlements(&self, filter: SettlementFilter) -> Result<Vec<Settlement>, DivvyError> {
        let settlements = self.settlements.read().await;
        let mut matched: Vec<Settlement> = settlements.values().filter(|s| filter.matches(s)).cloned().collect();
        matched.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(matched)
    }

    async fn cas_update_settlement_status(
        &self,
        settlement_id: &str,
        expected: SettlementStatus,
        new: SettlementStatus,
        rejected_reason: Option<String>,
    ) -> Result<CasOutcome, DivvyError> {
        // The write lock is held across the compare and the swap, so two
        // racing transitions serialize and exactly one sees `expected`.
        let mut settlements = self.settlements.write().await;
        let settlement = settlements
            .get_mut(settlement_id)
            .ok_or_else(|| DivvyError::SettlementNotFound(settlement_id.to_string()))?;

        if settlement.status != expected {
            return Ok(CasOutcome::Conflict(settlement.clone()));
        }

        settlement.status = new;
        if new == SettlementStatus::Rejected {
            settlement.rejected_reason = rejected_reason;
        }
        settlement.updated_at = Utc::now();
        Ok(CasOutcome::Applied(settlement.clone()))
    }
}
