use crate::constants::{
    BALANCES_QUERIED, BALANCE_TOLERANCE, EXPENSE_ADDED, EXPENSE_DELETED, EXPENSE_UPDATED, GROUP_CREATED,
    MEMBER_ADDED, SETTLEMENT_ACCEPTED, SETTLEMENT_CREATED, SETTLEMENT_HISTORY_QUERIED, SETTLEMENT_MODE_CHANGED,
    SETTLEMENT_REJECTED, SETTLEMENT_RESENT, USER_CREATED,
};
use crate::core::adjustment::apply_global_adjustment;
use crate::core::balance::{is_settled, user_group_balance};
use crate::core::errors::DivvyError;
use crate::core::models::{
    audit::ActivityLog,
    balance::{MemberBalance, NetBalance, SuggestedSettlement},
    expense::{Expense, ExpenseWithSplits, Split},
    group::{Group, GroupMember},
    settlement::{Settlement, SettlementStatus},
    user::{SettlementMode, User},
};
use crate::core::optimizer::optimize_settlements;
use crate::infrastructure::logging::LoggingService;
use crate::infrastructure::notify::{Event, Notifier};
use crate::infrastructure::storage::{CasOutcome, SettlementFilter, Storage};
use chrono::Utc;
use log::{debug, info, warn};
use serde_json::json;
use std::collections::HashMap;
use uuid::Uuid;

pub struct DivvyService<L: LoggingService, S: Storage, N: Notifier> {
    storage: S,
    logging: L,
    notifier: N,
}

impl<L: LoggingService, S: Storage, N: Notifier> DivvyService<L, S, N> {
    pub fn new(storage: S, logging: L, notifier: N) -> Self {
        DivvyService {
            storage,
            logging,
            notifier,
        }
    }

    async fn validate_users(&self, user_ids: &[&str]) -> Result<(), DivvyError> {
        for &user_id in user_ids {
            if self.storage.get_user(user_id).await?.is_none() {
                return Err(DivvyError::UserNotFound(user_id.to_string()));
            }
        }
        Ok(())
    }

    async fn get_group_or_err(&self, group_id: &str) -> Result<Group, DivvyError> {
        self.storage
            .get_group(group_id)
            .await?
            .ok_or_else(|| DivvyError::GroupNotFound(group_id.to_string()))
    }

    async fn validate_group_membership(&self, group_id: &str, user_id: &str) -> Result<Group, DivvyError> {
        let group = self.get_group_or_err(group_id).await?;
        if !group.is_member(user_id) {
            return Err(DivvyError::NotGroupMember(user_id.to_string()));
        }
        Ok(group)
    }

    fn validate_amount(amount: f64) -> Result<(), DivvyError> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(DivvyError::InvalidAmount);
        }
        Ok(())
    }

    async fn log_and_audit(
        &self,
        action: &str,
        details: serde_json::Value,
        user_id: Option<&str>,
    ) -> Result<(), DivvyError> {
        self.logging.log_action(action, details, user_id).await
    }

    // USERS & GROUPS

    pub async fn create_user(&self, name: String, email: String) -> Result<User, DivvyError> {
        info!("Creating user with email: {}", email);
        let user = User {
            id: Uuid::new_v4().to_string(),
            name,
            email,
            settlement_mode: SettlementMode::default(),
        };
        let created = self.storage.create_user_if_not_exists(user).await?;
        self.log_and_audit(
            USER_CREATED,
            json!({ "user_id": created.id, "name": created.name }),
            Some(&created.id),
        )
        .await?;
        Ok(created)
    }

    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, DivvyError> {
        self.storage.get_user(user_id).await
    }

    pub async fn set_settlement_mode(&self, user_id: &str, mode: SettlementMode) -> Result<User, DivvyError> {
        info!("Setting settlement mode {:?} for user {}", mode, user_id);
        let mut user = self
            .storage
            .get_user(user_id)
            .await?
            .ok_or_else(|| DivvyError::UserNotFound(user_id.to_string()))?;
        user.settlement_mode = mode;
        let updated = self.storage.update_user(user).await?;
        self.log_and_audit(
            SETTLEMENT_MODE_CHANGED,
            json!({ "user_id": user_id, "mode": mode }),
            Some(user_id),
        )
        .await?;
        Ok(updated)
    }

    pub async fn create_group(
        &self,
        name: String,
        member_ids: Vec<String>,
        created_by: &str,
    ) -> Result<Group, DivvyError> {
        info!("Creating group '{}' for user {}", name, created_by);
        let mut all_members = member_ids;
        if !all_members.iter().any(|id| id == created_by) {
            all_members.push(created_by.to_string());
        }
        self.validate_users(&all_members.iter().map(String::as_str).collect::<Vec<_>>())
            .await?;

        let now = Utc::now();
        let group = Group {
            id: Uuid::new_v4().to_string(),
            name,
            members: all_members
                .into_iter()
                .map(|user_id| GroupMember {
                    is_admin: user_id == created_by,
                    user_id,
                    joined_at: now,
                })
                .collect(),
        };
        self.storage.save_group(group.clone()).await?;

        self.log_and_audit(
            GROUP_CREATED,
            json!({
                "group_id": group.id,
                "name": group.name,
                "member_ids": group.members.iter().map(|m| m.user_id.clone()).collect::<Vec<_>>()
            }),
            Some(created_by),
        )
        .await?;
        Ok(group)
    }

    pub async fn add_member_to_group(
        &self,
        group_id: &str,
        user_id: &str,
        added_by: &str,
    ) -> Result<(), DivvyError> {
        info!("Adding user {} to group {} by {}", user_id, group_id, added_by);
        let mut group = self.get_group_or_err(group_id).await?;
        if !group.is_admin(added_by) {
            warn!("User {} is not an admin of group {}", added_by, group_id);
            return Err(DivvyError::NotAuthorized {
                user_id: added_by.to_string(),
                action: "add members".to_string(),
            });
        }
        self.validate_users(&[user_id]).await?;
        if group.is_member(user_id) {
            return Err(DivvyError::AlreadyGroupMember(user_id.to_string()));
        }

        group.members.push(GroupMember {
            user_id: user_id.to_string(),
            is_admin: false,
            joined_at: Utc::now(),
        });
        self.storage.save_group(group).await?;

        self.log_and_audit(
            MEMBER_ADDED,
            json!({ "group_id": group_id, "user_id": user_id }),
            Some(added_by),
        )
        .await?;
        Ok(())
    }

    pub async fn get_group(&self, group_id: &str) -> Result<Option<Group>, DivvyError> {
        self.storage.get_group(group_id).await
    }

    // EXPENSES

    /// Creates the expense and its splits as one logical unit. The splits
    /// are validated and written after the expense row exists; if that step
    /// fails, the expense is deleted again so no orphan row without splits
    /// survives (compensating action, not a transaction).
    pub async fn add_expense(
        &self,
        group_id: &str,
        payer_id: &str,
        amount: f64,
        currency: String,
        category: String,
        description: String,
        shares: HashMap<String, f64>,
        created_by: &str,
    ) -> Result<ExpenseWithSplits, DivvyError> {
        info!(
            "Adding expense of {} to group {} paid by {}",
            amount, group_id, payer_id
        );
        let group = self.validate_group_membership(group_id, created_by).await?;
        if !group.is_member(payer_id) {
            return Err(DivvyError::NotGroupMember(payer_id.to_string()));
        }
        Self::validate_amount(amount)?;

        let now = Utc::now();
        let expense = Expense {
            id: Uuid::new_v4().to_string(),
            group_id: group_id.to_string(),
            payer_id: payer_id.to_string(),
            added_by: created_by.to_string(),
            amount,
            currency,
            category,
            description,
            created_at: now,
            updated_at: now,
        };
        let expense = self.storage.create_expense(expense).await?;

        let splits = match self.build_splits(&group, &expense.id, amount, &shares) {
            Ok(splits) => splits,
            Err(err) => {
                warn!("Split validation failed for expense {}, compensating", expense.id);
                self.storage.delete_expense(&expense.id).await?;
                return Err(err);
            }
        };
        if let Err(err) = self.storage.save_splits(&expense.id, splits.clone()).await {
            self.storage.delete_expense(&expense.id).await?;
            return Err(err);
        }

        self.log_and_audit(
            EXPENSE_ADDED,
            json!({
                "expense_id": expense.id,
                "group_id": group_id,
                "amount": amount,
                "payer_id": payer_id
            }),
            Some(created_by),
        )
        .await?;

        Ok(ExpenseWithSplits { expense, splits })
    }

    fn build_splits(
        &self,
        group: &Group,
        expense_id: &str,
        amount: f64,
        shares: &HashMap<String, f64>,
    ) -> Result<Vec<Split>, DivvyError> {
        if shares.is_empty() {
            return Err(DivvyError::InvalidSplit);
        }
        let share_sum: f64 = shares.values().sum();
        if (share_sum - amount).abs() > BALANCE_TOLERANCE {
            warn!("Splits sum {} does not match amount {}", share_sum, amount);
            return Err(DivvyError::InvalidSplit);
        }
        for user_id in shares.keys() {
            if !group.is_member(user_id) {
                return Err(DivvyError::InvalidSplitUser(user_id.clone()));
            }
        }
        Ok(shares
            .iter()
            .map(|(user_id, share)| Split {
                expense_id: expense_id.to_string(),
                user_id: user_id.clone(),
                share_amount: *share,
            })
            .collect())
    }

    fn can_edit_expense(group: &Group, expense: &Expense, user_id: &str) -> bool {
        expense.payer_id == user_id || group.is_admin(user_id)
    }

    /// Splits are replaced wholesale, never patched row by row.
    pub async fn update_expense(
        &self,
        expense_id: &str,
        actor: &str,
        new_amount: f64,
        new_category: String,
        new_description: String,
        new_shares: HashMap<String, f64>,
    ) -> Result<ExpenseWithSplits, DivvyError> {
        info!("Updating expense {} by user {}", expense_id, actor);
        let expense = self
            .storage
            .get_expense(expense_id)
            .await?
            .ok_or_else(|| DivvyError::ExpenseNotFound(expense_id.to_string()))?;
        let group = self.validate_group_membership(&expense.group_id, actor).await?;
        if !Self::can_edit_expense(&group, &expense, actor) {
            warn!("User {} may not edit expense {}", actor, expense_id);
            return Err(DivvyError::NotAuthorized {
                user_id: actor.to_string(),
                action: "edit this expense".to_string(),
            });
        }
        Self::validate_amount(new_amount)?;
        let splits = self.build_splits(&group, expense_id, new_amount, &new_shares)?;

        let updated = Expense {
            amount: new_amount,
            category: new_category,
            description: new_description,
            updated_at: Utc::now(),
            ..expense
        };
        let updated = self.storage.update_expense(updated).await?;
        self.storage.save_splits(expense_id, splits.clone()).await?;

        self.log_and_audit(
            EXPENSE_UPDATED,
            json!({ "expense_id": expense_id, "group_id": updated.group_id, "amount": new_amount }),
            Some(actor),
        )
        .await?;

        Ok(ExpenseWithSplits { expense: updated, splits })
    }

    pub async fn delete_expense(&self, expense_id: &str, actor: &str) -> Result<(), DivvyError> {
        info!("Deleting expense {} by user {}", expense_id, actor);
        let expense = self
            .storage
            .get_expense(expense_id)
            .await?
            .ok_or_else(|| DivvyError::ExpenseNotFound(expense_id.to_string()))?;
        let group = self.validate_group_membership(&expense.group_id, actor).await?;
        if !Self::can_edit_expense(&group, &expense, actor) {
            return Err(DivvyError::NotAuthorized {
                user_id: actor.to_string(),
                action: "delete this expense".to_string(),
            });
        }
        self.storage.delete_expense(expense_id).await?;

        self.log_and_audit(
            EXPENSE_DELETED,
            json!({ "expense_id": expense_id, "group_id": expense.group_id }),
            Some(actor),
        )
        .await?;
        Ok(())
    }

    // BALANCES

    /// One balance computation per group member, fanned out concurrently and
    /// joined. Nothing is cached; every call reads current ledger state.
    pub async fn get_group_balances(&self, group_id: &str) -> Result<Vec<MemberBalance>, DivvyError> {
        debug!("Computing balances for group {}", group_id);
        let group = self.get_group_or_err(group_id).await?;
        let memberships = self.storage.list_memberships(group_id).await?;
        let expenses = self.storage.list_expenses_with_splits(group_id).await?;
        let settlements = self
            .storage
            .list_settlements(SettlementFilter {
                group_id: Some(group_id.to_string()),
                ..Default::default()
            })
            .await?;

        let computations = memberships.iter().map(|member| {
            let expenses = &expenses;
            let settlements = &settlements;
            async move {
                self.member_balance(&member.user_id, expenses, settlements).await
            }
        });
        let balances = futures::future::try_join_all(computations).await?;

        self.log_and_audit(BALANCES_QUERIED, json!({ "group_id": group.id }), None)
            .await?;
        Ok(balances)
    }

    async fn member_balance(
        &self,
        user_id: &str,
        expenses: &[ExpenseWithSplits],
        settlements: &[Settlement],
    ) -> Result<MemberBalance, DivvyError> {
        let user = self
            .storage
            .get_user(user_id)
            .await?
            .ok_or_else(|| DivvyError::UserNotFound(user_id.to_string()))?;

        let totals = user_group_balance(user_id, expenses, settlements);

        let global_settlements = if user.settlement_mode == SettlementMode::Separate {
            Vec::new()
        } else {
            self.storage
                .list_settlements(SettlementFilter {
                    user_id: Some(user_id.to_string()),
                    status: Some(SettlementStatus::Accepted),
                    global_only: true,
                    ..Default::default()
                })
                .await?
        };
        let adjusted = apply_global_adjustment(user_id, totals.net, user.settlement_mode, &global_settlements);

        Ok(MemberBalance {
            user_id: user.id,
            username: user.name,
            total_paid: totals.total_paid,
            total_owed: totals.total_owed,
            received_settlements: totals.received_settlements,
            paid_settlements: totals.paid_settlements,
            net: adjusted.net,
            original_net: adjusted.original_net,
            global_adjustment: adjusted.global_adjustment,
            is_owed: adjusted.net > BALANCE_TOLERANCE,
            owes: adjusted.net < -BALANCE_TOLERANCE,
            is_settled: is_settled(adjusted.net),
        })
    }

    pub async fn get_suggested_settlements(&self, group_id: &str) -> Result<Vec<SuggestedSettlement>, DivvyError> {
        let balances = self.get_group_balances(group_id).await?;
        let usernames: HashMap<&str, &str> = balances
            .iter()
            .map(|b| (b.user_id.as_str(), b.username.as_str()))
            .collect();

        let nets: Vec<NetBalance> = balances
            .iter()
            .map(|b| NetBalance {
                user_id: b.user_id.clone(),
                balance: b.net,
            })
            .collect();

        Ok(optimize_settlements(&nets)
            .into_iter()
            .map(|t| SuggestedSettlement {
                from_username: usernames.get(t.from_user_id.as_str()).copied().unwrap_or_default().to_string(),
                to_username: usernames.get(t.to_user_id.as_str()).copied().unwrap_or_default().to_string(),
                from_user_id: t.from_user_id,
                to_user_id: t.to_user_id,
                amount: t.amount,
            })
            .collect())
    }

    // SETTLEMENT LIFECYCLE

    pub async fn record_settlement(
        &self,
        group_id: &str,
        from_user: &str,
        to_user: &str,
        amount: f64,
        message: Option<String>,
    ) -> Result<Settlement, DivvyError> {
        info!(
            "Recording settlement of {} from {} to {} in group {}",
            amount, from_user, to_user, group_id
        );
        Self::validate_amount(amount)?;
        if from_user == to_user {
            return Err(DivvyError::SelfSettlement);
        }
        let group = self.validate_group_membership(group_id, from_user).await?;
        if !group.is_member(to_user) {
            return Err(DivvyError::NotGroupMember(to_user.to_string()));
        }

        self.create_pending_settlement(Some(group_id.to_string()), from_user, to_user, amount, message, None)
            .await
    }

    /// Global settlements are bound to no group, so only the self-settlement
    /// and amount guards apply.
    pub async fn record_global_settlement(
        &self,
        from_user: &str,
        to_user: &str,
        amount: f64,
        message: Option<String>,
    ) -> Result<Settlement, DivvyError> {
        info!("Recording global settlement of {} from {} to {}", amount, from_user, to_user);
        Self::validate_amount(amount)?;
        if from_user == to_user {
            return Err(DivvyError::SelfSettlement);
        }
        self.validate_users(&[from_user, to_user]).await?;

        self.create_pending_settlement(None, from_user, to_user, amount, message, None)
            .await
    }

    async fn create_pending_settlement(
        &self,
        group_id: Option<String>,
        from_user: &str,
        to_user: &str,
        amount: f64,
        message: Option<String>,
        resend_of: Option<String>,
    ) -> Result<Settlement, DivvyError> {
        let now = Utc::now();
        let settlement = Settlement {
            id: Uuid::new_v4().to_string(),
            group_id,
            from_user_id: from_user.to_string(),
            to_user_id: to_user.to_string(),
            amount,
            message,
            status: SettlementStatus::Pending,
            rejected_reason: None,
            resend_of,
            created_at: now,
            updated_at: now,
        };
        let settlement = self.storage.create_settlement(settlement).await?;

        let action = if settlement.resend_of.is_some() {
            SETTLEMENT_RESENT
        } else {
            SETTLEMENT_CREATED
        };
        self.log_and_audit(
            action,
            json!({
                "settlement_id": settlement.id,
                "group_id": settlement.group_id,
                "from_user_id": from_user,
                "to_user_id": to_user,
                "amount": amount,
                "resend_of": settlement.resend_of
            }),
            Some(from_user),
        )
        .await?;
        self.notifier
            .publish(to_user, Event::new("settlement_proposed", &settlement))
            .await?;

        Ok(settlement)
    }

    pub async fn accept_settlement(&self, settlement_id: &str, actor: &str) -> Result<Settlement, DivvyError> {
        self.transition_settlement(settlement_id, actor, SettlementStatus::Accepted, None)
            .await
    }

    pub async fn reject_settlement(
        &self,
        settlement_id: &str,
        actor: &str,
        reason: Option<String>,
    ) -> Result<Settlement, DivvyError> {
        self.transition_settlement(settlement_id, actor, SettlementStatus::Rejected, reason)
            .await
    }

    /// Only the recipient may resolve a pending settlement, and the status
    /// write goes through the store's compare-and-swap so a racing
    /// transition surfaces as a conflict instead of clobbering a terminal
    /// state.
    async fn transition_settlement(
        &self,
        settlement_id: &str,
        actor: &str,
        new_status: SettlementStatus,
        rejected_reason: Option<String>,
    ) -> Result<Settlement, DivvyError> {
        info!("Transitioning settlement {} to {} by {}", settlement_id, new_status, actor);
        let settlement = self
            .storage
            .get_settlement(settlement_id)
            .await?
            .ok_or_else(|| DivvyError::SettlementNotFound(settlement_id.to_string()))?;

        if settlement.to_user_id != actor {
            warn!("User {} may not resolve settlement {}", actor, settlement_id);
            return Err(DivvyError::NotAuthorized {
                user_id: actor.to_string(),
                action: "resolve this settlement".to_string(),
            });
        }
        if settlement.status != SettlementStatus::Pending {
            return Err(DivvyError::InvalidSettlementState(settlement.status.to_string()));
        }

        let updated = match self
            .storage
            .cas_update_settlement_status(settlement_id, SettlementStatus::Pending, new_status, rejected_reason)
            .await?
        {
            CasOutcome::Applied(updated) => updated,
            CasOutcome::Conflict(current) => {
                warn!(
                    "Settlement {} transition lost the race, already {}",
                    settlement_id, current.status
                );
                return Err(DivvyError::SettlementConflict(current.status.to_string()));
            }
        };

        let action = match new_status {
            SettlementStatus::Accepted => SETTLEMENT_ACCEPTED,
            _ => SETTLEMENT_REJECTED,
        };
        self.log_and_audit(
            action,
            json!({ "settlement_id": settlement_id, "status": updated.status }),
            Some(actor),
        )
        .await?;
        self.notifier
            .publish(&updated.from_user_id, Event::new("settlement_resolved", &updated))
            .await?;

        Ok(updated)
    }

    /// Resending never reopens the rejected settlement: it creates a fresh
    /// pending one that references the rejected original for audit.
    pub async fn resend_settlement(
        &self,
        settlement_id: &str,
        actor: &str,
        amount: Option<f64>,
        message: Option<String>,
    ) -> Result<Settlement, DivvyError> {
        info!("Resending settlement {} by {}", settlement_id, actor);
        let original = self
            .storage
            .get_settlement(settlement_id)
            .await?
            .ok_or_else(|| DivvyError::SettlementNotFound(settlement_id.to_string()))?;

        if original.from_user_id != actor {
            return Err(DivvyError::NotAuthorized {
                user_id: actor.to_string(),
                action: "resend this settlement".to_string(),
            });
        }
        if original.status != SettlementStatus::Rejected {
            return Err(DivvyError::NotRejected(settlement_id.to_string()));
        }

        let amount = amount.unwrap_or(original.amount);
        Self::validate_amount(amount)?;

        self.create_pending_settlement(
            original.group_id.clone(),
            &original.from_user_id,
            &original.to_user_id,
            amount,
            message.or(original.message),
            Some(original.id),
        )
        .await
    }

    pub async fn get_settlement_history(
        &self,
        group_id: &str,
        user_id: &str,
        status: Option<SettlementStatus>,
    ) -> Result<Vec<Settlement>, DivvyError> {
        self.validate_group_membership(group_id, user_id).await?;
        let settlements = self
            .storage
            .list_settlements(SettlementFilter {
                group_id: Some(group_id.to_string()),
                user_id: Some(user_id.to_string()),
                status,
                ..Default::default()
            })
            .await?;

        self.log_and_audit(
            SETTLEMENT_HISTORY_QUERIED,
            json!({ "group_id": group_id, "user_id": user_id }),
            Some(user_id),
        )
        .await?;
        Ok(settlements)
    }

    pub async fn get_app_logs(&self) -> Result<Vec<ActivityLog>, DivvyError> {
        self.logging.get_logs().await
    }
}
