//! Balance calculator: derives a user's standing in one group from the
//! group's expenses, splits, and accepted settlements. Pure functions over
//! already-fetched ledger rows; nothing here is cached, every call recomputes
//! from current state.

use log::debug;

use crate::constants::BALANCE_TOLERANCE;
use crate::core::models::balance::UserGroupBalance;
use crate::core::models::expense::ExpenseWithSplits;
use crate::core::models::settlement::{Settlement, SettlementStatus};

/// Sign convention: positive net means others owe this user, negative means
/// this user owes others. Settlements the user has already received shrink
/// what is still owed to them; settlements they have already paid shrink
/// what they still owe. Pending and rejected settlements never count.
pub fn user_group_balance(
    user_id: &str,
    expenses: &[ExpenseWithSplits],
    settlements: &[Settlement],
) -> UserGroupBalance {
    let mut total_paid = 0.0;
    let mut total_owed = 0.0;

    for item in expenses {
        if item.expense.payer_id == user_id {
            total_paid += item.expense.amount;
        }
        for split in &item.splits {
            if split.user_id == user_id {
                total_owed += split.share_amount;
            }
        }
    }

    let mut received_settlements = 0.0;
    let mut paid_settlements = 0.0;
    for settlement in settlements {
        if settlement.status != SettlementStatus::Accepted {
            continue;
        }
        if settlement.to_user_id == user_id {
            received_settlements += settlement.amount;
        }
        if settlement.from_user_id == user_id {
            paid_settlements += settlement.amount;
        }
    }

    let net = (total_paid - total_owed) - received_settlements + paid_settlements;
    debug!(
        "balance for {}: paid={} owed={} received={} paid_settlements={} net={}",
        user_id, total_paid, total_owed, received_settlements, paid_settlements, net
    );

    UserGroupBalance {
        total_paid,
        total_owed,
        received_settlements,
        paid_settlements,
        net,
    }
}

pub fn is_settled(net: f64) -> bool {
    net.abs() <= BALANCE_TOLERANCE
}
