//! Settlement optimizer: turns a vector of net balances into a short list of
//! transfers that bring every balance back to zero.
//!
//! Finding the true minimum number of transactions is NP-hard, so this is a
//! greedy heuristic: always pair the largest creditor with the largest
//! debtor. It is close to optimal in practice but not guaranteed minimal,
//! and that is accepted behavior. Ties between equal magnitudes are broken
//! by ascending user id so the output is reproducible.

use log::debug;

use crate::constants::BALANCE_TOLERANCE;
use crate::core::models::balance::{NetBalance, Transfer};

fn round_to_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Emits at most creditors + debtors - 1 transfers. Amounts are rounded to
/// 2 decimal places; the final transfer of a run absorbs any residual
/// fractional cents so the applied output sums back to zero.
pub fn optimize_settlements(balances: &[NetBalance]) -> Vec<Transfer> {
    let mut creditors: Vec<(String, f64)> = balances
        .iter()
        .filter(|b| b.balance > BALANCE_TOLERANCE)
        .map(|b| (b.user_id.clone(), b.balance))
        .collect();
    let mut debtors: Vec<(String, f64)> = balances
        .iter()
        .filter(|b| b.balance < -BALANCE_TOLERANCE)
        .map(|b| (b.user_id.clone(), -b.balance))
        .collect();

    creditors.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    debtors.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let mut transfers = Vec::new();
    let mut i = 0;
    let mut j = 0;

    while i < debtors.len() && j < creditors.len() {
        let debt = debtors[i].1;
        let credit = creditors[j].1;
        let settled = debt.min(credit);

        let last_pair = i + 1 == debtors.len() && j + 1 == creditors.len();
        let exhausts_both = debt - settled <= BALANCE_TOLERANCE && credit - settled <= BALANCE_TOLERANCE;
        // The closing transfer carries whatever fraction of a cent the
        // earlier rounding left behind.
        let amount = if last_pair && exhausts_both {
            round_to_cents(debt.max(credit))
        } else {
            round_to_cents(settled)
        };

        if amount > BALANCE_TOLERANCE {
            transfers.push(Transfer {
                from_user_id: debtors[i].0.clone(),
                to_user_id: creditors[j].0.clone(),
                amount,
            });
        }

        debtors[i].1 -= settled;
        creditors[j].1 -= settled;

        if debtors[i].1 <= BALANCE_TOLERANCE {
            i += 1;
        }
        if creditors[j].1 <= BALANCE_TOLERANCE {
            j += 1;
        }
    }

    debug!("optimized {} balances into {} transfers", balances.len(), transfers.len());
    transfers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn balance(user_id: &str, amount: f64) -> NetBalance {
        NetBalance {
            user_id: user_id.to_string(),
            balance: amount,
        }
    }

    #[test]
    fn settled_group_produces_no_transfers() {
        let balances = vec![balance("a", 0.0), balance("b", 0.005), balance("c", -0.005)];
        assert!(optimize_settlements(&balances).is_empty());
    }

    #[test]
    fn simple_pair_produces_one_transfer() {
        let balances = vec![balance("x", 50.0), balance("y", -50.0)];
        let transfers = optimize_settlements(&balances);
        assert_eq!(transfers.len(), 1);
        assert_eq!(transfers[0].from_user_id, "y");
        assert_eq!(transfers[0].to_user_id, "x");
        assert_eq!(transfers[0].amount, 50.0);
    }

    #[test]
    fn three_way_resolves_in_two_deterministic_transfers() {
        let balances = vec![balance("a", 30.0), balance("b", -10.0), balance("c", -20.0)];
        let transfers = optimize_settlements(&balances);
        assert_eq!(transfers.len(), 2);
        assert_eq!((transfers[0].from_user_id.as_str(), transfers[0].amount), ("c", 20.0));
        assert_eq!((transfers[1].from_user_id.as_str(), transfers[1].amount), ("b", 10.0));
        assert!(transfers.iter().all(|t| t.to_user_id == "a"));
    }

    #[test]
    fn equal_magnitudes_break_ties_by_user_id() {
        let balances = vec![
            balance("b", -25.0),
            balance("a", -25.0),
            balance("d", 25.0),
            balance("c", 25.0),
        ];
        let transfers = optimize_settlements(&balances);
        assert_eq!(transfers.len(), 2);
        assert_eq!(transfers[0].from_user_id, "a");
        assert_eq!(transfers[0].to_user_id, "c");
        assert_eq!(transfers[1].from_user_id, "b");
        assert_eq!(transfers[1].to_user_id, "d");
    }

    #[test]
    fn applying_transfers_zeroes_every_balance() {
        let balances = vec![
            balance("a", 73.34),
            balance("b", -21.67),
            balance("c", -90.0),
            balance("d", 55.55),
            balance("e", -17.22),
        ];
        let transfers = optimize_settlements(&balances);
        assert!(transfers.len() <= 4);

        let mut remaining: std::collections::HashMap<&str, f64> =
            balances.iter().map(|b| (b.user_id.as_str(), b.balance)).collect();
        for t in &transfers {
            *remaining.get_mut(t.from_user_id.as_str()).unwrap() += t.amount;
            *remaining.get_mut(t.to_user_id.as_str()).unwrap() -= t.amount;
        }
        for (_, leftover) in remaining {
            assert!(leftover.abs() <= BALANCE_TOLERANCE, "leftover {}", leftover);
        }
    }

    #[test]
    fn no_transfer_exceeds_the_smaller_side() {
        let balances = vec![
            balance("a", 40.0),
            balance("b", 10.0),
            balance("c", -30.0),
            balance("d", -20.0),
        ];
        let mut creditors: std::collections::HashMap<&str, f64> = [("a", 40.0), ("b", 10.0)].into();
        let mut debtors: std::collections::HashMap<&str, f64> = [("c", 30.0), ("d", 20.0)].into();
        for t in optimize_settlements(&balances) {
            let credit = creditors.get_mut(t.to_user_id.as_str()).expect("paired two debtors");
            let debt = debtors.get_mut(t.from_user_id.as_str()).expect("paired two creditors");
            assert!(t.amount <= credit.min(*debt) + BALANCE_TOLERANCE);
            *credit -= t.amount;
            *debt -= t.amount;
        }
    }
}
