//! Global adjustment layer: merges the effect of accepted cross-group
//! settlements into a user's balance view for one group, according to the
//! user's settlement mode. Pure; never writes anything back.

use crate::core::models::settlement::{Settlement, SettlementStatus};
use crate::core::models::user::SettlementMode;

#[derive(Clone, Debug, PartialEq)]
pub struct AdjustedBalance {
    pub net: f64,
    pub original_net: f64,
    pub global_adjustment: f64,
}

/// Sums accepted global settlements touching the user: amounts received add,
/// amounts paid subtract. Under `Separate` the adjustment is not even
/// computed; under `Hybrid` it is computed and exposed but the net used for
/// classification stays the group-local one.
pub fn apply_global_adjustment(
    user_id: &str,
    original_net: f64,
    mode: SettlementMode,
    global_settlements: &[Settlement],
) -> AdjustedBalance {
    if mode == SettlementMode::Separate {
        return AdjustedBalance {
            net: original_net,
            original_net,
            global_adjustment: 0.0,
        };
    }

    let global_adjustment: f64 = global_settlements
        .iter()
        .filter(|s| s.status == SettlementStatus::Accepted && s.is_global())
        .map(|s| {
            if s.to_user_id == user_id {
                s.amount
            } else if s.from_user_id == user_id {
                -s.amount
            } else {
                0.0
            }
        })
        .sum();

    let net = match mode {
        SettlementMode::AutoAdjust => original_net + global_adjustment,
        _ => original_net,
    };

    AdjustedBalance {
        net,
        original_net,
        global_adjustment,
    }
}
