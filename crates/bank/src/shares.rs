//! Share <-> native amount conversion
//!
//! Native amounts are whole token units; shares carry [`SHARE_DECIMALS`]
//! places. Callers pick the rounding direction so that every conversion
//! favors the protocol:
//!
//! | conversion                         | rounding |
//! |------------------------------------|----------|
//! | asset shares -> withdrawable amount | down     |
//! | deposit amount -> shares minted     | down     |
//! | withdraw amount -> shares burned    | up       |
//! | liability shares -> amount owed     | up       |
//! | borrow amount -> shares minted      | up       |
//! | repay amount -> shares burned       | down     |

use lendrisk_core::{CoreError, Fixed, Rounding};

pub const SHARE_DECIMALS: u32 = 12;

/// `shares * total_native / total_shares`, or 1:1 for an empty bank
pub fn shares_to_amount(
    shares: Fixed,
    total_shares: Fixed,
    total_native: Fixed,
    rounding: Rounding,
) -> Result<Fixed, CoreError> {
    if total_shares.is_zero() {
        return Ok(shares.round_dp(0, rounding));
    }
    shares.mul_div(total_native, total_shares, 0, rounding)
}

/// `amount * total_shares / total_native`, or 1:1 for an empty bank
pub fn amount_to_shares(
    amount: Fixed,
    total_shares: Fixed,
    total_native: Fixed,
    rounding: Rounding,
) -> Result<Fixed, CoreError> {
    if total_shares.is_zero() {
        return Ok(amount.round_dp(SHARE_DECIMALS, rounding));
    }
    amount.mul_div(total_shares, total_native, SHARE_DECIMALS, rounding)
}
