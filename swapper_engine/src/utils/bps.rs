use bigdecimal::BigDecimal;
use error_stack::report;
use num::{BigInt, BigUint};
use rust_decimal::Decimal;
use swapper_models::models::BaseUnits;

use crate::error::{EngineResult, Error};
use crate::utils::units::round_half_up_quotient;

pub const BASE_BPS_POINTS: u32 = 10_000;

/// Basis points as a decimal fraction, `4357` -> `0.4357`
pub fn bps_to_fraction(bps: u32) -> Decimal {
    Decimal::new(i64::from(bps), 4).normalize()
}

/// Basis points as a percentage, `4357` -> `43.57`
pub fn bps_to_percentage(bps: u32) -> BigDecimal {
    BigDecimal::new(BigInt::from(bps), 2)
}

/// Share of the position being withdrawn, in basis points of `staked + rewards`.
///
/// Rounded half-up and capped at a full withdraw. A zero share means there is
/// nothing to ask THORChain for.
pub fn withdraw_bps(
    withdraw: &BaseUnits,
    staked: &BaseUnits,
    rewards: &BaseUnits,
) -> EngineResult<u32> {
    let total = staked + rewards;
    if total.is_zero() || withdraw.is_zero() {
        return Err(report!(Error::NothingToWithdraw)
            .attach_printable(format!("withdraw {withdraw} of position {total}")));
    }

    let scaled = withdraw.as_biguint() * BigUint::from(BASE_BPS_POINTS);
    let bps = round_half_up_quotient(&scaled, total.as_biguint())
        .min(BigUint::from(BASE_BPS_POINTS));

    let bps = u32::try_from(bps).map_err(|_| report!(Error::ParseError))?;
    if bps == 0 {
        return Err(report!(Error::NothingToWithdraw)
            .attach_printable(format!("withdraw {withdraw} of position {total} rounds to 0 bps")));
    }
    Ok(bps)
}

/// `human_amount * percentage / 100`, the amount lost to slippage
pub fn slippage_amount(human_amount: &BigDecimal, slippage_bps: u32) -> BigDecimal {
    let hundredth = BigDecimal::new(BigInt::from(1), 2);
    human_amount * bps_to_percentage(slippage_bps) * hundredth
}

/// `amount * bps / 10_000`, rounded down
pub fn apply_bps(amount: &BaseUnits, bps: u32) -> EngineResult<BaseUnits> {
    amount
        .mul_div(u64::from(bps), u64::from(BASE_BPS_POINTS))
        .map_err(crate::error::from_model_report)
}
