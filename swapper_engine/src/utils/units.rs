use std::str::FromStr;

use bigdecimal::BigDecimal;
use error_stack::{ResultExt, report};
use num::bigint::Sign;
use num::{BigInt, BigUint, Integer, Signed, Zero};
use swapper_models::models::BaseUnits;

use crate::error::{EngineResult, Error};

/// THORChain expresses every asset with 8 decimals
pub const THOR_PRECISION: u8 = 8;

/// Decimal places kept by rates and other quotients
pub const DIVISION_DECIMAL_PLACES: u32 = 20;

pub fn pow10(exp: u32) -> BigUint {
    num::pow(BigUint::from(10u8), exp as usize)
}

fn pow10_signed(exp: u32) -> BigInt {
    BigInt::from(pow10(exp))
}

/// Decimal exponent as a `pow10` argument, rejecting shifts beyond `u32`
fn exponent(shift: u64) -> EngineResult<u32> {
    u32::try_from(shift).map_err(|_| {
        report!(Error::ParseError).attach_printable(format!("Decimal exponent {shift} out of range"))
    })
}

pub fn parse_decimal(value: &str) -> EngineResult<BigDecimal> {
    BigDecimal::from_str(value.trim())
        .change_context(Error::ParseError)
        .attach_printable_lazy(|| format!("Invalid decimal: {value}"))
}

/// Human amount to base units, dropping digits beyond `precision`
pub fn to_base_unit(human: &BigDecimal, precision: u8) -> EngineResult<BaseUnits> {
    let (digits, scale) = human.as_bigint_and_exponent();
    if digits.is_negative() {
        return Err(report!(Error::ParseError)
            .attach_printable(format!("Negative amount {human} has no base unit form")));
    }

    // value = digits * 10^(precision - scale)
    let shift = i64::from(precision) - scale;
    let magnitude = digits.magnitude().clone();
    let base = if shift >= 0 {
        magnitude * pow10(exponent(shift.unsigned_abs())?)
    } else {
        magnitude / pow10(exponent(shift.unsigned_abs())?)
    };
    Ok(BaseUnits::new(base))
}

/// Exact human representation of a base unit amount
pub fn from_base_unit(amount: &BaseUnits, precision: u8) -> BigDecimal {
    BigDecimal::new(
        BigInt::from_biguint(Sign::Plus, amount.as_biguint().clone()),
        i64::from(precision),
    )
}

/// Rescales an asset amount into THORChain's 8 decimal units, truncating
pub fn to_thor_base_unit(amount: &BaseUnits, precision: u8) -> BaseUnits {
    rescale(amount, precision, THOR_PRECISION)
}

/// Rescales a THORChain amount into the asset's own precision, truncating
pub fn thor_to_base_unit(thor_amount: &BaseUnits, precision: u8) -> BaseUnits {
    rescale(thor_amount, THOR_PRECISION, precision)
}

pub fn from_thor_base_unit(thor_amount: &BaseUnits) -> BigDecimal {
    from_base_unit(thor_amount, THOR_PRECISION)
}

fn rescale(amount: &BaseUnits, from_precision: u8, to_precision: u8) -> BaseUnits {
    let value = amount.as_biguint();
    if to_precision >= from_precision {
        BaseUnits::new(value * pow10(u32::from(to_precision - from_precision)))
    } else {
        BaseUnits::new(value / pow10(u32::from(from_precision - to_precision)))
    }
}

/// `numerator / denominator` rounded half-up (away from zero) to `decimal_places`
pub fn bn_div_round(
    numerator: &BigDecimal,
    denominator: &BigDecimal,
    decimal_places: u32,
) -> EngineResult<BigDecimal> {
    let (num_digits, num_scale) = numerator.as_bigint_and_exponent();
    let (den_digits, den_scale) = denominator.as_bigint_and_exponent();
    if den_digits.is_zero() {
        return Err(report!(Error::ParseError).attach_printable("Division by zero"));
    }

    // a/b * 10^dp = num * 10^(den_scale + dp - num_scale) / den
    let shift = den_scale + i64::from(decimal_places) - num_scale;
    let (scaled_num, scaled_den) = if shift >= 0 {
        (num_digits * pow10_signed(exponent(shift.unsigned_abs())?), den_digits)
    } else {
        (
            num_digits,
            den_digits * pow10_signed(exponent(shift.unsigned_abs())?),
        )
    };

    let negative = scaled_num.is_negative() != scaled_den.is_negative() && !scaled_num.is_zero();
    let quotient = round_half_up_quotient(scaled_num.magnitude(), scaled_den.magnitude());
    let sign = if negative { Sign::Minus } else { Sign::Plus };

    Ok(BigDecimal::new(
        BigInt::from_biguint(sign, quotient),
        i64::from(decimal_places),
    ))
}

/// Rounds half-up (away from zero) to `decimal_places`
pub fn round_half_up(value: &BigDecimal, decimal_places: u32) -> EngineResult<BigDecimal> {
    let (digits, scale) = value.as_bigint_and_exponent();
    if scale <= i64::from(decimal_places) {
        return Ok(value.clone());
    }
    let divisor = pow10(exponent((scale - i64::from(decimal_places)).unsigned_abs())?);
    let quotient = round_half_up_quotient(digits.magnitude(), &divisor);
    let sign = if digits.is_negative() && !quotient.is_zero() {
        Sign::Minus
    } else {
        Sign::Plus
    };
    Ok(BigDecimal::new(
        BigInt::from_biguint(sign, quotient),
        i64::from(decimal_places),
    ))
}

/// Integer quotient rounded half-up
pub fn round_half_up_quotient(numerator: &BigUint, denominator: &BigUint) -> BigUint {
    let (quotient, remainder) = numerator.div_rem(denominator);
    if remainder * 2u8 >= *denominator {
        quotient + 1u8
    } else {
        quotient
    }
}

/// Plain notation without exponent and without trailing zeros, `"144114.94"`, `"19.14"`, `"0"`
pub fn to_plain_string(value: &BigDecimal) -> String {
    let (digits, scale) = value.as_bigint_and_exponent();
    let negative = digits.is_negative();
    let mut magnitude = digits.magnitude().clone();
    let mut scale = scale;

    if magnitude.is_zero() {
        return "0".to_string();
    }

    let ten = BigUint::from(10u8);
    while scale > 0 && (&magnitude % &ten).is_zero() {
        magnitude /= &ten;
        scale -= 1;
    }

    let mut rendered = magnitude.to_string();
    if scale <= 0 {
        rendered.push_str(&"0".repeat(scale.unsigned_abs() as usize));
    } else {
        let scale = scale as usize;
        if rendered.len() <= scale {
            rendered = format!("{}{rendered}", "0".repeat(scale - rendered.len() + 1));
        }
        rendered.insert(rendered.len() - scale, '.');
    }

    if negative {
        format!("-{rendered}")
    } else {
        rendered
    }
}

/// `buy / sell` on human values, rounded half-up to 20 decimal places
pub fn rate_from_base_units(
    buy_amount: &BaseUnits,
    buy_precision: u8,
    sell_amount: &BaseUnits,
    sell_precision: u8,
) -> EngineResult<String> {
    let rate = bn_div_round(
        &from_base_unit(buy_amount, buy_precision),
        &from_base_unit(sell_amount, sell_precision),
        DIVISION_DECIMAL_PLACES,
    )
    .attach_printable("Cannot compute rate of a zero sell amount")?;
    Ok(to_plain_string(&rate))
}
