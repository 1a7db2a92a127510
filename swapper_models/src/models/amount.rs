use std::fmt;
use std::ops::Add;
use std::str::FromStr;

use error_stack::{Report, ResultExt, report};
use num::{BigUint, Zero};
use serde_with::{DeserializeFromStr, SerializeDisplay};

use crate::error::Error;

/// Amount expressed in the smallest indivisible unit of an asset.
///
/// Serialized as a plain integer string, the way every quote API carries it.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, SerializeDisplay, DeserializeFromStr,
)]
pub struct BaseUnits(BigUint);

impl BaseUnits {
    pub fn new(value: BigUint) -> Self {
        BaseUnits(value)
    }

    pub fn zero() -> Self {
        BaseUnits(BigUint::zero())
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn as_biguint(&self) -> &BigUint {
        &self.0
    }

    pub fn checked_sub(&self, other: &BaseUnits) -> Option<BaseUnits> {
        if other.0 > self.0 {
            None
        } else {
            Some(BaseUnits(&self.0 - &other.0))
        }
    }

    pub fn saturating_sub(&self, other: &BaseUnits) -> BaseUnits {
        self.checked_sub(other).unwrap_or_default()
    }

    /// `self * numerator / denominator`, rounded down
    pub fn mul_div(&self, numerator: u64, denominator: u64) -> Result<BaseUnits, Report<Error>> {
        if denominator == 0 {
            return Err(report!(Error::InvalidAmount("division by zero".to_string())));
        }
        Ok(BaseUnits(
            &self.0 * BigUint::from(numerator) / BigUint::from(denominator),
        ))
    }
}

impl fmt::Display for BaseUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BaseUnits {
    type Err = Report<Error>;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(report!(Error::InvalidAmount(s.to_string()))
                .attach_printable("Base unit amounts are unsigned integers"));
        }
        BigUint::from_str(trimmed)
            .map(BaseUnits)
            .change_context(Error::InvalidAmount(s.to_string()))
    }
}

impl From<u64> for BaseUnits {
    fn from(value: u64) -> Self {
        BaseUnits(BigUint::from(value))
    }
}

impl From<u128> for BaseUnits {
    fn from(value: u128) -> Self {
        BaseUnits(BigUint::from(value))
    }
}

impl From<BigUint> for BaseUnits {
    fn from(value: BigUint) -> Self {
        BaseUnits(value)
    }
}

impl Add for BaseUnits {
    type Output = BaseUnits;

    fn add(self, rhs: BaseUnits) -> Self::Output {
        BaseUnits(self.0 + rhs.0)
    }
}

impl<'a> Add<&'a BaseUnits> for &'a BaseUnits {
    type Output = BaseUnits;

    fn add(self, rhs: &'a BaseUnits) -> Self::Output {
        BaseUnits(&self.0 + &rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let amount: BaseUnits = "114321610000000000".parse().unwrap();
        assert_eq!(amount.to_string(), "114321610000000000");

        let big: BaseUnits = "100000000000000000000000000000000000000000".parse().unwrap();
        assert_eq!(big.to_string(), "100000000000000000000000000000000000000000");
    }

    #[test]
    fn test_rejects_non_integers() {
        assert!("1.5".parse::<BaseUnits>().is_err());
        assert!("-1".parse::<BaseUnits>().is_err());
        assert!("".parse::<BaseUnits>().is_err());
        assert!("1e18".parse::<BaseUnits>().is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let amount = BaseUnits::from(400000u64);
        assert_eq!(serde_json::to_string(&amount).unwrap(), "\"400000\"");
        let back: BaseUnits = serde_json::from_str("\"400000\"").unwrap();
        assert_eq!(back, amount);
    }

    #[test]
    fn test_arithmetic() {
        let a = BaseUnits::from(10u64);
        let b = BaseUnits::from(4u64);
        assert_eq!(&a + &b, BaseUnits::from(14u64));
        assert_eq!(a.checked_sub(&b), Some(BaseUnits::from(6u64)));
        assert_eq!(b.checked_sub(&a), None);
        assert_eq!(b.saturating_sub(&a), BaseUnits::zero());
        assert_eq!(
            BaseUnits::from(1_000_000u64).mul_div(30, 10_000).unwrap(),
            BaseUnits::from(3_000u64)
        );
        assert!(a.mul_div(1, 0).is_err());
    }
}
