use error_stack::report;
use num::BigUint;
use swapper_models::models::BaseUnits;
use tiny_keccak::{Hasher, Keccak};

use crate::error::{EngineResult, Error};

/// `approve(address,uint256)`
pub const APPROVE_SELECTOR: &str = "0x095ea7b3";
pub const DEPOSIT_WITH_EXPIRY_SIGNATURE: &str =
    "depositWithExpiry(address,address,uint256,string,uint256)";

const WORD_HEX_LEN: usize = 64;

/// First 4 bytes of the keccak256 of the function signature, `0x` prefixed
pub fn function_selector(signature: &str) -> String {
    let mut hasher = Keccak::v256();
    hasher.update(signature.as_bytes());
    let mut output = [0u8; 32];
    hasher.finalize(&mut output);
    format!("0x{}", hex::encode(&output[..4]))
}

fn encode_address(address: &str) -> EngineResult<String> {
    let stripped = address.strip_prefix("0x").unwrap_or(address);
    if stripped.len() != 40 || hex::decode(stripped).is_err() {
        return Err(report!(Error::TransactionBuildFailure(format!(
            "Invalid EVM address {address}"
        ))));
    }
    Ok(format!("{:0>64}", stripped.to_lowercase()))
}

fn encode_uint(value: &BigUint) -> EngineResult<String> {
    if value.bits() > 256 {
        return Err(report!(Error::TransactionBuildFailure(format!(
            "{value} does not fit in uint256"
        ))));
    }
    Ok(format!("{value:064x}"))
}

/// Length word followed by the right padded bytes
fn encode_string(value: &str) -> EngineResult<String> {
    let bytes = value.as_bytes();
    let mut encoded = encode_uint(&BigUint::from(bytes.len()))?;
    let mut data = hex::encode(bytes);
    let padding = (WORD_HEX_LEN - data.len() % WORD_HEX_LEN) % WORD_HEX_LEN;
    data.push_str(&"0".repeat(padding));
    encoded.push_str(&data);
    Ok(encoded)
}

/// ERC-20 `approve(spender, amount)` calldata
pub fn encode_approve(spender: &str, amount: &BaseUnits) -> EngineResult<String> {
    Ok(format!(
        "{APPROVE_SELECTOR}{}{}",
        encode_address(spender)?,
        encode_uint(amount.as_biguint())?
    ))
}

/// THORChain router `depositWithExpiry(vault, asset, amount, memo, expiry)` calldata
pub fn encode_deposit_with_expiry(
    vault: &str,
    asset: &str,
    amount: &BaseUnits,
    memo: &str,
    expiry: u64,
) -> EngineResult<String> {
    // 5 head words, the memo offset points right past them
    let memo_offset = BigUint::from(5u8 * 32);
    Ok(format!(
        "{}{}{}{}{}{}{}",
        function_selector(DEPOSIT_WITH_EXPIRY_SIGNATURE),
        encode_address(vault)?,
        encode_address(asset)?,
        encode_uint(amount.as_biguint())?,
        encode_uint(&memo_offset)?,
        encode_uint(&BigUint::from(expiry))?,
        encode_string(memo)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROUTER: &str = "0x3624525075b88B24ecc29CE226b0CEc1fFcB6976";
    const VAULT: &str = "0x2Cc7B5b5b3Ae6d9c8C5A3E6e2bE56c0bd2C7E1dA";

    #[test]
    fn test_function_selectors() {
        assert_eq!(function_selector("approve(address,uint256)"), APPROVE_SELECTOR);
        assert_eq!(function_selector("transfer(address,uint256)"), "0xa9059cbb");
        assert_eq!(
            function_selector(DEPOSIT_WITH_EXPIRY_SIGNATURE),
            "0x44bc937b"
        );
    }

    #[test]
    fn test_encode_approve() {
        let data = encode_approve(ROUTER, &BaseUnits::from(713014679420u64)).unwrap();
        assert_eq!(data.len(), 138);
        assert!(data.starts_with(APPROVE_SELECTOR));
        assert_eq!(
            &data[10..74],
            "0000000000000000000000003624525075b88b24ecc29ce226b0cec1ffcb6976"
        );
        assert_eq!(
            &data[74..],
            "000000000000000000000000000000000000000000000000000000a602fc977c"
        );
    }

    #[test]
    fn test_encode_deposit_with_expiry() {
        let memo = "-:ETH.ETH:5000";
        let data = encode_deposit_with_expiry(
            VAULT,
            "0x0000000000000000000000000000000000000000",
            &BaseUnits::from(10_000_000_000u64),
            memo,
            1681132269,
        )
        .unwrap();

        let body = &data[10..];
        let words: Vec<&str> = (0..body.len() / 64)
            .map(|i| &body[i * 64..(i + 1) * 64])
            .collect();
        assert_eq!(words.len(), 7);
        assert_eq!(words[1], "0".repeat(64));
        assert_eq!(u64::from_str_radix(&words[2][48..], 16).unwrap(), 10_000_000_000);
        assert_eq!(u64::from_str_radix(&words[3][48..], 16).unwrap(), 160);
        assert_eq!(u64::from_str_radix(&words[4][48..], 16).unwrap(), 1681132269);
        assert_eq!(u64::from_str_radix(&words[5][48..], 16).unwrap(), memo.len() as u64);
        assert!(words[6].starts_with(&hex::encode(memo)));
    }

    #[test]
    fn test_rejects_invalid_inputs() {
        assert!(encode_approve("0x1234", &BaseUnits::from(1u64)).is_err());
        assert!(encode_approve("0xzz24525075b88b24ecc29ce226b0cec1ffcb6976", &BaseUnits::from(1u64)).is_err());

        let too_big = BaseUnits::new(num::pow(BigUint::from(2u8), 256));
        assert!(encode_approve(ROUTER, &too_big).is_err());
    }
}
