use error_stack::report;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use strum::IntoEnumIterator;
use strum_macros::EnumIter;

use crate::error::{Error, ModelResult};

pub const NATIVE_TOKEN_EVM_ADDRESS: &str = "0xeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee";
pub const EVM_NULL_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

pub const NATIVE_TOKEN_EVM_ADDRESSES: [&str; 2] = [NATIVE_TOKEN_EVM_ADDRESS, EVM_NULL_ADDRESS];

pub fn is_native_token_evm_address(address: &str) -> bool {
    NATIVE_TOKEN_EVM_ADDRESSES.contains(&address.to_lowercase().as_str())
}

/// Cashaddr prefix THORChain strips from Bitcoin Cash addresses
pub const BCH_ADDRESS_PREFIX: &str = "bitcoincash:";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Serialize, Deserialize)]
pub enum ChainId {
    #[serde(rename = "eip155:1")]
    Ethereum,
    #[serde(rename = "eip155:43114")]
    Avalanche,
    #[serde(rename = "eip155:56")]
    BnbSmartChain,
    #[serde(rename = "bip122:000000000019d6689c085ae165831e93")]
    Bitcoin,
    #[serde(rename = "bip122:000000000000000000651ef99cb9fcbe")]
    BitcoinCash,
    #[serde(rename = "bip122:12a765e31ffd4059bada1e25190f6e98")]
    Litecoin,
    #[serde(rename = "bip122:00000000001a91e3dace36e2be3bf030")]
    Dogecoin,
    #[serde(rename = "cosmos:cosmoshub-4")]
    Cosmos,
    #[serde(rename = "cosmos:thorchain-mainnet-v1")]
    Thorchain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, Hash)]
pub enum ChainType {
    Evm,
    Utxo,
    Cosmos,
}

impl ChainId {
    pub fn supported_chains() -> Vec<ChainId> {
        ChainId::iter().collect()
    }

    /// CAIP-2 identifier
    pub fn as_caip2(&self) -> &'static str {
        match self {
            Self::Ethereum => "eip155:1",
            Self::Avalanche => "eip155:43114",
            Self::BnbSmartChain => "eip155:56",
            Self::Bitcoin => "bip122:000000000019d6689c085ae165831e93",
            Self::BitcoinCash => "bip122:000000000000000000651ef99cb9fcbe",
            Self::Litecoin => "bip122:12a765e31ffd4059bada1e25190f6e98",
            Self::Dogecoin => "bip122:00000000001a91e3dace36e2be3bf030",
            Self::Cosmos => "cosmos:cosmoshub-4",
            Self::Thorchain => "cosmos:thorchain-mainnet-v1",
        }
    }

    pub fn to_chain_type(&self) -> ChainType {
        match self {
            Self::Ethereum | Self::Avalanche | Self::BnbSmartChain => ChainType::Evm,
            Self::Bitcoin | Self::BitcoinCash | Self::Litecoin | Self::Dogecoin => ChainType::Utxo,
            Self::Cosmos | Self::Thorchain => ChainType::Cosmos,
        }
    }

    pub fn is_utxo(&self) -> bool {
        self.to_chain_type() == ChainType::Utxo
    }

    pub fn is_evm(&self) -> bool {
        self.to_chain_type() == ChainType::Evm
    }

    /// Numeric chain id used by EVM aggregator APIs
    pub fn evm_chain_id(&self) -> Option<u64> {
        match self {
            Self::Ethereum => Some(1),
            Self::Avalanche => Some(43114),
            Self::BnbSmartChain => Some(56),
            _ => None,
        }
    }

    /// Chain prefix of THORChain asset notation, e.g. `BTC` in `BTC.BTC`
    pub fn thorchain_chain(&self) -> &'static str {
        match self {
            Self::Ethereum => "ETH",
            Self::Avalanche => "AVAX",
            Self::BnbSmartChain => "BSC",
            Self::Bitcoin => "BTC",
            Self::BitcoinCash => "BCH",
            Self::Litecoin => "LTC",
            Self::Dogecoin => "DOGE",
            Self::Cosmos => "GAIA",
            Self::Thorchain => "THOR",
        }
    }

    /// Symbol, name and precision of the fee asset
    pub fn fee_asset_info(&self) -> (&'static str, &'static str, u8) {
        match self {
            Self::Ethereum => ("ETH", "Ethereum", 18),
            Self::Avalanche => ("AVAX", "Avalanche", 18),
            Self::BnbSmartChain => ("BNB", "BNB", 18),
            Self::Bitcoin => ("BTC", "Bitcoin", 8),
            Self::BitcoinCash => ("BCH", "Bitcoin Cash", 8),
            Self::Litecoin => ("LTC", "Litecoin", 8),
            Self::Dogecoin => ("DOGE", "Dogecoin", 8),
            Self::Cosmos => ("ATOM", "Cosmos", 6),
            Self::Thorchain => ("RUNE", "THORChain", 8),
        }
    }

    /// Asset id of the asset paying network fees on this chain
    pub fn fee_asset_id(&self) -> &'static str {
        match self {
            Self::Ethereum => "eip155:1/slip44:60",
            Self::Avalanche => "eip155:43114/slip44:60",
            Self::BnbSmartChain => "eip155:56/slip44:60",
            Self::Bitcoin => "bip122:000000000019d6689c085ae165831e93/slip44:0",
            Self::BitcoinCash => "bip122:000000000000000000651ef99cb9fcbe/slip44:145",
            Self::Litecoin => "bip122:12a765e31ffd4059bada1e25190f6e98/slip44:2",
            Self::Dogecoin => "bip122:00000000001a91e3dace36e2be3bf030/slip44:3",
            Self::Cosmos => "cosmos:cosmoshub-4/slip44:118",
            Self::Thorchain => "cosmos:thorchain-mainnet-v1/slip44:931",
        }
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_caip2())
    }
}

impl FromStr for ChainId {
    type Err = error_stack::Report<Error>;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChainId::iter()
            .find(|chain| chain.as_caip2() == s)
            .ok_or_else(|| report!(Error::UnsupportedChain(s.to_string())))
    }
}

impl TryFrom<u64> for ChainId {
    type Error = error_stack::Report<Error>;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        ChainId::iter()
            .find(|chain| chain.evm_chain_id() == Some(value))
            .ok_or_else(|| report!(Error::UnsupportedChain(format!("evm chain {value}"))))
    }
}

/// THORChain reports Bitcoin Cash addresses without their cashaddr prefix
pub fn wallet_address_from_thorchain(chain: ChainId, address: &str) -> String {
    match chain {
        ChainId::BitcoinCash if !address.starts_with(BCH_ADDRESS_PREFIX) => {
            format!("{BCH_ADDRESS_PREFIX}{address}")
        }
        _ => address.to_string(),
    }
}

pub fn parse_chain(s: &str) -> ModelResult<ChainId> {
    s.parse()
}
