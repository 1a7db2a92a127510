use std::fmt;
use std::str::FromStr;

use error_stack::{Report, report};
use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};

use crate::constants::chains::ChainId;
use crate::error::{Error, ModelResult};

/// CAIP-19 asset identifier, `<chain>/<namespace>:<reference>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, SerializeDisplay, DeserializeFromStr)]
pub struct AssetId {
    chain_id: ChainId,
    namespace: String,
    reference: String,
}

impl AssetId {
    pub fn new(chain_id: ChainId, namespace: &str, reference: &str) -> Self {
        AssetId {
            chain_id,
            namespace: namespace.to_string(),
            reference: reference.to_lowercase(),
        }
    }

    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// Contract-backed assets (ERC-20 / BEP-20) need spend approval
    pub fn is_token(&self) -> bool {
        matches!(self.namespace.as_str(), "erc20" | "bep20")
    }

    pub fn fee_asset_of(chain_id: ChainId) -> ModelResult<AssetId> {
        chain_id.fee_asset_id().parse()
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}:{}", self.chain_id, self.namespace, self.reference)
    }
}

impl FromStr for AssetId {
    type Err = Report<Error>;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (chain, asset) = s
            .split_once('/')
            .ok_or_else(|| report!(Error::InvalidIdentifier(s.to_string())))?;
        let (namespace, reference) = asset
            .split_once(':')
            .ok_or_else(|| report!(Error::InvalidIdentifier(s.to_string())))?;
        if namespace.is_empty() || reference.is_empty() {
            return Err(report!(Error::InvalidIdentifier(s.to_string())));
        }
        Ok(AssetId::new(chain.parse()?, namespace, reference))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub asset_id: AssetId,
    pub chain_id: ChainId,
    /// Number of decimals of the base unit
    pub precision: u8,
    pub symbol: String,
    pub name: String,
    pub icon: String,
}

impl Asset {
    pub fn is_token(&self) -> bool {
        self.asset_id.is_token()
    }

    /// THORChain pool notation, `ETH.ETH` or `ETH.FOX-0XC770...`
    pub fn thorchain_pool_asset(&self) -> String {
        let chain = self.chain_id.thorchain_chain();
        let symbol = self.symbol.to_uppercase();
        if self.is_token() {
            format!(
                "{chain}.{symbol}-{}",
                self.asset_id.reference().to_uppercase()
            )
        } else {
            format!("{chain}.{symbol}")
        }
    }

    /// The asset paying network fees on `chain_id`
    pub fn fee_asset(chain_id: ChainId) -> ModelResult<Asset> {
        let (symbol, name, precision) = chain_id.fee_asset_info();
        Ok(Asset {
            asset_id: AssetId::fee_asset_of(chain_id)?,
            chain_id,
            precision,
            symbol: symbol.to_string(),
            name: name.to_string(),
            icon: String::new(),
        })
    }

    /// Token contract address, `None` for native assets
    pub fn contract_address(&self) -> Option<&str> {
        self.is_token().then(|| self.asset_id.reference())
    }
}
