use std::fmt;
use std::str::FromStr;

use error_stack::{Report, report};
use serde_with::{DeserializeFromStr, SerializeDisplay};

use crate::constants::chains::ChainId;
use crate::error::Error;

/// CAIP-10 account identifier, `<chain>:<account>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, SerializeDisplay, DeserializeFromStr)]
pub struct AccountId {
    pub chain_id: ChainId,
    /// Address for account-based chains, xpub or address for UTXO chains
    pub account: String,
}

impl AccountId {
    pub fn new(chain_id: ChainId, account: &str) -> Self {
        AccountId {
            chain_id,
            account: account.to_string(),
        }
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.chain_id, self.account)
    }
}

impl FromStr for AccountId {
    type Err = Report<Error>;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (chain, account) = s
            .rsplit_once(':')
            .ok_or_else(|| report!(Error::InvalidIdentifier(s.to_string())))?;
        if account.is_empty() {
            return Err(report!(Error::InvalidIdentifier(s.to_string())));
        }
        Ok(AccountId::new(chain.parse()?, account))
    }
}
