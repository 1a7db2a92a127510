use std::collections::HashMap;
use std::sync::Arc;

use error_stack::report;
use serde::{Deserialize, Serialize};
use swapper_models::constants::chains::{ChainId, ChainType};
use swapper_models::models::{AccountId, Asset, BaseUnits};

use crate::error::{EngineResult, Error};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractCall {
    pub to: String,
    /// `0x` prefixed calldata
    pub data: String,
    pub value: BaseUnits,
}

/// Everything a chain adapter needs to build one transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionInput {
    pub account_id: AccountId,
    pub account_number: u32,
    pub asset: Asset,
    pub to: String,
    pub amount: BaseUnits,
    /// Pins the spending address on UTXO chains, coin selection is free otherwise
    pub from: Option<String>,
    pub memo: Option<String>,
    pub contract_call: Option<ContractCall>,
}

impl TransactionInput {
    pub fn new(
        account_id: AccountId,
        account_number: u32,
        asset: Asset,
        to: String,
        amount: BaseUnits,
    ) -> Self {
        TransactionInput {
            account_id,
            account_number,
            asset,
            to,
            amount,
            from: None,
            memo: None,
            contract_call: None,
        }
    }

    pub fn with_from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = Some(memo.into());
        self
    }

    pub fn chain_id(&self) -> ChainId {
        self.asset.chain_id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvmFeeData {
    pub gas_limit: BaseUnits,
    pub gas_price: BaseUnits,
    pub max_fee_per_gas: Option<BaseUnits>,
    pub max_priority_fee_per_gas: Option<BaseUnits>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeEstimate {
    /// Total fee in the chain's fee asset
    pub network_fee: BaseUnits,
    pub evm: Option<EvmFeeData>,
}

impl FeeEstimate {
    /// `gas_limit * gas_price`
    pub fn from_evm(fee_data: EvmFeeData) -> Self {
        FeeEstimate {
            network_fee: BaseUnits::new(
                fee_data.gas_limit.as_biguint() * fee_data.gas_price.as_biguint(),
            ),
            evm: Some(fee_data),
        }
    }
}

/// Chain specific transaction to be signed, opaque to the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsignedTx {
    pub chain_id: ChainId,
    pub payload: serde_json::Value,
}

#[async_trait::async_trait]
pub trait ChainAdapter: Send + Sync {
    fn chain_id(&self) -> ChainId;

    async fn estimate_fee(&self, input: &TransactionInput) -> EngineResult<FeeEstimate>;

    /// Fails with `Error::TransactionBuildFailure` when coin selection cannot fund the input
    async fn build_transaction(&self, input: TransactionInput) -> EngineResult<UnsignedTx>;

    /// ERC-20 allowance granted by `owner` to `spender`
    async fn allowance(&self, token: &str, owner: &str, spender: &str) -> EngineResult<BaseUnits>;

    async fn address_balance(&self, address: &str, asset: &Asset) -> EngineResult<BaseUnits>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WalletFeature {
    Evm,
    Utxo,
    Cosmos,
}

impl From<ChainType> for WalletFeature {
    fn from(chain_type: ChainType) -> Self {
        match chain_type {
            ChainType::Evm => WalletFeature::Evm,
            ChainType::Utxo => WalletFeature::Utxo,
            ChainType::Cosmos => WalletFeature::Cosmos,
        }
    }
}

#[async_trait::async_trait]
pub trait Wallet: Send + Sync {
    fn supports(&self, feature: WalletFeature) -> bool;

    /// Receive address of the account, the canonical one on UTXO chains
    async fn address(&self, account_id: &AccountId, account_number: u32) -> EngineResult<String>;

    async fn sign_and_broadcast(&self, tx: UnsignedTx) -> EngineResult<String>;
}

/// Chain adapters by chain
#[derive(Clone, Default)]
pub struct ChainAdapters {
    adapters: HashMap<ChainId, Arc<dyn ChainAdapter>>,
}

impl ChainAdapters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_adapter(mut self, adapter: Arc<dyn ChainAdapter>) -> Self {
        self.adapters.insert(adapter.chain_id(), adapter);
        self
    }

    pub fn get(&self, chain_id: ChainId) -> EngineResult<Arc<dyn ChainAdapter>> {
        self.adapters
            .get(&chain_id)
            .cloned()
            .ok_or_else(|| report!(Error::Unsupported(format!("No chain adapter for {chain_id}"))))
    }
}
