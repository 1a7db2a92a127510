use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use bigdecimal::BigDecimal;
use error_stack::{ResultExt, report};
use serde_json::{Value, json};
use swapper_models::constants::chains::ChainId;
use swapper_models::models::{AccountId, Asset, AssetId, BaseUnits};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::chain::{
    ChainAdapter, EvmFeeData, FeeEstimate, TransactionInput, UnsignedTx, Wallet, WalletFeature,
};
use crate::error::{EngineResult, Error};
use crate::prices::PriceProvider;
use crate::quote::TradeQuote;
use crate::quote::normalize::normalize_quote;
use crate::swappers::thorchain::ThorchainRawQuote;
use crate::swappers::{QuoteRequest, RawQuote, Swapper, SwapperName};
use crate::utils::Clock;
use crate::utils::units::parse_decimal;


pub const TEST_ADDRESS: &str = "0x32DBc9Cf9E8FbCebE1e0a2ecF05Ed86Ca3096Cb6";
pub const ONE_INCH_SPENDER: &str = "0x111111125421ca6dc452d289314280a0f8842a65";

pub fn init_tracing_in_tests() {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer().json().pretty().with_ansi(true))
        .try_init()
        .ok();
}

fn asset(asset_id: &str, precision: u8, symbol: &str, name: &str) -> Asset {
    let asset_id: AssetId = asset_id.parse().unwrap();
    Asset {
        chain_id: asset_id.chain_id(),
        asset_id,
        precision,
        symbol: symbol.to_string(),
        name: name.to_string(),
        icon: String::new(),
    }
}

pub fn fox() -> Asset {
    asset(
        "eip155:1/erc20:0xc770eefad204b5180df6a14ee197d99d808ee52d",
        18,
        "FOX",
        "Fox",
    )
}

pub fn eth() -> Asset {
    asset("eip155:1/slip44:60", 18, "ETH", "Ethereum")
}

pub fn btc() -> Asset {
    asset(
        "bip122:000000000019d6689c085ae165831e93/slip44:0",
        8,
        "BTC",
        "Bitcoin",
    )
}

pub fn usdc_avalanche() -> Asset {
    asset(
        "eip155:43114/erc20:0xb97ef9ef8734c71904d8002f8b6bc66dd9c48a6e",
        6,
        "USDC",
        "USD Coin",
    )
}

pub fn test_account() -> AccountId {
    AccountId::new(ChainId::Ethereum, TEST_ADDRESS)
}

pub fn quote_request(sell_asset: Asset, buy_asset: Asset, sell_amount: u64) -> QuoteRequest {
    QuoteRequest {
        sell_asset,
        buy_asset,
        sell_amount: BaseUnits::from(sell_amount),
        account_id: test_account(),
        account_number: 0,
        receive_address: TEST_ADDRESS.to_string(),
        slippage_tolerance: None,
    }
}

pub fn zero_x_quote_json() -> Value {
    json!({
        "blockNumber": "17038723",
        "buyAmount": "100032748",
        "buyToken": "0xeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee",
        "minBuyAmount": "99032420",
        "sellAmount": "713014679420",
        "sellToken": "0xc770eefad204b5180df6a14ee197d99d808ee52d",
        "allowanceTarget": "0x0000000000001ff3684f28c67538d4d072c22734",
        "liquidityAvailable": true,
        "transaction": {
            "to": "0x0000000000001ff3684f28c67538d4d072c22734",
            "data": "0x2213bc0b000000000000000000000000",
            "gas": "288079",
            "gasPrice": "4",
            "value": "0"
        },
        "route": {
            "fills": [
                {"source": "Uniswap_V3", "proportionBps": "10000"}
            ]
        },
        "zid": "0x5c3ce4a1b4a1b1d0e8c3d2f1"
    })
}

pub fn one_inch_swap_json() -> Value {
    json!({
        "dstAmount": "100500000",
        "tx": {
            "from": TEST_ADDRESS,
            "to": ONE_INCH_SPENDER,
            "data": "0x07ed2379000000000000000000000000",
            "value": "0",
            "gasPrice": "4"
        }
    })
}

/// USD rates by asset id
pub struct FixedPriceProvider {
    rates: HashMap<AssetId, BigDecimal>,
}

impl FixedPriceProvider {
    pub fn new(rates: &[(Asset, &str)]) -> Self {
        FixedPriceProvider {
            rates: rates
                .iter()
                .map(|(asset, rate)| (asset.asset_id.clone(), parse_decimal(rate).unwrap()))
                .collect(),
        }
    }

    pub fn fixture() -> Self {
        Self::new(&[
            (fox(), "0.15399605260336216"),
            (eth(), "1595"),
            (btc(), "28000"),
            (usdc_avalanche(), "1"),
        ])
    }
}

#[async_trait::async_trait]
impl PriceProvider for FixedPriceProvider {
    async fn get_usd_rate(&self, asset: &Asset) -> EngineResult<BigDecimal> {
        self.rates
            .get(&asset.asset_id)
            .cloned()
            .ok_or_else(|| report!(Error::ResponseError).attach_printable(asset.asset_id.to_string()))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub u64);

impl Clock for FixedClock {
    fn now(&self) -> u64 {
        self.0
    }
}

/// Answers the queued times in order, then keeps repeating the last one
pub struct SteppingClock(Mutex<VecDeque<u64>>);

impl SteppingClock {
    pub fn new(times: impl IntoIterator<Item = u64>) -> Self {
        SteppingClock(Mutex::new(times.into_iter().collect()))
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> u64 {
        let mut times = self.0.lock().unwrap();
        if times.len() > 1 {
            times.pop_front().unwrap()
        } else {
            times.front().copied().unwrap_or_default()
        }
    }
}

/// Chain adapter answering from fixed values.
///
/// Built transactions carry their input as payload. Queued build outcomes are
/// consumed in order, an empty queue builds successfully.
pub struct MockChainAdapter {
    chain_id: ChainId,
    fee: FeeEstimate,
    allowance: BaseUnits,
    balance: BaseUnits,
    builds: Mutex<VecDeque<Option<Error>>>,
}

impl MockChainAdapter {
    pub fn new(chain_id: ChainId) -> Self {
        let fee = if chain_id.is_evm() {
            Self::fixture_fee_estimate()
        } else {
            FeeEstimate {
                network_fee: BaseUnits::from(1_000u64),
                evm: None,
            }
        };
        MockChainAdapter {
            chain_id,
            fee,
            allowance: BaseUnits::zero(),
            balance: BaseUnits::zero(),
            builds: Mutex::new(VecDeque::new()),
        }
    }

    /// 100000 gas at 4 wei
    pub fn fixture_fee_estimate() -> FeeEstimate {
        FeeEstimate::from_evm(EvmFeeData {
            gas_limit: BaseUnits::from(100000u64),
            gas_price: BaseUnits::from(4u64),
            max_fee_per_gas: Some(BaseUnits::from(5u64)),
            max_priority_fee_per_gas: Some(BaseUnits::from(6u64)),
        })
    }

    pub fn with_fee(mut self, network_fee: BaseUnits) -> Self {
        self.fee = FeeEstimate {
            network_fee,
            evm: None,
        };
        self
    }

    pub fn with_allowance(mut self, allowance: BaseUnits) -> Self {
        self.allowance = allowance;
        self
    }

    pub fn with_balance(mut self, balance: BaseUnits) -> Self {
        self.balance = balance;
        self
    }

    pub fn fail_next_build(self, error: Error) -> Self {
        self.builds.lock().unwrap().push_back(Some(error));
        self
    }

    pub fn build_ok_next(self) -> Self {
        self.builds.lock().unwrap().push_back(None);
        self
    }
}

#[async_trait::async_trait]
impl ChainAdapter for MockChainAdapter {
    fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    async fn estimate_fee(&self, _input: &TransactionInput) -> EngineResult<FeeEstimate> {
        Ok(self.fee.clone())
    }

    async fn build_transaction(&self, input: TransactionInput) -> EngineResult<UnsignedTx> {
        if let Some(Some(error)) = self.builds.lock().unwrap().pop_front() {
            return Err(report!(error));
        }
        Ok(UnsignedTx {
            chain_id: self.chain_id,
            payload: serde_json::to_value(&input).change_context(Error::ParseError)?,
        })
    }

    async fn allowance(&self, _token: &str, _owner: &str, _spender: &str) -> EngineResult<BaseUnits> {
        Ok(self.allowance.clone())
    }

    async fn address_balance(&self, _address: &str, _asset: &Asset) -> EngineResult<BaseUnits> {
        Ok(self.balance.clone())
    }
}

/// Wallet recording what it was asked to broadcast, tx ids are `tx-1`, `tx-2`...
pub struct MockWallet {
    address: String,
    features: HashSet<WalletFeature>,
    failure: Option<Error>,
    sent: Mutex<Vec<UnsignedTx>>,
}

impl MockWallet {
    pub fn new() -> Self {
        MockWallet {
            address: TEST_ADDRESS.to_string(),
            features: [WalletFeature::Evm, WalletFeature::Utxo, WalletFeature::Cosmos]
                .into_iter()
                .collect(),
            failure: None,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn with_address(mut self, address: &str) -> Self {
        self.address = address.to_string();
        self
    }

    pub fn without_feature(mut self, feature: WalletFeature) -> Self {
        self.features.remove(&feature);
        self
    }

    pub fn fail_with(mut self, error: Error) -> Self {
        self.failure = Some(error);
        self
    }

    pub fn broadcasts(&self) -> Vec<UnsignedTx> {
        self.sent.lock().unwrap().clone()
    }

    /// Inputs of the broadcast transactions, as built by [`MockChainAdapter`]
    pub fn broadcast_inputs(&self) -> Vec<TransactionInput> {
        self.broadcasts()
            .into_iter()
            .map(|tx| serde_json::from_value(tx.payload).unwrap())
            .collect()
    }
}

#[async_trait::async_trait]
impl Wallet for MockWallet {
    fn supports(&self, feature: WalletFeature) -> bool {
        self.features.contains(&feature)
    }

    async fn address(&self, _account_id: &AccountId, _account_number: u32) -> EngineResult<String> {
        Ok(self.address.clone())
    }

    async fn sign_and_broadcast(&self, tx: UnsignedTx) -> EngineResult<String> {
        if let Some(error) = &self.failure {
            return Err(report!(error.clone()));
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push(tx);
        Ok(format!("tx-{}", sent.len()))
    }
}

enum MockOutcome {
    Quote(u64),
    Failure(Error),
}

/// Source answering with a fixed buy amount, or failing.
///
/// A zero sell amount is always declined with `Error::NoRouteAvailable`.
pub struct MockSwapper {
    name: SwapperName,
    outcome: MockOutcome,
    delay: Option<Duration>,
}

impl MockSwapper {
    /// Buy amount after fees in buy asset base units, before any affiliate fee
    pub fn quoting(name: SwapperName, buy_amount: u64) -> Self {
        MockSwapper {
            name,
            outcome: MockOutcome::Quote(buy_amount),
            delay: None,
        }
    }

    pub fn failing(name: SwapperName, error: Error) -> Self {
        MockSwapper {
            name,
            outcome: MockOutcome::Failure(error),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn raw_quote(&self, buy_amount: u64) -> RawQuote {
        match self.name {
            SwapperName::Thorchain => {
                let mut quote = thorchain_fixtures::swap_quote_json();
                quote["expected_amount_out"] = json!(buy_amount.to_string());
                quote["fees"]["outbound"] = json!("0");
                RawQuote::Thorchain(ThorchainRawQuote {
                    quote: serde_json::from_value(quote).unwrap(),
                    router: Some(thorchain_fixtures::ETH_ROUTER.to_string()),
                    sell_asset_usd_rate: parse_decimal("0.15399605260336216").unwrap(),
                    buy_asset_usd_rate: parse_decimal("1595").unwrap(),
                })
            }
            SwapperName::ZeroX => {
                let mut response = zero_x_quote_json();
                response["buyAmount"] = json!(buy_amount.to_string());
                RawQuote::ZeroX(serde_json::from_value(response).unwrap())
            }
            SwapperName::OneInch => {
                let mut swap = one_inch_swap_json();
                swap["dstAmount"] = json!(buy_amount.to_string());
                RawQuote::OneInch {
                    swap: serde_json::from_value(swap).unwrap(),
                    spender: ONE_INCH_SPENDER.to_string(),
                }
            }
        }
    }

    /// The normalized quote the aggregator would produce from this source
    pub fn trade_quote(&self, request: &QuoteRequest) -> TradeQuote {
        let MockOutcome::Quote(buy_amount) = &self.outcome else {
            panic!("{} is set up to fail", self.name);
        };
        normalize_quote(
            request,
            &self.raw_quote(*buy_amount),
            &MockChainAdapter::fixture_fee_estimate(),
            None,
        )
        .unwrap()
    }
}

#[async_trait::async_trait]
impl Swapper for MockSwapper {
    fn name(&self) -> SwapperName {
        self.name
    }

    fn supports(&self, _sell_asset: &Asset, _buy_asset: &Asset) -> bool {
        true
    }

    async fn fetch_quote(&self, request: &QuoteRequest) -> EngineResult<RawQuote> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if request.sell_amount.is_zero() {
            return Err(report!(Error::NoRouteAvailable(
                "Sell amount is zero".to_string()
            )));
        }
        match &self.outcome {
            MockOutcome::Quote(buy_amount) => Ok(self.raw_quote(*buy_amount)),
            MockOutcome::Failure(error) => Err(report!(error.clone())),
        }
    }
}
