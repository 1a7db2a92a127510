use bigdecimal::BigDecimal;

use crate::swappers::thorchain::responses::ThorchainSwapQuoteResponse;

pub mod requests;
pub mod responses;
#[allow(clippy::module_inception)]
pub mod thorchain;

pub use thorchain::ThorchainSwapper;

/// Multiplier applied to the outbound fee to get the smallest sensible sell amount
pub const MINIMUM_AMOUNT_FEE_MULTIPLIER: &str = "1.2";

/// Swap quote together with the side data its normalization needs
#[derive(Debug, Clone, PartialEq)]
pub struct ThorchainRawQuote {
    pub quote: ThorchainSwapQuoteResponse,
    /// Router of the sell chain, the spender of ERC-20 sells
    pub router: Option<String>,
    pub sell_asset_usd_rate: BigDecimal,
    pub buy_asset_usd_rate: BigDecimal,
}
