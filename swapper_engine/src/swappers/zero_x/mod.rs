pub mod requests;
pub mod responses;
#[allow(clippy::module_inception)]
pub mod zero_x;

pub use zero_x::ZeroXSwapper;

// https://0x.org/docs/api#tag/Swap
pub const ZERO_X_QUOTE_PATH: &str = "swap/allowance-holder/quote";
