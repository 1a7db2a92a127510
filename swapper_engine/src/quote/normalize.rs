use error_stack::ResultExt;
use swapper_models::models::BaseUnits;

use crate::chain::FeeEstimate;
use crate::error::{EngineResult, Error};
use crate::quote::{
    DEFAULT_MAXIMUM_CRYPTO_HUMAN, EvmChainSpecificFees, QuoteFeeData, SwapSource, TradeQuote,
};
use crate::swappers::thorchain::{MINIMUM_AMOUNT_FEE_MULTIPLIER, ThorchainRawQuote};
use crate::swappers::{QuoteRequest, RawQuote, SwapperName};
use crate::utils::bps::{apply_bps, bps_to_fraction};
use crate::utils::units::{
    DIVISION_DECIMAL_PLACES, THOR_PRECISION, bn_div_round, from_thor_base_unit, parse_decimal,
    rate_from_base_units, round_half_up, thor_to_base_unit, to_plain_string, to_thor_base_unit,
};

/// Maps a source answer onto the common quote shape.
///
/// Pure: the same inputs always produce the same quote. `affiliate_bps` is the
/// share of the buy amount kept as affiliate fee, `None` when fees are off for
/// this source.
pub fn normalize_quote(
    request: &QuoteRequest,
    raw: &RawQuote,
    fee_estimate: &FeeEstimate,
    affiliate_bps: Option<u32>,
) -> EngineResult<TradeQuote> {
    let fee_data = base_fee_data(request, fee_estimate);

    match raw {
        RawQuote::Thorchain(raw_quote) => {
            normalize_thorchain(request, raw, raw_quote, fee_data, affiliate_bps)
        }
        RawQuote::ZeroX(response) => normalize_aggregator(
            request,
            raw,
            AggregatorQuote {
                buy_amount: &response.buy_amount,
                spender: response.allowance_target.as_deref(),
            },
            fee_data,
            affiliate_bps,
        ),
        RawQuote::OneInch { swap, spender } => normalize_aggregator(
            request,
            raw,
            AggregatorQuote {
                buy_amount: &swap.dst_amount,
                spender: Some(spender),
            },
            fee_data,
            affiliate_bps,
        ),
    }
}

/// Network fee of the sell transaction, an ERC-20 approval costs the same again
fn base_fee_data(request: &QuoteRequest, fee_estimate: &FeeEstimate) -> QuoteFeeData {
    let approval_fee = request
        .sell_asset
        .is_token()
        .then(|| fee_estimate.network_fee.clone());

    QuoteFeeData {
        network_fee: fee_estimate.network_fee.clone(),
        buy_asset_trade_fee_usd: "0".to_string(),
        sell_asset_trade_fee_usd: "0".to_string(),
        chain_specific: fee_estimate
            .evm
            .as_ref()
            .map(|evm| EvmChainSpecificFees::from_fee_data(evm, approval_fee)),
        affiliate_fee: None,
    }
}

/// Returns the affiliate cut and the amount left to the user
fn deduct_affiliate(
    buy_amount: &BaseUnits,
    affiliate_bps: Option<u32>,
) -> EngineResult<(Option<BaseUnits>, BaseUnits)> {
    match affiliate_bps {
        Some(bps) if bps > 0 => {
            let fee = apply_bps(buy_amount, bps)?;
            let remaining = buy_amount.saturating_sub(&fee);
            Ok((Some(fee), remaining))
        }
        _ => Ok((None, buy_amount.clone())),
    }
}

fn normalize_thorchain(
    request: &QuoteRequest,
    raw: &RawQuote,
    raw_quote: &ThorchainRawQuote,
    mut fee_data: QuoteFeeData,
    affiliate_bps: Option<u32>,
) -> EngineResult<TradeQuote> {
    let quote = &raw_quote.quote;
    let buy_precision = request.buy_asset.precision;

    let sell_amount_thor = to_thor_base_unit(&request.sell_amount, request.sell_asset.precision);
    let rate = rate_from_base_units(
        &quote.expected_amount_out,
        THOR_PRECISION,
        &sell_amount_thor,
        THOR_PRECISION,
    )?;

    // expected_amount_out already has the outbound fee taken out
    let buy_amount_before_fees = thor_to_base_unit(
        &(&quote.expected_amount_out + &quote.fees.outbound),
        buy_precision,
    );
    let (affiliate_fee, buy_amount_after_fees) = deduct_affiliate(
        &thor_to_base_unit(&quote.expected_amount_out, buy_precision),
        affiliate_bps,
    )?;

    let buy_asset_trade_fee_usd = round_half_up(
        &(from_thor_base_unit(&quote.fees.outbound) * &raw_quote.buy_asset_usd_rate),
        DIVISION_DECIMAL_PLACES,
    )?;
    let multiplier = parse_decimal(MINIMUM_AMOUNT_FEE_MULTIPLIER)?;
    let minimum_crypto_human = bn_div_round(
        &(&buy_asset_trade_fee_usd * &multiplier),
        &raw_quote.sell_asset_usd_rate,
        DIVISION_DECIMAL_PLACES,
    )
    .change_context(Error::ResponseError)
    .attach_printable("Sell asset USD rate is zero")?;

    fee_data.buy_asset_trade_fee_usd = to_plain_string(&buy_asset_trade_fee_usd);
    fee_data.affiliate_fee = affiliate_fee;

    Ok(TradeQuote {
        swapper: SwapperName::Thorchain,
        sell_asset: request.sell_asset.clone(),
        buy_asset: request.buy_asset.clone(),
        account_id: request.account_id.clone(),
        account_number: request.account_number,
        receive_address: request.receive_address.clone(),
        sell_amount_before_fees: request.sell_amount.clone(),
        buy_amount_before_fees,
        buy_amount_after_fees,
        rate,
        fee_data,
        minimum_crypto_human: to_plain_string(&minimum_crypto_human),
        maximum_crypto_human: DEFAULT_MAXIMUM_CRYPTO_HUMAN.to_string(),
        recommended_slippage: Some(bps_to_fraction(quote.slippage_bps)),
        allowance_contract: request
            .sell_asset
            .is_token()
            .then(|| raw_quote.router.clone())
            .flatten(),
        sources: vec![SwapSource {
            name: SwapperName::Thorchain,
            proportion: "1".to_string(),
        }],
        execution: raw.execution_data(),
    })
}

struct AggregatorQuote<'a> {
    buy_amount: &'a BaseUnits,
    spender: Option<&'a str>,
}

/// 0x and 1inch quote in buy asset base units and charge no protocol fee
fn normalize_aggregator(
    request: &QuoteRequest,
    raw: &RawQuote,
    quote: AggregatorQuote<'_>,
    mut fee_data: QuoteFeeData,
    affiliate_bps: Option<u32>,
) -> EngineResult<TradeQuote> {
    let rate = rate_from_base_units(
        quote.buy_amount,
        request.buy_asset.precision,
        &request.sell_amount,
        request.sell_asset.precision,
    )?;
    let (affiliate_fee, buy_amount_after_fees) = deduct_affiliate(quote.buy_amount, affiliate_bps)?;
    fee_data.affiliate_fee = affiliate_fee;

    let swapper = raw.swapper();
    Ok(TradeQuote {
        swapper,
        sell_asset: request.sell_asset.clone(),
        buy_asset: request.buy_asset.clone(),
        account_id: request.account_id.clone(),
        account_number: request.account_number,
        receive_address: request.receive_address.clone(),
        sell_amount_before_fees: request.sell_amount.clone(),
        buy_amount_before_fees: quote.buy_amount.clone(),
        buy_amount_after_fees,
        rate,
        fee_data,
        minimum_crypto_human: "0".to_string(),
        maximum_crypto_human: DEFAULT_MAXIMUM_CRYPTO_HUMAN.to_string(),
        recommended_slippage: request.slippage_tolerance,
        allowance_contract: request
            .sell_asset
            .is_token()
            .then(|| quote.spender.map(str::to_string))
            .flatten(),
        sources: vec![SwapSource {
            name: swapper,
            proportion: "1".to_string(),
        }],
        execution: raw.execution_data(),
    })
}
