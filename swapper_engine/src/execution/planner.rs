use std::sync::Arc;

use error_stack::{ResultExt, report};
use serde::{Deserialize, Serialize};
use swapper_models::models::BaseUnits;
use tracing::{info, warn};

use crate::chain::{ContractCall, TransactionInput};
use crate::error::{EngineResult, Error, ReportDisplayExt};
use crate::execution::broadcast::Broadcaster;
use crate::execution::state::ExecutionState;
use crate::quote::TradeQuote;
use crate::utils::evm::encode_approve;
use crate::utils::{Clock, is_expired};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannerOptions {
    /// Send the ERC-20 approval when the allowance is short, instead of
    /// stopping with `Error::ApprovalRequired`
    pub auto_approve: bool,
}

impl Default for PlannerOptions {
    fn default() -> Self {
        PlannerOptions { auto_approve: true }
    }
}

/// Outcome reported by whoever watches the submitted transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxStatus {
    Confirmed,
    Failed,
}

/// Drives one trade from a selected quote to a confirmed transaction
pub struct ExecutionPlanner {
    broadcaster: Broadcaster,
    clock: Arc<dyn Clock>,
    options: PlannerOptions,
    state: ExecutionState,
    quote: Option<TradeQuote>,
    approval_tx_id: Option<String>,
    tx_id: Option<String>,
}

impl ExecutionPlanner {
    pub fn new(broadcaster: Broadcaster, clock: Arc<dyn Clock>, options: PlannerOptions) -> Self {
        ExecutionPlanner {
            broadcaster,
            clock,
            options,
            state: ExecutionState::Idle,
            quote: None,
            approval_tx_id: None,
            tx_id: None,
        }
    }

    pub fn state(&self) -> ExecutionState {
        self.state
    }

    pub fn quote(&self) -> Option<&TradeQuote> {
        self.quote.as_ref()
    }

    pub fn approval_tx_id(&self) -> Option<&str> {
        self.approval_tx_id.as_deref()
    }

    pub fn tx_id(&self) -> Option<&str> {
        self.tx_id.as_deref()
    }

    fn transition(&mut self, next: ExecutionState) -> EngineResult<()> {
        self.state = self.state.transition(next)?;
        info!(state = %self.state, "Execution state changed");
        Ok(())
    }

    /// Back to quote selection, the current quote is dropped
    pub fn reset(&mut self) -> EngineResult<()> {
        if self.state != ExecutionState::Idle {
            self.transition(ExecutionState::Idle)?;
        }
        self.quote = None;
        self.approval_tx_id = None;
        self.tx_id = None;
        Ok(())
    }

    fn ensure_not_expired(&mut self, quote: &TradeQuote) -> EngineResult<()> {
        let Some(expiry) = quote.expiry() else {
            return Ok(());
        };
        let now = self.clock.now();
        if is_expired(expiry, now) {
            warn!(expiry, now, swapper = %quote.swapper, "Quote expired");
            self.reset()?;
            return Err(report!(Error::QuoteExpired)
                .attach_printable(format!("expiry {expiry}, now {now}")));
        }
        Ok(())
    }

    fn fail(&mut self, report: error_stack::Report<Error>) -> error_stack::Report<Error> {
        if self.state.can_transition_to(ExecutionState::Failed) {
            self.state = ExecutionState::Failed;
            warn!(error = %report.format(), "Execution failed");
        }
        report
    }

    pub fn select_quote(&mut self, quote: TradeQuote) -> EngineResult<()> {
        self.transition(ExecutionState::QuoteSelected)?;
        info!(
            swapper = %quote.swapper,
            buy_amount_after_fees = %quote.buy_amount_after_fees,
            "Quote selected"
        );
        self.quote = Some(quote);
        self.approval_tx_id = None;
        self.tx_id = None;
        Ok(())
    }

    /// Spender to approve when selling an ERC-20 through a contract
    fn approval_spender(quote: &TradeQuote) -> Option<(&str, &str)> {
        if !quote.sell_asset.chain_id.is_evm() {
            return None;
        }
        let token = quote.sell_asset.contract_address()?;
        let spender = quote.allowance_contract.as_deref()?;
        Some((token, spender))
    }

    /// Runs approval and submission, returning the trade transaction id
    pub async fn execute(&mut self) -> EngineResult<String> {
        let quote = self.quote.clone().ok_or_else(|| {
            report!(Error::InvalidTransition {
                from: self.state.to_string(),
                to: ExecutionState::ApprovalCheck.to_string(),
            })
            .attach_printable("No quote selected")
        })?;

        self.ensure_not_expired(&quote)?;
        self.transition(ExecutionState::ApprovalCheck)?;

        if let Some((token, spender)) = Self::approval_spender(&quote) {
            let allowance = self
                .allowance(&quote, token, spender)
                .await
                .map_err(|report| self.fail(report))?;
            if allowance < quote.sell_amount_before_fees {
                if !self.options.auto_approve {
                    self.transition(ExecutionState::QuoteSelected)?;
                    return Err(report!(Error::ApprovalRequired {
                        spender: spender.to_string(),
                    })
                    .attach_printable(format!(
                        "allowance {allowance} below sell amount {}",
                        quote.sell_amount_before_fees
                    )));
                }

                self.transition(ExecutionState::ApprovalPending)?;
                let approval_tx_id = self
                    .send_approval(&quote, token, spender)
                    .await
                    .map_err(|report| self.fail(report))?;
                info!(%approval_tx_id, spender, "Approval sent");
                self.approval_tx_id = Some(approval_tx_id);
            }
        }

        self.transition(ExecutionState::BuildingTx)?;
        self.ensure_not_expired(&quote)?;

        let input = quote
            .transaction_input()
            .map_err(|report| self.fail(report))?;
        let tx_id = self
            .broadcaster
            .broadcast(input)
            .await
            .map_err(|report| self.fail(report))?;

        self.transition(ExecutionState::Submitted)?;
        info!(%tx_id, swapper = %quote.swapper, "Trade submitted");
        self.tx_id = Some(tx_id.clone());
        Ok(tx_id)
    }

    async fn allowance(&self, quote: &TradeQuote, token: &str, spender: &str) -> EngineResult<BaseUnits> {
        let owner = self
            .broadcaster
            .wallet()
            .address(&quote.account_id, quote.account_number)
            .await?;
        self.broadcaster
            .adapter(quote.sell_asset.chain_id)?
            .allowance(token, &owner, spender)
            .await
            .attach_printable_lazy(|| format!("Allowance of {spender} on {token}"))
    }

    /// Approves exactly the sell amount
    async fn send_approval(&self, quote: &TradeQuote, token: &str, spender: &str) -> EngineResult<String> {
        let data = encode_approve(spender, &quote.sell_amount_before_fees)?;
        let mut input = TransactionInput::new(
            quote.account_id.clone(),
            quote.account_number,
            quote.sell_asset.clone(),
            token.to_string(),
            BaseUnits::zero(),
        );
        input.contract_call = Some(ContractCall {
            to: token.to_string(),
            data,
            value: BaseUnits::zero(),
        });
        self.broadcaster.broadcast(input).await
    }

    /// Called by the confirmation poller once the submitted transaction settles
    pub fn on_confirmation(&mut self, status: TxStatus) -> EngineResult<ExecutionState> {
        let next = match status {
            TxStatus::Confirmed => ExecutionState::Confirmed,
            TxStatus::Failed => ExecutionState::Failed,
        };
        self.transition(next)?;
        Ok(self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::ChainAdapters;
    use crate::quote::normalize::normalize_quote;
    use crate::swappers::RawQuote;
    use crate::swappers::thorchain::ThorchainRawQuote;
    use crate::swappers::thorchain::responses::ThorchainSwapQuoteResponse;
    use crate::tests::thorchain_fixtures::{ETH_ROUTER, swap_quote_json};
    use crate::tests::{
        FixedClock, MockChainAdapter, MockWallet, eth, fox, init_tracing_in_tests, quote_request,
    };
    use crate::utils::evm::APPROVE_SELECTOR;
    use crate::utils::units::parse_decimal;
    use swapper_models::constants::chains::ChainId;

    const EXPIRY: u64 = 1681132269;

    fn fixture_quote() -> TradeQuote {
        let quote: ThorchainSwapQuoteResponse = serde_json::from_value(swap_quote_json()).unwrap();
        let raw = RawQuote::Thorchain(ThorchainRawQuote {
            quote,
            router: Some(ETH_ROUTER.to_string()),
            sell_asset_usd_rate: parse_decimal("0.15399605260336216").unwrap(),
            buy_asset_usd_rate: parse_decimal("1595").unwrap(),
        });
        normalize_quote(
            &quote_request(fox(), eth(), 713014679420u64),
            &raw,
            &MockChainAdapter::fixture_fee_estimate(),
            None,
        )
        .unwrap()
    }

    fn planner(
        adapter: MockChainAdapter,
        wallet: Arc<MockWallet>,
        now: u64,
        options: PlannerOptions,
    ) -> ExecutionPlanner {
        let broadcaster = Broadcaster::new(
            ChainAdapters::new().with_adapter(Arc::new(adapter)),
            wallet,
        );
        ExecutionPlanner::new(broadcaster, Arc::new(FixedClock(now)), options)
    }

    #[tokio::test]
    async fn test_approves_then_submits() {
        init_tracing_in_tests();
        let wallet = Arc::new(MockWallet::new());
        let mut planner = planner(
            MockChainAdapter::new(ChainId::Ethereum),
            wallet.clone(),
            EXPIRY - 1,
            PlannerOptions::default(),
        );

        planner.select_quote(fixture_quote()).unwrap();
        let tx_id = planner.execute().await.unwrap();

        assert_eq!(tx_id, "tx-2");
        assert_eq!(planner.approval_tx_id(), Some("tx-1"));
        assert_eq!(planner.state(), ExecutionState::Submitted);

        let built = wallet.broadcast_inputs();
        assert_eq!(built.len(), 2);
        let approval = built[0].contract_call.as_ref().unwrap();
        assert!(approval.data.starts_with(APPROVE_SELECTOR));
        assert_eq!(approval.to, "0xc770eefad204b5180df6a14ee197d99d808ee52d");
        let deposit = built[1].contract_call.as_ref().unwrap();
        assert_eq!(deposit.to, ETH_ROUTER);
        assert!(deposit.data.starts_with("0x44bc937b"));

        assert_eq!(
            planner.on_confirmation(TxStatus::Confirmed).unwrap(),
            ExecutionState::Confirmed
        );
    }

    #[tokio::test]
    async fn test_sufficient_allowance_skips_approval() {
        let wallet = Arc::new(MockWallet::new());
        let adapter = MockChainAdapter::new(ChainId::Ethereum)
            .with_allowance(BaseUnits::from(713014679420u64));
        let mut planner = planner(adapter, wallet.clone(), EXPIRY - 1, PlannerOptions::default());

        planner.select_quote(fixture_quote()).unwrap();
        assert_eq!(planner.execute().await.unwrap(), "tx-1");
        assert_eq!(planner.approval_tx_id(), None);
        assert_eq!(wallet.broadcasts().len(), 1);
    }

    #[tokio::test]
    async fn test_approval_required_without_auto_approve() {
        let wallet = Arc::new(MockWallet::new());
        let mut planner = planner(
            MockChainAdapter::new(ChainId::Ethereum),
            wallet.clone(),
            EXPIRY - 1,
            PlannerOptions {
                auto_approve: false,
            },
        );

        planner.select_quote(fixture_quote()).unwrap();
        let err = planner.execute().await.unwrap_err();
        assert_eq!(
            err.current_context(),
            &Error::ApprovalRequired {
                spender: ETH_ROUTER.to_string()
            }
        );
        assert_eq!(planner.state(), ExecutionState::QuoteSelected);
        assert!(wallet.broadcasts().is_empty());
    }

    #[tokio::test]
    async fn test_expiry_boundary() {
        for (now, expired) in [(EXPIRY - 1, false), (EXPIRY, true), (EXPIRY + 1, true)] {
            let wallet = Arc::new(MockWallet::new());
            let mut planner = planner(
                MockChainAdapter::new(ChainId::Ethereum),
                wallet.clone(),
                now,
                PlannerOptions::default(),
            );
            planner.select_quote(fixture_quote()).unwrap();

            let result = planner.execute().await;
            if expired {
                assert_eq!(result.unwrap_err().current_context(), &Error::QuoteExpired);
                assert_eq!(planner.state(), ExecutionState::Idle);
                assert!(planner.quote().is_none());
                assert!(wallet.broadcasts().is_empty());
            } else {
                assert!(result.is_ok());
            }
        }
    }

    #[tokio::test]
    async fn test_broadcast_failure_fails_execution() {
        let wallet = Arc::new(MockWallet::new().fail_with(Error::TransportFailure("rpc down".to_string())));
        let adapter = MockChainAdapter::new(ChainId::Ethereum)
            .with_allowance(BaseUnits::from(713014679420u64));
        let mut planner = planner(adapter, wallet, EXPIRY - 1, PlannerOptions::default());

        planner.select_quote(fixture_quote()).unwrap();
        let err = planner.execute().await.unwrap_err();
        assert!(matches!(err.current_context(), Error::BroadcastFailure(_)));
        assert_eq!(planner.state(), ExecutionState::Failed);
        assert!(planner.on_confirmation(TxStatus::Confirmed).is_err());
    }

    #[tokio::test]
    async fn test_allowance_lookup_failure_fails_execution() {
        let broadcaster = Broadcaster::new(ChainAdapters::new(), Arc::new(MockWallet::new()));
        let mut planner = ExecutionPlanner::new(
            broadcaster,
            Arc::new(FixedClock(EXPIRY - 1)),
            PlannerOptions::default(),
        );

        planner.select_quote(fixture_quote()).unwrap();
        let err = planner.execute().await.unwrap_err();
        assert!(matches!(err.current_context(), Error::Unsupported(_)));
        assert_eq!(planner.state(), ExecutionState::Failed);

        // a failed execution is not resumed, the flow starts over with a quote
        let err = planner.execute().await.unwrap_err();
        assert!(matches!(err.current_context(), Error::InvalidTransition { .. }));
        planner.reset().unwrap();
        planner.select_quote(fixture_quote()).unwrap();
        assert_eq!(planner.state(), ExecutionState::QuoteSelected);
    }

    #[tokio::test]
    async fn test_execute_without_quote_is_invalid() {
        let mut planner = planner(
            MockChainAdapter::new(ChainId::Ethereum),
            Arc::new(MockWallet::new()),
            EXPIRY - 1,
            PlannerOptions::default(),
        );
        let err = planner.execute().await.unwrap_err();
        assert!(matches!(
            err.current_context(),
            Error::InvalidTransition { .. }
        ));
    }
}
