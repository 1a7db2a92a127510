use std::sync::Arc;

use error_stack::{Report, report};
use swapper_models::constants::chains::ChainId;
use tracing::{debug, error};

use crate::chain::{ChainAdapter, ChainAdapters, TransactionInput, Wallet, WalletFeature};
use crate::error::{EngineResult, Error, ReportDisplayExt};

/// Builds transactions with the chain adapter and hands them to the wallet
#[derive(Clone)]
pub struct Broadcaster {
    adapters: ChainAdapters,
    wallet: Arc<dyn Wallet>,
}

impl Broadcaster {
    pub fn new(adapters: ChainAdapters, wallet: Arc<dyn Wallet>) -> Self {
        Broadcaster { adapters, wallet }
    }

    pub fn wallet(&self) -> &Arc<dyn Wallet> {
        &self.wallet
    }

    pub fn adapter(&self, chain_id: ChainId) -> EngineResult<Arc<dyn ChainAdapter>> {
        self.adapters.get(chain_id)
    }

    /// The wallet can sign for `chain_id`
    pub fn ensure_supported(&self, chain_id: ChainId) -> EngineResult<()> {
        let feature = WalletFeature::from(chain_id.to_chain_type());
        if self.wallet.supports(feature) {
            Ok(())
        } else {
            Err(report!(Error::Unsupported(format!(
                "Wallet cannot sign {feature:?} transactions for {chain_id}"
            ))))
        }
    }

    /// Builds, signs and sends `input`, returning the transaction id
    pub async fn broadcast(&self, input: TransactionInput) -> EngineResult<String> {
        let chain_id = input.chain_id();
        self.ensure_supported(chain_id)?;
        let adapter = self.adapter(chain_id)?;

        debug!(
            %chain_id,
            to = %input.to,
            amount = %input.amount,
            memo = ?input.memo,
            "Building transaction"
        );

        let unsigned = adapter
            .build_transaction(input)
            .await
            .map_err(as_build_failure)?;

        let tx_id = self.wallet.sign_and_broadcast(unsigned).await.map_err(|report| {
            error!(%chain_id, error = %report.format(), "Broadcast failed");
            match report.current_context() {
                Error::BroadcastFailure(_) => report,
                other => {
                    let reason = other.to_string();
                    report.change_context(Error::BroadcastFailure(reason))
                }
            }
        })?;

        debug!(%chain_id, %tx_id, "Transaction broadcast");
        Ok(tx_id)
    }
}

/// Build errors keep their meaning when it is already a build error
fn as_build_failure(report: Report<Error>) -> Report<Error> {
    match report.current_context() {
        Error::TransactionBuildFailure(_) | Error::InsufficientFunds(_) => report,
        other => {
            let reason = other.to_string();
            report.change_context(Error::TransactionBuildFailure(reason))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{MockChainAdapter, MockWallet, eth, test_account};
    use swapper_models::models::BaseUnits;

    fn input() -> TransactionInput {
        TransactionInput::new(
            test_account(),
            0,
            eth(),
            "0x3624525075b88B24ecc29CE226b0CEc1fFcB6976".to_string(),
            BaseUnits::from(1_000u64),
        )
    }

    #[tokio::test]
    async fn test_broadcast_returns_wallet_tx_id() {
        let wallet = Arc::new(MockWallet::new());
        let broadcaster = Broadcaster::new(
            ChainAdapters::new().with_adapter(Arc::new(MockChainAdapter::new(ChainId::Ethereum))),
            wallet.clone(),
        );

        let tx_id = broadcaster.broadcast(input()).await.unwrap();
        assert_eq!(tx_id, "tx-1");
        let sent = wallet.broadcasts();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].chain_id, ChainId::Ethereum);
    }

    #[tokio::test]
    async fn test_build_error_is_build_failure() {
        let adapter = MockChainAdapter::new(ChainId::Ethereum)
            .fail_next_build(Error::Unsupported("no nonce".to_string()));
        let wallet = Arc::new(MockWallet::new());
        let broadcaster = Broadcaster::new(
            ChainAdapters::new().with_adapter(Arc::new(adapter)),
            wallet.clone(),
        );

        let err = broadcaster.broadcast(input()).await.unwrap_err();
        assert!(matches!(
            err.current_context(),
            Error::TransactionBuildFailure(_)
        ));
        assert!(wallet.broadcasts().is_empty());
    }

    #[tokio::test]
    async fn test_wallet_error_is_broadcast_failure() {
        let wallet = Arc::new(MockWallet::new().fail_with(Error::TransportFailure("rpc down".to_string())));
        let broadcaster = Broadcaster::new(
            ChainAdapters::new().with_adapter(Arc::new(MockChainAdapter::new(ChainId::Ethereum))),
            wallet,
        );

        let err = broadcaster.broadcast(input()).await.unwrap_err();
        assert!(matches!(err.current_context(), Error::BroadcastFailure(_)));
    }

    #[tokio::test]
    async fn test_unsupported_wallet_is_probed_first() {
        let wallet = Arc::new(MockWallet::new().without_feature(WalletFeature::Evm));
        let broadcaster = Broadcaster::new(
            ChainAdapters::new().with_adapter(Arc::new(MockChainAdapter::new(ChainId::Ethereum))),
            wallet.clone(),
        );

        let err = broadcaster.broadcast(input()).await.unwrap_err();
        assert!(matches!(err.current_context(), Error::Unsupported(_)));
        assert!(wallet.broadcasts().is_empty());
    }
}
