pub mod broadcast;
pub mod planner;
pub mod savers_withdraw;
pub mod state;

pub use broadcast::Broadcaster;
pub use planner::{ExecutionPlanner, PlannerOptions, TxStatus};
pub use savers_withdraw::{SaversWithdraw, SaversWithdrawRequest, WithdrawReceipt};
pub use state::ExecutionState;
