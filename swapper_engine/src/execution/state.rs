use error_stack::report;
use serde::{Deserialize, Serialize};
use strum_macros::Display;

use crate::error::{EngineResult, Error};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum ExecutionState {
    Idle,
    QuoteSelected,
    ApprovalCheck,
    ApprovalPending,
    BuildingTx,
    Submitted,
    Confirmed,
    Failed,
}

impl ExecutionState {
    pub fn can_transition_to(self, next: ExecutionState) -> bool {
        use ExecutionState::*;

        matches!(
            (self, next),
            (Idle, QuoteSelected)
                | (QuoteSelected, QuoteSelected)
                | (QuoteSelected, ApprovalCheck)
                | (ApprovalCheck, ApprovalPending)
                | (ApprovalCheck, BuildingTx)
                // approval needed but not allowed, back to the quote
                | (ApprovalCheck, QuoteSelected)
                | (ApprovalPending, BuildingTx)
                | (BuildingTx, Submitted)
                | (Submitted, Confirmed)
                | (ApprovalCheck | ApprovalPending | BuildingTx | Submitted, Failed)
                // expired quote or new trade
                | (QuoteSelected | ApprovalCheck | ApprovalPending | BuildingTx, Idle)
                | (Confirmed | Failed, Idle)
        )
    }

    /// `next` when the move is allowed, `Error::InvalidTransition` otherwise
    pub fn transition(self, next: ExecutionState) -> EngineResult<ExecutionState> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(report!(Error::InvalidTransition {
                from: self.to_string(),
                to: next.to_string(),
            }))
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ExecutionState::Confirmed | ExecutionState::Failed)
    }
}
