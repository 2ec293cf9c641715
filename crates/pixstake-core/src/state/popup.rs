use pixstake_common::{ActionFlow, FailureKind};

use crate::orchestrator::ActionPhase;

pub const STEP_IDLE: u8 = 0;
/// Waiting on the wallet or the cluster.
pub const STEP_PENDING: u8 = 1;
pub const STEP_SUCCESS: u8 = 2;
pub const STEP_ERROR: u8 = 3;

pub const STAKE_CANCELLED: &str = "The NFT staking has been canceled, \nplease try again";
pub const CLAIM_CANCELLED: &str = "The NFT claiming has been canceled, \nplease try again";
pub const INSUFFICIENT_BALANCE: &str = "Insufficient balance";
pub const UNEXPECTED_FAILURE: &str = "An unexpected error happened. Please try again";

/// A failure message shown to the user, attributed to the flow that raised it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub flow: ActionFlow,
    pub kind: FailureKind,
    pub message: String,
}

impl Notification {
    pub fn for_failure(flow: ActionFlow, kind: FailureKind) -> Self {
        let message = match (kind, flow) {
            (FailureKind::Cancelled, ActionFlow::Claim) => CLAIM_CANCELLED,
            // Unstake shares the staking wording.
            (FailureKind::Cancelled, _) => STAKE_CANCELLED,
            (FailureKind::InsufficientFunds, _) => INSUFFICIENT_BALANCE,
            (FailureKind::Unexpected, _) => UNEXPECTED_FAILURE,
        };
        Self {
            flow,
            kind,
            message: message.to_string(),
        }
    }
}

/// Progress dialog state for the three user flows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PopupState {
    pub stake_open: bool,
    pub unstake_open: bool,
    pub claim_open: bool,
    /// Flow of the most recently opened popup
    pub popup_type: Option<ActionFlow>,
    pub step: u8,
    pub error: String,
    /// Latest phase reported by a running action
    pub phase: Option<(ActionFlow, ActionPhase)>,
}

impl PopupState {
    pub fn is_open(&self, flow: ActionFlow) -> bool {
        match flow {
            ActionFlow::Stake => self.stake_open,
            ActionFlow::Unstake => self.unstake_open,
            ActionFlow::Claim => self.claim_open,
        }
    }

    pub fn any_open(&self) -> bool {
        self.stake_open || self.unstake_open || self.claim_open
    }

    /// Whether an outcome of `flow` may be shown: its own popup is waiting
    /// at the pending step, or no popup is open at all.
    pub fn accepts(&self, flow: ActionFlow) -> bool {
        (self.is_open(flow) && self.step == STEP_PENDING) || !self.any_open()
    }

    pub fn open(&mut self, flow: ActionFlow) {
        self.popup_type = Some(flow);
        self.set_open(flow, true);
    }

    pub fn close(&mut self, flow: ActionFlow) {
        self.set_open(flow, false);
    }

    fn set_open(&mut self, flow: ActionFlow, open: bool) {
        match flow {
            ActionFlow::Stake => self.stake_open = open,
            ActionFlow::Unstake => self.unstake_open = open,
            ActionFlow::Claim => self.claim_open = open,
        }
    }

    pub fn set_step(&mut self, step: u8) {
        self.step = step;
    }

    /// Moves to the error step. The text is kept only when the popup on
    /// screen belongs to the reporting flow.
    pub fn set_error(&mut self, notification: &Notification) {
        self.step = STEP_ERROR;
        self.error = if self.popup_type == Some(notification.flow) {
            notification.message.clone()
        } else {
            String::new()
        };
    }

    pub fn reset(&mut self) {
        self.error.clear();
        self.phase = None;
    }
}
