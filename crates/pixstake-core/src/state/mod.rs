//! Application state: wallet contents and the progress popup
//!
//! Single writer: the [`StateStore`] task applies [`StoreEvent`]s in arrival
//! order. Everything else reads through watch channels.

mod popup;
mod store;
mod wallet;

pub use popup::{
    Notification, PopupState, CLAIM_CANCELLED, INSUFFICIENT_BALANCE, STAKE_CANCELLED,
    STEP_ERROR, STEP_IDLE, STEP_PENDING, STEP_SUCCESS, UNEXPECTED_FAILURE,
};
pub use store::{spawn_periodic_refresh, PopupHandle, RefreshTarget, StateStore, StoreEvent};
pub use wallet::WalletState;
