//! Utility functions and helpers

mod time;

pub use time::{current_timestamp, format_timestamp};

use solana_sdk::pubkey::Pubkey;

pub fn string_to_pubkey(s: &str) -> crate::Result<Pubkey> {
    s.parse::<Pubkey>().map_err(|e: solana_sdk::pubkey::ParsePubkeyError| {
        crate::Error::Config(format!("invalid address {}: {}", s, e))
    })
}

/// `AbCdEf...WxYz` form used when printing wallets.
pub fn shortcut_wallet(wallet: &str) -> String {
    if wallet.len() <= 10 {
        return wallet.to_string();
    }
    format!("{}...{}", &wallet[..6], &wallet[wallet.len() - 4..])
}
