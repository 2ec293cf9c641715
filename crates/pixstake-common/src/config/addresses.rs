use solana_sdk::pubkey::Pubkey;

use super::StakingConfig;
use crate::{errors::Result, utils::string_to_pubkey};

/// Parsed identities for the active cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramAddresses {
    pub program_id: Pubkey,
    pub vault: Pubkey,
    pub collection_creator: Pubkey,
    pub reward_mint: Pubkey,
    pub token_program: Pubkey,
    pub associated_token_program: Pubkey,
    pub metadata_program: Pubkey,
}

impl ProgramAddresses {
    pub fn resolve(config: &StakingConfig) -> Result<Self> {
        let cluster = config.active();
        Ok(Self {
            program_id: string_to_pubkey(&cluster.program_id)?,
            vault: string_to_pubkey(&cluster.vault)?,
            collection_creator: string_to_pubkey(&cluster.collection_creator)?,
            reward_mint: string_to_pubkey(&cluster.reward_mint)?,
            token_program: string_to_pubkey(&config.token_program)?,
            associated_token_program: string_to_pubkey(&config.associated_token_program)?,
            metadata_program: string_to_pubkey(&config.metadata_program)?,
        })
    }
}
