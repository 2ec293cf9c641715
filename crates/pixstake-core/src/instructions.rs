//! Transaction construction for stake, unstake and claim
//!
//! Account order and writable flags mirror the staking program's account
//! contract exactly; the instruction payload is the one-byte discriminant.

use std::sync::Arc;

use futures::future::try_join_all;
use pixstake_common::{AssetRef, PlatformInstruction, ProgramAddresses, Result};
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    message::Message,
    pubkey::Pubkey,
    system_program,
    sysvar,
    transaction::Transaction,
};
use tracing::debug;

use crate::{client::ChainClient, deriver::AddressDeriver};

/// An unsigned transaction for one asset, ready for the wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionEnvelope {
    pub operation: PlatformInstruction,
    pub mint: Pubkey,
    pub transaction: Transaction,
}

pub struct InstructionBuilder {
    chain: Arc<dyn ChainClient>,
    deriver: AddressDeriver,
}

impl InstructionBuilder {
    pub fn new(chain: Arc<dyn ChainClient>, addresses: ProgramAddresses) -> Self {
        Self::with_deriver(chain, AddressDeriver::new(addresses))
    }

    pub fn with_deriver(chain: Arc<dyn ChainClient>, deriver: AddressDeriver) -> Self {
        Self { chain, deriver }
    }

    pub fn deriver(&self) -> &AddressDeriver {
        &self.deriver
    }

    fn addresses(&self) -> &ProgramAddresses {
        self.deriver.addresses()
    }

    pub fn stake_instruction(&self, owner: &Pubkey, asset: &AssetRef) -> Result<Instruction> {
        let addresses = self.addresses();
        let vault = addresses.vault;

        let source = self.deriver.associated_token(owner, &asset.mint)?;
        let destination = self.deriver.associated_token(&vault, &asset.mint)?;
        let stake_data = self.deriver.stake_data(&asset.mint)?;
        let whitelist = self.deriver.whitelist()?;

        Ok(Instruction {
            program_id: addresses.program_id,
            accounts: vec![
                AccountMeta::new(*owner, true),
                AccountMeta::new_readonly(asset.mint, false),
                AccountMeta::new_readonly(asset.metadata_address, false),
                AccountMeta::new_readonly(vault, false),
                AccountMeta::new(source.address, false),
                AccountMeta::new(destination.address, false),
                AccountMeta::new_readonly(addresses.token_program, false),
                AccountMeta::new_readonly(system_program::id(), false),
                AccountMeta::new_readonly(sysvar::rent::id(), false),
                AccountMeta::new_readonly(addresses.associated_token_program, false),
                AccountMeta::new(stake_data.address, false),
                AccountMeta::new(whitelist.address, false),
            ],
            data: vec![PlatformInstruction::Stake.discriminant()],
        })
    }

    /// Unstake and claim share one account list and differ only in the
    /// discriminant.
    pub fn withdrawal_instruction(
        &self,
        operation: PlatformInstruction,
        owner: &Pubkey,
        asset: &AssetRef,
    ) -> Result<Instruction> {
        let addresses = self.addresses();
        let vault = addresses.vault;
        let reward_mint = addresses.reward_mint;

        let stake_data = self.deriver.stake_data(&asset.mint)?;
        let reward_destination = self.deriver.associated_token(owner, &reward_mint)?;
        let reward_source = self.deriver.associated_token(&vault, &reward_mint)?;
        let destination = self.deriver.associated_token(owner, &asset.mint)?;
        let source = self.deriver.associated_token(&vault, &asset.mint)?;
        let whitelist = self.deriver.whitelist()?;

        Ok(Instruction {
            program_id: addresses.program_id,
            accounts: vec![
                AccountMeta::new(*owner, true),
                AccountMeta::new_readonly(system_program::id(), false),
                AccountMeta::new_readonly(asset.mint, false),
                AccountMeta::new_readonly(addresses.token_program, false),
                AccountMeta::new_readonly(sysvar::rent::id(), false),
                AccountMeta::new_readonly(addresses.associated_token_program, false),
                AccountMeta::new(stake_data.address, false),
                AccountMeta::new_readonly(vault, false),
                AccountMeta::new(reward_destination.address, false),
                AccountMeta::new(reward_source.address, false),
                AccountMeta::new(destination.address, false),
                AccountMeta::new(source.address, false),
                AccountMeta::new_readonly(asset.metadata_address, false),
                AccountMeta::new(whitelist.address, false),
                AccountMeta::new_readonly(reward_mint, false),
            ],
            data: vec![operation.discriminant()],
        })
    }

    /// One envelope per asset, in input order.
    pub async fn build_stake_transactions(
        &self,
        owner: &Pubkey,
        assets: &[AssetRef],
    ) -> Result<Vec<TransactionEnvelope>> {
        try_join_all(assets.iter().map(|asset| async move {
            let instruction = self.stake_instruction(owner, asset)?;
            self.envelope(PlatformInstruction::Stake, owner, asset.mint, instruction)
                .await
        }))
        .await
    }

    pub async fn build_unstake_transaction(
        &self,
        owner: &Pubkey,
        asset: &AssetRef,
    ) -> Result<TransactionEnvelope> {
        let instruction =
            self.withdrawal_instruction(PlatformInstruction::Unstake, owner, asset)?;
        self.envelope(PlatformInstruction::Unstake, owner, asset.mint, instruction)
            .await
    }

    pub async fn build_claim_transaction(
        &self,
        owner: &Pubkey,
        asset: &AssetRef,
    ) -> Result<TransactionEnvelope> {
        let instruction = self.withdrawal_instruction(PlatformInstruction::Claim, owner, asset)?;
        self.envelope(PlatformInstruction::Claim, owner, asset.mint, instruction)
            .await
    }

    async fn envelope(
        &self,
        operation: PlatformInstruction,
        owner: &Pubkey,
        mint: Pubkey,
        instruction: Instruction,
    ) -> Result<TransactionEnvelope> {
        let blockhash = self.chain.get_latest_blockhash().await?;
        let message = Message::new_with_blockhash(&[instruction], Some(owner), &blockhash);
        debug!("Built {:?} transaction for {} at {}", operation, mint, blockhash);
        Ok(TransactionEnvelope {
            operation,
            mint,
            transaction: Transaction::new_unsigned(message),
        })
    }
}
