//! Program-derived address lookups
//!
//! Seed order is part of the on-chain contract: an address derived from the
//! same seeds in a different order is rejected by the program.

use pixstake_common::{Error, ProgramAddresses, Result};
use solana_sdk::pubkey::Pubkey;

pub const WHITELIST_SEED: &[u8] = b"whitelist";
pub const METADATA_SEED: &[u8] = b"metadata";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivedAddress {
    pub address: Pubkey,
    pub bump: u8,
}

/// Bump search from 255 down to the first off-curve address.
pub fn find_program_address(seeds: &[&[u8]], program_id: &Pubkey) -> Result<DerivedAddress> {
    Pubkey::try_find_program_address(seeds, program_id)
        .map(|(address, bump)| DerivedAddress { address, bump })
        .ok_or_else(|| {
            Error::Derivation(format!(
                "no valid bump for {} seed(s) under program {}",
                seeds.len(),
                program_id
            ))
        })
}

/// Address search used by [`AddressDeriver`].
pub type AddressFinder = fn(&[&[u8]], &Pubkey) -> Result<DerivedAddress>;

#[derive(Debug, Clone, Copy)]
pub struct AddressDeriver {
    addresses: ProgramAddresses,
    find: AddressFinder,
}

impl AddressDeriver {
    pub fn new(addresses: ProgramAddresses) -> Self {
        Self {
            addresses,
            find: find_program_address,
        }
    }

    pub fn with_finder(mut self, find: AddressFinder) -> Self {
        self.find = find;
        self
    }

    pub fn addresses(&self) -> &ProgramAddresses {
        &self.addresses
    }

    /// Stake record for `mint`, seeded by the mint alone.
    pub fn stake_data(&self, mint: &Pubkey) -> Result<DerivedAddress> {
        (self.find)(&[mint.as_ref()], &self.addresses.program_id)
    }

    /// Associated token account: `[owner, token_program, mint]`.
    pub fn associated_token(&self, owner: &Pubkey, mint: &Pubkey) -> Result<DerivedAddress> {
        (self.find)(
            &[
                owner.as_ref(),
                self.addresses.token_program.as_ref(),
                mint.as_ref(),
            ],
            &self.addresses.associated_token_program,
        )
    }

    /// Collection whitelist: `["whitelist", collection_creator]`.
    pub fn whitelist(&self) -> Result<DerivedAddress> {
        (self.find)(
            &[WHITELIST_SEED, self.addresses.collection_creator.as_ref()],
            &self.addresses.program_id,
        )
    }

    /// Token metadata account: `["metadata", metadata_program, mint]`.
    pub fn metadata(&self, mint: &Pubkey) -> Result<DerivedAddress> {
        (self.find)(
            &[
                METADATA_SEED,
                self.addresses.metadata_program.as_ref(),
                mint.as_ref(),
            ],
            &self.addresses.metadata_program,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_addresses;

    #[test]
    fn test_derivation_is_deterministic() {
        let deriver = AddressDeriver::new(test_addresses());
        let mint = Pubkey::new_unique();

        let first = deriver.stake_data(&mint).unwrap();
        let second = deriver.stake_data(&mint).unwrap();
        assert_eq!(first, second);

        let whitelist = deriver.whitelist().unwrap();
        assert_eq!(whitelist, deriver.whitelist().unwrap());
    }

    #[test]
    fn test_derived_address_is_off_curve_and_reproducible_with_bump() {
        let addresses = test_addresses();
        let deriver = AddressDeriver::new(addresses);
        let mint = Pubkey::new_unique();

        let derived = deriver.stake_data(&mint).unwrap();
        assert!(!derived.address.is_on_curve());

        let recreated =
            Pubkey::create_program_address(&[mint.as_ref(), &[derived.bump]], &addresses.program_id)
                .unwrap();
        assert_eq!(recreated, derived.address);
    }

    #[test]
    fn test_associated_token_seed_order_matters() {
        let addresses = test_addresses();
        let deriver = AddressDeriver::new(addresses);
        let owner = Pubkey::new_unique();
        let mint = Pubkey::new_unique();

        let ata = deriver.associated_token(&owner, &mint).unwrap();
        let swapped = deriver.associated_token(&mint, &owner).unwrap();
        assert_ne!(ata.address, swapped.address);

        let (expected, bump) = Pubkey::find_program_address(
            &[owner.as_ref(), addresses.token_program.as_ref(), mint.as_ref()],
            &addresses.associated_token_program,
        );
        assert_eq!(ata, DerivedAddress { address: expected, bump });
    }

    #[test]
    fn test_whitelist_depends_on_collection_creator() {
        let mut addresses = test_addresses();
        let first = AddressDeriver::new(addresses).whitelist().unwrap();
        addresses.collection_creator = Pubkey::new_unique();
        let second = AddressDeriver::new(addresses).whitelist().unwrap();
        assert_ne!(first.address, second.address);
    }

    #[test]
    fn test_metadata_address_is_under_metadata_program() {
        let addresses = test_addresses();
        let mint = Pubkey::new_unique();
        let derived = AddressDeriver::new(addresses).metadata(&mint).unwrap();

        let recreated = Pubkey::create_program_address(
            &[
                METADATA_SEED,
                addresses.metadata_program.as_ref(),
                mint.as_ref(),
                &[derived.bump],
            ],
            &addresses.metadata_program,
        )
        .unwrap();
        assert_eq!(recreated, derived.address);
    }

    #[test]
    fn test_oversized_seed_fails_derivation() {
        let program = Pubkey::new_unique();
        let seed = [7u8; 64];
        let err = find_program_address(&[&seed], &program).unwrap_err();
        assert!(matches!(err, Error::Derivation(_)));
    }
}
