use pixstake_common::{
    types::stake::{
        ACTIVE_OFFSET, HARVESTED_OFFSET, MINT_OFFSET, STAKER_OFFSET, TIMESTAMP_OFFSET,
        WITHDRAWN_OFFSET,
    },
    Error, Result, RewardAmount, StakeRecord, STAKE_RECORD_LEN,
};
use solana_sdk::pubkey::Pubkey;

/// Decodes a stake account.
///
/// `None` means the account does not exist, i.e. the asset was never staked.
/// Only the length is validated; trailing bytes are ignored.
pub fn decode_stake_record(data: Option<&[u8]>) -> Result<Option<StakeRecord>> {
    let Some(buf) = data else {
        return Ok(None);
    };
    if buf.len() < STAKE_RECORD_LEN {
        return Err(Error::Decode {
            expected: STAKE_RECORD_LEN,
            actual: buf.len(),
        });
    }

    Ok(Some(StakeRecord {
        timestamp: read_u64(buf, TIMESTAMP_OFFSET),
        staker: read_pubkey(buf, STAKER_OFFSET),
        mint: read_pubkey(buf, MINT_OFFSET),
        active: buf[ACTIVE_OFFSET] != 0,
        withdrawn: RewardAmount::from_units(read_u64(buf, WITHDRAWN_OFFSET)),
        harvested: RewardAmount::from_units(read_u64(buf, HARVESTED_OFFSET)),
    }))
}

fn read_u64(buf: &[u8], offset: usize) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&buf[offset..offset + 8]);
    u64::from_le_bytes(bytes)
}

fn read_pubkey(buf: &[u8], offset: usize) -> Pubkey {
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&buf[offset..offset + 32]);
    Pubkey::new_from_array(bytes)
}

/// Inverse of [`decode_stake_record`], used to fabricate accounts in tests.
#[cfg(test)]
pub(crate) fn encode_stake_record(record: &StakeRecord) -> Vec<u8> {
    let mut buf = Vec::with_capacity(STAKE_RECORD_LEN);
    buf.extend_from_slice(&record.timestamp.to_le_bytes());
    buf.extend_from_slice(record.staker.as_ref());
    buf.extend_from_slice(record.mint.as_ref());
    buf.push(record.active as u8);
    buf.extend_from_slice(&record.withdrawn.units().to_le_bytes());
    buf.extend_from_slice(&record.harvested.units().to_le_bytes());
    buf
}
