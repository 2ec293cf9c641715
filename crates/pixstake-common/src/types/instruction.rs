use {
    serde::{Deserialize, Serialize},
    std::fmt,
};

/// Single-byte instruction tags understood by the staking program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum PlatformInstruction {
    GenerateVault = 0,
    AddToWhitelist = 1,
    Stake = 2,
    Unstake = 3,
    Claim = 4,
}

impl PlatformInstruction {
    pub fn discriminant(self) -> u8 {
        self as u8
    }
}

/// A user-facing mutating action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionFlow {
    Stake,
    Unstake,
    Claim,
}

impl ActionFlow {
    pub fn instruction(self) -> PlatformInstruction {
        match self {
            ActionFlow::Stake => PlatformInstruction::Stake,
            ActionFlow::Unstake => PlatformInstruction::Unstake,
            ActionFlow::Claim => PlatformInstruction::Claim,
        }
    }
}

impl fmt::Display for ActionFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionFlow::Stake => write!(f, "stake"),
            ActionFlow::Unstake => write!(f, "unstake"),
            ActionFlow::Claim => write!(f, "claim"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discriminants() {
        assert_eq!(PlatformInstruction::GenerateVault.discriminant(), 0);
        assert_eq!(PlatformInstruction::AddToWhitelist.discriminant(), 1);
        assert_eq!(ActionFlow::Stake.instruction().discriminant(), 2);
        assert_eq!(ActionFlow::Unstake.instruction().discriminant(), 3);
        assert_eq!(ActionFlow::Claim.instruction().discriminant(), 4);
    }
}
