use anchor_lang::solana_program::pubkey::Pubkey;

use crate::errors::{EscrowError, Result};

/// Execution tracker account, one per claim attempt.
/// Seeds: [execution_id]
///
/// Written by the escrow program when a claim is submitted; records which
/// proof execution account the attempt is waiting on. The program rejects a
/// second claim under the same execution id, which is why the client always
/// generates fresh ids. Reading the tracker is only needed to locate the
/// in-flight execution for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionTracker {
    /// Proof execution account this attempt is waiting on
    pub execution_account: Pubkey,
}

impl ExecutionTracker {
    pub const SIZE: usize = 32; // execution_account

    pub fn unpack(src: &[u8]) -> Result<Self> {
        if src.len() < Self::SIZE {
            return Err(EscrowError::TruncatedAccount {
                len: src.len(),
                expected: Self::SIZE,
            });
        }
        let bytes: [u8; 32] = src[0..32].try_into().unwrap();
        Ok(Self {
            execution_account: Pubkey::new_from_array(bytes),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unpack_reads_the_execution_account() {
        let execution_account = Pubkey::new_from_array([5u8; 32]);
        let mut bytes = execution_account.to_bytes().to_vec();
        bytes.extend_from_slice(&[0u8; 100]); // rent headroom
        let tracker = ExecutionTracker::unpack(&bytes).unwrap();
        assert_eq!(tracker.execution_account, execution_account);
    }

    #[test]
    fn unpack_rejects_short_record() {
        assert!(matches!(
            ExecutionTracker::unpack(&[0u8; 31]).unwrap_err(),
            EscrowError::TruncatedAccount { len: 31, expected: 32 }
        ));
    }
}
