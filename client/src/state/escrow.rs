use anchor_lang::solana_program::pubkey::Pubkey;

use crate::errors::{EscrowError, Result};

/// Escrow account owned by the escrow program.
/// Seeds: [seed]
///
/// The byte layout is a fixed contract with the deployed program; any
/// change there is a breaking change here. This client never writes these
/// bytes directly; mutation happens only through instructions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscrowAccount {
    /// Derivation seed, zero-padded into its fixed slot
    pub seed: [u8; 32],
    /// Lamports locked for the claimant
    pub amount_lamports: u64,
    /// SHA-256 commitment, hex characters with trailing NUL padding trimmed
    pub commitment: String,
    /// Set exactly once, by the verified claim callback; never reverts
    pub is_claimed: bool,
    /// Claimant credited by the release; absent until claimed
    pub receiver: Option<Pubkey>,
    /// Account that opened the escrow
    pub initializer: Pubkey,
}

impl EscrowAccount {
    pub const SIZE: usize = 32 + // seed
        8 +  // amount_lamports
        64 + // commitment
        1 +  // is_claimed
        1 +  // receiver flag
        32 + // receiver
        32; // initializer
    // Total: 170 bytes

    /// Decode a persisted escrow record.
    ///
    /// Fixed offsets: `[0:32]` seed, `[32:40]` amount u64 LE, `[40:104]`
    /// commitment, `[104]` is_claimed, `[105]` receiver flag, `[106:138]`
    /// receiver, `[138:170]` initializer. Records shorter than 170 bytes
    /// fail with `TruncatedAccount`; a commitment slot that is not hex
    /// after trimming its NUL padding fails with `MalformedCommitment`.
    pub fn unpack(src: &[u8]) -> Result<Self> {
        if src.len() < Self::SIZE {
            return Err(EscrowError::TruncatedAccount {
                len: src.len(),
                expected: Self::SIZE,
            });
        }

        let mut seed = [0u8; 32];
        seed.copy_from_slice(&src[0..32]);

        let amount_lamports = u64::from_le_bytes(src[32..40].try_into().unwrap());

        // The program zero-fills fresh account data, so padding is NUL.
        let commitment_raw = &src[40..104];
        let trimmed_len = commitment_raw
            .iter()
            .rposition(|&b| b != 0)
            .map_or(0, |p| p + 1);
        let trimmed = &commitment_raw[..trimmed_len];
        if !trimmed.iter().all(|b| b.is_ascii_hexdigit()) {
            return Err(EscrowError::MalformedCommitment);
        }
        let commitment = core::str::from_utf8(trimmed)
            .map_err(|_| EscrowError::MalformedCommitment)?
            .to_owned();

        let is_claimed = src[104] != 0;

        let receiver = if src[105] != 0 {
            let bytes: [u8; 32] = src[106..138].try_into().unwrap();
            Some(Pubkey::new_from_array(bytes))
        } else {
            None
        };

        let initializer_bytes: [u8; 32] = src[138..170].try_into().unwrap();
        let initializer = Pubkey::new_from_array(initializer_bytes);

        Ok(Self {
            seed,
            amount_lamports,
            commitment,
            is_claimed,
            receiver,
            initializer,
        })
    }
}
