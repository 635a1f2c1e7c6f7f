//! Instruction encoding for the escrow program.
//!
//! One encode function per instruction variant, each validating its own
//! field-length preconditions before any byte is written. The layouts are a
//! fixed wire contract with the deployed program: a framing mistake here
//! corrupts a money-moving transaction, so nothing in this module touches
//! offsets outside its own encoder.

use anchor_lang::solana_program::instruction::{AccountMeta, Instruction};
use anchor_lang::solana_program::pubkey::Pubkey;
use anchor_lang::solana_program::system_program;

use crate::errors::{EscrowError, Result};
use crate::workflow::ExecutionId;

/// Opcode of the open-escrow instruction.
pub const OPCODE_OPEN: u8 = 0;
/// Opcode of the claim instruction.
pub const OPCODE_CLAIM: u8 = 1;

/// Fields carried behind a one-byte length prefix.
pub const MAX_SEED_LEN: usize = u8::MAX as usize;
pub const MAX_COMMITMENT_LEN: usize = u8::MAX as usize;
/// The preimage carries a two-byte length prefix.
pub const MAX_PREIMAGE_LEN: usize = u16::MAX as usize;

/// Encode the open instruction data.
///
/// Layout: `[0][len(seed):u8][seed][len(commitment):u8][commitment][amount:u64 LE]`.
pub fn encode_open(seed: &[u8], commitment: &[u8], amount_lamports: u64) -> Result<Vec<u8>> {
    if seed.len() > MAX_SEED_LEN {
        return Err(EscrowError::FieldTooLong {
            field: "seed",
            len: seed.len(),
            max: MAX_SEED_LEN,
        });
    }
    if commitment.len() > MAX_COMMITMENT_LEN {
        return Err(EscrowError::FieldTooLong {
            field: "commitment",
            len: commitment.len(),
            max: MAX_COMMITMENT_LEN,
        });
    }

    let mut data = Vec::with_capacity(1 + 1 + seed.len() + 1 + commitment.len() + 8);
    data.push(OPCODE_OPEN);
    data.push(seed.len() as u8);
    data.extend_from_slice(seed);
    data.push(commitment.len() as u8);
    data.extend_from_slice(commitment);
    data.extend_from_slice(&amount_lamports.to_le_bytes());
    Ok(data)
}

/// Encode the claim instruction data.
///
/// Layout: `[1][execution_id:16][bump][tip:u64 LE][expiry:u64 LE]`
/// `[len(seed):u8][seed][len(preimage):u16 LE][preimage]`.
///
/// The preimage travels in clear: the claim is valid only once, and the
/// program forwards it to the proof service for hashing. Keeping the secret
/// confidential before claim submission is the caller's responsibility.
pub fn encode_claim(
    execution_id: &ExecutionId,
    bump: u8,
    tip: u64,
    expiry_slots: u64,
    seed: &[u8],
    preimage: &[u8],
) -> Result<Vec<u8>> {
    if seed.len() > MAX_SEED_LEN {
        return Err(EscrowError::FieldTooLong {
            field: "seed",
            len: seed.len(),
            max: MAX_SEED_LEN,
        });
    }
    if preimage.len() > MAX_PREIMAGE_LEN {
        return Err(EscrowError::FieldTooLong {
            field: "preimage",
            len: preimage.len(),
            max: MAX_PREIMAGE_LEN,
        });
    }

    let mut data =
        Vec::with_capacity(1 + 16 + 1 + 8 + 8 + 1 + seed.len() + 2 + preimage.len());
    data.push(OPCODE_CLAIM);
    data.extend_from_slice(execution_id.as_bytes());
    data.push(bump);
    data.extend_from_slice(&tip.to_le_bytes());
    data.extend_from_slice(&expiry_slots.to_le_bytes());
    data.push(seed.len() as u8);
    data.extend_from_slice(seed);
    data.extend_from_slice(&(preimage.len() as u16).to_le_bytes());
    data.extend_from_slice(preimage);
    Ok(data)
}

/// Accounts referenced by the open instruction, in program order.
#[derive(Debug, Clone, Copy)]
pub struct OpenAccounts {
    pub initializer: Pubkey,
    pub escrow: Pubkey,
}

/// Assemble the full open instruction against `escrow_program`.
pub fn open_instruction(
    escrow_program: &Pubkey,
    accounts: &OpenAccounts,
    data: Vec<u8>,
) -> Instruction {
    Instruction {
        program_id: *escrow_program,
        accounts: vec![
            AccountMeta::new(accounts.initializer, true),
            AccountMeta::new(accounts.escrow, false),
            AccountMeta::new_readonly(system_program::ID, false),
        ],
        data,
    }
}

/// Accounts referenced by the claim instruction, in program order.
///
/// The ordering mirrors the program's account iterator and is part of the
/// wire contract: payer, receiver, escrow, tracker, proof execution, system
/// program, proof program, image deployment, and finally the escrow program
/// itself (passed so the proof program can route its callback).
#[derive(Debug, Clone, Copy)]
pub struct ClaimAccounts {
    pub payer: Pubkey,
    pub receiver: Pubkey,
    pub escrow: Pubkey,
    pub tracker: Pubkey,
    pub execution: Pubkey,
    pub proof_program: Pubkey,
    pub deployment: Pubkey,
}

/// Assemble the full claim instruction against `escrow_program`.
pub fn claim_instruction(
    escrow_program: &Pubkey,
    accounts: &ClaimAccounts,
    data: Vec<u8>,
) -> Instruction {
    Instruction {
        program_id: *escrow_program,
        accounts: vec![
            AccountMeta::new(accounts.payer, true),
            AccountMeta::new(accounts.receiver, false),
            AccountMeta::new(accounts.escrow, false),
            AccountMeta::new(accounts.tracker, false),
            AccountMeta::new(accounts.execution, false),
            AccountMeta::new_readonly(system_program::ID, false),
            AccountMeta::new_readonly(accounts.proof_program, false),
            AccountMeta::new_readonly(accounts.deployment, false),
            AccountMeta::new_readonly(*escrow_program, false),
        ],
        data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_layout_is_byte_exact() {
        let data = encode_open(b"s1", b"abcd", 100_000_000).unwrap();
        let mut expected = vec![OPCODE_OPEN, 2];
        expected.extend_from_slice(b"s1");
        expected.push(4);
        expected.extend_from_slice(b"abcd");
        expected.extend_from_slice(&100_000_000u64.to_le_bytes());
        assert_eq!(data, expected);
    }

    #[test]
    fn open_length_guard_boundaries() {
        let seed_max = vec![0xAA; MAX_SEED_LEN];
        assert!(encode_open(&seed_max, b"c", 1).is_ok());

        let seed_over = vec![0xAA; MAX_SEED_LEN + 1];
        assert!(matches!(
            encode_open(&seed_over, b"c", 1).unwrap_err(),
            EscrowError::FieldTooLong { field: "seed", len: 256, max: 255 }
        ));

        let commitment_over = vec![b'a'; MAX_COMMITMENT_LEN + 1];
        assert!(matches!(
            encode_open(b"s", &commitment_over, 1).unwrap_err(),
            EscrowError::FieldTooLong { field: "commitment", .. }
        ));
    }

    #[test]
    fn claim_layout_is_byte_exact() {
        let id = ExecutionId::new("exec-1").unwrap();
        let data = encode_claim(&id, 254, 7, 500, b"s1", b"hello").unwrap();

        let mut expected = vec![OPCODE_CLAIM];
        let mut id_slot = [0u8; 16];
        id_slot[..6].copy_from_slice(b"exec-1");
        expected.extend_from_slice(&id_slot);
        expected.push(254);
        expected.extend_from_slice(&7u64.to_le_bytes());
        expected.extend_from_slice(&500u64.to_le_bytes());
        expected.push(2);
        expected.extend_from_slice(b"s1");
        expected.extend_from_slice(&5u16.to_le_bytes());
        expected.extend_from_slice(b"hello");
        assert_eq!(data, expected);
    }

    #[test]
    fn claim_length_guard_boundaries() {
        let id = ExecutionId::generate();

        let preimage_max = vec![0x42; MAX_PREIMAGE_LEN];
        assert!(encode_claim(&id, 0, 0, 0, b"s", &preimage_max).is_ok());

        let preimage_over = vec![0x42; MAX_PREIMAGE_LEN + 1];
        assert!(matches!(
            encode_claim(&id, 0, 0, 0, b"s", &preimage_over).unwrap_err(),
            EscrowError::FieldTooLong { field: "preimage", len: 65536, max: 65535 }
        ));

        let seed_over = vec![0xAA; MAX_SEED_LEN + 1];
        assert!(matches!(
            encode_claim(&id, 0, 0, 0, &seed_over, b"p").unwrap_err(),
            EscrowError::FieldTooLong { field: "seed", .. }
        ));
    }

    #[test]
    fn claim_metas_follow_program_order() {
        let escrow_program = Pubkey::new_from_array([1u8; 32]);
        let accounts = ClaimAccounts {
            payer: Pubkey::new_from_array([2u8; 32]),
            receiver: Pubkey::new_from_array([3u8; 32]),
            escrow: Pubkey::new_from_array([4u8; 32]),
            tracker: Pubkey::new_from_array([5u8; 32]),
            execution: Pubkey::new_from_array([6u8; 32]),
            proof_program: Pubkey::new_from_array([7u8; 32]),
            deployment: Pubkey::new_from_array([8u8; 32]),
        };
        let ix = claim_instruction(&escrow_program, &accounts, vec![OPCODE_CLAIM]);

        assert_eq!(ix.program_id, escrow_program);
        assert_eq!(ix.accounts.len(), 9);
        assert_eq!(ix.accounts[0].pubkey, accounts.payer);
        assert!(ix.accounts[0].is_signer);
        assert!(ix.accounts[0].is_writable);
        assert_eq!(ix.accounts[4].pubkey, accounts.execution);
        assert_eq!(ix.accounts[5].pubkey, system_program::ID);
        assert!(!ix.accounts[5].is_writable);
        assert_eq!(ix.accounts[8].pubkey, escrow_program);
    }
}
