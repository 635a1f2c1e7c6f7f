//! Program-derived address derivation.
//!
//! Every sub-account the protocol touches is a PDA, reproducible by any
//! party from public inputs. Four derivations are in play:
//!
//! - escrow account:     `[seed]` under the escrow program
//! - execution tracker:  `[execution_id]` under the escrow program
//! - proof execution:    `["execution", payer, execution_id]` under the proof program
//! - image deployment:   `["deployment", sha256(image_id)]` under the proof program
//!
//! All derivations go through [`derive`], which models bump-search
//! exhaustion as an error instead of panicking.

use anchor_lang::solana_program::pubkey::Pubkey;
use sha2::{Digest, Sha256};

use crate::errors::{EscrowError, Result};
use crate::workflow::ExecutionId;

/// Seed prefix for proof execution accounts, owned by the proof program.
pub const EXECUTION_SEED: &[u8] = b"execution";

/// Seed prefix for image deployment accounts, owned by the proof program.
pub const DEPLOYMENT_SEED: &[u8] = b"deployment";

/// Find the canonical program address for `seeds`, probing the bump from
/// 255 down to 0. Exhausting the probe range is astronomically unlikely but
/// still reported as [`EscrowError::DerivationExhausted`].
pub fn derive(seeds: &[&[u8]], program_id: &Pubkey) -> Result<(Pubkey, u8)> {
    Pubkey::try_find_program_address(seeds, program_id)
        .ok_or(EscrowError::DerivationExhausted)
}

/// Escrow account address. Seeds: `[seed]`.
pub fn escrow_address(seed: &[u8], escrow_program: &Pubkey) -> Result<(Pubkey, u8)> {
    derive(&[seed], escrow_program)
}

/// Execution tracker address. Seeds: `[execution_id]`.
pub fn tracker_address(
    execution_id: &ExecutionId,
    escrow_program: &Pubkey,
) -> Result<(Pubkey, u8)> {
    derive(&[execution_id.as_bytes()], escrow_program)
}

/// Proof execution address, owned by the proof program.
/// Seeds: `["execution", payer, execution_id]`.
pub fn execution_address(
    payer: &Pubkey,
    execution_id: &ExecutionId,
    proof_program: &Pubkey,
) -> Result<(Pubkey, u8)> {
    derive(
        &[EXECUTION_SEED, payer.as_ref(), execution_id.as_bytes()],
        proof_program,
    )
}

/// Image deployment address, owned by the proof program.
/// Seeds: `["deployment", sha256(image_id)]`.
///
/// The image id string is digested before seeding so arbitrarily long
/// identifiers fit the 32-byte seed limit.
pub fn deployment_address(image_id: &str, proof_program: &Pubkey) -> Result<(Pubkey, u8)> {
    let digest = Sha256::digest(image_id.as_bytes());
    derive(&[DEPLOYMENT_SEED, digest.as_ref()], proof_program)
}
