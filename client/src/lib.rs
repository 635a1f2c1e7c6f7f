//! Client SDK for the hash-locked escrow program.
//!
//! Value is locked under a SHA-256 commitment and released to whoever
//! proves the matching preimage. Hash verification is not done by the
//! escrow program itself: the claim instruction asks an external
//! verifiable-compute program to hash the submitted preimage, and the
//! escrow settles when that program calls back with a digest equal to the
//! stored commitment. This crate implements the client side of that
//! contract:
//!
//! - [`commitment`] produces and validates the hex commitments
//! - [`pda`] derives every program-owned sub-account address
//! - [`instruction`] holds the bit-exact instruction byte layouts
//! - [`state`] decodes persisted escrow and tracker accounts
//! - [`workflow`] drives the asynchronous claim state machine
//! - [`client`] is the I/O façade over injected ledger and wallet
//!   collaborators
//!
//! A typical flow: the locker calls `open_escrow` and shares the secret
//! off-chain with the intended receiver; the receiver calls `claim_escrow`,
//! which submits the preimage with a fresh execution id and polls the
//! escrow until the proof callback releases the funds.

use anchor_lang::solana_program::pubkey::Pubkey;
use std::str::FromStr;

pub mod client;
pub mod commitment;
pub mod errors;
pub mod instruction;
pub mod pda;
pub mod state;
pub mod workflow;

pub use client::{EscrowClient, LedgerConnector, Wallet};
pub use errors::EscrowError;
pub use state::{EscrowAccount, ExecutionTracker};
pub use workflow::{
    ClaimOutcome, ClaimParams, ClaimRequest, ExecutionId, PollConfig, SubmittedClaim,
};

/// Program id of the deployed escrow program.
pub const ESCROW_PROGRAM_ID: &str = "72bGikYM7J314fvAfBDvMGdqaewHaq7LpbJMNF5rJDb8";

/// Image id of the SHA-256 guest registered with the proof program. The
/// claim flow references the deployment account derived from this id.
pub const SHA256_IMAGE_ID: &str =
    "75029efa53432a9030e5e76d58fb34dfa786cd0f6182ed0741d635ff5e4f0341";

/// Deployment context for one escrow program instance.
///
/// Constructed once and passed to [`EscrowClient`]; there is no
/// process-wide state anywhere in the crate.
#[derive(Debug, Clone)]
pub struct EscrowConfig {
    /// The escrow program this client talks to.
    pub escrow_program: Pubkey,
    /// The external verifiable-compute program performing hash proofs.
    pub proof_program: Pubkey,
    /// Image id of the hashing guest, as registered with the proof program.
    pub image_id: String,
}

impl EscrowConfig {
    pub fn new(escrow_program: Pubkey, proof_program: Pubkey, image_id: impl Into<String>) -> Self {
        Self {
            escrow_program,
            proof_program,
            image_id: image_id.into(),
        }
    }

    /// Parse a config from base58 program id strings.
    pub fn from_ids(
        escrow_program: &str,
        proof_program: &str,
        image_id: &str,
    ) -> errors::Result<Self> {
        let escrow_program = Pubkey::from_str(escrow_program)
            .map_err(|_| EscrowError::InvalidProgramId(escrow_program.to_owned()))?;
        let proof_program = Pubkey::from_str(proof_program)
            .map_err(|_| EscrowError::InvalidProgramId(proof_program.to_owned()))?;
        Ok(Self::new(escrow_program, proof_program, image_id))
    }

    /// Config for the deployed escrow program and its SHA-256 guest image,
    /// against a caller-supplied proof program deployment.
    pub fn for_deployed_program(proof_program: Pubkey) -> errors::Result<Self> {
        let escrow_program = Pubkey::from_str(ESCROW_PROGRAM_ID)
            .map_err(|_| EscrowError::InvalidProgramId(ESCROW_PROGRAM_ID.to_owned()))?;
        Ok(Self::new(escrow_program, proof_program, SHA256_IMAGE_ID))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deployed_program_id_parses() {
        let config = EscrowConfig::for_deployed_program(Pubkey::new_unique()).unwrap();
        assert_eq!(config.escrow_program.to_string(), ESCROW_PROGRAM_ID);
        assert_eq!(config.image_id, SHA256_IMAGE_ID);
    }

    #[test]
    fn from_ids_rejects_bad_base58() {
        let err = EscrowConfig::from_ids("not-base58!", ESCROW_PROGRAM_ID, "img").unwrap_err();
        assert!(matches!(err, EscrowError::InvalidProgramId(_)));
    }
}
