//! Claim workflow: one asynchronous claim attempt from build to settlement.
//!
//! The claim is split into *request* (submit the preimage, ask the proof
//! program to hash it) and *settlement* (the program's callback releases the
//! funds on a verified match), so a single attempt moves through
//!
//! ```text
//! Built -> Submitted -> (Pending | Rejected) -> (Released | Expired)
//! ```
//!
//! Each phase is its own type: [`ClaimRequest`] is Built, [`SubmittedClaim`]
//! is Submitted, and [`ClaimOutcome`] is terminal. Pending is observed by
//! polling the escrow account, since the client has no subscription channel
//! and settlement time is bounded only by the proof service.

use std::time::Duration;

use anchor_lang::solana_program::instruction::Instruction;
use anchor_lang::solana_program::pubkey::Pubkey;
use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use rand::Rng;

use crate::errors::{EscrowError, Result};
use crate::instruction::{self, ClaimAccounts};
use crate::pda;
use crate::state::EscrowAccount;
use crate::EscrowConfig;

/// Fixed width of an execution identifier.
pub const EXECUTION_ID_LEN: usize = 16;

/// Caller-chosen token distinguishing requests to the proof service.
///
/// The escrow program rejects a second claim under the same id, so ids are
/// single-use: every attempt must carry a fresh one. Shorter input is
/// zero-padded into the fixed slot; longer input is a caller error rather
/// than silent truncation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExecutionId([u8; EXECUTION_ID_LEN]);

impl ExecutionId {
    pub fn new(id: &str) -> Result<Self> {
        let bytes = id.as_bytes();
        if bytes.len() > EXECUTION_ID_LEN {
            return Err(EscrowError::ExecutionIdTooLong(bytes.len()));
        }
        let mut slot = [0u8; EXECUTION_ID_LEN];
        slot[..bytes.len()].copy_from_slice(bytes);
        Ok(Self(slot))
    }

    /// Generate a fresh id: 16 alphanumeric characters from the OS RNG.
    /// The program reads the slot as UTF-8, so the id must stay printable.
    pub fn generate() -> Self {
        let mut slot = [0u8; EXECUTION_ID_LEN];
        for byte in slot.iter_mut() {
            *byte = OsRng.sample(Alphanumeric);
        }
        Self(slot)
    }

    pub fn as_bytes(&self) -> &[u8; EXECUTION_ID_LEN] {
        &self.0
    }
}

impl std::fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let used = self.0.iter().rposition(|&b| b != 0).map_or(0, |p| p + 1);
        write!(f, "{}", String::from_utf8_lossy(&self.0[..used]))
    }
}

/// Parameters of a claim request that are forwarded to the proof program.
#[derive(Debug, Clone, Copy)]
pub struct ClaimParams {
    /// Lamports offered to the prover for running the hash computation.
    pub tip: u64,
    /// Slots after submission before the proof request lapses.
    pub expiry_slots: u64,
}

impl Default for ClaimParams {
    fn default() -> Self {
        Self {
            tip: 10_000,
            expiry_slots: 300,
        }
    }
}

/// Poll-loop bounds for observing settlement.
///
/// Replaces a fixed post-submission sleep: the loop re-reads the escrow at
/// `interval` until a terminal state shows up or `max_attempts` is spent.
#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_attempts: 30,
        }
    }
}

/// A fully assembled claim attempt (phase: Built).
///
/// Holds the fresh execution id, every derived address the instruction
/// references, and the instruction itself. Nothing here has touched the
/// ledger yet.
#[derive(Debug, Clone)]
pub struct ClaimRequest {
    pub execution_id: ExecutionId,
    pub seed: Vec<u8>,
    pub payer: Pubkey,
    pub receiver: Pubkey,
    pub escrow: Pubkey,
    pub escrow_bump: u8,
    pub tracker: Pubkey,
    pub tracker_bump: u8,
    pub execution: Pubkey,
    pub deployment: Pubkey,
    pub params: ClaimParams,
    pub instruction: Instruction,
}

impl ClaimRequest {
    /// Build a claim attempt with a freshly generated execution id.
    pub fn build(
        config: &EscrowConfig,
        payer: &Pubkey,
        receiver: &Pubkey,
        seed: &[u8],
        preimage: &[u8],
        params: ClaimParams,
    ) -> Result<Self> {
        Self::build_with_id(
            config,
            payer,
            receiver,
            seed,
            preimage,
            params,
            ExecutionId::generate(),
        )
    }

    /// Build with an explicit execution id. The id must never have been
    /// used against the escrow program before.
    pub fn build_with_id(
        config: &EscrowConfig,
        payer: &Pubkey,
        receiver: &Pubkey,
        seed: &[u8],
        preimage: &[u8],
        params: ClaimParams,
        execution_id: ExecutionId,
    ) -> Result<Self> {
        let (escrow, escrow_bump) = pda::escrow_address(seed, &config.escrow_program)?;
        let (tracker, tracker_bump) = pda::tracker_address(&execution_id, &config.escrow_program)?;
        let (execution, _) = pda::execution_address(payer, &execution_id, &config.proof_program)?;
        let (deployment, _) = pda::deployment_address(&config.image_id, &config.proof_program)?;

        let data = instruction::encode_claim(
            &execution_id,
            escrow_bump,
            params.tip,
            params.expiry_slots,
            seed,
            preimage,
        )?;
        let accounts = ClaimAccounts {
            payer: *payer,
            receiver: *receiver,
            escrow,
            tracker,
            execution,
            proof_program: config.proof_program,
            deployment,
        };
        let instruction = instruction::claim_instruction(&config.escrow_program, &accounts, data);

        Ok(Self {
            execution_id,
            seed: seed.to_vec(),
            payer: *payer,
            receiver: *receiver,
            escrow,
            escrow_bump,
            tracker,
            tracker_bump,
            execution,
            deployment,
            params,
            instruction,
        })
    }
}

/// A claim attempt accepted by the ledger (phase: Submitted).
#[derive(Debug, Clone)]
pub struct SubmittedClaim {
    pub request: ClaimRequest,
    /// Transaction signature reported by the connector.
    pub signature: String,
}

/// Terminal outcome of one claim attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// The escrow released to this attempt's receiver.
    Released { receiver: Pubkey },
    /// The escrow is claimed, but not by this attempt: a competing claim
    /// won the race. The funds moved exactly once, to `receiver`.
    Rejected { receiver: Option<Pubkey> },
    /// The poll window elapsed with the escrow still unclaimed.
    Expired,
}

/// Interpret a polled escrow snapshot for the attempt crediting `receiver`.
///
/// `None` means still pending: keep polling. An escrow claimed by a
/// different receiver is a terminal failure of *this* attempt, not an
/// account-read error.
pub fn interpret_outcome(escrow: &EscrowAccount, receiver: &Pubkey) -> Option<ClaimOutcome> {
    if !escrow.is_claimed {
        return None;
    }
    match escrow.receiver {
        Some(winner) if winner == *receiver => Some(ClaimOutcome::Released { receiver: winner }),
        other => Some(ClaimOutcome::Rejected { receiver: other }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commitment;

    fn config() -> EscrowConfig {
        EscrowConfig::new(
            Pubkey::new_from_array([1u8; 32]),
            Pubkey::new_from_array([2u8; 32]),
            "test-image",
        )
    }

    #[test]
    fn execution_id_pads_short_input() {
        let id = ExecutionId::new("abc").unwrap();
        let mut expected = [0u8; EXECUTION_ID_LEN];
        expected[..3].copy_from_slice(b"abc");
        assert_eq!(id.as_bytes(), &expected);
        assert_eq!(id.to_string(), "abc");
    }

    #[test]
    fn execution_id_rejects_long_input() {
        assert!(matches!(
            ExecutionId::new("12345678901234567").unwrap_err(),
            EscrowError::ExecutionIdTooLong(17)
        ));
        // Boundary: exactly 16 is fine.
        assert!(ExecutionId::new("1234567890123456").is_ok());
    }

    #[test]
    fn generated_ids_are_printable_and_fresh() {
        let a = ExecutionId::generate();
        let b = ExecutionId::generate();
        assert_ne!(a, b);
        assert!(a.as_bytes().iter().all(|b| b.is_ascii_alphanumeric()));
    }

    #[test]
    fn build_derives_consistent_addresses() {
        let config = config();
        let payer = Pubkey::new_from_array([3u8; 32]);
        let receiver = Pubkey::new_from_array([4u8; 32]);
        let id = ExecutionId::new("claim-1").unwrap();

        let request = ClaimRequest::build_with_id(
            &config,
            &payer,
            &receiver,
            b"s1",
            b"hello",
            ClaimParams::default(),
            id,
        )
        .unwrap();

        let (escrow, bump) = pda::escrow_address(b"s1", &config.escrow_program).unwrap();
        assert_eq!(request.escrow, escrow);
        assert_eq!(request.escrow_bump, bump);
        assert_eq!(
            request.tracker,
            pda::tracker_address(&id, &config.escrow_program).unwrap().0
        );
        assert_eq!(
            request.execution,
            pda::execution_address(&payer, &id, &config.proof_program)
                .unwrap()
                .0
        );
        assert_eq!(request.instruction.accounts[2].pubkey, escrow);
        assert_eq!(request.instruction.data[0], crate::instruction::OPCODE_CLAIM);
    }

    #[test]
    fn fresh_builds_use_fresh_ids() {
        let config = config();
        let payer = Pubkey::new_from_array([3u8; 32]);
        let receiver = Pubkey::new_from_array([4u8; 32]);
        let a = ClaimRequest::build(&config, &payer, &receiver, b"s1", b"x", ClaimParams::default())
            .unwrap();
        let b = ClaimRequest::build(&config, &payer, &receiver, b"s1", b"x", ClaimParams::default())
            .unwrap();
        assert_ne!(a.execution_id, b.execution_id);
        assert_ne!(a.tracker, b.tracker);
    }

    #[test]
    fn interpret_pending_then_terminal() {
        let receiver = Pubkey::new_from_array([4u8; 32]);
        let other = Pubkey::new_from_array([5u8; 32]);
        let mut escrow = EscrowAccount {
            seed: [0u8; 32],
            amount_lamports: 1,
            commitment: commitment::commit("hello"),
            is_claimed: false,
            receiver: None,
            initializer: Pubkey::new_from_array([6u8; 32]),
        };

        assert_eq!(interpret_outcome(&escrow, &receiver), None);

        escrow.is_claimed = true;
        escrow.receiver = Some(receiver);
        assert_eq!(
            interpret_outcome(&escrow, &receiver),
            Some(ClaimOutcome::Released { receiver })
        );

        escrow.receiver = Some(other);
        assert_eq!(
            interpret_outcome(&escrow, &receiver),
            Some(ClaimOutcome::Rejected {
                receiver: Some(other)
            })
        );
    }
}
