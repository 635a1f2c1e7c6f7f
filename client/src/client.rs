//! Escrow client façade.
//!
//! [`EscrowClient`] composes the codec, derivation, and workflow layers over
//! two injected collaborators: a [`LedgerConnector`] for submission and
//! account reads, and a [`Wallet`] for the payer identity. It is the only
//! component in the crate that performs I/O.

use std::thread;

use anchor_lang::solana_program::instruction::Instruction;
use anchor_lang::solana_program::pubkey::Pubkey;
use log::{debug, info, warn};

use crate::commitment;
use crate::errors::{EscrowError, Result};
use crate::instruction::{self, OpenAccounts};
use crate::pda;
use crate::state::{EscrowAccount, ExecutionTracker};
use crate::workflow::{
    interpret_outcome, ClaimOutcome, ClaimParams, ClaimRequest, ExecutionId, PollConfig,
    SubmittedClaim,
};
use crate::EscrowConfig;

/// Signing collaborator: a public address plus signing capability.
///
/// The connector decides what to sign; this crate only ever asks for the
/// wallet's address when assembling instructions.
pub trait Wallet {
    fn address(&self) -> Pubkey;

    /// Sign an arbitrary message, typically a serialized transaction.
    fn sign_message(&self, message: &[u8]) -> [u8; 64];
}

/// Ledger connectivity collaborator.
///
/// The connector owns the transaction envelope: it wraps instructions,
/// collects the payer signature, submits, and awaits confirmation. Keeping
/// it behind a trait lets tests drive the whole claim handshake against an
/// in-memory double.
pub trait LedgerConnector {
    /// Submit `instructions` as one transaction paid and signed by `payer`,
    /// and wait for confirmation. Returns the transaction signature.
    fn submit_and_confirm(
        &self,
        instructions: &[Instruction],
        payer: &dyn Wallet,
    ) -> Result<String>;

    /// Read raw account bytes; `None` when the account does not exist.
    fn read_account(&self, address: &Pubkey) -> Result<Option<Vec<u8>>>;
}

impl<C: LedgerConnector + ?Sized> LedgerConnector for &C {
    fn submit_and_confirm(
        &self,
        instructions: &[Instruction],
        payer: &dyn Wallet,
    ) -> Result<String> {
        (**self).submit_and_confirm(instructions, payer)
    }

    fn read_account(&self, address: &Pubkey) -> Result<Option<Vec<u8>>> {
        (**self).read_account(address)
    }
}

/// Client for one escrow program deployment.
///
/// Holds no global state: everything it needs arrives through the config
/// and the two collaborators at construction time.
pub struct EscrowClient<C, W> {
    config: EscrowConfig,
    connector: C,
    wallet: W,
}

impl<C: LedgerConnector, W: Wallet> EscrowClient<C, W> {
    pub fn new(config: EscrowConfig, connector: C, wallet: W) -> Self {
        Self {
            config,
            connector,
            wallet,
        }
    }

    pub fn config(&self) -> &EscrowConfig {
        &self.config
    }

    /// Address of the wallet paying for and signing every submission.
    pub fn payer(&self) -> Pubkey {
        self.wallet.address()
    }

    /// Escrow account address for `seed` under this deployment.
    pub fn escrow_address(&self, seed: &[u8]) -> Result<(Pubkey, u8)> {
        pda::escrow_address(seed, &self.config.escrow_program)
    }

    // ============================================================
    // Open
    // ============================================================

    /// Lock `amount_lamports` under the commitment of `secret`.
    ///
    /// The secret itself never leaves this process; only its SHA-256 hex
    /// digest goes on chain.
    pub fn open_escrow(&self, seed: &[u8], secret: &str, amount_lamports: u64) -> Result<String> {
        self.open_escrow_with_commitment(seed, &commitment::commit(secret), amount_lamports)
    }

    /// Lock `amount_lamports` under an externally produced commitment.
    ///
    /// Fails fast with `InvalidCommitmentFormat` before building any
    /// instruction. The program would reject a malformed commitment too,
    /// but only after a wasted round trip and fee. Opening a seed that
    /// already has an escrow tops up the locked amount (program semantics).
    pub fn open_escrow_with_commitment(
        &self,
        seed: &[u8],
        commitment: &str,
        amount_lamports: u64,
    ) -> Result<String> {
        if !commitment::validate_format(commitment) {
            return Err(EscrowError::InvalidCommitmentFormat);
        }

        let initializer = self.wallet.address();
        let (escrow, _) = self.escrow_address(seed)?;
        let data = instruction::encode_open(seed, commitment.as_bytes(), amount_lamports)?;
        let ix = instruction::open_instruction(
            &self.config.escrow_program,
            &OpenAccounts { initializer, escrow },
            data,
        );

        let signature = self.connector.submit_and_confirm(&[ix], &self.wallet)?;
        info!("opened escrow {escrow} with {amount_lamports} lamports, tx {signature}");
        Ok(signature)
    }

    // ============================================================
    // Claim
    // ============================================================

    /// Assemble a claim attempt with a fresh execution id (phase: Built).
    pub fn build_claim(
        &self,
        seed: &[u8],
        preimage: &[u8],
        receiver: &Pubkey,
        params: ClaimParams,
    ) -> Result<ClaimRequest> {
        ClaimRequest::build(
            &self.config,
            &self.wallet.address(),
            receiver,
            seed,
            preimage,
            params,
        )
    }

    /// Submit a built claim (phase: Built -> Submitted).
    ///
    /// A submission failure is surfaced verbatim and never retried here:
    /// the execution id inside the request is single-use, so the caller
    /// must build a fresh request before trying again.
    pub fn submit_claim(&self, request: ClaimRequest) -> Result<SubmittedClaim> {
        let signature = self
            .connector
            .submit_and_confirm(std::slice::from_ref(&request.instruction), &self.wallet)?;
        info!(
            "submitted claim on escrow {} with execution id {}, tx {signature}",
            request.escrow, request.execution_id
        );
        Ok(SubmittedClaim { request, signature })
    }

    /// Poll the escrow until this attempt settles (phase: Pending -> terminal).
    ///
    /// A bounded retry loop: the escrow is re-read every `poll.interval`
    /// until it shows `is_claimed`, or `poll.max_attempts` reads have gone
    /// by, which reports [`ClaimOutcome::Expired`]. A decode failure right
    /// after submission means the account is not yet in its settled shape
    /// and counts as still pending, not corruption.
    pub fn await_outcome(&self, claim: &SubmittedClaim, poll: &PollConfig) -> Result<ClaimOutcome> {
        let escrow_address = claim.request.escrow;
        for attempt in 1..=poll.max_attempts {
            if let Some(bytes) = self.connector.read_account(&escrow_address)? {
                match EscrowAccount::unpack(&bytes) {
                    Ok(escrow) => {
                        if let Some(outcome) = interpret_outcome(&escrow, &claim.request.receiver) {
                            match &outcome {
                                ClaimOutcome::Released { receiver } => {
                                    info!("escrow {escrow_address} released to {receiver}");
                                }
                                ClaimOutcome::Rejected { receiver } => {
                                    warn!(
                                        "escrow {escrow_address} claimed by a competing attempt \
                                         (receiver {receiver:?})"
                                    );
                                }
                                ClaimOutcome::Expired => {}
                            }
                            return Ok(outcome);
                        }
                        debug!(
                            "escrow {escrow_address} still unclaimed \
                             (poll {attempt}/{})",
                            poll.max_attempts
                        );
                    }
                    Err(EscrowError::TruncatedAccount { .. })
                    | Err(EscrowError::MalformedCommitment) => {
                        debug!("escrow {escrow_address} not yet in settled shape, still pending");
                    }
                    Err(err) => return Err(err),
                }
            } else {
                debug!("escrow {escrow_address} not yet visible (poll {attempt})");
            }

            if attempt < poll.max_attempts {
                thread::sleep(poll.interval);
            }
        }

        warn!("claim on escrow {escrow_address} did not settle within the poll window");
        Ok(ClaimOutcome::Expired)
    }

    /// Full claim flow: build, submit, and await settlement, crediting this
    /// client's own wallet.
    pub fn claim_escrow(
        &self,
        seed: &[u8],
        preimage: &[u8],
        params: ClaimParams,
        poll: &PollConfig,
    ) -> Result<ClaimOutcome> {
        let receiver = self.wallet.address();
        let request = self.build_claim(seed, preimage, &receiver, params)?;
        let submitted = self.submit_claim(request)?;
        self.await_outcome(&submitted, poll)
    }

    // ============================================================
    // Reads
    // ============================================================

    /// Fetch and decode the escrow account for `seed`.
    ///
    /// `AccountNotFound` is distinct from a decode error: the former means
    /// no escrow was ever opened (or it is not visible yet), the latter
    /// that the record exists but is not in the expected shape.
    pub fn fetch_escrow(&self, seed: &[u8]) -> Result<EscrowAccount> {
        let (address, _) = self.escrow_address(seed)?;
        let bytes = self
            .connector
            .read_account(&address)?
            .ok_or(EscrowError::AccountNotFound(address))?;
        EscrowAccount::unpack(&bytes)
    }

    /// Fetch the execution tracker for a claim attempt, to locate the proof
    /// execution account it is waiting on.
    pub fn fetch_execution_tracker(&self, execution_id: &ExecutionId) -> Result<ExecutionTracker> {
        let (address, _) = pda::tracker_address(execution_id, &self.config.escrow_program)?;
        let bytes = self
            .connector
            .read_account(&address)?
            .ok_or(EscrowError::AccountNotFound(address))?;
        ExecutionTracker::unpack(&bytes)
    }
}
