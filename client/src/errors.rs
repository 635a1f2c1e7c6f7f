use anchor_lang::solana_program::pubkey::Pubkey;
use thiserror::Error;

/// Errors surfaced by the escrow client.
///
/// Every failure is a value returned to the caller. An absent receiver or an
/// unclaimed flag is ordinary data, never an error. Submission failures are
/// not retried internally: each execution id is single-use, so retry policy
/// belongs to the caller.
#[derive(Debug, Error)]
pub enum EscrowError {
    /// The commitment string does not match `^[0-9a-fA-F]{64}$`.
    #[error("commitment must be exactly 64 hex characters")]
    InvalidCommitmentFormat,

    /// An instruction field does not fit its length prefix.
    #[error("{field} is {len} bytes, maximum is {max}")]
    FieldTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    /// The caller supplied an execution id longer than the fixed 16-byte slot.
    #[error("execution id is {0} bytes, maximum is 16")]
    ExecutionIdTooLong(usize),

    /// No valid bump was found in the 255..=0 probe range.
    #[error("no valid bump seed found for program address derivation")]
    DerivationExhausted,

    /// The ledger rejected the transaction, or submission failed in transit.
    #[error("transaction submission failed: {0}")]
    SubmissionFailed(String),

    /// The account does not exist on the ledger.
    #[error("account {0} does not exist")]
    AccountNotFound(Pubkey),

    /// Persisted account data is shorter than its fixed layout.
    #[error("account data is {len} bytes, expected at least {expected}")]
    TruncatedAccount { len: usize, expected: usize },

    /// The commitment slot of a persisted escrow is not hex after trimming.
    #[error("stored commitment is not valid hex")]
    MalformedCommitment,

    /// A program id string failed to parse as a base58 address.
    #[error("invalid program id: {0}")]
    InvalidProgramId(String),

    /// The ledger connector failed to read an account.
    #[error("ledger read failed: {0}")]
    ConnectorFailed(String),
}

pub type Result<T> = core::result::Result<T, EscrowError>;
