use thiserror::Error;

/// Reason a pending operation was refused by the noise policy (§4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason {
    /// Pre-operation check: an operand's noise already exceeds the critical threshold.
    CriticalPre,
    /// Post-operation check: the freshly computed result exceeds the critical threshold.
    CriticalPost,
    /// Modulus switching was attempted but the acceptance heuristic rejected it.
    SwitchFailed,
}

impl std::fmt::Display for BlockReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BlockReason::CriticalPre => "critical_pre",
            BlockReason::CriticalPost => "critical_post",
            BlockReason::SwitchFailed => "switch_failed",
        };
        f.write_str(s)
    }
}

/// Every error kind surfaced across the public API (§6, §7).
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid parameters: {reason}")]
    InvalidParameters { reason: String },

    /// Surfaced by operations that need key material when none has been
    /// generated. `Engine::new`/`with_rng` always call `generate_keys`
    /// immediately, so this variant is unreachable through those
    /// constructors; it exists for the `generate_keys` entry point §6 lists
    /// as distinct from parameter construction, and for any future
    /// constructor that defers key generation.
    #[error("no keys have been generated yet")]
    NoKeys,

    #[error("unknown ciphertext name: {name}")]
    UnknownName { name: String },

    #[error("ring mismatch: operands live in different rings (q or n differ)")]
    RingMismatch,

    #[error("operation blocked ({reason}): {operand} noise_len={noise_len} threshold={threshold}")]
    OperationBlocked {
        reason: BlockReason,
        operand: String,
        noise_len: u64,
        threshold: u64,
    },

    #[error("relinearization failed: {reason}")]
    RelinFailure { reason: String },

    #[error("decryption failure: {reason}")]
    DecryptFailure { reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
