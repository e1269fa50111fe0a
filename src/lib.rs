//! Leveled BGV homomorphic encryption core: ring arithmetic over
//! `Z_q[X]/(X^n+1)`, key generation, encryption and decryption, adaptive
//! modulus switching, relinearization, and an operation engine that tracks
//! named ciphertexts and their noise growth across a session.
//!
//! The crate has no notion of a global "current ring" — every [`ring::RingElement`]
//! carries its own modulus and degree, and mismatched operands are rejected at
//! the type boundary rather than silently coerced. [`engine::Engine`] is the
//! main entry point: it owns key material, assigns names to encrypted values,
//! and enforces the noise policy described in its module docs before and
//! after every homomorphic operation.

pub mod bigint;
pub mod engine;
pub mod error;
pub mod keys;
pub mod modswitch;
pub mod oracle;
pub mod params;
pub mod policy;
pub mod primitives;
pub mod random;
pub mod relin;
pub mod ring;
pub mod sampling;

pub use engine::{Engine, HistoryEntry, Op, OpStatus};
pub use error::{Error, Result};
pub use params::{build_params, Params};
pub use primitives::{Ciphertext, Ciphertext3};
pub use random::BgvRng;
