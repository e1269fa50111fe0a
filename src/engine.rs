//! The operation engine (§4.7): named-ciphertext state, feasibility checks,
//! automatic modulus switching, and homomorphic add/multiply, grounded on
//! `original_source/crypto/operation_handler.py` (`OperationHandler`).

use crate::error::{BlockReason, Error, Result};
use crate::keys::{PublicKey, SecretKey};
use crate::modswitch;
use crate::params::Params;
use crate::policy::{dynamic_thresholds, measure, NoiseReport};
use crate::primitives::{decrypt, encrypt, Ciphertext, Ciphertext3};
use crate::random::BgvRng;
use crate::relin::{self, RelinKeySet};
use itertools::izip;
use log::{debug, info, warn};
use num_bigint_dig::BigInt;
use std::collections::HashMap;

const INPUT_NAMES: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// The supported homomorphic operations (§3, §4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Add,
    Mul,
}

impl std::fmt::Display for Op {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Op::Add => "+",
            Op::Mul => "*",
        })
    }
}

/// Outcome of an operation, recorded in `history` (§3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpStatus {
    Success,
    Blocked(BlockReason),
}

/// One entry of the engine's operation log (§3).
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub step: u32,
    pub left_name: String,
    pub right_name: String,
    pub op: Op,
    pub result_name: String,
    pub status: OpStatus,
    pub mult_depth: u32,
}

/// The non-boolean half of `check_feasibility`'s return value (§4.7).
#[derive(Debug, Clone)]
pub struct FeasibilityInfo {
    pub new_depth: u32,
    pub critical_operand: String,
    pub max_noise_len: u64,
    pub switching_threshold: u64,
    pub warning_threshold: u64,
    pub critical_threshold: u64,
}

/// A single warning surfaced by `check_feasibility` (§4.7).
#[derive(Debug, Clone)]
pub struct Warning {
    pub operand: String,
    pub noise_len: u64,
    pub threshold: u64,
}

/// Outcome of an `auto_switch` attempt (§4.7, §4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchAttempt {
    /// Already at `q`, or noise below the switching threshold: nothing to do.
    NotNeeded,
    /// Switched from `Q` to `q`; the ≥70% coefficient-agreement check passed.
    Applied,
    /// A switch was attempted but rejected by the acceptance check (§7,
    /// correctness failures); the ciphertext retains its pre-switch form.
    Rejected { noise_len: u64, threshold: u64 },
}

/// The BGV cryptographic core: a plain value type, never a process-global (§9).
pub struct Engine {
    params: Params,
    sk: SecretKey,
    pk: PublicKey,
    /// At most two cached key sets: one per modulus level (Q and q), per the
    /// "Key set validity" design note (§9).
    relin_keys: Vec<RelinKeySet>,
    encrypted: HashMap<String, Ciphertext>,
    originals: HashMap<String, Vec<u32>>,
    history: Vec<HistoryEntry>,
    next_input_index: usize,
    next_result_id: u32,
    rng: BgvRng,
}

impl Engine {
    /// Generate fresh keys for `params` and return a ready-to-use engine.
    /// Uses a process-wide cryptographically seeded RNG (§5).
    pub fn new(params: Params) -> Self {
        Self::with_rng(params, BgvRng::from_entropy())
    }

    /// Same as [`Engine::new`] but with an injected RNG — the deterministic
    /// hook used by tests and benchmarks (§10.4).
    pub fn with_rng(params: Params, mut rng: BgvRng) -> Self {
        let sk = SecretKey::generate(&mut rng, params.q_big.clone(), params.n);
        let pk = PublicKey::generate(&mut rng, &sk, params.t);
        info!(
            "generated keys: n={} t={} base={} Q_bits={} q_bits={}",
            params.n,
            params.t,
            params.base,
            params.q_big.bits(),
            params.q_small.bits()
        );
        Engine {
            params,
            sk,
            pk,
            relin_keys: Vec::new(),
            encrypted: HashMap::new(),
            originals: HashMap::new(),
            history: Vec::new(),
            next_input_index: 0,
            next_result_id: 1,
            rng,
        }
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn originals(&self) -> &HashMap<String, Vec<u32>> {
        &self.originals
    }

    /// Regenerate `sk`/`pk` for the same parameters, invalidating all
    /// ciphertexts and relin keys (§3, Lifecycles).
    pub fn regenerate_keys(&mut self) {
        let sk = SecretKey::generate(&mut self.rng, self.params.q_big.clone(), self.params.n);
        let pk = PublicKey::generate(&mut self.rng, &sk, self.params.t);
        self.sk = sk;
        self.pk = pk;
        self.reset();
    }

    /// Clear all engine state (§3, Lifecycles, §6 `reset()`). Keys are untouched.
    pub fn reset(&mut self) {
        self.encrypted.clear();
        self.originals.clear();
        self.history.clear();
        self.relin_keys.clear();
        self.next_input_index = 0;
        self.next_result_id = 1;
    }

    /// Encrypt `values` and store the result under the next unused uppercase
    /// letter (§3, §6). Fails if the 26 input slots are exhausted.
    pub fn encrypt(&mut self, values: &[u32]) -> Result<String> {
        if self.next_input_index >= INPUT_NAMES.len() {
            return Err(Error::InvalidParameters {
                reason: "no more input names available (A-Z exhausted)".to_string(),
            });
        }
        let ct = encrypt(&mut self.rng, &self.pk, self.params.t, values, self.params.n)?;
        let name = INPUT_NAMES[self.next_input_index..self.next_input_index + 1].to_string();
        self.next_input_index += 1;
        self.encrypted.insert(name.clone(), ct);
        self.originals.insert(name.clone(), values.to_vec());
        debug!("encrypted {name} = {values:?}");
        Ok(name)
    }

    fn get(&self, name: &str) -> Result<&Ciphertext> {
        self.encrypted.get(name).ok_or_else(|| Error::UnknownName {
            name: name.to_string(),
        })
    }

    /// Decrypt `name` with the secret key retargeted to its current modulus (§6).
    pub fn decrypt(&self, name: &str) -> Result<(Vec<u32>, BigInt)> {
        let ct = self.get(name)?;
        decrypt(ct, &self.sk, self.params.t)
    }

    /// Noise diagnostics for `name` (§6, §4.8).
    pub fn measure_noise(&self, name: &str) -> Result<NoiseReport> {
        let ct = self.get(name)?;
        measure(ct, &self.sk, self.params.t)
    }

    fn depth_of(&self, name: &str) -> u32 {
        if self.originals.contains_key(name) {
            return 0;
        }
        match self.history.iter().find(|h| h.result_name == name) {
            Some(h) => h.mult_depth,
            None => 0,
        }
    }

    /// Pre-operation feasibility check (§4.7, §4.8): inspects both operands'
    /// noise at the worse case and decides admit/warn/block.
    pub fn check_feasibility(
        &self,
        left: &str,
        right: &str,
        op: Op,
    ) -> Result<(bool, Vec<Warning>, FeasibilityInfo)> {
        let left_depth = self.depth_of(left);
        let right_depth = self.depth_of(right);
        let new_depth = match op {
            Op::Add => left_depth.max(right_depth),
            Op::Mul => left_depth.max(right_depth) + 1,
        };

        let mut max_noise_len = 0u64;
        let mut critical_operand = left.to_string();
        let mut max_allowed_len = 0u64;
        for operand in [left, right] {
            let report = self.measure_noise(operand)?;
            if report.noise_len > max_noise_len {
                max_noise_len = report.noise_len;
                critical_operand = operand.to_string();
                max_allowed_len = report.max_len;
            }
        }

        let thresholds = dynamic_thresholds(max_allowed_len);
        let mut warnings = Vec::new();
        let mut can_perform = true;

        if max_noise_len > thresholds.critical {
            can_perform = false;
            warn!(
                "operation blocked pre-check: {critical_operand} noise_len={max_noise_len} \
                 > critical={} (max_len={max_allowed_len})",
                thresholds.critical
            );
        } else if max_noise_len > thresholds.warning {
            warnings.push(Warning {
                operand: critical_operand.clone(),
                noise_len: max_noise_len,
                threshold: thresholds.warning,
            });
        }

        Ok((
            can_perform,
            warnings,
            FeasibilityInfo {
                new_depth,
                critical_operand,
                max_noise_len,
                switching_threshold: thresholds.switching,
                warning_threshold: thresholds.warning,
                critical_threshold: thresholds.critical,
            },
        ))
    }

    /// Switch `name`'s stored ciphertext from `Q` down to `q` if its noise
    /// exceeds the switching threshold; a no-op if already at `q` (§4.7).
    pub fn auto_switch(&mut self, name: &str) -> Result<SwitchAttempt> {
        let ct = self.get(name)?.clone();
        if ct.c0.modulus() != &self.params.q_big {
            return Ok(SwitchAttempt::NotNeeded); // already switched (§4.8)
        }

        let report = measure(&ct, &self.sk, self.params.t)?;
        let thresholds = dynamic_thresholds(report.max_len);
        if report.noise_len <= thresholds.switching {
            return Ok(SwitchAttempt::NotNeeded);
        }
        if report.noise_len > thresholds.critical {
            warn!("{name}: noise above critical, not attempting switch");
            return Ok(SwitchAttempt::NotNeeded);
        }

        let t_big = BigInt::from(self.params.t);
        let out0 = modswitch::switch(&ct.c0, self.params.q_small.clone(), &self.params.delta, &t_big);
        let out1 = modswitch::switch(&ct.c1, self.params.q_small.clone(), &self.params.delta, &t_big);
        let switched = Ciphertext {
            c0: out0.result,
            c1: out1.result,
        };

        // Switching admission (§4.8): compare pre- and post-switch decryptions.
        let (pre_plain, _) = decrypt(&ct, &self.sk, self.params.t)?;
        let sk_q = SecretKey {
            sk: self.sk.view_at(self.params.q_small.clone()),
        };
        let (post_plain, _) = decrypt(&switched, &sk_q, self.params.t)?;
        let matches = izip!(&pre_plain, &post_plain).filter(|(a, b)| a == b).count();
        let match_ratio = matches as f64 / pre_plain.len() as f64;

        if match_ratio >= 0.70 {
            info!(
                "{name}: switched Q -> q (noise_len {} -> match_ratio {:.1}%)",
                report.noise_len,
                match_ratio * 100.0
            );
            self.encrypted.insert(name.to_string(), switched);
            Ok(SwitchAttempt::Applied)
        } else {
            warn!("{name}: switch rejected, only {:.1}% coefficients agreed", match_ratio * 100.0);
            Ok(SwitchAttempt::Rejected {
                noise_len: report.noise_len,
                threshold: thresholds.switching,
            })
        }
    }

    fn relin_keys_for(&mut self, modulus: &BigInt) -> &RelinKeySet {
        if let Some(pos) = self.relin_keys.iter().position(|k| &k.modulus == modulus) {
            return &self.relin_keys[pos];
        }
        let sk_view = SecretKey {
            sk: self.sk.view_at(modulus.clone()),
        };
        let fresh = relin::generate(&mut self.rng, &sk_view, self.params.base, self.params.t);
        info!("generated relinearization keys at {}-bit modulus", modulus.bits());
        // Cache at most two sets (§9): evict the oldest when adding a third.
        if self.relin_keys.len() >= 2 {
            self.relin_keys.remove(0);
        }
        self.relin_keys.push(fresh);
        self.relin_keys.last().unwrap()
    }

    /// Perform `left op right`, auto-switching a mismatched-modulus operand
    /// first, relinearizing multiplications, and recording history (§4.7).
    pub fn perform(&mut self, left: &str, op: Op, right: &str) -> Result<String> {
        let (can_perform, _warnings, info) = self.check_feasibility(left, right, op)?;
        let step = self.history.len() as u32 + 1;

        if !can_perform {
            self.history.push(HistoryEntry {
                step,
                left_name: left.to_string(),
                right_name: right.to_string(),
                op,
                result_name: String::new(),
                status: OpStatus::Blocked(BlockReason::CriticalPre),
                mult_depth: info.new_depth,
            });
            return Err(Error::OperationBlocked {
                reason: BlockReason::CriticalPre,
                operand: info.critical_operand,
                noise_len: info.max_noise_len,
                threshold: info.critical_threshold,
            });
        }

        // Bring mismatched-modulus operands into alignment by switching the
        // Q-side ciphertext down, per §4.7 "Addition"/"Multiplication". A
        // rejected switch (§7, correctness failures) blocks the operation
        // rather than silently leaving the operands at different moduli.
        for operand in [left, right] {
            if let SwitchAttempt::Rejected { noise_len, threshold } = self.auto_switch(operand)? {
                self.history.push(HistoryEntry {
                    step,
                    left_name: left.to_string(),
                    right_name: right.to_string(),
                    op,
                    result_name: String::new(),
                    status: OpStatus::Blocked(BlockReason::SwitchFailed),
                    mult_depth: info.new_depth,
                });
                return Err(Error::OperationBlocked {
                    reason: BlockReason::SwitchFailed,
                    operand: operand.to_string(),
                    noise_len,
                    threshold,
                });
            }
        }

        let left_ct = self.get(left)?.clone();
        let right_ct = self.get(right)?.clone();
        if left_ct.c0.modulus() != right_ct.c0.modulus() {
            return Err(Error::RingMismatch);
        }

        let result = match op {
            Op::Add => left_ct
                .c0
                .checked_add(&right_ct.c0)
                .and_then(|c0| Ok(Ciphertext { c0, c1: left_ct.c1.checked_add(&right_ct.c1)? }))?,
            Op::Mul => {
                let c0 = left_ct.c0.checked_mul(&right_ct.c0)?;
                let c1 = left_ct
                    .c0
                    .checked_mul(&right_ct.c1)?
                    .checked_add(&left_ct.c1.checked_mul(&right_ct.c0)?)?;
                let c2 = left_ct.c1.checked_mul(&right_ct.c1)?;
                let product3 = Ciphertext3 { c0, c1, c2 };
                let modulus = product3.c0.modulus().clone();
                let keys = self.relin_keys_for(&modulus);
                relin::apply(&product3, keys).map_err(|e| {
                    warn!("relinearization failed: {e}");
                    e
                })?
            }
        };

        let report = measure(&result, &self.sk, self.params.t)?;
        let thresholds = dynamic_thresholds(report.max_len);
        if report.noise_len > thresholds.critical {
            self.history.push(HistoryEntry {
                step,
                left_name: left.to_string(),
                right_name: right.to_string(),
                op,
                result_name: String::new(),
                status: OpStatus::Blocked(BlockReason::CriticalPost),
                mult_depth: info.new_depth,
            });
            return Err(Error::OperationBlocked {
                reason: BlockReason::CriticalPost,
                operand: "result".to_string(),
                noise_len: report.noise_len,
                threshold: thresholds.critical,
            });
        }

        let name = format!("R{}", self.next_result_id);
        self.next_result_id += 1;
        self.encrypted.insert(name.clone(), result);
        self.history.push(HistoryEntry {
            step,
            left_name: left.to_string(),
            right_name: right.to_string(),
            op,
            result_name: name.clone(),
            status: OpStatus::Success,
            mult_depth: info.new_depth,
        });
        debug!("{name} = {left} {op} {right} (depth={})", info.new_depth);
        Ok(name)
    }

    /// Recompute the plaintext `name` should hold by walking `history` over
    /// `Z_t[X]/(X^n+1)`, independent of ciphertext noise (§4.9).
    pub fn expected_value(&self, name: &str) -> Result<Vec<u32>> {
        crate::oracle::expected_value(name, self.params.t, &self.originals, &self.history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::build_params;

    fn test_engine(lambda: u32, t: u32, n: usize, base: u32, seed: u64) -> Engine {
        let params = build_params(lambda, t, n, base).unwrap();
        Engine::with_rng(params, BgvRng::seeded(seed))
    }

    #[test]
    fn e1_addition_doubles_plaintext_mod_t() {
        let mut e = test_engine(128, 7, 16, 5, 1);
        let values = vec![1, 2, 3, 4, 5, 6, 0, 1, 2, 3, 4, 5, 6, 0, 1, 2];
        let a = e.encrypt(&values).unwrap();
        let r = e.perform(&a, Op::Add, &a).unwrap();
        let (plain, _) = e.decrypt(&r).unwrap();
        let expected: Vec<u32> = values.iter().map(|v| (2 * v) % 7).collect();
        assert_eq!(plain, expected);
    }

    #[test]
    fn e3_small_params_addition() {
        let mut e = test_engine(80, 2, 8, 3, 2);
        let x = e.encrypt(&[1, 0, 1, 0, 1, 0, 1, 0]).unwrap();
        let y = e.encrypt(&[0, 1, 0, 1, 0, 1, 0, 1]).unwrap();
        let r = e.perform(&x, Op::Add, &y).unwrap();
        let (plain, _) = e.decrypt(&r).unwrap();
        assert_eq!(plain, vec![1, 1, 1, 1, 1, 1, 1, 1]);
    }

    #[test]
    fn unknown_name_is_rejected() {
        let e = test_engine(80, 7, 8, 3, 3);
        assert!(matches!(
            e.decrypt("Z"),
            Err(Error::UnknownName { .. })
        ));
    }

    #[test]
    fn reset_clears_all_state() {
        let mut e = test_engine(80, 7, 8, 3, 4);
        let a = e.encrypt(&[1, 2, 3, 4, 5, 6, 0, 1]).unwrap();
        e.perform(&a, Op::Add, &a).unwrap();
        e.reset();
        assert!(e.history().is_empty());
        assert!(e.originals().is_empty());
        assert!(matches!(e.decrypt(&a), Err(Error::UnknownName { .. })));
    }

    #[test]
    fn oracle_matches_decryption_for_additions() {
        let mut e = test_engine(128, 7, 16, 5, 5);
        let values = vec![1, 2, 3, 4, 5, 6, 0, 1, 2, 3, 4, 5, 6, 0, 1, 2];
        let a = e.encrypt(&values).unwrap();
        let r = e.perform(&a, Op::Add, &a).unwrap();
        let (plain, _) = e.decrypt(&r).unwrap();
        assert_eq!(plain, e.expected_value(&r).unwrap());
    }
}
