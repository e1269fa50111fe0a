//! The three-tier noise policy (§4.8): dynamic thresholds derived from a
//! ciphertext's current modulus, and the noise report shape surfaced through
//! `measure_noise` (§6). Grounded on `original_source/crypto/noise_management.py`
//! (`check_noise_level`, `calculate_switching_threshold_from_max_length`) and
//! `original_source/crypto/operation_handler.py` (`calculate_dynamic_thresholds`).

use crate::bigint::decimal_len;
use crate::keys::SecretKey;
use crate::primitives::{decrypt, Ciphertext};
use num_bigint_dig::BigInt;

/// Noise figures for a single ciphertext, exposed via `Engine::measure_noise` (§6).
#[derive(Debug, Clone)]
pub struct NoiseReport {
    pub noise: BigInt,
    pub max_noise: BigInt,
    pub noise_len: u64,
    pub max_len: u64,
    pub percentage: f64,
}

/// The three dynamic thresholds derived from a modulus's `max_len` (§4.8).
#[derive(Debug, Clone, Copy)]
pub struct Thresholds {
    pub switching: u64,
    pub warning: u64,
    pub critical: u64,
}

/// Compute the three dynamic thresholds from a ciphertext's `max_len` (§4.8).
pub fn dynamic_thresholds(max_len: u64) -> Thresholds {
    let switching = ((max_len as f64) * 0.63).floor() as u64;
    let switching = switching.max(1);
    let warning = (((max_len as f64) * 0.75).floor() as u64).max(switching + 3);
    let critical = (((max_len as f64) * 0.85).floor() as u64).max(warning + 3);
    Thresholds {
        switching,
        warning,
        critical,
    }
}

/// Decrypt `ct` with `sk` (retargeted to `ct`'s modulus) and compute its
/// noise report (§4.8). Never fails on noise-too-high — decryption itself
/// always succeeds; `noise` is purely diagnostic.
pub fn measure(ct: &Ciphertext, sk: &SecretKey, t: u32) -> crate::error::Result<NoiseReport> {
    let (_plain, noise) = decrypt(ct, sk, t)?;
    let modulus = ct.c0.modulus().clone();
    let max_noise = &modulus / 2;
    let noise_len = decimal_len(&noise);
    let max_len = decimal_len(&max_noise);
    let percentage = if max_noise > BigInt::from(0) {
        // Both operands fit comfortably in f64 for any parameter set this
        // crate targets (bounded by lambda <= 512, well under f64's range).
        noise_as_f64(&noise) / noise_as_f64(&max_noise) * 100.0
    } else {
        100.0
    };
    Ok(NoiseReport {
        noise,
        max_noise,
        noise_len,
        max_len,
        percentage,
    })
}

fn noise_as_f64(x: &BigInt) -> f64 {
    use num_traits::ToPrimitive;
    x.to_f64().unwrap_or(f64::INFINITY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_are_ordered_and_spaced() {
        let th = dynamic_thresholds(20);
        assert!(th.switching < th.warning);
        assert!(th.warning < th.critical);
        assert!(th.warning >= th.switching + 3);
        assert!(th.critical >= th.warning + 3);
    }

    #[test]
    fn switching_threshold_is_at_least_one() {
        let th = dynamic_thresholds(0);
        assert_eq!(th.switching, 1);
    }
}
