//! Encryption, decryption and noise extraction (§4.4), grounded on
//! `original_source/core/bgv.py` (`encrypt`, `decrypt`, `decrypt_quad`).

use crate::error::{Error, Result};
use crate::keys::{PublicKey, SecretKey};
use crate::random::BgvRng;
use crate::ring::RingElement;
use crate::sampling::{sample_gaussian, sample_ternary};
use num_bigint_dig::BigInt;
use num_integer::Integer;
use num_traits::ToPrimitive;

/// A two-term ciphertext `(c0, c1)` at some current modulus (§3).
#[derive(Clone, Debug)]
pub struct Ciphertext {
    pub c0: RingElement,
    pub c1: RingElement,
}

/// A three-term ciphertext `(c0, c1, c2)` produced by multiplication before
/// relinearization (§4.4, §4.6).
#[derive(Clone, Debug)]
pub struct Ciphertext3 {
    pub c0: RingElement,
    pub c1: RingElement,
    pub c2: RingElement,
}

/// Encode plaintext integer coefficients (each in `[0, t)`) as a ring element
/// at the given modulus, ready to be masked by the RLWE instance.
pub fn encode(values: &[u32], modulus: BigInt, degree: usize) -> RingElement {
    let raw: Vec<BigInt> = values.iter().map(|&v| BigInt::from(v)).collect();
    RingElement::new(&raw, modulus, degree)
}

/// Encrypt `values` (integers in `[0, t)`) under `pk` at modulus `Q` (§4.4).
pub fn encrypt(
    rng: &mut BgvRng,
    pk: &PublicKey,
    t: u32,
    values: &[u32],
    degree: usize,
) -> Result<Ciphertext> {
    if values.len() != degree {
        return Err(Error::InvalidParameters {
            reason: format!(
                "expected {degree} plaintext coefficients, got {}",
                values.len()
            ),
        });
    }
    if let Some(&bad) = values.iter().find(|&&v| v >= t) {
        return Err(Error::InvalidParameters {
            reason: format!("plaintext coefficient {bad} out of range [0, {t})"),
        });
    }

    let q = pk.b.modulus().clone();
    let m = encode(values, q.clone(), degree);
    let u = sample_ternary(rng, q.clone(), degree);
    let e0 = sample_gaussian(rng, q.clone(), degree);
    let e1 = sample_gaussian(rng, q.clone(), degree);
    let t_big = BigInt::from(t);

    let c0 = &(&(&pk.b * &u) + &e0.scalar_mul(&t_big)) + &m;
    let c1 = &pk.neg_a * &u;
    let c1 = &c1 + &e1.scalar_mul(&t_big);

    Ok(Ciphertext { c0, c1 })
}

/// Reduce each coefficient of `d` modulo `t`, interpreted in `[0, t)`.
fn reduce_plaintext(d: &RingElement, t: u32) -> Vec<u32> {
    let t_big = BigInt::from(t);
    d.coeffs()
        .iter()
        .map(|c| {
            c.mod_floor(&t_big)
                .to_u32()
                .expect("reduced mod small t fits in u32")
        })
        .collect()
}

/// Linear decryption (§4.4): `d = c0 + c1*sk`; returns `(plaintext, noise)`.
pub fn decrypt(ct: &Ciphertext, sk: &SecretKey, t: u32) -> Result<(Vec<u32>, BigInt)> {
    let sk_view = sk.view_at(ct.c0.modulus().clone());
    let d = ct
        .c0
        .checked_add(&ct.c1.checked_mul(&sk_view)?)
        .map_err(|_| Error::DecryptFailure {
            reason: "ciphertext and secret key live in different rings".to_string(),
        })?;
    let noise = d.max_abs();
    Ok((reduce_plaintext(&d, t), noise))
}

/// Quadratic decryption (§4.4): `d = c0 + c1*sk + c2*sk^2`, used to verify
/// intermediate multiplication products pre-relinearization.
pub fn decrypt_quad(ct: &Ciphertext3, sk: &SecretKey, t: u32) -> Result<(Vec<u32>, BigInt)> {
    let sk_view = sk.view_at(ct.c0.modulus().clone());
    let sk2 = sk_view.checked_mul(&sk_view)?;
    let d = ct
        .c0
        .checked_add(&ct.c1.checked_mul(&sk_view)?)
        .and_then(|partial| partial.checked_add(&ct.c2.checked_mul(&sk2)?))
        .map_err(|_| Error::DecryptFailure {
            reason: "ciphertext and secret key live in different rings".to_string(),
        })?;
    let noise = d.max_abs();
    Ok((reduce_plaintext(&d, t), noise))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{PublicKey, SecretKey};

    #[test]
    fn round_trip_encrypt_decrypt() {
        let mut rng = BgvRng::seeded(11);
        let q = BigInt::from(1_000_000_007i64);
        let n = 8;
        let t = 7u32;
        let sk = SecretKey::generate(&mut rng, q.clone(), n);
        let pk = PublicKey::generate(&mut rng, &sk, t);
        let values = vec![1, 2, 3, 4, 5, 6, 0, 1];
        let ct = encrypt(&mut rng, &pk, t, &values, n).unwrap();
        let (plain, _noise) = decrypt(&ct, &sk, t).unwrap();
        assert_eq!(plain, values);
    }

    #[test]
    fn rejects_wrong_arity() {
        let mut rng = BgvRng::seeded(11);
        let q = BigInt::from(97);
        let sk = SecretKey::generate(&mut rng, q.clone(), 8);
        let pk = PublicKey::generate(&mut rng, &sk, 7);
        let err = encrypt(&mut rng, &pk, 7, &[1, 2, 3], 8).unwrap_err();
        assert!(matches!(err, Error::InvalidParameters { .. }));
    }

    #[test]
    fn rejects_out_of_range_plaintext() {
        let mut rng = BgvRng::seeded(11);
        let q = BigInt::from(1_000_003);
        let sk = SecretKey::generate(&mut rng, q.clone(), 4);
        let pk = PublicKey::generate(&mut rng, &sk, 7);
        let err = encrypt(&mut rng, &pk, 7, &[1, 2, 3, 7], 4).unwrap_err();
        assert!(matches!(err, Error::InvalidParameters { .. }));
    }
}
