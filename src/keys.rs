//! Key generation (§4.4): the secret key and its matching public key,
//! grounded on `original_source/core/bgv.py` (`gen_secret_key`, `gen_public_key`).

use crate::random::BgvRng;
use crate::ring::RingElement;
use crate::sampling::{sample_gaussian, sample_ternary, sample_uniform};
use num_bigint_dig::BigInt;

/// Ternary secret key, stored at the large modulus `Q`; a view at modulus
/// `q` is derived on demand via [`RingElement::with_modulus`] (§4.1).
#[derive(Clone, Debug)]
pub struct SecretKey {
    pub sk: RingElement,
}

impl SecretKey {
    pub fn generate(rng: &mut BgvRng, q_big: BigInt, degree: usize) -> Self {
        SecretKey {
            sk: sample_ternary(rng, q_big, degree),
        }
    }

    /// `sk` re-centered under a different coefficient modulus (e.g. `q`
    /// after a downward modulus switch).
    pub fn view_at(&self, modulus: BigInt) -> RingElement {
        self.sk.with_modulus(modulus)
    }
}

/// An RLWE public key `(b, -a)` satisfying `b = a*sk + t*e` (§3).
#[derive(Clone, Debug)]
pub struct PublicKey {
    pub b: RingElement,
    pub neg_a: RingElement,
}

impl PublicKey {
    /// Generate `(b, -a)` under `sk` at the modulus `sk.sk` currently lives at.
    pub fn generate(rng: &mut BgvRng, sk: &SecretKey, t: u32) -> Self {
        let q = sk.sk.modulus().clone();
        let n = sk.sk.degree();
        let a = sample_uniform(rng, q.clone(), n);
        let e = sample_gaussian(rng, q.clone(), n);
        let b = &(&a * &sk.sk) + &e.scalar_mul(&BigInt::from(t));
        PublicKey { b, neg_a: -a }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_key_satisfies_rlwe_relation_up_to_noise() {
        let mut rng = BgvRng::seeded(3);
        let q = BigInt::from(1_000_003);
        let sk = SecretKey::generate(&mut rng, q.clone(), 8);
        let pk = PublicKey::generate(&mut rng, &sk, 7);
        // b - a*sk should be small (== t*e).
        let a = -pk.neg_a.clone();
        let diff = pk.b.checked_sub(&a.checked_mul(&sk.sk).unwrap()).unwrap();
        let bound = BigInt::from(7 * 50); // generous: t * (a few sigma)
        assert!(diff.max_abs() < bound);
    }
}
