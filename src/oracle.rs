//! Expected-value oracle (§4.9): recomputes the plaintext a result *should*
//! hold, by walking the engine's operation history over `Z_t[X]/(X^n+1)`,
//! entirely independent of ciphertext noise. Used by tests and by
//! `Engine::decrypt_with_oracle`-style verification.

use crate::engine::{HistoryEntry, Op};
use crate::error::{Error, Result};
use itertools::izip;
use num_bigint_dig::BigInt;
use num_integer::Integer;

/// Ring multiplication of two plaintext coefficient vectors over the
/// integers, reduced mod `X^n+1` then mod `t` (§4.9).
fn plaintext_mul(a: &[u32], b: &[u32], t: u32) -> Vec<u32> {
    let n = a.len();
    let mut raw = vec![BigInt::from(0); 2 * n - 1];
    for (i, &ai) in a.iter().enumerate() {
        if ai == 0 {
            continue;
        }
        for (j, &bj) in b.iter().enumerate() {
            raw[i + j] += BigInt::from(ai) * BigInt::from(bj);
        }
    }
    let mut folded = vec![BigInt::from(0); n];
    for (i, c) in raw.into_iter().enumerate() {
        let block = i / n;
        let slot = i % n;
        if block % 2 == 0 {
            folded[slot] += c;
        } else {
            folded[slot] -= c;
        }
    }
    let t_big = BigInt::from(t);
    folded
        .into_iter()
        .map(|c| {
            use num_traits::ToPrimitive;
            c.mod_floor(&t_big).to_u32().expect("reduced mod small t")
        })
        .collect()
}

fn plaintext_add(a: &[u32], b: &[u32], t: u32) -> Vec<u32> {
    izip!(a, b).map(|(x, y)| (x + y) % t).collect()
}

/// Recursively compute the expected plaintext for `name`, using `originals`
/// for directly-encrypted inputs and `history` to unwind operation results.
pub fn expected_value(
    name: &str,
    t: u32,
    originals: &std::collections::HashMap<String, Vec<u32>>,
    history: &[HistoryEntry],
) -> Result<Vec<u32>> {
    if let Some(v) = originals.get(name) {
        return Ok(v.clone());
    }
    let entry = history
        .iter()
        .find(|h| h.result_name == name)
        .ok_or_else(|| Error::UnknownName {
            name: name.to_string(),
        })?;
    let left = expected_value(&entry.left_name, t, originals, history)?;
    let right = expected_value(&entry.right_name, t, originals, history)?;
    Ok(match entry.op {
        Op::Add => plaintext_add(&left, &right, t),
        Op::Mul => plaintext_mul(&left, &right, t),
    })
}
