//! Per-build secret generation
//!
//! Every qualifying build gets a fresh key, generated before the first
//! engine call and never reused. The key is a random-length slice of a
//! 64-character pool built from two v4 UUIDs, so its length varies from
//! build to build and its content carries the UUIDs' entropy.

use rand::{thread_rng, Rng};
use uuid::Uuid;

/// Lowest cut point into the key pool
pub const KEY_CUT_MIN: usize = 4;
/// Highest cut point into the key pool
pub const KEY_CUT_MAX: usize = 36;

/// Generate a single-use per-build key
///
/// The pool is the concatenation of two freshly generated UUIDs in simple
/// form (64 hex characters); the key is the pool sliced from a random index
/// in [`KEY_CUT_MIN`]..=[`KEY_CUT_MAX`] to the end, giving lengths between
/// 28 and 60 characters.
pub fn generate_key() -> String {
    let pool = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
    let cut = thread_rng().gen_range(KEY_CUT_MIN..=KEY_CUT_MAX);
    pool[cut..].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const POOL_LEN: usize = 64;

    #[test]
    fn test_key_length_bounds() {
        for _ in 0..1_000 {
            let key = generate_key();
            assert!(key.len() >= POOL_LEN - KEY_CUT_MAX, "key too short: {}", key.len());
            assert!(key.len() <= POOL_LEN - KEY_CUT_MIN, "key too long: {}", key.len());
        }
    }

    #[test]
    fn test_keys_are_hex() {
        let key = generate_key();
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_no_collisions_in_batch() {
        let mut seen = HashSet::new();
        for _ in 0..10_000 {
            assert!(seen.insert(generate_key()), "duplicate key generated");
        }
    }
}
