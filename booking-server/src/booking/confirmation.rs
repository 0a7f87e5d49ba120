//! Confirmation code generation
//!
//! Human-readable 6-character codes. The alphabet drops visually
//! ambiguous characters (I, O, 0, 1); collisions are resolved by the
//! ledger retrying with a fresh code against the unique index.

use rand::Rng;

/// 32 symbols, no I, O, 0, 1
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

pub const CODE_LENGTH: usize = 6;

/// Generate a random confirmation code
pub fn generate_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_LENGTH)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_use_only_the_unambiguous_alphabet() {
        for _ in 0..200 {
            let code = generate_code();
            assert_eq!(code.len(), CODE_LENGTH);
            assert!(
                code.bytes().all(|b| CODE_ALPHABET.contains(&b)),
                "unexpected character in {code}"
            );
        }
    }

    #[test]
    fn ambiguous_characters_are_excluded() {
        for banned in [b'I', b'O', b'0', b'1'] {
            assert!(!CODE_ALPHABET.contains(&banned));
        }
        assert_eq!(CODE_ALPHABET.len(), 32);
    }
}
