//! Failsafe passphrase generation.

/// Alphanumerics with the visually ambiguous characters removed
/// (`i l 1 o 0 I L O`), matching what the backend persists.
pub const CHARSET: &[u8] = b"abcdefghjkmnpqrstuvwxyzABCDEFGHJKMNPQRSTUVWXYZ23456789";

/// Length of a generated failsafe passphrase.
pub const GENERATED_LEN: usize = 8;

/// Generate a failsafe passphrase from the ambiguity-free charset.
///
/// Randomness comes from a v4 UUID (16 OS-random bytes, of which we use
/// the first [`GENERATED_LEN`]); the slight modulo bias is irrelevant
/// for a placeholder credential the user is told to replace.
pub fn generate() -> String {
    let raw = uuid::Uuid::new_v4();
    raw.as_bytes()
        .iter()
        .take(GENERATED_LEN)
        .map(|b| char::from(CHARSET[usize::from(*b) % CHARSET.len()]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_passphrase_uses_only_charset() {
        for _ in 0..64 {
            let pass = generate();
            assert_eq!(pass.len(), GENERATED_LEN);
            for c in pass.bytes() {
                assert!(CHARSET.contains(&c), "unexpected char {}", char::from(c));
            }
        }
    }

    #[test]
    fn charset_excludes_ambiguous_characters() {
        for c in [b'i', b'l', b'1', b'o', b'0', b'I', b'L', b'O'] {
            assert!(!CHARSET.contains(&c));
        }
    }

    #[test]
    fn generated_passphrase_is_valid_wpa2_length() {
        let pass = generate();
        assert!(crate::Credentials::validate_passphrase(&pass).is_ok());
    }
}
