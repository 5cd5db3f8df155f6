//! Password hashing with scrypt.
//!
//! Stored form is `salt:hash`: 16 random bytes hex-encoded as the salt (the
//! hex text itself is fed to the KDF), and the 64-byte derived key
//! hex-encoded.

use rand_core::{OsRng, RngCore};
use scrypt::{scrypt, Params};
use subtle::ConstantTimeEq;

use crate::error::AppError;

const SALT_LEN: usize = 16;
const KEY_LEN: usize = 64;

// N = 2^14, r = 8, p = 1
const LOG_N: u8 = 14;
const BLOCK_SIZE: u32 = 8;
const PARALLELISM: u32 = 1;

fn derive_key(password: &str, salt: &str) -> Result<[u8; KEY_LEN], AppError> {
    let params = Params::new(LOG_N, BLOCK_SIZE, PARALLELISM, KEY_LEN)
        .map_err(|e| AppError::Hashing(e.to_string()))?;
    let mut key = [0u8; KEY_LEN];
    scrypt(password.as_bytes(), salt.as_bytes(), &params, &mut key)
        .map_err(|e| AppError::Hashing(e.to_string()))?;
    Ok(key)
}

/// Hash a password with a fresh random salt, returning `salt:hash`
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    let salt = hex::encode(salt);

    let key = derive_key(password, &salt)?;
    Ok(format!("{}:{}", salt, hex::encode(key)))
}

/// Verify an attempt against a stored `salt:hash`.
///
/// Malformed stored values are an error, not a mismatch.
pub fn verify_password(stored: &str, attempt: &str) -> Result<bool, AppError> {
    let (salt, expected) = stored
        .split_once(':')
        .ok_or(AppError::InvalidCredentialFormat)?;
    if salt.is_empty() {
        return Err(AppError::InvalidCredentialFormat);
    }
    let expected = hex::decode(expected).map_err(|_| AppError::InvalidCredentialFormat)?;
    if expected.len() != KEY_LEN {
        return Err(AppError::InvalidCredentialFormat);
    }

    let key = derive_key(attempt, salt)?;
    Ok(key[..].ct_eq(&expected[..]).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify() {
        let stored = hash_password("S3cret!").unwrap();
        assert!(verify_password(&stored, "S3cret!").unwrap());
    }

    #[test]
    fn test_wrong_password_fails() {
        let stored = hash_password("S3cret!").unwrap();
        assert!(!verify_password(&stored, "s3cret!").unwrap());
        assert!(!verify_password(&stored, "").unwrap());
    }

    #[test]
    fn test_stored_format() {
        let stored = hash_password("pw").unwrap();
        let (salt, hash) = stored.split_once(':').unwrap();
        assert_eq!(salt.len(), SALT_LEN * 2);
        assert_eq!(hash.len(), KEY_LEN * 2);
        assert!(stored.chars().all(|c| c == ':' || c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_salts_are_unique() {
        let a = hash_password("same").unwrap();
        let b = hash_password("same").unwrap();
        assert_ne!(a, b);
        assert!(verify_password(&a, "same").unwrap());
        assert!(verify_password(&b, "same").unwrap());
    }

    #[test]
    fn test_malformed_stored_values() {
        for stored in ["no-separator", ":abcd", "salt:not-hex", "salt:abcd"] {
            assert!(
                matches!(
                    verify_password(stored, "pw"),
                    Err(AppError::InvalidCredentialFormat)
                ),
                "{stored} should be rejected"
            );
        }
    }
}
