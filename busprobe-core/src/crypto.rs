// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! AES-256-GCM sealing of message payloads.
//!
//! Sealed layout: `nonce[12] || ciphertext || tag[16]`.
//! A fresh random nonce is drawn on every call.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use rand::RngCore;

use crate::error::CryptoError;
use crate::types::KEY_LEN;

/// AES-GCM nonce length.
pub const NONCE_LEN: usize = 12;

/// AES-GCM authentication tag length.
pub const TAG_LEN: usize = 16;

/// AES-256-GCM cipher bound to one shared secret.
#[derive(Clone)]
pub struct Cipher {
    inner: Aes256Gcm,
}

impl Cipher {
    /// Build a cipher. Fails unless `key` is exactly 32 bytes.
    pub fn new(key: &[u8]) -> Result<Self, CryptoError> {
        if key.len() != KEY_LEN {
            return Err(CryptoError::InvalidKeyLength {
                expected: KEY_LEN,
                actual: key.len(),
            });
        }
        let inner = Aes256Gcm::new_from_slice(key).map_err(|_| CryptoError::InvalidKeyLength {
            expected: KEY_LEN,
            actual: key.len(),
        })?;
        Ok(Self { inner })
    }

    /// Seal `plaintext`, prefixing the random nonce.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let mut nonce = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce);

        let sealed = self
            .inner
            .encrypt(Nonce::from_slice(&nonce), plaintext)
            .map_err(|_| CryptoError::Encrypt)?;

        let mut out = Vec::with_capacity(NONCE_LEN + sealed.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&sealed);
        Ok(out)
    }

    /// Open a buffer produced by [`Cipher::encrypt`].
    pub fn decrypt(&self, sealed: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if sealed.len() < NONCE_LEN + TAG_LEN {
            return Err(CryptoError::Truncated {
                len: sealed.len(),
                min: NONCE_LEN + TAG_LEN,
            });
        }

        let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
        self.inner
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| CryptoError::Decrypt)
    }
}

impl std::fmt::Debug for Cipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Cipher(AES-256-GCM)")
    }
}

/// One-shot encrypt with a raw key.
pub fn encrypt(plaintext: &[u8], key: &[u8]) -> Result<Vec<u8>, CryptoError> {
    Cipher::new(key)?.encrypt(plaintext)
}

/// One-shot decrypt with a raw key.
pub fn decrypt(sealed: &[u8], key: &[u8]) -> Result<Vec<u8>, CryptoError> {
    Cipher::new(key)?.decrypt(sealed)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &[u8] = b"ThisIsMy32BytesKeyForTestingFine";

    #[test]
    fn test_round_trip() {
        let plaintext = b"This is the test string that is the bulk of our message";
        let sealed = encrypt(plaintext, KEY).unwrap();
        assert_eq!(sealed.len(), NONCE_LEN + plaintext.len() + TAG_LEN);
        assert_eq!(decrypt(&sealed, KEY).unwrap(), plaintext);
    }

    #[test]
    fn test_fresh_nonce_per_call() {
        let cipher = Cipher::new(KEY).unwrap();
        let a = cipher.encrypt(b"same").unwrap();
        let b = cipher.encrypt(b"same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_invalid_key_length() {
        for len in [0, 16, 24, 31, 33] {
            let key = vec![7u8; len];
            assert!(matches!(
                Cipher::new(&key),
                Err(CryptoError::InvalidKeyLength { expected: 32, actual }) if actual == len
            ));
        }
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let mut sealed = encrypt(b"payload", KEY).unwrap();
        let last = sealed.len() - 1;
        sealed[last] ^= 0x01;
        assert!(matches!(decrypt(&sealed, KEY), Err(CryptoError::Decrypt)));
    }

    #[test]
    fn test_wrong_key_fails() {
        let sealed = encrypt(b"payload", KEY).unwrap();
        let other = b"AnotherKeyThatIsAlso32BytesLong!";
        assert!(decrypt(&sealed, other).is_err());
    }

    #[test]
    fn test_truncated_input() {
        assert!(matches!(
            decrypt(&[0u8; 5], KEY),
            Err(CryptoError::Truncated { len: 5, .. })
        ));
    }
}
