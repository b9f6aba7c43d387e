//! Value encryption using AES-256 in counter mode.

use crate::error::{CoreError, CoreResult};
use aes::Aes256;
use ctr::cipher::{generic_array::GenericArray, KeyIvInit, StreamCipher};
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of the AES-256 key in bytes.
pub const KEY_SIZE: usize = 32;
/// Size of the CTR initialization vector in bytes.
pub const IV_SIZE: usize = 16;

/// Separator between the hex IV and the hex ciphertext in a token.
const TOKEN_SEPARATOR: char = ':';

type Aes256Ctr = ctr::Ctr128BE<Aes256>;

/// Encryption key for AES-256-CTR.
///
/// The key is automatically zeroized when dropped for security.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct EncryptionKey {
    bytes: [u8; KEY_SIZE],
}

impl EncryptionKey {
    /// Generates a new random encryption key.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_SIZE];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Creates a key from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes slice is not exactly 32 bytes.
    pub fn from_bytes(bytes: &[u8]) -> CoreResult<Self> {
        if bytes.len() != KEY_SIZE {
            return Err(CoreError::invalid_key_size(bytes.len(), KEY_SIZE));
        }

        let mut key_bytes = [0u8; KEY_SIZE];
        key_bytes.copy_from_slice(bytes);
        Ok(Self { bytes: key_bytes })
    }

    /// Creates a key from a configured key string (its UTF-8 bytes).
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not exactly 32 bytes long.
    pub fn from_passphrase(key: &str) -> CoreResult<Self> {
        Self::from_bytes(key.as_bytes())
    }

    /// Returns the key as a byte slice.
    ///
    /// # Security
    ///
    /// Be careful with this method - don't log or serialize the result.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Encrypts and decrypts single string values.
///
/// Tokens have the form `hex(iv):hex(ciphertext)`, with a fresh random
/// 16-byte IV per encryption.
pub struct CryptoBox {
    key: EncryptionKey,
}

impl CryptoBox {
    /// Creates a crypto box with the given key.
    #[must_use]
    pub fn new(key: EncryptionKey) -> Self {
        Self { key }
    }

    /// Encrypts `plaintext` into an `iv:ciphertext` token.
    #[must_use]
    pub fn encrypt(&self, plaintext: &str) -> String {
        let mut iv = [0u8; IV_SIZE];
        rand::thread_rng().fill_bytes(&mut iv);

        let mut data = plaintext.as_bytes().to_vec();
        apply_keystream(self.key.as_bytes(), &iv, &mut data);

        format!("{}{TOKEN_SEPARATOR}{}", hex::encode(iv), hex::encode(data))
    }

    /// Decrypts a token produced by [`encrypt`](Self::encrypt).
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DecryptionFailed`] for any malformed token or
    /// plaintext that is not UTF-8. The cause is not exposed.
    pub fn decrypt(&self, token: &str) -> CoreResult<String> {
        let (iv, mut data) = parse_token(token).ok_or(CoreError::DecryptionFailed)?;
        apply_keystream(self.key.as_bytes(), &iv, &mut data);
        String::from_utf8(data).map_err(|_| CoreError::DecryptionFailed)
    }
}

impl std::fmt::Debug for CryptoBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CryptoBox")
            .field("cipher", &"Aes256Ctr")
            .finish()
    }
}

/// Returns true if `token` has the shape of an encrypted value.
///
/// This checks the format only; it says nothing about which key produced it.
#[must_use]
pub fn is_token(token: &str) -> bool {
    parse_token(token).is_some()
}

/// Splits a token into its IV and ciphertext bytes.
fn parse_token(token: &str) -> Option<([u8; IV_SIZE], Vec<u8>)> {
    if token.chars().any(char::is_whitespace) {
        return None;
    }

    let (iv_hex, data_hex) = token.split_once(TOKEN_SEPARATOR)?;
    if data_hex.contains(TOKEN_SEPARATOR) {
        return None;
    }

    let iv: [u8; IV_SIZE] = hex::decode(iv_hex).ok()?.try_into().ok()?;
    let data = hex::decode(data_hex).ok()?;
    Some((iv, data))
}

/// XORs `data` in place with the AES-256-CTR keystream for `key` and `iv`.
///
/// The whole IV is the initial 128-bit big-endian counter block.
fn apply_keystream(key: &[u8; KEY_SIZE], iv: &[u8; IV_SIZE], data: &mut [u8]) {
    let mut cipher = Aes256Ctr::new(GenericArray::from_slice(key), GenericArray::from_slice(iv));
    cipher.apply_keystream(data);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crypto() -> CryptoBox {
        CryptoBox::new(EncryptionKey::generate())
    }

    #[test]
    fn generate_key() {
        let key1 = EncryptionKey::generate();
        let key2 = EncryptionKey::generate();

        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn key_from_passphrase() {
        let key = EncryptionKey::from_passphrase("0123456789abcdef0123456789abcdef").unwrap();
        assert_eq!(&key.as_bytes()[..4], b"0123");
    }

    #[test]
    fn key_wrong_size() {
        assert!(matches!(
            EncryptionKey::from_passphrase("short"),
            Err(CoreError::InvalidKeySize {
                expected: 32,
                actual: 5
            })
        ));
        assert!(EncryptionKey::from_bytes(&[0u8; 64]).is_err());
    }

    #[test]
    fn key_debug_is_redacted() {
        let key = EncryptionKey::from_bytes(&[7u8; KEY_SIZE]).unwrap();
        assert!(format!("{key:?}").contains("REDACTED"));
    }

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let crypto = crypto();

        let token = crypto.encrypt("Hello, LightDB!");
        assert_ne!(token, "Hello, LightDB!");
        assert_eq!(crypto.decrypt(&token).unwrap(), "Hello, LightDB!");
    }

    #[test]
    fn token_format() {
        let token = crypto().encrypt("abc");
        let (iv, data) = token.split_once(':').unwrap();

        assert_eq!(iv.len(), IV_SIZE * 2);
        assert_eq!(data.len(), 6);
        assert!(token.chars().all(|c| c == ':' || c.is_ascii_hexdigit()));
        assert!(is_token(&token));
    }

    #[test]
    fn encrypt_produces_different_tokens() {
        let crypto = crypto();

        let t1 = crypto.encrypt("same data");
        let t2 = crypto.encrypt("same data");

        assert_ne!(t1, t2);
    }

    #[test]
    fn decrypt_wrong_key_does_not_reveal_plaintext() {
        let token = crypto().encrypt("a reasonably long secret value");
        let other = crypto();

        assert_ne!(
            other.decrypt(&token).ok().as_deref(),
            Some("a reasonably long secret value")
        );
    }

    #[test]
    fn malformed_tokens_fail_uniformly() {
        let crypto = crypto();
        let iv = "00".repeat(IV_SIZE);

        for token in [
            String::new(),
            "plain text".to_string(),
            "nocolon".to_string(),
            format!("{iv}:00:11"),
            format!("{iv}:zz"),
            format!("{iv}: 00"),
            "0011:2233".to_string(),
            format!("{iv}:0"),
        ] {
            assert!(
                matches!(crypto.decrypt(&token), Err(CoreError::DecryptionFailed)),
                "{token:?} should not decrypt"
            );
        }
    }

    #[test]
    fn empty_plaintext() {
        let crypto = crypto();

        let token = crypto.encrypt("");
        assert!(token.ends_with(':'));
        assert_eq!(crypto.decrypt(&token).unwrap(), "");
    }

    #[test]
    fn unicode_plaintext() {
        let crypto = crypto();

        let token = crypto.encrypt("héllo wörld ✓");
        assert_eq!(crypto.decrypt(&token).unwrap(), "héllo wörld ✓");
    }

    #[test]
    fn keystream_matches_sp800_38a_vector() {
        // NIST SP 800-38A, F.5.5 CTR-AES256.Encrypt, first block.
        let key: [u8; KEY_SIZE] =
            hex::decode("603deb1015ca71be2b73aef0857d77811f352c073b6108d72d9810a30914dff4")
                .unwrap()
                .try_into()
                .unwrap();
        let iv: [u8; IV_SIZE] = hex::decode("f0f1f2f3f4f5f6f7f8f9fafbfcfdfeff")
            .unwrap()
            .try_into()
            .unwrap();
        let mut block = hex::decode("6bc1bee22e409f96e93d7e117393172a").unwrap();

        apply_keystream(&key, &iv, &mut block);

        assert_eq!(hex::encode(block), "601ec313775789a5b7a7f504bbf3d228");
    }
}
