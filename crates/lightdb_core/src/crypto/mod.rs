//! Cryptographic operations for LightDB.
//!
//! Individual string values can be stored encrypted. Encryption is opt-in
//! per call and requires a 32-byte key in the database configuration.
//!
//! ## Security Model
//!
//! - Uses AES-256 in CTR mode with a 128-bit big-endian counter
//! - A fresh random 16-byte IV per encryption, never reused
//! - Tokens are `hex(iv):hex(ciphertext)` so they stay valid JSON strings
//! - Keys are zeroized on drop and redacted from `Debug` output
//! - Every decryption failure is reported the same way
//!
//! CTR mode gives confidentiality only. A tampered token decrypts to garbage
//! (usually rejected as non-UTF-8) rather than being detected.
//!
//! ## Usage
//!
//! ```rust
//! use lightdb_core::crypto::{CryptoBox, EncryptionKey};
//!
//! let crypto = CryptoBox::new(EncryptionKey::generate());
//!
//! let token = crypto.encrypt("secret data");
//! assert_eq!(crypto.decrypt(&token).unwrap(), "secret data");
//! ```

mod encrypted;

pub use encrypted::*;
