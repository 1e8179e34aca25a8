//! # Login Cryptography
//!
//! The RSA key pair offered in the Encryption Request and the session-server hash
//! used to authenticate a login against the session service.
//!
//! ## Key Pair
//! - 1024-bit RSA, as vanilla servers use
//! - Public key exported as SubjectPublicKeyInfo DER, the form clients expect
//! - PKCS#1 v1.5 padding for the shared secret and verify token
//!
//! ## Session Hash
//! SHA-1 over `server_id || shared_secret || public_key`, printed as a signed
//! big-endian integer in lowercase hex: leading zeros trimmed, negative digests
//! written as `-` followed by the magnitude.

use rand_core::OsRng;
use rsa::pkcs8::EncodePublicKey;
use rsa::{Pkcs1v15Encrypt, RsaPrivateKey, RsaPublicKey};
use sha1::{Digest, Sha1};
use std::fmt;
use std::fmt::Write as _;

use crate::error::{constants, ProtocolError, Result};

/// Modulus size of the server key
pub const KEY_BITS: usize = 1024;

/// Server RSA key pair, read-only once generated.
pub struct KeyPair {
    private_key: RsaPrivateKey,
    public_key: RsaPublicKey,
    public_der: Vec<u8>,
}

impl KeyPair {
    pub fn generate() -> Result<Self> {
        Self::generate_with_bits(KEY_BITS)
    }

    pub fn generate_with_bits(bits: usize) -> Result<Self> {
        let private_key = RsaPrivateKey::new(&mut OsRng, bits)
            .map_err(|e| ProtocolError::Crypto(format!("{}: {e}", constants::ERR_KEY_GENERATION)))?;
        let public_key = RsaPublicKey::from(&private_key);
        let public_der = public_key
            .to_public_key_der()
            .map_err(|e| {
                ProtocolError::Crypto(format!("{}: {e}", constants::ERR_PUBLIC_KEY_ENCODING))
            })?
            .as_bytes()
            .to_vec();

        Ok(Self {
            private_key,
            public_key,
            public_der,
        })
    }

    /// SubjectPublicKeyInfo DER encoding of the public key.
    pub fn public_key_der(&self) -> &[u8] {
        &self.public_der
    }

    pub fn encrypt(&self, data: &[u8]) -> Result<Vec<u8>> {
        self.public_key
            .encrypt(&mut OsRng, Pkcs1v15Encrypt, data)
            .map_err(|e| ProtocolError::Crypto(e.to_string()))
    }

    pub fn decrypt(&self, data: &[u8]) -> Result<Vec<u8>> {
        self.private_key
            .decrypt(Pkcs1v15Encrypt, data)
            .map_err(|e| ProtocolError::Crypto(e.to_string()))
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_der_len", &self.public_der.len())
            .finish_non_exhaustive()
    }
}

/// Hash sent to the session server to prove a login.
pub fn session_hash(server_id: &str, shared_secret: &[u8], public_key_der: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(server_id.as_bytes());
    hasher.update(shared_secret);
    hasher.update(public_key_der);
    signed_hex(hasher.finalize().into())
}

/// SHA-1 of `data` in the session server's signed hex notation.
pub fn server_hash(data: &[u8]) -> String {
    signed_hex(Sha1::digest(data).into())
}

fn signed_hex(mut digest: [u8; 20]) -> String {
    let negative = digest[0] & 0x80 == 0x80;
    if negative {
        twos_complement(&mut digest);
    }

    let mut hex = String::with_capacity(41);
    for byte in digest {
        let _ = write!(hex, "{byte:02x}");
    }

    let trimmed = hex.trim_start_matches('0');
    if negative {
        format!("-{trimmed}")
    } else {
        trimmed.to_string()
    }
}

fn twos_complement(bytes: &mut [u8]) {
    let mut carry = true;
    for byte in bytes.iter_mut().rev() {
        *byte = !*byte;
        if carry {
            carry = *byte == 0xFF;
            *byte = byte.wrapping_add(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_known_vectors() {
        assert_eq!(
            server_hash(b"Notch"),
            "4ed1f46bbe04bc756bcb17c0c7ce3e4632f06a48"
        );
        assert_eq!(
            server_hash(b"jeb_"),
            "-7c9d5b0044c130109a5d7b5fb5c317c02b4e28c1"
        );
        assert_eq!(
            server_hash(b"simon"),
            "88e16a1019277b15d58faf0541e11910eb756f6"
        );
    }

    #[test]
    fn session_hash_is_digest_of_concatenation() {
        let expected = server_hash(b"srvsecretkey");
        assert_eq!(session_hash("srv", b"secret", b"key"), expected);
    }

    #[test]
    fn twos_complement_carries() {
        let mut bytes = [0x00, 0x00];
        twos_complement(&mut bytes);
        assert_eq!(bytes, [0x00, 0x00]);

        let mut bytes = [0xFF, 0xFE];
        twos_complement(&mut bytes);
        assert_eq!(bytes, [0x00, 0x02]);
    }

    #[test]
    fn keypair_roundtrip() {
        let pair = KeyPair::generate_with_bits(512).unwrap();
        assert!(!pair.public_key_der().is_empty());
        // DER SEQUENCE tag
        assert_eq!(pair.public_key_der()[0], 0x30);

        let secret = [7u8; 16];
        let encrypted = pair.encrypt(&secret).unwrap();
        assert_ne!(encrypted, secret.to_vec());
        assert_eq!(pair.decrypt(&encrypted).unwrap(), secret.to_vec());
    }
}
