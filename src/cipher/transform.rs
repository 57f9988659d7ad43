use chacha20poly1305::{
    Key, KeyInit, XChaCha20Poly1305, XNonce,
    aead::{Aead, AeadCore, OsRng},
};
use thiserror::Error;

/// Nonce length for XChaCha20-Poly1305; the nonce is prepended to the
/// ciphertext before hex encoding.
const NONCE_LEN: usize = 24;

#[derive(Debug, Error)]
pub enum CipherError {
    #[error("Encryption failed: {0}")]
    Encrypt(String),

    #[error("Decryption failed: {0}")]
    Decrypt(String),

    #[error("Ciphertext is not valid hex: {0}")]
    Encoding(#[from] hex::FromHexError),

    #[error("Ciphertext shorter than the {NONCE_LEN}-byte nonce")]
    TooShort,

    #[error("Decrypted payload is not valid UTF-8")]
    NotUtf8,
}

/// A reversible symmetric transform over string payloads.
///
/// The executor treats implementations as opaque: they must uphold
/// `decrypt(encrypt(x)) == x` for all supported inputs but are otherwise
/// free to pick the algorithm and wire form.
pub trait SecretCipher: Send + Sync + 'static {
    fn encrypt(&self, plaintext: &str) -> Result<String, CipherError>;
    fn decrypt(&self, ciphertext: &str) -> Result<String, CipherError>;
}

/// XChaCha20-Poly1305 keyed by the configured vault secret.
/// Encrypts to hex(nonce || ciphertext) with a fresh random nonce per call.
pub struct XChaChaCipher {
    key: Key,
}

impl XChaChaCipher {
    pub fn new(secret: &str) -> Self {
        Self {
            key: prepare_key(secret),
        }
    }
}

fn prepare_key(secret: &str) -> Key {
    let mut key_bytes = [0u8; 32];
    let secret_bytes = secret.as_bytes();

    let len = secret_bytes.len().min(32);
    key_bytes[..len].copy_from_slice(&secret_bytes[..len]);

    Key::from(key_bytes)
}

impl SecretCipher for XChaChaCipher {
    fn encrypt(&self, plaintext: &str) -> Result<String, CipherError> {
        let cipher = XChaCha20Poly1305::new(&self.key);
        let nonce = XChaCha20Poly1305::generate_nonce(&mut OsRng);

        let ciphertext = cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|e| CipherError::Encrypt(e.to_string()))?;

        let mut combined = nonce.to_vec();
        combined.extend_from_slice(&ciphertext);

        Ok(hex::encode(combined))
    }

    fn decrypt(&self, ciphertext: &str) -> Result<String, CipherError> {
        let combined = hex::decode(ciphertext)?;
        if combined.len() < NONCE_LEN {
            return Err(CipherError::TooShort);
        }

        let (nonce_bytes, encrypted) = combined.split_at(NONCE_LEN);
        let nonce_bytes: &[u8; NONCE_LEN] = nonce_bytes.try_into().map_err(|_| CipherError::TooShort)?;
        let nonce = XNonce::from(*nonce_bytes);

        let cipher = XChaCha20Poly1305::new(&self.key);
        let plaintext = cipher
            .decrypt(&nonce, encrypted)
            .map_err(|e| CipherError::Decrypt(e.to_string()))?;

        String::from_utf8(plaintext).map_err(|_| CipherError::NotUtf8)
    }
}
