//! Token codec
//!
//! Turns a user key into an opaque token and back. A token is
//!
//! ```text
//! base64url( nonce[12] || AES-GCM( userKey <delimiter> salt ) )
//! ```
//!
//! The salt makes every token for the same user key different. It is
//! discarded on decode: a token is only a capability, and its validity
//! is established by the session lookup, not by anything inside it.

use aes_gcm::aead::consts::U12;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::aes::Aes192;
use aes_gcm::{Aes128Gcm, Aes256Gcm, AesGcm, Nonce};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::{rngs::OsRng, RngCore};

use crate::crypto::{random_salt, SALT_LEN};
use crate::CodecError;

type Aes192Gcm = AesGcm<Aes192, U12>;

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Transform between a user key and an opaque token
pub trait TokenCodec: Send + Sync {
    /// Produce a new token for `user_key`; never deterministic
    fn encode(&self, user_key: &str) -> Result<String, CodecError>;

    /// Recover the user key from a token
    fn decrypt(&self, token: &str) -> Result<String, CodecError>;
}

/// AES-GCM cipher sized by key length
enum Cipher {
    Aes128(Aes128Gcm),
    Aes192(Aes192Gcm),
    Aes256(Aes256Gcm),
}

impl Cipher {
    fn new(key: &[u8]) -> Result<Self, CodecError> {
        let invalid = |_| CodecError::InvalidKeyLength(key.len());
        match key.len() {
            16 => Ok(Self::Aes128(Aes128Gcm::new_from_slice(key).map_err(invalid)?)),
            24 => Ok(Self::Aes192(Aes192Gcm::new_from_slice(key).map_err(invalid)?)),
            32 => Ok(Self::Aes256(Aes256Gcm::new_from_slice(key).map_err(invalid)?)),
            other => Err(CodecError::InvalidKeyLength(other)),
        }
    }

    fn encrypt(&self, nonce: &Nonce<U12>, plaintext: &[u8]) -> Result<Vec<u8>, aes_gcm::Error> {
        match self {
            Self::Aes128(c) => c.encrypt(nonce, plaintext),
            Self::Aes192(c) => c.encrypt(nonce, plaintext),
            Self::Aes256(c) => c.encrypt(nonce, plaintext),
        }
    }

    fn decrypt(&self, nonce: &Nonce<U12>, ciphertext: &[u8]) -> Result<Vec<u8>, aes_gcm::Error> {
        match self {
            Self::Aes128(c) => c.decrypt(nonce, ciphertext),
            Self::Aes192(c) => c.decrypt(nonce, ciphertext),
            Self::Aes256(c) => c.decrypt(nonce, ciphertext),
        }
    }

    fn key_bits(&self) -> u16 {
        match self {
            Self::Aes128(_) => 128,
            Self::Aes192(_) => 192,
            Self::Aes256(_) => 256,
        }
    }
}

/// Default codec: salted plaintext under AES-GCM.
///
/// Because the cipher is authenticated, a token that was not produced with
/// this key fails to decrypt instead of yielding a garbage user key.
pub struct AesTokenCodec {
    delimiter: String,
    cipher: Cipher,
}

impl std::fmt::Debug for AesTokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AesTokenCodec")
            .field("delimiter", &self.delimiter)
            .field("key_bits", &self.cipher.key_bits())
            .finish_non_exhaustive()
    }
}

impl AesTokenCodec {
    /// Create a codec.
    ///
    /// # Errors
    /// Returns error if the delimiter is empty or the key is not 16, 24 or
    /// 32 bytes long.
    pub fn new(delimiter: impl Into<String>, key: impl AsRef<[u8]>) -> Result<Self, CodecError> {
        let delimiter = delimiter.into();
        if delimiter.is_empty() {
            return Err(CodecError::Empty("delimiter"));
        }
        Ok(Self {
            delimiter,
            cipher: Cipher::new(key.as_ref())?,
        })
    }

    /// Token field delimiter
    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }

    /// Split `userKey<delimiter>salt`. The salt has a fixed length, so the
    /// user key may itself contain the delimiter.
    fn split_plaintext<'a>(&self, plaintext: &'a str) -> Result<&'a str, CodecError> {
        let head_len = plaintext
            .len()
            .checked_sub(SALT_LEN)
            .ok_or(CodecError::Malformed)?;
        let head = plaintext.get(..head_len).ok_or(CodecError::Malformed)?;
        let user_key = head
            .strip_suffix(self.delimiter.as_str())
            .ok_or(CodecError::Malformed)?;
        if user_key.is_empty() {
            return Err(CodecError::Malformed);
        }
        Ok(user_key)
    }
}

impl TokenCodec for AesTokenCodec {
    fn encode(&self, user_key: &str) -> Result<String, CodecError> {
        if user_key.is_empty() {
            return Err(CodecError::Empty("userKey"));
        }

        let plaintext = format!("{user_key}{}{}", self.delimiter, random_salt());

        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::<U12>::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|_| CodecError::Encrypt)?;

        let mut raw = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        raw.extend_from_slice(&nonce_bytes);
        raw.extend_from_slice(&ciphertext);

        Ok(URL_SAFE_NO_PAD.encode(raw))
    }

    fn decrypt(&self, token: &str) -> Result<String, CodecError> {
        if token.is_empty() {
            return Err(CodecError::Empty("token"));
        }

        let raw = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|_| CodecError::Decode("invalid base64"))?;
        if raw.len() < NONCE_LEN + TAG_LEN {
            return Err(CodecError::Decode("token too short"));
        }

        let (nonce_bytes, ciphertext) = raw.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::<U12>::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| CodecError::Decode("decryption failed"))?;
        let plaintext = String::from_utf8(plaintext).map_err(|_| CodecError::Malformed)?;

        self.split_plaintext(&plaintext).map(str::to_string)
    }
}
