//! Wire payload encryption
//!
//! Every datagram in both directions is the UTF-8 plaintext, PKCS#7 padded and
//! encrypted with AES-128 in CBC mode under a fixed key and IV. The IV is not
//! transmitted; both ends are provisioned with it.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use serde::{Deserialize, Serialize};

use crate::error::{CodecError, KeyMaterialError};

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;

/// AES block size in bytes
pub const BLOCK_SIZE: usize = 16;

/// Key shipped with station firmware
pub const DEFAULT_KEY: [u8; 16] = [2, 51, 9, 12, 1, 85, 27, 56, 10, 14, 75, 42, 78, 4, 23, 64];

/// IV shipped with station firmware
pub const DEFAULT_IV: [u8; 16] = [29, 78, 23, 33, 99, 13, 68, 23, 94, 38, 65, 12, 45, 7, 49, 68];

/// Key or IV as supplied by the deployment
///
/// Older deployments carry raw byte arrays, newer ones hex strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyMaterial {
    Raw([u8; BLOCK_SIZE]),
    Hex(String),
}

impl KeyMaterial {
    /// Resolve to exactly 16 bytes
    pub fn to_bytes(&self) -> Result<[u8; BLOCK_SIZE], KeyMaterialError> {
        match self {
            KeyMaterial::Raw(bytes) => Ok(*bytes),
            KeyMaterial::Hex(text) => {
                let decoded = hex::decode(text.trim())?;
                let len = decoded.len();
                decoded
                    .try_into()
                    .map_err(|_| KeyMaterialError::Length(len))
            }
        }
    }
}

impl From<[u8; BLOCK_SIZE]> for KeyMaterial {
    fn from(bytes: [u8; BLOCK_SIZE]) -> Self {
        KeyMaterial::Raw(bytes)
    }
}

/// Symmetric codec for wire messages
#[derive(Clone)]
pub struct Codec {
    key: [u8; BLOCK_SIZE],
    iv: [u8; BLOCK_SIZE],
}

impl std::fmt::Debug for Codec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Codec").finish_non_exhaustive()
    }
}

impl Default for Codec {
    fn default() -> Self {
        Self::new(DEFAULT_KEY, DEFAULT_IV)
    }
}

impl Codec {
    pub fn new(key: [u8; BLOCK_SIZE], iv: [u8; BLOCK_SIZE]) -> Self {
        Self { key, iv }
    }

    /// Build from hex-encoded key and IV
    pub fn from_hex(key: &str, iv: &str) -> Result<Self, KeyMaterialError> {
        Self::from_material(
            &KeyMaterial::Hex(key.to_string()),
            &KeyMaterial::Hex(iv.to_string()),
        )
    }

    pub fn from_material(key: &KeyMaterial, iv: &KeyMaterial) -> Result<Self, KeyMaterialError> {
        Ok(Self::new(key.to_bytes()?, iv.to_bytes()?))
    }

    /// Encrypt a plaintext into a wire payload
    pub fn encrypt(&self, plaintext: &str) -> Vec<u8> {
        Aes128CbcEnc::new(&self.key.into(), &self.iv.into())
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes())
    }

    /// Decrypt a wire payload back into plaintext
    pub fn decrypt(&self, payload: &[u8]) -> Result<String, CodecError> {
        if payload.is_empty() {
            return Err(CodecError::Empty);
        }
        if payload.len() % BLOCK_SIZE != 0 {
            return Err(CodecError::Truncated(payload.len()));
        }

        let bytes = Aes128CbcDec::new(&self.key.into(), &self.iv.into())
            .decrypt_padded_vec_mut::<Pkcs7>(payload)
            .map_err(|_| CodecError::Padding)?;

        Ok(String::from_utf8(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_encrypt_decrypt() {
        let codec = Codec::default();
        let encrypted = codec.encrypt("whatever");

        assert_eq!(encrypted.len(), BLOCK_SIZE);
        assert_eq!(codec.decrypt(&encrypted).unwrap(), "whatever");
    }

    #[test]
    fn test_full_block_gets_extra_padding_block() {
        let codec = Codec::default();
        let encrypted = codec.encrypt("0123456789abcdef");

        assert_eq!(encrypted.len(), 2 * BLOCK_SIZE);
    }

    #[test]
    fn test_hex_and_raw_material_agree() {
        let raw = Codec::new(DEFAULT_KEY, DEFAULT_IV);
        let hexed = Codec::from_hex(&hex::encode(DEFAULT_KEY), &hex::encode(DEFAULT_IV)).unwrap();

        let msg = "UPDATEDB uid 1 1700000000";
        assert_eq!(raw.encrypt(msg), hexed.encrypt(msg));
        assert_eq!(hexed.decrypt(&raw.encrypt(msg)).unwrap(), msg);
    }

    #[test]
    fn test_bad_key_material() {
        assert!(matches!(
            Codec::from_hex("zz", "00"),
            Err(KeyMaterialError::Hex(_))
        ));
        assert!(matches!(
            Codec::from_hex("0011", &hex::encode(DEFAULT_IV)),
            Err(KeyMaterialError::Length(2))
        ));
    }

    #[test]
    fn test_malformed_payloads() {
        let codec = Codec::default();

        assert!(matches!(codec.decrypt(&[]), Err(CodecError::Empty)));
        assert!(matches!(codec.decrypt(&[0u8; 7]), Err(CodecError::Truncated(7))));

        // Encrypted under another key: padding check fails (or, rarely, UTF-8 does)
        let other = Codec::new([7u8; 16], DEFAULT_IV);
        let foreign = other.encrypt("START_ID_42 1700000000");
        assert!(codec.decrypt(&foreign).is_err());
    }

    proptest! {
        #[test]
        fn roundtrip_any_utf8(text in "\\PC{0,512}") {
            let codec = Codec::default();
            let encrypted = codec.encrypt(&text);

            prop_assert_eq!(encrypted.len() % BLOCK_SIZE, 0);
            prop_assert_eq!(codec.decrypt(&encrypted).unwrap(), text);
        }
    }
}
