//! Text encoding of an encrypted value: `salt:nonce:tag:ciphertext`, all hex.

use std::fmt;
use std::str::FromStr;

use crate::cipher::NonceLen;
use crate::error::CipherError;
use crate::{SALT_SIZE, TAG_SIZE};

const SEPARATOR: char = ':';
const FIELD_COUNT: usize = 4;

/// A parsed encrypted blob. Immutable once produced by [`crate::Cipher::encrypt`].
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptedBlob {
    pub salt: [u8; SALT_SIZE],
    pub nonce: Vec<u8>,
    pub tag: [u8; TAG_SIZE],
    pub ciphertext: Vec<u8>,
}

impl EncryptedBlob {
    /// Nonce length of this blob, if it is one the cipher supports.
    pub fn nonce_len(&self) -> Option<NonceLen> {
        NonceLen::from_len(self.nonce.len())
    }
}

impl fmt::Display for EncryptedBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{SEPARATOR}{}{SEPARATOR}{}{SEPARATOR}{}",
            hex::encode(self.salt),
            hex::encode(&self.nonce),
            hex::encode(self.tag),
            hex::encode(&self.ciphertext),
        )
    }
}

impl fmt::Debug for EncryptedBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptedBlob")
            .field("nonce_len", &self.nonce.len())
            .field("ciphertext_len", &self.ciphertext.len())
            .finish_non_exhaustive()
    }
}

impl FromStr for EncryptedBlob {
    type Err = CipherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.trim().split(SEPARATOR).collect();
        if fields.len() != FIELD_COUNT {
            return Err(CipherError::MalformedInput("wrong field count"));
        }

        let decode = |field: &str| {
            hex::decode(field).map_err(|_| CipherError::MalformedInput("field is not valid hex"))
        };

        let salt: [u8; SALT_SIZE] = decode(fields[0])?
            .try_into()
            .map_err(|_| CipherError::MalformedInput("salt has wrong length"))?;

        let nonce = decode(fields[1])?;
        if NonceLen::from_len(nonce.len()).is_none() {
            return Err(CipherError::MalformedInput("nonce has wrong length"));
        }

        let tag: [u8; TAG_SIZE] = decode(fields[2])?
            .try_into()
            .map_err(|_| CipherError::MalformedInput("tag has wrong length"))?;

        let ciphertext = decode(fields[3])?;

        Ok(EncryptedBlob {
            salt,
            nonce,
            tag,
            ciphertext,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> EncryptedBlob {
        EncryptedBlob {
            salt: [0x11; SALT_SIZE],
            nonce: vec![0x22; 16],
            tag: [0x33; TAG_SIZE],
            ciphertext: vec![0xde, 0xad, 0xbe, 0xef],
        }
    }

    #[test]
    fn test_format_field_order() {
        let text = sample().to_string();
        let fields: Vec<&str> = text.split(':').collect();

        assert_eq!(fields.len(), 4);
        assert_eq!(fields[0], "11".repeat(SALT_SIZE));
        assert_eq!(fields[1], "22".repeat(16));
        assert_eq!(fields[2], "33".repeat(TAG_SIZE));
        assert_eq!(fields[3], "deadbeef");
    }

    #[test]
    fn test_parse_formatted() {
        let blob = sample();
        let parsed: EncryptedBlob = blob.to_string().parse().unwrap();
        assert_eq!(parsed, blob);
        assert_eq!(parsed.nonce_len(), Some(NonceLen::Legacy16));
    }

    #[test]
    fn test_parse_empty_ciphertext() {
        let mut blob = sample();
        blob.ciphertext.clear();
        let text = blob.to_string();
        assert!(text.ends_with(':'));

        let parsed: EncryptedBlob = text.parse().unwrap();
        assert!(parsed.ciphertext.is_empty());
    }

    #[test]
    fn test_parse_standard_nonce() {
        let mut blob = sample();
        blob.nonce = vec![0x44; 12];
        let parsed: EncryptedBlob = blob.to_string().parse().unwrap();
        assert_eq!(parsed.nonce_len(), Some(NonceLen::Standard12));
    }

    #[test]
    fn test_parse_wrong_field_count() {
        for text in ["", "aa", "aa:bb:cc", "aa:bb:cc:dd:ee"] {
            let err = text.parse::<EncryptedBlob>().unwrap_err();
            assert!(matches!(err, CipherError::MalformedInput(_)), "{text:?}");
        }
    }

    #[test]
    fn test_parse_non_hex() {
        let text = sample().to_string().replacen('d', "z", 1);
        let err = text.parse::<EncryptedBlob>().unwrap_err();
        assert!(matches!(err, CipherError::MalformedInput(_)));
    }

    #[test]
    fn test_parse_wrong_lengths() {
        let good = sample().to_string();
        let fields: Vec<&str> = good.split(':').collect();

        let short_salt = format!("00:{}:{}:{}", fields[1], fields[2], fields[3]);
        let bad_nonce = format!("{}:{}:{}:{}", fields[0], "00".repeat(24), fields[2], fields[3]);
        let short_tag = format!("{}:{}:{}:{}", fields[0], fields[1], "00".repeat(8), fields[3]);

        for text in [short_salt, bad_nonce, short_tag] {
            let err = text.parse::<EncryptedBlob>().unwrap_err();
            assert!(matches!(err, CipherError::MalformedInput(_)));
        }
    }

    #[test]
    fn test_debug_hides_contents() {
        let dbg = format!("{:?}", sample());
        assert!(!dbg.contains("deadbeef"));
        assert!(!dbg.contains("222222"));
    }
}
