use aes_gcm::{
    aead::{rand_core::RngCore, Aead, KeyInit, OsRng},
    Aes256Gcm, Key, Nonce,
};
use anyhow::anyhow;
use tracing::warn;

const NONCE_LEN: usize = 12;

/// Returned in place of the plaintext when a stored message cannot be
/// decrypted, so one bad row never breaks a whole conversation view.
pub const DECRYPT_FAILED: &str = "Message could not be decrypted.";

/// Encrypts message bodies at rest with AES-256-GCM under a shared key.
///
/// The stored token is `hex(nonce) + ":" + hex(ciphertext)`; a fresh
/// nonce is drawn per call, so encrypting the same text twice yields
/// different tokens.
#[derive(Clone)]
pub struct MessageCipher {
    key: [u8; 32],
}

impl MessageCipher {
    pub fn new(key: &[u8]) -> anyhow::Result<Self> {
        let key: [u8; 32] = key
            .try_into()
            .map_err(|_| anyhow!("message key must be exactly 32 bytes, got {}", key.len()))?;
        Ok(Self { key })
    }

    pub fn encrypt(&self, plaintext: &str) -> anyhow::Result<String> {
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.key));

        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| anyhow!("encryption failed: {}", e))?;

        Ok(format!(
            "{}:{}",
            hex::encode(nonce_bytes),
            hex::encode(ciphertext)
        ))
    }

    /// Fail-closed: any malformed token, wrong key, or failed tag check
    /// yields [`DECRYPT_FAILED`] instead of an error.
    pub fn decrypt(&self, token: &str) -> String {
        match self.try_decrypt(token) {
            Ok(plaintext) => plaintext,
            Err(e) => {
                warn!(error = %e, "message decryption failed");
                DECRYPT_FAILED.to_string()
            }
        }
    }

    fn try_decrypt(&self, token: &str) -> anyhow::Result<String> {
        let (nonce_hex, ciphertext_hex) = token
            .split_once(':')
            .ok_or_else(|| anyhow!("malformed token: missing delimiter"))?;

        let nonce_bytes = hex::decode(nonce_hex)?;
        if nonce_bytes.len() != NONCE_LEN {
            return Err(anyhow!("malformed token: bad nonce length"));
        }
        let ciphertext = hex::decode(ciphertext_hex)?;

        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.key));
        let plaintext = cipher
            .decrypt(Nonce::from_slice(&nonce_bytes), ciphertext.as_ref())
            .map_err(|e| anyhow!("decryption failed: {}", e))?;

        Ok(String::from_utf8(plaintext)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cipher() -> MessageCipher {
        MessageCipher::new(b"0123456789abcdef0123456789abcdef").expect("valid key")
    }

    #[test]
    fn rejects_wrong_key_length() {
        assert!(MessageCipher::new(b"too-short").is_err());
        assert!(MessageCipher::new(&[0u8; 33]).is_err());
    }

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let c = cipher();
        for plaintext in ["hola", "", "a:b:c", "día con acentos y ñ"] {
            let token = c.encrypt(plaintext).expect("encrypt");
            assert_eq!(c.decrypt(&token), plaintext);
        }
    }

    #[test]
    fn ciphertext_is_nondeterministic() {
        let c = cipher();
        let a = c.encrypt("same text").expect("encrypt");
        let b = c.encrypt("same text").expect("encrypt");
        assert_ne!(a, b);
        assert_eq!(c.decrypt(&a), "same text");
        assert_eq!(c.decrypt(&b), "same text");
    }

    #[test]
    fn token_is_hex_nonce_and_hex_ciphertext() {
        let c = cipher();
        let token = c.encrypt("x").expect("encrypt");
        let (nonce_hex, ct_hex) = token.split_once(':').expect("delimiter");
        assert_eq!(nonce_hex.len(), NONCE_LEN * 2);
        assert!(hex::decode(nonce_hex).is_ok());
        assert!(hex::decode(ct_hex).is_ok());
    }

    #[test]
    fn malformed_tokens_fail_closed() {
        let c = cipher();
        for token in [
            "",
            "no-delimiter",
            "zz:zz",
            "deadbeef:cafe",
            "0123456789abcdef01234567:nothex!",
            "0123456789abcdef01234567:",
        ] {
            assert_eq!(c.decrypt(token), DECRYPT_FAILED);
        }
    }

    #[test]
    fn wrong_key_fails_closed() {
        let token = cipher().encrypt("secret").expect("encrypt");
        let other = MessageCipher::new(b"ffffffffffffffffffffffffffffffff").expect("valid key");
        assert_eq!(other.decrypt(&token), DECRYPT_FAILED);
    }

    #[test]
    fn tampered_ciphertext_is_detected() {
        let c = cipher();
        let token = c.encrypt("attend the meeting").expect("encrypt");
        let mut tampered = token.into_bytes();
        let last = tampered.last_mut().expect("nonempty");
        *last = if *last == b'0' { b'1' } else { b'0' };
        let tampered = String::from_utf8(tampered).expect("utf8");
        assert_eq!(c.decrypt(&tampered), DECRYPT_FAILED);
    }

    #[test]
    fn truncated_ciphertext_fails_closed() {
        let c = cipher();
        let token = c.encrypt("hola").expect("encrypt");
        let truncated = &token[..token.len() - 8];
        assert_eq!(c.decrypt(truncated), DECRYPT_FAILED);
    }
}
