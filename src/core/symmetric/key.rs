/*!
Symmetric keys and the block envelope operations.

A key is `auth_key || enc_key`: the first half keys HMAC-SHA256, the second
half keys AES-CBC. Both halves have the same size (128, 192 or 256 bits).
*/

use std::fmt;
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::core::{
    config::{EnvelopeConfig, SymmetricKeySize},
    constants::sizes::{HMAC_SIZE, IV_SIZE},
    error::{invalid_arg, Error, Result},
    provider::PrimitiveProvider,
    streaming::{DecryptStream, EncryptStream, StreamOptions},
};

#[cfg(feature = "async")]
use crate::core::{
    provider::AsyncPrimitiveProvider,
    streaming::{AsyncDecryptStream, AsyncEncryptStream},
};

use super::envelope;

/// Raw symmetric key material, wiped on drop
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKeyMaterial {
    #[zeroize(skip)]
    key_size: SymmetricKeySize,
    authentication_key: Vec<u8>,
    encryption_key: Vec<u8>,
}

impl SymmetricKeyMaterial {
    /// Split exported material into its two halves.
    ///
    /// Accepts 32, 48 or 64 bytes; anything else fails with `INVALID_ARG`.
    pub fn from_bytes(raw: &[u8]) -> Result<Self> {
        if raw.len() % 2 != 0 {
            return invalid_arg(format!("symmetric key material has odd length {}", raw.len()));
        }
        let half = raw.len() / 2;
        let key_size = SymmetricKeySize::from_half_len(half)?;
        let (authentication_key, encryption_key) = raw.split_at(half);
        Ok(Self {
            key_size,
            authentication_key: authentication_key.to_vec(),
            encryption_key: encryption_key.to_vec(),
        })
    }

    /// `auth_key || enc_key`
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut raw = Vec::with_capacity(self.key_size.material_len());
        raw.extend_from_slice(&self.authentication_key);
        raw.extend_from_slice(&self.encryption_key);
        raw
    }

    pub fn key_size(&self) -> SymmetricKeySize {
        self.key_size
    }

    /// HMAC-SHA256 key
    pub fn authentication_key(&self) -> &[u8] {
        &self.authentication_key
    }

    /// AES-CBC key
    pub fn encryption_key(&self) -> &[u8] {
        &self.encryption_key
    }
}

impl fmt::Debug for SymmetricKeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SymmetricKeyMaterial")
            .field("key_size", &self.key_size)
            .finish_non_exhaustive()
    }
}

/// Symmetric key bound to a primitive provider.
///
/// Synchronous operations are available when `P` implements
/// [`PrimitiveProvider`], the `*_async` operations when it implements
/// `AsyncPrimitiveProvider`. Envelopes are interchangeable between the two.
pub struct SymmetricKey<P> {
    material: SymmetricKeyMaterial,
    provider: Arc<P>,
}

impl<P> Clone for SymmetricKey<P> {
    fn clone(&self) -> Self {
        Self {
            material: self.material.clone(),
            provider: Arc::clone(&self.provider),
        }
    }
}

impl<P> fmt::Debug for SymmetricKey<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SymmetricKey")
            .field("key_size", &self.material.key_size())
            .finish_non_exhaustive()
    }
}

impl<P> SymmetricKey<P> {
    /// Bind existing material to a provider
    pub fn new(material: SymmetricKeyMaterial, provider: Arc<P>) -> Self {
        Self { material, provider }
    }

    /// Import raw `auth_key || enc_key` material
    pub fn from_bytes(raw: &[u8], provider: Arc<P>) -> Result<Self> {
        Ok(Self::new(SymmetricKeyMaterial::from_bytes(raw)?, provider))
    }

    /// Import base64 encoded material
    pub fn from_b64(encoded: &str, provider: Arc<P>) -> Result<Self> {
        let raw = Zeroizing::new(
            BASE64
                .decode(encoded.trim())
                .map_err(|e| Error::InvalidArg(format!("invalid base64 key: {}", e)))?,
        );
        Self::from_bytes(&raw, provider)
    }

    /// Export as raw `auth_key || enc_key`
    pub fn to_bytes(&self) -> Vec<u8> {
        self.material.to_bytes()
    }

    /// Export as base64
    pub fn to_b64(&self) -> String {
        let raw = Zeroizing::new(self.material.to_bytes());
        BASE64.encode(&*raw)
    }

    pub fn key_size(&self) -> SymmetricKeySize {
        self.material.key_size()
    }

    pub fn material(&self) -> &SymmetricKeyMaterial {
        &self.material
    }

    pub fn provider(&self) -> &Arc<P> {
        &self.provider
    }

    /// The same key material bound to another provider
    pub fn with_provider<Q>(&self, provider: Arc<Q>) -> SymmetricKey<Q> {
        SymmetricKey::new(self.material.clone(), provider)
    }
}

impl<P: PrimitiveProvider> SymmetricKey<P> {
    /// Generate a key from `size.material_len()` secure random bytes
    pub fn generate(size: SymmetricKeySize, provider: Arc<P>) -> Result<Self> {
        let raw = Zeroizing::new(provider.random_bytes(size.material_len())?);
        log::debug!("generated {}-bit symmetric key ({})", size.bits(), provider.name());
        Self::from_bytes(&raw, provider)
    }

    /// Generate a key of the configured size
    pub fn generate_with(config: &EnvelopeConfig, provider: Arc<P>) -> Result<Self> {
        Self::generate(config.symmetric_key_size, provider)
    }

    /// Encrypt into `IV || ciphertext || HMAC`
    pub fn encrypt(&self, clear_text: &[u8]) -> Result<Vec<u8>> {
        let iv = self.provider.random_bytes(IV_SIZE)?;
        let ciphertext =
            self.provider
                .aes_cbc_encrypt(self.material.encryption_key(), &iv, clear_text)?;
        let mut sealed = envelope::begin(&iv, &ciphertext);
        let tag = self
            .provider
            .hmac_sha256(self.material.authentication_key(), &sealed)?;
        sealed.extend_from_slice(&tag);
        Ok(sealed)
    }

    /// Verify the HMAC, then decrypt. Nothing is decrypted on a bad HMAC.
    pub fn decrypt(&self, sealed: &[u8]) -> Result<Vec<u8>> {
        let parts = envelope::split(sealed)?;
        let tag = self
            .provider
            .hmac_sha256(self.material.authentication_key(), parts.authenticated)?;
        if !envelope::tags_match(parts.hmac, &tag) {
            log::warn!("symmetric envelope failed HMAC verification");
            return Err(Error::InvalidHmac);
        }
        self.provider
            .aes_cbc_decrypt(self.material.encryption_key(), parts.iv, parts.ciphertext)
    }

    /// HMAC-SHA256 of `data` under the authentication key
    pub fn calculate_hmac(&self, data: &[u8]) -> Result<[u8; HMAC_SIZE]> {
        self.provider
            .hmac_sha256(self.material.authentication_key(), data)
    }

    /// Start an incremental encryption
    pub fn encrypt_stream(&self, options: StreamOptions) -> EncryptStream<P> {
        EncryptStream::new(self.material.clone(), Arc::clone(&self.provider), options)
    }

    /// Start an incremental decryption (see [`DecryptStream`] for the
    /// authentication caveat)
    pub fn decrypt_stream(&self, options: StreamOptions) -> DecryptStream<P> {
        DecryptStream::new(self.material.clone(), Arc::clone(&self.provider), options)
    }
}

#[cfg(feature = "async")]
impl<P: AsyncPrimitiveProvider> SymmetricKey<P> {
    pub async fn generate_async(size: SymmetricKeySize, provider: Arc<P>) -> Result<Self> {
        let raw = Zeroizing::new(provider.random_bytes(size.material_len()).await?);
        log::debug!("generated {}-bit symmetric key ({})", size.bits(), provider.name());
        Self::from_bytes(&raw, provider)
    }

    pub async fn generate_with_async(config: &EnvelopeConfig, provider: Arc<P>) -> Result<Self> {
        Self::generate_async(config.symmetric_key_size, provider).await
    }

    pub async fn encrypt_async(&self, clear_text: &[u8]) -> Result<Vec<u8>> {
        let iv = self.provider.random_bytes(IV_SIZE).await?;
        let ciphertext = self
            .provider
            .aes_cbc_encrypt(self.material.encryption_key(), &iv, clear_text)
            .await?;
        let mut sealed = envelope::begin(&iv, &ciphertext);
        let tag = self
            .provider
            .hmac_sha256(self.material.authentication_key(), &sealed)
            .await?;
        sealed.extend_from_slice(&tag);
        Ok(sealed)
    }

    pub async fn decrypt_async(&self, sealed: &[u8]) -> Result<Vec<u8>> {
        let parts = envelope::split(sealed)?;
        let tag = self
            .provider
            .hmac_sha256(self.material.authentication_key(), parts.authenticated)
            .await?;
        if !envelope::tags_match(parts.hmac, &tag) {
            log::warn!("symmetric envelope failed HMAC verification");
            return Err(Error::InvalidHmac);
        }
        self.provider
            .aes_cbc_decrypt(self.material.encryption_key(), parts.iv, parts.ciphertext)
            .await
    }

    pub async fn calculate_hmac_async(&self, data: &[u8]) -> Result<[u8; HMAC_SIZE]> {
        self.provider
            .hmac_sha256(self.material.authentication_key(), data)
            .await
    }

    pub fn encrypt_stream_async(&self, options: StreamOptions) -> AsyncEncryptStream<P> {
        AsyncEncryptStream::new(self.material.clone(), Arc::clone(&self.provider), options)
    }

    pub fn decrypt_stream_async(&self, options: StreamOptions) -> AsyncDecryptStream<P> {
        AsyncDecryptStream::new(self.material.clone(), Arc::clone(&self.provider), options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::provider::SoftwareProvider;

    fn provider() -> Arc<SoftwareProvider> {
        Arc::new(SoftwareProvider::new())
    }

    #[test]
    fn test_material_split() -> Result<()> {
        let raw: Vec<u8> = (0..48u8).collect();
        let material = SymmetricKeyMaterial::from_bytes(&raw)?;
        assert_eq!(material.key_size(), SymmetricKeySize::Aes192);
        assert_eq!(material.authentication_key(), &raw[..24]);
        assert_eq!(material.encryption_key(), &raw[24..]);
        assert_eq!(material.to_bytes(), raw);
        Ok(())
    }

    #[test]
    fn test_material_rejects_bad_lengths() {
        for len in [0usize, 16, 24, 31, 33, 40, 96] {
            let raw = vec![0u8; len];
            assert!(
                matches!(SymmetricKeyMaterial::from_bytes(&raw), Err(Error::InvalidArg(_))),
                "length {} should be rejected",
                len
            );
        }
    }

    #[test]
    fn test_generate_sizes() -> Result<()> {
        for size in [SymmetricKeySize::Aes128, SymmetricKeySize::Aes192, SymmetricKeySize::Aes256] {
            let key = SymmetricKey::generate(size, provider())?;
            assert_eq!(key.key_size(), size);
            assert_eq!(key.to_bytes().len(), size.material_len());
        }
        Ok(())
    }

    #[test]
    fn test_envelope_layout() -> Result<()> {
        let key = SymmetricKey::generate(SymmetricKeySize::Aes256, provider())?;
        for len in [0usize, 1, 15, 16, 17] {
            let sealed = key.encrypt(&vec![0xAB; len])?;
            let padded = (len / 16 + 1) * 16;
            assert_eq!(sealed.len(), IV_SIZE + padded + HMAC_SIZE);

            let tag = key.calculate_hmac(&sealed[..sealed.len() - HMAC_SIZE])?;
            assert_eq!(&sealed[sealed.len() - HMAC_SIZE..], &tag);
        }
        Ok(())
    }

    #[test]
    fn test_fresh_iv_per_encryption() -> Result<()> {
        let key = SymmetricKey::generate(SymmetricKeySize::Aes128, provider())?;
        let a = key.encrypt(b"same message")?;
        let b = key.encrypt(b"same message")?;
        assert_ne!(a[..IV_SIZE], b[..IV_SIZE]);
        assert_ne!(a, b);
        Ok(())
    }

    #[test]
    fn test_b64_round_trip() -> Result<()> {
        let key = SymmetricKey::generate(SymmetricKeySize::Aes256, provider())?;
        let imported = SymmetricKey::from_b64(&key.to_b64(), provider())?;
        assert_eq!(imported.to_bytes(), key.to_bytes());
        assert!(matches!(
            SymmetricKey::from_b64("not base64!", provider()),
            Err(Error::InvalidArg(_))
        ));
        Ok(())
    }

    #[test]
    fn test_debug_redacts_material() -> Result<()> {
        let key = SymmetricKey::from_bytes(&[0x41u8; 32], provider())?;
        let rendered = format!("{:?}", key);
        assert!(rendered.contains("Aes128"));
        assert!(!rendered.contains("65"));
        Ok(())
    }
}
