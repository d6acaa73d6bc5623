/*!
RSA keys bound to a primitive provider.

[`PrivateKey`] owns its [`PublicKey`] and delegates every public operation to
it. Both export their wrapped DER (PKCS#8 / SPKI), optionally as base64.
*/

use std::fmt;
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use zeroize::Zeroizing;

use crate::core::{
    config::{AsymmetricKeySize, EnvelopeConfig},
    constants::sizes::sha256::DIGEST_SIZE,
    der,
    error::{invalid_arg, Error, Result},
    provider::PrimitiveProvider,
};

#[cfg(feature = "async")]
use crate::core::provider::AsyncPrimitiveProvider;

use super::envelope;
use super::material::{PrivateKeyMaterial, PublicKeyMaterial};

fn decode_b64(encoded: &str) -> Result<Vec<u8>> {
    BASE64
        .decode(encoded.trim())
        .map_err(|e| Error::InvalidKey(format!("invalid base64 key: {}", e)))
}

fn check_message_len(size: AsymmetricKeySize, len: usize, do_crc: bool) -> Result<()> {
    let max = envelope::max_message_len(size.bytes(), do_crc);
    if len > max {
        return invalid_arg(format!(
            "message of {} bytes exceeds the {}-byte limit for RSA-{}",
            len,
            max,
            size.bits()
        ));
    }
    Ok(())
}

fn open_payload(payload: Vec<u8>, do_crc: bool) -> Result<Vec<u8>> {
    if do_crc {
        Ok(envelope::strip_crc(&payload)?.to_vec())
    } else {
        Ok(payload)
    }
}

fn rejected_ciphertext(error: Error) -> Error {
    log::warn!("RSA-OAEP decryption rejected the ciphertext: {}", error);
    Error::InvalidCipherText
}

/// RSA public key
pub struct PublicKey<P> {
    material: PublicKeyMaterial,
    provider: Arc<P>,
}

impl<P> Clone for PublicKey<P> {
    fn clone(&self) -> Self {
        Self {
            material: self.material.clone(),
            provider: Arc::clone(&self.provider),
        }
    }
}

impl<P> fmt::Debug for PublicKey<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicKey")
            .field("size", &self.material.size())
            .finish_non_exhaustive()
    }
}

impl<P> PublicKey<P> {
    pub fn new(material: PublicKeyMaterial, provider: Arc<P>) -> Self {
        Self { material, provider }
    }

    /// Import a bare PKCS#1 or SPKI public key
    pub fn from_der(der: &[u8], provider: Arc<P>) -> Result<Self> {
        Ok(Self::new(PublicKeyMaterial::from_der(der)?, provider))
    }

    /// Import a base64 encoded public key in either form
    pub fn from_b64(encoded: &str, provider: Arc<P>) -> Result<Self> {
        Self::from_der(&decode_b64(encoded)?, provider)
    }

    /// SPKI DER
    pub fn to_der(&self) -> Vec<u8> {
        self.material.wrapped().to_vec()
    }

    /// Base64 SPKI DER
    pub fn to_b64(&self) -> String {
        BASE64.encode(self.material.wrapped())
    }

    pub fn key_size(&self) -> AsymmetricKeySize {
        self.material.size()
    }

    pub fn material(&self) -> &PublicKeyMaterial {
        &self.material
    }

    pub fn provider(&self) -> &Arc<P> {
        &self.provider
    }
}

impl<P: PrimitiveProvider> PublicKey<P> {
    /// RSA-OAEP encrypt, optionally behind a CRC-32 prefix
    pub fn encrypt(&self, clear_text: &[u8], do_crc: bool) -> Result<Vec<u8>> {
        check_message_len(self.key_size(), clear_text.len(), do_crc)?;
        if do_crc {
            let payload = envelope::with_crc(clear_text);
            self.provider.rsa_oaep_encrypt(self.material.bare(), &payload)
        } else {
            self.provider.rsa_oaep_encrypt(self.material.bare(), clear_text)
        }
    }

    /// RSA-OAEP encrypt with the CRC-32 prefix as configured
    pub fn encrypt_with(&self, clear_text: &[u8], config: &EnvelopeConfig) -> Result<Vec<u8>> {
        self.encrypt(clear_text, config.use_crc)
    }

    /// Check an RSA-PSS signature. Never fails; any error reads as `false`.
    pub fn verify(&self, text: &[u8], signature: &[u8]) -> bool {
        self.provider
            .rsa_pss_verify(self.material.bare(), text, signature, self.material.salt_length())
            .unwrap_or_else(|e| {
                log::debug!("signature verification errored: {}", e);
                false
            })
    }

    /// SHA-256 of the SPKI DER, usable as a fingerprint
    pub fn get_hash(&self) -> Result<[u8; DIGEST_SIZE]> {
        self.provider.sha256(self.material.wrapped())
    }

    pub fn get_b64_hash(&self) -> Result<String> {
        Ok(BASE64.encode(self.get_hash()?))
    }
}

#[cfg(feature = "async")]
impl<P: AsyncPrimitiveProvider> PublicKey<P> {
    pub async fn encrypt_async(&self, clear_text: &[u8], do_crc: bool) -> Result<Vec<u8>> {
        check_message_len(self.key_size(), clear_text.len(), do_crc)?;
        if do_crc {
            let payload = envelope::with_crc(clear_text);
            self.provider
                .rsa_oaep_encrypt(self.material.bare(), &payload)
                .await
        } else {
            self.provider
                .rsa_oaep_encrypt(self.material.bare(), clear_text)
                .await
        }
    }

    pub async fn encrypt_with_async(&self, clear_text: &[u8], config: &EnvelopeConfig) -> Result<Vec<u8>> {
        self.encrypt_async(clear_text, config.use_crc).await
    }

    pub async fn verify_async(&self, text: &[u8], signature: &[u8]) -> bool {
        self.provider
            .rsa_pss_verify(self.material.bare(), text, signature, self.material.salt_length())
            .await
            .unwrap_or_else(|e| {
                log::debug!("signature verification errored: {}", e);
                false
            })
    }

    pub async fn get_hash_async(&self) -> Result<[u8; DIGEST_SIZE]> {
        self.provider.sha256(self.material.wrapped()).await
    }

    pub async fn get_b64_hash_async(&self) -> Result<String> {
        Ok(BASE64.encode(self.get_hash_async().await?))
    }
}

/// RSA private key together with its derived public key
pub struct PrivateKey<P> {
    material: PrivateKeyMaterial,
    public: PublicKey<P>,
}

impl<P> Clone for PrivateKey<P> {
    fn clone(&self) -> Self {
        Self {
            material: self.material.clone(),
            public: self.public.clone(),
        }
    }
}

impl<P> fmt::Debug for PrivateKey<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("size", &self.material.size())
            .finish_non_exhaustive()
    }
}

impl<P> PrivateKey<P> {
    pub fn new(material: PrivateKeyMaterial, provider: Arc<P>) -> Self {
        let public = PublicKey::new(material.public().clone(), provider);
        Self { material, public }
    }

    /// Import a bare PKCS#1 or PKCS#8 private key
    pub fn from_der(der: &[u8], provider: Arc<P>) -> Result<Self> {
        Ok(Self::new(PrivateKeyMaterial::from_der(der)?, provider))
    }

    /// Import a base64 encoded private key in either form
    pub fn from_b64(encoded: &str, provider: Arc<P>) -> Result<Self> {
        let der = Zeroizing::new(decode_b64(encoded)?);
        Self::from_der(&der, provider)
    }

    /// PKCS#8 DER
    pub fn to_der(&self) -> Vec<u8> {
        self.material.wrapped().to_vec()
    }

    /// Base64 PKCS#8 DER, or the SPKI public key when `public_only`
    pub fn to_b64(&self, public_only: bool) -> String {
        if public_only {
            self.public.to_b64()
        } else {
            BASE64.encode(self.material.wrapped())
        }
    }

    pub fn public_key(&self) -> &PublicKey<P> {
        &self.public
    }

    pub fn key_size(&self) -> AsymmetricKeySize {
        self.material.size()
    }

    pub fn material(&self) -> &PrivateKeyMaterial {
        &self.material
    }

    pub fn provider(&self) -> &Arc<P> {
        self.public.provider()
    }
}

impl<P: PrimitiveProvider> PrivateKey<P> {
    /// Generate a fresh key pair
    pub fn generate(size: AsymmetricKeySize, provider: Arc<P>) -> Result<Self> {
        let bare = Zeroizing::new(provider.rsa_generate_key_pair(size.bits())?);
        let wrapped = Zeroizing::new(der::wrap_private(&bare)?);
        let key = Self::from_der(&wrapped, provider)?;
        log::debug!("generated RSA-{} key pair ({})", size.bits(), key.provider().name());
        Ok(key)
    }

    /// Generate a key pair of the configured size
    pub fn generate_with(config: &EnvelopeConfig, provider: Arc<P>) -> Result<Self> {
        Self::generate(config.asymmetric_key_size, provider)
    }

    /// RSA-OAEP decrypt, checking the CRC-32 prefix when `do_crc`
    pub fn decrypt(&self, cipher_text: &[u8], do_crc: bool) -> Result<Vec<u8>> {
        let payload = self
            .provider()
            .rsa_oaep_decrypt(self.material.bare(), cipher_text)
            .map_err(rejected_ciphertext)?;
        open_payload(payload, do_crc)
    }

    /// RSA-OAEP decrypt, checking the CRC-32 prefix as configured
    pub fn decrypt_with(&self, cipher_text: &[u8], config: &EnvelopeConfig) -> Result<Vec<u8>> {
        self.decrypt(cipher_text, config.use_crc)
    }

    /// RSA-PSS signature over SHA-256(text)
    pub fn sign(&self, text: &[u8]) -> Result<Vec<u8>> {
        self.provider()
            .rsa_pss_sign(self.material.bare(), text, self.public.material().salt_length())
    }

    pub fn encrypt(&self, clear_text: &[u8], do_crc: bool) -> Result<Vec<u8>> {
        self.public.encrypt(clear_text, do_crc)
    }

    pub fn encrypt_with(&self, clear_text: &[u8], config: &EnvelopeConfig) -> Result<Vec<u8>> {
        self.public.encrypt_with(clear_text, config)
    }

    pub fn verify(&self, text: &[u8], signature: &[u8]) -> bool {
        self.public.verify(text, signature)
    }

    pub fn get_hash(&self) -> Result<[u8; DIGEST_SIZE]> {
        self.public.get_hash()
    }

    pub fn get_b64_hash(&self) -> Result<String> {
        self.public.get_b64_hash()
    }
}

#[cfg(feature = "async")]
impl<P: AsyncPrimitiveProvider> PrivateKey<P> {
    pub async fn generate_async(size: AsymmetricKeySize, provider: Arc<P>) -> Result<Self> {
        let bare = Zeroizing::new(provider.rsa_generate_key_pair(size.bits()).await?);
        let wrapped = Zeroizing::new(der::wrap_private(&bare)?);
        let key = Self::from_der(&wrapped, provider)?;
        log::debug!("generated RSA-{} key pair ({})", size.bits(), key.provider().name());
        Ok(key)
    }

    pub async fn generate_with_async(config: &EnvelopeConfig, provider: Arc<P>) -> Result<Self> {
        Self::generate_async(config.asymmetric_key_size, provider).await
    }

    pub async fn decrypt_async(&self, cipher_text: &[u8], do_crc: bool) -> Result<Vec<u8>> {
        let payload = self
            .provider()
            .rsa_oaep_decrypt(self.material.bare(), cipher_text)
            .await
            .map_err(rejected_ciphertext)?;
        open_payload(payload, do_crc)
    }

    pub async fn decrypt_with_async(&self, cipher_text: &[u8], config: &EnvelopeConfig) -> Result<Vec<u8>> {
        self.decrypt_async(cipher_text, config.use_crc).await
    }

    pub async fn sign_async(&self, text: &[u8]) -> Result<Vec<u8>> {
        self.provider()
            .rsa_pss_sign(self.material.bare(), text, self.public.material().salt_length())
            .await
    }

    pub async fn encrypt_async(&self, clear_text: &[u8], do_crc: bool) -> Result<Vec<u8>> {
        self.public.encrypt_async(clear_text, do_crc).await
    }

    pub async fn encrypt_with_async(&self, clear_text: &[u8], config: &EnvelopeConfig) -> Result<Vec<u8>> {
        self.public.encrypt_with_async(clear_text, config).await
    }

    pub async fn verify_async(&self, text: &[u8], signature: &[u8]) -> bool {
        self.public.verify_async(text, signature).await
    }

    pub async fn get_hash_async(&self) -> Result<[u8; DIGEST_SIZE]> {
        self.public.get_hash_async().await
    }

    pub async fn get_b64_hash_async(&self) -> Result<String> {
        self.public.get_b64_hash_async().await
    }
}
