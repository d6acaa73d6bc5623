/*!
Primitive provider capability.

The envelope engines never perform cryptographic arithmetic themselves. They
call into a provider that supplies AES-CBC, HMAC-SHA256, SHA-256, RSA
(OAEP/SHA-1, PSS/SHA-256) and secure random bytes. Two flavours exist:

- [`PrimitiveProvider`] resolves every call inline (host library, software).
- [`AsyncPrimitiveProvider`] returns futures (OS or hardware backed work).

RSA keys cross this boundary as bare PKCS#1 DER; wrapping them into SPKI or
PKCS#8 envelopes is the job of [`crate::core::der`].
*/

pub mod software;

#[cfg(feature = "async")]
pub mod offload;

use crate::core::constants::sizes::{sha256::DIGEST_SIZE, HMAC_SIZE};
use crate::core::error::Result;

pub use software::SoftwareProvider;

#[cfg(feature = "async")]
pub use offload::OffloadedProvider;

/// Incremental AES-CBC transform (PKCS#7 padding applied on finalize)
pub trait CipherContext: Send {
    /// Feed input, returning whatever output is available so far
    fn update(&mut self, data: &[u8]) -> Result<Vec<u8>>;

    /// Flush the final block
    fn finalize(self: Box<Self>) -> Result<Vec<u8>>;
}

/// Incremental HMAC-SHA256
pub trait MacContext: Send {
    /// Absorb data into the running MAC
    fn update(&mut self, data: &[u8]);

    /// Produce the 32-byte tag
    fn finalize(self: Box<Self>) -> [u8; HMAC_SIZE];
}

/// Synchronous primitive provider
pub trait PrimitiveProvider: Send + Sync {
    /// Human readable provider name
    fn name(&self) -> &'static str;

    /// Fill a fresh buffer with cryptographically secure random bytes
    fn random_bytes(&self, len: usize) -> Result<Vec<u8>>;

    /// Start an AES-CBC encryption with the given key (16, 24 or 32 bytes) and IV
    fn aes_cbc_encryptor(&self, key: &[u8], iv: &[u8]) -> Result<Box<dyn CipherContext>>;

    /// Start an AES-CBC decryption with the given key and IV
    fn aes_cbc_decryptor(&self, key: &[u8], iv: &[u8]) -> Result<Box<dyn CipherContext>>;

    /// Start an HMAC-SHA256 computation
    fn hmac_sha256_context(&self, key: &[u8]) -> Result<Box<dyn MacContext>>;

    /// SHA-256 digest
    fn sha256(&self, data: &[u8]) -> Result<[u8; DIGEST_SIZE]>;

    /// Generate an RSA key pair, returned as a bare PKCS#1 private key
    fn rsa_generate_key_pair(&self, bits: usize) -> Result<Vec<u8>>;

    /// RSA-OAEP (SHA-1) encryption under a bare PKCS#1 public key
    fn rsa_oaep_encrypt(&self, public_key: &[u8], data: &[u8]) -> Result<Vec<u8>>;

    /// RSA-OAEP (SHA-1) decryption under a bare PKCS#1 private key
    fn rsa_oaep_decrypt(&self, private_key: &[u8], data: &[u8]) -> Result<Vec<u8>>;

    /// RSA-PSS signature over SHA-256(data)
    fn rsa_pss_sign(&self, private_key: &[u8], data: &[u8], salt_len: usize) -> Result<Vec<u8>>;

    /// RSA-PSS verification over SHA-256(data)
    fn rsa_pss_verify(
        &self,
        public_key: &[u8],
        data: &[u8],
        signature: &[u8],
        salt_len: usize,
    ) -> Result<bool>;

    /// One-shot AES-CBC encryption
    fn aes_cbc_encrypt(&self, key: &[u8], iv: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
        let mut cipher = self.aes_cbc_encryptor(key, iv)?;
        let mut output = cipher.update(plaintext)?;
        output.extend_from_slice(&cipher.finalize()?);
        Ok(output)
    }

    /// One-shot AES-CBC decryption
    fn aes_cbc_decrypt(&self, key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
        let mut cipher = self.aes_cbc_decryptor(key, iv)?;
        let mut output = cipher.update(ciphertext)?;
        output.extend_from_slice(&cipher.finalize()?);
        Ok(output)
    }

    /// One-shot HMAC-SHA256
    fn hmac_sha256(&self, key: &[u8], data: &[u8]) -> Result<[u8; HMAC_SIZE]> {
        let mut mac = self.hmac_sha256_context(key)?;
        mac.update(data);
        Ok(mac.finalize())
    }
}

/// Asynchronous incremental AES-CBC transform
#[cfg(feature = "async")]
pub trait AsyncCipherContext: Send {
    /// Feed input, resolving to whatever output is available so far
    fn update(&mut self, data: Vec<u8>) -> impl Future<Output = Result<Vec<u8>>> + Send;

    /// Flush the final block
    fn finalize(self) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

/// Asynchronous incremental HMAC-SHA256
#[cfg(feature = "async")]
pub trait AsyncMacContext: Send {
    /// Absorb data into the running MAC
    fn update(&mut self, data: Vec<u8>) -> impl Future<Output = Result<()>> + Send;

    /// Produce the 32-byte tag
    fn finalize(self) -> impl Future<Output = Result<[u8; HMAC_SIZE]>> + Send;
}

/// Asynchronous primitive provider
///
/// Same contract as [`PrimitiveProvider`]. Streaming contexts must be driven
/// strictly in order: callers await each update before issuing the next, since
/// CBC chaining and the running MAC are sequential.
#[cfg(feature = "async")]
pub trait AsyncPrimitiveProvider: Send + Sync {
    type Cipher: AsyncCipherContext;
    type Mac: AsyncMacContext;

    fn name(&self) -> &'static str;

    fn random_bytes(&self, len: usize) -> impl Future<Output = Result<Vec<u8>>> + Send;

    fn aes_cbc_encryptor(
        &self,
        key: &[u8],
        iv: &[u8],
    ) -> impl Future<Output = Result<Self::Cipher>> + Send;

    fn aes_cbc_decryptor(
        &self,
        key: &[u8],
        iv: &[u8],
    ) -> impl Future<Output = Result<Self::Cipher>> + Send;

    fn hmac_sha256_context(&self, key: &[u8]) -> impl Future<Output = Result<Self::Mac>> + Send;

    fn aes_cbc_encrypt(
        &self,
        key: &[u8],
        iv: &[u8],
        plaintext: &[u8],
    ) -> impl Future<Output = Result<Vec<u8>>> + Send;

    fn aes_cbc_decrypt(
        &self,
        key: &[u8],
        iv: &[u8],
        ciphertext: &[u8],
    ) -> impl Future<Output = Result<Vec<u8>>> + Send;

    fn hmac_sha256(
        &self,
        key: &[u8],
        data: &[u8],
    ) -> impl Future<Output = Result<[u8; HMAC_SIZE]>> + Send;

    fn sha256(&self, data: &[u8]) -> impl Future<Output = Result<[u8; DIGEST_SIZE]>> + Send;

    fn rsa_generate_key_pair(&self, bits: usize) -> impl Future<Output = Result<Vec<u8>>> + Send;

    fn rsa_oaep_encrypt(
        &self,
        public_key: &[u8],
        data: &[u8],
    ) -> impl Future<Output = Result<Vec<u8>>> + Send;

    fn rsa_oaep_decrypt(
        &self,
        private_key: &[u8],
        data: &[u8],
    ) -> impl Future<Output = Result<Vec<u8>>> + Send;

    fn rsa_pss_sign(
        &self,
        private_key: &[u8],
        data: &[u8],
        salt_len: usize,
    ) -> impl Future<Output = Result<Vec<u8>>> + Send;

    fn rsa_pss_verify(
        &self,
        public_key: &[u8],
        data: &[u8],
        signature: &[u8],
        salt_len: usize,
    ) -> impl Future<Output = Result<bool>> + Send;
}
