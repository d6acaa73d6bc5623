#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use envelope_crypto::{
    sizes::{sha256::DIGEST_SIZE, HMAC_SIZE},
    CancelHandle, CipherContext, MacContext, PrimitiveProvider, Result, SoftwareProvider,
};

/// Provider that delegates to the software one but withholds all cipher
/// output until finalize, so callers cannot rely on output granularity.
#[derive(Debug, Default)]
pub struct LazyProvider {
    inner: SoftwareProvider,
}

struct LazyCipher {
    inner: Box<dyn CipherContext>,
    held: Vec<u8>,
}

impl CipherContext for LazyCipher {
    fn update(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        let output = self.inner.update(data)?;
        self.held.extend_from_slice(&output);
        Ok(Vec::new())
    }

    fn finalize(self: Box<Self>) -> Result<Vec<u8>> {
        let LazyCipher { inner, mut held } = *self;
        held.extend_from_slice(&inner.finalize()?);
        Ok(held)
    }
}

impl PrimitiveProvider for LazyProvider {
    fn name(&self) -> &'static str {
        "lazy"
    }

    fn random_bytes(&self, len: usize) -> Result<Vec<u8>> {
        self.inner.random_bytes(len)
    }

    fn aes_cbc_encryptor(&self, key: &[u8], iv: &[u8]) -> Result<Box<dyn CipherContext>> {
        Ok(Box::new(LazyCipher {
            inner: self.inner.aes_cbc_encryptor(key, iv)?,
            held: Vec::new(),
        }))
    }

    fn aes_cbc_decryptor(&self, key: &[u8], iv: &[u8]) -> Result<Box<dyn CipherContext>> {
        Ok(Box::new(LazyCipher {
            inner: self.inner.aes_cbc_decryptor(key, iv)?,
            held: Vec::new(),
        }))
    }

    fn hmac_sha256_context(&self, key: &[u8]) -> Result<Box<dyn MacContext>> {
        self.inner.hmac_sha256_context(key)
    }

    fn sha256(&self, data: &[u8]) -> Result<[u8; DIGEST_SIZE]> {
        self.inner.sha256(data)
    }

    fn rsa_generate_key_pair(&self, bits: usize) -> Result<Vec<u8>> {
        self.inner.rsa_generate_key_pair(bits)
    }

    fn rsa_oaep_encrypt(&self, public_key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
        self.inner.rsa_oaep_encrypt(public_key, data)
    }

    fn rsa_oaep_decrypt(&self, private_key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
        self.inner.rsa_oaep_decrypt(private_key, data)
    }

    fn rsa_pss_sign(&self, private_key: &[u8], data: &[u8], salt_len: usize) -> Result<Vec<u8>> {
        self.inner.rsa_pss_sign(private_key, data, salt_len)
    }

    fn rsa_pss_verify(
        &self,
        public_key: &[u8],
        data: &[u8],
        signature: &[u8],
        salt_len: usize,
    ) -> Result<bool> {
        self.inner.rsa_pss_verify(public_key, data, signature, salt_len)
    }

    fn hmac_sha256(&self, key: &[u8], data: &[u8]) -> Result<[u8; HMAC_SIZE]> {
        self.inner.hmac_sha256(key, data)
    }
}

/// Provider whose cipher contexts raise `cancel` from inside the
/// `cancel_on`-th update call, counted across all of its contexts.
#[derive(Debug)]
pub struct CancelingProvider {
    inner: SoftwareProvider,
    cancel: CancelHandle,
    cancel_on: usize,
    updates: Arc<AtomicUsize>,
}

impl CancelingProvider {
    pub fn new(cancel: CancelHandle, cancel_on: usize) -> Self {
        Self {
            inner: SoftwareProvider::new(),
            cancel,
            cancel_on,
            updates: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn wrap(&self, inner: Box<dyn CipherContext>) -> Box<dyn CipherContext> {
        Box::new(CancelingCipher {
            inner,
            cancel: self.cancel.clone(),
            cancel_on: self.cancel_on,
            updates: Arc::clone(&self.updates),
        })
    }
}

struct CancelingCipher {
    inner: Box<dyn CipherContext>,
    cancel: CancelHandle,
    cancel_on: usize,
    updates: Arc<AtomicUsize>,
}

impl CipherContext for CancelingCipher {
    fn update(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        let output = self.inner.update(data)?;
        if self.updates.fetch_add(1, Ordering::SeqCst) + 1 == self.cancel_on {
            self.cancel.cancel();
        }
        Ok(output)
    }

    fn finalize(self: Box<Self>) -> Result<Vec<u8>> {
        self.inner.finalize()
    }
}

impl PrimitiveProvider for CancelingProvider {
    fn name(&self) -> &'static str {
        "canceling"
    }

    fn random_bytes(&self, len: usize) -> Result<Vec<u8>> {
        self.inner.random_bytes(len)
    }

    fn aes_cbc_encryptor(&self, key: &[u8], iv: &[u8]) -> Result<Box<dyn CipherContext>> {
        Ok(self.wrap(self.inner.aes_cbc_encryptor(key, iv)?))
    }

    fn aes_cbc_decryptor(&self, key: &[u8], iv: &[u8]) -> Result<Box<dyn CipherContext>> {
        Ok(self.wrap(self.inner.aes_cbc_decryptor(key, iv)?))
    }

    fn hmac_sha256_context(&self, key: &[u8]) -> Result<Box<dyn MacContext>> {
        self.inner.hmac_sha256_context(key)
    }

    fn sha256(&self, data: &[u8]) -> Result<[u8; DIGEST_SIZE]> {
        self.inner.sha256(data)
    }

    fn rsa_generate_key_pair(&self, bits: usize) -> Result<Vec<u8>> {
        self.inner.rsa_generate_key_pair(bits)
    }

    fn rsa_oaep_encrypt(&self, public_key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
        self.inner.rsa_oaep_encrypt(public_key, data)
    }

    fn rsa_oaep_decrypt(&self, private_key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
        self.inner.rsa_oaep_decrypt(private_key, data)
    }

    fn rsa_pss_sign(&self, private_key: &[u8], data: &[u8], salt_len: usize) -> Result<Vec<u8>> {
        self.inner.rsa_pss_sign(private_key, data, salt_len)
    }

    fn rsa_pss_verify(
        &self,
        public_key: &[u8],
        data: &[u8],
        signature: &[u8],
        salt_len: usize,
    ) -> Result<bool> {
        self.inner.rsa_pss_verify(public_key, data, signature, salt_len)
    }
}

pub fn software() -> Arc<SoftwareProvider> {
    Arc::new(SoftwareProvider::new())
}

pub fn lazy() -> Arc<LazyProvider> {
    Arc::new(LazyProvider::default())
}

/// Deterministic test payload
pub fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 % 251) as u8).collect()
}

/// Message lengths around the block and envelope boundaries
pub const LENGTHS: [usize; 6] = [0, 1, 15, 16, 17, 1000];

/// Chunk sizes below, at and above the block and minimum envelope sizes
pub const CHUNK_SIZES: [usize; 8] = [1, 15, 16, 17, 47, 48, 49, 4096];
