/*!
Asynchronous provider that offloads a synchronous one onto tokio's blocking pool.

Each primitive call becomes a blocking task. Streaming contexts move the inner
context into the task and take it back when the task completes, so updates on
one context are strictly serialized: the next chunk cannot be dispatched until
the previous one has resolved.
*/

use std::sync::Arc;

use zeroize::Zeroizing;

use crate::core::{
    constants::sizes::{sha256::DIGEST_SIZE, HMAC_SIZE},
    error::{ProviderError, Result},
};

use super::{
    AsyncCipherContext, AsyncMacContext, AsyncPrimitiveProvider, CipherContext, MacContext,
    PrimitiveProvider,
};

/// Run a blocking closure on the blocking pool
async fn run_blocking<T, F>(task: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|_| ProviderError::TaskFailed)?
}

/// Async adapter running a [`PrimitiveProvider`] off the async executor
#[derive(Debug)]
pub struct OffloadedProvider<P> {
    inner: Arc<P>,
}

impl<P> Clone for OffloadedProvider<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P: PrimitiveProvider + 'static> OffloadedProvider<P> {
    /// Wrap a synchronous provider
    pub fn new(inner: P) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Wrap a shared synchronous provider
    pub fn from_arc(inner: Arc<P>) -> Self {
        Self { inner }
    }

    /// The wrapped provider
    pub fn inner(&self) -> &P {
        &self.inner
    }
}

/// AES-CBC context whose updates run on the blocking pool
pub struct OffloadedCipher {
    context: Option<Box<dyn CipherContext>>,
}

impl AsyncCipherContext for OffloadedCipher {
    async fn update(&mut self, data: Vec<u8>) -> Result<Vec<u8>> {
        // A panicked task loses the context; later calls report TaskFailed
        let mut context = self.context.take().ok_or(ProviderError::TaskFailed)?;
        let (context, output) = run_blocking(move || {
            let output = context.update(&data);
            Ok((context, output))
        })
        .await?;
        self.context = Some(context);
        output
    }

    async fn finalize(mut self) -> Result<Vec<u8>> {
        let context = self.context.take().ok_or(ProviderError::TaskFailed)?;
        run_blocking(move || context.finalize()).await
    }
}

/// HMAC context whose updates run on the blocking pool
pub struct OffloadedMac {
    context: Option<Box<dyn MacContext>>,
}

impl AsyncMacContext for OffloadedMac {
    async fn update(&mut self, data: Vec<u8>) -> Result<()> {
        let mut context = self.context.take().ok_or(ProviderError::TaskFailed)?;
        let context = run_blocking(move || {
            context.update(&data);
            Ok(context)
        })
        .await?;
        self.context = Some(context);
        Ok(())
    }

    async fn finalize(mut self) -> Result<[u8; HMAC_SIZE]> {
        let context = self.context.take().ok_or(ProviderError::TaskFailed)?;
        run_blocking(move || Ok(context.finalize())).await
    }
}

impl<P: PrimitiveProvider + 'static> AsyncPrimitiveProvider for OffloadedProvider<P> {
    type Cipher = OffloadedCipher;
    type Mac = OffloadedMac;

    fn name(&self) -> &'static str {
        self.inner.name()
    }

    async fn random_bytes(&self, len: usize) -> Result<Vec<u8>> {
        let inner = Arc::clone(&self.inner);
        run_blocking(move || inner.random_bytes(len)).await
    }

    async fn aes_cbc_encryptor(&self, key: &[u8], iv: &[u8]) -> Result<OffloadedCipher> {
        let inner = Arc::clone(&self.inner);
        let key = Zeroizing::new(key.to_vec());
        let iv = iv.to_vec();
        let context = run_blocking(move || inner.aes_cbc_encryptor(&key, &iv)).await?;
        Ok(OffloadedCipher {
            context: Some(context),
        })
    }

    async fn aes_cbc_decryptor(&self, key: &[u8], iv: &[u8]) -> Result<OffloadedCipher> {
        let inner = Arc::clone(&self.inner);
        let key = Zeroizing::new(key.to_vec());
        let iv = iv.to_vec();
        let context = run_blocking(move || inner.aes_cbc_decryptor(&key, &iv)).await?;
        Ok(OffloadedCipher {
            context: Some(context),
        })
    }

    async fn hmac_sha256_context(&self, key: &[u8]) -> Result<OffloadedMac> {
        let inner = Arc::clone(&self.inner);
        let key = Zeroizing::new(key.to_vec());
        let context = run_blocking(move || inner.hmac_sha256_context(&key)).await?;
        Ok(OffloadedMac {
            context: Some(context),
        })
    }

    async fn aes_cbc_encrypt(&self, key: &[u8], iv: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
        let inner = Arc::clone(&self.inner);
        let key = Zeroizing::new(key.to_vec());
        let (iv, plaintext) = (iv.to_vec(), Zeroizing::new(plaintext.to_vec()));
        run_blocking(move || inner.aes_cbc_encrypt(&key, &iv, &plaintext)).await
    }

    async fn aes_cbc_decrypt(&self, key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
        let inner = Arc::clone(&self.inner);
        let key = Zeroizing::new(key.to_vec());
        let (iv, ciphertext) = (iv.to_vec(), ciphertext.to_vec());
        run_blocking(move || inner.aes_cbc_decrypt(&key, &iv, &ciphertext)).await
    }

    async fn hmac_sha256(&self, key: &[u8], data: &[u8]) -> Result<[u8; HMAC_SIZE]> {
        let inner = Arc::clone(&self.inner);
        let key = Zeroizing::new(key.to_vec());
        let data = data.to_vec();
        run_blocking(move || inner.hmac_sha256(&key, &data)).await
    }

    async fn sha256(&self, data: &[u8]) -> Result<[u8; DIGEST_SIZE]> {
        let inner = Arc::clone(&self.inner);
        let data = data.to_vec();
        run_blocking(move || inner.sha256(&data)).await
    }

    async fn rsa_generate_key_pair(&self, bits: usize) -> Result<Vec<u8>> {
        let inner = Arc::clone(&self.inner);
        run_blocking(move || inner.rsa_generate_key_pair(bits)).await
    }

    async fn rsa_oaep_encrypt(&self, public_key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
        let inner = Arc::clone(&self.inner);
        let (public_key, data) = (public_key.to_vec(), Zeroizing::new(data.to_vec()));
        run_blocking(move || inner.rsa_oaep_encrypt(&public_key, &data)).await
    }

    async fn rsa_oaep_decrypt(&self, private_key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
        let inner = Arc::clone(&self.inner);
        let (private_key, data) = (Zeroizing::new(private_key.to_vec()), data.to_vec());
        run_blocking(move || inner.rsa_oaep_decrypt(&private_key, &data)).await
    }

    async fn rsa_pss_sign(&self, private_key: &[u8], data: &[u8], salt_len: usize) -> Result<Vec<u8>> {
        let inner = Arc::clone(&self.inner);
        let (private_key, data) = (Zeroizing::new(private_key.to_vec()), data.to_vec());
        run_blocking(move || inner.rsa_pss_sign(&private_key, &data, salt_len)).await
    }

    async fn rsa_pss_verify(
        &self,
        public_key: &[u8],
        data: &[u8],
        signature: &[u8],
        salt_len: usize,
    ) -> Result<bool> {
        let inner = Arc::clone(&self.inner);
        let (public_key, data, signature) = (public_key.to_vec(), data.to_vec(), signature.to_vec());
        run_blocking(move || inner.rsa_pss_verify(&public_key, &data, &signature, salt_len)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::provider::SoftwareProvider;

    #[tokio::test]
    async fn test_offloaded_matches_inline() -> Result<()> {
        let sync = SoftwareProvider::new();
        let offloaded = OffloadedProvider::new(SoftwareProvider::new());
        let key = [7u8; 24];
        let iv = [9u8; 16];
        let data = b"offloaded and inline agree";

        let expected = sync.aes_cbc_encrypt(&key, &iv, data)?;
        let actual = offloaded.aes_cbc_encrypt(&key, &iv, data).await?;
        assert_eq!(actual, expected);

        assert_eq!(
            offloaded.hmac_sha256(&key, data).await?,
            sync.hmac_sha256(&key, data)?
        );
        assert_eq!(offloaded.sha256(data).await?, sync.sha256(data)?);
        Ok(())
    }

    #[tokio::test]
    async fn test_offloaded_contexts_serialize_updates() -> Result<()> {
        let offloaded = OffloadedProvider::new(SoftwareProvider::new());
        let key = [3u8; 16];
        let iv = [4u8; 16];
        let data: Vec<u8> = (0..=255u8).collect();

        let mut cipher = offloaded.aes_cbc_encryptor(&key, &iv).await?;
        let mut output = Vec::new();
        for chunk in data.chunks(33) {
            output.extend(cipher.update(chunk.to_vec()).await?);
        }
        output.extend(cipher.finalize().await?);

        assert_eq!(output, offloaded.aes_cbc_encrypt(&key, &iv, &data).await?);
        Ok(())
    }
}
