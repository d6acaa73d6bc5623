/*!
Incremental symmetric encryption.

Output is byte-identical in layout to [`SymmetricKey::encrypt`]: the IV is
emitted with the first step, ciphertext as it becomes available and the HMAC
last.

[`SymmetricKey::encrypt`]: crate::core::symmetric::SymmetricKey::encrypt
*/

use std::sync::Arc;

use crate::core::{
    constants::sizes::IV_SIZE,
    error::Result,
    provider::{CipherContext, MacContext, PrimitiveProvider},
    streaming::progress::{StreamControl, StreamOptions, Terminal},
    symmetric::SymmetricKeyMaterial,
};

#[cfg(feature = "async")]
use crate::core::provider::{AsyncCipherContext, AsyncMacContext, AsyncPrimitiveProvider};

/// Observable state of an encrypt stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncryptState {
    /// Nothing pushed yet, no IV drawn
    Ready,
    /// IV emitted, ciphertext flowing
    Encrypting,
    /// HMAC emitted
    Done,
    Failed,
    Canceled,
}

fn observed(control: &StreamControl, started: bool) -> EncryptState {
    match control.terminal() {
        Some(Terminal::Finished) => EncryptState::Done,
        Some(Terminal::Failed) => EncryptState::Failed,
        Some(Terminal::Canceled) => EncryptState::Canceled,
        None if started => EncryptState::Encrypting,
        None => EncryptState::Ready,
    }
}

struct Engine {
    cipher: Box<dyn CipherContext>,
    mac: Box<dyn MacContext>,
}

/// Push-based encryptor driven inline by a [`PrimitiveProvider`]
pub struct EncryptStream<P> {
    material: SymmetricKeyMaterial,
    provider: Arc<P>,
    control: StreamControl,
    engine: Option<Engine>,
}

impl<P: PrimitiveProvider> EncryptStream<P> {
    pub fn new(material: SymmetricKeyMaterial, provider: Arc<P>, options: StreamOptions) -> Self {
        Self {
            material,
            provider,
            control: StreamControl::new(options),
            engine: None,
        }
    }

    /// Encrypt a chunk. The first call also returns the IV.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<u8>> {
        self.control.begin()?;
        let result = self.encrypt_chunk(chunk);
        self.control.settle(result, chunk.len())
    }

    /// Flush the padding block and append the HMAC
    pub fn finish(&mut self) -> Result<Vec<u8>> {
        self.control.begin()?;
        let result = self.seal();
        let tail = self.control.settle(result, 0)?;
        self.control.complete();
        log::debug!("encrypt stream finished after {} bytes", self.control.processed());
        Ok(tail)
    }

    pub fn state(&self) -> EncryptState {
        observed(&self.control, self.engine.is_some())
    }

    /// Input bytes consumed so far
    pub fn processed(&self) -> u64 {
        self.control.processed()
    }

    fn open(&self, output: &mut Vec<u8>) -> Result<Engine> {
        let iv = self.provider.random_bytes(IV_SIZE)?;
        let cipher = self
            .provider
            .aes_cbc_encryptor(self.material.encryption_key(), &iv)?;
        let mut mac = self
            .provider
            .hmac_sha256_context(self.material.authentication_key())?;
        mac.update(&iv);
        output.extend_from_slice(&iv);
        log::debug!("encrypt stream started ({})", self.provider.name());
        Ok(Engine { cipher, mac })
    }

    fn encrypt_chunk(&mut self, chunk: &[u8]) -> Result<Vec<u8>> {
        let mut output = Vec::with_capacity(IV_SIZE + chunk.len());
        let mut engine = match self.engine.take() {
            Some(engine) => engine,
            None => self.open(&mut output)?,
        };
        let ciphertext = engine.cipher.update(chunk)?;
        engine.mac.update(&ciphertext);
        output.extend_from_slice(&ciphertext);
        self.engine = Some(engine);
        Ok(output)
    }

    fn seal(&mut self) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        let Engine { cipher, mut mac } = match self.engine.take() {
            Some(engine) => engine,
            None => self.open(&mut output)?,
        };
        let last = cipher.finalize()?;
        mac.update(&last);
        output.extend_from_slice(&last);
        output.extend_from_slice(&mac.finalize());
        Ok(output)
    }
}

#[cfg(feature = "async")]
struct AsyncEngine<P: AsyncPrimitiveProvider> {
    cipher: P::Cipher,
    mac: P::Mac,
}

/// Push-based encryptor awaiting an [`AsyncPrimitiveProvider`].
///
/// Each step awaits its primitive results before returning, so chunk order is
/// preserved. Dropping a step's future before it resolves poisons the stream.
#[cfg(feature = "async")]
pub struct AsyncEncryptStream<P: AsyncPrimitiveProvider> {
    material: SymmetricKeyMaterial,
    provider: Arc<P>,
    control: StreamControl,
    engine: Option<AsyncEngine<P>>,
}

#[cfg(feature = "async")]
impl<P: AsyncPrimitiveProvider> AsyncEncryptStream<P> {
    pub fn new(material: SymmetricKeyMaterial, provider: Arc<P>, options: StreamOptions) -> Self {
        Self {
            material,
            provider,
            control: StreamControl::new(options),
            engine: None,
        }
    }

    pub async fn push(&mut self, chunk: &[u8]) -> Result<Vec<u8>> {
        self.control.begin()?;
        let result = self.encrypt_chunk(chunk).await;
        self.control.settle(result, chunk.len())
    }

    pub async fn finish(&mut self) -> Result<Vec<u8>> {
        self.control.begin()?;
        let result = self.seal().await;
        let tail = self.control.settle(result, 0)?;
        self.control.complete();
        log::debug!("encrypt stream finished after {} bytes", self.control.processed());
        Ok(tail)
    }

    pub fn state(&self) -> EncryptState {
        observed(&self.control, self.engine.is_some())
    }

    pub fn processed(&self) -> u64 {
        self.control.processed()
    }

    // Borrows fields rather than `&self` so the step futures stay `Send`
    async fn open(
        provider: &P,
        material: &SymmetricKeyMaterial,
        output: &mut Vec<u8>,
    ) -> Result<AsyncEngine<P>> {
        let iv = provider.random_bytes(IV_SIZE).await?;
        let cipher = provider
            .aes_cbc_encryptor(material.encryption_key(), &iv)
            .await?;
        let mut mac = provider
            .hmac_sha256_context(material.authentication_key())
            .await?;
        mac.update(iv.clone()).await?;
        output.extend_from_slice(&iv);
        log::debug!("async encrypt stream started ({})", provider.name());
        Ok(AsyncEngine { cipher, mac })
    }

    async fn encrypt_chunk(&mut self, chunk: &[u8]) -> Result<Vec<u8>> {
        let mut output = Vec::with_capacity(IV_SIZE + chunk.len());
        let mut engine = match self.engine.take() {
            Some(engine) => engine,
            None => Self::open(&self.provider, &self.material, &mut output).await?,
        };
        let ciphertext = engine.cipher.update(chunk.to_vec()).await?;
        output.extend_from_slice(&ciphertext);
        engine.mac.update(ciphertext).await?;
        self.engine = Some(engine);
        Ok(output)
    }

    async fn seal(&mut self) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        let AsyncEngine { cipher, mut mac } = match self.engine.take() {
            Some(engine) => engine,
            None => Self::open(&self.provider, &self.material, &mut output).await?,
        };
        let last = cipher.finalize().await?;
        output.extend_from_slice(&last);
        mac.update(last).await?;
        output.extend_from_slice(&mac.finalize().await?);
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{
        config::SymmetricKeySize, error::Error, provider::SoftwareProvider,
        streaming::CancelHandle, symmetric::SymmetricKey,
    };

    fn key() -> Result<SymmetricKey<SoftwareProvider>> {
        SymmetricKey::generate(SymmetricKeySize::Aes256, Arc::new(SoftwareProvider::new()))
    }

    #[test]
    fn test_first_push_emits_iv() -> Result<()> {
        let key = key()?;
        let mut stream = key.encrypt_stream(StreamOptions::new());
        assert_eq!(stream.state(), EncryptState::Ready);

        let head = stream.push(b"0123456789")?;
        assert_eq!(head.len(), IV_SIZE);
        assert_eq!(stream.state(), EncryptState::Encrypting);

        let rest = stream.finish()?;
        assert_eq!(rest.len(), 16 + 32);
        assert_eq!(stream.state(), EncryptState::Done);

        let sealed = [head, rest].concat();
        assert_eq!(key.decrypt(&sealed)?, b"0123456789");
        Ok(())
    }

    #[test]
    fn test_finish_without_input() -> Result<()> {
        let key = key()?;
        let mut stream = key.encrypt_stream(StreamOptions::new());
        let sealed = stream.finish()?;
        assert_eq!(sealed.len(), 16 + 16 + 32);
        assert!(key.decrypt(&sealed)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_finished_stream_refuses_work() -> Result<()> {
        let key = key()?;
        let mut stream = key.encrypt_stream(StreamOptions::new());
        stream.finish()?;
        assert!(matches!(stream.push(b"late"), Err(Error::InvalidStream(_))));
        assert!(matches!(stream.finish(), Err(Error::InvalidStream(_))));
        Ok(())
    }

    #[test]
    fn test_cancel_before_push() -> Result<()> {
        let key = key()?;
        let cancel = CancelHandle::new();
        let mut stream = key.encrypt_stream(StreamOptions::new().with_cancel(cancel.clone()));
        stream.push(&[0u8; 64])?;
        cancel.cancel();
        assert!(matches!(stream.push(&[0u8; 64]), Err(Error::StreamCanceled)));
        assert!(matches!(stream.finish(), Err(Error::StreamCanceled)));
        assert_eq!(stream.state(), EncryptState::Canceled);
        assert_eq!(stream.processed(), 64);
        Ok(())
    }
}
