/*!
Tokio reader/writer adapters for the async envelope streams.
*/

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::core::{
    config::EnvelopeConfig,
    error::{invalid_arg, Result},
    provider::AsyncPrimitiveProvider,
    streaming::{AsyncDecryptStream, AsyncEncryptStream, StreamOptions},
    symmetric::SymmetricKey,
};

/// Async counterpart of [`ChunkTransform`](super::ChunkTransform)
pub trait AsyncChunkTransform: Send {
    fn push(&mut self, chunk: &[u8]) -> impl Future<Output = Result<Vec<u8>>> + Send;
    fn finish(&mut self) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

impl<P: AsyncPrimitiveProvider> AsyncChunkTransform for AsyncEncryptStream<P> {
    async fn push(&mut self, chunk: &[u8]) -> Result<Vec<u8>> {
        AsyncEncryptStream::push(self, chunk).await
    }

    async fn finish(&mut self) -> Result<Vec<u8>> {
        AsyncEncryptStream::finish(self).await
    }
}

impl<P: AsyncPrimitiveProvider> AsyncChunkTransform for AsyncDecryptStream<P> {
    async fn push(&mut self, chunk: &[u8]) -> Result<Vec<u8>> {
        AsyncDecryptStream::push(self, chunk).await
    }

    async fn finish(&mut self) -> Result<Vec<u8>> {
        AsyncDecryptStream::finish(self).await
    }
}

/// Drive `transform` from `reader` to `writer` until end of input
pub async fn pipe_async<T, R, W>(
    transform: &mut T,
    reader: &mut R,
    writer: &mut W,
    chunk_size: usize,
) -> Result<u64>
where
    T: AsyncChunkTransform,
    R: AsyncRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    if chunk_size == 0 {
        return invalid_arg("chunk size must be greater than zero");
    }
    let mut buffer = vec![0u8; chunk_size];
    let mut written = 0u64;
    loop {
        let read = reader.read(&mut buffer).await?;
        if read == 0 {
            break;
        }
        let output = transform.push(&buffer[..read]).await?;
        writer.write_all(&output).await?;
        written += output.len() as u64;
    }
    let output = transform.finish().await?;
    writer.write_all(&output).await?;
    writer.flush().await?;
    Ok(written + output.len() as u64)
}

/// Encrypt everything `reader` yields into `writer` as one envelope.
///
/// The progress interval is taken from `config`, like
/// [`encrypt_to_writer`](super::encrypt_to_writer).
pub async fn encrypt_reader<P, R, W>(
    key: &SymmetricKey<P>,
    reader: &mut R,
    writer: &mut W,
    config: &EnvelopeConfig,
    options: StreamOptions,
) -> Result<u64>
where
    P: AsyncPrimitiveProvider,
    R: AsyncRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    config.validate()?;
    let mut stream = key.encrypt_stream_async(options.progress_interval(config.progress_interval));
    pipe_async(&mut stream, reader, writer, config.chunk_size).await
}

/// Decrypt one envelope from `reader` into `writer`.
///
/// As with [`decrypt_to_writer`](super::decrypt_to_writer), output written
/// before an error is unauthenticated.
pub async fn decrypt_reader<P, R, W>(
    key: &SymmetricKey<P>,
    reader: &mut R,
    writer: &mut W,
    config: &EnvelopeConfig,
    options: StreamOptions,
) -> Result<u64>
where
    P: AsyncPrimitiveProvider,
    R: AsyncRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    config.validate()?;
    let mut stream = key.decrypt_stream_async(options.progress_interval(config.progress_interval));
    pipe_async(&mut stream, reader, writer, config.chunk_size).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::core::{
        config::SymmetricKeySize,
        error::Error,
        provider::{OffloadedProvider, SoftwareProvider},
    };

    #[tokio::test]
    async fn test_async_reader_round_trip() -> Result<()> {
        let provider = Arc::new(OffloadedProvider::new(SoftwareProvider::new()));
        let key = SymmetricKey::generate_async(SymmetricKeySize::Aes192, provider).await?;
        let config = EnvelopeConfig::new().chunk_size(50);
        let clear = vec![0x42u8; 333];

        let mut sealed = Vec::new();
        encrypt_reader(&key, &mut clear.as_slice(), &mut sealed, &config, StreamOptions::new()).await?;
        assert_eq!(key.decrypt_async(&sealed).await?, clear);

        let mut opened = Vec::new();
        let written = decrypt_reader(&key, &mut sealed.as_slice(), &mut opened, &config, StreamOptions::new()).await?;
        assert_eq!(written, 333);
        assert_eq!(opened, clear);
        Ok(())
    }

    #[tokio::test]
    async fn test_async_reader_detects_tampering() -> Result<()> {
        let provider = Arc::new(OffloadedProvider::new(SoftwareProvider::new()));
        let key = SymmetricKey::generate_async(SymmetricKeySize::Aes256, provider).await?;
        let mut sealed = key.encrypt_async(b"integrity matters").await?;
        sealed[20] ^= 0x10;

        let result = decrypt_reader(
            &key,
            &mut sealed.as_slice(),
            &mut Vec::new(),
            &EnvelopeConfig::new(),
            StreamOptions::new(),
        )
        .await;
        assert!(matches!(result, Err(Error::InvalidHmac)));
        Ok(())
    }
}
