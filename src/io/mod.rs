/*!
Reader/writer adapters for the envelope streams.

Input is read in `chunk_size` pieces, pushed through an encrypt or decrypt
stream and written out as it is produced. The returned count is the number
of bytes written.
*/

use std::io::{self, Read, Write};

use crate::core::{
    config::EnvelopeConfig,
    error::{invalid_arg, Result},
    provider::PrimitiveProvider,
    streaming::{DecryptStream, EncryptStream, StreamOptions},
    symmetric::SymmetricKey,
};

#[cfg(feature = "async")]
pub mod async_io;

#[cfg(feature = "async")]
pub use async_io::{decrypt_reader, encrypt_reader, pipe_async, AsyncChunkTransform};

/// A push/finish byte transform, implemented by the envelope streams
pub trait ChunkTransform {
    fn push(&mut self, chunk: &[u8]) -> Result<Vec<u8>>;
    fn finish(&mut self) -> Result<Vec<u8>>;
}

impl<P: PrimitiveProvider> ChunkTransform for EncryptStream<P> {
    fn push(&mut self, chunk: &[u8]) -> Result<Vec<u8>> {
        EncryptStream::push(self, chunk)
    }

    fn finish(&mut self) -> Result<Vec<u8>> {
        EncryptStream::finish(self)
    }
}

impl<P: PrimitiveProvider> ChunkTransform for DecryptStream<P> {
    fn push(&mut self, chunk: &[u8]) -> Result<Vec<u8>> {
        DecryptStream::push(self, chunk)
    }

    fn finish(&mut self) -> Result<Vec<u8>> {
        DecryptStream::finish(self)
    }
}

/// Drive `transform` from `reader` to `writer` until end of input
pub fn pipe<T, R, W>(transform: &mut T, reader: &mut R, writer: &mut W, chunk_size: usize) -> Result<u64>
where
    T: ChunkTransform + ?Sized,
    R: Read + ?Sized,
    W: Write + ?Sized,
{
    if chunk_size == 0 {
        return invalid_arg("chunk size must be greater than zero");
    }
    let mut buffer = vec![0u8; chunk_size];
    let mut written = 0u64;
    loop {
        let read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(read) => read,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        let output = transform.push(&buffer[..read])?;
        writer.write_all(&output)?;
        written += output.len() as u64;
    }
    let output = transform.finish()?;
    writer.write_all(&output)?;
    writer.flush()?;
    Ok(written + output.len() as u64)
}

/// Encrypt everything `reader` yields into `writer` as one envelope.
///
/// `config` supplies the chunk size and the progress interval; `options`
/// carries cancellation and the progress callback.
pub fn encrypt_to_writer<P, R, W>(
    key: &SymmetricKey<P>,
    reader: &mut R,
    writer: &mut W,
    config: &EnvelopeConfig,
    options: StreamOptions,
) -> Result<u64>
where
    P: PrimitiveProvider,
    R: Read + ?Sized,
    W: Write + ?Sized,
{
    config.validate()?;
    let mut stream = key.encrypt_stream(options.progress_interval(config.progress_interval));
    pipe(&mut stream, reader, writer, config.chunk_size)
}

/// Decrypt one envelope from `reader` into `writer`.
///
/// Plaintext reaches `writer` before the HMAC is checked; on error the
/// written output is unauthenticated and must be discarded.
pub fn decrypt_to_writer<P, R, W>(
    key: &SymmetricKey<P>,
    reader: &mut R,
    writer: &mut W,
    config: &EnvelopeConfig,
    options: StreamOptions,
) -> Result<u64>
where
    P: PrimitiveProvider,
    R: Read + ?Sized,
    W: Write + ?Sized,
{
    config.validate()?;
    let mut stream = key.decrypt_stream(options.progress_interval(config.progress_interval));
    pipe(&mut stream, reader, writer, config.chunk_size)
}
