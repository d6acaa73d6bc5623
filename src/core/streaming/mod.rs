/*!
Incremental symmetric envelopes.

Streams produce and consume exactly the block envelope layout, so a stream
may be decrypted as a block and vice versa. Each stream is owned by one
caller and driven through `&mut self`; it ends in a terminal state after
`finish`, the first error, or an observed cancel.
*/

pub mod decrypt;
pub mod encrypt;
pub mod lookahead;
pub mod progress;

pub use decrypt::{DecryptState, DecryptStream};
pub use encrypt::{EncryptState, EncryptStream};
pub use progress::{CancelHandle, ProgressCallback, StreamOptions};

#[cfg(feature = "async")]
pub use decrypt::AsyncDecryptStream;
#[cfg(feature = "async")]
pub use encrypt::AsyncEncryptStream;
