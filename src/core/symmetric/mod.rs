/*!
Symmetric envelope engine: AES-CBC with an HMAC-SHA256 trailer.
*/

pub mod envelope;
pub mod key;

pub use key::{SymmetricKey, SymmetricKeyMaterial};
