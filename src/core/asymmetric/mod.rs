/*!
Asymmetric envelope engine: CRC-guarded RSA-OAEP and RSA-PSS.
*/

pub mod envelope;
pub mod key;
pub mod material;

pub use key::{PrivateKey, PublicKey};
pub use material::{PrivateKeyMaterial, PublicKeyMaterial};
