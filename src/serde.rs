/*!
Serialization support for exported keys.

This module provides serializable export forms for symmetric and RSA keys.
It's only built when the `serde-support` feature is enabled. The forms carry
the same base64 encodings the key types export, so they can be restored with
any provider.
*/

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::core::{
    asymmetric::{PrivateKey, PublicKey},
    error::{invalid_arg, invalid_key, Result},
    symmetric::SymmetricKey,
};

/// Serializable symmetric key: key size in bits and base64 `auth || enc` material
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct SerdeSymmetricKey {
    pub key_size: u16,
    pub key: String,
}

impl<P> From<&SymmetricKey<P>> for SerdeSymmetricKey {
    fn from(key: &SymmetricKey<P>) -> Self {
        Self {
            key_size: key.key_size().bits() as u16,
            key: key.to_b64(),
        }
    }
}

impl SerdeSymmetricKey {
    /// Restore the key, bound to `provider`
    pub fn to_key<P>(&self, provider: Arc<P>) -> Result<SymmetricKey<P>> {
        let key = SymmetricKey::from_b64(&self.key, provider)?;
        if key.key_size().bits() != usize::from(self.key_size) {
            return invalid_arg(format!(
                "declared key size {} does not match {}-bit material",
                self.key_size,
                key.key_size().bits()
            ));
        }
        Ok(key)
    }
}

impl std::fmt::Debug for SerdeSymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerdeSymmetricKey")
            .field("key_size", &self.key_size)
            .finish_non_exhaustive()
    }
}

/// Serializable RSA key: base64 PKCS#8, or base64 SPKI when `public_only`
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct SerdeAsymmetricKey {
    pub public_only: bool,
    pub der_b64: String,
}

impl<P> From<&PublicKey<P>> for SerdeAsymmetricKey {
    fn from(key: &PublicKey<P>) -> Self {
        Self {
            public_only: true,
            der_b64: key.to_b64(),
        }
    }
}

impl<P> From<&PrivateKey<P>> for SerdeAsymmetricKey {
    fn from(key: &PrivateKey<P>) -> Self {
        Self {
            public_only: false,
            der_b64: key.to_b64(false),
        }
    }
}

impl SerdeAsymmetricKey {
    /// Restore the public key, deriving it when a private key was exported
    pub fn to_public_key<P>(&self, provider: Arc<P>) -> Result<PublicKey<P>> {
        if self.public_only {
            PublicKey::from_b64(&self.der_b64, provider)
        } else {
            Ok(PrivateKey::from_b64(&self.der_b64, provider)?.public_key().clone())
        }
    }

    /// Restore the private key
    pub fn to_private_key<P>(&self, provider: Arc<P>) -> Result<PrivateKey<P>> {
        if self.public_only {
            return invalid_key("public-only export carries no private key");
        }
        PrivateKey::from_b64(&self.der_b64, provider)
    }
}

impl std::fmt::Debug for SerdeAsymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerdeAsymmetricKey")
            .field("public_only", &self.public_only)
            .finish_non_exhaustive()
    }
}
