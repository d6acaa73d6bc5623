/*!
Validated RSA key material.

Material is stored in its wrapped form (SPKI / PKCS#8), which is what export
returns, alongside the bare PKCS#1 form handed to the provider.
*/

use std::fmt;

use zeroize::Zeroizing;

use crate::core::{
    config::AsymmetricKeySize,
    der::{self, KeyKind},
    error::{Error, Result},
};

use super::envelope::pss_salt_length;

fn supported_size(bits: usize) -> Result<AsymmetricKeySize> {
    AsymmetricKeySize::from_bits(bits)
        .map_err(|_| Error::InvalidKey(format!("unsupported RSA modulus of {} bits", bits)))
}

/// RSA public key material
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKeyMaterial {
    wrapped: Vec<u8>,
    bare: Vec<u8>,
    size: AsymmetricKeySize,
}

impl PublicKeyMaterial {
    /// Import a bare PKCS#1 or SPKI wrapped public key
    pub fn from_der(der: &[u8]) -> Result<Self> {
        Self::from_wrapped(der::normalize(der, KeyKind::Public)?)
    }

    fn from_wrapped(wrapped: Vec<u8>) -> Result<Self> {
        let size = supported_size(der::modulus_bits(&wrapped)?)?;
        let bare = der::unwrap_public(&wrapped)?;
        Ok(Self {
            wrapped,
            bare,
            size,
        })
    }

    /// SPKI DER
    pub fn wrapped(&self) -> &[u8] {
        &self.wrapped
    }

    /// PKCS#1 DER
    pub fn bare(&self) -> &[u8] {
        &self.bare
    }

    pub fn size(&self) -> AsymmetricKeySize {
        self.size
    }

    pub fn salt_length(&self) -> usize {
        pss_salt_length(self.size.bits())
    }
}

impl fmt::Debug for PublicKeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicKeyMaterial")
            .field("size", &self.size)
            .field("der_len", &self.wrapped.len())
            .finish()
    }
}

/// RSA private key material, wiped on drop
#[derive(Clone)]
pub struct PrivateKeyMaterial {
    wrapped: Zeroizing<Vec<u8>>,
    bare: Zeroizing<Vec<u8>>,
    public: PublicKeyMaterial,
}

impl PrivateKeyMaterial {
    /// Import a bare PKCS#1 or PKCS#8 wrapped private key.
    ///
    /// The public half is derived here and never the other way round.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let wrapped = Zeroizing::new(der::normalize(der, KeyKind::Private)?);
        let public = PublicKeyMaterial::from_wrapped(der::private_to_public(&wrapped)?)?;
        let bare = Zeroizing::new(der::unwrap_private(&wrapped)?);
        Ok(Self {
            wrapped,
            bare,
            public,
        })
    }

    /// PKCS#8 DER
    pub fn wrapped(&self) -> &[u8] {
        &self.wrapped
    }

    /// PKCS#1 DER
    pub fn bare(&self) -> &[u8] {
        &self.bare
    }

    pub fn public(&self) -> &PublicKeyMaterial {
        &self.public
    }

    pub fn size(&self) -> AsymmetricKeySize {
        self.public.size()
    }
}

impl fmt::Debug for PrivateKeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKeyMaterial")
            .field("public", &self.public)
            .finish_non_exhaustive()
    }
}
