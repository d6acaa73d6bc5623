/*!
DER envelope codec for RSA key material.

Keys travel either bare (PKCS#1 `RSAPublicKey` / `RSAPrivateKey`) or wrapped
in the standard envelopes (SPKI for public keys, PKCS#8 for private keys).
The codec detects which form a buffer holds, converts between the two, and
derives a wrapped public key from a private one. Encoding is plain DER, so
two independent codecs produce byte-identical output for the same key.
*/

use rsa::{
    pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey, EncodeRsaPrivateKey, EncodeRsaPublicKey},
    pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey},
    traits::PublicKeyParts,
    RsaPrivateKey, RsaPublicKey,
};

use crate::core::error::{invalid_key, Error, Result};

/// Which kind of key a buffer is expected to hold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Public,
    Private,
}

/// Encoding form of a DER buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyForm {
    /// Bare PKCS#1
    Bare,
    /// SPKI (public) or PKCS#8 (private)
    Wrapped,
}

fn decode_bare_public(der: &[u8]) -> Result<RsaPublicKey> {
    RsaPublicKey::from_pkcs1_der(der).map_err(|e| Error::InvalidKey(format!("PKCS#1 public key: {}", e)))
}

fn decode_wrapped_public(der: &[u8]) -> Result<RsaPublicKey> {
    RsaPublicKey::from_public_key_der(der).map_err(|e| Error::InvalidKey(format!("SPKI public key: {}", e)))
}

fn decode_bare_private(der: &[u8]) -> Result<RsaPrivateKey> {
    RsaPrivateKey::from_pkcs1_der(der).map_err(|e| Error::InvalidKey(format!("PKCS#1 private key: {}", e)))
}

fn decode_wrapped_private(der: &[u8]) -> Result<RsaPrivateKey> {
    RsaPrivateKey::from_pkcs8_der(der).map_err(|e| Error::InvalidKey(format!("PKCS#8 private key: {}", e)))
}

fn encode_wrapped_public(key: &RsaPublicKey) -> Result<Vec<u8>> {
    let document = key
        .to_public_key_der()
        .map_err(|e| Error::InvalidKey(format!("SPKI encoding: {}", e)))?;
    Ok(document.as_bytes().to_vec())
}

/// Detect whether `der` is bare or wrapped.
///
/// Both schemas are tried; exactly one must decode.
pub fn detect(der: &[u8], kind: KeyKind) -> Result<KeyForm> {
    if der.is_empty() {
        return invalid_key("empty key buffer");
    }
    let (bare, wrapped) = match kind {
        KeyKind::Public => (
            decode_bare_public(der).is_ok(),
            decode_wrapped_public(der).is_ok(),
        ),
        KeyKind::Private => (
            decode_bare_private(der).is_ok(),
            decode_wrapped_private(der).is_ok(),
        ),
    };
    match (bare, wrapped) {
        (true, false) => Ok(KeyForm::Bare),
        (false, true) => Ok(KeyForm::Wrapped),
        (true, true) => invalid_key("buffer decodes as both bare and wrapped key"),
        (false, false) => invalid_key(format!("buffer is not a DER encoded {:?} key", kind)),
    }
}

/// Wrap a bare PKCS#1 public key into SPKI
pub fn wrap_public(bare: &[u8]) -> Result<Vec<u8>> {
    encode_wrapped_public(&decode_bare_public(bare)?)
}

/// Unwrap an SPKI public key into bare PKCS#1
pub fn unwrap_public(wrapped: &[u8]) -> Result<Vec<u8>> {
    let document = decode_wrapped_public(wrapped)?
        .to_pkcs1_der()
        .map_err(|e| Error::InvalidKey(format!("PKCS#1 encoding: {}", e)))?;
    Ok(document.as_bytes().to_vec())
}

/// Wrap a bare PKCS#1 private key into PKCS#8
pub fn wrap_private(bare: &[u8]) -> Result<Vec<u8>> {
    encode_wrapped_private(&decode_bare_private(bare)?)
}

/// Unwrap a PKCS#8 private key into bare PKCS#1
pub fn unwrap_private(wrapped: &[u8]) -> Result<Vec<u8>> {
    let document = decode_wrapped_private(wrapped)?
        .to_pkcs1_der()
        .map_err(|e| Error::InvalidKey(format!("PKCS#1 encoding: {}", e)))?;
    Ok(document.as_bytes().to_vec())
}

fn encode_wrapped_private(key: &RsaPrivateKey) -> Result<Vec<u8>> {
    let document = key
        .to_pkcs8_der()
        .map_err(|e| Error::InvalidKey(format!("PKCS#8 encoding: {}", e)))?;
    Ok(document.as_bytes().to_vec())
}

/// Bring a key in either form to its canonical wrapped form.
///
/// Wrapped input is decoded and encoded again, so optional PKCS#8 v2 fields
/// and other non-canonical wrappings never reach the stored bytes.
pub fn normalize(der: &[u8], kind: KeyKind) -> Result<Vec<u8>> {
    match (detect(der, kind)?, kind) {
        (KeyForm::Wrapped, KeyKind::Public) => encode_wrapped_public(&decode_wrapped_public(der)?),
        (KeyForm::Wrapped, KeyKind::Private) => encode_wrapped_private(&decode_wrapped_private(der)?),
        (KeyForm::Bare, KeyKind::Public) => wrap_public(der),
        (KeyForm::Bare, KeyKind::Private) => wrap_private(der),
    }
}

/// Derive the wrapped public key of a wrapped private key.
///
/// Only the modulus and public exponent are carried over.
pub fn private_to_public(wrapped_private: &[u8]) -> Result<Vec<u8>> {
    let private = decode_wrapped_private(wrapped_private)?;
    encode_wrapped_public(&private.to_public_key())
}

/// Bit length of the modulus of a wrapped public key
pub fn modulus_bits(wrapped_public: &[u8]) -> Result<usize> {
    Ok(decode_wrapped_public(wrapped_public)?.n().bits())
}
