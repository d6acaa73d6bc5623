/*!
Software primitive provider built on the RustCrypto crates.

AES-CBC is driven block by block so that streaming updates release output as
soon as whole blocks are available. The decryptor always holds back the last
complete block, because it may carry the PKCS#7 padding.
*/

use aes::{Aes128, Aes192, Aes256};
use cbc::cipher::{generic_array::GenericArray, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use hmac::{Hmac, Mac};
use rand::RngCore;
use rsa::{
    pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey, EncodeRsaPrivateKey},
    rand_core::OsRng,
    Oaep, Pss, RsaPrivateKey, RsaPublicKey,
};
use sha1::Sha1;
use sha2::{Digest, Sha256};
use subtle::{ConstantTimeEq, ConstantTimeGreater};

use crate::core::{
    constants::sizes::{sha256::DIGEST_SIZE, BLOCK_SIZE, HMAC_SIZE, IV_SIZE},
    error::{ProviderError, Result},
};

use super::{CipherContext, MacContext, PrimitiveProvider};

type HmacSha256 = Hmac<Sha256>;

/// Provider running every primitive in-process on RustCrypto
#[derive(Debug, Clone, Copy, Default)]
pub struct SoftwareProvider;

impl SoftwareProvider {
    /// Create a new software provider
    pub fn new() -> Self {
        Self
    }
}

enum CbcEncryptor {
    Aes128(cbc::Encryptor<Aes128>),
    Aes192(cbc::Encryptor<Aes192>),
    Aes256(cbc::Encryptor<Aes256>),
}

impl CbcEncryptor {
    fn new(key: &[u8], iv: &[u8]) -> Result<Self> {
        if iv.len() != IV_SIZE {
            return Err(ProviderError::CipherFailed.into());
        }
        let cipher = match key.len() {
            16 => cbc::Encryptor::<Aes128>::new_from_slices(key, iv).map(CbcEncryptor::Aes128),
            24 => cbc::Encryptor::<Aes192>::new_from_slices(key, iv).map(CbcEncryptor::Aes192),
            32 => cbc::Encryptor::<Aes256>::new_from_slices(key, iv).map(CbcEncryptor::Aes256),
            other => return Err(ProviderError::UnsupportedKeySize(other).into()),
        };
        cipher.map_err(|_| ProviderError::CipherFailed.into())
    }

    /// Encrypt whole blocks in place; `buf.len()` is a multiple of the block size
    fn encrypt_blocks(&mut self, buf: &mut [u8]) {
        for block in buf.chunks_exact_mut(BLOCK_SIZE) {
            let block = GenericArray::from_mut_slice(block);
            match self {
                CbcEncryptor::Aes128(c) => c.encrypt_block_mut(block),
                CbcEncryptor::Aes192(c) => c.encrypt_block_mut(block),
                CbcEncryptor::Aes256(c) => c.encrypt_block_mut(block),
            }
        }
    }
}

enum CbcDecryptor {
    Aes128(cbc::Decryptor<Aes128>),
    Aes192(cbc::Decryptor<Aes192>),
    Aes256(cbc::Decryptor<Aes256>),
}

impl CbcDecryptor {
    fn new(key: &[u8], iv: &[u8]) -> Result<Self> {
        if iv.len() != IV_SIZE {
            return Err(ProviderError::CipherFailed.into());
        }
        let cipher = match key.len() {
            16 => cbc::Decryptor::<Aes128>::new_from_slices(key, iv).map(CbcDecryptor::Aes128),
            24 => cbc::Decryptor::<Aes192>::new_from_slices(key, iv).map(CbcDecryptor::Aes192),
            32 => cbc::Decryptor::<Aes256>::new_from_slices(key, iv).map(CbcDecryptor::Aes256),
            other => return Err(ProviderError::UnsupportedKeySize(other).into()),
        };
        cipher.map_err(|_| ProviderError::CipherFailed.into())
    }

    fn decrypt_blocks(&mut self, buf: &mut [u8]) {
        for block in buf.chunks_exact_mut(BLOCK_SIZE) {
            let block = GenericArray::from_mut_slice(block);
            match self {
                CbcDecryptor::Aes128(c) => c.decrypt_block_mut(block),
                CbcDecryptor::Aes192(c) => c.decrypt_block_mut(block),
                CbcDecryptor::Aes256(c) => c.decrypt_block_mut(block),
            }
        }
    }
}

struct CbcEncryptContext {
    cipher: CbcEncryptor,
    pending: Vec<u8>,
}

impl CipherContext for CbcEncryptContext {
    fn update(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        self.pending.extend_from_slice(data);
        let ready = self.pending.len() - self.pending.len() % BLOCK_SIZE;
        let mut output: Vec<u8> = self.pending.drain(..ready).collect();
        self.cipher.encrypt_blocks(&mut output);
        Ok(output)
    }

    fn finalize(mut self: Box<Self>) -> Result<Vec<u8>> {
        // PKCS#7: always 1..=16 bytes of padding
        let pad = BLOCK_SIZE - self.pending.len();
        let mut output = std::mem::take(&mut self.pending);
        output.resize(BLOCK_SIZE, pad as u8);
        self.cipher.encrypt_blocks(&mut output);
        Ok(output)
    }
}

struct CbcDecryptContext {
    cipher: CbcDecryptor,
    pending: Vec<u8>,
}

impl CipherContext for CbcDecryptContext {
    fn update(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        self.pending.extend_from_slice(data);
        if self.pending.len() <= BLOCK_SIZE {
            return Ok(Vec::new());
        }
        let ready = (self.pending.len() - 1) / BLOCK_SIZE * BLOCK_SIZE;
        let mut output: Vec<u8> = self.pending.drain(..ready).collect();
        self.cipher.decrypt_blocks(&mut output);
        Ok(output)
    }

    fn finalize(mut self: Box<Self>) -> Result<Vec<u8>> {
        if self.pending.len() != BLOCK_SIZE {
            return Err(ProviderError::CipherFailed.into());
        }
        let mut output = std::mem::take(&mut self.pending);
        self.cipher.decrypt_blocks(&mut output);

        let pad = pkcs7_padding_len(&output).ok_or(ProviderError::CipherFailed)?;
        output.truncate(BLOCK_SIZE - pad);
        Ok(output)
    }
}

/// Padding length of a final decrypted block, checked in constant time
fn pkcs7_padding_len(block: &[u8]) -> Option<usize> {
    let pad = block[BLOCK_SIZE - 1];
    let mut valid = !pad.ct_eq(&0) & !pad.ct_gt(&(BLOCK_SIZE as u8));
    for (i, byte) in block.iter().enumerate() {
        let from_end = (BLOCK_SIZE - i) as u8;
        let padded = !from_end.ct_gt(&pad);
        valid &= !padded | byte.ct_eq(&pad);
    }
    bool::from(valid).then_some(pad as usize)
}

struct HmacContext {
    mac: HmacSha256,
}

impl MacContext for HmacContext {
    fn update(&mut self, data: &[u8]) {
        self.mac.update(data);
    }

    fn finalize(self: Box<Self>) -> [u8; HMAC_SIZE] {
        let tag = self.mac.finalize().into_bytes();
        let mut output = [0u8; HMAC_SIZE];
        output.copy_from_slice(&tag);
        output
    }
}

fn decode_public(public_key: &[u8]) -> Result<RsaPublicKey> {
    RsaPublicKey::from_pkcs1_der(public_key).map_err(|_| ProviderError::RsaFailed.into())
}

fn decode_private(private_key: &[u8]) -> Result<RsaPrivateKey> {
    RsaPrivateKey::from_pkcs1_der(private_key).map_err(|_| ProviderError::RsaFailed.into())
}

fn sha256_digest(data: &[u8]) -> [u8; DIGEST_SIZE] {
    let mut output = [0u8; DIGEST_SIZE];
    output.copy_from_slice(&Sha256::digest(data));
    output
}

impl PrimitiveProvider for SoftwareProvider {
    fn name(&self) -> &'static str {
        "software"
    }

    fn random_bytes(&self, len: usize) -> Result<Vec<u8>> {
        let mut bytes = vec![0u8; len];
        rand::rng().fill_bytes(&mut bytes);
        Ok(bytes)
    }

    fn aes_cbc_encryptor(&self, key: &[u8], iv: &[u8]) -> Result<Box<dyn CipherContext>> {
        Ok(Box::new(CbcEncryptContext {
            cipher: CbcEncryptor::new(key, iv)?,
            pending: Vec::with_capacity(BLOCK_SIZE),
        }))
    }

    fn aes_cbc_decryptor(&self, key: &[u8], iv: &[u8]) -> Result<Box<dyn CipherContext>> {
        Ok(Box::new(CbcDecryptContext {
            cipher: CbcDecryptor::new(key, iv)?,
            pending: Vec::with_capacity(2 * BLOCK_SIZE),
        }))
    }

    fn hmac_sha256_context(&self, key: &[u8]) -> Result<Box<dyn MacContext>> {
        let mac = <HmacSha256 as Mac>::new_from_slice(key).map_err(|_| ProviderError::MacFailed)?;
        Ok(Box::new(HmacContext { mac }))
    }

    fn sha256(&self, data: &[u8]) -> Result<[u8; DIGEST_SIZE]> {
        Ok(sha256_digest(data))
    }

    fn rsa_generate_key_pair(&self, bits: usize) -> Result<Vec<u8>> {
        let key = RsaPrivateKey::new(&mut OsRng, bits).map_err(|_| ProviderError::RsaFailed)?;
        let der = key.to_pkcs1_der().map_err(|_| ProviderError::RsaFailed)?;
        Ok(der.as_bytes().to_vec())
    }

    fn rsa_oaep_encrypt(&self, public_key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
        let key = decode_public(public_key)?;
        key.encrypt(&mut OsRng, Oaep::new::<Sha1>(), data)
            .map_err(|_| ProviderError::RsaFailed.into())
    }

    fn rsa_oaep_decrypt(&self, private_key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
        let key = decode_private(private_key)?;
        key.decrypt(Oaep::new::<Sha1>(), data)
            .map_err(|_| ProviderError::RsaFailed.into())
    }

    fn rsa_pss_sign(&self, private_key: &[u8], data: &[u8], salt_len: usize) -> Result<Vec<u8>> {
        let key = decode_private(private_key)?;
        let digest = sha256_digest(data);
        key.sign_with_rng(&mut OsRng, Pss::new_with_salt::<Sha256>(salt_len), &digest)
            .map_err(|_| ProviderError::RsaFailed.into())
    }

    fn rsa_pss_verify(
        &self,
        public_key: &[u8],
        data: &[u8],
        signature: &[u8],
        salt_len: usize,
    ) -> Result<bool> {
        let key = decode_public(public_key)?;
        let digest = sha256_digest(data);
        Ok(key
            .verify(Pss::new_with_salt::<Sha256>(salt_len), &digest, signature)
            .is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cbc_known_answer() -> Result<()> {
        // NIST SP 800-38A F.2.1, first block
        let key: [u8; 16] = [
            0x2b, 0x7e, 0x15, 0x16, 0x28, 0xae, 0xd2, 0xa6, 0xab, 0xf7, 0x15, 0x88, 0x09, 0xcf,
            0x4f, 0x3c,
        ];
        let iv: [u8; 16] = std::array::from_fn(|i| i as u8);
        let plaintext: [u8; 16] = [
            0x6b, 0xc1, 0xbe, 0xe2, 0x2e, 0x40, 0x9f, 0x96, 0xe9, 0x3d, 0x7e, 0x11, 0x73, 0x93,
            0x17, 0x2a,
        ];
        let expected: [u8; 16] = [
            0x76, 0x49, 0xab, 0xac, 0x81, 0x19, 0xb2, 0x46, 0xce, 0xe9, 0x8e, 0x9b, 0x12, 0xe9,
            0x19, 0x7d,
        ];

        let provider = SoftwareProvider::new();
        let ciphertext = provider.aes_cbc_encrypt(&key, &iv, &plaintext)?;
        // One data block plus a full padding block
        assert_eq!(ciphertext.len(), 32);
        assert_eq!(&ciphertext[..16], &expected);

        let decrypted = provider.aes_cbc_decrypt(&key, &iv, &ciphertext)?;
        assert_eq!(decrypted, plaintext);
        Ok(())
    }

    #[test]
    fn test_incremental_matches_one_shot() -> Result<()> {
        let provider = SoftwareProvider::new();
        let key = [0x42u8; 32];
        let iv = [0x24u8; 16];
        let data: Vec<u8> = (0..100u8).collect();

        let one_shot = provider.aes_cbc_encrypt(&key, &iv, &data)?;

        let mut cipher = provider.aes_cbc_encryptor(&key, &iv)?;
        let mut incremental = Vec::new();
        for chunk in data.chunks(7) {
            incremental.extend(cipher.update(chunk)?);
        }
        incremental.extend(cipher.finalize()?);
        assert_eq!(incremental, one_shot);

        let mut decipher = provider.aes_cbc_decryptor(&key, &iv)?;
        let mut plain = Vec::new();
        for chunk in one_shot.chunks(5) {
            plain.extend(decipher.update(chunk)?);
        }
        plain.extend(decipher.finalize()?);
        assert_eq!(plain, data);
        Ok(())
    }

    #[test]
    fn test_pkcs7_padding_len() {
        let mut block = [0xAAu8; BLOCK_SIZE];
        block[BLOCK_SIZE - 1] = 1;
        assert_eq!(pkcs7_padding_len(&block), Some(1));

        block[BLOCK_SIZE - 4..].fill(4);
        assert_eq!(pkcs7_padding_len(&block), Some(4));

        assert_eq!(pkcs7_padding_len(&[16u8; BLOCK_SIZE]), Some(16));

        // Inconsistent, zero and oversized padding
        block[BLOCK_SIZE - 3] = 5;
        assert_eq!(pkcs7_padding_len(&block), None);
        block[BLOCK_SIZE - 1] = 0;
        assert_eq!(pkcs7_padding_len(&block), None);
        assert_eq!(pkcs7_padding_len(&[17u8; BLOCK_SIZE]), None);
    }

    #[test]
    fn test_bad_padding_fails_finalize() -> Result<()> {
        let provider = SoftwareProvider::new();
        let key = [0x42u8; 16];
        let iv = [0x24u8; 16];
        let mut ciphertext = provider.aes_cbc_encrypt(&key, &iv, b"sixteen byte msg")?;
        // CBC: flipping a byte of the previous block flips the same padding byte
        let last = ciphertext.len() - BLOCK_SIZE - 1;
        ciphertext[last] ^= 0x03;
        assert!(matches!(
            provider.aes_cbc_decrypt(&key, &iv, &ciphertext),
            Err(crate::Error::Provider(ProviderError::CipherFailed))
        ));
        Ok(())
    }

    #[test]
    fn test_unsupported_key_size() {
        let provider = SoftwareProvider::new();
        let result = provider.aes_cbc_encryptor(&[0u8; 20], &[0u8; 16]);
        assert!(matches!(
            result,
            Err(crate::Error::Provider(ProviderError::UnsupportedKeySize(20)))
        ));
    }

    #[test]
    fn test_truncated_ciphertext_fails() -> Result<()> {
        let provider = SoftwareProvider::new();
        let key = [1u8; 16];
        let iv = [2u8; 16];
        let ciphertext = provider.aes_cbc_encrypt(&key, &iv, b"hello world")?;
        assert!(provider.aes_cbc_decrypt(&key, &iv, &ciphertext[..8]).is_err());
        assert!(provider.aes_cbc_decrypt(&key, &iv, &[]).is_err());
        Ok(())
    }

    #[test]
    fn test_hmac_known_answer() -> Result<()> {
        // RFC 4231 test case 2
        let provider = SoftwareProvider::new();
        let tag = provider.hmac_sha256(b"Jefe", b"what do ya want for nothing?")?;
        let expected: [u8; 32] = [
            0x5b, 0xdc, 0xc1, 0x46, 0xbf, 0x60, 0x75, 0x4e, 0x6a, 0x04, 0x24, 0x26, 0x08, 0x95,
            0x75, 0xc7, 0x5a, 0x00, 0x3f, 0x08, 0x9d, 0x27, 0x39, 0x83, 0x9d, 0xec, 0x58, 0xb9,
            0x64, 0xec, 0x38, 0x43,
        ];
        assert_eq!(tag, expected);
        Ok(())
    }

    #[test]
    fn test_random_bytes() -> Result<()> {
        let provider = SoftwareProvider::new();
        let a = provider.random_bytes(32)?;
        let b = provider.random_bytes(32)?;
        assert_eq!(a.len(), 32);
        assert_ne!(a, b);
        assert!(provider.random_bytes(0)?.is_empty());
        Ok(())
    }
}
