/*!
Asymmetric envelope framing.

```text
ciphertext = OAEP( CRC32(message) as u32 LE || message )   (CRC optional)
signature  = PSS( SHA-256(text) ), salt = ceil((bits - 1) / 8) - 32 - 2
```
*/

use byteorder::{ByteOrder, LittleEndian};

use crate::core::constants::sizes::{
    asymmetric::OAEP_OVERHEAD, sha256::DIGEST_SIZE, CRC_SIZE,
};
use crate::core::error::{Error, Result};

/// CRC-32 (IEEE) of `data`
pub fn crc32(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}

/// Prefix `message` with its little-endian CRC-32
pub fn with_crc(message: &[u8]) -> Vec<u8> {
    let mut payload = vec![0u8; CRC_SIZE];
    LittleEndian::write_u32(&mut payload, crc32(message));
    payload.extend_from_slice(message);
    payload
}

/// Check and remove the CRC-32 prefix
pub fn strip_crc(payload: &[u8]) -> Result<&[u8]> {
    if payload.len() < CRC_SIZE {
        log::warn!("asymmetric payload too short for its CRC32 prefix");
        return Err(Error::InvalidCrc32);
    }
    let (prefix, message) = payload.split_at(CRC_SIZE);
    if LittleEndian::read_u32(prefix) != crc32(message) {
        log::warn!("asymmetric payload failed CRC32 verification");
        return Err(Error::InvalidCrc32);
    }
    Ok(message)
}

/// PSS salt length for a modulus of `modulus_bits`
pub fn pss_salt_length(modulus_bits: usize) -> usize {
    modulus_bits
        .saturating_sub(1)
        .div_ceil(8)
        .saturating_sub(DIGEST_SIZE + 2)
}

/// Largest message `encrypt` accepts for the given modulus
pub fn max_message_len(modulus_bytes: usize, do_crc: bool) -> usize {
    let capacity = modulus_bytes.saturating_sub(OAEP_OVERHEAD);
    if do_crc {
        capacity.saturating_sub(CRC_SIZE)
    } else {
        capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc_known_value() {
        // Standard CRC-32 check value
        assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
        assert_eq!(with_crc(b"123456789")[..4], [0x26, 0x39, 0xF4, 0xCB]);
    }

    #[test]
    fn test_crc_round_trip() -> Result<()> {
        let messages: [&[u8]; 3] = [b"", b"x", b"hello world"];
        for message in messages {
            assert_eq!(strip_crc(&with_crc(message))?, message);
        }
        Ok(())
    }

    #[test]
    fn test_crc_mismatch() {
        let mut payload = with_crc(b"hello world");
        payload[6] ^= 0x80;
        assert!(matches!(strip_crc(&payload), Err(Error::InvalidCrc32)));
        assert!(matches!(strip_crc(&[1, 2, 3]), Err(Error::InvalidCrc32)));
    }

    #[test]
    fn test_salt_lengths() {
        assert_eq!(pss_salt_length(1024), 94);
        assert_eq!(pss_salt_length(2048), 222);
        assert_eq!(pss_salt_length(4096), 478);
    }

    #[test]
    fn test_message_limits() {
        assert_eq!(max_message_len(128, false), 86);
        assert_eq!(max_message_len(128, true), 82);
        assert_eq!(max_message_len(512, true), 466);
    }
}
