mod common;

use common::{lazy, payload, software, LENGTHS};
use envelope_crypto::{
    sizes::{HMAC_SIZE, IV_SIZE, MIN_ENVELOPE_SIZE},
    EnvelopeConfig, Error, ErrorKind, Result, SymmetricKey, SymmetricKeySize,
};

const SIZES: [SymmetricKeySize; 3] = [
    SymmetricKeySize::Aes128,
    SymmetricKeySize::Aes192,
    SymmetricKeySize::Aes256,
];

// ----- Round Trip Tests -----

#[test]
fn test_round_trip_all_sizes_and_lengths() -> Result<()> {
    for size in SIZES {
        let key = SymmetricKey::generate(size, software())?;
        for len in LENGTHS {
            let clear = payload(len);
            let sealed = key.encrypt(&clear)?;
            assert!(sealed.len() >= MIN_ENVELOPE_SIZE + 16);
            assert_eq!(key.decrypt(&sealed)?, clear, "{:?}, {} bytes", size, len);
        }
    }
    Ok(())
}

#[test]
fn test_generate_with_config_size() -> Result<()> {
    let compact = SymmetricKey::generate_with(&EnvelopeConfig::compact(), software())?;
    assert_eq!(compact.key_size(), SymmetricKeySize::Aes128);
    assert_eq!(compact.to_bytes().len(), 32);

    let default = SymmetricKey::generate_with(&EnvelopeConfig::default(), software())?;
    assert_eq!(default.key_size(), SymmetricKeySize::Aes256);
    assert_eq!(default.decrypt(&default.encrypt(b"configured")?)?, b"configured");
    Ok(())
}

#[test]
fn test_cross_provider_round_trip() -> Result<()> {
    for size in SIZES {
        let software_key = SymmetricKey::generate(size, software())?;
        let lazy_key = software_key.with_provider(lazy());

        for len in LENGTHS {
            let clear = payload(len);
            assert_eq!(lazy_key.decrypt(&software_key.encrypt(&clear)?)?, clear);
            assert_eq!(software_key.decrypt(&lazy_key.encrypt(&clear)?)?, clear);
        }
    }
    Ok(())
}

// ----- Authentication Tests -----

#[test]
fn test_single_bit_tamper_detected_everywhere() -> Result<()> {
    let key = SymmetricKey::generate(SymmetricKeySize::Aes256, software())?;
    let sealed = key.encrypt(&payload(40))?;

    for index in 0..sealed.len() {
        for bit in [0u8, 3, 7] {
            let mut tampered = sealed.clone();
            tampered[index] ^= 1 << bit;
            let result = key.decrypt(&tampered);
            assert!(
                matches!(result, Err(Error::InvalidHmac)),
                "flip of bit {} in byte {} not detected",
                bit,
                index
            );
        }
    }
    Ok(())
}

#[test]
fn test_wrong_key_is_hmac_failure() -> Result<()> {
    let key = SymmetricKey::generate(SymmetricKeySize::Aes128, software())?;
    let other = SymmetricKey::generate(SymmetricKeySize::Aes128, software())?;
    let sealed = key.encrypt(b"for one key only")?;

    let result = other.decrypt(&sealed);
    assert!(matches!(result, Err(Error::InvalidHmac)));
    assert_eq!(result.unwrap_err().kind().as_str(), "INVALID_HMAC");
    Ok(())
}

#[test]
fn test_same_encryption_key_different_auth_key() -> Result<()> {
    // Only the authentication half differs: the ciphertext would decrypt,
    // yet the envelope must still be rejected
    let key = SymmetricKey::generate(SymmetricKeySize::Aes256, software())?;
    let mut raw = key.to_bytes();
    raw[0] ^= 0xFF;
    let relabeled = SymmetricKey::from_bytes(&raw, software())?;

    let sealed = key.encrypt(b"payload")?;
    assert!(matches!(relabeled.decrypt(&sealed), Err(Error::InvalidHmac)));
    Ok(())
}

#[test]
fn test_short_envelopes_are_invalid_streams() -> Result<()> {
    let key = SymmetricKey::generate(SymmetricKeySize::Aes256, software())?;
    for len in [0usize, 1, IV_SIZE, HMAC_SIZE, MIN_ENVELOPE_SIZE - 1] {
        let result = key.decrypt(&vec![0u8; len]);
        assert!(matches!(result, Err(Error::InvalidStream(_))), "{} bytes", len);
        assert_eq!(result.unwrap_err().kind(), ErrorKind::InvalidStream);
    }
    Ok(())
}

#[test]
fn test_hmac_trailer_matches_calculate_hmac() -> Result<()> {
    let key = SymmetricKey::generate(SymmetricKeySize::Aes192, software())?;
    let sealed = key.encrypt(b"trailer")?;
    let (authenticated, trailer) = sealed.split_at(sealed.len() - HMAC_SIZE);
    assert_eq!(key.calculate_hmac(authenticated)?.as_slice(), trailer);
    Ok(())
}

// ----- Import / Export Tests -----

#[test]
fn test_material_lengths() -> Result<()> {
    for (len, size) in [
        (32usize, SymmetricKeySize::Aes128),
        (48, SymmetricKeySize::Aes192),
        (64, SymmetricKeySize::Aes256),
    ] {
        let key = SymmetricKey::from_bytes(&payload(len), software())?;
        assert_eq!(key.key_size(), size);
    }
    for len in [16usize, 24, 0, 63, 128] {
        let result = SymmetricKey::from_bytes(&payload(len), software());
        assert!(matches!(result, Err(Error::InvalidArg(_))), "{} bytes", len);
    }
    Ok(())
}

#[test]
fn test_import_export_idempotent() -> Result<()> {
    for size in SIZES {
        let key = SymmetricKey::generate(size, software())?;

        let from_raw = SymmetricKey::from_bytes(&key.to_bytes(), lazy())?;
        assert_eq!(from_raw.to_bytes(), key.to_bytes());

        let from_b64 = SymmetricKey::from_b64(&key.to_b64(), lazy())?;
        assert_eq!(from_b64.to_b64(), key.to_b64());

        let sealed = key.encrypt(b"still the same key")?;
        assert_eq!(from_b64.decrypt(&sealed)?, b"still the same key");
    }
    Ok(())
}
