//! Media container ("dat" file) decryption.
//!
//! Three on-disk variants, detected by a 6-byte magic:
//! - V3: the whole file is single-byte XORed, no header.
//! - V4_1 / V4_2: a 15-byte header precedes three concatenated regions:
//!   an AES-128-ECB-encrypted, PKCS#7-padded prefix; a raw passthrough
//!   region; and an XORed trailing region. V4_1 and V4_2 share an identical
//!   byte layout and algorithm; the tag is metadata only and must never
//!   gate a branch in the decrypt path.

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, KeyInit};
use aes::Aes128;

use crate::error::{CryptoError, Result};

const V4_1_MAGIC: [u8; 6] = [0x07, 0x08, 0x56, 0x31, 0x08, 0x07];
const V4_2_MAGIC: [u8; 6] = [0x07, 0x08, 0x56, 0x32, 0x08, 0x07];
const V4_HEADER_LEN: usize = 15;
const AES_BLOCK_LEN: usize = 16;

/// MD5("0"), the default V4 AES-128-ECB key unless the caller overrides it.
pub const DEFAULT_V1_AES_KEY: [u8; 16] = *b"cfcd208495d565ef";

type Aes128EcbDec = ecb::Decryptor<Aes128>;

/// On-disk media container variant. V4_1 and V4_2 are distinguished only
/// for reporting; both are decrypted identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaVariant {
    V3,
    V4_1,
    V4_2,
}

/// Inspect the leading magic bytes and report the container variant.
///
/// Fewer than 6 bytes is a truncated-input error, not a silent V3 guess.
pub fn detect_media_variant(input: &[u8]) -> Result<MediaVariant> {
    if input.len() < 6 {
        return Err(CryptoError::InvalidInput);
    }
    match &input[0..6] {
        m if *m == V4_1_MAGIC => Ok(MediaVariant::V4_1),
        m if *m == V4_2_MAGIC => Ok(MediaVariant::V4_2),
        _ => Ok(MediaVariant::V3),
    }
}

/// Decrypt a media container, autodetecting its variant.
pub fn decrypt_media(input: &[u8], xor_key: u8, aes_key: Option<&[u8; 16]>) -> Result<(Vec<u8>, MediaVariant)> {
    let variant = detect_media_variant(input)?;
    let plaintext = match variant {
        MediaVariant::V3 => decrypt_v3(input, xor_key),
        MediaVariant::V4_1 | MediaVariant::V4_2 => decrypt_v4(input, xor_key, aes_key)?,
    };
    Ok((plaintext, variant))
}

fn decrypt_v3(input: &[u8], xor_key: u8) -> Vec<u8> {
    input.iter().map(|b| b ^ xor_key).collect()
}

fn decrypt_v4(input: &[u8], xor_key: u8, aes_key: Option<&[u8; 16]>) -> Result<Vec<u8>> {
    if input.len() < V4_HEADER_LEN {
        return Err(CryptoError::InvalidContainer);
    }

    let aes_size = u32::from_le_bytes(input[6..10].try_into().unwrap()) as usize;
    let xor_size = u32::from_le_bytes(input[10..14].try_into().unwrap()) as usize;
    let body = &input[V4_HEADER_LEN..];

    let aligned_aes_size = align_up_16(aes_size);
    if aligned_aes_size > body.len() {
        return Err(CryptoError::InvalidContainer);
    }

    let aes_region = &body[..aligned_aes_size];
    let decrypted_aes = if aes_region.is_empty() {
        Vec::new()
    } else {
        let key = aes_key.copied().unwrap_or(DEFAULT_V1_AES_KEY);
        let mut buf = aes_region.to_vec();
        let unpadded = Aes128EcbDec::new_from_slice(&key)
            .expect("16-byte key is always valid for AES-128-ECB")
            .decrypt_padded_mut::<Pkcs7>(&mut buf)
            .map_err(|_| CryptoError::InvalidPadding)?;
        unpadded.to_vec()
    };

    let remaining = &body[aligned_aes_size..];
    if xor_size > remaining.len() {
        return Err(CryptoError::InvalidContainer);
    }
    let raw_len = remaining.len() - xor_size;
    let (raw_region, xor_region) = remaining.split_at(raw_len);
    let xored: Vec<u8> = xor_region.iter().map(|b| b ^ xor_key).collect();

    let mut output = Vec::with_capacity(decrypted_aes.len() + raw_region.len() + xored.len());
    output.extend_from_slice(&decrypted_aes);
    output.extend_from_slice(raw_region);
    output.extend_from_slice(&xored);
    Ok(output)
}

fn align_up_16(n: usize) -> usize {
    let rem = n % AES_BLOCK_LEN;
    if rem == 0 {
        n
    } else {
        n + (AES_BLOCK_LEN - rem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aes::cipher::BlockEncryptMut;

    #[test]
    fn v3_round_trip_vector() {
        let plain: [u8; 10] = [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46];
        let key = 0x55u8;
        let encrypted: Vec<u8> = plain.iter().map(|b| b ^ key).collect();
        assert_eq!(
            encrypted,
            vec![0xAA, 0x8D, 0xAA, 0xB5, 0x55, 0x45, 0x1F, 0x13, 0x1C, 0x13]
        );

        let (decrypted, variant) = decrypt_media(&encrypted, key, None).unwrap();
        assert_eq!(decrypted, plain);
        assert_eq!(variant, MediaVariant::V3);
    }

    #[test]
    fn v3_round_trip_for_every_key() {
        let plain = b"arbitrary media payload bytes".to_vec();
        for key in 0..=255u8 {
            let encrypted: Vec<u8> = plain.iter().map(|b| b ^ key).collect();
            let (decrypted, variant) = decrypt_media(&encrypted, key, None).unwrap();
            assert_eq!(decrypted, plain);
            assert_eq!(variant, MediaVariant::V3);
        }
    }

    #[test]
    fn v4_header_parse_vector() {
        let mut input = Vec::new();
        input.extend_from_slice(&V4_1_MAGIC);
        input.extend_from_slice(&32u32.to_le_bytes());
        input.extend_from_slice(&16u32.to_le_bytes());
        input.push(0); // reserved
        input.extend_from_slice(&[0u8; 32 + 16]); // body placeholder

        let variant = detect_media_variant(&input).unwrap();
        assert_eq!(variant, MediaVariant::V4_1);

        let aes_size = u32::from_le_bytes(input[6..10].try_into().unwrap());
        let xor_size = u32::from_le_bytes(input[10..14].try_into().unwrap());
        assert_eq!(aes_size, 32);
        assert_eq!(align_up_16(aes_size as usize), 32);
        assert_eq!(xor_size, 16);
    }

    fn build_v4_container(magic: [u8; 6], aes_plain: &[u8], raw: &[u8], xor_plain: &[u8], aes_key: &[u8; 16], xor_key: u8) -> Vec<u8> {
        type Aes128EcbEnc = ecb::Encryptor<Aes128>;

        let mut padded = aes_plain.to_vec();
        let pad_len = AES_BLOCK_LEN - (padded.len() % AES_BLOCK_LEN);
        let aligned_len = padded.len() + pad_len;
        padded.resize(aligned_len, 0);
        let ciphertext = Aes128EcbEnc::new_from_slice(aes_key)
            .unwrap()
            .encrypt_padded_mut::<Pkcs7>(&mut padded, aes_plain.len())
            .unwrap()
            .to_vec();

        let xor_cipher: Vec<u8> = xor_plain.iter().map(|b| b ^ xor_key).collect();

        let mut out = Vec::new();
        out.extend_from_slice(&magic);
        out.extend_from_slice(&(aes_plain.len() as u32).to_le_bytes());
        out.extend_from_slice(&(xor_cipher.len() as u32).to_le_bytes());
        out.push(0);
        out.extend_from_slice(&ciphertext);
        out.extend_from_slice(raw);
        out.extend_from_slice(&xor_cipher);
        out
    }

    #[test]
    fn v4_round_trip_with_all_three_regions() {
        let aes_key = *b"0123456789abcdef";
        let xor_key = 0x7eu8;
        let aes_plain = b"header-bytes-0123456789".to_vec(); // not block-aligned
        let raw = b"raw passthrough payload".to_vec();
        let xor_plain = b"trailing check bytes".to_vec();

        let container = build_v4_container(V4_2_MAGIC, &aes_plain, &raw, &xor_plain, &aes_key, xor_key);

        let (plaintext, variant) = decrypt_media(&container, xor_key, Some(&aes_key)).unwrap();
        assert_eq!(variant, MediaVariant::V4_2);

        let mut expected = aes_plain.clone();
        expected.extend_from_slice(&raw);
        expected.extend_from_slice(&xor_plain);
        assert_eq!(plaintext, expected);
    }

    #[test]
    fn v4_with_zero_aes_size_skips_ecb_step() {
        let aes_key = DEFAULT_V1_AES_KEY;
        let xor_key = 0x11u8;
        let raw = b"only raw and xor regions".to_vec();
        let xor_plain = b"xor-suffix".to_vec();

        let container = build_v4_container(V4_1_MAGIC, b"", &raw, &xor_plain, &aes_key, xor_key);
        let (plaintext, _) = decrypt_media(&container, xor_key, None).unwrap();

        let mut expected = raw.clone();
        expected.extend_from_slice(&xor_plain);
        assert_eq!(plaintext, expected);
    }

    #[test]
    fn v4_with_zero_xor_size_skips_xor_step() {
        let aes_key = DEFAULT_V1_AES_KEY;
        let aes_plain = b"short-aes-prefix".to_vec();
        let raw = b"raw-only-tail".to_vec();

        let container = build_v4_container(V4_1_MAGIC, &aes_plain, &raw, b"", &aes_key, 0);
        let (plaintext, _) = decrypt_media(&container, 0, None).unwrap();

        let mut expected = aes_plain.clone();
        expected.extend_from_slice(&raw);
        assert_eq!(plaintext, expected);
    }

    #[test]
    fn truncated_input_is_distinguished_from_v3() {
        let err = detect_media_variant(&[0x07, 0x08]).unwrap_err();
        assert!(matches!(err, CryptoError::InvalidInput));
    }

    #[test]
    fn invalid_padding_is_rejected() {
        let aes_key = DEFAULT_V1_AES_KEY;
        // Exactly one block, so PKCS#7 appends a full padding block; that
        // second ciphertext block is what we corrupt so only the padding
        // bytes (not the real plaintext block) are affected.
        let mut container = build_v4_container(V4_1_MAGIC, b"0123456789abcdef", b"raw", b"", &aes_key, 0);
        let corrupt_at = V4_HEADER_LEN + AES_BLOCK_LEN * 2 - 1;
        container[corrupt_at] ^= 0xFF;

        let err = decrypt_media(&container, 0, Some(&aes_key)).unwrap_err();
        assert!(matches!(err, CryptoError::InvalidPadding));
    }

    #[test]
    fn aes_region_larger_than_body_is_invalid_container() {
        let mut input = Vec::new();
        input.extend_from_slice(&V4_1_MAGIC);
        input.extend_from_slice(&1000u32.to_le_bytes());
        input.extend_from_slice(&0u32.to_le_bytes());
        input.push(0);
        input.extend_from_slice(&[0u8; 16]);

        let err = decrypt_media(&input, 0, None).unwrap_err();
        assert!(matches!(err, CryptoError::InvalidContainer));
    }
}
