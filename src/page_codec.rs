//! Single-page verify + decrypt for the page-encrypted database format.
//!
//! Stateless: every call takes the page index explicitly and leaves no
//! state behind. Page 0 carries a 16-byte salt prefix in place of ciphertext;
//! every other page starts with ciphertext directly.

use aes::cipher::block_padding::NoPadding;
use aes::cipher::{BlockDecryptMut, KeyIvInit};
use aes::Aes256;
use hmac::{Hmac, Mac};
use sha2::Sha512;

use crate::error::{CryptoError, Result};
use crate::kdf::{EncKey, MacKey};

pub const PAGE_SIZE: usize = 4096;
pub const SALT_SIZE: usize = 16;
pub const IV_SIZE: usize = 16;
pub const MAC_SIZE: usize = 64;
pub const RESERVE_SIZE: usize = IV_SIZE + MAC_SIZE; // 80

type HmacSha512 = Hmac<Sha512>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

const IV_OFFSET: usize = PAGE_SIZE - RESERVE_SIZE; // 4016
const MAC_OFFSET: usize = IV_OFFSET + IV_SIZE; // 4032

fn prefix_for(page_index: u32) -> usize {
    if page_index == 0 {
        SALT_SIZE
    } else {
        0
    }
}

/// Verify the keyed MAC covering `page[prefix..mac_offset]` plus the
/// 1-based little-endian page index, in constant time.
pub fn verify_page_mac(page: &[u8; PAGE_SIZE], mac_key: &MacKey, page_index: u32) -> Result<()> {
    let prefix = prefix_for(page_index);

    let mut mac = HmacSha512::new_from_slice(mac_key.as_bytes())
        .expect("HMAC accepts any key length");
    mac.update(&page[prefix..MAC_OFFSET]);
    mac.update(&(page_index + 1).to_le_bytes());

    mac.verify_slice(&page[MAC_OFFSET..MAC_OFFSET + MAC_SIZE])
        .map_err(|_| CryptoError::IntegrityFailure { page_index })
}

/// Verify and decrypt one page in place.
///
/// On success, `page[prefix..iv_offset]` holds plaintext; the IV, MAC, and
/// any padding tail are left untouched, preserving the page's on-disk
/// footprint.
pub fn decrypt_page(page: &mut [u8; PAGE_SIZE], enc_key: &EncKey, mac_key: &MacKey, page_index: u32) -> Result<()> {
    verify_page_mac(page, mac_key, page_index)?;

    let prefix = prefix_for(page_index);
    let mut iv = [0u8; IV_SIZE];
    iv.copy_from_slice(&page[IV_OFFSET..IV_OFFSET + IV_SIZE]);

    let cipher = Aes256CbcDec::new_from_slices(enc_key.as_bytes(), &iv)
        .expect("32-byte key and 16-byte IV are always valid for AES-256-CBC");
    let ciphertext = &mut page[prefix..IV_OFFSET];
    cipher
        .decrypt_padded_mut::<NoPadding>(ciphertext)
        .expect("ciphertext length is always a multiple of the AES block size");

    Ok(())
}
