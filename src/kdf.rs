//! Key derivation: master key + per-file salt -> (encryption key, MAC key).
//!
//! Two PBKDF2-HMAC-SHA512 passes: one over the caller's master key and the
//! file's salt, then a second, 2-iteration pass over the *derived*
//! encryption key using a salt formed by XORing the file salt with `0x3a`.
//! Step two using the derived key (not the master key) as the PBKDF2
//! password is intentional and must not be "simplified" away.

use pbkdf2::pbkdf2_hmac;
use sha2::Sha512;
use zeroize::{Zeroize, ZeroizeOnDrop};

pub const KEY_SIZE: usize = 32;
pub const SALT_SIZE: usize = 16;

const ENC_KEY_ITERATIONS: u32 = 256_000;
const MAC_KEY_ITERATIONS: u32 = 2;
const MAC_SALT_XOR: u8 = 0x3a;

/// 32-byte AES-256 key, zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct EncKey(pub(crate) [u8; KEY_SIZE]);

/// 32-byte HMAC-SHA512 key, zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct MacKey(pub(crate) [u8; KEY_SIZE]);

impl EncKey {
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl MacKey {
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

/// Derive `(encKey, macKey)` from a 32-byte master key and a 16-byte salt.
///
/// Deterministic and infallible for well-formed inputs; there is no failure
/// mode on valid-length arguments.
pub fn derive_keys(master_key: &[u8; KEY_SIZE], salt: &[u8; SALT_SIZE]) -> (EncKey, MacKey) {
    let mut enc_key = [0u8; KEY_SIZE];
    pbkdf2_hmac::<Sha512>(master_key, salt, ENC_KEY_ITERATIONS, &mut enc_key);

    let mut mac_salt = [0u8; SALT_SIZE];
    for i in 0..SALT_SIZE {
        mac_salt[i] = salt[i] ^ MAC_SALT_XOR;
    }

    let mut mac_key = [0u8; KEY_SIZE];
    pbkdf2_hmac::<Sha512>(&enc_key, &mac_salt, MAC_KEY_ITERATIONS, &mut mac_key);

    (EncKey(enc_key), MacKey(mac_key))
}
