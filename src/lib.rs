//! Cryptographic decoding layer for page-encrypted chat database files and
//! hybrid-encrypted media containers produced by a desktop chat
//! application.
//!
//! This crate is the hard core only: key derivation, per-page MAC
//! verification and block decryption, whole-database streaming, media
//! container decryption, and XOR-key recovery. It does not traverse
//! filesystems, schedule batches, parse the decrypted SQLite content, or
//! expose a command-line surface; those are collaborator concerns that
//! consume this crate's streaming API.

pub mod db;
pub mod error;
pub mod kdf;
pub mod media;
pub mod page_codec;
pub mod xor_oracle;

pub use db::{decrypt_database, get_database_info, validate_key, DatabaseInfo, DbSession};
pub use error::CryptoError;
pub use kdf::{derive_keys, EncKey, MacKey};
pub use media::{decrypt_media, detect_media_variant, MediaVariant, DEFAULT_V1_AES_KEY};
pub use page_codec::{decrypt_page, verify_page_mac, IV_SIZE, MAC_SIZE, PAGE_SIZE, RESERVE_SIZE, SALT_SIZE};
pub use xor_oracle::detect_xor_key;
