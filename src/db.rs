//! Whole-database decryption: salt extraction, key derivation, page loop,
//! and the page-0 header patch, driven over abstract byte streams so
//! callers may stream from files, sockets, or memory.

use std::io::{Read, Seek, SeekFrom, Write};

use crate::error::{CryptoError, Result};
use crate::kdf::{derive_keys, EncKey, MacKey, KEY_SIZE, SALT_SIZE};
use crate::page_codec::{self, PAGE_SIZE};

const SQLITE_HEADER: &[u8; 16] = b"SQLite format 3\0";

/// A per-file decryption session: the derived key pair, held for the
/// session's lifetime and zeroized on drop via [`EncKey`]/[`MacKey`].
///
/// Stateless beyond the keys themselves; pages may be decrypted in any
/// order, though callers must still emit them in ascending index order
/// (per the on-disk page cache contract).
pub struct DbSession {
    enc_key: EncKey,
    mac_key: MacKey,
}

impl DbSession {
    /// Derive a session from a 64-hex-character master key and the first
    /// page's 16-byte salt, then verify the key against the first page's
    /// MAC, the single authoritative key-check path.
    pub fn open(master_key_hex: &str, first_page: &[u8; PAGE_SIZE]) -> Result<Self> {
        let master_key = decode_master_key(master_key_hex)?;
        let mut salt = [0u8; SALT_SIZE];
        salt.copy_from_slice(&first_page[0..SALT_SIZE]);

        let (enc_key, mac_key) = derive_keys(&master_key, &salt);
        page_codec::verify_page_mac(first_page, &mac_key, 0).map_err(|_| CryptoError::InvalidKey)?;

        Ok(Self { enc_key, mac_key })
    }

    /// Decrypt one page in place. The caller is responsible for calling
    /// this with ascending `page_index` values across a file.
    pub fn decrypt_page(&self, page: &mut [u8; PAGE_SIZE], page_index: u32) -> Result<()> {
        page_codec::decrypt_page(page, &self.enc_key, &self.mac_key, page_index)
    }
}

fn decode_master_key(hex_key: &str) -> Result<[u8; KEY_SIZE]> {
    if hex_key.len() != KEY_SIZE * 2 {
        return Err(CryptoError::InvalidKey);
    }
    let bytes = hex::decode(hex_key).map_err(|_| CryptoError::InvalidKey)?;
    bytes.try_into().map_err(|_| CryptoError::InvalidKey)
}

/// Metadata about a database file that can be read without a key.
#[derive(Debug, Clone)]
pub struct DatabaseInfo {
    pub file_size: u64,
    pub total_pages: u64,
    pub page_size: usize,
    pub salt_hex: String,
    pub encrypted: bool,
}

/// Inspect a database's first page without requiring a key.
pub fn get_database_info<R: Read>(input: &mut R, file_size: u64) -> Result<DatabaseInfo> {
    let mut first_page = [0u8; PAGE_SIZE];
    let n = read_up_to(input, &mut first_page)?;

    let salt_hex = hex::encode(&first_page[0..SALT_SIZE]);
    let encrypted = n < SQLITE_HEADER.len() || &first_page[0..SQLITE_HEADER.len()] != SQLITE_HEADER;

    Ok(DatabaseInfo {
        file_size,
        total_pages: file_size / PAGE_SIZE as u64,
        page_size: PAGE_SIZE,
        salt_hex,
        encrypted,
    })
}

/// Check a key against a database's first page without decrypting the
/// rest of the file. Side-effect-free and referentially transparent in
/// `(input, hex_key)`.
pub fn validate_key<R: Read + Seek>(input: &mut R, master_key_hex: &str) -> Result<bool> {
    input.seek(SeekFrom::Start(0))?;
    let mut first_page = [0u8; PAGE_SIZE];
    let n = read_up_to(input, &mut first_page)?;
    if n < PAGE_SIZE {
        return Ok(false);
    }
    Ok(DbSession::open(master_key_hex, &first_page).is_ok())
}

/// Decrypt an entire database, streaming pages from `input` to `output`.
///
/// The input size is probed internally (per spec.md §4.3 step 2, "Probe
/// input size"); `total_pages = file_size / PAGE_SIZE`. A final partial page
/// (file size not a multiple of `PAGE_SIZE`) is copied through unmodified
/// rather than rejected. `progress`, if given, is invoked as `(pages_done,
/// total_pages)` after each full page, and never allocates.
pub fn decrypt_database<R: Read + Seek, W: Write>(
    input: &mut R,
    output: &mut W,
    master_key_hex: &str,
    mut progress: Option<&mut dyn FnMut(u32, u32)>,
) -> Result<()> {
    let file_size = stream_len(input)?;
    let total_pages = file_size / PAGE_SIZE as u64;
    if total_pages == 0 {
        return Err(CryptoError::InvalidInput);
    }
    let total_pages = u32::try_from(total_pages).map_err(|_| CryptoError::InvalidInput)?;

    let mut page = [0u8; PAGE_SIZE];
    let first_len = read_up_to(input, &mut page)?;
    if first_len < PAGE_SIZE {
        return Err(CryptoError::InvalidInput);
    }

    let session = DbSession::open(master_key_hex, &page)?;

    for page_index in 0..total_pages {
        if page_index > 0 {
            let n = read_up_to(input, &mut page)?;
            if n < PAGE_SIZE {
                if n > 0 {
                    output.write_all(&page[..n])?;
                }
                return Ok(());
            }
        }

        session.decrypt_page(&mut page, page_index)?;

        if page_index == 0 {
            page[0..SQLITE_HEADER.len()].copy_from_slice(SQLITE_HEADER);
        }

        output.write_all(&page)?;

        if let Some(cb) = progress.as_deref_mut() {
            cb(page_index + 1, total_pages);
        }
    }

    Ok(())
}

/// Total stream length, leaving the cursor back at the start.
fn stream_len<R: Read + Seek>(input: &mut R) -> Result<u64> {
    let len = input.seek(SeekFrom::End(0))?;
    input.seek(SeekFrom::Start(0))?;
    Ok(len)
}

fn read_up_to<R: Read>(input: &mut R, buf: &mut [u8; PAGE_SIZE]) -> Result<usize> {
    let mut total = 0;
    loop {
        match input.read(&mut buf[total..])? {
            0 => break,
            n => {
                total += n;
                if total == PAGE_SIZE {
                    break;
                }
            }
        }
    }
    Ok(total)
}
