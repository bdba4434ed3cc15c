//! Brute-force single-byte XOR key recovery for V3/V4 media files, by
//! aligning decrypted leading bytes against known media format magics.

const KNOWN_MAGICS: &[&[u8]] = &[
    &[0xFF, 0xD8, 0xFF],       // JPEG
    &[0x89, 0x50, 0x4E, 0x47], // PNG
    &[0x47, 0x49, 0x46, 0x38], // GIF
    &[0x42, 0x4D],             // BMP
    &[0x52, 0x49, 0x46, 0x46], // RIFF/WEBP
];

/// Search ascending over `k in 0..=255` for the first key whose XOR of
/// `first_bytes` matches a known media magic prefix.
pub fn detect_xor_key(first_bytes: &[u8]) -> Option<u8> {
    for key in 0..=255u8 {
        for magic in KNOWN_MAGICS {
            if first_bytes.len() < magic.len() {
                continue;
            }
            if first_bytes
                .iter()
                .zip(magic.iter())
                .all(|(b, m)| b ^ key == *m)
            {
                return Some(key);
            }
        }
    }
    None
}
