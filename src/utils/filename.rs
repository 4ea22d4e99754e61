use rand::RngCore;

/// Random bytes behind every stored filename (128 bits)
pub const FILENAME_ENTROPY_BYTES: usize = 16;

/// Generates `<32 hex chars>.<ext>` from the thread-local CSPRNG.
pub fn generate_filename(extension: &str) -> String {
    let mut bytes = [0u8; FILENAME_ENTROPY_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    format!("{}.{}", hex::encode(bytes), extension)
}

pub fn is_generated_filename(name: &str) -> bool {
    let Some((stem, ext)) = name.split_once('.') else {
        return false;
    };

    stem.len() == FILENAME_ENTROPY_BYTES * 2
        && stem.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
        && !ext.is_empty()
        && ext.bytes().all(|b| b.is_ascii_alphanumeric())
}
