//! Content hashing for generated file names.

/// Length of the hex digest used in file names (`icons/<hash>.svg`).
pub const NAME_HASH_LEN: usize = 20;

/// Stable hex name for a piece of content.
///
/// Same bytes always give the same name, so rebuilding unchanged inputs
/// produces identical output paths.
pub fn content_name<T: AsRef<[u8]> + ?Sized>(data: &T) -> String {
    let digest = blake3::hash(data.as_ref());
    let mut name = hex::encode(digest.as_bytes());
    name.truncate(NAME_HASH_LEN);
    name
}
