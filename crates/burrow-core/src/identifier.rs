/// Identifier derived from a URL or short code string.
pub type RelationId = u32;

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// Derives the stable identifier of `input` using 32-bit FNV-1a over its UTF-8 bytes.
///
/// The result is persisted by the relational backend, so the hash must never
/// change between releases.
pub fn derive_id(input: &str) -> RelationId {
    input.bytes().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u32::from(byte)).wrapping_mul(FNV_PRIME)
    })
}
