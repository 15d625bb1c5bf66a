//! Binary layout of the chord dictionaries.
//!
//! Each length class of a dictionary is a stream of records. A record is one prefix byte followed
//! by the chord's bytes. The low nibble of the prefix is the offset from the previous record's
//! sequence number, the high nibble is the anagram number. A record whose chord bytes are all zero
//! ends the stream.
//!
//! Sequences are stored per length class either raw (one byte per key, or a key byte followed by
//! a modifier byte) or compressed: 6 bits per key, 4 keys packed into 3 bytes.

pub const PREFIX_BYTES: usize = 1;
pub const OFFSET_MASK: u8 = 0x0f;
pub const ANAGRAM_SHIFT: u32 = 4;

pub const KEY_MASK: u8 = 0x3f;
pub const DECOMPRESSED_CYCLE: usize = 4;
pub const COMPRESSED_CYCLE: usize = 3;

/// Byte, within a 3 byte group, holding the first bits of each of the 4 keys.
pub const BYTE_OFFSETS: [usize; DECOMPRESSED_CYCLE] = [0, 0, 1, 2];

pub const fn prefix(offset: u8, anagram: u8) -> u8 {
    (offset & OFFSET_MASK) | (anagram << ANAGRAM_SHIFT)
}

pub const fn record_offset(prefix: u8) -> u8 {
    prefix & OFFSET_MASK
}

pub const fn record_anagram(prefix: u8) -> u8 {
    prefix >> ANAGRAM_SHIFT
}

/// Number of bytes needed to hold `keys` compressed keys.
pub const fn compressed_len(keys: usize) -> usize {
    (keys / DECOMPRESSED_CYCLE) * COMPRESSED_CYCLE + keys % DECOMPRESSED_CYCLE
}

/// Pack `keys` into `out`, 6 bits each. Only the low 6 bits of each key are kept.
///
/// Returns the number of bytes written, or `None` if `out` is too small.
pub fn compress(keys: &[u8], out: &mut [u8]) -> Option<usize> {
    let len = compressed_len(keys.len());
    let out = out.get_mut(..len)?;
    out.fill(0);

    for (i, key) in keys.iter().map(|k| k & KEY_MASK).enumerate() {
        let b = (i / DECOMPRESSED_CYCLE) * COMPRESSED_CYCLE + BYTE_OFFSETS[i % DECOMPRESSED_CYCLE];
        match i % DECOMPRESSED_CYCLE {
            0 => out[b] |= key << 2,
            1 => {
                out[b] |= key >> 4;
                out[b + 1] |= key << 4;
            }
            2 => {
                out[b] |= key >> 2;
                out[b + 1] |= key << 6;
            }
            _ => out[b] |= key,
        }
    }

    Some(len)
}

#[cfg(test)]
#[path = "codec_test.rs"]
mod test;
