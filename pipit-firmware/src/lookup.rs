use heapless::Vec;
use pipit_common::codec::{
    record_anagram, record_offset, BYTE_OFFSETS, COMPRESSED_CYCLE, DECOMPRESSED_CYCLE, KEY_MASK,
    PREFIX_BYTES,
};

use crate::{
    chord::Chord,
    conf::{Encoding, Kmap, Registry, SeqType},
};

/// Longest sequence a dictionary entry can hold.
pub const MAX_KEYS: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Key {
    pub code: u8,
    /// HID modifier byte.
    pub mods: u8,
}

impl Key {
    pub const fn new(code: u8, mods: u8) -> Self {
        Self { code, mods }
    }
}

pub type KeySeq = Vec<Key, MAX_KEYS>;

/// Search the `seq_type` kmaps of the chord's mode, in priority order, for the chord. A kmap whose
/// match decodes to no keys does not stop the search.
pub fn lookup<const B: usize>(
    conf: &Registry<'_, B>,
    chord: &Chord<B>,
    seq_type: SeqType,
) -> Option<KeySeq> {
    let mode = conf.mode(chord.mode())?;
    mode.kmap_ids(seq_type)
        .iter()
        .filter_map(|id| conf.kmap(*id))
        .find_map(|kmap| lookup_kmap(kmap, chord))
}

/// Find the chord in one kmap. A record for the chord's anagram number wins; failing that, the
/// chord's only record is used whatever its anagram number.
pub fn lookup_kmap<const B: usize>(kmap: &Kmap<'_>, chord: &Chord<B>) -> Option<KeySeq> {
    let (length, record) = find_record::<B>(kmap, |r| chord.matches(r.chord, r.anagram, false))
        .or_else(|| {
            let unambiguous = count_records::<B>(kmap, chord.bits()) == 1;
            find_record::<B>(kmap, |r| chord.matches(r.chord, r.anagram, unambiguous))
        })?;

    let sequences = kmap.sequences.get(length)?;
    let keys = match kmap.encoding {
        Encoding::Raw => read_raw(sequences, length, record.seq, false),
        Encoding::RawWithMods => read_raw(sequences, length, record.seq, true),
        Encoding::Compressed => read_compressed(sequences, length, record.seq),
    }?;
    if keys.is_empty() {
        crate::debug!("empty sequence for {:?}", chord.bits());
        return None;
    }
    Some(keys)
}

/// The first record, walking length classes from shortest, that satisfies `found`.
fn find_record<'k, const B: usize>(
    kmap: &Kmap<'k>,
    mut found: impl FnMut(&Record<'k>) -> bool,
) -> Option<(usize, Record<'k>)> {
    kmap.chords
        .iter()
        .enumerate()
        .find_map(|(length, records)| {
            Records::<B>::new(*records)
                .find(&mut found)
                .map(|r| (length, r))
        })
}

/// Number of records, over every anagram number, for `bits`.
fn count_records<const B: usize>(kmap: &Kmap<'_>, bits: &[u8; B]) -> usize {
    kmap.chords
        .iter()
        .flat_map(|records| Records::<B>::new(*records))
        .filter(|r| r.chord == bits.as_slice())
        .count()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record<'r> {
    /// Index of the record's sequence in its length class.
    pub seq: usize,
    pub anagram: u8,
    pub chord: &'r [u8],
}

/// Walks the records of one length class, stopping at the blank chord that ends it.
pub struct Records<'r, const B: usize> {
    stream: &'r [u8],
    seq: usize,
}

impl<'r, const B: usize> Records<'r, B> {
    pub fn new(stream: &'r [u8]) -> Self {
        Self { stream, seq: 0 }
    }
}

impl<'r, const B: usize> Iterator for Records<'r, B> {
    type Item = Record<'r>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.stream.is_empty() {
            return None;
        }
        let stream = self.stream;
        self.stream = &[];

        let Some(chord) = stream.get(PREFIX_BYTES..PREFIX_BYTES + B) else {
            crate::error!("truncated chord record");
            return None;
        };
        if crate::is_blank(chord) {
            return None;
        }

        let prefix = stream[0];
        self.seq += record_offset(prefix) as usize;
        self.stream = &stream[PREFIX_BYTES + B..];
        Some(Record {
            seq: self.seq,
            anagram: record_anagram(prefix),
            chord,
        })
    }
}

fn read_raw(sequences: &[u8], length: usize, seq: usize, with_mods: bool) -> Option<KeySeq> {
    let width = if with_mods { 2 } else { 1 };
    let num = length * width;
    let start = seq * num;
    let Some(bytes) = sequences.get(start..start + num) else {
        crate::error!("sequence {} of length {} is out of bounds", seq, length);
        return None;
    };

    let mut keys = KeySeq::new();
    for k in bytes.chunks_exact(width) {
        let key = Key::new(k[0], if with_mods { k[1] } else { 0 });
        if keys.push(key).is_err() {
            crate::error!("sequence of length {} is too long", length);
            return None;
        }
    }
    Some(keys)
}

/// Byte holding the first bits of key `key_index` in a compressed stream.
pub fn start_compressed_index(key_index: usize) -> usize {
    (key_index / DECOMPRESSED_CYCLE) * COMPRESSED_CYCLE + BYTE_OFFSETS[key_index % DECOMPRESSED_CYCLE]
}

/// Decode key `key_index` from `compressed`, which starts at the first byte holding part of the
/// key. Returns the key and how many bytes are now fully consumed.
///
/// Keys must be decoded in order: each call leaves the index on the byte whose remaining bits
/// start the next key.
pub fn decompress_key(compressed: &[u8], key_index: usize) -> Option<(u8, usize)> {
    let byte = |i: usize| compressed.get(i).copied();
    match key_index % DECOMPRESSED_CYCLE {
        0 => Some((byte(0)? >> 2, 0)),
        1 => Some((((byte(0)? & 0x03) << 4) | ((byte(1)? & 0xf0) >> 4), 1)),
        2 => Some((((byte(0)? & 0x0f) << 2) | ((byte(1)? & 0xc0) >> 6), 1)),
        3 => Some((byte(0)? & KEY_MASK, 1)),
        phase => {
            crate::error!("bad decompression phase {}", phase);
            None
        }
    }
}

/// Decode sequence `seq` of a compressed length class. A stream that cannot be decoded gives no
/// keys.
fn read_compressed(sequences: &[u8], length: usize, seq: usize) -> Option<KeySeq> {
    let start_key = seq * length;
    let mut index = start_compressed_index(start_key);

    let mut keys = KeySeq::new();
    for key_index in start_key..start_key + length {
        let Some((code, used)) = decompress_key(sequences.get(index..).unwrap_or(&[]), key_index)
        else {
            crate::error!(
                "compressed sequence {} of length {} cannot be decoded",
                seq,
                length
            );
            return Some(KeySeq::new());
        };
        index += used;
        if keys.push(Key::new(code, 0)).is_err() {
            crate::error!("sequence of length {} is too long", length);
            return None;
        }
    }
    Some(keys)
}

#[cfg(test)]
#[path = "lookup_test.rs"]
mod test;
