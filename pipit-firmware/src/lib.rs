#![no_std]
pub mod chord;
pub mod conf;
pub mod engine;
pub mod lookup;
pub mod matrix;
pub mod switches;
pub mod timer;

#[cfg(test)]
pub mod switch_test_stub;
#[cfg(test)]
pub(crate) mod test_conf;

#[macro_use]
mod macros;

/// Set bit `index` of a little-endian bitset. Returns true if the bit was previously clear.
fn add_bit(bits: &mut [u8], index: usize) -> bool {
    let i = index >> 3;
    let Some(b) = bits.get_mut(i) else {
        crate::error!("invalid bit! {}", index);
        return false;
    };
    let bp = 1 << (index & 7);
    let old = *b;
    *b |= bp;
    old & bp == 0
}

fn test_bit(bits: &[u8], index: usize) -> bool {
    bits.get(index >> 3)
        .is_some_and(|b| b & (1 << (index & 7)) != 0)
}

/// `pattern` is a sub-pattern of `bits`.
fn contains_bits(bits: &[u8], pattern: &[u8]) -> bool {
    bits.iter().zip(pattern).all(|(b, p)| b & p == *p)
}

fn is_blank(bits: &[u8]) -> bool {
    bits.iter().all(|b| *b == 0)
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod test;
