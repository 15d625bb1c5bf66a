#![no_std]
pub mod codec;
pub mod command;
pub mod globals;
pub mod keycodes;

/// Maximum number of modifiers a chord can carry. One bit of the 16 bit modifier word is kept for
/// the cycle-capital flag.
pub const MAX_MODIFIERS: usize = 15;

/// Maximum number of anagrams sharing one chord; the anagram number is stored in a nibble.
pub const MAX_ANAGRAMS: usize = 16;
