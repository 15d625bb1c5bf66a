//! Command ids. A Command dictionary entry is a sequence whose first key code is one of these.

pub const CYCLE_ANAGRAM: u8 = 0x01;
pub const CYCLE_CAPITAL: u8 = 0x02;
pub const CYCLE_NOSPACE: u8 = 0x03;
pub const RELEASE_ALL: u8 = 0x04;
/// Toggle the HID modifier bits given by the entry's second key code. Sticky modifiers are held
/// through every report until toggled off or released with [RELEASE_ALL].
pub const STICKY_MODS: u8 = 0x05;

pub const SET_MODE_MIN: u8 = 0x10;
pub const SET_MODE_MAX: u8 = 0x1f;
