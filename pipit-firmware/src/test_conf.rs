//! Tables shared by the unit tests: one chord byte, 8 switches.
//!
//! switch 0..=2  letters
//! switch 3      anagram
//! switch 4      capital (word modifier)
//! switch 5      nospace (word modifier)
//! switch 6      ctrl (plain modifier; doubles in WORD_EDIT_CONF)
//! switch 7      shift (plain modifier; shortens in WORD_EDIT_CONF)

use pipit_common::{
    codec::prefix,
    command,
    keycodes::{key_range, modifier},
};

use crate::conf::{Encoding, Kmap, KmapId, ModId, Mode, PlainMod, Registry};

pub const SHIFT: u8 = 0x80;
pub const CTRL: u8 = 0x40;
pub const NOSPACE: u8 = 0x20;
pub const CAPITAL: u8 = 0x10;
pub const ANAGRAM: u8 = 0x08;

pub const MOD_SHIFT: ModId = 0;
pub const MOD_CTRL: ModId = 1;
pub const MOD_NOSPACE: ModId = 2;
pub const MOD_CAPITAL: ModId = 3;

pub const KEY_A: u8 = key_range::BASIC_A;
pub const KEY_B: u8 = 0x05;
pub const KEY_C: u8 = 0x06;
pub const KEY_E: u8 = 0x08;
pub const KEY_N: u8 = 0x11;
pub const KEY_T: u8 = 0x17;
pub const KEY_X: u8 = 0x1b;
pub const KEY_Y: u8 = 0x1c;
pub const KEY_1: u8 = key_range::BASIC_1;

/// Chords of the Command kmap.
pub const CMD_CYCLE_ANAGRAM: u8 = NOSPACE | CAPITAL;
pub const CMD_CYCLE_CAPITAL: u8 = CTRL | CAPITAL;
pub const CMD_CYCLE_NOSPACE: u8 = CTRL | NOSPACE;
pub const CMD_RELEASE_ALL: u8 = SHIFT | CTRL | NOSPACE | CAPITAL;
pub const CMD_GAMING_MODE: u8 = SHIFT | ANAGRAM;
/// Toggles sticky left shift.
pub const CMD_STICKY_SHIFT: u8 = SHIFT | NOSPACE;

const MOD_CHORDS: [[u8; 1]; 4] = [[SHIFT], [CTRL], [NOSPACE], [CAPITAL]];

/// 0x01 -> a, 0x02 -> b, 0x04 -> !
const PLAIN: Kmap<'static> = Kmap {
    chords: &[
        &[0, 0],
        &[prefix(0, 0), 0x01, prefix(1, 0), 0x02, prefix(1, 0), 0x04, 0, 0],
    ],
    sequences: &[&[], &[KEY_A, 0, KEY_B, 0, KEY_1, modifier::LEFT_SHIFT]],
    encoding: Encoding::RawWithMods,
};

/// 0x03 -> xy
const MACRO: Kmap<'static> = Kmap {
    chords: &[&[0, 0], &[0, 0], &[prefix(0, 0), 0x03, 0, 0]],
    sequences: &[&[], &[], &[KEY_X, KEY_Y]],
    encoding: Encoding::Raw,
};

const COMMAND: Kmap<'static> = Kmap {
    chords: &[
        &[0, 0],
        &[
            prefix(0, 0),
            CMD_CYCLE_ANAGRAM,
            prefix(1, 0),
            CMD_CYCLE_CAPITAL,
            prefix(1, 0),
            CMD_CYCLE_NOSPACE,
            prefix(1, 0),
            CMD_RELEASE_ALL,
            prefix(1, 0),
            CMD_GAMING_MODE,
            0,
            0,
        ],
        &[prefix(0, 0), CMD_STICKY_SHIFT, 0, 0],
    ],
    sequences: &[
        &[],
        &[
            command::CYCLE_ANAGRAM,
            command::CYCLE_CAPITAL,
            command::CYCLE_NOSPACE,
            command::RELEASE_ALL,
            command::SET_MODE_MIN + 1,
        ],
        &[command::STICKY_MODS, modifier::LEFT_SHIFT],
    ],
    encoding: Encoding::Raw,
};

/// 0x07 -> 1a, 0x05 -> ten (anagram 1: net), 0x06 -> cat
const WORD: Kmap<'static> = Kmap {
    chords: &[
        &[0, 0],
        &[0, 0],
        &[prefix(0, 0), 0x07, 0, 0],
        &[
            prefix(0, 0),
            0x05,
            prefix(1, 1),
            0x05,
            prefix(1, 0),
            0x06,
            0,
            0,
        ],
    ],
    sequences: &[
        &[],
        &[],
        &[0x78, 0x40],
        &[0x5c, 0x84, 0x51, 0x21, 0x71, 0x84, 0x5c],
    ],
    encoding: Encoding::Compressed,
};

const KMAPS: [Kmap<'static>; 4] = [PLAIN, MACRO, COMMAND, WORD];

const MODES: [Mode<'static, 1>; 2] = [
    Mode {
        kmaps: [&[KmapId(0)], &[KmapId(1)], &[KmapId(2)], &[KmapId(3)]],
        mod_chords: &MOD_CHORDS,
        anagram_mask: [ANAGRAM],
        anagram_chords: &[[0], [ANAGRAM]],
        is_gaming: false,
    },
    Mode {
        kmaps: [&[KmapId(0)], &[], &[], &[]],
        mod_chords: &MOD_CHORDS,
        anagram_mask: [0],
        anagram_chords: &[],
        is_gaming: true,
    },
];

pub const GAMING_MODE: u8 = 1;

const BASE: Registry<'static, 1> = Registry {
    kmaps: &KMAPS,
    modes: &MODES,
    plain_mods: &[
        PlainMod {
            id: MOD_SHIFT,
            hid: modifier::LEFT_SHIFT,
        },
        PlainMod {
            id: MOD_CTRL,
            hid: modifier::LEFT_CTRL,
        },
    ],
    word_mods: &[MOD_NOSPACE, MOD_CAPITAL],
    nospace: MOD_NOSPACE,
    capital: MOD_CAPITAL,
    double: None,
    shorten: None,
    mod_count: 4,
};

pub static CONF: Registry<'static, 1> = BASE;

/// Like [CONF] but the shift switch shortens words and the ctrl switch doubles their last key.
pub static WORD_EDIT_CONF: Registry<'static, 1> = Registry {
    plain_mods: &[],
    word_mods: &[MOD_NOSPACE, MOD_CAPITAL, MOD_SHIFT, MOD_CTRL],
    double: Some(MOD_CTRL),
    shorten: Some(MOD_SHIFT),
    ..BASE
};
