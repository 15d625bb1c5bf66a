pub mod key_range {
    pub const BASIC_MIN: u8 = 0x4;
    pub const BASIC_A: u8 = 0x4;
    pub const BASIC_Z: u8 = 0x1d;
    pub const BASIC_1: u8 = 0x1e;
    pub const BASIC_0: u8 = 0x27;
    pub const BASIC_MAX: u8 = 0xa4;
    pub const MODIFIER_MIN: u8 = 0xe0;
    pub const MODIFIER_MAX: u8 = 0xe7;

    /// Largest key code that fits in a compressed (6 bit) dictionary entry.
    pub const COMPRESSED_MAX: u8 = 0x3f;
}

pub mod key {
    pub const NONE: u8 = 0x00;
    pub const ENTER: u8 = 0x28;
    pub const ESCAPE: u8 = 0x29;
    pub const BACKSPACE: u8 = 0x2a;
    pub const TAB: u8 = 0x2b;
    pub const SPACE: u8 = 0x2c;
}

/// Bits of the HID boot keyboard modifier byte.
pub mod modifier {
    pub const LEFT_CTRL: u8 = 0x01;
    pub const LEFT_SHIFT: u8 = 0x02;
    pub const LEFT_ALT: u8 = 0x04;
    pub const LEFT_GUI: u8 = 0x08;
    pub const RIGHT_CTRL: u8 = 0x10;
    pub const RIGHT_SHIFT: u8 = 0x20;
    pub const RIGHT_ALT: u8 = 0x40;
    pub const RIGHT_GUI: u8 = 0x80;

    pub const SHIFT: u8 = LEFT_SHIFT | RIGHT_SHIFT;

    /// Convert a modifier key code (0xe0..=0xe7) to its bit in the modifier byte.
    pub const fn from_key_code(code: u8) -> u8 {
        if code >= super::key_range::MODIFIER_MIN && code <= super::key_range::MODIFIER_MAX {
            1 << (code - super::key_range::MODIFIER_MIN)
        } else {
            0
        }
    }
}

pub const fn is_alpha(code: u8) -> bool {
    code >= key_range::BASIC_A && code <= key_range::BASIC_Z
}

pub const fn is_shifted(mods: u8) -> bool {
    mods & modifier::SHIFT != 0
}

#[cfg(test)]
#[path = "keycodes_test.rs"]
mod test;
