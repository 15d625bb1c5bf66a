pub const SETTINGS_VERSION: u16 = 1;

pub const DEBOUNCE_DELAY: u16 = 0;
pub const CHORD_DELAY: u16 = 1;
pub const HELD_DELAY: u16 = 2;
pub const SCAN_PERIOD: u16 = 3;

pub const DEBOUNCE_DELAY_DEFAULT: u16 = 10;
pub const CHORD_DELAY_DEFAULT: u16 = 30;
pub const HELD_DELAY_DEFAULT: u16 = 300;
pub const SCAN_PERIOD_DEFAULT: u16 = 1;
