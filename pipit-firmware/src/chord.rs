use pipit_common::{
    keycodes::{is_alpha, is_shifted, modifier},
    MAX_MODIFIERS,
};

use crate::{
    conf::{ModId, Registry},
    lookup::{Key, KeySeq},
};

/// How the capital modifier changes the first key of a word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CapBehavior {
    /// Shift the first letter.
    #[default]
    Default,
    /// The word already starts with a capital; unshift it.
    First,
    /// The word does not start with a letter.
    None,
}

/// Modifiers extracted from a chord, one bit per [ModId]. The top bit marks that the capital
/// behavior has been decided for this chord.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ModFlags(u16);

impl ModFlags {
    const CYCLE_CAPITAL: u16 = 1 << MAX_MODIFIERS;

    fn mask(id: ModId) -> u16 {
        if id as usize >= MAX_MODIFIERS {
            crate::error!("invalid modifier {}", id);
            0
        } else {
            1 << id
        }
    }

    pub fn has(&self, id: ModId) -> bool {
        self.0 & Self::mask(id) != 0
    }

    pub fn set(&mut self, id: ModId) {
        self.0 |= Self::mask(id);
    }

    pub fn unset(&mut self, id: ModId) {
        self.0 &= !Self::mask(id);
    }

    pub fn toggle(&mut self, id: ModId) {
        self.0 ^= Self::mask(id);
    }

    pub fn cycle_capital(&self) -> bool {
        self.0 & Self::CYCLE_CAPITAL != 0
    }

    pub fn set_cycle_capital(&mut self) {
        self.0 |= Self::CYCLE_CAPITAL;
    }

    pub fn is_empty(&self) -> bool {
        self.0 & !Self::CYCLE_CAPITAL == 0
    }
}

/// A set of switches, one bit each, plus what has been extracted from them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Chord<const B: usize> {
    bits: [u8; B],
    mods: ModFlags,
    anagram: u8,
    /// One bit per anagram number whose chord was extracted.
    anagram_mods: u16,
    cap_behavior: CapBehavior,
    mode: u8,
}

impl<const B: usize> Default for Chord<B> {
    fn default() -> Self {
        Self::new(0)
    }
}

impl<const B: usize> Chord<B> {
    pub const fn new(mode: u8) -> Self {
        Self {
            bits: [0; B],
            mods: ModFlags(0),
            anagram: 0,
            anagram_mods: 0,
            cap_behavior: CapBehavior::Default,
            mode,
        }
    }

    pub fn from_bits(mode: u8, bits: [u8; B]) -> Self {
        let mut chord = Self::new(mode);
        chord.bits = bits;
        chord
    }

    /// Clear everything but the mode.
    pub fn clear(&mut self) {
        *self = Self::new(self.mode);
    }

    pub fn copy_from(&mut self, other: &Self) {
        *self = *other;
    }

    pub fn set_bit(&mut self, index: usize) {
        crate::add_bit(&mut self.bits, index);
    }

    pub fn set_bits(&mut self, bits: &[u8; B]) {
        self.bits = *bits;
    }

    pub fn bit(&self, index: usize) -> bool {
        crate::test_bit(&self.bits, index)
    }

    pub fn bits(&self) -> &[u8; B] {
        &self.bits
    }

    pub fn is_empty(&self) -> bool {
        crate::is_blank(&self.bits)
    }

    pub fn mode(&self) -> u8 {
        self.mode
    }

    pub fn set_mode(&mut self, mode: u8) {
        self.mode = mode;
    }

    pub fn anagram(&self) -> u8 {
        self.anagram
    }

    pub fn mods(&self) -> ModFlags {
        self.mods
    }

    /// The chord is `pattern` and is on anagram `anagram`, or `pattern` has no other anagrams.
    pub fn matches(&self, pattern: &[u8], anagram: u8, unambiguous: bool) -> bool {
        self.bits.as_slice() == pattern && (unambiguous || self.anagram == anagram)
    }

    pub fn has_mod(&self, id: ModId) -> bool {
        self.mods.has(id)
    }

    pub fn has_mod_nospace(&self, conf: &Registry<'_, B>) -> bool {
        self.mods.has(conf.nospace)
    }

    pub fn set_mod_nospace(&mut self, conf: &Registry<'_, B>) {
        self.mods.set(conf.nospace);
    }

    pub fn has_mod_double(&self, conf: &Registry<'_, B>) -> bool {
        conf.double.is_some_and(|id| self.mods.has(id))
    }

    pub fn has_mod_shorten(&self, conf: &Registry<'_, B>) -> bool {
        conf.shorten.is_some_and(|id| self.mods.has(id))
    }

    /// The HID modifier byte of the extracted plain modifiers.
    pub fn mod_byte(&self, conf: &Registry<'_, B>) -> u8 {
        conf.plain_mods
            .iter()
            .filter(|m| self.mods.has(m.id))
            .fold(0, |acc, m| acc | m.hid)
    }

    fn extract_mod(&mut self, pattern: &[u8; B], id: ModId) -> bool {
        if crate::is_blank(pattern) || !crate::contains_bits(&self.bits, pattern) {
            return false;
        }
        for (b, p) in self.bits.iter_mut().zip(pattern) {
            *b &= !p;
        }
        self.mods.set(id);
        true
    }

    fn restore_mod(&mut self, pattern: &[u8; B], id: ModId) {
        if self.mods.has(id) {
            for (b, p) in self.bits.iter_mut().zip(pattern) {
                *b |= p;
            }
            self.mods.unset(id);
        }
    }

    pub fn extract_plain_mods(&mut self, conf: &Registry<'_, B>) {
        let Some(mode) = conf.mode(self.mode) else {
            return;
        };
        for m in conf.plain_mods {
            self.extract_mod(&conf.mod_chord(mode, m.id), m.id);
        }
    }

    /// Word modifiers are only extracted when exactly one of them is in the chord.
    pub fn extract_word_mods(&mut self, conf: &Registry<'_, B>) {
        let Some(mode) = conf.mode(self.mode) else {
            return;
        };
        let mut found = None;
        for &id in conf.word_mods {
            let pattern = conf.mod_chord(mode, id);
            if !crate::is_blank(&pattern) && crate::contains_bits(&self.bits, &pattern) {
                if found.is_some() {
                    return;
                }
                found = Some((id, pattern));
            }
        }
        if let Some((id, pattern)) = found {
            self.extract_mod(&pattern, id);
        }
    }

    pub fn restore_word_mods(&mut self, conf: &Registry<'_, B>) {
        let Some(mode) = conf.mode(self.mode) else {
            return;
        };
        for &id in conf.word_mods {
            self.restore_mod(&conf.mod_chord(mode, id), id);
        }
    }

    pub fn extract_anagram_mods(&mut self, conf: &Registry<'_, B>) {
        let Some(mode) = conf.mode(self.mode) else {
            return;
        };
        let mask = &mode.anagram_mask;
        if crate::is_blank(mask) {
            return;
        }
        let mut masked = self.bits;
        for (m, b) in masked.iter_mut().zip(mask) {
            *m &= b;
        }
        if let Some(i) = mode.anagram_chords.iter().position(|c| *c == masked) {
            for (b, m) in self.bits.iter_mut().zip(mask) {
                *b &= !m;
            }
            self.anagram = i as u8;
            self.anagram_mods |= 1 << i;
        }
    }

    pub fn restore_anagram_mods(&mut self, conf: &Registry<'_, B>) {
        let Some(mode) = conf.mode(self.mode) else {
            return;
        };
        for (i, pattern) in mode.anagram_chords.iter().enumerate() {
            if self.anagram_mods & (1 << i) != 0 {
                for (b, p) in self.bits.iter_mut().zip(pattern) {
                    *b |= p;
                }
            }
        }
        self.anagram_mods = 0;
        self.anagram = 0;
    }

    /// Advance to the next anagram sharing this chord. Returns the new anagram number.
    pub fn cycle_anagram(&mut self, conf: &Registry<'_, B>) -> u8 {
        let count = conf.mode(self.mode).map_or(1, |m| m.anagram_count()) as u8;
        self.anagram = (self.anagram + 1) % count;
        self.anagram_mods = 1 << self.anagram;
        self.anagram
    }

    pub fn cycle_nospace(&mut self, conf: &Registry<'_, B>) {
        self.mods.toggle(conf.nospace);
    }

    /// Toggle the capital modifier. The first cycle decides, from `keys`, what capitalizing means
    /// for this chord; later cycles reuse that decision.
    pub fn cycle_capital(&mut self, conf: &Registry<'_, B>, keys: &[Key]) {
        if !self.mods.cycle_capital() {
            self.cap_behavior = Self::decide_cap_behavior(keys);
            self.mods.set_cycle_capital();
        }
        self.mods.toggle(conf.capital);
    }

    pub fn cap_behavior(&self, keys: &[Key]) -> CapBehavior {
        if self.mods.cycle_capital() {
            self.cap_behavior
        } else {
            Self::decide_cap_behavior(keys)
        }
    }

    pub fn decide_cap_behavior(keys: &[Key]) -> CapBehavior {
        match keys.first() {
            Some(k) if is_alpha(k.code) => {
                if is_shifted(k.mods) {
                    CapBehavior::First
                } else {
                    CapBehavior::Default
                }
            }
            _ => CapBehavior::None,
        }
    }

    /// Apply the shorten and double modifiers: drop the last key, or repeat it.
    pub fn edit_length(&self, conf: &Registry<'_, B>, keys: &mut KeySeq) {
        if self.has_mod_shorten(conf) {
            keys.pop();
        }
        if self.has_mod_double(conf) {
            if let Some(last) = keys.last().copied() {
                if keys.push(last).is_err() {
                    crate::warn!("no room to double");
                }
            }
        }
    }

    /// Apply the capital modifier, if set, to `keys`.
    pub fn edit_caps(&self, conf: &Registry<'_, B>, keys: &mut [Key]) {
        if !self.mods.has(conf.capital) {
            return;
        }
        let behavior = self.cap_behavior(keys);
        let Some(first) = keys.first_mut() else {
            return;
        };
        match behavior {
            CapBehavior::Default => first.mods |= modifier::LEFT_SHIFT,
            CapBehavior::First => first.mods &= !modifier::SHIFT,
            CapBehavior::None => {}
        }
    }
}

#[cfg(test)]
#[path = "chord_test.rs"]
mod test;
