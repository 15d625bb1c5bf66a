use embassy_time::Duration;
use pipit_common::{globals, MAX_ANAGRAMS, MAX_MODIFIERS};

/// Selects which dictionaries of a mode a lookup searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum SeqType {
    Plain = 0,
    Macro = 1,
    Command = 2,
    Word = 3,
}
pub const SEQ_TYPE_COUNT: usize = 4;

/// How the sequences of a kmap are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Encoding {
    /// One byte per key.
    Raw,
    /// A key byte followed by a modifier byte.
    RawWithMods,
    /// 6 bits per key; see [pipit_common::codec].
    Compressed,
}

/// A dictionary: for each length class (index = number of keys) a chord record stream and the
/// matching sequence table.
#[derive(Debug, Clone, Copy)]
pub struct Kmap<'a> {
    pub chords: &'a [&'a [u8]],
    pub sequences: &'a [&'a [u8]],
    pub encoding: Encoding,
}

/// Index of a [Kmap] in [Registry::kmaps].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KmapId(pub u8);

/// A modifier number; its chord is `Mode::mod_chords[id]` and it owns bit `id` of the chord's
/// modifier word.
pub type ModId = u8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlainMod {
    pub id: ModId,
    /// Bit in the HID modifier byte.
    pub hid: u8,
}

#[derive(Debug, Clone, Copy)]
pub struct Mode<'a, const B: usize> {
    /// Kmaps to search for each [SeqType], highest priority first.
    pub kmaps: [&'a [KmapId]; SEQ_TYPE_COUNT],
    pub mod_chords: &'a [[u8; B]],
    /// Switches that select an anagram.
    pub anagram_mask: [u8; B],
    /// Pattern, within `anagram_mask`, of each anagram number.
    pub anagram_chords: &'a [[u8; B]],
    /// Each switch is reported on its own with no chord timing.
    pub is_gaming: bool,
}

impl<'a, const B: usize> Mode<'a, B> {
    pub fn kmap_ids(&self, seq_type: SeqType) -> &'a [KmapId] {
        self.kmaps[seq_type as usize]
    }

    pub fn anagram_count(&self) -> usize {
        if crate::is_blank(&self.anagram_mask) {
            1
        } else {
            self.anagram_chords.len().max(1)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    NoModes,
    TooManyModifiers,
    TooManyAnagrams { mode: u8 },
    MissingModChord { mode: u8 },
    BadKmapId { mode: u8 },
    ClassMismatch { kmap: u8 },
    BadModId,
    NotWordMod,
}

/// Every table the engine reads. Built from `'static` data and checked once with
/// [Registry::validate].
#[derive(Debug, Clone, Copy)]
pub struct Registry<'a, const B: usize> {
    pub kmaps: &'a [Kmap<'a>],
    pub modes: &'a [Mode<'a, B>],
    pub plain_mods: &'a [PlainMod],
    pub word_mods: &'a [ModId],
    pub nospace: ModId,
    pub capital: ModId,
    /// Word modifier that repeats the last key of a word.
    pub double: Option<ModId>,
    /// Word modifier that drops the last key of a word.
    pub shorten: Option<ModId>,
    pub mod_count: u8,
}

impl<'a, const B: usize> Registry<'a, B> {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.modes.is_empty() {
            return Err(ConfigError::NoModes);
        }
        let mod_count = self.mod_count as usize;
        if mod_count > MAX_MODIFIERS {
            return Err(ConfigError::TooManyModifiers);
        }

        for (i, kmap) in self.kmaps.iter().enumerate() {
            if kmap.chords.len() != kmap.sequences.len() {
                crate::warn!("kmap {} has mismatched length classes", i);
                return Err(ConfigError::ClassMismatch { kmap: i as u8 });
            }
        }

        for (i, mode) in self.modes.iter().enumerate() {
            let m = i as u8;
            if mode.anagram_chords.len() > MAX_ANAGRAMS {
                return Err(ConfigError::TooManyAnagrams { mode: m });
            }
            if mode.mod_chords.len() < mod_count {
                return Err(ConfigError::MissingModChord { mode: m });
            }
            if mode
                .kmaps
                .iter()
                .flat_map(|ids| ids.iter())
                .any(|id| id.0 as usize >= self.kmaps.len())
            {
                return Err(ConfigError::BadKmapId { mode: m });
            }
        }

        if self
            .plain_mods
            .iter()
            .map(|m| m.id)
            .chain(self.word_mods.iter().copied())
            .any(|id| id as usize >= mod_count)
        {
            return Err(ConfigError::BadModId);
        }

        if [self.nospace, self.capital]
            .into_iter()
            .chain(self.double)
            .chain(self.shorten)
            .any(|id| !self.word_mods.contains(&id))
        {
            return Err(ConfigError::NotWordMod);
        }

        Ok(())
    }

    /// The mode numbered `mode`, falling back to mode 0 if it does not exist.
    pub fn mode(&self, mode: u8) -> Option<&'a Mode<'a, B>> {
        match self.modes.get(mode as usize) {
            Some(m) => Some(m),
            None => {
                crate::error!("invalid mode {}", mode);
                self.modes.first()
            }
        }
    }

    pub fn kmap(&self, id: KmapId) -> Option<&'a Kmap<'a>> {
        let kmap = self.kmaps.get(id.0 as usize);
        if kmap.is_none() {
            crate::error!("invalid kmap {}", id.0);
        }
        kmap
    }

    /// The chord of modifier `id` in `mode`, or a blank chord if it is not defined.
    pub fn mod_chord(&self, mode: &Mode<'a, B>, id: ModId) -> [u8; B] {
        match mode.mod_chords.get(id as usize) {
            Some(c) => *c,
            None => {
                crate::error!("no chord for modifier {}", id);
                [0; B]
            }
        }
    }

    pub fn is_valid_mode(&self, mode: u8) -> bool {
        (mode as usize) < self.modes.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LoadError {
    VersionMismatch,
    Corrupt,
}

/// Timing configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Settings {
    pub debounce_delay: Duration,
    pub chord_delay: Duration,
    pub held_delay: Duration,
    pub scan_period: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debounce_delay: ms(globals::DEBOUNCE_DELAY_DEFAULT),
            chord_delay: ms(globals::CHORD_DELAY_DEFAULT),
            held_delay: ms(globals::HELD_DELAY_DEFAULT),
            scan_period: ms(globals::SCAN_PERIOD_DEFAULT),
        }
    }
}

impl Settings {
    /// Load settings from a stream of words:
    ///
    /// settings version
    /// pair count
    /// (setting id, milliseconds) * pair count
    ///
    /// Settings missing from the stream keep their default.
    pub fn load(iter: impl IntoIterator<Item = u16>) -> Result<Self, LoadError> {
        let mut iter = iter.into_iter();
        if iter.next().ok_or(LoadError::Corrupt)? != globals::SETTINGS_VERSION {
            return Err(LoadError::VersionMismatch);
        }

        let mut settings = Self::default();
        let count = iter.next().ok_or(LoadError::Corrupt)?;
        for _ in 0..count {
            let id = iter.next().ok_or(LoadError::Corrupt)?;
            let value = ms(iter.next().ok_or(LoadError::Corrupt)?);
            match id {
                globals::DEBOUNCE_DELAY => settings.debounce_delay = value,
                globals::CHORD_DELAY => settings.chord_delay = value,
                globals::HELD_DELAY => settings.held_delay = value,
                globals::SCAN_PERIOD => settings.scan_period = value,
                _ => {
                    crate::warn!("unknown setting {}", id);
                    return Err(LoadError::Corrupt);
                }
            }
        }

        if settings.scan_period.as_ticks() == 0 {
            crate::warn!("scan period must not be zero");
            return Err(LoadError::Corrupt);
        }

        Ok(settings)
    }
}

fn ms(value: u16) -> Duration {
    Duration::from_millis(value as u64)
}

#[cfg(test)]
#[path = "conf_test.rs"]
mod test;
