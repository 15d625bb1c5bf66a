use embassy_futures::select::{select, Either};
use embassy_sync::{
    blocking_mutex::raw::{NoopRawMutex, RawMutex},
    channel::Channel,
    signal::Signal,
};
use embassy_time::{Instant, Timer};
use pipit_common::{command, keycodes::key};

use crate::{
    chord::Chord,
    conf::{ConfigError, Registry, SeqType, Settings},
    lookup::{lookup, Key, KeySeq},
    matrix::Matrix,
    switches::Switches,
};

/// Output for the transport.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeyEvent {
    /// Tap each key in turn with `mods` held down as well as the key's own modifiers.
    Sequence { keys: KeySeq, mods: u8 },
    /// Keep `keys` and `mods` down until the next event. Empty keys and mods release everything.
    Hold { keys: KeySeq, mods: u8 },
    /// Release everything held.
    Release,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlMessage {
    SetMode(u8),
    Exit,
}

#[derive(Default)]
pub struct ControlSignal(Signal<NoopRawMutex, ControlMessage>);
impl ControlSignal {
    pub fn set_mode(&self, mode: u8) {
        self.0.signal(ControlMessage::SetMode(mode));
    }

    pub fn exit(&self) {
        self.0.signal(ControlMessage::Exit);
    }

    #[cfg(test)]
    pub fn try_take(&self) -> Option<ControlMessage> {
        self.0.try_take()
    }
}

pub struct EngineChannel<M: RawMutex, const Q: usize>(Channel<M, KeyEvent, Q>, ControlSignal);
impl<M: RawMutex, const Q: usize> Default for EngineChannel<M, Q> {
    fn default() -> Self {
        Self(Channel::new(), ControlSignal::default())
    }
}
impl<M: RawMutex, const Q: usize> EngineChannel<M, Q> {
    pub async fn receive(&self) -> KeyEvent {
        self.0.receive().await
    }

    pub fn try_receive(&self) -> Option<KeyEvent> {
        self.0.try_receive().ok()
    }

    pub fn control(&self) -> &ControlSignal {
        &self.1
    }

    async fn wait_control(&self) -> ControlMessage {
        self.control().0.wait().await
    }

    /// Queue `event`. If the transport has fallen behind, pending events are dropped and
    /// everything is released.
    fn report(&self, event: KeyEvent) {
        if self.0.try_send(event).is_err() {
            crate::warn!("event queue full");
            self.clear_reports();
            let _ = self.0.try_send(KeyEvent::Release);
        }
    }

    fn clear_reports(&self) {
        self.0.clear();
    }
}

pub const MIN_EVENT_BUFFER_SIZE: usize = 4;

const fn assert_sizes<const Q: usize>() -> bool {
    assert!(Q >= MIN_EVENT_BUFFER_SIZE);
    true
}

/// The most recent word, kept so it can be cycled.
#[derive(Debug, Clone, Copy)]
struct LastWord<const B: usize> {
    chord: Chord<B>,
    /// Keys sent, including any trailing space.
    sent: usize,
}

/// Turns switch samples from `X` into [KeyEvent]s on an [EngineChannel].
pub struct Engine<'c, 'a, X, M, const N: usize, const B: usize, const Q: usize>
where
    X: Matrix,
    M: RawMutex,
{
    conf: &'a Registry<'a, B>,
    settings: Settings,
    matrix: X,
    switches: Switches<N, B>,
    channel: &'c EngineChannel<M, Q>,
    mode: u8,
    last_word: Option<LastWord<B>>,
    /// HID modifiers added to every report.
    sticky: u8,
}

impl<'c, 'a, X, M, const N: usize, const B: usize, const Q: usize> Engine<'c, 'a, X, M, N, B, Q>
where
    X: Matrix,
    M: RawMutex,
{
    const OKAY: bool = assert_sizes::<Q>();

    pub fn new(
        conf: &'a Registry<'a, B>,
        settings: Settings,
        matrix: X,
        channel: &'c EngineChannel<M, Q>,
    ) -> Result<Self, ConfigError> {
        assert!(Self::OKAY);
        conf.validate()?;
        Ok(Self {
            conf,
            settings,
            matrix,
            switches: Switches::new(&settings),
            channel,
            mode: 0,
            last_word: None,
            sticky: 0,
        })
    }

    pub fn mode(&self) -> u8 {
        self.mode
    }

    pub fn switches(&self) -> &Switches<N, B> {
        &self.switches
    }

    pub fn matrix_mut(&mut self) -> &mut X {
        &mut self.matrix
    }

    pub fn apply_settings(&mut self, settings: Settings) {
        self.settings = settings;
        self.switches.apply_settings(&settings);
    }

    pub fn set_mode(&mut self, mode: u8) {
        if !self.conf.is_valid_mode(mode) {
            crate::warn!("no mode {}", mode);
            return;
        }
        crate::info!("mode {}", mode);
        self.mode = mode;
        self.last_word = None;
        self.sticky = 0;
        self.channel.report(KeyEvent::Release);
    }

    /// Release every key but the sticky modifiers.
    fn release(&self) {
        if self.sticky == 0 {
            self.channel.report(KeyEvent::Release);
        } else {
            self.channel.report(KeyEvent::Hold {
                keys: KeySeq::new(),
                mods: self.sticky,
            });
        }
    }

    fn is_gaming(&self) -> bool {
        self.conf.mode(self.mode).is_some_and(|m| m.is_gaming)
    }

    /// Scan tick: poll until [ControlMessage::Exit].
    pub async fn run(&mut self) -> ControlMessage {
        loop {
            self.tick(Instant::now());

            if let Either::Second(ctl) = select(
                Timer::after(self.settings.scan_period),
                self.channel.wait_control(),
            )
            .await
            {
                if let Some(ctl) = self.control(ctl) {
                    return ctl;
                }
            }
        }
    }

    /// Act on a control message. Returns the message if `run` should return it.
    pub fn control(&mut self, ctl: ControlMessage) -> Option<ControlMessage> {
        match ctl {
            ControlMessage::SetMode(mode) => {
                self.set_mode(mode);
                None
            }
            ControlMessage::Exit => Some(ctl),
        }
    }

    /// Sample the matrix once at `now` and report anything that became ready.
    pub fn tick(&mut self, now: Instant) {
        let is_gaming = self.is_gaming();
        self.switches.update(&mut self.matrix, now, is_gaming);

        if self.switches.ready_to_press(now, is_gaming) {
            if is_gaming {
                self.send_gaming();
            } else {
                self.send_chord();
            }
        }

        if self.switches.ready_to_release(now, is_gaming) {
            self.release();
        }
    }

    fn send_chord(&mut self) {
        let mut chord = Chord::new(self.mode);
        self.switches.fill_chord(&mut chord);
        if chord.is_empty() {
            return;
        }
        crate::debug!("chord {:?}", chord.bits());

        if let Some(seq) = lookup(self.conf, &chord, SeqType::Command) {
            self.run_command(&seq);
            return;
        }

        chord.extract_plain_mods(self.conf);
        let mods = chord.mod_byte(self.conf) | self.sticky;
        if chord.is_empty() {
            self.switches.reuse_mods(&chord, self.conf);
            self.channel.report(KeyEvent::Hold {
                keys: KeySeq::new(),
                mods,
            });
            return;
        }

        for seq_type in [SeqType::Plain, SeqType::Macro] {
            if let Some(keys) = lookup(self.conf, &chord, seq_type) {
                self.switches.reuse_mods(&chord, self.conf);
                self.last_word = None;
                self.channel.report(KeyEvent::Sequence { keys, mods });
                return;
            }
        }

        chord.extract_word_mods(self.conf);
        chord.extract_anagram_mods(self.conf);
        if self.send_word(&chord) {
            self.switches.reuse_mods(&chord, self.conf);
        } else {
            crate::debug!("unmapped chord {:?}", chord.bits());
        }
    }

    fn send_word(&mut self, chord: &Chord<B>) -> bool {
        let Some(mut keys) = lookup(self.conf, chord, SeqType::Word) else {
            return false;
        };
        chord.edit_length(self.conf, &mut keys);
        chord.edit_caps(self.conf, &mut keys);
        if !chord.has_mod_nospace(self.conf) && keys.push(Key::new(key::SPACE, 0)).is_err() {
            crate::warn!("no room for space");
        }

        self.last_word = Some(LastWord {
            chord: *chord,
            sent: keys.len(),
        });
        self.channel.report(KeyEvent::Sequence {
            keys,
            mods: chord.mod_byte(self.conf) | self.sticky,
        });
        true
    }

    fn run_command(&mut self, seq: &[Key]) {
        let Some(cmd) = seq.first().map(|k| k.code) else {
            return;
        };
        crate::debug!("command {}", cmd);
        match cmd {
            command::CYCLE_ANAGRAM | command::CYCLE_CAPITAL | command::CYCLE_NOSPACE => {
                self.cycle_last_word(cmd)
            }
            command::RELEASE_ALL => {
                self.last_word = None;
                self.sticky = 0;
                self.channel.clear_reports();
                self.channel.report(KeyEvent::Release);
            }
            command::STICKY_MODS => {
                let Some(mods) = seq.get(1).map(|k| k.code) else {
                    crate::warn!("no modifiers to make sticky");
                    return;
                };
                self.sticky ^= mods;
                crate::debug!("sticky {}", self.sticky);
                self.release();
            }
            command::SET_MODE_MIN..=command::SET_MODE_MAX => {
                self.set_mode(cmd - command::SET_MODE_MIN)
            }
            _ => crate::warn!("unknown command {}", cmd),
        }
    }

    /// Replace the last word with its next anagram, capitalization or spacing.
    fn cycle_last_word(&mut self, cmd: u8) {
        let Some(last) = self.last_word else {
            crate::debug!("no word to cycle");
            return;
        };
        let conf = self.conf;
        let mut chord = last.chord;
        match cmd {
            command::CYCLE_ANAGRAM => {
                let count = conf.mode(chord.mode()).map_or(1, |m| m.anagram_count());
                for _ in 0..count {
                    chord.cycle_anagram(conf);
                    if lookup(conf, &chord, SeqType::Word).is_some() {
                        break;
                    }
                }
            }
            command::CYCLE_CAPITAL => {
                let keys = lookup(conf, &chord, SeqType::Word).unwrap_or_default();
                chord.cycle_capital(conf, &keys);
            }
            _ => chord.cycle_nospace(conf),
        }

        let mut erase = KeySeq::new();
        for _ in 0..last.sent {
            let _ = erase.push(Key::new(key::BACKSPACE, 0));
        }
        self.channel.report(KeyEvent::Sequence {
            keys: erase,
            mods: 0,
        });
        if !self.send_word(&chord) {
            self.last_word = None;
        }
    }

    /// Report every down switch at once; each is looked up on its own.
    fn send_gaming(&mut self) {
        let mut keys = KeySeq::new();
        let mut mods = self.sticky;
        for chord in self.switches.fill_gaming_switches(self.mode).iter_mut() {
            chord.extract_plain_mods(self.conf);
            mods |= chord.mod_byte(self.conf);
            if chord.is_empty() {
                continue;
            }
            let Some(seq) = lookup(self.conf, chord, SeqType::Plain) else {
                continue;
            };
            for k in seq {
                if keys.push(k).is_err() {
                    crate::warn!("too many gaming keys");
                    break;
                }
            }
        }
        self.channel.report(KeyEvent::Hold { keys, mods });
    }
}

#[cfg(test)]
#[path = "engine_test.rs"]
mod test;
