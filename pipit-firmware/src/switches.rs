use embassy_time::Instant;
use heapless::Vec;

use crate::{
    chord::Chord,
    conf::{Registry, Settings},
    matrix::Matrix,
    timer::Timer,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SwitchStatus {
    NotPressed,
    /// Down and not yet part of a sent chord.
    Pressed,
    AlreadySent,
    /// Still down after being sent and allowed to join the next chord.
    Held,
}

/// Logs each slot's status when it changes.
#[derive(Debug)]
pub struct StatusLog<const N: usize> {
    prev: [SwitchStatus; N],
}

impl<const N: usize> Default for StatusLog<N> {
    fn default() -> Self {
        Self {
            prev: [SwitchStatus::NotPressed; N],
        }
    }
}

impl<const N: usize> StatusLog<N> {
    pub fn record(&mut self, status: &[SwitchStatus; N]) {
        for (i, (prev, s)) in self.prev.iter_mut().zip(status).enumerate() {
            if prev != s {
                crate::debug!("switch {} {:?} -> {:?}", i, *prev, *s);
                *prev = *s;
            }
        }
    }
}

const fn check_sizes<const N: usize, const B: usize>() -> bool {
    assert!(N > 0 && N <= 8 * B);
    true
}

/// Debounces `N` switches and groups presses that land close together into one chord of `B`
/// bytes.
pub struct Switches<const N: usize, const B: usize> {
    status: [SwitchStatus; N],
    debounce_timers: [Timer; N],
    /// Presses within this delay of each other form one chord.
    chord_timer: Timer,
    /// Releases within this delay of each other form one release.
    release_timer: Timer,
    /// Sent switches kept down this long may join the next chord.
    held_timer: Timer,
    last_released: Option<usize>,
    double_tapped: bool,
    gaming_changed: bool,
    log: StatusLog<N>,
}

impl<const N: usize, const B: usize> Switches<N, B> {
    const OKAY: bool = check_sizes::<N, B>();

    pub fn new(settings: &Settings) -> Self {
        assert!(Self::OKAY);
        Self {
            status: [SwitchStatus::NotPressed; N],
            debounce_timers: [Timer::new(settings.debounce_delay); N],
            chord_timer: Timer::new(settings.chord_delay),
            release_timer: Timer::new(settings.chord_delay),
            held_timer: Timer::new(settings.held_delay),
            last_released: None,
            double_tapped: false,
            gaming_changed: false,
            log: StatusLog::default(),
        }
    }

    pub fn apply_settings(&mut self, settings: &Settings) {
        for t in self.debounce_timers.iter_mut() {
            t.set_default(settings.debounce_delay);
        }
        self.chord_timer.set_default(settings.chord_delay);
        self.release_timer.set_default(settings.chord_delay);
        self.held_timer.set_default(settings.held_delay);
    }

    /// Sample `matrix` and move every slot to its new status. Readiness is checked afterwards by
    /// [Self::ready_to_press] and [Self::ready_to_release].
    pub fn update(&mut self, matrix: &mut impl Matrix, now: Instant, is_gaming: bool) {
        matrix.scan_if_changed();
        if is_gaming {
            self.update_gaming_statuses(&*matrix);
        } else {
            self.update_statuses(&*matrix, now);
            self.check_for_held_switches(now);
        }
        self.log.record(&self.status);
    }

    pub fn ready_to_press(&mut self, now: Instant, is_gaming: bool) -> bool {
        if is_gaming {
            core::mem::take(&mut self.gaming_changed)
        } else {
            self.chord_timer.is_done(now)
        }
    }

    /// Gaming mode has no release; the next change is pressed instead.
    pub fn ready_to_release(&mut self, now: Instant, is_gaming: bool) -> bool {
        !is_gaming && self.release_timer.is_done(now)
    }

    fn update_statuses(&mut self, matrix: &impl Matrix, now: Instant) {
        for i in 0..N {
            let status = self.status[i];
            if matrix.get(i) {
                match status {
                    SwitchStatus::Pressed | SwitchStatus::AlreadySent | SwitchStatus::Held => {
                        self.stop_debouncing(i)
                    }
                    SwitchStatus::NotPressed => {
                        self.debounce_press(i, now);
                    }
                }
            } else {
                match status {
                    SwitchStatus::AlreadySent | SwitchStatus::Held => {
                        self.debounce_release(i, now);
                    }
                    SwitchStatus::NotPressed => self.stop_debouncing(i),
                    SwitchStatus::Pressed => {
                        // released before its chord was sent; send it anyway
                        if self.debounce_release(i, now) {
                            self.status[i] = SwitchStatus::Pressed;
                            self.chord_timer.force_done();
                        }
                    }
                }
            }
        }
    }

    fn update_gaming_statuses(&mut self, matrix: &impl Matrix) {
        for i in 0..N {
            self.debounce_timers[i].disable();
            let status = self.status[i];
            if matrix.get(i) {
                if status == SwitchStatus::NotPressed {
                    self.status[i] = SwitchStatus::Pressed;
                    self.gaming_changed = true;
                }
            } else if status != SwitchStatus::NotPressed {
                self.status[i] = SwitchStatus::NotPressed;
                self.gaming_changed = true;
            }
        }
    }

    fn debounce_press(&mut self, i: usize, now: Instant) -> bool {
        let timer = &mut self.debounce_timers[i];
        if timer.is_disabled() {
            timer.start(now);
            return false;
        }
        if !timer.is_done(now) {
            return false;
        }

        self.status[i] = SwitchStatus::Pressed;
        self.chord_timer.start(now);
        self.held_timer.start(now);

        self.double_tapped |= self.last_released == Some(i);
        self.last_released = None;
        true
    }

    fn debounce_release(&mut self, i: usize, now: Instant) -> bool {
        let timer = &mut self.debounce_timers[i];
        if timer.is_disabled() {
            timer.start(now);
            return false;
        }
        if !timer.is_done(now) {
            return false;
        }

        self.status[i] = SwitchStatus::NotPressed;
        self.last_released = Some(i);
        self.release_timer.start(now);
        self.held_timer.start(now);
        true
    }

    fn stop_debouncing(&mut self, i: usize) {
        self.debounce_timers[i].disable();
    }

    fn check_for_held_switches(&mut self, now: Instant) {
        if self.held_timer.is_done(now) {
            self.reuse_held_switches();
        }
        if core::mem::take(&mut self.double_tapped) {
            self.reuse_held_switches();
        }
    }

    /// Let every sent switch that is still down join the next chord.
    pub fn reuse_held_switches(&mut self) {
        for s in self.status.iter_mut() {
            if *s == SwitchStatus::AlreadySent {
                *s = SwitchStatus::Held;
            }
        }
    }

    /// Let the switches of `chord`'s extracted modifiers, if still down, join the next chord.
    pub fn reuse_mods(&mut self, chord: &Chord<B>, conf: &Registry<'_, B>) {
        let Some(mode) = conf.mode(chord.mode()) else {
            return;
        };
        for id in 0..conf.mod_count {
            if !chord.has_mod(id) {
                continue;
            }
            let pattern = conf.mod_chord(mode, id);
            for (i, s) in self.status.iter_mut().enumerate() {
                if *s != SwitchStatus::NotPressed && crate::test_bit(&pattern, i) {
                    *s = SwitchStatus::Held;
                }
            }
        }
    }

    pub fn any_switch_down(&self) -> bool {
        self.status.iter().any(|s| *s != SwitchStatus::NotPressed)
    }

    pub fn status(&self, index: usize) -> SwitchStatus {
        self.status
            .get(index)
            .copied()
            .unwrap_or(SwitchStatus::NotPressed)
    }

    /// Set `chord`'s bits from the pressed and held switches. Pressed switches become sent.
    pub fn fill_chord(&mut self, chord: &mut Chord<B>) {
        let mut bits = [0; B];
        for (i, s) in self.status.iter_mut().enumerate() {
            if matches!(*s, SwitchStatus::Pressed | SwitchStatus::Held) {
                crate::add_bit(&mut bits, i);
            }
            if *s == SwitchStatus::Pressed {
                *s = SwitchStatus::AlreadySent;
            }
        }
        chord.set_bits(&bits);
    }

    /// One chord per switch that is down.
    pub fn fill_gaming_switches(&mut self, mode: u8) -> Vec<Chord<B>, N> {
        let mut chords = Vec::new();
        for (i, s) in self.status.iter_mut().enumerate() {
            if *s != SwitchStatus::NotPressed {
                let mut chord = Chord::new(mode);
                chord.set_bit(i);
                // capacity is N
                let _ = chords.push(chord);
            }
            if *s == SwitchStatus::Pressed {
                *s = SwitchStatus::AlreadySent;
            }
        }
        chords
    }
}

#[cfg(test)]
#[path = "switches_test.rs"]
mod test;
