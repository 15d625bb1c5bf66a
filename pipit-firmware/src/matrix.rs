use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, OutputPin},
};

/// Physical switch state, sampled by the engine once per tick.
pub trait Matrix {
    /// Sample the switches. Returns true if any switch changed since the last scan.
    fn scan_if_changed(&mut self) -> bool;

    /// Is switch `index` physically down?
    fn get(&self, index: usize) -> bool;
}

const fn check_pins<const INPUT_N: usize, const OUTPUT_N: usize>() -> bool {
    assert!(INPUT_N > 0 && INPUT_N < 128);
    assert!(OUTPUT_N > 0 && OUTPUT_N < 128);
    true
}

/// A diode matrix driven through `embedded-hal` pins. Output pins are pulled low one at a time
/// and the input pins, pulled up, read low where a switch is down.
///
/// Switch `index` is `output * INPUT_N + input`.
pub struct PinMatrix<I, O, D, const INPUT_N: usize, const OUTPUT_N: usize>
where
    I: InputPin,
    O: OutputPin,
    D: DelayNs,
{
    input_pins: [I; INPUT_N],
    output_pins: [O; OUTPUT_N],
    delay: D,
    /// Time for an input to settle after its output pin is driven.
    settle_us: u32,
    state: [[bool; INPUT_N]; OUTPUT_N],
}

impl<I, O, D, const INPUT_N: usize, const OUTPUT_N: usize> PinMatrix<I, O, D, INPUT_N, OUTPUT_N>
where
    I: InputPin,
    O: OutputPin,
    D: DelayNs,
{
    const OKAY: bool = check_pins::<INPUT_N, OUTPUT_N>();

    pub fn new(input_pins: [I; INPUT_N], mut output_pins: [O; OUTPUT_N], delay: D) -> Self {
        assert!(Self::OKAY);
        for op in output_pins.iter_mut() {
            let _ = op.set_high();
        }
        Self {
            input_pins,
            output_pins,
            delay,
            settle_us: 10,
            state: [[false; INPUT_N]; OUTPUT_N],
        }
    }

    pub fn set_settle_time(&mut self, micros: u32) {
        self.settle_us = micros;
    }
}

impl<I, O, D, const INPUT_N: usize, const OUTPUT_N: usize> Matrix
    for PinMatrix<I, O, D, INPUT_N, OUTPUT_N>
where
    I: InputPin,
    O: OutputPin,
    D: DelayNs,
{
    fn scan_if_changed(&mut self) -> bool {
        let mut changed = false;
        for (op, row) in self.output_pins.iter_mut().zip(self.state.iter_mut()) {
            let _ = op.set_low();
            self.delay.delay_us(self.settle_us);

            for (ip, s) in self.input_pins.iter_mut().zip(row.iter_mut()) {
                let is_down = ip.is_low().unwrap_or(false);
                if *s != is_down {
                    *s = is_down;
                    changed = true;
                }
            }

            let _ = op.set_high();
        }
        changed
    }

    fn get(&self, index: usize) -> bool {
        self.state
            .get(index / INPUT_N)
            .and_then(|row| row.get(index % INPUT_N))
            .copied()
            .unwrap_or(false)
    }
}

#[cfg(test)]
#[path = "matrix_test.rs"]
mod test;
