extern crate alloc;
extern crate std;

use alloc::vec;
use embedded_hal::{
    delay::DelayNs,
    digital::{Error, ErrorType, InputPin, OutputPin},
};
use std::rc::Rc;
use std::sync::Mutex;
use std::vec::Vec;

use crate::matrix::Matrix;

/// Switch states set directly by a test.
#[derive(Debug)]
pub struct ArrayMatrix<const N: usize> {
    down: [bool; N],
    scanned: [bool; N],
}

impl<const N: usize> Default for ArrayMatrix<N> {
    fn default() -> Self {
        Self {
            down: [false; N],
            scanned: [false; N],
        }
    }
}

impl<const N: usize> ArrayMatrix<N> {
    pub fn down(&mut self, index: usize) {
        self.down[index] = true;
    }

    pub fn up(&mut self, index: usize) {
        self.down[index] = false;
    }
}

impl<const N: usize> Matrix for ArrayMatrix<N> {
    fn scan_if_changed(&mut self) -> bool {
        let changed = self.scanned != self.down;
        self.scanned = self.down;
        changed
    }

    fn get(&self, index: usize) -> bool {
        self.scanned[index]
    }
}

pub trait Observer {
    fn update(&self, pin: Pin);
}

#[derive(Debug)]
struct KeyMatrixInner {
    switches: Vec<bool>,
    inputs: Vec<Pin>,
    outputs: Vec<Pin>,
}

/// Wires switches between input and output [Pin]s: an input reads low while a down switch
/// connects it to an output driven low.
#[derive(Clone)]
pub struct KeyMatrix {
    inner: Rc<Mutex<KeyMatrixInner>>,
}
impl KeyMatrix {
    pub fn new(inputs: Vec<Pin>, outputs: Vec<Pin>) -> Self {
        let me = Self {
            inner: Rc::new(Mutex::new(KeyMatrixInner {
                switches: vec![false; inputs.len() * outputs.len()],
                inputs,
                outputs,
            })),
        };

        for o in me.inner().outputs.iter() {
            o.add_observer(Rc::new(me.clone()))
        }

        me
    }

    pub fn down(&self, ipin: usize, opin: usize) {
        self.set_switch(ipin, opin, true);
    }

    pub fn up(&self, ipin: usize, opin: usize) {
        self.set_switch(ipin, opin, false);
    }

    pub fn set_switch(&self, ipin: usize, opin: usize, is_down: bool) {
        let mut inner = self.inner();
        let idx = ipin * inner.outputs.len() + opin;
        if inner.switches[idx] != is_down {
            inner.switches[idx] = is_down;
            if is_down {
                if inner.outputs[opin].is_low().unwrap() {
                    inner.inputs[ipin].set_low().unwrap();
                }
            } else {
                inner.inputs[ipin].set_high().unwrap();
            }
        }
    }

    fn inner(&self) -> std::sync::MutexGuard<'_, KeyMatrixInner> {
        self.inner.lock().unwrap()
    }
}
impl Observer for KeyMatrix {
    fn update(&self, mut pin: Pin) {
        let inner = self.inner();
        let n = pin.num();
        let is_low = pin.is_low().unwrap();
        let opin = inner.outputs.iter().position(|p| p.num() == n).unwrap();

        for (ipin, p) in inner.inputs.iter().enumerate() {
            let idx = ipin * inner.outputs.len() + opin;
            if is_low && inner.switches[idx] {
                p.clone().set_low().unwrap();
            } else {
                p.clone().set_high().unwrap();
            }
        }
    }
}

#[derive(Debug)]
pub struct TestError;

#[derive(Clone)]
pub struct Pin(Rc<PinShared>);
impl core::fmt::Debug for Pin {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Pin")
            .field("n", &self.0.n)
            .field("state", &self.get_state())
            .finish()
    }
}
impl Pin {
    pub fn new(n: u8) -> Self {
        Self(Rc::new(PinShared {
            n,
            observer: Mutex::new(None),
            is_high: Mutex::new(None),
        }))
    }

    pub fn num(&self) -> u8 {
        self.0.n
    }

    pub fn get_state(&self) -> Option<bool> {
        *self.0.is_high.lock().unwrap()
    }

    fn add_observer(&self, observer: Rc<dyn Observer>) {
        *self.0.observer.lock().unwrap() = Some(observer);
    }

    fn set_state(&mut self, is_high: bool) {
        if self.get_state() != Some(is_high) {
            *self.0.is_high.lock().unwrap() = Some(is_high);
            let observer = self.0.observer.lock().unwrap().clone();
            if let Some(o) = observer {
                o.update(self.clone());
            }
        }
    }
}

struct PinShared {
    n: u8,
    observer: Mutex<Option<Rc<dyn Observer>>>,
    is_high: Mutex<Option<bool>>,
}

impl Error for TestError {
    fn kind(&self) -> embedded_hal::digital::ErrorKind {
        embedded_hal::digital::ErrorKind::Other
    }
}

impl ErrorType for Pin {
    type Error = TestError;
}

impl InputPin for Pin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(matches!(self.get_state(), Some(true)))
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(matches!(self.get_state(), Some(false)))
    }
}

impl OutputPin for Pin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.set_state(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.set_state(true);
        Ok(())
    }
}

/// Counts the settle delays requested by a scan.
#[derive(Debug, Default)]
pub struct CountingDelay {
    pub calls: usize,
}

impl DelayNs for CountingDelay {
    fn delay_ns(&mut self, _ns: u32) {
        self.calls += 1;
    }
}
