//! Line sensors and the physical mode toggle.
//!
//! `embedded-hal` 1.0 has no ADC trait, so analog line sensors sit behind the
//! small `LineSensor` trait; platforms wrap their one-shot ADC reads in it.

use embedded_hal::digital::InputPin;

/// A single analog line sensor producing raw ADC counts.
pub trait LineSensor {
    type Error: core::fmt::Debug;

    /// Take one raw reading. Higher values mean "more line".
    fn read_raw(&mut self) -> Result<u16, Self::Error>;
}

/// Raw readings from both sensors, taken in the same tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineReading {
    pub left: u16,
    pub right: u16,
}

/// The left/right sensor pair mounted under the chassis.
pub struct LineSensors<S> {
    left: S,
    right: S,
}

impl<S: LineSensor> LineSensors<S> {
    pub fn new(
        left: S,
        right: S,
    ) -> Self {
        Self { left, right }
    }

    /// Read left then right.
    pub fn read(&mut self) -> Result<LineReading, S::Error> {
        let left = self.left.read_raw()?;
        let right = self.right.read_raw()?;
        Ok(LineReading { left, right })
    }
}

/// Active-low mode toggle wired against a pull-up (pressed = low).
pub struct ModeSwitch<P> {
    pin: P,
}

impl<P: InputPin> ModeSwitch<P> {
    pub fn new(pin: P) -> Self {
        Self { pin }
    }

    pub fn is_asserted(&mut self) -> Result<bool, P::Error> {
        self.pin.is_low()
    }

    pub fn release(self) -> P {
        self.pin
    }
}
