//! H-bridge motor output for the dual-mode bot.
//!
//! Each wheel is driven by two direction inputs (IN1/IN2) and one enable
//! channel carrying the PWM duty cycle:
//!
//! | power | IN1  | IN2  | duty     |
//! |-------|------|------|----------|
//! | >= 0  | high | low  | `power`  |
//! | < 0   | low  | high | `-power` |
//!
//! Duty is expressed on an 8-bit scale and rescaled onto the channel's own
//! `max_duty_cycle`.

use embedded_hal::{digital::OutputPin, pwm::SetDutyCycle};

use crate::utils::math::mixer::DriveCommand;

/// Full-scale duty on the 8-bit power scale.
pub const MAX_DUTY: u8 = u8::MAX;

/// Anything that can turn a `DriveCommand` into wheel motion.
pub trait DriveOutput {
    type Error: core::fmt::Debug;

    fn apply(
        &mut self,
        cmd: DriveCommand,
    ) -> Result<(), Self::Error>;
}

/// Errors raised while driving an H-bridge channel.
#[derive(Debug)]
pub enum DriveError<P, D> {
    /// Setting a direction pin failed.
    Direction(P),
    /// Setting the enable duty cycle failed.
    Duty(D),
}

/// One H-bridge channel: two direction pins and a duty-cycle output.
pub struct Wheel<IN1, IN2, EN> {
    in1: IN1,
    in2: IN2,
    enable: EN,
}

impl<IN1, IN2, EN> Wheel<IN1, IN2, EN>
where
    IN1: OutputPin,
    IN2: OutputPin<Error = IN1::Error>,
    EN: SetDutyCycle,
{
    pub fn new(
        in1: IN1,
        in2: IN2,
        enable: EN,
    ) -> Self {
        Self { in1, in2, enable }
    }

    /// Drive the wheel at signed `power`; sign selects direction, magnitude
    /// (saturated at `MAX_DUTY`) selects duty.
    pub fn set_power(
        &mut self,
        power: i16,
    ) -> Result<(), DriveError<IN1::Error, EN::Error>> {
        if power >= 0 {
            self.in1.set_high().map_err(DriveError::Direction)?;
            self.in2.set_low().map_err(DriveError::Direction)?;
        } else {
            self.in1.set_low().map_err(DriveError::Direction)?;
            self.in2.set_high().map_err(DriveError::Direction)?;
        }

        let duty = power.unsigned_abs().min(u16::from(MAX_DUTY));
        self.enable
            .set_duty_cycle_fraction(duty, u16::from(MAX_DUTY))
            .map_err(DriveError::Duty)
    }

    /// Give back the pins and enable channel.
    pub fn release(self) -> (IN1, IN2, EN) {
        (self.in1, self.in2, self.enable)
    }
}

/// Left and right wheels of a differential drive.
pub struct DriveTrain<IN1, IN2, EN> {
    left: Wheel<IN1, IN2, EN>,
    right: Wheel<IN1, IN2, EN>,
}

impl<IN1, IN2, EN> DriveTrain<IN1, IN2, EN>
where
    IN1: OutputPin,
    IN2: OutputPin<Error = IN1::Error>,
    EN: SetDutyCycle,
{
    pub fn new(
        left: Wheel<IN1, IN2, EN>,
        right: Wheel<IN1, IN2, EN>,
    ) -> Self {
        Self { left, right }
    }

    pub fn release(self) -> (Wheel<IN1, IN2, EN>, Wheel<IN1, IN2, EN>) {
        (self.left, self.right)
    }
}

impl<IN1, IN2, EN> DriveOutput for DriveTrain<IN1, IN2, EN>
where
    IN1: OutputPin,
    IN2: OutputPin<Error = IN1::Error>,
    EN: SetDutyCycle,
{
    type Error = DriveError<IN1::Error, EN::Error>;

    fn apply(
        &mut self,
        cmd: DriveCommand,
    ) -> Result<(), Self::Error> {
        self.left.set_power(cmd.left)?;
        self.right.set_power(cmd.right)
    }
}
