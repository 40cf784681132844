//! Module Exports
//!
//! This file exports the modules that make up the control system and hosts the
//! `SystemController` task that ties them together.
//!
//! - `arbiter`: operating mode, speed cap and the line-follow decision table.
//! - `drive`: H-bridge wheel output.
//! - `sensors`: analog line sensors and the physical mode toggle.

pub mod arbiter;
pub mod drive;
pub mod sensors;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::{Duration, Instant};
use embedded_hal::digital::InputPin;

pub use arbiter::{ControllerState, Mode, ModeArbiter};
pub use drive::{DriveError, DriveOutput, DriveTrain, Wheel};
pub use sensors::{LineReading, LineSensor, LineSensors, ModeSwitch};

use crate::utils::math::mixer::DriveCommand;

/// Channel used to hand commands from the network tasks to the control task.
pub static CONTROL_CHANNEL: embassy_sync::channel::Channel<
    CriticalSectionRawMutex,
    ControlCommand,
    16,
> = embassy_sync::channel::Channel::new();

/// Analog reading above which a sensor counts as over the line.
pub const LINE_THRESHOLD: u16 = 2000;
/// Control loop period.
pub const TICK_PERIOD: Duration = Duration::from_millis(10);
/// Minimum time between two flips of the physical mode toggle.
pub const DEBOUNCE: Duration = Duration::from_millis(200);

/// Commands accepted by the control task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    /// Joystick vector, both axes on `[-100, 100]` (`x` = turn, `y` = forward).
    SetVelocity { x: i32, y: i32 },
    SetMode { manual: bool },
    /// New speed cap, clamped to `[0, 255]` on arrival.
    SetSpeed { value: i32 },
}

/// Tunables for the control loop.
#[derive(Debug, Clone, Copy)]
pub struct ControllerConfig {
    pub line_threshold: u16,
    pub initial_speed_cap: u8,
    pub tick_period: Duration,
    pub debounce: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            line_threshold: LINE_THRESHOLD,
            initial_speed_cap: arbiter::DEFAULT_SPEED_CAP,
            tick_period: TICK_PERIOD,
            debounce: DEBOUNCE,
        }
    }
}

/// Owns the arbiter and all motion hardware; the only writer of
/// `ControllerState`.
pub struct SystemController<D, S, P> {
    arbiter: ModeArbiter,
    drive: D,
    sensors: LineSensors<S>,
    switch: ModeSwitch<P>,
    config: ControllerConfig,
    next_tick: Option<Instant>,
}

impl<D, S, P> SystemController<D, S, P>
where
    D: DriveOutput,
    S: LineSensor,
    P: InputPin,
{
    pub fn new(
        drive: D,
        sensors: LineSensors<S>,
        switch: ModeSwitch<P>,
        config: ControllerConfig,
    ) -> Self {
        let state = ControllerState {
            mode: Mode::LineFollowing,
            speed_cap: config.initial_speed_cap,
        };

        SystemController {
            arbiter: ModeArbiter::new(state, config.debounce),
            drive,
            sensors,
            switch,
            config,
            next_tick: None,
        }
    }

    pub fn state(&self) -> ControllerState {
        self.arbiter.state()
    }

    /// Apply a command immediately.
    pub fn handle_command(
        &mut self,
        command: ControlCommand,
    ) {
        tracing::debug!(?command, "control command");
        match command {
            ControlCommand::SetVelocity { x, y } => match self.arbiter.apply_manual_intent(x, y) {
                Some(cmd) => self.drive(cmd),
                None => tracing::debug!("velocity ignored while line following"),
            },
            ControlCommand::SetMode { manual } => {
                if self.arbiter.set_mode(Mode::from_manual(manual)) {
                    tracing::info!(mode = ?self.arbiter.mode(), "mode set");
                    self.on_mode_change();
                }
            }
            ControlCommand::SetSpeed { value } => {
                self.arbiter.set_speed_cap(value);
                tracing::info!(speed_cap = self.arbiter.speed_cap(), "speed cap set");
            }
        }
    }

    /// Run one control tick: poll the toggle, then follow the line if in
    /// line-following mode.
    pub fn step(
        &mut self,
        now: Instant,
    ) {
        // A failed read keeps the previous edge state.
        match self.switch.is_asserted() {
            Ok(asserted) => {
                if self.arbiter.poll_switch(asserted, now) {
                    self.on_mode_change();
                }
            }
            Err(error) => tracing::warn!(?error, "mode switch read failed"),
        }

        if self.arbiter.mode() != Mode::LineFollowing {
            return;
        }

        let reading = match self.sensors.read() {
            Ok(reading) => reading,
            Err(error) => {
                tracing::warn!(?error, "line sensor read failed");
                return;
            }
        };

        if let Some(cmd) = self
            .arbiter
            .tick(reading.left, reading.right, self.config.line_threshold)
        {
            self.drive(cmd);
        }
    }

    /// Run `step` if the tick deadline has passed. Returns `true` if it ran.
    pub fn tick_if_due(
        &mut self,
        now: Instant,
    ) -> bool {
        if self.next_tick.is_some_and(|deadline| now < deadline) {
            return false;
        }
        self.step(now);
        self.next_tick = Some(now + self.config.tick_period);
        true
    }

    /// Control task body: handle commands as they arrive and tick on schedule.
    ///
    /// An overdue tick always runs before the next queued command.
    pub async fn run(&mut self) -> ! {
        let receiver = CONTROL_CHANNEL.receiver();
        loop {
            let now = Instant::now();
            if self.tick_if_due(now) {
                continue;
            }

            let deadline = self.next_tick.unwrap_or(now);
            if let Ok(command) = embassy_time::with_deadline(deadline, receiver.receive()).await {
                self.handle_command(command);
            }
        }
    }

    /// Entering manual always starts from a standstill.
    fn on_mode_change(&mut self) {
        if self.arbiter.mode() == Mode::Manual {
            self.drive(DriveCommand::STOP);
        }
    }

    fn drive(
        &mut self,
        cmd: DriveCommand,
    ) {
        tracing::trace!(left = cmd.left, right = cmd.right, "drive");
        if let Err(error) = self.drive.apply(cmd) {
            tracing::error!(?error, "drive command failed");
        }
    }

    /// Give back the drive output, sensors and switch.
    pub fn release(self) -> (D, LineSensors<S>, ModeSwitch<P>) {
        (self.drive, self.sensors, self.switch)
    }
}
