//! Mode arbitration for the dual-mode bot.
//!
//! `ModeArbiter` owns the `ControllerState` (operating mode and speed cap) and
//! turns either line-sensor readings or manual joystick intents into a
//! `DriveCommand`. It also debounces the physical mode toggle.

use embassy_time::{Duration, Instant};

use crate::utils::math::mixer::{self, DriveCommand};

/// Speed cap applied at startup.
pub const DEFAULT_SPEED_CAP: u8 = 150;

/// Operating mode of the bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Steer from the two analog line sensors.
    #[default]
    LineFollowing,
    /// Steer from remote velocity commands.
    Manual,
}

impl Mode {
    pub fn from_manual(manual: bool) -> Self {
        if manual {
            Mode::Manual
        } else {
            Mode::LineFollowing
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Mode::LineFollowing => Mode::Manual,
            Mode::Manual => Mode::LineFollowing,
        }
    }
}

/// Mutable controller state, owned by a single `ModeArbiter`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerState {
    pub mode: Mode,
    pub speed_cap: u8,
}

impl Default for ControllerState {
    fn default() -> Self {
        Self {
            mode: Mode::LineFollowing,
            speed_cap: DEFAULT_SPEED_CAP,
        }
    }
}

/// Holds the current mode and speed cap and dispatches inputs to the mixer.
#[derive(Debug)]
pub struct ModeArbiter {
    state: ControllerState,
    debounce: Duration,
    last_flip: Option<Instant>,
    switch_active: bool,
}

impl ModeArbiter {
    /// Create an arbiter starting from `state`, ignoring toggle edges that
    /// arrive less than `debounce` after a flip.
    pub fn new(
        state: ControllerState,
        debounce: Duration,
    ) -> Self {
        Self {
            state,
            debounce,
            last_flip: None,
            switch_active: false,
        }
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn mode(&self) -> Mode {
        self.state.mode
    }

    pub fn speed_cap(&self) -> u8 {
        self.state.speed_cap
    }

    /// Set the operating mode. Returns `true` if the mode changed.
    pub fn set_mode(
        &mut self,
        mode: Mode,
    ) -> bool {
        let changed = self.state.mode != mode;
        self.state.mode = mode;
        changed
    }

    /// Store a new speed cap, clamped to `[0, 255]`.
    pub fn set_speed_cap(
        &mut self,
        value: i32,
    ) {
        self.state.speed_cap = value.clamp(0, i32::from(u8::MAX)) as u8;
    }

    /// Mix a joystick intent (`x` = turn, `y` = forward) at the current cap.
    ///
    /// Returns `None` while line following; the intent is dropped, not stored.
    pub fn apply_manual_intent(
        &self,
        x: i32,
        y: i32,
    ) -> Option<DriveCommand> {
        match self.state.mode {
            Mode::Manual => Some(mixer::mix(y, x, self.state.speed_cap)),
            Mode::LineFollowing => None,
        }
    }

    /// Run one line-following decision. Returns `None` in manual mode.
    ///
    /// | left > thr | right > thr | result            |
    /// |------------|-------------|-------------------|
    /// | yes        | yes         | forward at cap    |
    /// | yes        | no          | spin left         |
    /// | no         | yes         | spin right        |
    /// | no         | no          | stop              |
    pub fn tick(
        &self,
        left_sensor: u16,
        right_sensor: u16,
        line_threshold: u16,
    ) -> Option<DriveCommand> {
        if self.state.mode != Mode::LineFollowing {
            return None;
        }

        let cap = self.state.speed_cap;
        let cmd = match (left_sensor > line_threshold, right_sensor > line_threshold) {
            (true, true) => DriveCommand::forward(cap),
            (true, false) => DriveCommand::spin_left(cap),
            (false, true) => DriveCommand::spin_right(cap),
            (false, false) => DriveCommand::STOP,
        };
        Some(cmd)
    }

    /// Feed one sample of the physical mode toggle.
    ///
    /// The mode flips on an inactive-to-active edge, unless the previous flip
    /// happened less than the debounce window ago. Holding the toggle flips once.
    /// Returns `true` if the mode flipped.
    pub fn poll_switch(
        &mut self,
        asserted: bool,
        now: Instant,
    ) -> bool {
        let rising = asserted && !self.switch_active;
        self.switch_active = asserted;
        if !rising {
            return false;
        }

        if let Some(last) = self.last_flip {
            if now < last + self.debounce {
                tracing::trace!("mode toggle ignored inside debounce window");
                return false;
            }
        }

        self.state.mode = self.state.mode.toggled();
        self.last_flip = Some(now);
        tracing::info!(mode = ?self.state.mode, "mode toggled by switch");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const THRESHOLD: u16 = 2000;

    fn arbiter() -> ModeArbiter {
        ModeArbiter::new(ControllerState::default(), Duration::from_millis(200))
    }

    #[test]
    fn test_initial_state() {
        let arb = arbiter();
        assert_eq!(arb.mode(), Mode::LineFollowing);
        assert_eq!(arb.speed_cap(), 150);
    }

    #[test]
    fn test_speed_cap_is_clamped() {
        let mut arb = arbiter();
        arb.set_speed_cap(300);
        assert_eq!(arb.speed_cap(), 255);
        arb.set_speed_cap(-5);
        assert_eq!(arb.speed_cap(), 0);
        arb.set_speed_cap(42);
        assert_eq!(arb.speed_cap(), 42);
    }

    #[test]
    fn test_line_follow_decision_table() {
        let arb = arbiter();
        let cap = i16::from(arb.speed_cap());
        assert_eq!(
            arb.tick(2500, 2500, THRESHOLD),
            Some(DriveCommand::new(cap, cap))
        );
        assert_eq!(
            arb.tick(2500, 1000, THRESHOLD),
            Some(DriveCommand::new(-cap, cap))
        );
        assert_eq!(
            arb.tick(1000, 2500, THRESHOLD),
            Some(DriveCommand::new(cap, -cap))
        );
        assert_eq!(arb.tick(1000, 1000, THRESHOLD), Some(DriveCommand::STOP));
    }

    #[test]
    fn test_threshold_is_strict() {
        let arb = arbiter();
        assert_eq!(arb.tick(THRESHOLD, THRESHOLD, THRESHOLD), Some(DriveCommand::STOP));
    }

    #[test]
    fn test_tick_is_idle_in_manual() {
        let mut arb = arbiter();
        arb.set_mode(Mode::Manual);
        assert_eq!(arb.tick(2500, 2500, THRESHOLD), None);
    }

    #[test]
    fn test_manual_intent_dropped_while_line_following() {
        let arb = arbiter();
        assert_eq!(arb.apply_manual_intent(0, 100), None);
    }

    #[test]
    fn test_manual_intent_maps_y_forward_x_turn() {
        let mut arb = arbiter();
        arb.set_mode(Mode::Manual);
        arb.set_speed_cap(100);
        assert_eq!(arb.apply_manual_intent(0, 100), Some(DriveCommand::new(100, 100)));
        assert_eq!(arb.apply_manual_intent(100, 0), Some(DriveCommand::new(100, -100)));
    }

    #[test]
    fn test_set_mode_is_idempotent() {
        let mut once = arbiter();
        assert!(once.set_mode(Mode::Manual));

        let mut twice = arbiter();
        assert!(twice.set_mode(Mode::Manual));
        assert!(!twice.set_mode(Mode::Manual));

        assert_eq!(once.state(), twice.state());
        assert_eq!(
            once.apply_manual_intent(30, 60),
            twice.apply_manual_intent(30, 60)
        );
    }

    #[test]
    fn test_toggle_within_debounce_flips_once() {
        let mut arb = arbiter();
        assert!(arb.poll_switch(true, Instant::from_millis(1_000)));
        assert!(!arb.poll_switch(false, Instant::from_millis(1_050)));
        assert!(!arb.poll_switch(true, Instant::from_millis(1_100)));
        assert_eq!(arb.mode(), Mode::Manual);
    }

    #[test]
    fn test_toggle_after_debounce_flips_again() {
        let mut arb = arbiter();
        assert!(arb.poll_switch(true, Instant::from_millis(1_000)));
        arb.poll_switch(false, Instant::from_millis(1_100));
        assert!(arb.poll_switch(true, Instant::from_millis(1_200)));
        assert_eq!(arb.mode(), Mode::LineFollowing);
    }

    #[test]
    fn test_held_toggle_flips_once() {
        let mut arb = arbiter();
        let flips = (0..100)
            .filter(|i| arb.poll_switch(true, Instant::from_millis(1_000 + i * 10)))
            .count();
        assert_eq!(flips, 1);
        assert_eq!(arb.mode(), Mode::Manual);
    }
}
