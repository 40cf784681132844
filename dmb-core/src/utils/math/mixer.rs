//! Differential drive mixing for a two-wheeled bot.
//!
//! Joystick-style intents arrive on a `[-100, 100]` scale. Each axis is scaled
//! onto `[-speed_cap, speed_cap]`, combined into per-wheel power and saturated
//! back into the same range.
//!
//! Scaling uses integer division truncating toward zero, so
//! `scale(-50, 3) == -1` and `scale(50, 3) == 1`.
//!
//! # Example
//! ```rust
//! use dmb_core::utils::math::mixer::{mix, DriveCommand};
//! let cmd = mix(100, 0, 150);
//! assert_eq!(cmd, DriveCommand { left: 150, right: 150 });
//! ```

/// Bound of the external input scale on both axes.
pub const INPUT_SCALE: i32 = 100;

/// Signed power for each wheel, bounded by the speed cap it was built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DriveCommand {
    pub left: i16,
    pub right: i16,
}

impl DriveCommand {
    /// Both wheels stopped.
    pub const STOP: Self = Self { left: 0, right: 0 };

    pub const fn new(
        left: i16,
        right: i16,
    ) -> Self {
        Self { left, right }
    }

    /// Both wheels forward at `power`.
    pub fn forward(power: u8) -> Self {
        let p = i16::from(power);
        Self::new(p, p)
    }

    /// Spin in place, left wheel forward and right wheel reversed at `power`.
    pub fn spin_right(power: u8) -> Self {
        let p = i16::from(power);
        Self::new(p, -p)
    }

    /// Spin in place, left wheel reversed and right wheel forward at `power`.
    pub fn spin_left(power: u8) -> Self {
        let p = i16::from(power);
        Self::new(-p, p)
    }
}

/// Map an input on `[-100, 100]` onto `[-speed_cap, speed_cap]`.
///
/// Out-of-range inputs are clamped first.
pub fn scale(
    input: i32,
    speed_cap: u8,
) -> i32 {
    input.clamp(-INPUT_SCALE, INPUT_SCALE) * i32::from(speed_cap) / INPUT_SCALE
}

/// Mix a `(forward, turn)` intent into per-wheel power.
///
/// `left = forward + turn`, `right = forward - turn`, each saturated to
/// `[-speed_cap, speed_cap]`.
pub fn mix(
    forward: i32,
    turn: i32,
    speed_cap: u8,
) -> DriveCommand {
    let cap = i32::from(speed_cap);
    let f = scale(forward, speed_cap);
    let t = scale(turn, speed_cap);

    // |cap| <= 255, so the casts cannot truncate.
    DriveCommand {
        left: (f + t).clamp(-cap, cap) as i16,
        right: (f - t).clamp(-cap, cap) as i16,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cardinal_directions() {
        assert_eq!(mix(100, 0, 100), DriveCommand::new(100, 100));
        assert_eq!(mix(-100, 0, 100), DriveCommand::new(-100, -100));
        assert_eq!(mix(0, 100, 100), DriveCommand::new(100, -100));
        assert_eq!(mix(0, -100, 100), DriveCommand::new(-100, 100));
    }

    #[test]
    fn test_centered_stick_is_stop() {
        for cap in 0..=u8::MAX {
            assert_eq!(mix(0, 0, cap), DriveCommand::STOP, "cap {}", cap);
        }
    }

    #[test]
    fn test_zero_cap_always_stops() {
        for forward in -100..=100 {
            for turn in [-100, -99, -1, 0, 1, 99, 100] {
                assert_eq!(mix(forward, turn, 0), DriveCommand::STOP);
            }
        }
    }

    #[test]
    fn test_output_within_cap() {
        for cap in 0..=u8::MAX {
            let c = i16::from(cap);
            for forward in (-100..=100).step_by(5) {
                for turn in (-100..=100).step_by(5) {
                    let cmd = mix(forward, turn, cap);
                    assert!(
                        (-c..=c).contains(&cmd.left) && (-c..=c).contains(&cmd.right),
                        "mix({}, {}, {}) = {:?}",
                        forward,
                        turn,
                        cap,
                        cmd
                    );
                }
            }
        }
    }

    #[test]
    fn test_scale_truncates_toward_zero() {
        assert_eq!(scale(50, 3), 1);
        assert_eq!(scale(-50, 3), -1);
        assert_eq!(scale(33, 150), 49);
        assert_eq!(scale(-33, 150), -49);
        assert_eq!(scale(1, 99), 0);
        assert_eq!(scale(-1, 99), 0);
    }

    #[test]
    fn test_out_of_range_input_is_clamped() {
        assert_eq!(mix(500, 0, 200), DriveCommand::forward(200));
        assert_eq!(mix(0, -1000, 200), DriveCommand::spin_left(200));
    }

    #[test]
    fn test_diagonal_saturates() {
        // forward + turn = 2 * cap before saturation
        assert_eq!(mix(100, 100, 150), DriveCommand::new(150, 0));
        assert_eq!(mix(-100, 100, 150), DriveCommand::new(0, -150));
        assert_eq!(mix(50, 50, 100), DriveCommand::new(100, 0));
    }
}
