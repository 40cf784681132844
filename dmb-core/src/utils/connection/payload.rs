//! JSON payloads accepted by the command surface.
//!
//! HTTP routes take one payload each; WebSocket frames carry the same payloads
//! tagged with `"ct"` (command type). Decoding is strict: a payload that does
//! not match its schema is dropped and never reaches the controller.

use embedded_io_async::Read;
use picoserve::{
    extract::FromRequest,
    request::{RequestBody, RequestParts},
};
use serde::{de::DeserializeOwned, Deserialize};

use crate::utils::controllers::ControlCommand;

/// Joystick vector from the control page. The page sends fractional values;
/// they are truncated toward zero.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct VelocityPayload {
    pub x: f32,
    pub y: f32,
}

/// `mode` is the line-following flag: `true` selects line following.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ModePayload {
    pub mode: bool,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SpeedPayload {
    pub speed: i32,
}

/// Tagged form used on the WebSocket stream.
#[derive(Debug, Deserialize)]
#[serde(tag = "ct", rename_all = "snake_case")] // ct = command type
pub enum WireCommand {
    Control(VelocityPayload),
    Mode(ModePayload),
    Speed(SpeedPayload),
}

impl From<VelocityPayload> for ControlCommand {
    fn from(p: VelocityPayload) -> Self {
        ControlCommand::SetVelocity {
            x: p.x as i32,
            y: p.y as i32,
        }
    }
}

impl From<ModePayload> for ControlCommand {
    fn from(p: ModePayload) -> Self {
        ControlCommand::SetMode { manual: !p.mode }
    }
}

impl From<SpeedPayload> for ControlCommand {
    fn from(p: SpeedPayload) -> Self {
        ControlCommand::SetSpeed { value: p.speed }
    }
}

impl From<WireCommand> for ControlCommand {
    fn from(w: WireCommand) -> Self {
        match w {
            WireCommand::Control(p) => p.into(),
            WireCommand::Mode(p) => p.into(),
            WireCommand::Speed(p) => p.into(),
        }
    }
}

/// Decode a JSON body, logging and discarding anything malformed.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Option<T> {
    match serde_json::from_slice::<T>(bytes) {
        Ok(value) => Some(value),
        Err(error) => {
            tracing::warn!(?error, "discarding malformed payload");
            None
        }
    }
}

/// Request body extractor yielding `None` for malformed JSON.
pub struct Payload<T>(pub Option<T>);

impl<'r, S, T> FromRequest<'r, S> for Payload<T>
where
    T: DeserializeOwned,
{
    type Rejection = &'static str;

    async fn from_request<R: Read>(
        _state: &'r S,
        _parts: RequestParts<'r>,
        body: RequestBody<'r, R>,
    ) -> Result<Self, Self::Rejection> {
        let bytes = body
            .read_all()
            .await
            .map_err(|_| "Failed to read request body")?;
        Ok(Payload(decode(bytes)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_velocity_truncates_toward_zero() {
        let p: VelocityPayload = decode(br#"{"x": 42.9, "y": -17.6}"#).unwrap();
        assert_eq!(
            ControlCommand::from(p),
            ControlCommand::SetVelocity { x: 42, y: -17 }
        );
    }

    #[test]
    fn test_velocity_accepts_integers() {
        let p: VelocityPayload = decode(br#"{"x": 0, "y": 100}"#).unwrap();
        assert_eq!(
            ControlCommand::from(p),
            ControlCommand::SetVelocity { x: 0, y: 100 }
        );
    }

    #[test]
    fn test_velocity_missing_field_rejected() {
        assert!(decode::<VelocityPayload>(br#"{"x": 10}"#).is_none());
        assert!(decode::<VelocityPayload>(br#"{"x": "left", "y": 0}"#).is_none());
        assert!(decode::<VelocityPayload>(b"not json").is_none());
    }

    #[test]
    fn test_mode_flag_means_line_following() {
        let p: ModePayload = decode(br#"{"mode": true}"#).unwrap();
        assert_eq!(ControlCommand::from(p), ControlCommand::SetMode { manual: false });
        let p: ModePayload = decode(br#"{"mode": false}"#).unwrap();
        assert_eq!(ControlCommand::from(p), ControlCommand::SetMode { manual: true });
    }

    #[test]
    fn test_mode_rejects_non_boolean() {
        assert!(decode::<ModePayload>(br#"{"mode": 1}"#).is_none());
        assert!(decode::<ModePayload>(br#"{"mode": "manual"}"#).is_none());
        assert!(decode::<ModePayload>(br#"{}"#).is_none());
    }

    #[test]
    fn test_speed_passes_raw_value() {
        let p: SpeedPayload = decode(br#"{"speed": 300}"#).unwrap();
        assert_eq!(ControlCommand::from(p), ControlCommand::SetSpeed { value: 300 });
    }

    #[test]
    fn test_wire_command_tags() {
        let w: WireCommand = decode(br#"{"ct": "control", "x": -100, "y": 5.5}"#).unwrap();
        assert_eq!(
            ControlCommand::from(w),
            ControlCommand::SetVelocity { x: -100, y: 5 }
        );
        let w: WireCommand = decode(br#"{"ct": "speed", "speed": 90}"#).unwrap();
        assert_eq!(ControlCommand::from(w), ControlCommand::SetSpeed { value: 90 });
        assert!(decode::<WireCommand>(br#"{"ct": "reboot"}"#).is_none());
    }
}
