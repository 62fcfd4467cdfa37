use serde::{Deserialize, Serialize};

/// Game state as provided by the playing field (FMS).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RobotState {
    #[default]
    Disabled,
    Autonomous,
    Teleop,
}

/// Movement directions, from the perspective of the center of the robot
/// facing towards the front.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    Forward,
    Backward,
    Up,
    Down,
    Stop,
    In,
    Out,
    Clockwise,
    CounterClockwise,
}

/// Which side of the wall a vision target is on.
///
/// The driver station encodes this as a small integer on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum Side {
    Left,
    Right,
    #[default]
    Unknown,
    Either,
}

impl From<u8> for Side {
    fn from(value: u8) -> Self {
        match value {
            0 => Side::Left,
            1 => Side::Right,
            3 => Side::Either,
            _ => Side::Unknown,
        }
    }
}

impl From<Side> for u8 {
    fn from(side: Side) -> Self {
        match side {
            Side::Left => 0,
            Side::Right => 1,
            Side::Unknown => 2,
            Side::Either => 3,
        }
    }
}

/// A vision target reported by the driver station image processor.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Target {
    #[serde(default)]
    pub side: Side,
    #[serde(default)]
    pub distance: f64,
    #[serde(default)]
    pub angle: f64,
    #[serde(default)]
    pub is_hot: bool,
    #[serde(default)]
    pub confidence: f64,
    /// Set by the driver station when a frame contained no targets at all.
    #[serde(default)]
    pub no_targets: bool,
}
