pub mod autoscript;
pub mod drivetrain;
pub mod feeder;
pub mod feeder_arm;
pub mod lift;
pub mod rangefinder;
pub mod robot;
pub mod stopwatch;
pub mod targeting;
pub mod userinterface;

pub use crate::domain::model::{Direction, RobotState, Side, Target};
pub use crate::domain::ports::{
    AccelerometerInput, AnalogInput, GamepadInput, GyroInput, MotorOutput,
};
pub use crate::utils::error::Result;
