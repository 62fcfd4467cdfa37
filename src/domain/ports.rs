//! Hardware seams.
//!
//! On a real robot these are backed by motor controllers and sensors on the
//! roboRIO; on a desktop they are backed by the simulated implementations in
//! `crate::sim`.

/// A speed controller for a single motor, commanded in the range [-1.0, 1.0].
pub trait MotorOutput: Send {
    fn set(&mut self, speed: f64);
}

/// A rate gyro that integrates to a heading in degrees.
pub trait GyroInput: Send {
    fn angle(&mut self) -> f64;
    fn reset(&mut self);
}

/// A multi-axis accelerometer, read one axis at a time in g.
pub trait AccelerometerInput: Send {
    fn acceleration(&mut self, axis: u8) -> f64;
}

/// An analog voltage channel (e.g. an ultrasonic range finder).
pub trait AnalogInput: Send {
    fn voltage(&mut self) -> f64;
}

/// A gamepad attached to the driver station.
pub trait GamepadInput: Send {
    /// Raw axis position in [-1.0, 1.0].
    fn axis(&mut self, axis: usize) -> f64;
    /// True while the button is held.
    fn button(&mut self, button: usize) -> bool;
    /// D-pad angle in degrees, or -1 when not pressed.
    fn pov(&mut self) -> i32;
}
