//! Simulated hardware.
//!
//! Desktop stand-ins for the robot's motors, sensors, and gamepads. Each
//! device is a cheap handle over shared state: clone one side into a
//! subsystem and keep the other to script inputs and observe outputs.

use crate::domain::ports::{AccelerometerInput, AnalogInput, GamepadInput, GyroInput, MotorOutput};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Default)]
pub struct SimMotor {
    speed: Arc<Mutex<f64>>,
}

impl SimMotor {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently commanded speed.
    pub fn speed(&self) -> f64 {
        *self.speed.lock().expect("sim motor lock poisoned")
    }
}

impl MotorOutput for SimMotor {
    fn set(&mut self, speed: f64) {
        *self.speed.lock().expect("sim motor lock poisoned") = speed;
    }
}

#[derive(Debug, Clone, Default)]
pub struct SimGyro {
    angle: Arc<Mutex<f64>>,
}

impl SimGyro {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_angle(&self, degrees: f64) {
        *self.angle.lock().expect("sim gyro lock poisoned") = degrees;
    }
}

impl GyroInput for SimGyro {
    fn angle(&mut self) -> f64 {
        *self.angle.lock().expect("sim gyro lock poisoned")
    }

    fn reset(&mut self) {
        self.set_angle(0.0);
    }
}

#[derive(Debug, Clone, Default)]
pub struct SimAccelerometer {
    axes: Arc<Mutex<[f64; 3]>>,
}

impl SimAccelerometer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_acceleration(&self, axis: u8, g: f64) {
        let mut axes = self.axes.lock().expect("sim accelerometer lock poisoned");
        if let Some(slot) = axes.get_mut(axis as usize) {
            *slot = g;
        }
    }
}

impl AccelerometerInput for SimAccelerometer {
    fn acceleration(&mut self, axis: u8) -> f64 {
        let axes = self.axes.lock().expect("sim accelerometer lock poisoned");
        axes.get(axis as usize).copied().unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SimAnalog {
    voltage: Arc<Mutex<f64>>,
}

impl SimAnalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_voltage(&self, volts: f64) {
        *self.voltage.lock().expect("sim analog lock poisoned") = volts;
    }
}

impl AnalogInput for SimAnalog {
    fn voltage(&mut self) -> f64 {
        *self.voltage.lock().expect("sim analog lock poisoned")
    }
}

#[derive(Debug, Default)]
struct GamepadState {
    axes: [f64; 8],
    buttons: [bool; 16],
    pov: i32,
}

#[derive(Debug, Clone)]
pub struct SimGamepad {
    state: Arc<Mutex<GamepadState>>,
}

impl Default for SimGamepad {
    fn default() -> Self {
        let state = GamepadState {
            pov: -1,
            ..Default::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }
}

impl SimGamepad {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_axis(&self, axis: usize, value: f64) {
        let mut state = self.state.lock().expect("sim gamepad lock poisoned");
        if let Some(slot) = state.axes.get_mut(axis) {
            *slot = value;
        }
    }

    pub fn set_button(&self, button: usize, pressed: bool) {
        let mut state = self.state.lock().expect("sim gamepad lock poisoned");
        if let Some(slot) = state.buttons.get_mut(button) {
            *slot = pressed;
        }
    }

    /// D-pad angle in degrees, -1 for released.
    pub fn set_pov(&self, angle: i32) {
        self.state.lock().expect("sim gamepad lock poisoned").pov = angle;
    }
}

impl GamepadInput for SimGamepad {
    fn axis(&mut self, axis: usize) -> f64 {
        let state = self.state.lock().expect("sim gamepad lock poisoned");
        state.axes.get(axis).copied().unwrap_or(0.0)
    }

    fn button(&mut self, button: usize) -> bool {
        let state = self.state.lock().expect("sim gamepad lock poisoned");
        state.buttons.get(button).copied().unwrap_or(false)
    }

    fn pov(&mut self) -> i32 {
        self.state.lock().expect("sim gamepad lock poisoned").pov
    }
}
