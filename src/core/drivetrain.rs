use crate::config::params::DrivetrainConfig;
use crate::core::stopwatch::Stopwatch;
use crate::domain::model::{Direction, RobotState};
use crate::domain::ports::{AccelerometerInput, GyroInput, MotorOutput};
use crate::utils::datalog::DataLog;
use crate::utils::error::Result;

/// The physical devices backing a drivetrain. Any of them may be absent;
/// operations that need a missing device report completion immediately.
pub struct DriveHardware {
    pub left_motor: Option<Box<dyn MotorOutput>>,
    pub right_motor: Option<Box<dyn MotorOutput>>,
    pub gyro: Option<Box<dyn GyroInput>>,
    pub accelerometer: Option<Box<dyn AccelerometerInput>>,
}

impl DriveHardware {
    /// A drivetrain with nothing attached.
    pub fn disconnected() -> Self {
        Self {
            left_motor: None,
            right_motor: None,
            gyro: None,
            accelerometer: None,
        }
    }
}

/// Drives the robot, manually or autonomously, using the gyro for heading
/// and the accelerometer for integrated distance.
pub struct DriveTrain {
    config: DrivetrainConfig,
    left_motor: Option<Box<dyn MotorOutput>>,
    right_motor: Option<Box<dyn MotorOutput>>,
    gyro: Option<Box<dyn GyroInput>>,
    accelerometer: Option<Box<dyn AccelerometerInput>>,
    log: Option<DataLog>,

    robot_state: RobotState,
    heading: f64,
    acceleration: f64,
    distance_traveled: f64,
    initial_heading: f64,
    adjustment_in_progress: bool,
    previous_linear_speed: f64,
    previous_turn_speed: f64,
    movement_timer: Stopwatch,
    acceleration_timer: Stopwatch,
}

impl DriveTrain {
    pub fn new(config: DrivetrainConfig, hardware: DriveHardware, log: Option<DataLog>) -> Self {
        let mut drivetrain = Self {
            config,
            left_motor: hardware.left_motor,
            right_motor: hardware.right_motor,
            gyro: hardware.gyro,
            accelerometer: hardware.accelerometer,
            log,
            robot_state: RobotState::Disabled,
            heading: 0.0,
            acceleration: 0.0,
            distance_traveled: 0.0,
            initial_heading: 0.0,
            adjustment_in_progress: false,
            previous_linear_speed: 0.0,
            previous_turn_speed: 0.0,
            movement_timer: Stopwatch::new(),
            acceleration_timer: Stopwatch::new(),
        };

        if drivetrain.accelerometer_enabled() {
            drivetrain.acceleration_timer.start();
        }
        let gyro = drivetrain.gyro_enabled();
        let accel = drivetrain.accelerometer_enabled();
        if let Some(log) = drivetrain.log.as_mut() {
            let _ = log.write_line(if gyro { "Gyro enabled" } else { "Gyro disabled" });
            let _ = log.write_line(if accel {
                "Accelerometer enabled"
            } else {
                "Accelerometer disabled"
            });
        }
        drivetrain
    }

    pub fn enabled(&self) -> bool {
        self.left_motor.is_some() && self.right_motor.is_some()
    }

    pub fn gyro_enabled(&self) -> bool {
        self.gyro.is_some()
    }

    pub fn accelerometer_enabled(&self) -> bool {
        self.accelerometer.is_some()
    }

    /// Stores the game mode and re-arms the movement and acceleration timers.
    pub fn set_robot_state(&mut self, state: RobotState) {
        self.robot_state = state;
        self.movement_timer.stop();
        if self.accelerometer_enabled() {
            self.acceleration_timer.start();
            self.distance_traveled = 0.0;
        }
    }

    /// Reads the gyro heading and integrates accelerometer distance.
    pub fn read_sensors(&mut self) {
        if let Some(gyro) = self.gyro.as_mut() {
            self.heading = gyro.angle();
        }
        if let Some(accelerometer) = self.accelerometer.as_mut() {
            self.acceleration = accelerometer.acceleration(self.config.accelerometer_axis);
            let loop_time = self.acceleration_timer.elapsed_secs().unwrap_or(0.0);
            self.acceleration_timer.start();
            self.distance_traveled += self.acceleration * loop_time * loop_time;
        }
    }

    pub fn reset_sensors(&mut self) {
        if let Some(gyro) = self.gyro.as_mut() {
            gyro.reset();
        }
        if self.accelerometer_enabled() {
            self.acceleration_timer.start();
            self.distance_traveled = 0.0;
        }
    }

    /// Re-arms the timer used by time-based movements.
    pub fn reset_and_start_timer(&mut self) {
        self.movement_timer.stop();
        self.movement_timer.start();
    }

    pub fn heading(&self) -> f64 {
        self.heading
    }

    pub fn distance_traveled(&self) -> f64 {
        self.distance_traveled
    }

    pub fn log_current_state(&mut self) -> Result<()> {
        let (gyro, accel) = (self.gyro_enabled(), self.accelerometer_enabled());
        if let Some(log) = self.log.as_mut() {
            if gyro {
                log.write_value("Gyro angle", self.heading)?;
            }
            if accel {
                log.write_value("Acceleration", self.acceleration)?;
                log.write_value("Distance traveled", self.distance_traveled)?;
            }
        }
        Ok(())
    }

    /// Mixes linear/turn speeds onto the left and right motors, respecting
    /// the configured motor inversion.
    fn arcade_output(&mut self, linear: f64, turn: f64) {
        let left_sign = if self.config.left_motor_inverted { -1.0 } else { 1.0 };
        let right_sign = if self.config.right_motor_inverted { -1.0 } else { 1.0 };
        if let Some(motor) = self.left_motor.as_mut() {
            motor.set((linear + turn).clamp(-1.0, 1.0) * left_sign);
        }
        if let Some(motor) = self.right_motor.as_mut() {
            motor.set((linear - turn).clamp(-1.0, 1.0) * right_sign);
        }
    }

    fn tank_output(&mut self, left: f64, right: f64) {
        let left_sign = if self.config.left_motor_inverted { -1.0 } else { 1.0 };
        let right_sign = if self.config.right_motor_inverted { -1.0 } else { 1.0 };
        if let Some(motor) = self.left_motor.as_mut() {
            motor.set(left.clamp(-1.0, 1.0) * left_sign);
        }
        if let Some(motor) = self.right_motor.as_mut() {
            motor.set(right.clamp(-1.0, 1.0) * right_sign);
        }
    }

    pub fn stop(&mut self) {
        self.arcade_output(0.0, 0.0);
        self.previous_linear_speed = 0.0;
        self.previous_turn_speed = 0.0;
    }

    /// Teleop driving with slew-rate limiting to prevent tipping.
    ///
    /// The requested speeds are scaled by the normal or alternate ratios,
    /// then limited to the maximum change per control cycle when a limit is
    /// configured.
    pub fn drive(&mut self, directional_speed: f64, directional_turn: f64, alternate: bool) {
        if !self.enabled() || self.robot_state == RobotState::Disabled {
            return;
        }

        let (mut linear, mut turn) = if alternate {
            (
                self.config.alternate_linear_speed_ratio * directional_speed,
                self.config.alternate_turning_speed_ratio * directional_turn,
            )
        } else {
            (
                self.config.normal_linear_speed_ratio * directional_speed,
                self.config.normal_turning_speed_ratio * directional_turn,
            )
        };

        let max_linear = self.config.maximum_linear_speed_change;
        if max_linear > 0.0 && (linear - self.previous_linear_speed).abs() > max_linear {
            linear = if linear < self.previous_linear_speed {
                self.previous_linear_speed - max_linear
            } else {
                self.previous_linear_speed + max_linear
            };
        }
        let max_turn = self.config.maximum_turn_speed_change;
        if max_turn > 0.0 && (turn - self.previous_turn_speed).abs() > max_turn {
            turn = if turn < self.previous_turn_speed {
                self.previous_turn_speed - max_turn
            } else {
                self.previous_turn_speed + max_turn
            };
        }

        self.arcade_output(linear, turn);
        self.previous_linear_speed = linear;
        self.previous_turn_speed = turn;
    }

    /// Teleop driving where each stick drives one side, like tank tracks.
    pub fn tank_drive(&mut self, left_stick: f64, right_stick: f64, alternate: bool) {
        if !self.enabled() || self.robot_state == RobotState::Disabled {
            return;
        }
        let ratio = if alternate {
            self.config.alternate_linear_speed_ratio
        } else {
            self.config.normal_linear_speed_ratio
        };
        self.tank_output(ratio * left_stick, ratio * right_stick);
    }

    /// Teleop driving without slew limiting: left stick for linear, right
    /// stick for turn.
    pub fn arcade_drive(&mut self, left_stick: f64, right_stick: f64, alternate: bool) {
        if !self.enabled() || self.robot_state == RobotState::Disabled {
            return;
        }
        let ratio = if alternate {
            self.config.alternate_linear_speed_ratio
        } else {
            self.config.normal_linear_speed_ratio
        };
        self.arcade_output(ratio * left_stick, ratio * right_stick);
    }

    /// Drives forward/backward until the integrated distance is within
    /// tolerance of `distance` (meters, negative for backwards). Returns
    /// `true` when the distance has been reached.
    pub fn drive_distance(&mut self, distance: f64, speed: f64) -> bool {
        if !self.enabled() || !self.accelerometer_enabled() {
            return true;
        }

        let directional = if distance > 0.0 {
            self.config.forward_direction
        } else {
            self.config.backward_direction
        };

        let distance_left = distance.abs() - self.distance_traveled.abs();
        if distance_left < self.config.distance_threshold {
            self.arcade_output(0.0, 0.0);
            return true;
        }

        let linear = if distance_left > self.config.auto_far_distance_threshold {
            directional * speed * self.config.auto_far_linear_speed_ratio
        } else if distance_left > self.config.auto_medium_distance_threshold {
            directional * speed * self.config.auto_medium_linear_speed_ratio
        } else {
            directional * speed * self.config.auto_near_linear_speed_ratio
        };
        self.arcade_output(linear, 0.0);
        false
    }

    /// Drives forward/backward for `duration` seconds. Returns `true` when
    /// the duration has elapsed.
    pub fn drive_time(&mut self, duration: f64, direction: Direction, speed: f64) -> bool {
        if !self.enabled() {
            return true;
        }

        let elapsed = self.movement_timer.elapsed_secs().unwrap_or(0.0);
        let time_left = duration - elapsed;
        if time_left < self.config.time_threshold {
            self.arcade_output(0.0, 0.0);
            self.movement_timer.stop();
            return true;
        }

        let directional = if direction == Direction::Forward {
            self.config.forward_direction
        } else {
            self.config.backward_direction
        };
        let linear = if time_left > self.config.auto_far_time_threshold {
            directional * speed * self.config.auto_far_linear_speed_ratio
        } else if time_left > self.config.auto_medium_time_threshold {
            directional * speed * self.config.auto_medium_linear_speed_ratio
        } else {
            directional * speed * self.config.auto_near_linear_speed_ratio
        };
        self.arcade_output(linear, 0.0);
        false
    }

    /// Turns until the gyro reports `heading` (degrees, field-absolute).
    /// Returns `true` when the heading has been reached.
    pub fn turn_to_heading(&mut self, heading: f64, speed: f64) -> bool {
        if !self.enabled() || !self.gyro_enabled() {
            return true;
        }
        self.turn_toward(heading - self.heading, speed)
    }

    /// Turns left/right to adjust the heading relative to where the robot
    /// was facing when the adjustment began. Returns `true` when done.
    pub fn adjust_heading(&mut self, adjustment: f64, speed: f64) -> bool {
        if !self.enabled() || !self.gyro_enabled() {
            self.adjustment_in_progress = false;
            return true;
        }

        // Latch the starting heading on the first poll
        if !self.adjustment_in_progress {
            self.initial_heading = self.heading;
            self.adjustment_in_progress = true;
        }

        let angle_remaining = (self.initial_heading + adjustment) - self.heading;
        let finished = self.turn_toward(angle_remaining, speed);
        if finished {
            self.adjustment_in_progress = false;
        }
        finished
    }

    fn turn_toward(&mut self, angle_remaining: f64, speed: f64) -> bool {
        if angle_remaining.abs() < self.config.heading_threshold {
            self.arcade_output(0.0, 0.0);
            return true;
        }

        let turn_direction = if angle_remaining < 0.0 {
            self.config.left_direction
        } else {
            self.config.right_direction
        };
        let turn = if angle_remaining.abs() > self.config.auto_far_heading_threshold {
            turn_direction * speed * self.config.auto_far_turning_speed_ratio
        } else if angle_remaining.abs() > self.config.auto_medium_heading_threshold {
            turn_direction * speed * self.config.auto_medium_turning_speed_ratio
        } else {
            turn_direction * speed * self.config.auto_near_turning_speed_ratio
        };
        self.arcade_output(0.0, turn);
        false
    }

    /// Turns left/right for `duration` seconds. Returns `true` when the
    /// duration has elapsed.
    pub fn turn_time(&mut self, duration: f64, direction: Direction, speed: f64) -> bool {
        if !self.enabled() {
            return true;
        }

        let elapsed = self.movement_timer.elapsed_secs().unwrap_or(0.0);
        let time_left = duration - elapsed;
        if time_left < self.config.time_threshold {
            self.arcade_output(0.0, 0.0);
            self.movement_timer.stop();
            return true;
        }

        let directional = if direction == Direction::Left {
            self.config.left_direction
        } else {
            self.config.right_direction
        };
        let turn = if time_left > self.config.auto_far_time_threshold {
            directional * speed * self.config.auto_far_turning_speed_ratio
        } else if time_left > self.config.auto_medium_time_threshold {
            directional * speed * self.config.auto_medium_turning_speed_ratio
        } else {
            directional * speed * self.config.auto_near_turning_speed_ratio
        };
        self.arcade_output(0.0, turn);
        false
    }
}
