use crate::config::params::FeederArmConfig;
use crate::core::stopwatch::Stopwatch;
use crate::domain::model::{Direction, RobotState};
use crate::domain::ports::MotorOutput;

/// An arm with a spinning wheel on the end that pulls objects into the
/// robot.
pub struct FeederArm {
    config: FeederArmConfig,
    wheel: Option<Box<dyn MotorOutput>>,
    robot_state: RobotState,
    movement_timer: Stopwatch,
}

impl FeederArm {
    pub fn new(config: FeederArmConfig, wheel: Option<Box<dyn MotorOutput>>) -> Self {
        Self {
            config,
            wheel,
            robot_state: RobotState::Disabled,
            movement_timer: Stopwatch::new(),
        }
    }

    pub fn enabled(&self) -> bool {
        self.wheel.is_some()
    }

    pub fn set_robot_state(&mut self, state: RobotState) {
        self.robot_state = state;
        self.movement_timer.stop();
    }

    pub fn reset_and_start_timer(&mut self) {
        self.movement_timer.stop();
        self.movement_timer.start();
    }

    /// Spins the wheel clockwise, counter-clockwise, or stops it. While the
    /// robot is disabled only `Stop` takes effect.
    pub fn spin(&mut self, direction: Direction, speed: f64) {
        if self.robot_state == RobotState::Disabled && direction != Direction::Stop {
            return;
        }
        let output = match direction {
            Direction::Clockwise => {
                self.config.clockwise_direction * speed * self.config.clockwise_speed_ratio
            }
            Direction::CounterClockwise => {
                self.config.counter_clockwise_direction
                    * speed
                    * self.config.counter_clockwise_speed_ratio
            }
            Direction::Stop => 0.0,
            _ => return,
        };
        if let Some(wheel) = self.wheel.as_mut() {
            wheel.set(output);
        }
    }

    /// Spins the wheel for `duration` seconds. Returns `true` when the
    /// duration has elapsed (immediately if the arm is not installed).
    pub fn spin_time(&mut self, duration: f64, direction: Direction, speed: f64) -> bool {
        if !self.enabled() {
            return true;
        }

        let elapsed = self.movement_timer.elapsed_secs().unwrap_or(0.0);
        let time_left = duration - elapsed;
        if time_left < self.config.time_threshold {
            self.spin(Direction::Stop, 0.0);
            self.movement_timer.stop();
            return true;
        }

        match direction {
            Direction::Clockwise | Direction::CounterClockwise => self.spin(direction, speed),
            _ => {}
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimMotor;

    fn arm() -> (FeederArm, SimMotor) {
        let motor = SimMotor::new();
        let mut arm = FeederArm::new(FeederArmConfig::default(), Some(Box::new(motor.clone())));
        arm.set_robot_state(RobotState::Teleop);
        (arm, motor)
    }

    #[test]
    fn test_spin_directions() {
        let (mut arm, motor) = arm();
        arm.spin(Direction::Clockwise, 0.5);
        assert_eq!(motor.speed(), 0.5);
        arm.spin(Direction::CounterClockwise, 0.5);
        assert_eq!(motor.speed(), -0.5);
        arm.spin(Direction::Stop, 1.0);
        assert_eq!(motor.speed(), 0.0);
    }

    #[test]
    fn test_spin_applies_speed_ratios() {
        let config = FeederArmConfig {
            clockwise_speed_ratio: 0.4,
            ..Default::default()
        };
        let motor = SimMotor::new();
        let mut arm = FeederArm::new(config, Some(Box::new(motor.clone())));
        arm.set_robot_state(RobotState::Teleop);
        arm.spin(Direction::Clockwise, 1.0);
        assert_eq!(motor.speed(), 0.4);
    }

    #[test]
    fn test_spin_time_runs_then_stops() {
        let (mut arm, motor) = arm();
        arm.reset_and_start_timer();
        assert!(!arm.spin_time(10.0, Direction::Clockwise, 1.0));
        assert_eq!(motor.speed(), 1.0);

        arm.reset_and_start_timer();
        assert!(arm.spin_time(0.0, Direction::Clockwise, 1.0));
        assert_eq!(motor.speed(), 0.0);
    }

    #[test]
    fn test_missing_motor_completes_immediately() {
        let mut arm = FeederArm::new(FeederArmConfig::default(), None);
        assert!(!arm.enabled());
        assert!(arm.spin_time(5.0, Direction::Clockwise, 1.0));
    }
}
