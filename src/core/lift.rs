use crate::config::params::LiftConfig;
use crate::core::stopwatch::Stopwatch;
use crate::domain::model::{Direction, RobotState};
use crate::domain::ports::MotorOutput;

/// A lift mechanism that raises and lowers objects by their handles on a
/// vertical rail.
pub struct Lift {
    config: LiftConfig,
    motor: Option<Box<dyn MotorOutput>>,
    robot_state: RobotState,
    movement_timer: Stopwatch,
}

impl Lift {
    pub fn new(config: LiftConfig, motor: Option<Box<dyn MotorOutput>>) -> Self {
        Self {
            config,
            motor,
            robot_state: RobotState::Disabled,
            movement_timer: Stopwatch::new(),
        }
    }

    pub fn enabled(&self) -> bool {
        self.motor.is_some()
    }

    pub fn set_robot_state(&mut self, state: RobotState) {
        self.robot_state = state;
        self.movement_timer.stop();
    }

    pub fn reset_and_start_timer(&mut self) {
        self.movement_timer.stop();
        self.movement_timer.start();
    }

    /// Moves the lift up or down, or stops it. While the robot is disabled
    /// only `Stop` takes effect.
    pub fn r#move(&mut self, direction: Direction, speed: f64) {
        if self.robot_state == RobotState::Disabled && direction != Direction::Stop {
            return;
        }
        let output = match direction {
            Direction::Up => self.config.up_direction * speed * self.config.up_speed_ratio,
            Direction::Down => self.config.down_direction * speed * self.config.down_speed_ratio,
            Direction::Stop => 0.0,
            _ => return,
        };
        if let Some(motor) = self.motor.as_mut() {
            motor.set(output);
        }
    }

    /// Moves the lift for `duration` seconds. Returns `true` when the
    /// duration has elapsed (immediately if the lift is not installed).
    pub fn lift_time(&mut self, duration: f64, direction: Direction, speed: f64) -> bool {
        if !self.enabled() {
            return true;
        }

        let elapsed = self.movement_timer.elapsed_secs().unwrap_or(0.0);
        let time_left = duration - elapsed;
        if time_left < self.config.time_threshold {
            self.r#move(Direction::Stop, 0.0);
            self.movement_timer.stop();
            return true;
        }

        match direction {
            Direction::Up | Direction::Down => self.r#move(direction, speed),
            _ => {}
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimMotor;

    fn lift() -> (Lift, SimMotor) {
        let motor = SimMotor::new();
        let mut lift = Lift::new(LiftConfig::default(), Some(Box::new(motor.clone())));
        lift.set_robot_state(RobotState::Teleop);
        (lift, motor)
    }

    #[test]
    fn test_move_up_and_down() {
        let (mut lift, motor) = lift();
        lift.r#move(Direction::Up, 0.5);
        assert_eq!(motor.speed(), 0.5);
        lift.r#move(Direction::Down, 0.5);
        assert_eq!(motor.speed(), -0.5);
        lift.r#move(Direction::Stop, 1.0);
        assert_eq!(motor.speed(), 0.0);
    }

    #[test]
    fn test_move_applies_speed_ratio() {
        let config = LiftConfig {
            down_speed_ratio: 0.3,
            ..Default::default()
        };
        let motor = SimMotor::new();
        let mut lift = Lift::new(config, Some(Box::new(motor.clone())));
        lift.set_robot_state(RobotState::Teleop);
        lift.r#move(Direction::Down, 1.0);
        assert_eq!(motor.speed(), -0.3);
    }

    #[test]
    fn test_lift_time_runs_then_stops() {
        let (mut lift, motor) = lift();
        lift.reset_and_start_timer();
        assert!(!lift.lift_time(10.0, Direction::Up, 1.0));
        assert_eq!(motor.speed(), 1.0);

        lift.reset_and_start_timer();
        assert!(lift.lift_time(0.0, Direction::Up, 1.0));
        assert_eq!(motor.speed(), 0.0);
    }

    #[test]
    fn test_missing_motor_completes_immediately() {
        let mut lift = Lift::new(LiftConfig::default(), None);
        assert!(!lift.enabled());
        assert!(lift.lift_time(5.0, Direction::Up, 1.0));
    }
}
