use crate::config::params::FeederConfig;
use crate::core::feeder_arm::FeederArm;
use crate::domain::model::{Direction, RobotState};
use crate::domain::ports::MotorOutput;

/// Feeds objects into the robot with a pair of spinning arms.
///
/// The arms face each other, so feeding in spins the left arm clockwise and
/// the right arm counter-clockwise (and the reverse for feeding out). Both
/// arms must be installed for the feeder to operate.
pub struct Feeder {
    left_arm: FeederArm,
    right_arm: FeederArm,
}

impl Feeder {
    pub fn new(
        config: FeederConfig,
        left_wheel: Option<Box<dyn MotorOutput>>,
        right_wheel: Option<Box<dyn MotorOutput>>,
    ) -> Self {
        Self {
            left_arm: FeederArm::new(config.left_arm, left_wheel),
            right_arm: FeederArm::new(config.right_arm, right_wheel),
        }
    }

    pub fn enabled(&self) -> bool {
        self.left_arm.enabled() && self.right_arm.enabled()
    }

    pub fn set_robot_state(&mut self, state: RobotState) {
        self.left_arm.set_robot_state(state);
        self.right_arm.set_robot_state(state);
    }

    pub fn reset_and_start_timer(&mut self) {
        self.left_arm.reset_and_start_timer();
        self.right_arm.reset_and_start_timer();
    }

    /// Feeds an object in or out of the robot.
    pub fn feed(&mut self, direction: Direction, speed: f64) {
        if !self.enabled() {
            return;
        }
        match direction {
            Direction::In => {
                self.right_arm.spin(Direction::CounterClockwise, speed);
                self.left_arm.spin(Direction::Clockwise, speed);
            }
            Direction::Out => {
                self.right_arm.spin(Direction::Clockwise, speed);
                self.left_arm.spin(Direction::CounterClockwise, speed);
            }
            Direction::Stop => {
                self.right_arm.spin(Direction::Stop, 0.0);
                self.left_arm.spin(Direction::Stop, 0.0);
            }
            _ => {}
        }
    }

    /// Feeds for `duration` seconds. Returns `true` when both arms have
    /// finished.
    pub fn feed_time(&mut self, duration: f64, direction: Direction, speed: f64) -> bool {
        if !self.enabled() {
            return true;
        }

        let (left_direction, right_direction) = match direction {
            Direction::In => (Direction::Clockwise, Direction::CounterClockwise),
            Direction::Out => (Direction::CounterClockwise, Direction::Clockwise),
            _ => (Direction::Stop, Direction::Stop),
        };

        let right_finished = self.right_arm.spin_time(duration, right_direction, speed);
        let left_finished = self.left_arm.spin_time(duration, left_direction, speed);
        right_finished && left_finished
    }

    /// Spins both arms in the same rotational direction for `duration`
    /// seconds. Returns `true` when both arms have finished.
    pub fn spin_time(&mut self, duration: f64, direction: Direction, speed: f64) -> bool {
        if !self.enabled() {
            return true;
        }
        let right_finished = self.right_arm.spin_time(duration, direction, speed);
        let left_finished = self.left_arm.spin_time(duration, direction, speed);
        right_finished && left_finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimMotor;

    fn feeder() -> (Feeder, SimMotor, SimMotor) {
        let left = SimMotor::new();
        let right = SimMotor::new();
        let mut feeder = Feeder::new(
            FeederConfig::default(),
            Some(Box::new(left.clone())),
            Some(Box::new(right.clone())),
        );
        feeder.set_robot_state(RobotState::Teleop);
        (feeder, left, right)
    }

    #[test]
    fn test_feed_in_counter_rotates_arms() {
        let (mut feeder, left, right) = feeder();
        feeder.feed(Direction::In, 0.8);
        assert_eq!(left.speed(), 0.8);
        assert_eq!(right.speed(), -0.8);
    }

    #[test]
    fn test_feed_out_reverses_both_arms() {
        let (mut feeder, left, right) = feeder();
        feeder.feed(Direction::Out, 0.8);
        assert_eq!(left.speed(), -0.8);
        assert_eq!(right.speed(), 0.8);
    }

    #[test]
    fn test_feed_stop() {
        let (mut feeder, left, right) = feeder();
        feeder.feed(Direction::In, 1.0);
        feeder.feed(Direction::Stop, 1.0);
        assert_eq!(left.speed(), 0.0);
        assert_eq!(right.speed(), 0.0);
    }

    #[test]
    fn test_feed_time_finishes() {
        let (mut feeder, left, right) = feeder();
        feeder.reset_and_start_timer();
        assert!(!feeder.feed_time(10.0, Direction::In, 1.0));
        assert_eq!(left.speed(), 1.0);
        assert_eq!(right.speed(), -1.0);

        feeder.reset_and_start_timer();
        assert!(feeder.feed_time(0.0, Direction::In, 1.0));
        assert_eq!(left.speed(), 0.0);
        assert_eq!(right.speed(), 0.0);
    }

    #[test]
    fn test_single_arm_is_not_enough() {
        let left = SimMotor::new();
        let mut feeder = Feeder::new(FeederConfig::default(), Some(Box::new(left.clone())), None);
        assert!(!feeder.enabled());
        feeder.feed(Direction::In, 1.0);
        assert_eq!(left.speed(), 0.0);
        assert!(feeder.feed_time(5.0, Direction::In, 1.0));
    }
}
