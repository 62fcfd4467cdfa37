use crate::config::params::RobotConfig;
use crate::core::autoscript::{AutoScript, ScriptCommand, ScriptValue};
use crate::core::drivetrain::{DriveHardware, DriveTrain};
use crate::core::feeder::Feeder;
use crate::core::lift::Lift;
use crate::core::rangefinder::RangeFinder;
use crate::core::stopwatch::Stopwatch;
use crate::core::userinterface::{JoystickAxis, JoystickButton, UserController, UserInterface};
use crate::domain::model::{Direction, RobotState, Target};
use crate::domain::ports::{AnalogInput, GamepadInput, MotorOutput};
use crate::utils::datalog::DataLog;
use tokio::sync::watch;

/// Everything physically attached to the robot. Individual devices may be
/// absent; the owning subsystem then comes up disabled.
pub struct RobotHardware {
    pub drive: DriveHardware,
    pub feeder_left_wheel: Option<Box<dyn MotorOutput>>,
    pub feeder_right_wheel: Option<Box<dyn MotorOutput>>,
    pub lift_motor: Option<Box<dyn MotorOutput>>,
    pub driver_gamepad: Option<Box<dyn GamepadInput>>,
    pub scoring_gamepad: Option<Box<dyn GamepadInput>>,
    pub rangefinder_channel: Option<Box<dyn AnalogInput>>,
}

impl RobotHardware {
    pub fn disconnected() -> Self {
        Self {
            drive: DriveHardware::disconnected(),
            feeder_left_wheel: None,
            feeder_right_wheel: None,
            lift_motor: None,
            driver_gamepad: None,
            scoring_gamepad: None,
            rangefinder_channel: None,
        }
    }
}

/// A single autonomous operation, decoded from one script row.
#[derive(Debug, Clone, PartialEq)]
enum AutoCommand {
    WaitTime(f64),
    DriveTime(f64, Direction, f64),
    DriveDistance(f64, f64),
    TurnTime(f64, Direction, f64),
    TurnToHeading(f64, f64),
    AdjustHeading(f64, f64),
    FeedTime(f64, Direction, f64),
    SpinTime(f64, Direction, f64),
    LiftTime(f64, Direction, f64),
    End,
}

impl AutoCommand {
    /// Decodes a script row. Returns `None` for unknown commands or bad
    /// arguments; the autonomous loop skips those with a warning.
    fn decode(command: &ScriptCommand) -> Option<Self> {
        let number = |i: usize| command.args.get(i).and_then(ScriptValue::as_f64);
        let direction = |i: usize| {
            command.args.get(i).and_then(ScriptValue::as_str).and_then(parse_direction)
        };

        match command.name.as_str() {
            "wait_time" => Some(AutoCommand::WaitTime(number(0)?)),
            "drive_time" => Some(AutoCommand::DriveTime(number(0)?, direction(1)?, number(2)?)),
            "drive_distance" => Some(AutoCommand::DriveDistance(number(0)?, number(1)?)),
            "turn_time" => Some(AutoCommand::TurnTime(number(0)?, direction(1)?, number(2)?)),
            "turn_to_heading" => Some(AutoCommand::TurnToHeading(number(0)?, number(1)?)),
            "adjust_heading" => Some(AutoCommand::AdjustHeading(number(0)?, number(1)?)),
            "feed_time" => Some(AutoCommand::FeedTime(number(0)?, direction(1)?, number(2)?)),
            "spin_time" => Some(AutoCommand::SpinTime(number(0)?, direction(1)?, number(2)?)),
            "lift_time" => Some(AutoCommand::LiftTime(number(0)?, direction(1)?, number(2)?)),
            "end" => Some(AutoCommand::End),
            _ => None,
        }
    }

    /// Commands with an internal timer need it re-armed when they become
    /// current.
    fn uses_timer(&self) -> bool {
        !matches!(
            self,
            AutoCommand::DriveDistance(..)
                | AutoCommand::TurnToHeading(..)
                | AutoCommand::AdjustHeading(..)
                | AutoCommand::End
        )
    }
}

fn parse_direction(name: &str) -> Option<Direction> {
    match name.trim().to_ascii_lowercase().as_str() {
        "left" => Some(Direction::Left),
        "right" => Some(Direction::Right),
        "forward" => Some(Direction::Forward),
        "backward" => Some(Direction::Backward),
        "up" => Some(Direction::Up),
        "down" => Some(Direction::Down),
        "in" => Some(Direction::In),
        "out" => Some(Direction::Out),
        "clockwise" => Some(Direction::Clockwise),
        "counter_clockwise" => Some(Direction::CounterClockwise),
        "stop" => Some(Direction::Stop),
        _ => None,
    }
}

struct ScriptRunner {
    script: AutoScript,
    current: Option<AutoCommand>,
    finished: bool,
}

/// The robot: owns every subsystem and drives them through the three game
/// modes at the 50 Hz control rate.
pub struct Robot {
    drivetrain: DriveTrain,
    feeder: Feeder,
    lift: Lift,
    user_interface: UserInterface,
    rangefinder: Option<RangeFinder>,

    state: RobotState,
    driver_alternate: bool,
    driver_controls_swap_ratio: f64,
    wait_timer: Stopwatch,
    script: Option<ScriptRunner>,
    target_feed: Option<watch::Receiver<Vec<Target>>>,
    current_targets: Vec<Target>,
    range_feet: Option<f64>,
}

impl Robot {
    pub fn new(config: RobotConfig, hardware: RobotHardware, drive_log: Option<DataLog>) -> Self {
        let drivetrain = DriveTrain::new(config.drivetrain, hardware.drive, drive_log);
        let feeder = Feeder::new(
            config.feeder,
            hardware.feeder_left_wheel,
            hardware.feeder_right_wheel,
        );
        let lift = Lift::new(config.lift, hardware.lift_motor);
        let user_interface = UserInterface::new(
            config.userinterface,
            hardware.driver_gamepad,
            hardware.scoring_gamepad,
        );
        let rangefinder = hardware
            .rangefinder_channel
            .map(|channel| RangeFinder::new(config.rangefinder, channel));

        Self {
            drivetrain,
            feeder,
            lift,
            user_interface,
            rangefinder,
            state: RobotState::Disabled,
            driver_alternate: false,
            driver_controls_swap_ratio: 1.0,
            wait_timer: Stopwatch::new(),
            script: None,
            target_feed: None,
            current_targets: Vec::new(),
            range_feet: None,
        }
    }

    /// Connects the vision target feed from the targeting server.
    pub fn attach_target_feed(&mut self, receiver: watch::Receiver<Vec<Target>>) {
        self.target_feed = Some(receiver);
    }

    /// Loads the autonomous script to run the next time autonomous starts.
    pub fn load_script(&mut self, script: AutoScript) {
        self.script = Some(ScriptRunner {
            script,
            current: None,
            finished: false,
        });
    }

    pub fn script_finished(&self) -> bool {
        self.script.as_ref().map(|s| s.finished).unwrap_or(true)
    }

    pub fn state(&self) -> RobotState {
        self.state
    }

    pub fn targets(&self) -> &[Target] {
        &self.current_targets
    }

    /// The latest filtered ultrasonic range, when a rangefinder is fitted.
    pub fn range_in_feet(&self) -> Option<f64> {
        self.range_feet
    }

    /// Enters a new game mode, notifying every subsystem.
    pub fn set_state(&mut self, state: RobotState) {
        tracing::info!("Entering {:?} mode", state);
        self.state = state;
        self.drivetrain.set_robot_state(state);
        self.feeder.set_robot_state(state);
        self.lift.set_robot_state(state);
        self.user_interface.set_robot_state(state);
        self.read_sensors();
        if let Err(e) = self.drivetrain.log_current_state() {
            tracing::warn!("Failed to write drivetrain log: {}", e);
        }

        if state == RobotState::Autonomous {
            if let Some(runner) = self.script.as_mut() {
                runner.script.rewind();
                runner.current = None;
                runner.finished = false;
            }
        }
    }

    fn read_sensors(&mut self) {
        self.drivetrain.read_sensors();
        if let Some(rangefinder) = self.rangefinder.as_mut() {
            self.range_feet = Some(rangefinder.filtered_range_in_feet());
        }
    }

    fn poll_targets(&mut self) {
        let Some(receiver) = self.target_feed.as_mut() else {
            return;
        };
        if receiver.has_changed().unwrap_or(false) {
            self.current_targets = receiver.borrow_and_update().clone();
            tracing::debug!("Received {} target(s)", self.current_targets.len());
        }
    }

    /// Disabled mode: keep motors stopped so nothing moves while the field
    /// is not live.
    pub fn disabled_periodic(&mut self) {
        self.drivetrain.stop();
        self.feeder.feed(Direction::Stop, 0.0);
        self.lift.r#move(Direction::Stop, 0.0);
        self.read_sensors();
        self.poll_targets();
    }

    /// Autonomous mode: execute the loaded script one command at a time.
    pub fn autonomous_periodic(&mut self) {
        self.read_sensors();
        self.poll_targets();

        let Some(mut runner) = self.script.take() else {
            self.hold_motors();
            return;
        };

        if !runner.finished && runner.current.is_none() {
            self.advance_script(&mut runner);
        }

        if let Some(command) = runner.current.clone() {
            if self.execute_command(&command) {
                runner.current = None;
            }
        } else if runner.finished {
            self.hold_motors();
        }

        self.script = Some(runner);
    }

    /// Fetches the next runnable command, skipping anything undecodable.
    fn advance_script(&mut self, runner: &mut ScriptRunner) {
        loop {
            let Some(command) = runner.script.next_command() else {
                tracing::info!("Autonomous script finished");
                runner.finished = true;
                return;
            };
            match AutoCommand::decode(command) {
                Some(AutoCommand::End) => {
                    tracing::info!("Autonomous script ended");
                    runner.finished = true;
                    return;
                }
                Some(decoded) => {
                    tracing::debug!("Starting autonomous command: {:?}", decoded);
                    if decoded.uses_timer() {
                        self.reset_command_timers(&decoded);
                    }
                    runner.current = Some(decoded);
                    return;
                }
                None => {
                    tracing::warn!("Skipping unknown autonomous command: {}", command.name);
                }
            }
        }
    }

    fn reset_command_timers(&mut self, command: &AutoCommand) {
        match command {
            AutoCommand::WaitTime(..) => {
                self.wait_timer.stop();
                self.wait_timer.start();
            }
            AutoCommand::DriveTime(..) | AutoCommand::TurnTime(..) => {
                self.drivetrain.reset_and_start_timer();
            }
            AutoCommand::FeedTime(..) | AutoCommand::SpinTime(..) => {
                self.feeder.reset_and_start_timer();
            }
            AutoCommand::LiftTime(..) => {
                self.lift.reset_and_start_timer();
            }
            _ => {}
        }
    }

    /// Runs one tick of a command. Returns `true` when the command is done.
    fn execute_command(&mut self, command: &AutoCommand) -> bool {
        match *command {
            AutoCommand::WaitTime(duration) => self.wait_time(duration),
            AutoCommand::DriveTime(duration, direction, speed) => {
                self.drivetrain.drive_time(duration, direction, speed)
            }
            AutoCommand::DriveDistance(distance, speed) => {
                self.drivetrain.drive_distance(distance, speed)
            }
            AutoCommand::TurnTime(duration, direction, speed) => {
                self.drivetrain.turn_time(duration, direction, speed)
            }
            AutoCommand::TurnToHeading(heading, speed) => {
                self.drivetrain.turn_to_heading(heading, speed)
            }
            AutoCommand::AdjustHeading(adjustment, speed) => {
                self.drivetrain.adjust_heading(adjustment, speed)
            }
            AutoCommand::FeedTime(duration, direction, speed) => {
                self.feeder.feed_time(duration, direction, speed)
            }
            AutoCommand::SpinTime(duration, direction, speed) => {
                self.feeder.spin_time(duration, direction, speed)
            }
            AutoCommand::LiftTime(duration, direction, speed) => {
                self.lift.lift_time(duration, direction, speed)
            }
            AutoCommand::End => true,
        }
    }

    /// Does nothing for `duration` seconds.
    fn wait_time(&mut self, duration: f64) -> bool {
        let elapsed = self.wait_timer.elapsed_secs().unwrap_or(0.0);
        if duration - elapsed < 0.0 {
            self.wait_timer.stop();
            return true;
        }
        false
    }

    fn hold_motors(&mut self) {
        self.drivetrain.stop();
        self.feeder.feed(Direction::Stop, 0.0);
        self.lift.r#move(Direction::Stop, 0.0);
    }

    /// Teleop mode: manual control from the two gamepads.
    pub fn teleop_periodic(&mut self) {
        self.read_sensors();
        self.poll_targets();

        self.check_alternate_speed_mode();
        self.check_swap_drivetrain_request();
        self.control_drive_train();
        self.control_feeder();
        self.control_lift();

        self.user_interface.store_button_states(UserController::Driver);
        self.user_interface.store_button_states(UserController::Scoring);
    }

    /// Left bumper held: use the alternate (usually slower) speed ratios.
    fn check_alternate_speed_mode(&mut self) {
        self.driver_alternate = self
            .user_interface
            .button_state(UserController::Driver, JoystickButton::LeftBumper);
    }

    /// Right trigger edge: swap the robot's notion of forward and reverse.
    fn check_swap_drivetrain_request(&mut self) {
        if self
            .user_interface
            .button_state(UserController::Driver, JoystickButton::RightTrigger)
            && self
                .user_interface
                .button_state_changed(UserController::Driver, JoystickButton::RightTrigger)
        {
            self.driver_controls_swap_ratio *= -1.0;
        }
    }

    fn control_drive_train(&mut self) {
        let linear = self
            .user_interface
            .axis_value(UserController::Driver, JoystickAxis::LeftY);
        let turn = self
            .user_interface
            .axis_value(UserController::Driver, JoystickAxis::RightX);
        if linear != 0.0 || turn != 0.0 {
            self.drivetrain.drive(
                linear * self.driver_controls_swap_ratio,
                turn,
                self.driver_alternate,
            );
        } else {
            self.drivetrain.drive(0.0, 0.0, false);
        }
    }

    /// Scoring A feeds in, B feeds out, neither stops the feeder.
    fn control_feeder(&mut self) {
        if self
            .user_interface
            .button_state(UserController::Scoring, JoystickButton::A)
        {
            self.feeder.feed(Direction::In, 1.0);
        } else if self
            .user_interface
            .button_state(UserController::Scoring, JoystickButton::B)
        {
            self.feeder.feed(Direction::Out, 1.0);
        } else {
            self.feeder.feed(Direction::Stop, 0.0);
        }
    }

    /// Scoring left stick Y raises and lowers the lift.
    fn control_lift(&mut self) {
        let value = self
            .user_interface
            .axis_value(UserController::Scoring, JoystickAxis::LeftY);
        if value < 0.0 {
            // Stick forward is negative: lift up
            self.lift.r#move(Direction::Up, value.abs());
        } else if value > 0.0 {
            self.lift.r#move(Direction::Down, value.abs());
        } else {
            self.lift.r#move(Direction::Stop, 0.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{SimGamepad, SimGyro, SimMotor};

    struct Rig {
        robot: Robot,
        left_drive: SimMotor,
        right_drive: SimMotor,
        left_feed: SimMotor,
        right_feed: SimMotor,
        lift: SimMotor,
        gyro: SimGyro,
        driver: SimGamepad,
        scoring: SimGamepad,
    }

    fn rig() -> Rig {
        let left_drive = SimMotor::new();
        let right_drive = SimMotor::new();
        let left_feed = SimMotor::new();
        let right_feed = SimMotor::new();
        let lift = SimMotor::new();
        let gyro = SimGyro::new();
        let driver = SimGamepad::new();
        let scoring = SimGamepad::new();

        let hardware = RobotHardware {
            drive: DriveHardware {
                left_motor: Some(Box::new(left_drive.clone())),
                right_motor: Some(Box::new(right_drive.clone())),
                gyro: Some(Box::new(gyro.clone())),
                accelerometer: None,
            },
            feeder_left_wheel: Some(Box::new(left_feed.clone())),
            feeder_right_wheel: Some(Box::new(right_feed.clone())),
            lift_motor: Some(Box::new(lift.clone())),
            driver_gamepad: Some(Box::new(driver.clone())),
            scoring_gamepad: Some(Box::new(scoring.clone())),
            rangefinder_channel: None,
        };

        Rig {
            robot: Robot::new(RobotConfig::default(), hardware, None),
            left_drive,
            right_drive,
            left_feed,
            right_feed,
            lift,
            gyro,
            driver,
            scoring,
        }
    }

    fn script(content: &str) -> AutoScript {
        AutoScript::from_csv_str(content).unwrap()
    }

    #[test]
    fn test_disabled_periodic_stops_motors() {
        let mut rig = rig();
        rig.robot.set_state(RobotState::Teleop);
        rig.driver.set_axis(JoystickAxis::LeftY as usize, 1.0);
        rig.robot.teleop_periodic();
        assert!(rig.left_drive.speed() != 0.0);

        rig.robot.set_state(RobotState::Disabled);
        rig.robot.disabled_periodic();
        assert_eq!(rig.left_drive.speed(), 0.0);
        assert_eq!(rig.right_drive.speed(), 0.0);
        assert_eq!(rig.lift.speed(), 0.0);
    }

    #[test]
    fn test_teleop_arcade_driving() {
        let mut rig = rig();
        rig.robot.set_state(RobotState::Teleop);
        rig.driver.set_axis(JoystickAxis::LeftY as usize, 0.5);
        rig.driver.set_axis(JoystickAxis::RightX as usize, 0.25);
        rig.robot.teleop_periodic();
        assert_eq!(rig.left_drive.speed(), 0.75);
        assert_eq!(rig.right_drive.speed(), 0.25);
    }

    #[test]
    fn test_teleop_swap_direction_on_trigger_edge() {
        let mut rig = rig();
        rig.robot.set_state(RobotState::Teleop);
        rig.driver.set_axis(JoystickAxis::LeftY as usize, 0.5);

        rig.driver.set_button(JoystickButton::RightTrigger as usize, true);
        rig.robot.teleop_periodic();
        assert_eq!(rig.left_drive.speed(), -0.5);

        // Held trigger is not a new edge: direction stays swapped
        rig.robot.teleop_periodic();
        assert_eq!(rig.left_drive.speed(), -0.5);

        // Release and press again: swaps back
        rig.driver.set_button(JoystickButton::RightTrigger as usize, false);
        rig.robot.teleop_periodic();
        rig.driver.set_button(JoystickButton::RightTrigger as usize, true);
        rig.robot.teleop_periodic();
        assert_eq!(rig.left_drive.speed(), 0.5);
    }

    #[test]
    fn test_teleop_feeder_and_lift_controls() {
        let mut rig = rig();
        rig.robot.set_state(RobotState::Teleop);

        rig.scoring.set_button(JoystickButton::A as usize, true);
        rig.scoring.set_axis(JoystickAxis::LeftY as usize, -0.6);
        rig.robot.teleop_periodic();
        assert_eq!(rig.left_feed.speed(), 1.0);
        assert_eq!(rig.right_feed.speed(), -1.0);
        assert_eq!(rig.lift.speed(), 0.6);

        rig.scoring.set_button(JoystickButton::A as usize, false);
        rig.scoring.set_axis(JoystickAxis::LeftY as usize, 0.0);
        rig.robot.teleop_periodic();
        assert_eq!(rig.left_feed.speed(), 0.0);
        assert_eq!(rig.lift.speed(), 0.0);
    }

    #[test]
    fn test_autonomous_runs_commands_in_sequence() {
        let mut rig = rig();
        rig.robot
            .load_script(script("turn_to_heading,90,1.0\nend\nlift_time,5.0,up,1.0\n"));
        rig.robot.set_state(RobotState::Autonomous);

        // Far from the heading: turning
        rig.robot.autonomous_periodic();
        assert!(!rig.robot.script_finished());
        assert!(rig.left_drive.speed() > 0.0);

        // Reach the heading: command completes, then "end" stops the script
        rig.gyro.set_angle(90.0);
        rig.robot.autonomous_periodic();
        rig.robot.autonomous_periodic();
        assert!(rig.robot.script_finished());

        // Commands after "end" never run
        rig.robot.autonomous_periodic();
        assert_eq!(rig.lift.speed(), 0.0);
    }

    #[test]
    fn test_autonomous_skips_unknown_commands() {
        let mut rig = rig();
        rig.robot
            .load_script(script("fire_catapult,1.0\nwait_time,0.0\n"));
        rig.robot.set_state(RobotState::Autonomous);

        rig.robot.autonomous_periodic(); // skips fire_catapult, starts wait
        rig.robot.autonomous_periodic(); // wait of 0 completes
        rig.robot.autonomous_periodic(); // script exhausted
        assert!(rig.robot.script_finished());
    }

    #[test]
    fn test_autonomous_without_script_holds_motors() {
        let mut rig = rig();
        rig.robot.set_state(RobotState::Autonomous);
        rig.robot.autonomous_periodic();
        assert!(rig.robot.script_finished());
        assert_eq!(rig.left_drive.speed(), 0.0);
        assert_eq!(rig.right_drive.speed(), 0.0);
    }

    #[test]
    fn test_target_feed_updates_current_targets() {
        let mut rig = rig();
        let (sender, receiver) = watch::channel(Vec::new());
        rig.robot.attach_target_feed(receiver);
        rig.robot.set_state(RobotState::Teleop);

        sender
            .send(vec![Target {
                distance: 7.5,
                ..Default::default()
            }])
            .unwrap();
        rig.robot.teleop_periodic();
        assert_eq!(rig.robot.targets().len(), 1);
        assert_eq!(rig.robot.targets()[0].distance, 7.5);
    }
}
