use crate::config::params::UserInterfaceConfig;
use crate::domain::model::RobotState;
use crate::domain::ports::GamepadInput;

/// Joystick axes, numbered to match the driver station mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoystickAxis {
    LeftX = 0,
    LeftY = 1,
    RightX = 2,
    RightY = 3,
    DpadX = 5,
    DpadY = 6,
}

/// Joystick buttons, numbered to match the driver station mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoystickButton {
    X = 1,
    A = 2,
    B = 3,
    Y = 4,
    LeftBumper = 5,
    RightBumper = 6,
    LeftTrigger = 7,
    RightTrigger = 8,
    Back = 9,
    Start = 10,
}

/// The two operator controllers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserController {
    Driver,
    Scoring,
}

struct Controller {
    gamepad: Option<Box<dyn GamepadInput>>,
    dead_band: f64,
    buttons: usize,
    previous_button_state: Vec<bool>,
}

impl Controller {
    fn new(gamepad: Option<Box<dyn GamepadInput>>, dead_band: f64, buttons: usize) -> Self {
        Self {
            gamepad,
            dead_band,
            buttons,
            // Button numbering starts at 1
            previous_button_state: vec![false; buttons + 1],
        }
    }

    fn axis_value(&mut self, axis: JoystickAxis) -> f64 {
        let Some(gamepad) = self.gamepad.as_mut() else {
            return 0.0;
        };
        let value = match axis {
            // The D-pad reads as a POV angle; map it onto -1/0/+1 axes
            JoystickAxis::DpadX => match gamepad.pov() {
                90 => 1.0,
                270 => -1.0,
                _ => 0.0,
            },
            JoystickAxis::DpadY => match gamepad.pov() {
                0 => -1.0,
                180 => 1.0,
                _ => 0.0,
            },
            _ => gamepad.axis(axis as usize),
        };
        if value.abs() < self.dead_band {
            0.0
        } else {
            value
        }
    }

    fn button_state(&mut self, button: JoystickButton) -> bool {
        match self.gamepad.as_mut() {
            Some(gamepad) => gamepad.button(button as usize),
            None => false,
        }
    }

    fn button_changed(&mut self, button: JoystickButton) -> bool {
        let current = self.button_state(button);
        let previous = self
            .previous_button_state
            .get(button as usize)
            .copied()
            .unwrap_or(false);
        current != previous
    }

    fn store_button_states(&mut self) {
        let Some(gamepad) = self.gamepad.as_mut() else {
            return;
        };
        for button in 1..=self.buttons {
            if let Some(slot) = self.previous_button_state.get_mut(button) {
                *slot = gamepad.button(button);
            }
        }
    }
}

/// Connects the operator gamepads to the rest of the robot code: axis reads
/// with dead-band filtering, button reads, and edge detection against the
/// state stored at the end of the previous control cycle.
pub struct UserInterface {
    driver: Controller,
    scoring: Controller,
}

impl UserInterface {
    pub fn new(
        config: UserInterfaceConfig,
        driver_gamepad: Option<Box<dyn GamepadInput>>,
        scoring_gamepad: Option<Box<dyn GamepadInput>>,
    ) -> Self {
        Self {
            driver: Controller::new(
                driver_gamepad,
                config.driver.dead_band,
                config.driver.buttons,
            ),
            scoring: Controller::new(
                scoring_gamepad,
                config.scoring.dead_band,
                config.scoring.buttons,
            ),
        }
    }

    /// Mode transitions re-snapshot the buttons so a button held across the
    /// transition does not read as an edge in the new mode.
    pub fn set_robot_state(&mut self, _state: RobotState) {
        self.driver.store_button_states();
        self.scoring.store_button_states();
    }

    fn controller(&mut self, controller: UserController) -> &mut Controller {
        match controller {
            UserController::Driver => &mut self.driver,
            UserController::Scoring => &mut self.scoring,
        }
    }

    /// Current axis position, zeroed inside the dead band.
    pub fn axis_value(&mut self, controller: UserController, axis: JoystickAxis) -> f64 {
        self.controller(controller).axis_value(axis)
    }

    /// True while the button is held.
    pub fn button_state(&mut self, controller: UserController, button: JoystickButton) -> bool {
        self.controller(controller).button_state(button)
    }

    /// True if the button state differs from the last stored snapshot.
    pub fn button_state_changed(
        &mut self,
        controller: UserController,
        button: JoystickButton,
    ) -> bool {
        self.controller(controller).button_changed(button)
    }

    /// Snapshots the controller's button states for edge detection in the
    /// next control cycle.
    pub fn store_button_states(&mut self, controller: UserController) {
        self.controller(controller).store_button_states();
    }
}
