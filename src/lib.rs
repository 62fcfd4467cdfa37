pub mod config;
pub mod core;
pub mod domain;
pub mod sim;
pub mod utils;

pub use config::{params::RobotConfig, CliConfig};
pub use core::robot::{Robot, RobotHardware};
pub use core::targeting::TargetServer;
pub use domain::model::{Direction, RobotState, Target};
pub use utils::error::{Result, RobotError};
